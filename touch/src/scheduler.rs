//! The scan control loop.
//!
//! One cycle runs `InitiateScan -> WaitInSleep -> ProcessTouch ->
//! WaitInDeepSleep` and back. The deep sleep lock is held from the moment the
//! scheduler starts waiting for a scan to complete until touch processing is
//! done, so the core only drops into deep sleep while waiting for the next
//! timer tick.
//!
//! Cadence adapts to touch history: any new touch on the slow zone switches to
//! the fast cadence at once, while the fast cadence is only left after
//! `max_fast_cycles` consecutive cycles without a new touch.

use log::{debug, info, trace};

use crate::driver::{LowPower, ScanTarget, ScanTimer, SensingDriver, TunerLink, Zone};
use crate::evaluate::{CompletedScan, TouchEvaluator, TouchResult};
use crate::event::{ScanEvent, ScanEvents};
use crate::power::PowerState;
use crate::{ScanConfig, ScanMode};

/// Value of the fast cycle counter at the start of every fast period
const FAST_CYCLES_RESET: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    InitiateScan,
    WaitInSleep,
    ProcessTouch,
    WaitInDeepSleep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    Fast,
    Slow,
}

impl Cadence {
    /// The zone scanned at this cadence
    pub fn zone(self) -> Zone {
        match self {
            Self::Fast => Zone::Slider,
            Self::Slow => Zone::Ganged,
        }
    }

    pub fn interval_ms(self, config: &ScanConfig) -> u32 {
        match self {
            Self::Fast => config.fast_interval_ms,
            Self::Slow => config.slow_interval_ms,
        }
    }
}

pub struct Scheduler<'a, D, T, P, L> {
    driver: D,
    timer: T,
    power: PowerState<P>,
    tuner: L,
    events: &'a ScanEvents,
    config: ScanConfig,
    evaluator: TouchEvaluator,
    state: SchedulerState,
    cadence: Cadence,
    fast_cycles: u16,
    scan_target: ScanTarget,
    completed: Option<CompletedScan>,
}

impl<'a, D, T, P, L> Scheduler<'a, D, T, P, L>
where
    D: SensingDriver,
    T: ScanTimer,
    P: LowPower,
    L: TunerLink<D>,
{
    pub fn new(
        driver: D,
        timer: T,
        power: P,
        tuner: L,
        events: &'a ScanEvents,
        config: ScanConfig,
    ) -> Self {
        assert!(config.max_fast_cycles >= FAST_CYCLES_RESET);
        Self {
            driver,
            timer,
            power: PowerState::new(power),
            tuner,
            events,
            config,
            evaluator: TouchEvaluator::new(),
            state: SchedulerState::InitiateScan,
            cadence: Cadence::Fast,
            fast_cycles: FAST_CYCLES_RESET,
            scan_target: ScanTarget::Zone(Zone::Slider),
            completed: None,
        }
    }

    /// Start the scan timer at the fast interval.
    ///
    /// In tuning mode this also takes the deep sleep lock for good.
    pub fn start(&mut self) {
        if self.tuning() {
            self.power.lock();
        }
        info!(
            "scan scheduler starting, {:?} mode, fast {}ms slow {}ms",
            self.config.mode, self.config.fast_interval_ms, self.config.slow_interval_ms
        );
        self.timer.start(self.cadence.interval_ms(&self.config));
    }

    /// Run the loop forever
    pub fn run(mut self) -> ! {
        self.start();
        loop {
            self.step();
        }
    }

    /// Run the action of the current state and move to the next one.
    ///
    /// Blocks in the two waiting states until the awaited event arrives.
    pub fn step(&mut self) -> SchedulerState {
        self.state = match self.state {
            SchedulerState::InitiateScan => self.initiate_scan(),
            SchedulerState::WaitInSleep => {
                if !self.tuning() {
                    self.power.lock();
                }
                self.power.wait_for(self.events, ScanEvent::ScanComplete);
                self.completed = Some(CompletedScan::new(self.scan_target));
                SchedulerState::ProcessTouch
            }
            SchedulerState::ProcessTouch => {
                self.process_touch();
                SchedulerState::WaitInDeepSleep
            }
            SchedulerState::WaitInDeepSleep => {
                if !self.tuning() {
                    self.power.unlock();
                }
                self.power.wait_for(self.events, ScanEvent::StartScan);
                SchedulerState::InitiateScan
            }
        };
        self.state
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn fast_cycles(&self) -> u16 {
        self.fast_cycles
    }

    pub fn is_deep_sleep_locked(&self) -> bool {
        self.power.is_locked()
    }

    fn tuning(&self) -> bool {
        self.config.mode == ScanMode::Tuning
    }

    fn initiate_scan(&mut self) -> SchedulerState {
        if self.driver.is_busy() {
            trace!("sensor busy, polling again");
            core::hint::spin_loop();
            return SchedulerState::InitiateScan;
        }

        // A completion left over from an earlier scan must not satisfy the
        // wait for this one.
        self.events.take(ScanEvent::ScanComplete);

        self.scan_target = if self.tuning() {
            ScanTarget::All
        } else {
            ScanTarget::Zone(self.cadence.zone())
        };
        self.driver.start_scan(self.scan_target);
        SchedulerState::WaitInSleep
    }

    fn process_touch(&mut self) {
        let scan = self
            .completed
            .take()
            .expect("touch processing without a completed scan");
        let zone = self.cadence.zone();
        let result = self.evaluator.evaluate(&mut self.driver, zone, scan);

        match self.cadence {
            Cadence::Fast => self.adapt_fast(result),
            Cadence::Slow => self.adapt_slow(result),
        }

        if self.tuning() {
            self.tuner.sync(&mut self.driver);
            debug!("tuner synced, {:?} cadence", self.cadence);
        }
    }

    fn adapt_fast(&mut self, result: TouchResult) {
        if result.detected {
            self.fast_cycles = FAST_CYCLES_RESET;
            if let Some(position) = result.position {
                info!("slider position = {}", position);
            }
        } else if self.fast_cycles < self.config.max_fast_cycles {
            self.fast_cycles += 1;
        } else {
            info!("fast scan time-out, switching to slow scan");
            self.set_cadence(Cadence::Slow);
        }
    }

    fn adapt_slow(&mut self, result: TouchResult) {
        if result.detected {
            info!("touch detected, switching to fast scan");
            self.fast_cycles = FAST_CYCLES_RESET;
            self.set_cadence(Cadence::Fast);
        }
    }

    fn set_cadence(&mut self, cadence: Cadence) {
        self.cadence = cadence;
        self.timer.set_period_ms(cadence.interval_ms(&self.config));
    }
}
