//! Recording test doubles for the board traits.
//!
//! All doubles share one [`Bench`], which holds the scripted inputs and an
//! ordered journal of every call made into the board.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::driver::{LowPower, ScanTarget, ScanTimer, SensingDriver, TouchInfo, TunerLink, Zone};
use crate::event::{ScanEvent, ScanEvents};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    StartScan(ScanTarget),
    Process(ScanTarget),
    DisallowDeepSleep,
    AllowDeepSleep,
    Sleep { awaiting: ScanEvent, locked: bool },
    TimerStart(u32),
    TimerPeriod(u32),
    TunerSync,
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    deliveries: VecDeque<ScanEvent>,
    locked: bool,
    busy_polls: u32,
    slider: TouchInfo,
    ganged_active: bool,
}

#[derive(Clone, Default)]
pub struct Bench(Rc<RefCell<Inner>>);

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.borrow_mut().calls.clear();
    }

    /// Events posted one per sleep, in order
    pub fn deliver(&self, events: &[ScanEvent]) {
        self.0.borrow_mut().deliveries.extend(events);
    }

    /// Report busy for the next `polls` busy queries
    pub fn set_busy(&self, polls: u32) {
        self.0.borrow_mut().busy_polls = polls;
    }

    /// Finger on the slider at `position`, or lifted when `None`
    pub fn touch_slider(&self, position: Option<u16>) {
        let mut inner = self.0.borrow_mut();
        match position {
            Some(p) => {
                inner.slider.count = 1;
                inner.slider.position = p;
            }
            None => inner.slider.count = 0,
        }
    }

    /// Raw slider report, for positions that move without contact
    pub fn report_slider(&self, info: TouchInfo) {
        self.0.borrow_mut().slider = info;
    }

    pub fn touch_ganged(&self, active: bool) {
        self.0.borrow_mut().ganged_active = active;
    }

    fn record(&self, call: Call) {
        self.0.borrow_mut().calls.push(call);
    }
}

pub struct MockDriver(Bench);

impl MockDriver {
    pub fn new(bench: &Bench) -> Self {
        Self(bench.clone())
    }
}

impl SensingDriver for MockDriver {
    fn is_busy(&self) -> bool {
        let mut inner = self.0 .0.borrow_mut();
        if inner.busy_polls > 0 {
            inner.busy_polls -= 1;
            true
        } else {
            false
        }
    }

    fn start_scan(&mut self, target: ScanTarget) {
        self.0.record(Call::StartScan(target));
    }

    fn process_scan(&mut self, target: ScanTarget) {
        self.0.record(Call::Process(target));
    }

    fn touch_info(&self, zone: Zone) -> TouchInfo {
        assert_eq!(zone, Zone::Slider, "position requested for a presence-only zone");
        self.0 .0.borrow().slider
    }

    fn is_zone_active(&self, zone: Zone) -> bool {
        match zone {
            Zone::Slider => self.0 .0.borrow().slider.count > 0,
            Zone::Ganged => self.0 .0.borrow().ganged_active,
        }
    }
}

pub struct MockTimer(Bench);

impl MockTimer {
    pub fn new(bench: &Bench) -> Self {
        Self(bench.clone())
    }
}

impl ScanTimer for MockTimer {
    fn start(&mut self, period_ms: u32) {
        self.0.record(Call::TimerStart(period_ms));
    }

    fn set_period_ms(&mut self, period_ms: u32) {
        self.0.record(Call::TimerPeriod(period_ms));
    }
}

pub struct MockPower(Bench);

impl MockPower {
    pub fn new(bench: &Bench) -> Self {
        Self(bench.clone())
    }
}

impl LowPower for MockPower {
    fn disallow_deep_sleep(&mut self) {
        self.0 .0.borrow_mut().locked = true;
        self.0.record(Call::DisallowDeepSleep);
    }

    fn allow_deep_sleep(&mut self) {
        self.0 .0.borrow_mut().locked = false;
        self.0.record(Call::AllowDeepSleep);
    }

    fn sleep(&mut self, events: &ScanEvents, awaiting: ScanEvent) {
        let locked = self.0 .0.borrow().locked;
        self.0.record(Call::Sleep { awaiting, locked });
        let next = self.0 .0.borrow_mut().deliveries.pop_front();
        match next {
            Some(event) => events.post(event),
            None => panic!("blocked waiting for {:?} with nothing left to deliver", awaiting),
        }
    }
}

pub struct MockTuner(Bench);

impl MockTuner {
    pub fn new(bench: &Bench) -> Self {
        Self(bench.clone())
    }
}

impl TunerLink<MockDriver> for MockTuner {
    fn sync(&mut self, _driver: &mut MockDriver) {
        self.0.record(Call::TunerSync);
    }
}
