use capscan::button::Button;
use capscan::linear::Slider;
use capscan::tsc::{self, Channel, ClockPrescaler, MaxCount, SampleConfig, Tsc, TscError};
use capscan::{calibrate, ScanTarget, SensingDriver, TouchConfig, TouchInfo, Zone};

/// Slider electrodes, left to right, one per group
const SLIDER_SAMPLES: SampleConfig = SampleConfig::new()
    .sample(Channel::new(1, 2)).channel(Channel::new(1, 1))
    .sample(Channel::new(2, 3)).channel(Channel::new(2, 1))
    .sample(Channel::new(3, 4)).channel(Channel::new(3, 2));
const SLIDER_GROUPS: [u8; 3] = [1, 2, 3];

/// Ganged wake electrode around the slider
const GANGED_SAMPLES: SampleConfig = SampleConfig::new()
    .sample(Channel::new(6, 2)).channel(Channel::new(6, 1));
const GANGED_GROUPS: [u8; 1] = [6];

const ALL_SAMPLES: SampleConfig = SLIDER_SAMPLES.merge(GANGED_SAMPLES);

const TSC_CONFIG: tsc::Config = tsc::Config {
    clock_prescale: Some(ClockPrescaler::HclkDiv16),
    max_count: Some(MaxCount::U8191),
    charge_transfer_high: None,
    charge_transfer_low: None,
};

/// Upper bound on polls for each start-up acquisition
const SELF_TEST_POLLS: u32 = 1_000_000;

/// The TSC with the slider and ganged electrode behind the scheduler's facade
pub struct TscSensor {
    tsc: Tsc,
    slider: Slider<'static, 3>,
    ganged: Button<'static, 1>,
}

impl TscSensor {
    /// Bring up the TSC and calibrate every electrode with polled acquisitions.
    ///
    /// The slow cadence only scans the ganged electrode, so it must hold a
    /// reference before the scheduler runs. Interrupts are enabled only after
    /// every acquisition passed.
    pub fn new(config: &'static TouchConfig) -> Result<Self, TscError> {
        let mut sensor = Self {
            tsc: Tsc::new(Some(TSC_CONFIG)),
            slider: Slider::new(Some(config)),
            ganged: Button::new(Some(config)),
        };
        let scans = calibrate(&mut sensor, |s| s.tsc.acquire(&ALL_SAMPLES, SELF_TEST_POLLS))?;
        log::debug!("electrodes calibrated after {} scans", scans);
        sensor.tsc.listen();

        Ok(sensor)
    }

    #[cfg(feature = "tuning")]
    pub fn slider(&self) -> &Slider<'static, 3> {
        &self.slider
    }

    #[cfg(feature = "tuning")]
    pub fn ganged(&self) -> &Button<'static, 1> {
        &self.ganged
    }

    fn read<const N: usize>(&self, groups: [u8; N]) -> [u16; N] {
        groups.map(|g| self.tsc.read_group(g))
    }
}

impl SensingDriver for TscSensor {
    fn is_busy(&self) -> bool {
        self.tsc.is_busy()
    }

    fn start_scan(&mut self, target: ScanTarget) {
        let samples = match target {
            ScanTarget::Zone(Zone::Slider) => &SLIDER_SAMPLES,
            ScanTarget::Zone(Zone::Ganged) => &GANGED_SAMPLES,
            ScanTarget::All => &ALL_SAMPLES,
        };
        self.tsc.start(samples);
    }

    fn process_scan(&mut self, target: ScanTarget) {
        if target.covers(Zone::Slider) {
            let counts = self.read(SLIDER_GROUPS);
            self.slider.push(counts);
        }
        if target.covers(Zone::Ganged) {
            let counts = self.read(GANGED_GROUPS);
            self.ganged.push(counts);
        }
    }

    fn touch_info(&self, zone: Zone) -> TouchInfo {
        match zone {
            Zone::Slider => TouchInfo {
                count: self.slider.position().is_some() as u8,
                position: self.slider.last_position(),
            },
            Zone::Ganged => TouchInfo {
                count: self.ganged.active() as u8,
                position: 0,
            },
        }
    }

    fn is_zone_active(&self, zone: Zone) -> bool {
        match zone {
            Zone::Slider => self.slider.active(),
            Zone::Ganged => self.ganged.active(),
        }
    }

    fn is_calibrated(&self) -> bool {
        self.slider.calibrated() && self.ganged.calibrated()
    }
}
