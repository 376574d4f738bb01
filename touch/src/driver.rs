//! Interfaces the scheduler needs from the board.
//!
//! Everything here is called from the scheduler task only. Interrupt handlers
//! talk to the scheduler exclusively through [`ScanEvents`].

use crate::event::{ScanEvent, ScanEvents};

/// A logical sensing zone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    /// Linear slider, reports a position. Scanned at the fast cadence.
    Slider,
    /// Ganged electrodes acting as one presence button. Scanned at the slow cadence.
    Ganged,
}

/// What a scan or result-processing step covers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanTarget {
    Zone(Zone),
    All,
}

impl ScanTarget {
    pub fn covers(self, zone: Zone) -> bool {
        match self {
            Self::Zone(z) => z == zone,
            Self::All => true,
        }
    }
}

/// Processed touch state of a positional zone
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchInfo {
    /// Number of contacts, 0 when untouched
    pub count: u8,
    /// Last computed position in `0..FULL_SCALE`
    pub position: u16,
}

/// The sensing hardware and its signal processing
///
/// Implementations post [`ScanEvent::ScanComplete`] from their completion
/// interrupt once per finished scan.
pub trait SensingDriver {
    fn is_busy(&self) -> bool;

    /// Begin a scan. Only called when `is_busy()` returned false.
    fn start_scan(&mut self, target: ScanTarget);

    /// Turn the raw counts of the last completed scan into touch state
    fn process_scan(&mut self, target: ScanTarget);

    fn touch_info(&self, zone: Zone) -> TouchInfo;

    fn is_zone_active(&self, zone: Zone) -> bool;

    /// Whether every zone has a reference level to detect touches against
    fn is_calibrated(&self) -> bool {
        true
    }
}

/// Feed full scans to `driver` until every zone is calibrated.
///
/// `acquire` runs one scan over all zones to completion. Returns the number of
/// scans taken.
pub fn calibrate<D, E, F>(driver: &mut D, mut acquire: F) -> Result<u32, E>
where
    D: SensingDriver,
    F: FnMut(&mut D) -> Result<(), E>,
{
    let mut scans = 0;
    while !driver.is_calibrated() {
        acquire(driver)?;
        driver.process_scan(ScanTarget::All);
        scans += 1;
    }
    Ok(scans)
}

/// Periodic source of [`ScanEvent::StartScan`]
pub trait ScanTimer {
    fn start(&mut self, period_ms: u32);

    /// Takes effect from the next expiry. Must not fire immediately.
    fn set_period_ms(&mut self, period_ms: u32);
}

/// Platform power primitives
pub trait LowPower {
    fn disallow_deep_sleep(&mut self);

    fn allow_deep_sleep(&mut self);

    /// Park the core until an interrupt has fired.
    ///
    /// Must return without sleeping when `awaiting` is already pending in
    /// `events`, and must not lose a post that races with going to sleep.
    fn sleep(&mut self, events: &ScanEvents, awaiting: ScanEvent);
}

/// Diagnostic link to an external tuning tool
pub trait TunerLink<D> {
    /// Called once per processed scan in [`ScanMode::Tuning`](crate::ScanMode::Tuning)
    fn sync(&mut self, driver: &mut D);
}

/// Tuning link for builds without one
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTuner;

impl<D> TunerLink<D> for NoTuner {
    fn sync(&mut self, _driver: &mut D) {}
}
