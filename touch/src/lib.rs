//! Adaptive-rate scan scheduling and touch detection for capacitive sensing.
//!
//! The [`scheduler::Scheduler`] is the single consumer of [`event::ScanEvents`].
//! A periodic timer posts `StartScan`, the sensing hardware posts
//! `ScanComplete` from its interrupt, and the scheduler decides when to scan,
//! when deep sleep may be entered, and how fast to poll based on touch history.
//!
//! Hardware is reached only through the traits in [`driver`]; [`tsc`],
//! [`button`] and [`linear`] are a front-end for the STM32 touch sensing
//! controller that the firmware plugs in behind those traits.

#![cfg_attr(not(test), no_std)]

pub mod button;
pub mod driver;
pub mod evaluate;
pub mod event;
pub mod linear;
pub mod power;
pub mod scheduler;
pub mod tsc;

#[cfg(test)]
mod mock;

pub use driver::{
    calibrate, LowPower, NoTuner, ScanTarget, ScanTimer, SensingDriver, TouchInfo, TunerLink, Zone,
};
pub use evaluate::{TouchEvaluator, TouchResult};
pub use event::{ScanEvent, ScanEvents};
pub use power::PowerState;
pub use scheduler::{Cadence, Scheduler, SchedulerState};

/// Detection state of one group of electrodes

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectState {
    /// Samples left to discard before calibration starts
    Settling(u16),
    /// Samples left to accumulate into the reference
    Calibrating(u16),
    /// Consecutive over-threshold samples still needed to become active
    Idle(u16),
    Active,
}

/// Configuration structure for all touch inputs
#[derive(Clone, Copy, Debug)]
pub struct TouchConfig {
    /// The number of counts of delta capacitance required to activate
    pub detect_threshold: u16,
    /// The hysteresis in deactivation. Once active, every delta must fall below
    /// `detect_threshold - detect_hysteresis` in order to deactivate.
    pub detect_hysteresis: u16,
    /// Number of samples to discard after initialization before starting calibration
    pub settle_samples: u16,
    /// Number of samples to collect for reference level calibration
    pub calibration_samples: u16,
    /// Number of positive samples required to transition to Active state
    pub debounce: u16,
}

impl TouchConfig {
    const fn default() -> Self {
        Self {
            detect_threshold: 100,
            detect_hysteresis: 5,
            settle_samples: 10,
            calibration_samples: 16,
            debounce: 2,
        }
    }
}

pub const DEFAULT_TOUCH_CONFIG: TouchConfig = TouchConfig::default();

/// Slider positions are reported in `0..FULL_SCALE`
pub const FULL_SCALE: u16 = 1024;

/// Selects how much of the sensor each cycle scans
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanMode {
    /// Scan only the zone armed by the current cadence, sleep deeply between scans
    Targeted,
    /// Scan every zone, keep deep sleep locked and sync the tuning link each cycle
    Tuning,
}

/// Timing of the scan scheduler
#[derive(Clone, Copy, Debug)]
pub struct ScanConfig {
    /// Timer period while a finger has been seen recently
    pub fast_interval_ms: u32,
    /// Timer period while idle
    pub slow_interval_ms: u32,
    /// Consecutive fast cycles without a new touch before dropping to slow cadence
    pub max_fast_cycles: u16,
    pub mode: ScanMode,
}

impl ScanConfig {
    const fn default() -> Self {
        Self {
            fast_interval_ms: 20,
            slow_interval_ms: 200,
            max_fast_cycles: 100,
            mode: ScanMode::Targeted,
        }
    }

    /// Same timing with a different scan mode
    pub const fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }
}

pub const DEFAULT_SCAN_CONFIG: ScanConfig = ScanConfig::default();
