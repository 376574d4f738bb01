use crate::{DetectState, TouchConfig, DEFAULT_TOUCH_CONFIG};

/// Presence detection over `N` electrodes that act as one button.
///
/// The TSC count falls when a finger adds capacitance, so the delta of an
/// electrode is its calibrated reference minus the latest count.
pub struct Button<'a, const N: usize> {
    reference: [u32; N],
    deltas: [u16; N],
    state: DetectState,
    config: &'a TouchConfig,
}

impl<'a, const N: usize> Button<'a, N> {
    pub fn new(config: Option<&'a TouchConfig>) -> Self {
        let config = config.unwrap_or(&DEFAULT_TOUCH_CONFIG);
        Self {
            reference: [0; N],
            deltas: [0; N],
            state: DetectState::Settling(config.settle_samples),
            config,
        }
    }

    pub fn active(&self) -> bool {
        self.state == DetectState::Active
    }

    pub fn calibrated(&self) -> bool {
        matches!(self.state, DetectState::Idle(_) | DetectState::Active)
    }

    pub fn state(&self) -> DetectState {
        self.state
    }

    pub fn config(&self) -> &TouchConfig {
        self.config
    }

    /// Deltas of the last sample, all zero until calibrated
    pub fn deltas(&self) -> &[u16; N] {
        &self.deltas
    }

    /// Process a new measurement for every electrode
    pub fn push(&mut self, counts: [u16; N]) -> DetectState {
        if self.calibrated() {
            for i in 0..N {
                self.deltas[i] = (self.reference[i] as u16).saturating_sub(counts[i]);
            }
        }

        let release = self
            .config
            .detect_threshold
            .saturating_sub(self.config.detect_hysteresis);

        self.state = match self.state {
            DetectState::Settling(0) => DetectState::Calibrating(self.config.calibration_samples),
            DetectState::Settling(left) => DetectState::Settling(left - 1),
            DetectState::Calibrating(left) => {
                for i in 0..N {
                    self.reference[i] += counts[i] as u32;
                }
                if left <= 1 {
                    let samples = self.config.calibration_samples.max(1) as u32;
                    for r in self.reference.iter_mut() {
                        *r /= samples;
                    }
                    DetectState::Idle(self.config.debounce)
                } else {
                    DetectState::Calibrating(left - 1)
                }
            }
            DetectState::Idle(left) => {
                if self.deltas.iter().any(|d| *d >= self.config.detect_threshold) {
                    if left <= 1 {
                        DetectState::Active
                    } else {
                        DetectState::Idle(left - 1)
                    }
                } else {
                    DetectState::Idle(self.config.debounce)
                }
            }
            DetectState::Active => {
                if self.deltas.iter().all(|d| *d < release) {
                    DetectState::Idle(self.config.debounce)
                } else {
                    DetectState::Active
                }
            }
        };

        self.state
    }
}
