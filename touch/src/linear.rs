use crate::button::Button;
use crate::{DetectState, TouchConfig, FULL_SCALE};

/// Interpolate a finger position from per-electrode deltas.
///
/// Electrodes are ordered left to right with equal pitch; electrode 0 maps to
/// position 0 and the last electrode to `FULL_SCALE - 1`. The centroid is taken
/// over the strongest electrode and its direct neighbours so that noise on far
/// electrodes does not pull the result.
pub fn centroid(deltas: &[u16], detect_threshold: u16) -> Option<u16> {
    let mut peak = 0;
    for i in 1..deltas.len() {
        if deltas[i] > deltas[peak] {
            peak = i;
        }
    }

    if deltas.is_empty() || deltas[peak] < detect_threshold {
        return None;
    }
    if deltas.len() == 1 {
        return Some(0);
    }

    let first = peak.saturating_sub(1);
    let last = (peak + 1).min(deltas.len() - 1);
    let mut weighted: u32 = 0;
    let mut total: u32 = 0;
    for i in first..=last {
        weighted += deltas[i] as u32 * i as u32;
        total += deltas[i] as u32;
    }

    // deltas are at most 14 bits and there are at most 3 terms, u32 is safe from overflow
    let span = (FULL_SCALE - 1) as u32 * weighted;
    Some((span / (total * (deltas.len() as u32 - 1))) as u16)
}

/// Linear slider made of `N` electrodes in a row
pub struct Slider<'a, const N: usize> {
    button: Button<'a, N>,
    position: Option<u16>,
    last_position: u16,
}

impl<'a, const N: usize> Slider<'a, N> {
    pub fn new(config: Option<&'a TouchConfig>) -> Self {
        Self {
            button: Button::new(config),
            position: None,
            last_position: 0,
        }
    }

    pub fn active(&self) -> bool {
        self.button.active()
    }

    pub fn calibrated(&self) -> bool {
        self.button.calibrated()
    }

    /// Position of the finger on the last sample, if touched
    pub fn position(&self) -> Option<u16> {
        self.position
    }

    /// Most recent position computed, kept after the finger lifts
    pub fn last_position(&self) -> u16 {
        self.last_position
    }

    pub fn deltas(&self) -> &[u16; N] {
        self.button.deltas()
    }

    /// Input a new sample for all electrodes
    ///
    /// Returns the position if a touch is detected
    pub fn push(&mut self, counts: [u16; N]) -> Option<u16> {
        self.position = match self.button.push(counts) {
            DetectState::Active => {
                centroid(self.button.deltas(), self.button.config().detect_threshold)
            }
            _ => None,
        };
        if let Some(p) = self.position {
            self.last_position = p;
        }
        self.position
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::button::test::calibrate;
    use crate::DEFAULT_TOUCH_CONFIG;

    #[test]
    fn test_centroid() {
        let detect_threshold = 15;

        assert_eq!(centroid(&[0, 100, 0], detect_threshold), Some(511));
        assert_eq!(centroid(&[200, 0, 0], detect_threshold), Some(0));
        assert_eq!(centroid(&[0, 0, 200], detect_threshold), Some(1023));
        assert_eq!(centroid(&[100, 100, 0], detect_threshold), Some(255));
        assert_eq!(centroid(&[0, 50, 150], detect_threshold), Some(895));

        let pos = centroid(&[0, detect_threshold - 1, 10], detect_threshold);
        assert!(pos.is_none(), "Failed to return none for signal below detect threshold");

        assert_eq!(centroid(&[], detect_threshold), None);
        assert_eq!(centroid(&[40], detect_threshold), Some(0));
    }

    #[test]
    fn test_centroid_ignores_far_electrodes() {
        assert_eq!(centroid(&[0, 0, 100, 0, 90], 15), centroid(&[0, 0, 100, 0, 0], 15));
    }

    #[test]
    fn test_slider_tracks_position() {
        let mut slider = Slider::new(Some(&DEFAULT_TOUCH_CONFIG));
        calibrate(&mut slider.button);

        const REF: u16 = 1000;
        assert_eq!(slider.push([REF - 300, REF, REF]), None, "active before debounce");
        assert_eq!(slider.push([REF - 300, REF, REF]), Some(0));
        assert!(slider.active());

        assert_eq!(slider.push([REF, REF, REF - 300]), Some(1023));

        assert_eq!(slider.push([REF; 3]), None);
        assert_eq!(slider.position(), None);
        assert_eq!(slider.last_position(), 1023);
    }
}
