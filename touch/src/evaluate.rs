//! Turns processed scan results into debounced touch events.

use crate::driver::{ScanTarget, SensingDriver, Zone};

/// Proof that a scan finished and its results have not been processed yet.
///
/// Only the scheduler creates these, when it consumes a `ScanComplete` event.
#[derive(Debug)]
pub struct CompletedScan {
    target: ScanTarget,
}

impl CompletedScan {
    pub(crate) fn new(target: ScanTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> ScanTarget {
        self.target
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchResult {
    /// A new touch was seen on this evaluation
    pub detected: bool,
    /// Where, for positional zones with a new touch
    pub position: Option<u16>,
}

impl TouchResult {
    pub const NONE: Self = Self {
        detected: false,
        position: None,
    };

    const fn at(position: u16) -> Self {
        Self {
            detected: true,
            position: Some(position),
        }
    }

    const fn present() -> Self {
        Self {
            detected: true,
            position: None,
        }
    }
}

/// Decides whether the latest scan of a zone holds a new touch.
///
/// The slider debounces by stillness: a held finger that does not move is
/// reported once. The previous position is updated on every evaluation, also
/// when nothing is reported.
#[derive(Debug, Default)]
pub struct TouchEvaluator {
    last_position: Option<u16>,
}

impl TouchEvaluator {
    pub const fn new() -> Self {
        Self { last_position: None }
    }

    /// Process `scan` on `driver` and interpret the result for `zone`.
    ///
    /// Panics if `scan` did not cover `zone`.
    pub fn evaluate<D: SensingDriver>(
        &mut self,
        driver: &mut D,
        zone: Zone,
        scan: CompletedScan,
    ) -> TouchResult {
        assert!(
            scan.target.covers(zone),
            "evaluating {:?} from a scan of {:?}",
            zone,
            scan.target
        );
        driver.process_scan(scan.target);

        match zone {
            Zone::Slider => {
                let info = driver.touch_info(zone);
                let moved = self.last_position != Some(info.position);
                self.last_position = Some(info.position);

                if info.count > 0 && moved {
                    TouchResult::at(info.position)
                } else {
                    TouchResult::NONE
                }
            }
            Zone::Ganged => {
                if driver.is_zone_active(zone) {
                    TouchResult::present()
                } else {
                    TouchResult::NONE
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::TouchInfo;
    use crate::mock::{Bench, Call, MockDriver};

    fn slider_scan() -> CompletedScan {
        CompletedScan::new(ScanTarget::Zone(Zone::Slider))
    }

    #[test]
    fn test_slider_reports_movement_only() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();

        bench.touch_slider(Some(50));
        let r = evaluator.evaluate(&mut driver, Zone::Slider, slider_scan());
        assert_eq!(r, TouchResult { detected: true, position: Some(50) });

        // Finger held still
        let r = evaluator.evaluate(&mut driver, Zone::Slider, slider_scan());
        assert_eq!(r, TouchResult { detected: false, position: None });

        bench.touch_slider(Some(62));
        let r = evaluator.evaluate(&mut driver, Zone::Slider, slider_scan());
        assert_eq!(r, TouchResult { detected: true, position: Some(62) });

        assert_eq!(bench.calls(), [Call::Process(ScanTarget::Zone(Zone::Slider)); 3]);
    }

    #[test]
    fn test_slider_lift_updates_previous_position() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();

        bench.touch_slider(Some(300));
        assert!(evaluator.evaluate(&mut driver, Zone::Slider, slider_scan()).detected);

        // Lifted, driver still reports the stale position
        bench.touch_slider(None);
        assert!(!evaluator.evaluate(&mut driver, Zone::Slider, slider_scan()).detected);

        // Touching the same spot again is not a new touch
        bench.touch_slider(Some(300));
        assert!(!evaluator.evaluate(&mut driver, Zone::Slider, slider_scan()).detected);
    }

    #[test]
    fn test_position_recorded_without_contact() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();

        bench.touch_slider(Some(300));
        assert!(evaluator.evaluate(&mut driver, Zone::Slider, slider_scan()).detected);

        // No contact, but the driver has moved on to a new position
        bench.report_slider(TouchInfo { count: 0, position: 400 });
        let r = evaluator.evaluate(&mut driver, Zone::Slider, slider_scan());
        assert_eq!(r, TouchResult::NONE);

        // Contact at the position already seen is not a new touch
        bench.touch_slider(Some(400));
        let r = evaluator.evaluate(&mut driver, Zone::Slider, slider_scan());
        assert_eq!(r, TouchResult { detected: false, position: None });
    }

    #[test]
    fn test_first_touch_at_zero_is_new() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();

        bench.touch_slider(Some(0));
        let r = evaluator.evaluate(&mut driver, Zone::Slider, slider_scan());
        assert_eq!(r.position, Some(0));
    }

    #[test]
    fn test_ganged_presence() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();
        let scan = || CompletedScan::new(ScanTarget::Zone(Zone::Ganged));

        assert_eq!(evaluator.evaluate(&mut driver, Zone::Ganged, scan()), TouchResult::NONE);

        bench.touch_ganged(true);
        let r = evaluator.evaluate(&mut driver, Zone::Ganged, scan());
        assert_eq!(r, TouchResult { detected: true, position: None });

        // Presence has no stillness debounce
        assert!(evaluator.evaluate(&mut driver, Zone::Ganged, scan()).detected);
    }

    #[test]
    fn test_all_zone_scan_processes_everything() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();

        bench.touch_slider(Some(10));
        let r = evaluator.evaluate(&mut driver, Zone::Slider, CompletedScan::new(ScanTarget::All));
        assert!(r.detected);
        assert_eq!(bench.calls(), [Call::Process(ScanTarget::All)]);
    }

    #[test]
    #[should_panic(expected = "evaluating Slider")]
    fn test_zone_outside_scan_panics() {
        let bench = Bench::new();
        let mut driver = MockDriver::new(&bench);
        let mut evaluator = TouchEvaluator::new();
        evaluator.evaluate(
            &mut driver,
            Zone::Slider,
            CompletedScan::new(ScanTarget::Zone(Zone::Ganged)),
        );
    }
}
