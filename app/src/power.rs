use capscan::{LowPower, ScanEvent, ScanEvents};
use capscan::tsc;

/// Sleep policy for the F051.
///
/// The part's Stop mode would also stop TIM2, so the scan timer could never
/// wake it. Deep sleep here means the core sleeps on `wfi` with the TSC clock
/// gated; while deep sleep is disallowed the TSC keeps its clock so a running
/// acquisition can finish.
pub struct TscSleep {
    deep_sleep_allowed: bool,
}

impl TscSleep {
    pub fn new() -> Self {
        Self { deep_sleep_allowed: false }
    }
}

impl LowPower for TscSleep {
    fn disallow_deep_sleep(&mut self) {
        self.deep_sleep_allowed = false;
    }

    fn allow_deep_sleep(&mut self) {
        self.deep_sleep_allowed = true;
    }

    fn sleep(&mut self, events: &ScanEvents, awaiting: ScanEvent) {
        // With interrupts masked a post can't slip in between the check and
        // wfi. A pending interrupt still wakes wfi and runs once unmasked.
        cortex_m::interrupt::free(|_| {
            if events.is_pending(awaiting) {
                return;
            }
            if self.deep_sleep_allowed {
                tsc::set_clock_enabled(false);
            }
            cortex_m::asm::wfi();
            if self.deep_sleep_allowed {
                tsc::set_clock_enabled(true);
            }
        });
    }
}
