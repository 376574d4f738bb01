use crate::pac;
use crate::hal::rcc::Rcc;

/// Counter ticks per millisecond after the prescaler
const TICKS_PER_MS: u32 = 10;

/// TIM2 as the scan timer. Its update interrupt posts `StartScan`.
pub struct Tim2ScanTimer {
    tim: pac::TIM2,
}

impl Tim2ScanTimer {
    pub fn new(tim: pac::TIM2, rcc: &mut Rcc) -> Self {
        let rccregs = unsafe { pac::Peripherals::steal().RCC };
        rccregs.apb1enr.modify(|_, w| w.tim2en().set_bit());

        // If pclk is prescaled from hclk, the frequency fed into the timers is doubled
        let clk_freq = if rcc.clocks.hclk().0 == rcc.clocks.pclk().0 {
            rcc.clocks.pclk().0
        } else {
            rcc.clocks.pclk().0 * 2
        };

        let psc = clk_freq / (TICKS_PER_MS * 1000) - 1;
        tim.psc.write(|w| unsafe { w.psc().bits(psc as u16) });

        // Buffer ARR so a new period only applies from the next update
        tim.cr1.modify(|_, w| w.arpe().set_bit());

        Self { tim }
    }

    fn load_period(&mut self, period_ms: u32) {
        let arr = period_ms * TICKS_PER_MS - 1;
        self.tim.arr.write(|w| w.arr().bits(arr));
    }
}

impl capscan::ScanTimer for Tim2ScanTimer {
    fn start(&mut self, period_ms: u32) {
        self.load_period(period_ms);
        // Latch PSC and ARR, then drop the update flag that UG just raised
        self.tim.egr.write(|w| w.ug().set_bit());
        self.tim.sr.write(|w| unsafe { w.bits(0) });
        self.tim.dier.write(|w| w.uie().set_bit());
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    fn set_period_ms(&mut self, period_ms: u32) {
        self.load_period(period_ms);
    }
}

/// Clear the TIM2 update flag from its interrupt handler
pub fn acknowledge() {
    let tim2 = unsafe { pac::Peripherals::steal().TIM2 };
    tim2.sr.write(|w| unsafe { w.bits(0) });
}
