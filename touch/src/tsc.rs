//! Driver for the STM32 Touch Sensing Controller.
//!
//! The controller is the same across several STM32 families. Register access
//! is compiled only when one of the PAC features is enabled; the sampling
//! configuration below is plain data and builds everywhere.
//!
//! `Tsc` accesses the TSC and RCC registers directly instead of taking the PAC
//! singletons. If the crate accepted a RegisterBlock from the user there would
//! be no way to ensure it uses the same PAC version as the top-level or HAL
//! crate. Don't touch the TSC registers elsewhere in the application.

#[cfg(feature = "stm32f0x1")]
use stm32f0::stm32f0x1 as pac;
#[cfg(feature = "stm32f303")]
use stm32f3::stm32f303 as pac;

/// One TSC I/O: group 1..=8, I/O 1..=4 within the group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Channel {
    group: u8,
    io: u8,
}

impl Channel {
    pub const fn new(group: u8, io: u8) -> Self {
        assert!(group >= 1 && group <= 8);
        assert!(io >= 1 && io <= 4);
        Self { group, io }
    }

    pub const fn group(&self) -> u8 {
        self.group
    }

    pub const fn io(&self) -> u8 {
        self.io
    }
}

const GROUP_ENABLED: u8 = 0x80;

/// The set of I/Os measured by one acquisition.
///
/// Each group byte holds bit 7 = enabled, bits 5:4 = sampling capacitor I/O
/// (zero based) and bits 3:0 = mask of channel I/Os.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleConfig {
    groups: [u8; 8],
}

impl SampleConfig {
    /// Create a new sample config with no groups enabled
    pub const fn new() -> Self {
        Self { groups: [0; 8] }
    }

    /// Enable the group of `cap` with `cap` as its sampling capacitor I/O
    pub const fn sample(mut self, cap: Channel) -> Self {
        let g = cap.group as usize - 1;
        assert!(self.groups[g] == 0, "group already has a sampling capacitor");
        self.groups[g] = GROUP_ENABLED | ((cap.io - 1) << 4);
        self
    }

    /// Measure `channel`. Its group must already have a sampling capacitor.
    pub const fn channel(mut self, channel: Channel) -> Self {
        let g = channel.group as usize - 1;
        assert!(self.groups[g] & GROUP_ENABLED != 0, "group has no sampling capacitor");
        assert!((self.groups[g] >> 4) & 0x3 != channel.io - 1, "channel is the sampling capacitor");
        self.groups[g] |= 1 << (channel.io - 1);
        self
    }

    /// Combine two configs into one acquisition. Groups may not overlap.
    pub const fn merge(mut self, other: SampleConfig) -> Self {
        let mut g = 0;
        while g < 8 {
            if other.groups[g] != 0 {
                assert!(self.groups[g] == 0, "merged configs share a group");
                self.groups[g] = other.groups[g];
            }
            g += 1;
        }
        self
    }

    pub fn is_enabled(&self, group: u8) -> bool {
        self.groups[group as usize - 1] & GROUP_ENABLED != 0
    }

    /// The IOGCSR, IOSCR and IOCCR words that select this config
    pub fn registers(&self) -> (u32, u32, u32) {
        let mut iogcsr: u32 = 0;
        let mut ioscr: u32 = 0;
        let mut ioccr: u32 = 0;

        for (gid, group) in self.groups.iter().enumerate() {
            if group & GROUP_ENABLED == 0 {
                continue;
            }
            let cap = ((group >> 4) & 0x3) as usize;
            let mask = (group & 0xf) as u32;

            iogcsr |= 1 << gid;
            ioscr |= 1 << (gid * 4 + cap);
            ioccr |= mask << (gid * 4);
        }

        (iogcsr, ioscr, ioccr)
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TscError {
    /// Acquisition did not finish in the allowed number of polls
    Timeout,
    /// A group hit the max count, usually an open or shorted electrode
    MaxCount,
}

#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub clock_prescale: Option<ClockPrescaler>,
    pub max_count: Option<MaxCount>,
    /// TSC cycles spent charging, 1..=16
    pub charge_transfer_high: Option<u8>,
    /// TSC cycles spent discharging, 1..=16
    pub charge_transfer_low: Option<u8>,
}

#[derive(Clone, Copy, Debug)]
pub enum ClockPrescaler {
    Hclk = 0b000,
    HclkDiv2 = 0b001,
    HclkDiv4 = 0b010,
    HclkDiv8 = 0b011,
    HclkDiv16 = 0b100,
    HclkDiv32 = 0b101,
    HclkDiv64 = 0b110,
    HclkDiv128 = 0b111,
}

#[derive(Clone, Copy, Debug)]
pub enum MaxCount {
    U255 = 0b000,
    U511 = 0b001,
    U1023 = 0b010,
    U2047 = 0b011,
    U4095 = 0b100,
    U8191 = 0b101,
    U16383 = 0b110,
}

impl MaxCount {
    pub fn to_count(&self) -> u16 {
        (256u16 << (*self as u8)) - 1
    }
}

/// Default charge transfer high/low time in cycles if not provided
#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
const DEFAULT_PULSE_CYCLES: u8 = 2;
/// Default input clock divider if not provided
#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
const DEFAULT_PRESCALE: ClockPrescaler = ClockPrescaler::HclkDiv16;
/// Default max count setting if not provided
#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
const DEFAULT_MAX_COUNT: MaxCount = MaxCount::U8191;

#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
fn pulse_bits(cycles: Option<u8>) -> u8 {
    let cycles = cycles.unwrap_or(DEFAULT_PULSE_CYCLES);
    assert!(cycles >= 1 && cycles <= 16);
    cycles - 1
}

#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
pub struct Tsc {
    tsc: &'static pac::tsc::RegisterBlock,
    max_count: u16,
}

#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
impl Tsc {
    pub fn new(config: Option<Config>) -> Self {
        // Enable and reset the TSC periph clock
        set_clock_enabled(true);
        let rcc = unsafe { &*pac::RCC::ptr() };
        rcc.ahbrstr.modify(|_, w| w.tscrst().set_bit());
        rcc.ahbrstr.modify(|_, w| w.tscrst().clear_bit());

        let config = config.unwrap_or(Config {
            clock_prescale: None,
            max_count: None,
            charge_transfer_high: None,
            charge_transfer_low: None,
        });

        let max_count = config.max_count.unwrap_or(DEFAULT_MAX_COUNT);
        let tsc = unsafe { &*pac::TSC::ptr() };

        tsc.cr.write(|w| unsafe {
            w.ctph().bits(pulse_bits(config.charge_transfer_high))
            .ctpl().bits(pulse_bits(config.charge_transfer_low))
            .sse().set_bit()
            .ssd().bits(16)
            .pgpsc().bits(config.clock_prescale.unwrap_or(DEFAULT_PRESCALE) as u8)
            .mcv().bits(max_count as u8)
            .tsce().set_bit()
        });

        Self {
            tsc,
            max_count: max_count.to_count(),
        }
    }

    /// True while an acquisition is running
    pub fn is_busy(&self) -> bool {
        self.tsc.cr.read().start().bit_is_set()
    }

    /// Select the I/Os of `config` and begin an acquisition
    pub fn start(&mut self, config: &SampleConfig) {
        let (iogcsr, ioscr, ioccr) = config.registers();

        self.tsc.iogcsr.write(|w| unsafe { w.bits(iogcsr) });
        self.tsc.ioscr.write(|w| unsafe { w.bits(ioscr) });
        self.tsc.ioccr.write(|w| unsafe { w.bits(ioccr) });

        self.clear_flags();
        self.tsc.cr.modify(|_, w| w.iodef().clear_bit());
        self.tsc.cr.modify(|_, w| w.start().set_bit());
    }

    /// Run one acquisition to completion by polling, giving up after `max_polls`
    pub fn acquire(&mut self, config: &SampleConfig, max_polls: u32) -> Result<(), TscError> {
        self.start(config);
        let mut polls = 0;
        while !self.is_finished() {
            polls += 1;
            if polls > max_polls {
                return Err(TscError::Timeout);
            }
        }
        let max_count_hit = self.tsc.isr.read().mcef().bit_is_set();
        self.clear_flags();
        if max_count_hit {
            Err(TscError::MaxCount)
        } else {
            Ok(())
        }
    }

    /// Poll flags to see if acquisition has completed
    pub fn is_finished(&self) -> bool {
        let isr = self.tsc.isr.read();
        isr.eoaf().bit_is_set() || isr.mcef().bit_is_set()
    }

    /// Read the count of one group from the last acquisition
    ///
    /// A group that did not complete before the max count was reached reads
    /// as `max_count + 1`.
    ///
    /// group: The group number to read, starting at 1
    pub fn read_group(&self, group: u8) -> u16 {
        let group_status = self.tsc.iogcsr.read().bits() >> 16;

        if group_status & (1 << (group - 1)) == 0 {
            self.max_count + 1
        } else {
            match group {
                1 => self.tsc.iog1cr.read().cnt().bits(),
                2 => self.tsc.iog2cr.read().cnt().bits(),
                3 => self.tsc.iog3cr.read().cnt().bits(),
                4 => self.tsc.iog4cr.read().cnt().bits(),
                5 => self.tsc.iog5cr.read().cnt().bits(),
                6 => self.tsc.iog6cr.read().cnt().bits(),
                _ => 0,
            }
        }
    }

    /// Clear interrupt flags
    pub fn clear_flags(&mut self) {
        acknowledge();
    }

    /// Enable both interrupts
    pub fn listen(&mut self) {
        self.tsc.ier.write(|w| {
            w.eoaie().set_bit()
            .mceie().set_bit()
        });
    }

    /// Disable both interrupts
    pub fn unlisten(&mut self) {
        self.tsc.ier.write(|w| {
            w.eoaie().clear_bit()
            .mceie().clear_bit()
        });
    }
}

/// Clear the end-of-acquisition and max-count flags.
///
/// For the TSC interrupt handler, which does not own the `Tsc`.
#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
pub fn acknowledge() {
    let tsc = unsafe { &*pac::TSC::ptr() };
    tsc.icr.write(|w| {
        w.eoaic().set_bit() // end-of-acquisition
        .mceic().set_bit() // max-count-error
    });
}

/// Gate the TSC peripheral clock. Register contents survive while gated.
#[cfg(any(feature = "stm32f0x1", feature = "stm32f303"))]
pub fn set_clock_enabled(enabled: bool) {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.ahbenr.modify(|_, w| w.tscen().bit(enabled));
}

#[cfg(test)]
pub mod test {
    use super::*;

    const SLIDER: SampleConfig = SampleConfig::new()
        .sample(Channel::new(1, 2))
        .channel(Channel::new(1, 1))
        .sample(Channel::new(3, 4))
        .channel(Channel::new(3, 2));

    #[test]
    fn test_registers() {
        let (iogcsr, ioscr, ioccr) = SLIDER.registers();
        assert_eq!(iogcsr, 0b101);
        assert_eq!(ioscr, (1 << 1) | (1 << (2 * 4 + 3)));
        assert_eq!(ioccr, 1 | (1 << (2 * 4 + 1)));
        assert!(SLIDER.is_enabled(1));
        assert!(!SLIDER.is_enabled(2));
    }

    #[test]
    fn test_merge() {
        let wake = SampleConfig::new()
            .sample(Channel::new(6, 2))
            .channel(Channel::new(6, 1));
        let all = SLIDER.merge(wake);

        let (iogcsr, ioscr, ioccr) = all.registers();
        let (s_gcsr, s_scr, s_ccr) = SLIDER.registers();
        let (w_gcsr, w_scr, w_ccr) = wake.registers();
        assert_eq!(iogcsr, s_gcsr | w_gcsr);
        assert_eq!(ioscr, s_scr | w_scr);
        assert_eq!(ioccr, s_ccr | w_ccr);
    }

    #[test]
    #[should_panic(expected = "share a group")]
    fn test_merge_overlap_panics() {
        let other = SampleConfig::new().sample(Channel::new(1, 3));
        SLIDER.merge(other);
    }

    #[test]
    #[should_panic(expected = "sampling capacitor")]
    fn test_channel_on_cap_panics() {
        SampleConfig::new()
            .sample(Channel::new(2, 1))
            .channel(Channel::new(2, 1));
    }

    #[test]
    fn test_max_count() {
        assert_eq!(MaxCount::U255.to_count(), 255);
        assert_eq!(MaxCount::U8191.to_count(), 8191);
        assert_eq!(MaxCount::U16383.to_count(), 16383);
    }
}
