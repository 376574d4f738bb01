#![no_main]
#![no_std]

use cortex_m_rt::entry;
use panic_halt as _;

use stm32f0xx_hal as hal;

use capscan::tsc::{self, TscError};
use capscan::{ScanConfig, ScanEvent, ScanEvents, Scheduler, TouchConfig, DEFAULT_SCAN_CONFIG};

use crate::hal::pac;
use crate::hal::pac::interrupt;
use crate::hal::prelude::*;

mod power;
mod scan_timer;
mod sensor;
mod serial;
#[cfg(feature = "tuning")]
mod tuner;

use power::TscSleep;
use scan_timer::Tim2ScanTimer;
use sensor::TscSensor;

static SCAN_EVENTS: ScanEvents = ScanEvents::new();

static TOUCH_CONFIG: TouchConfig = TouchConfig {
    detect_threshold: 100,
    detect_hysteresis: 5,
    settle_samples: 10,
    calibration_samples: 10,
    debounce: 3,
};

#[cfg(not(feature = "tuning"))]
const SCAN_CONFIG: ScanConfig = DEFAULT_SCAN_CONFIG;
#[cfg(feature = "tuning")]
const SCAN_CONFIG: ScanConfig = DEFAULT_SCAN_CONFIG.with_mode(capscan::ScanMode::Tuning);

#[cfg(not(feature = "tuning"))]
type Tuner = capscan::NoTuner;
#[cfg(feature = "tuning")]
type Tuner = tuner::SerialTuner;

// Only the top two priority bits exist on the M0. The scan-complete interrupt
// must be able to preempt the timer.
const TSC_IRQ_PRIO: u8 = 0x40;
const TIM2_IRQ_PRIO: u8 = 0x80;
const USART1_IRQ_PRIO: u8 = 0xc0;

#[derive(Debug)]
enum InitError {
    /// Peripherals were already taken
    Peripherals,
    /// The touch sensing controller failed its start-up acquisition
    Sensor(TscError),
}

struct Board {
    sensor: TscSensor,
    timer: Tim2ScanTimer,
}

#[entry]
fn main() -> ! {
    let board = match init() {
        Ok(board) => board,
        Err(e) => halt(e),
    };

    let scheduler = Scheduler::new(
        board.sensor,
        board.timer,
        TscSleep::new(),
        Tuner::default(),
        &SCAN_EVENTS,
        SCAN_CONFIG,
    );
    scheduler.run()
}

fn init() -> Result<Board, InitError> {
    let dp = pac::Peripherals::take().ok_or(InitError::Peripherals)?;
    let cp = cortex_m::Peripherals::take().ok_or(InitError::Peripherals)?;
    let mut nvic = cp.NVIC;

    let mut flash = dp.FLASH;
    let mut rcc = dp.RCC.configure().sysclk(48.mhz()).freeze(&mut flash);
    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    // A library requiring a critical section to set a gpio AF register is bad and I just won't.
    let fake_cs = unsafe { cortex_m::interrupt::CriticalSection::new() };

    let tx_pin = gpiob.pb6.into_alternate_af0(&fake_cs);
    let rx_pin = gpiob.pb7.into_alternate_af0(&fake_cs);
    let uart = hal::serial::Serial::usart1(dp.USART1, (tx_pin, rx_pin), 115200.bps(), &mut rcc);
    serial::uart1::init(uart, USART1_IRQ_PRIO);
    serial::logger::init(log::LevelFilter::Info);

    // Slider electrodes and sampling caps
    let _slider1 = gpioa.pa0.into_alternate_af3(&fake_cs);
    let _slider2 = gpioa.pa4.into_alternate_af3(&fake_cs);
    let _slider3 = gpiob.pb0.into_alternate_af3(&fake_cs);
    let _g1_cap = gpioa.pa1.into_alternate_af3(&fake_cs);
    let _g2_cap = gpioa.pa6.into_alternate_af3(&fake_cs);
    let _g3_cap = gpiob.pb2.into_alternate_af3(&fake_cs);
    // Ganged wake electrode and its sampling cap
    let _ganged = gpiob.pb11.into_alternate_af3(&fake_cs);
    let _g6_cap = gpiob.pb12.into_alternate_af3(&fake_cs);

    let sensor = TscSensor::new(&TOUCH_CONFIG).map_err(InitError::Sensor)?;
    let timer = Tim2ScanTimer::new(dp.TIM2, &mut rcc);

    unsafe {
        nvic.set_priority(pac::Interrupt::TSC, TSC_IRQ_PRIO);
        nvic.set_priority(pac::Interrupt::TIM2, TIM2_IRQ_PRIO);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TSC);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM2);
    }

    log::info!("touch sensing ready");
    Ok(Board { sensor, timer })
}

/// Nothing recovers a sensor that failed to come up. Stay halted for the debugger.
fn halt(err: InitError) -> ! {
    log::error!("init failed: {:?}", err);
    panic!("init failed");
}

#[interrupt]
fn TSC() {
    tsc::acknowledge();
    SCAN_EVENTS.post(ScanEvent::ScanComplete);
}

#[interrupt]
fn TIM2() {
    scan_timer::acknowledge();
    SCAN_EVENTS.post(ScanEvent::StartScan);
}
