/// An IRQ driven, transmit-only serial port and the logger on top of it
///
pub mod uart1 {
    use crate::interrupt;
    use crate::hal::{
        pac,
        prelude::*,
        serial::{
            Event,
            Serial,
        }
    };
    use heapless::spsc::{Consumer, Producer, Queue};
    use stm32f0xx_hal::gpio::{
        gpiob,
        Alternate,
        AF0,
    };

    const TX_Q_SIZE: usize = 256;

    static mut TX_Q_CONSUMER: Option<Consumer<u8, TX_Q_SIZE>> = None;
    static mut TX_Q_PRODUCER: Option<Producer<u8, TX_Q_SIZE>> = None;

    pub type TxPinType = gpiob::PB6<Alternate<AF0>>;
    pub type RxPinType = gpiob::PB7<Alternate<AF0>>;
    static mut SERIAL: Option<Serial<pac::USART1, TxPinType, RxPinType>> = None;

    pub struct Uart1Tx {}

    impl core::fmt::Write for Uart1Tx {
        fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
            for b in s.bytes() {
                write_byte(b);
            }
            Ok(())
        }
    }

    /// Must be called once during application initialization, before the
    /// first write
    pub fn init(serial: Serial<pac::USART1, TxPinType, RxPinType>, irq_prio: u8) {
        let core = unsafe { pac::CorePeripherals::steal() };
        let mut nvic = core.NVIC;

        static mut TX_Q: Queue<u8, TX_Q_SIZE> = Queue::new();

        let (tx_q_producer, tx_q_consumer) = unsafe { TX_Q.split() };

        unsafe {
            TX_Q_PRODUCER = Some(tx_q_producer);
            TX_Q_CONSUMER = Some(tx_q_consumer);
            SERIAL = Some(serial);

            nvic.set_priority(pac::Interrupt::USART1, irq_prio);
            pac::NVIC::unmask(pac::Interrupt::USART1);
        }
    }

    /// Queue one byte. Never blocks: the byte is dropped if the queue is full.
    pub fn write_byte(b: u8) {
        cortex_m::interrupt::free(|_| {
            let tx_q_producer = unsafe { TX_Q_PRODUCER.as_mut().unwrap_unchecked() };
            let _ = tx_q_producer.enqueue(b);
            let serial = unsafe { SERIAL.as_mut().unwrap_unchecked() };
            serial.listen(Event::Txe);
        });
    }

    pub fn writer() -> Uart1Tx {
        Uart1Tx {}
    }

    #[interrupt]
    fn USART1() {
        let serial = unsafe { SERIAL.as_mut().unwrap_unchecked() };
        let tx_q_consumer = unsafe { TX_Q_CONSUMER.as_mut().unwrap_unchecked() };
        let usart1 = unsafe { pac::Peripherals::steal().USART1 };

        let isr = usart1.isr.read();
        if isr.txe().bit_is_set() {
            match tx_q_consumer.dequeue() {
                Some(b) => {
                    serial.write(b).ok();
                },
                None => {
                    // If the Q is empty, mask the TXE interrupt. It is re-enabled
                    // when data is written to the queue
                    serial.unlisten(Event::Txe);
                }
            }
        }
    }
}

pub mod logger {
    use core::fmt::Write;
    use log::{LevelFilter, Log, Metadata, Record};

    use super::uart1;

    struct SerialLogger;

    impl Log for SerialLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                let mut w = uart1::writer();
                let _ = write!(w, "{:<5} {}\r\n", record.level(), record.args());
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: SerialLogger = SerialLogger;

    /// Route the `log` macros to UART1. Call once, after `uart1::init`.
    pub fn init(level: LevelFilter) {
        // The M0 has no compare-and-swap, so the racy setters are the only
        // option. Nothing logs before this runs.
        unsafe {
            let _ = log::set_logger_racy(&LOGGER);
            log::set_max_level_racy(level);
        }
    }
}
