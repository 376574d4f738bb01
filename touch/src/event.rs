//! Mailbox between the interrupt-side producers and the scheduler.
//!
//! There is one pending flag per event kind. Posting a kind that is already
//! pending collapses into the pending one, so a burst of timer ticks or
//! duplicate completions wakes the scheduler once. A pending event of the
//! other kind is never overwritten.

use core::cell::Cell;
use critical_section::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanEvent {
    /// Scan timer expired
    StartScan,
    /// Sensing hardware finished a scan
    ScanComplete,
}

impl ScanEvent {
    const fn mask(self) -> u8 {
        match self {
            Self::StartScan => 1 << 0,
            Self::ScanComplete => 1 << 1,
        }
    }
}

pub struct ScanEvents {
    pending: Mutex<Cell<u8>>,
}

impl ScanEvents {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(0)),
        }
    }

    /// Mark `event` pending. Callable from interrupt context.
    pub fn post(&self, event: ScanEvent) {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            pending.set(pending.get() | event.mask());
        });
    }

    pub fn is_pending(&self, event: ScanEvent) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get() & event.mask() != 0)
    }

    /// Consume `event` if it is pending.
    ///
    /// Returns true if it was.
    pub fn take(&self, event: ScanEvent) -> bool {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            let was = pending.get();
            pending.set(was & !event.mask());
            was & event.mask() != 0
        })
    }
}

impl Default for ScanEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_repeated_posts_wake_once() {
        let events = ScanEvents::new();
        events.post(ScanEvent::ScanComplete);
        events.post(ScanEvent::ScanComplete);

        assert!(events.take(ScanEvent::ScanComplete));
        assert!(!events.take(ScanEvent::ScanComplete), "duplicate post was queued");
    }

    #[test]
    fn test_kinds_do_not_overwrite_each_other() {
        let events = ScanEvents::new();
        events.post(ScanEvent::ScanComplete);
        events.post(ScanEvent::StartScan);

        assert!(events.is_pending(ScanEvent::ScanComplete));
        assert!(events.take(ScanEvent::StartScan));
        assert!(events.take(ScanEvent::ScanComplete));
        assert!(!events.is_pending(ScanEvent::StartScan));
    }

    #[test]
    fn test_post_from_other_thread() {
        static EVENTS: ScanEvents = ScanEvents::new();

        let producers: Vec<_> = [ScanEvent::StartScan, ScanEvent::ScanComplete]
            .into_iter()
            .map(|event| {
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        EVENTS.post(event);
                    }
                })
            })
            .collect();
        for p in producers {
            p.join().unwrap();
        }

        assert!(EVENTS.take(ScanEvent::StartScan));
        assert!(EVENTS.take(ScanEvent::ScanComplete));
        assert!(!EVENTS.take(ScanEvent::StartScan));
    }
}
