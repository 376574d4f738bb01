use crate::driver::LowPower;
use crate::event::{ScanEvent, ScanEvents};

/// Tracks the deep sleep lock on top of the platform primitive.
///
/// The lock has depth one: taking it while held, or releasing it while free,
/// is a sequencing bug in the caller and panics.
pub struct PowerState<P> {
    primitive: P,
    locked: bool,
}

impl<P: LowPower> PowerState<P> {
    pub fn new(primitive: P) -> Self {
        Self {
            primitive,
            locked: false,
        }
    }

    pub fn lock(&mut self) {
        assert!(!self.locked, "deep sleep lock taken while already held");
        self.primitive.disallow_deep_sleep();
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        assert!(self.locked, "deep sleep lock released while not held");
        self.primitive.allow_deep_sleep();
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Block until `event` is pending, then consume it
    pub fn wait_for(&mut self, events: &ScanEvents, event: ScanEvent) {
        while !events.take(event) {
            self.primitive.sleep(events, event);
        }
    }
}
