//! Watchdog abstractions
//!
//! [`WatchdogTimer`] is the raw hardware peripheral. [`Watchdog`] is what
//! long-running code holds: it only knows how to feed and how long it may go
//! between feeds. Drivers decide when (and whether) the timer is armed.

/// Reset supervisor fed by long-running operations
pub trait Watchdog {
    /// Reset the countdown
    fn feed(&mut self);

    /// Maximum time between feeds before the device resets
    fn timeout_ms(&self) -> u32;
}

/// Hardware watchdog peripheral
pub trait WatchdogTimer {
    /// Arm the timer; the device resets unless fed within `timeout_ms`
    fn start(&mut self, timeout_ms: u32);

    /// Reset the countdown of an armed timer
    fn feed(&mut self);
}

impl<W: Watchdog + ?Sized> Watchdog for &mut W {
    fn feed(&mut self) {
        (**self).feed();
    }

    fn timeout_ms(&self) -> u32 {
        (**self).timeout_ms()
    }
}
