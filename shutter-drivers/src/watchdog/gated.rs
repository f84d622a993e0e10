//! Jumper-gated watchdog
//!
//! A hardware watchdog that reboots the board would get in the way while
//! flashing or debugging. The timer is therefore only armed the first time
//! it is fed while the enable jumper reads high. Once armed it stays armed
//! (the hardware cannot be disarmed) and every feed reaches it.

use shutter_hal::{InputPin, Watchdog, WatchdogTimer};

/// Default reset timeout
pub const DEFAULT_TIMEOUT_MS: u32 = 8_000;

/// Watchdog armed by an enable jumper
pub struct JumperGatedWatchdog<P, T> {
    jumper: P,
    timer: T,
    timeout_ms: u32,
    armed: bool,
}

impl<P: InputPin, T: WatchdogTimer> JumperGatedWatchdog<P, T> {
    pub fn new(jumper: P, timer: T, timeout_ms: u32) -> Self {
        Self {
            jumper,
            timer,
            timeout_ms,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

impl<P: InputPin, T: WatchdogTimer> Watchdog for JumperGatedWatchdog<P, T> {
    fn feed(&mut self) {
        if !self.armed && self.jumper.is_high() {
            self.timer.start(self.timeout_ms);
            self.armed = true;
        }
        if self.armed {
            self.timer.feed();
        }
    }

    fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
