//! Hardware watchdog timer

use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::watchdog::Watchdog;
use embassy_rp::Peri;
use embassy_time::Duration;
use shutter_hal::WatchdogTimer;

/// RP2040 watchdog peripheral
pub struct Rp2040Watchdog {
    inner: Watchdog,
}

impl Rp2040Watchdog {
    pub fn new(watchdog: Peri<'static, WATCHDOG>) -> Self {
        Self {
            inner: Watchdog::new(watchdog),
        }
    }
}

impl WatchdogTimer for Rp2040Watchdog {
    fn start(&mut self, timeout_ms: u32) {
        self.inner.start(Duration::from_millis(u64::from(timeout_ms)));
    }

    fn feed(&mut self) {
        self.inner.feed();
    }
}
