//! Host fakes shared by the unit tests
//!
//! Time is a single millisecond counter in a `Cell`: the clock reads it,
//! the delay advances it, and the watchdog recorder measures feed gaps
//! against it.

use core::cell::{Cell, RefCell};

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use shutter_hal::{
    midnight, ByteStorage, ClockError, RamStorage, StorageError, TimeOfDay, Timestamp, WallClock,
    Watchdog,
};

use crate::config::{Action, EventCode, ShutterConfig};
use crate::device::Device;
use crate::traits::{EventSink, MotorOutput};

pub type TestDevice<'a> = Device<RamStorage<4096>, ManualClock<'a>, FeedRecorder<'a>, &'a RecordingSink>;

/// Device over blank storage with a valid clock and an 8 s watchdog
pub async fn test_device<'a>(now: &'a Cell<u64>, sink: &'a RecordingSink) -> TestDevice<'a> {
    let (dev, _) = Device::mount(
        RamStorage::new(),
        ManualClock::new(now),
        FeedRecorder::new(8_000, now),
        sink,
        ShutterConfig::default(),
    )
    .await
    .unwrap();
    dev
}

pub type FailingDevice<'a> = Device<FailingStorage, ManualClock<'a>, FeedRecorder<'a>, &'a RecordingSink>;

/// Like [`test_device`], over storage whose failures tests switch on
pub async fn failing_device<'a>(now: &'a Cell<u64>, sink: &'a RecordingSink) -> FailingDevice<'a> {
    let (dev, _) = Device::mount(
        FailingStorage::new(),
        ManualClock::new(now),
        FeedRecorder::new(8_000, now),
        sink,
        ShutterConfig::default(),
    )
    .await
    .unwrap();
    dev
}

/// Wall clock reading the shared millisecond counter
pub struct ManualClock<'a> {
    pub now_ms: &'a Cell<u64>,
    pub valid: Cell<bool>,
}

impl<'a> ManualClock<'a> {
    pub fn new(now_ms: &'a Cell<u64>) -> Self {
        Self {
            now_ms,
            valid: Cell::new(true),
        }
    }
}

impl WallClock for ManualClock<'_> {
    fn now(&mut self) -> Result<Timestamp, ClockError> {
        if self.valid.get() {
            Ok((self.now_ms.get() / 1000) as Timestamp)
        } else {
            Err(ClockError::NotSet)
        }
    }

    fn set_time_of_day(&mut self, time: TimeOfDay) -> Result<(), ClockError> {
        let today = midnight((self.now_ms.get() / 1000) as Timestamp);
        self.now_ms
            .set(u64::from(today + time.to_seconds()) * 1000);
        self.valid.set(true);
        Ok(())
    }

    fn has_valid_time(&mut self) -> bool {
        self.valid.get()
    }
}

/// Delay that advances the shared counter and yields once
pub struct SteppingDelay<'a> {
    pub now_ms: &'a Cell<u64>,
}

impl SteppingDelay<'_> {
    async fn advance(&mut self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
        embassy_futures::yield_now().await;
    }
}

impl DelayNs for SteppingDelay<'_> {
    async fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns.div_ceil(1_000_000))).await;
    }

    async fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us.div_ceil(1_000))).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms)).await;
    }
}

/// Delay that never completes
pub struct NeverDelay;

impl DelayNs for NeverDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        core::future::pending::<()>().await
    }
}

/// Watchdog recording the longest gap between feeds
pub struct FeedRecorder<'a> {
    timeout_ms: u32,
    now_ms: &'a Cell<u64>,
    last_feed: u64,
    pub max_gap_ms: u64,
    pub feeds: u32,
}

impl<'a> FeedRecorder<'a> {
    pub fn new(timeout_ms: u32, now_ms: &'a Cell<u64>) -> Self {
        Self {
            timeout_ms,
            now_ms,
            last_feed: now_ms.get(),
            max_gap_ms: 0,
            feeds: 0,
        }
    }
}

impl Watchdog for FeedRecorder<'_> {
    fn feed(&mut self) {
        let now = self.now_ms.get();
        self.max_gap_ms = self.max_gap_ms.max(now.saturating_sub(self.last_feed));
        self.last_feed = now;
        self.feeds += 1;
    }

    fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}

/// Sink keeping every emitted code
#[derive(Default)]
pub struct RecordingSink {
    codes: RefCell<Vec<EventCode, 256>>,
}

impl RecordingSink {
    pub fn last(&self) -> Option<EventCode> {
        self.codes.borrow().last().copied()
    }

    pub fn count(&self, code: EventCode) -> usize {
        self.codes.borrow().iter().filter(|&&c| c == code).count()
    }

    pub fn codes(&self) -> Vec<EventCode, 256> {
        self.codes.borrow().clone()
    }

    pub fn clear(&self) {
        self.codes.borrow_mut().clear();
    }
}

impl EventSink for &RecordingSink {
    fn emit(&mut self, code: EventCode) {
        let _ = self.codes.borrow_mut().push(code);
    }
}

/// Motor output exposing its state through shared cells
#[derive(Default)]
pub struct MotorProbe {
    pub driving: Cell<Option<Action>>,
    pub drives: Cell<u32>,
    pub halts: Cell<u32>,
}

impl MotorOutput for &MotorProbe {
    fn drive(&mut self, action: Action) {
        self.driving.set(Some(action));
        self.drives.set(self.drives.get() + 1);
    }

    fn halt(&mut self) {
        self.driving.set(None);
        self.halts.set(self.halts.get() + 1);
    }
}

/// RAM storage with switchable failures
pub struct FailingStorage {
    inner: RamStorage<4096>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self {
            inner: RamStorage::new(),
            fail_reads: false,
            fail_writes: false,
        }
    }
}

impl ByteStorage for FailingStorage {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    async fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        if self.fail_reads {
            return Err(StorageError::Device);
        }
        self.inner.read(addr, buf).await
    }

    async fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Device);
        }
        self.inner.write(addr, data).await
    }
}
