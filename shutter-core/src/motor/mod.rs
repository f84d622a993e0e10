//! Motor control
//!
//! [`MotorController`] owns the power stage and a [`MotorLock`]. A run
//! holds a [`RunGuard`]; dropping the guard halts the motor and releases
//! the lock, whether the run completed, was stopped, or its future was
//! dropped mid-sleep.
//!
//! Runs sleep in slices of at most half the watchdog timeout and feed the
//! watchdog before and after every slice.

mod lock;

pub use lock::{MotorLock, MotorState};

use core::cell::{Cell, RefCell};
use core::future::Future;

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;
use shutter_hal::{ByteStorage, WallClock, Watchdog};

use crate::config::{Action, RunReason};
use crate::device::Device;
use crate::traits::{EventSink, MotorOutput};

/// Slice length while measuring; sets the resolution of the result
const MEASURE_SLICE_MS: u32 = 1_000;

/// Result of a timed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunOutcome {
    Completed,
    /// Another run owns the motor; nothing happened
    Busy,
}

/// Result of a traversal measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasureOutcome {
    /// Whole seconds until stopped, clamped to the limit
    Measured(u16),
    Busy,
}

/// Power stage plus ownership lock
pub struct MotorController<O> {
    output: RefCell<O>,
    lock: MotorLock,
}

impl<O: MotorOutput> MotorController<O> {
    pub const fn new(output: O) -> Self {
        Self {
            output: RefCell::new(output),
            lock: MotorLock::new(),
        }
    }

    /// Claim the motor without starting it, `None` while another run is active
    pub fn try_acquire(&self) -> Option<RunGuard<'_, O>> {
        self.lock
            .try_acquire()
            .then(|| RunGuard { motor: self })
    }

    pub fn state(&self) -> MotorState {
        self.lock.state()
    }

    /// Run `action` for `run_ms`, journaling start and stop
    pub async fn run<S, C, W, E, D>(
        &self,
        dev: &mut Device<S, C, W, E>,
        delay: &mut D,
        action: Action,
        reason: RunReason,
        run_ms: u32,
    ) -> RunOutcome
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        D: DelayNs,
    {
        match self.try_acquire() {
            Some(guard) => {
                guard.run(dev, delay, action, reason, run_ms).await;
                RunOutcome::Completed
            }
            None => RunOutcome::Busy,
        }
    }

    /// Manual run of `action` for its stored per-event duration
    pub async fn run_once<S, C, W, E, D>(
        &self,
        dev: &mut Device<S, C, W, E>,
        delay: &mut D,
        action: Action,
    ) -> RunOutcome
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        D: DelayNs,
    {
        match self.try_acquire() {
            Some(guard) => {
                guard.run_once(dev, delay, action).await;
                RunOutcome::Completed
            }
            None => RunOutcome::Busy,
        }
    }

    /// Run `action` until `stop` resolves or the limit elapses
    pub async fn measure<S, C, W, E, D, F>(
        &self,
        dev: &mut Device<S, C, W, E>,
        delay: &mut D,
        action: Action,
        stop: F,
    ) -> MeasureOutcome
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        D: DelayNs,
        F: Future,
    {
        match self.try_acquire() {
            Some(guard) => MeasureOutcome::Measured(guard.measure(dev, delay, action, stop).await),
            None => MeasureOutcome::Busy,
        }
    }

    fn drive(&self, action: Action) {
        self.output.borrow_mut().drive(action);
    }

    fn halt(&self) {
        self.output.borrow_mut().halt();
    }
}

/// Exclusive claim on the motor
///
/// Dropping the guard halts the motor and releases the lock.
pub struct RunGuard<'a, O: MotorOutput> {
    motor: &'a MotorController<O>,
}

impl<O: MotorOutput> RunGuard<'_, O> {
    /// Run for `run_ms`, then halt
    pub async fn run<S, C, W, E, D>(
        self,
        dev: &mut Device<S, C, W, E>,
        delay: &mut D,
        action: Action,
        reason: RunReason,
        run_ms: u32,
    ) where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        D: DelayNs,
    {
        let codes = dev.config.event_codes;
        dev.record(codes.start(action, reason)).await;
        self.motor.drive(action);
        sleep_fed(&mut dev.watchdog, delay, run_ms).await;
        drop(self);
        dev.record(codes.stop(action, reason)).await;
    }

    /// Load the action's record and run once for its per-event duration
    ///
    /// Returns the motor time in milliseconds.
    pub async fn run_once<S, C, W, E, D>(
        self,
        dev: &mut Device<S, C, W, E>,
        delay: &mut D,
        action: Action,
    ) -> u32
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        D: DelayNs,
    {
        let store = dev.settings();
        let run_ms = store.load(dev, action).await.duration_per_event_ms();
        self.run(dev, delay, action, RunReason::OneShot, run_ms).await;
        run_ms
    }

    /// Run until `stop` resolves or the configured limit elapses
    ///
    /// Returns the elapsed whole seconds.
    pub async fn measure<S, C, W, E, D, F>(
        self,
        dev: &mut Device<S, C, W, E>,
        delay: &mut D,
        action: Action,
        stop: F,
    ) -> u16
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        D: DelayNs,
        F: Future,
    {
        let codes = dev.config.event_codes;
        let limit = dev.config.max_measure_s;
        dev.record(codes.start(action, RunReason::Measure)).await;
        self.motor.drive(action);

        let slept = Cell::new(0u32);
        let limit_ms = u32::from(limit) * 1000;
        let elapsed = match select(
            stop,
            sleep_fed_sliced(&mut dev.watchdog, delay, limit_ms, MEASURE_SLICE_MS, &slept),
        )
        .await
        {
            Either::First(_) => (slept.get() / 1000).min(u32::from(limit)) as u16,
            Either::Second(()) => limit,
        };

        drop(self);
        dev.record(codes.stop(action, RunReason::Measure)).await;
        elapsed
    }
}

impl<O: MotorOutput> Drop for RunGuard<'_, O> {
    fn drop(&mut self) {
        self.motor.halt();
        self.motor.lock.release();
    }
}

/// Sleep `ms`, feeding the watchdog at least every half timeout
pub async fn sleep_fed<W: Watchdog, D: DelayNs>(watchdog: &mut W, delay: &mut D, ms: u32) {
    sleep_fed_sliced(watchdog, delay, ms, u32::MAX, &Cell::new(0)).await;
}

/// Sleep in slices no longer than `max_slice_ms` or half the watchdog
/// timeout, adding each completed slice to `slept`
async fn sleep_fed_sliced<W: Watchdog, D: DelayNs>(
    watchdog: &mut W,
    delay: &mut D,
    ms: u32,
    max_slice_ms: u32,
    slept: &Cell<u32>,
) {
    let slice = (watchdog.timeout_ms() / 2).min(max_slice_ms).max(1);
    let mut remaining = ms;
    watchdog.feed();
    while remaining > 0 {
        let step = remaining.min(slice);
        delay.delay_ms(step).await;
        watchdog.feed();
        slept.set(slept.get() + step);
        remaining -= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventCode;
    use crate::settings::ScheduleRecord;
    use crate::testing::{test_device, MotorProbe, NeverDelay, RecordingSink, SteppingDelay};
    use embassy_futures::block_on;
    use core::cell::Cell;

    #[test]
    fn test_run_feeds_within_timeout() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let outcome = block_on(motor.run(&mut dev, &mut delay, Action::Open, RunReason::Auto, 45_600));
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(now.get(), 45_600);
        assert!(dev.watchdog.max_gap_ms <= 4_000);
        assert_eq!(probe.driving.get(), None);
        assert_eq!(probe.drives.get(), 1);
        assert_eq!(motor.state(), MotorState::Idle);

        let codes = sink.codes();
        assert_eq!(&codes[..], &[EventCode(48), EventCode(49)]);
    }

    #[test]
    fn test_zero_length_run_still_journals() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        block_on(motor.run(&mut dev, &mut delay, Action::Close, RunReason::OneShot, 0));
        assert_eq!(&sink.codes()[..], &[EventCode(54), EventCode(55)]);
        assert_eq!(probe.halts.get(), 1);
    }

    #[test]
    fn test_run_once_uses_per_event_duration() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let record = ScheduleRecord {
            first_hour: 9,
            first_minute: 0,
            last_hour: 17,
            last_minute: 30,
            duration: 456,
            event_count: 10,
        };
        let store = dev.settings();
        block_on(store.save(&mut dev, Action::Open, &record)).unwrap();
        sink.clear();

        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };
        let outcome = block_on(motor.run_once(&mut dev, &mut delay, Action::Open));

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(now.get(), 45_600);
        assert_eq!(&sink.codes()[..], &[EventCode(52), EventCode(53)]);
        assert_eq!(probe.driving.get(), None);
    }

    #[test]
    fn test_run_once_busy_leaves_motor_alone() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let held = motor.try_acquire().unwrap();
        let outcome = block_on(motor.run_once(&mut dev, &mut delay, Action::Close));
        assert_eq!(outcome, RunOutcome::Busy);
        assert_eq!(now.get(), 0);
        assert_eq!(probe.drives.get(), 0);
        drop(held);
    }

    #[test]
    fn test_second_start_is_busy() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let guard = motor.try_acquire().unwrap();
        let outcome = block_on(motor.run(&mut dev, &mut delay, Action::Open, RunReason::OneShot, 1_000));
        assert_eq!(outcome, RunOutcome::Busy);
        assert_eq!(probe.drives.get(), 0);
        assert!(sink.codes().is_empty());

        drop(guard);
        assert_eq!(motor.state(), MotorState::Idle);
    }

    #[test]
    fn test_dropped_run_halts_motor() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = NeverDelay;

        // The run parks in its first sleep; the ready future wins the select
        // and the run future is dropped mid-sleep.
        let result = block_on(select(
            motor.run(&mut dev, &mut delay, Action::Close, RunReason::Auto, 60_000),
            core::future::ready(()),
        ));
        assert!(matches!(result, Either::Second(())));
        assert_eq!(probe.driving.get(), None);
        assert_eq!(probe.halts.get(), 1);
        assert_eq!(motor.state(), MotorState::Idle);
    }

    #[test]
    fn test_measure_stops_on_signal() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        // Stop once 37.5 s of motor time have passed
        let stop = core::future::poll_fn(|cx| {
            if now.get() >= 37_500 {
                core::task::Poll::Ready(())
            } else {
                cx.waker().wake_by_ref();
                core::task::Poll::Pending
            }
        });
        let outcome = block_on(motor.measure(&mut dev, &mut delay, Action::Open, stop));
        assert_eq!(outcome, MeasureOutcome::Measured(37));
        assert_eq!(probe.driving.get(), None);
        assert_eq!(&sink.codes()[..], &[EventCode(56), EventCode(57)]);
        assert!(dev.watchdog.max_gap_ms <= 4_000);
    }

    #[test]
    fn test_measure_clamps_at_limit() {
        let now = Cell::new(0);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        dev.config.max_measure_s = 12;
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let outcome = block_on(motor.measure(
            &mut dev,
            &mut delay,
            Action::Close,
            core::future::pending::<()>(),
        ));
        assert_eq!(outcome, MeasureOutcome::Measured(12));
        assert_eq!(now.get(), 12_000);
        assert_eq!(motor.state(), MotorState::Idle);
    }

    #[test]
    fn test_sleep_fed_short_timeout() {
        let now = Cell::new(0);
        let mut watchdog = crate::testing::FeedRecorder::new(3, &now);
        let mut delay = SteppingDelay { now_ms: &now };

        block_on(sleep_fed(&mut watchdog, &mut delay, 10));
        assert_eq!(watchdog.feeds, 11);
        assert_eq!(watchdog.max_gap_ms, 1);
    }
}
