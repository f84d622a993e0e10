//! Task scheduler
//!
//! Holds one task per planned fire. Each tick fires at most the first due
//! task in list order and pushes it a day ahead, so a task fires once per
//! day no matter how often the loop runs.

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use shutter_hal::{
    midnight, ByteStorage, ClockError, TimeOfDay, Timestamp, WallClock, Watchdog, SECONDS_PER_DAY,
};

use super::planner::offsets;
use crate::config::{Action, EventCode, RunReason};
use crate::device::Device;
use crate::motor::{MotorController, RunOutcome};
use crate::traits::{EventSink, MotorOutput};

/// Enough for the largest event count on every action
pub const MAX_TASKS: usize = 2 * u8::MAX as usize;

/// A planned fire of one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Task {
    pub action: Action,
    /// Next fire time, local timestamp
    pub fire_at: Timestamp,
    /// Motor time per fire
    pub run_ms: u32,
}

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// Never built
    Uninitialized,
    /// Clock invalid; no tasks until restarted
    Disabled,
    /// Tasks planned
    Built,
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Nothing due
    Idle,
    /// Ran a task to completion
    Fired(Action),
    /// A task was due but another run owned the motor; skipped for today
    MotorBusy(Action),
    /// Clock read failed; retried next tick
    ClockUnavailable,
    /// No task list
    Disabled,
}

/// Builds and fires the daily task list
pub struct TaskScheduler {
    tasks: Vec<Task, MAX_TASKS>,
    state: SchedulerState,
}

impl TaskScheduler {
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            state: SchedulerState::Uninitialized,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Tasks in list order (actions in [`Action::ALL`] order, then offsets)
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Plan every action's fires from its stored record
    ///
    /// Each offset is anchored to today's midnight and moved a day ahead
    /// until it lies at least the guard interval in the future.
    pub async fn build<S, C, W, E>(&mut self, dev: &mut Device<S, C, W, E>) -> SchedulerState
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        self.tasks.clear();

        let now = match dev.clock.has_valid_time() {
            true => dev.clock.now().ok(),
            false => None,
        };
        let Some(now) = now else {
            dev.record(EventCode::SCHEDULER_ERR).await;
            self.state = SchedulerState::Disabled;
            return self.state;
        };

        let store = dev.settings();
        let earliest = now.saturating_add(dev.config.guard_interval_s);
        let today = midnight(now);
        for action in Action::ALL {
            let record = store.load(dev, action).await;
            let run_ms = record.duration_per_event_ms();
            for offset in offsets(&record) {
                let mut fire_at = today + offset;
                while fire_at < earliest {
                    fire_at += SECONDS_PER_DAY;
                }
                if self
                    .tasks
                    .push(Task {
                        action,
                        fire_at,
                        run_ms,
                    })
                    .is_err()
                {
                    break;
                }
            }
        }

        dev.record(EventCode::SCHEDULER_INIT).await;
        self.state = SchedulerState::Built;
        self.state
    }

    /// Discard the task list and build it again
    pub async fn restart<S, C, W, E>(&mut self, dev: &mut Device<S, C, W, E>) -> SchedulerState
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        dev.record(EventCode::SCHEDULER_RST).await;
        self.build(dev).await
    }

    /// Set the wall clock and replan
    pub async fn set_clock<S, C, W, E>(
        &mut self,
        dev: &mut Device<S, C, W, E>,
        time: TimeOfDay,
    ) -> Result<SchedulerState, ClockError>
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        dev.clock.set_time_of_day(time)?;
        dev.record(EventCode::RTC_SAVE).await;
        Ok(self.restart(dev).await)
    }

    /// One loop iteration: feed, sleep half the watchdog timeout, fire
    pub async fn tick<S, C, W, E, O, D>(
        &mut self,
        dev: &mut Device<S, C, W, E>,
        motor: &MotorController<O>,
        delay: &mut D,
    ) -> TickOutcome
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        O: MotorOutput,
        D: DelayNs,
    {
        dev.watchdog.feed();
        delay.delay_ms(dev.watchdog.timeout_ms() / 2).await;
        self.fire_due(dev, motor, delay).await
    }

    /// Fire the first due task, if any
    ///
    /// The task's next fire time moves exactly one day ahead before it runs.
    pub async fn fire_due<S, C, W, E, O, D>(
        &mut self,
        dev: &mut Device<S, C, W, E>,
        motor: &MotorController<O>,
        delay: &mut D,
    ) -> TickOutcome
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
        O: MotorOutput,
        D: DelayNs,
    {
        if self.state != SchedulerState::Built {
            return TickOutcome::Disabled;
        }
        let Ok(now) = dev.clock.now() else {
            return TickOutcome::ClockUnavailable;
        };
        let Some(task) = self.tasks.iter_mut().find(|t| t.fire_at <= now) else {
            return TickOutcome::Idle;
        };
        task.fire_at += SECONDS_PER_DAY;
        let (action, run_ms) = (task.action, task.run_ms);

        dev.record(EventCode::SCHEDULER_ACT).await;
        match motor
            .run(dev, delay, action, RunReason::Auto, run_ms)
            .await
        {
            RunOutcome::Completed => TickOutcome::Fired(action),
            RunOutcome::Busy => TickOutcome::MotorBusy(action),
        }
    }

    /// The `N` earliest tasks, ordered by next fire time
    pub fn upcoming<const N: usize>(&self) -> Vec<Task, N> {
        let key = |t: &Task| (t.fire_at, t.action.index());
        let mut next: Vec<Task, N> = Vec::new();
        for task in &self.tasks {
            let pos = next
                .iter()
                .position(|t| key(task) < key(t))
                .unwrap_or(next.len());
            if pos == N {
                continue;
            }
            if next.is_full() {
                next.pop();
            }
            // Room was made above
            let _ = next.insert(pos, *task);
        }
        next
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ScheduleRecord;
    use crate::testing::{
        failing_device, test_device, MotorProbe, RecordingSink, SteppingDelay, TestDevice,
    };
    use core::cell::Cell;
    use embassy_futures::block_on;

    const DAY_MS: u64 = SECONDS_PER_DAY as u64 * 1000;

    fn ms(h: u64, m: u64, s: u64) -> u64 {
        (h * 3600 + m * 60 + s) * 1000
    }

    fn save(dev: &mut TestDevice<'_>, action: Action, record: ScheduleRecord) {
        let store = dev.settings();
        block_on(store.save(dev, action, &record)).unwrap();
    }

    /// Last `N` journaled codes, oldest first
    fn recent_codes<const N: usize>(dev: &mut TestDevice<'_>) -> [EventCode; N] {
        let mut codes = [EventCode::INVALID; N];
        for (k, slot) in codes.iter_mut().rev().enumerate() {
            *slot = block_on(dev.history(k)).code;
        }
        codes
    }

    fn open_at(h: u8, m: u8, duration: u16) -> ScheduleRecord {
        ScheduleRecord {
            first_hour: h,
            first_minute: m,
            last_hour: h,
            last_minute: m,
            duration,
            event_count: 1,
        }
    }

    #[test]
    fn test_invalid_clock_disables_then_restart_recovers() {
        let now = Cell::new(10 * DAY_MS + ms(8, 0, 0));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(&mut dev, Action::Open, open_at(9, 0, 30));
        dev.clock.valid.set(false);

        let mut scheduler = TaskScheduler::new();
        assert_eq!(block_on(scheduler.build(&mut dev)), SchedulerState::Disabled);
        assert!(scheduler.tasks().is_empty());
        assert_eq!(sink.last(), Some(EventCode::SCHEDULER_ERR));

        let state = block_on(scheduler.set_clock(&mut dev, TimeOfDay::new(8, 0, 0).unwrap()));
        assert_eq!(state, Ok(SchedulerState::Built));
        assert!(!scheduler.tasks().is_empty());
        assert_eq!(
            recent_codes::<4>(&mut dev),
            [
                EventCode::RTC_SAVE,
                EventCode::SCHEDULER_RST,
                EventCode::SETTINGS_LOAD_ERR,
                EventCode::SCHEDULER_INIT,
            ]
        );
    }

    #[test]
    fn test_build_anchors_to_today() {
        let now = Cell::new(10 * DAY_MS + ms(8, 0, 0));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(&mut dev, Action::Open, open_at(9, 0, 30));
        save(&mut dev, Action::Close, open_at(7, 0, 20));

        let mut scheduler = TaskScheduler::new();
        block_on(scheduler.build(&mut dev));
        let tasks = scheduler.tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].action, Action::Open);
        assert_eq!(tasks[0].fire_at, 10 * SECONDS_PER_DAY + 9 * 3600);
        assert_eq!(tasks[0].run_ms, 30_000);
        // Already past today: rolled to tomorrow
        assert_eq!(tasks[1].action, Action::Close);
        assert_eq!(tasks[1].fire_at, 11 * SECONDS_PER_DAY + 7 * 3600);
    }

    #[test]
    fn test_guard_interval_rolls_imminent_task() {
        let now = Cell::new(10 * DAY_MS + ms(8, 59, 57));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(&mut dev, Action::Open, open_at(9, 0, 30));

        let mut scheduler = TaskScheduler::new();
        block_on(scheduler.build(&mut dev));
        assert_eq!(scheduler.tasks()[0].fire_at, 11 * SECONDS_PER_DAY + 9 * 3600);

        now.set(10 * DAY_MS + ms(8, 59, 55));
        block_on(scheduler.restart(&mut dev));
        assert_eq!(scheduler.tasks()[0].fire_at, 10 * SECONDS_PER_DAY + 9 * 3600);
    }

    #[test]
    fn test_zero_duration_records_plan_nothing() {
        let now = Cell::new(10 * DAY_MS);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));

        let mut scheduler = TaskScheduler::new();
        assert_eq!(block_on(scheduler.build(&mut dev)), SchedulerState::Built);
        assert!(scheduler.tasks().is_empty());
    }

    #[test]
    fn test_fire_once_per_tick_and_advance_a_day() {
        let now = Cell::new(10 * DAY_MS + ms(8, 59, 0));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(&mut dev, Action::Open, open_at(9, 0, 10));
        save(&mut dev, Action::Close, open_at(9, 0, 10));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let mut scheduler = TaskScheduler::new();
        block_on(scheduler.build(&mut dev));
        let first = scheduler.tasks()[0].fire_at;

        now.set(10 * DAY_MS + ms(9, 0, 0));
        let outcome = block_on(scheduler.fire_due(&mut dev, &motor, &mut delay));
        assert_eq!(outcome, TickOutcome::Fired(Action::Open));
        assert_eq!(scheduler.tasks()[0].fire_at, first + SECONDS_PER_DAY);
        assert_eq!(scheduler.tasks()[1].fire_at, first);

        let outcome = block_on(scheduler.fire_due(&mut dev, &motor, &mut delay));
        assert_eq!(outcome, TickOutcome::Fired(Action::Close));
        let outcome = block_on(scheduler.fire_due(&mut dev, &motor, &mut delay));
        assert_eq!(outcome, TickOutcome::Idle);
        assert_eq!(probe.drives.get(), 2);
    }

    #[test]
    fn test_tick_sleeps_half_timeout_and_feeds() {
        let now = Cell::new(10 * DAY_MS + ms(8, 59, 50));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(&mut dev, Action::Open, open_at(9, 0, 60));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let mut scheduler = TaskScheduler::new();
        block_on(scheduler.build(&mut dev));

        let mut fired = 0;
        for _ in 0..10 {
            match block_on(scheduler.tick(&mut dev, &motor, &mut delay)) {
                TickOutcome::Fired(Action::Open) => fired += 1,
                TickOutcome::Idle => {}
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(fired, 1);
        assert!(dev.watchdog.max_gap_ms <= 4_000);
        assert_eq!(sink.count(EventCode::SCHEDULER_ACT), 1);
        assert_eq!(sink.count(EventCode(48)), 1);
        assert_eq!(sink.count(EventCode(49)), 1);
    }

    #[test]
    fn test_clock_failure_is_an_outcome() {
        let now = Cell::new(10 * DAY_MS);
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let mut scheduler = TaskScheduler::new();
        assert_eq!(
            block_on(scheduler.fire_due(&mut dev, &motor, &mut delay)),
            TickOutcome::Disabled
        );
        block_on(scheduler.build(&mut dev));
        dev.clock.valid.set(false);
        assert_eq!(
            block_on(scheduler.fire_due(&mut dev, &motor, &mut delay)),
            TickOutcome::ClockUnavailable
        );
    }

    #[test]
    fn test_busy_motor_skips_fire() {
        let now = Cell::new(10 * DAY_MS + ms(8, 0, 0));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(&mut dev, Action::Close, open_at(8, 1, 5));
        let probe = MotorProbe::default();
        let motor = MotorController::new(&probe);
        let mut delay = SteppingDelay { now_ms: &now };

        let mut scheduler = TaskScheduler::new();
        block_on(scheduler.build(&mut dev));
        now.set(10 * DAY_MS + ms(8, 1, 0));

        let held = motor.try_acquire().unwrap();
        assert_eq!(
            block_on(scheduler.fire_due(&mut dev, &motor, &mut delay)),
            TickOutcome::MotorBusy(Action::Close)
        );
        drop(held);
        assert_eq!(
            scheduler.tasks()[0].fire_at,
            11 * SECONDS_PER_DAY + 8 * 3600 + 60
        );
        assert_eq!(probe.drives.get(), 0);
    }

    #[test]
    fn test_upcoming_sorted() {
        let now = Cell::new(10 * DAY_MS + ms(12, 0, 0));
        let sink = RecordingSink::default();
        let mut dev = block_on(test_device(&now, &sink));
        save(
            &mut dev,
            Action::Open,
            ScheduleRecord {
                first_hour: 6,
                first_minute: 0,
                last_hour: 18,
                last_minute: 0,
                duration: 30,
                event_count: 3,
            },
        );
        save(&mut dev, Action::Close, open_at(20, 0, 30));

        let mut scheduler = TaskScheduler::new();
        block_on(scheduler.build(&mut dev));
        let upcoming = scheduler.upcoming::<8>();
        let times: Vec<u32, 8> = upcoming
            .iter()
            .map(|t| t.fire_at - 10 * SECONDS_PER_DAY)
            .collect();
        // 06:00 and 12:00 have passed (12:00 inside the guard interval)
        assert_eq!(&times[..], &[18 * 3600, 20 * 3600, 30 * 3600, 36 * 3600]);

        let first_two = scheduler.upcoming::<2>();
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[0], upcoming[0]);
        assert_eq!(first_two[1], upcoming[1]);
        assert_eq!(first_two[0].action, Action::Open);
        assert!(scheduler.upcoming::<0>().is_empty());
    }

    #[test]
    fn test_build_with_unreadable_records_uses_defaults() {
        let now = Cell::new(10 * DAY_MS + ms(8, 0, 0));
        let sink = RecordingSink::default();
        let mut dev = block_on(failing_device(&now, &sink));
        let store = dev.settings();
        block_on(store.save(&mut dev, Action::Open, &open_at(9, 0, 30))).unwrap();
        sink.clear();

        dev.storage.fail_reads = true;
        let mut scheduler = TaskScheduler::new();
        assert_eq!(block_on(scheduler.build(&mut dev)), SchedulerState::Built);
        // The default record has no duration, so nothing is planned
        assert!(scheduler.tasks().is_empty());
        assert_eq!(sink.count(EventCode::SETTINGS_LOAD_ERR), 2);
        assert_eq!(sink.last(), Some(EventCode::SCHEDULER_INIT));
    }
}
