//! Scheduler task
//!
//! Runs the daily schedule: feed the watchdog, sleep half its timeout with
//! the device unlocked, then fire at most one due task. Commands from the
//! other tasks cut the sleep short.

use chrono::{Datelike, Timelike};
use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Delay, Timer};

use shutter_core::scheduler::{TaskScheduler, TickOutcome};
use shutter_hal::to_datetime;

use crate::channels::{SchedulerCommand, SCHEDULER_CMD};
use crate::{DeviceMutex, Motor};

/// Upcoming fires printed by a preview
const PREVIEW_LEN: usize = 20;

/// Scheduler task - owns the task list
#[embassy_executor::task]
pub async fn scheduler_task(device: &'static DeviceMutex, motor: &'static Motor) {
    info!("Scheduler task started");

    let mut scheduler = TaskScheduler::new();
    let mut delay = Delay;

    {
        let mut dev = device.lock().await;
        let state = scheduler.build(&mut dev).await;
        info!("Scheduler {}: {} tasks", state, scheduler.tasks().len());
    }

    loop {
        let half_timeout_ms = {
            let mut dev = device.lock().await;
            dev.watchdog.feed();
            dev.watchdog.timeout_ms() / 2
        };

        match select(
            Timer::after_millis(u64::from(half_timeout_ms)),
            SCHEDULER_CMD.receive(),
        )
        .await
        {
            Either::First(()) => {
                let mut dev = device.lock().await;
                match scheduler.fire_due(&mut dev, motor, &mut delay).await {
                    TickOutcome::Idle | TickOutcome::Disabled => {}
                    TickOutcome::Fired(action) => info!("Scheduled {} done", action.name()),
                    TickOutcome::MotorBusy(action) => {
                        warn!("Scheduled {} skipped: motor busy", action.name())
                    }
                    TickOutcome::ClockUnavailable => warn!("Clock read failed"),
                }
            }
            Either::Second(cmd) => handle_command(&mut scheduler, device, cmd).await,
        }
    }
}

async fn handle_command(scheduler: &mut TaskScheduler, device: &'static DeviceMutex, cmd: SchedulerCommand) {
    debug!("Scheduler command: {}", cmd);
    let mut dev = device.lock().await;

    match cmd {
        SchedulerCommand::Restart => {
            let state = scheduler.restart(&mut dev).await;
            info!("Scheduler {}: {} tasks", state, scheduler.tasks().len());
        }
        SchedulerCommand::SetClock(time) => match scheduler.set_clock(&mut dev, time).await {
            Ok(state) => info!("Clock set; scheduler {}", state),
            Err(e) => warn!("Failed to set clock: {}", e),
        },
        SchedulerCommand::Preview => {
            let upcoming = scheduler.upcoming::<PREVIEW_LEN>();
            if upcoming.is_empty() {
                info!("No scheduled tasks");
            }
            for task in &upcoming {
                let at = to_datetime(task.fire_at);
                info!(
                    "{}-{:02}-{:02} {:02}:{:02}:{:02} {} for {} ms",
                    at.year(),
                    at.month(),
                    at.day(),
                    at.hour(),
                    at.minute(),
                    at.second(),
                    task.action.name(),
                    task.run_ms
                );
            }
        }
    }
}
