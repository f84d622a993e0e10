//! Control task
//!
//! Handles manual motor runs, traversal measurements and schedule edits
//! requested from the console.

use defmt::*;
use embassy_time::Delay;

use shutter_core::config::Action;
use shutter_core::console::Command;
use shutter_core::settings::ScheduleRecord;

use crate::channels::{SchedulerCommand, CONTROL_CMD, MEASURE_STOP, SCHEDULER_CMD};
use crate::{DeviceMutex, Motor};

/// Control task - executes manual commands
#[embassy_executor::task]
pub async fn control_task(device: &'static DeviceMutex, motor: &'static Motor) {
    info!("Control task started");

    loop {
        match CONTROL_CMD.receive().await {
            Command::Run(action) => run_once(device, motor, action).await,
            Command::Measure(action) => measure(device, motor, action).await,
            Command::Save(action, record) => save(device, action, record).await,
            Command::Show(action) => show(device, action).await,
            Command::History(count) => history(device, count).await,
            Command::Reset => {
                let mut dev = device.lock().await;
                let store = dev.settings();
                let result = store.reset(&mut dev).await;
                drop(dev);
                match result {
                    Ok(()) => {
                        info!("Schedules reset to defaults");
                        SCHEDULER_CMD.send(SchedulerCommand::Restart).await;
                    }
                    Err(e) => warn!("Reset failed: {}", e),
                }
            }
            other => warn!("Unexpected command: {}", other),
        }
    }
}

/// One-shot run using the stored per-event duration
async fn run_once(device: &'static DeviceMutex, motor: &'static Motor, action: Action) {
    // Motor before device
    let Some(guard) = motor.try_acquire() else {
        warn!("Motor busy, {} ignored", action.name());
        return;
    };

    let mut dev = device.lock().await;
    let run_ms = guard.run_once(&mut dev, &mut Delay, action).await;
    info!("Manual {} ran for {} ms", action.name(), run_ms);
}

/// Run until `stop` and report the traversal time
async fn measure(device: &'static DeviceMutex, motor: &'static Motor, action: Action) {
    let Some(guard) = motor.try_acquire() else {
        warn!("Motor busy, measurement ignored");
        return;
    };

    MEASURE_STOP.reset();
    let mut dev = device.lock().await;
    info!("Measuring {}, send `stop` at the end stop", action.name());
    let seconds = guard
        .measure(&mut dev, &mut Delay, action, MEASURE_STOP.wait())
        .await;
    info!("{} took {} s", action.name(), seconds);
}

async fn save(device: &'static DeviceMutex, action: Action, record: ScheduleRecord) {
    let mut dev = device.lock().await;
    let store = dev.settings();
    let result = store.save(&mut dev, action, &record).await;
    drop(dev);
    match result {
        Ok(()) => {
            SCHEDULER_CMD.send(SchedulerCommand::Restart).await;
        }
        Err(e) => warn!("Failed to save {} schedule: {}", action.name(), e),
    }
}

async fn show(device: &'static DeviceMutex, action: Action) {
    let mut dev = device.lock().await;
    let store = dev.settings();
    let r = store.load(&mut dev, action).await;
    info!(
        "{}: {:02}:{:02} - {:02}:{:02}, {} s, {} events",
        action.name(),
        r.first_hour,
        r.first_minute,
        r.last_hour,
        r.last_minute,
        r.duration,
        r.event_count
    );
}

/// Print the newest `count` journal entries, newest first
async fn history(device: &'static DeviceMutex, count: u16) {
    let mut dev = device.lock().await;
    let count = usize::from(count).min(dev.journal().len());
    for k in 0..count {
        let entry = dev.history(k).await;
        if !entry.is_valid() {
            break;
        }
        info!(
            "#{} {:02}:{:02}:{:02} [{}] {}",
            k,
            entry.time.hour,
            entry.time.minute,
            entry.time.second,
            entry.code.0,
            dev.config.describe(entry.code)
        );
    }
}
