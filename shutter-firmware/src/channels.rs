//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use shutter_core::console::Command;
use shutter_hal::TimeOfDay;

/// Channel capacity for queued commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Requests handled by the scheduler task, which owns the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerCommand {
    /// Replan after a settings change
    Restart,
    /// Set the wall clock, then replan
    SetClock(TimeOfDay),
    /// Print the upcoming fires
    Preview,
}

/// Scheduler requests from the console and control tasks
pub static SCHEDULER_CMD: Channel<CriticalSectionRawMutex, SchedulerCommand, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Manual motor and settings commands from the console
pub static CONTROL_CMD: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();

/// Ends a running traversal measurement
pub static MEASURE_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();
