//! Daily schedule
//!
//! The planner turns a stored record into fire offsets within a day; the
//! executor anchors them to the clock and fires them.

pub mod executor;
pub mod planner;

pub use executor::{SchedulerState, Task, TaskScheduler, TickOutcome, MAX_TASKS};
pub use planner::{offsets, Offsets};
