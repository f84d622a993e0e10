//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! The device context is shared behind one async mutex; the motor is shared
//! by reference and guarded by its own lock.
//!
//! Lock order is motor, then device. A run holds the device for its whole
//! duration, since it feeds the watchdog and journals through it, so the
//! scheduler task waits out a manual run or measurement and fires whatever
//! became due once it ends. A scheduled fire only reports motor busy when a
//! manual command has claimed the motor but not yet the device.

pub mod console;
pub mod control;
pub mod scheduler;

pub use console::console_task;
pub use control::control_task;
pub use scheduler::scheduler_task;
