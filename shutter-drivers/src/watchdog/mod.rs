//! Watchdog drivers

pub mod gated;

pub use gated::JumperGatedWatchdog;
