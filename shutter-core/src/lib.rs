//! Board-agnostic core logic for the shutter controller firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Block checksum shared by settings records and log frames
//! - Persistent schedule settings with first-boot defaults
//! - Circular event journal with an end sentinel
//! - Schedule planner (record to intra-day fire offsets)
//! - Task scheduler firing at most one action per tick
//! - Motor lock, scoped stop guard and watchdog-safe runs
//! - Configuration type definitions (storage layout, event codes)
//! - Serial console command parser

#![no_std]
#![deny(unsafe_code)]

pub mod checksum;
pub mod config;
pub mod console;
pub mod device;
pub mod journal;
pub mod motor;
pub mod scheduler;
pub mod settings;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
