//! Shutter Hardware Abstraction Layer
//!
//! This crate defines the capability surface the controller core needs from
//! the outside world. Chip-specific crates implement it, and the core crate
//! only ever talks to these traits, which keeps it testable on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (shutter-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  shutter-core (scheduler, store, log)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  shutter-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  shutter-hal-rp2040 / host fakes        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`storage::ByteStorage`] - Addressable non-volatile bytes
//! - [`rtc::WallClock`] - Local wall-clock time with a validity flag
//! - [`watchdog::Watchdog`], [`watchdog::WatchdogTimer`] - Reset supervision
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod rtc;
pub mod storage;
pub mod watchdog;

// Re-export key traits at crate root for convenience
pub use gpio::{EhInput, EhOutput, InputPin, OutputPin};
pub use rtc::{
    from_datetime, midnight, to_datetime, ClockError, TimeOfDay, Timestamp, WallClock,
    SECONDS_PER_DAY,
};
pub use storage::{ByteStorage, RamStorage, StorageError, BLOCK_SIZE};
pub use watchdog::{Watchdog, WatchdogTimer};
