//! RP2040-specific HAL for the shutter controller firmware
//!
//! This crate provides RP2040 implementations of the shared `shutter-hal`
//! traits:
//!
//! - Flash-backed block storage (implements `shutter_hal::ByteStorage`)
//! - On-chip RTC wall clock (implements `shutter_hal::WallClock`)
//! - Hardware watchdog timer (implements `shutter_hal::WatchdogTimer`)

#![no_std]

pub mod flash;
pub mod rtc;
pub mod watchdog;

pub use flash::Rp2040BlockStorage;
pub use rtc::Rp2040Clock;
pub use watchdog::Rp2040Watchdog;
