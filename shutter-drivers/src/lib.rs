//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in shutter-core and shutter-hal on top of plain GPIO:
//!
//! - Motor drivers (two-pin H-bridge / relay pair)
//! - Watchdog gating (enable jumper)

#![no_std]
#![deny(unsafe_code)]

pub mod motor;
pub mod watchdog;
