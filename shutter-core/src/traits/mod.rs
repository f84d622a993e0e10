//! Collaborator traits
//!
//! These traits define the interface between the application logic and
//! the outputs it drives. Storage, clock and watchdog capabilities live in
//! `shutter-hal`; the traits here are owned by the core because only the
//! core gives them meaning.

pub mod motor;
pub mod sink;

pub use motor::MotorOutput;
pub use sink::EventSink;
