//! Motor output trait

use crate::config::Action;

/// Two-direction motor power stage
///
/// Implementations switch power only. Timing, locking and journaling are
/// handled by [`crate::motor::MotorController`].
pub trait MotorOutput {
    /// Energize the motor in the direction of `action`
    fn drive(&mut self, action: Action);

    /// De-energize the motor
    ///
    /// Must be safe to call when already halted.
    fn halt(&mut self);
}

impl<M: MotorOutput + ?Sized> MotorOutput for &mut M {
    fn drive(&mut self, action: Action) {
        (**self).drive(action);
    }

    fn halt(&mut self) {
        (**self).halt();
    }
}
