//! Two-input H-bridge motor driver
//!
//! One input per direction (L9110, DRV8833 or a relay pair). Driving both
//! inputs at once shorts the bridge or fights the relays, so the inactive
//! side is always released before the active side is asserted.
//!
//! ```text
//! forward  backward  motor
//!    0        0      stopped
//!    1        0      opening
//!    0        1      closing
//! ```

use shutter_core::config::Action;
use shutter_core::traits::MotorOutput;
use shutter_hal::OutputPin;

/// Motor on a pair of direction pins
pub struct HBridgeMotor<F, B> {
    forward: F,
    backward: B,
}

impl<F: OutputPin, B: OutputPin> HBridgeMotor<F, B> {
    /// Create a driver with the motor stopped
    pub fn new(mut forward: F, mut backward: B) -> Self {
        forward.set_low();
        backward.set_low();
        Self { forward, backward }
    }

    /// Direction currently driven, if any
    pub fn driving(&self) -> Option<Action> {
        match (self.forward.is_set_high(), self.backward.is_set_high()) {
            (true, false) => Some(Action::Open),
            (false, true) => Some(Action::Close),
            _ => None,
        }
    }
}

impl<F: OutputPin, B: OutputPin> MotorOutput for HBridgeMotor<F, B> {
    fn drive(&mut self, action: Action) {
        match action {
            Action::Open => {
                self.backward.set_low();
                self.forward.set_high();
            }
            Action::Close => {
                self.forward.set_low();
                self.backward.set_high();
            }
        }
    }

    fn halt(&mut self) {
        self.forward.set_low();
        self.backward.set_low();
    }
}
