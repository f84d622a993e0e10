//! GPIO pin abstractions
//!
//! Digital pins as the controller sees them: infallible, with the
//! electrical details (pull-ups, active level) settled by whoever builds
//! the pin. Adapters wrap any `embedded-hal` 1.0 pin.

/// Digital output pin
pub trait OutputPin {
    /// Drive the pin high (logic 1)
    fn set_high(&mut self);

    /// Drive the pin low (logic 0)
    fn set_low(&mut self);

    /// Level the pin is currently driven to
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
pub trait InputPin {
    /// Sample the pin; `true` if it reads high
    fn is_high(&mut self) -> bool;
}

/// Adapter from an `embedded-hal` output pin
///
/// Remembers the last commanded level so [`OutputPin::is_set_high`] does not
/// need to touch the hardware. Bus errors are dropped: on-chip GPIO is
/// infallible and the motor driver re-asserts its state on every command.
pub struct EhOutput<P> {
    pin: P,
    high: bool,
}

impl<P: embedded_hal::digital::OutputPin> EhOutput<P> {
    /// Wrap a pin, driving it low
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self { pin, high: false }
    }
}

impl<P: embedded_hal::digital::OutputPin> OutputPin for EhOutput<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Adapter from an `embedded-hal` input pin
///
/// A read error is reported as low.
pub struct EhInput<P> {
    pin: P,
}

impl<P: embedded_hal::digital::InputPin> EhInput<P> {
    /// Wrap a pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: embedded_hal::digital::InputPin> InputPin for EhInput<P> {
    fn is_high(&mut self) -> bool {
        self.pin.is_high().unwrap_or(false)
    }
}
