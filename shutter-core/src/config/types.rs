//! Domain enums shared across the crate

/// A controlled operation with its own schedule record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Open,
    Close,
}

impl Action {
    /// All actions, in scheduling order
    pub const ALL: [Action; 2] = [Action::Open, Action::Close];

    /// Position in [`Action::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Action::Open => 0,
            Action::Close => 1,
        }
    }

    /// Human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            Action::Open => "open",
            Action::Close => "close",
        }
    }
}

/// Why the motor is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunReason {
    /// Fired by the scheduler
    Auto,
    /// Started manually for one per-event duration
    OneShot,
    /// Traversal measurement, stopped by the user
    Measure,
}

impl RunReason {
    pub const ALL: [RunReason; 3] = [RunReason::Auto, RunReason::OneShot, RunReason::Measure];

    pub const fn index(self) -> usize {
        match self {
            RunReason::Auto => 0,
            RunReason::OneShot => 1,
            RunReason::Measure => 2,
        }
    }
}

/// Start or stop of a motor run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunPhase {
    Start,
    Stop,
}
