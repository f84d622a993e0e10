//! Configuration types
//!
//! Everything deployment-specific that the core logic needs: where blocks
//! live in storage, which codes the journal uses for motor runs, and the
//! timing limits of the scheduler.

pub mod codes;
pub mod layout;
pub mod types;

pub use codes::*;
pub use layout::*;
pub use types::*;

/// Minimum lead time when anchoring a fire time to today (seconds)
pub const GUARD_INTERVAL_S: u32 = 5;

/// Longest traversal measurement (seconds)
pub const MAX_MEASURE_S: u16 = 999;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Motor event code used twice, or colliding with a system code
    DuplicateEventCode(u8),
    /// Block address not a multiple of the block size
    Misaligned(usize),
    /// Block overlaps the block at the given address
    Overlap(usize),
    /// Block extends past the end of storage
    OutOfBounds(usize),
    /// Log region cannot hold an entry and the sentinel
    LogTooSmall,
    /// Measurement limit of zero
    InvalidMeasureLimit,
}

/// Complete controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShutterConfig {
    pub layout: StorageLayout,
    pub event_codes: MotorEventCodes,
    /// Minimum lead time when anchoring a fire time to today (seconds)
    pub guard_interval_s: u32,
    /// Longest traversal measurement (seconds)
    pub max_measure_s: u16,
}

impl ShutterConfig {
    /// Validate against a storage device of `capacity` bytes
    pub fn validate(&self, capacity: usize) -> Result<(), ConfigError> {
        self.layout.validate(capacity)?;
        if let Some(code) = self.event_codes.first_conflict() {
            return Err(ConfigError::DuplicateEventCode(code.0));
        }
        if self.max_measure_s == 0 {
            return Err(ConfigError::InvalidMeasureLimit);
        }
        Ok(())
    }

    /// English description of any journaled code
    pub fn describe(&self, code: EventCode) -> &'static str {
        code.describe()
            .or_else(|| self.event_codes.describe(code))
            .unwrap_or("Unknown event")
    }
}

impl Default for ShutterConfig {
    fn default() -> Self {
        Self {
            layout: StorageLayout::default(),
            event_codes: MotorEventCodes::default(),
            guard_interval_s: GUARD_INTERVAL_S,
            max_measure_s: MAX_MEASURE_S,
        }
    }
}
