//! Wall clock abstractions
//!
//! Time is kept as local seconds since 2000-01-01 00:00:00. No time zones,
//! no DST: the controller schedules against whatever the user set.
//! Calendar conversions go through `chrono`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Local seconds since 2000-01-01 00:00:00
pub type Timestamp = u32;

/// Seconds in one day
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Unix time of [`Timestamp`] zero
const EPOCH_UNIX: i64 = 946_684_800;

/// Errors from clock operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Clock lost its time (power loss, never set)
    NotSet,
    /// Clock hardware did not respond
    Device,
    /// Requested time is not representable
    InvalidTime,
}

/// Hour, minute and second within a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeOfDay {
    /// 00:00:00
    pub const MIDNIGHT: Self = Self {
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// Validated constructor
    pub const fn new(hour: u8, minute: u8, second: u8) -> Option<Self> {
        if hour < 24 && minute < 60 && second < 60 {
            Some(Self {
                hour,
                minute,
                second,
            })
        } else {
            None
        }
    }

    /// Seconds since midnight
    pub const fn to_seconds(self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }

    /// Time of day for a seconds count, wrapping at midnight
    pub const fn from_seconds(secs: u32) -> Self {
        let secs = secs % SECONDS_PER_DAY;
        Self {
            hour: (secs / 3600) as u8,
            minute: (secs / 60 % 60) as u8,
            second: (secs % 60) as u8,
        }
    }

    /// Time of day of a timestamp
    pub const fn of(ts: Timestamp) -> Self {
        Self::from_seconds(ts)
    }
}

/// Local midnight at or before `ts`
pub const fn midnight(ts: Timestamp) -> Timestamp {
    ts - ts % SECONDS_PER_DAY
}

/// Calendar date and time of a timestamp
pub fn to_datetime(ts: Timestamp) -> NaiveDateTime {
    DateTime::from_timestamp(EPOCH_UNIX + i64::from(ts), 0)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .naive_utc()
}

/// Timestamp of a calendar date and time
///
/// Dates before 2000 or past the end of the `u32` range are rejected.
pub fn from_datetime(dt: &NaiveDateTime) -> Result<Timestamp, ClockError> {
    Timestamp::try_from(dt.and_utc().timestamp() - EPOCH_UNIX).map_err(|_| ClockError::InvalidTime)
}

/// Battery-backed local wall clock
pub trait WallClock {
    /// Current local time
    fn now(&mut self) -> Result<Timestamp, ClockError>;

    /// Set the time of day, keeping the date
    ///
    /// A clock that had lost its time becomes valid again after this call.
    fn set_time_of_day(&mut self, time: TimeOfDay) -> Result<(), ClockError>;

    /// `false` if the clock lost power since it was last set
    fn has_valid_time(&mut self) -> bool;
}
