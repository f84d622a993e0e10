//! On-chip RTC wall clock
//!
//! The RP2040 RTC has no battery: it stops on power loss and comes back
//! not running. That is exactly the "time lost" condition the scheduler
//! checks, so `has_valid_time` is the RTC's running flag.

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use embassy_rp::peripherals::RTC;
use embassy_rp::rtc::{DateTime, DayOfWeek, Rtc};
use embassy_rp::Peri;
use shutter_hal::{
    from_datetime, midnight, to_datetime, ClockError, TimeOfDay, Timestamp, WallClock,
};

/// RTC-backed wall clock
pub struct Rp2040Clock<'d> {
    rtc: Rtc<'d, RTC>,
}

impl<'d> Rp2040Clock<'d> {
    pub fn new(rtc: Peri<'d, RTC>) -> Self {
        Self { rtc: Rtc::new(rtc) }
    }
}

fn day_of_week(weekday: Weekday) -> DayOfWeek {
    match weekday {
        Weekday::Mon => DayOfWeek::Monday,
        Weekday::Tue => DayOfWeek::Tuesday,
        Weekday::Wed => DayOfWeek::Wednesday,
        Weekday::Thu => DayOfWeek::Thursday,
        Weekday::Fri => DayOfWeek::Friday,
        Weekday::Sat => DayOfWeek::Saturday,
        Weekday::Sun => DayOfWeek::Sunday,
    }
}

fn to_rtc(ts: Timestamp) -> DateTime {
    let dt = to_datetime(ts);
    DateTime {
        year: dt.year() as u16,
        month: dt.month() as u8,
        day: dt.day() as u8,
        day_of_week: day_of_week(dt.weekday()),
        hour: dt.hour() as u8,
        minute: dt.minute() as u8,
        second: dt.second() as u8,
    }
}

fn from_rtc(dt: &DateTime) -> Result<Timestamp, ClockError> {
    let naive = NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))
        .and_then(|date| {
            date.and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))
        })
        .ok_or(ClockError::InvalidTime)?;
    from_datetime(&naive)
}

impl<'d> WallClock for Rp2040Clock<'d> {
    fn now(&mut self) -> Result<Timestamp, ClockError> {
        if !self.rtc.is_running() {
            return Err(ClockError::NotSet);
        }
        let dt = self.rtc.now().map_err(|_| ClockError::Device)?;
        from_rtc(&dt)
    }

    fn set_time_of_day(&mut self, time: TimeOfDay) -> Result<(), ClockError> {
        // A stopped RTC has no date worth keeping; start from the epoch
        let today = self.now().map(midnight).unwrap_or(0);
        self.rtc
            .set_datetime(to_rtc(today + time.to_seconds()))
            .map_err(|_| ClockError::InvalidTime)
    }

    fn has_valid_time(&mut self) -> bool {
        self.rtc.is_running()
    }
}
