//! Schedule planner
//!
//! Spreads `event_count` fires evenly from the first to the last time of
//! day. A window whose end is before its start spans midnight. Fire times
//! are rounded to whole seconds, ties to even, using exact integer
//! arithmetic.

use shutter_hal::SECONDS_PER_DAY;

use crate::settings::ScheduleRecord;

/// Fire offsets (seconds since midnight) of one record
pub fn offsets(record: &ScheduleRecord) -> Offsets {
    let start = record.start_offset() % SECONDS_PER_DAY;
    let mut end = record.end_offset() % SECONDS_PER_DAY;
    if end < start {
        end += SECONDS_PER_DAY;
    }
    let count = match (record.duration, record.event_count) {
        (0, _) => 0,
        (_, 0 | 1) => 1,
        (_, n) => u32::from(n),
    };
    Offsets {
        start,
        span: end - start,
        count,
        next: 0,
    }
}

/// Iterator over a record's fire offsets, in firing order
#[derive(Debug, Clone)]
pub struct Offsets {
    start: u32,
    span: u32,
    count: u32,
    next: u32,
}

impl Offsets {
    fn offset(&self, i: u32) -> u32 {
        if self.count < 2 {
            return self.start;
        }
        let den = u64::from(self.count - 1);
        let num = u64::from(self.start) * den + u64::from(i) * u64::from(self.span);
        (round_half_even(num, den) % u64::from(SECONDS_PER_DAY)) as u32
    }
}

impl Iterator for Offsets {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.count {
            return None;
        }
        let offset = self.offset(self.next);
        self.next += 1;
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Offsets {}

/// `num / den` rounded to the nearest integer, ties to even
fn round_half_even(num: u64, den: u64) -> u64 {
    let q = num / den;
    let twice_r = 2 * (num % den);
    if twice_r > den || (twice_r == den && q % 2 == 1) {
        q + 1
    } else {
        q
    }
}
