//! Journal frame encoding
//!
//! ```text
//! [code, hour, minute, second, 0, 0, 0, checksum]
//! ```

use shutter_hal::{TimeOfDay, BLOCK_SIZE};

use crate::checksum::{seal, verify};
use crate::config::EventCode;

/// Encoded frame
pub type Frame = [u8; BLOCK_SIZE];

/// One journaled event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogEntry {
    pub code: EventCode,
    pub time: TimeOfDay,
}

impl LogEntry {
    /// Entry returned for anything that is not a readable event
    pub const INVALID: Self = Self {
        code: EventCode::INVALID,
        time: TimeOfDay::MIDNIGHT,
    };

    pub const fn new(code: EventCode, time: TimeOfDay) -> Self {
        Self { code, time }
    }

    pub const fn is_valid(&self) -> bool {
        !self.code.is_invalid()
    }

    pub fn encode(&self) -> Frame {
        let mut frame = [
            self.code.0,
            self.time.hour,
            self.time.minute,
            self.time.second,
            0,
            0,
            0,
            0,
        ];
        seal(&mut frame);
        frame
    }

    /// Decode a frame, `None` on checksum mismatch
    ///
    /// Out-of-range time fields in a frame that passes its checksum are
    /// wrapped rather than rejected.
    pub fn decode(frame: &Frame) -> Option<Self> {
        if !verify(frame) {
            return None;
        }
        let secs = frame[1] as u32 * 3600 + frame[2] as u32 * 60 + frame[3] as u32;
        Some(Self {
            code: EventCode(frame[0]),
            time: TimeOfDay::from_seconds(secs),
        })
    }
}

/// The end-of-log marker
pub fn sentinel() -> Frame {
    LogEntry::INVALID.encode()
}

/// `true` if `frame` is an intact end-of-log marker
pub fn is_sentinel(frame: &Frame) -> bool {
    frame[0] == EventCode::INVALID.0 && verify(frame)
}
