//! Circular event journal
//!
//! A fixed region of 8-byte frames written round-robin. Exactly one frame,
//! the end sentinel, marks the next write position, so the cursor survives
//! power loss without a separate index block.
//!
//! # Crash safety
//!
//! An append writes the new sentinel first and then overwrites the old one
//! with the entry. Power loss between the two writes leaves two adjacent
//! sentinels; mount picks the first of the pair, which drops only the entry
//! that was never written.

mod frame;

pub use frame::{is_sentinel, sentinel, Frame, LogEntry};

use shutter_hal::{ByteStorage, StorageError, TimeOfDay};

use crate::config::{EventCode, LogRegion};

/// Errors from journal writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogError {
    /// Code 255 marks the end of the log and cannot be appended
    ReservedCode,
    Storage(StorageError),
}

impl From<StorageError> for LogError {
    fn from(e: StorageError) -> Self {
        LogError::Storage(e)
    }
}

/// How the cursor was found on mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountOutcome {
    /// Sentinel found; history intact
    Resumed,
    /// No sentinel; log restarted at the beginning of the region
    Recovered,
}

/// Write cursor over a journal region
///
/// Holds no storage itself; every operation borrows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventLog {
    region: LogRegion,
    cursor: usize,
    /// Entries behind the cursor that belong to the current history
    len: usize,
}

impl EventLog {
    /// Locate the sentinel and resume after the last entry
    pub async fn mount<S: ByteStorage>(
        storage: &mut S,
        region: LogRegion,
    ) -> Result<(Self, MountOutcome), StorageError> {
        let mut frame = [0u8; 8];
        storage
            .read(region.frame_addr(region.frames - 1), &mut frame)
            .await?;
        let mut prev_sentinel = is_sentinel(&frame);

        let mut first = None;
        let mut chosen = None;
        for index in 0..region.frames {
            storage.read(region.frame_addr(index), &mut frame).await?;
            let sentinel = is_sentinel(&frame);
            if sentinel {
                first.get_or_insert(index);
                if !prev_sentinel && chosen.is_none() {
                    chosen = Some(index);
                }
            }
            prev_sentinel = sentinel;
        }

        match chosen.or(first) {
            Some(cursor) => {
                let mut log = Self {
                    region,
                    cursor,
                    len: 0,
                };
                log.len = log.count_readable(storage).await?;
                Ok((log, MountOutcome::Resumed))
            }
            None => {
                storage.write(region.frame_addr(0), &sentinel()).await?;
                let log = Self {
                    region,
                    cursor: 0,
                    len: 0,
                };
                Ok((log, MountOutcome::Recovered))
            }
        }
    }

    /// Consecutive readable entries walking back from the cursor
    async fn count_readable<S: ByteStorage>(&self, storage: &mut S) -> Result<usize, StorageError> {
        let mut frame = [0u8; 8];
        for k in 0..self.capacity() {
            storage.read(self.region.frame_addr(self.index_of(k)), &mut frame).await?;
            if !LogEntry::decode(&frame).is_some_and(|e| e.is_valid()) {
                return Ok(k);
            }
        }
        Ok(self.capacity())
    }

    fn index_of(&self, k: usize) -> usize {
        let frames = self.region.frames;
        (self.cursor + frames - 1 - k) % frames
    }

    /// Append one entry, advancing the cursor with wraparound
    pub async fn append<S: ByteStorage>(
        &mut self,
        storage: &mut S,
        code: EventCode,
        time: TimeOfDay,
    ) -> Result<(), LogError> {
        if code.is_invalid() {
            return Err(LogError::ReservedCode);
        }
        let next = (self.cursor + 1) % self.region.frames;
        storage
            .write(self.region.frame_addr(next), &sentinel())
            .await?;
        storage
            .write(
                self.region.frame_addr(self.cursor),
                &LogEntry::new(code, time).encode(),
            )
            .await?;
        self.cursor = next;
        self.len = (self.len + 1).min(self.capacity());
        Ok(())
    }

    /// The `k`-th most recent entry, `0` being the newest
    ///
    /// Anything unreadable, including slots never written, comes back as
    /// [`LogEntry::INVALID`]. History ends at the first unreadable frame
    /// found behind the cursor on mount: entries older than that gap, such
    /// as those left over from before a recovery, are never returned.
    pub async fn get<S: ByteStorage>(&self, storage: &mut S, k: usize) -> LogEntry {
        if k >= self.len {
            return LogEntry::INVALID;
        }
        let mut frame = [0u8; 8];
        if storage
            .read(self.region.frame_addr(self.index_of(k)), &mut frame)
            .await
            .is_err()
        {
            return LogEntry::INVALID;
        }
        match LogEntry::decode(&frame) {
            Some(entry) if entry.is_valid() => entry,
            _ => LogEntry::INVALID,
        }
    }

    /// Number of entries retained; one slot always holds the sentinel
    pub const fn capacity(&self) -> usize {
        self.region.frames - 1
    }

    /// Entries currently retrievable with [`EventLog::get`]
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frame index of the sentinel
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    pub const fn region(&self) -> LogRegion {
        self.region
    }
}
