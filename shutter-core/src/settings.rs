//! Persistent schedule settings
//!
//! One 8-byte record per action at a fixed address, plus a header block
//! that marks the storage as initialized:
//!
//! ```text
//! record: [first_hr, first_min, last_hr, last_min, dur_lo, dur_hi, count, checksum]
//! header: ['S', 'H', 'T', 'R', version, 0, 0, checksum]
//! ```

use shutter_hal::{ByteStorage, StorageError, WallClock, Watchdog, BLOCK_SIZE};

use crate::checksum::{seal, verify};
use crate::config::{Action, EventCode, StorageLayout};
use crate::device::Device;
use crate::traits::EventSink;

/// Header magic
pub const MAGIC: [u8; 4] = *b"SHTR";

/// Bumped whenever the storage layout changes incompatibly
pub const LAYOUT_VERSION: u8 = 1;

/// Errors from settings writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// Hour or minute field out of range
    OutOfRange,
    Storage(StorageError),
}

impl From<StorageError> for SettingsError {
    fn from(e: StorageError) -> Self {
        SettingsError::Storage(e)
    }
}

/// Daily schedule of one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleRecord {
    pub first_hour: u8,
    pub first_minute: u8,
    pub last_hour: u8,
    pub last_minute: u8,
    /// Total motor seconds per day, split evenly across events
    pub duration: u16,
    /// Fires per day
    pub event_count: u8,
}

impl ScheduleRecord {
    /// Midnight, no motor time, one event
    pub const DEFAULT: Self = Self {
        first_hour: 0,
        first_minute: 0,
        last_hour: 0,
        last_minute: 0,
        duration: 0,
        event_count: 1,
    };

    /// Motor time of a single event in milliseconds
    ///
    /// An event count of zero is treated as one.
    pub const fn duration_per_event_ms(&self) -> u32 {
        let count = if self.event_count == 0 {
            1
        } else {
            self.event_count as u32
        };
        self.duration as u32 * 1000 / count
    }

    /// First event, seconds since midnight
    pub const fn start_offset(&self) -> u32 {
        self.first_hour as u32 * 3600 + self.first_minute as u32 * 60
    }

    /// Last event, seconds since midnight
    pub const fn end_offset(&self) -> u32 {
        self.last_hour as u32 * 3600 + self.last_minute as u32 * 60
    }

    /// `true` if the window ends before it starts (spans midnight)
    pub const fn is_overnight(&self) -> bool {
        self.end_offset() < self.start_offset()
    }

    pub const fn is_in_range(&self) -> bool {
        self.first_hour < 24 && self.last_hour < 24 && self.first_minute < 60 && self.last_minute < 60
    }

    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        let [lo, hi] = self.duration.to_le_bytes();
        let mut block = [
            self.first_hour,
            self.first_minute,
            self.last_hour,
            self.last_minute,
            lo,
            hi,
            self.event_count,
            0,
        ];
        seal(&mut block);
        block
    }

    /// Decode a block, `None` on checksum mismatch
    pub fn decode(block: &[u8; BLOCK_SIZE]) -> Option<Self> {
        if !verify(block) {
            return None;
        }
        Some(Self {
            first_hour: block[0],
            first_minute: block[1],
            last_hour: block[2],
            last_minute: block[3],
            duration: u16::from_le_bytes([block[4], block[5]]),
            event_count: block[6],
        })
    }
}

impl Default for ScheduleRecord {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn header_block() -> [u8; BLOCK_SIZE] {
    let mut block = [MAGIC[0], MAGIC[1], MAGIC[2], MAGIC[3], LAYOUT_VERSION, 0, 0, 0];
    seal(&mut block);
    block
}

/// Reads and writes schedule records at their configured addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsStore {
    layout: StorageLayout,
}

impl SettingsStore {
    pub const fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Load an action's record
    ///
    /// A corrupt or unreadable record is journaled as
    /// [`EventCode::SETTINGS_LOAD_ERR`] and replaced by the default, without
    /// writing storage.
    pub async fn load<S, C, W, E>(
        &self,
        dev: &mut Device<S, C, W, E>,
        action: Action,
    ) -> ScheduleRecord
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        let mut block = [0u8; BLOCK_SIZE];
        let read = dev
            .storage
            .read(self.layout.record_addr(action), &mut block)
            .await;
        match read.ok().and_then(|()| ScheduleRecord::decode(&block)) {
            Some(record) => record,
            None => {
                dev.record(EventCode::SETTINGS_LOAD_ERR).await;
                ScheduleRecord::DEFAULT
            }
        }
    }

    /// Persist an action's record in one block write
    pub async fn save<S, C, W, E>(
        &self,
        dev: &mut Device<S, C, W, E>,
        action: Action,
        record: &ScheduleRecord,
    ) -> Result<(), SettingsError>
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        if !record.is_in_range() {
            return Err(SettingsError::OutOfRange);
        }
        dev.storage
            .write(self.layout.record_addr(action), &record.encode())
            .await?;
        dev.record(EventCode::SETTINGS_SAVE).await;
        Ok(())
    }

    /// Restore the default record for every action
    pub async fn reset<S, C, W, E>(&self, dev: &mut Device<S, C, W, E>) -> Result<(), SettingsError>
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        for action in Action::ALL {
            self.save(dev, action, &ScheduleRecord::DEFAULT).await?;
        }
        Ok(())
    }

    /// Reset every record unless the header marks storage as initialized
    ///
    /// Returns `true` on first boot (header missing, corrupt or from another
    /// layout version). The header is written last, so an interrupted reset
    /// is redone on the next boot.
    pub async fn ensure_initialized<S, C, W, E>(
        &self,
        dev: &mut Device<S, C, W, E>,
    ) -> Result<bool, SettingsError>
    where
        S: ByteStorage,
        C: WallClock,
        W: Watchdog,
        E: EventSink,
    {
        let expected = header_block();
        let mut block = [0u8; BLOCK_SIZE];
        dev.storage.read(self.layout.header, &mut block).await?;
        if block == expected {
            return Ok(false);
        }
        self.reset(dev).await?;
        dev.storage.write(self.layout.header, &expected).await?;
        Ok(true)
    }
}
