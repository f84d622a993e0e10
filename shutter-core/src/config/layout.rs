//! Placement of persisted blocks in byte storage

use shutter_hal::BLOCK_SIZE;

use super::types::Action;
use super::ConfigError;

/// Contiguous run of log frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogRegion {
    /// Address of the first frame
    pub start: usize,
    /// Number of frames, including the one holding the sentinel
    pub frames: usize,
}

impl LogRegion {
    /// One past the last byte
    pub const fn end(&self) -> usize {
        self.start + self.frames * BLOCK_SIZE
    }

    /// Address of frame `index`
    pub const fn frame_addr(&self, index: usize) -> usize {
        self.start + index * BLOCK_SIZE
    }
}

/// Where every persisted block lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageLayout {
    /// First-boot header block
    pub header: usize,
    /// Schedule record per action, indexed by [`Action::index`]
    pub records: [usize; 2],
    /// Event journal
    pub log: LogRegion,
}

impl StorageLayout {
    /// Address of an action's schedule record
    pub const fn record_addr(&self, action: Action) -> usize {
        self.records[action.index()]
    }

    /// Check alignment, overlap and bounds against a device size
    pub fn validate(&self, capacity: usize) -> Result<(), ConfigError> {
        if self.log.frames < 2 {
            return Err(ConfigError::LogTooSmall);
        }

        let spans = [
            (self.header, BLOCK_SIZE),
            (self.records[0], BLOCK_SIZE),
            (self.records[1], BLOCK_SIZE),
            (self.log.start, self.log.frames * BLOCK_SIZE),
        ];

        for (i, &(addr, len)) in spans.iter().enumerate() {
            if addr % BLOCK_SIZE != 0 {
                return Err(ConfigError::Misaligned(addr));
            }
            if addr + len > capacity {
                return Err(ConfigError::OutOfBounds(addr));
            }
            for &(other, other_len) in &spans[i + 1..] {
                if addr < other + other_len && other < addr + len {
                    return Err(ConfigError::Overlap(other));
                }
            }
        }
        Ok(())
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self {
            header: 0x000,
            records: [0x040, 0x080],
            log: LogRegion {
                start: 0x100,
                frames: 128,
            },
        }
    }
}
