//! Flash block storage for RP2040
//!
//! The RP2040 has no EEPROM, so the byte range is emulated: each aligned
//! 8-byte block is one item in a sequential-storage map, keyed by its block
//! index, in the last 32KB of flash. Storing an item is append-only, so a
//! single-block write is atomic across power loss. Blocks never written
//! read back as erased (`0xFF`).

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;
use shutter_hal::storage::{check_aligned, check_range, BlockIndex, ERASED};
use shutter_hal::{ByteStorage, StorageError, BLOCK_SIZE};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico
pub const PARTITION_SIZE: usize = 8 * ERASE_SIZE; // 32KB for block storage
pub const PARTITION_START: usize = FLASH_SIZE - PARTITION_SIZE;

/// Addressable bytes exposed to the controller
pub const CAPACITY: usize = 4096;

/// Flash range for the storage partition
pub const PARTITION_RANGE: core::ops::Range<u32> = (PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Room for a serialized key and one block
const ITEM_BUFFER: usize = 32;

/// RP2040 flash-backed block storage
pub struct Rp2040BlockStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040BlockStorage<'d> {
    /// Create a new block storage instance
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }

    async fn read_block(&mut self, index: BlockIndex) -> Result<[u8; BLOCK_SIZE], StorageError> {
        let mut buffer = [0u8; ITEM_BUFFER];
        let item = map::fetch_item::<BlockIndex, &[u8], _>(
            &mut self.flash,
            PARTITION_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &index,
        )
        .await
        .map_err(|_| StorageError::Device)?;

        let mut block = [ERASED; BLOCK_SIZE];
        if let Some(data) = item {
            if data.len() != BLOCK_SIZE {
                return Err(StorageError::Device);
            }
            block.copy_from_slice(data);
        }
        Ok(block)
    }

    async fn write_block(&mut self, index: BlockIndex, block: &[u8]) -> Result<(), StorageError> {
        let mut buffer = [0u8; ITEM_BUFFER];
        map::store_item(
            &mut self.flash,
            PARTITION_RANGE,
            &mut NoCache::new(),
            &mut buffer,
            &index,
            &block,
        )
        .await
        .map_err(|e| match e {
            sequential_storage::Error::FullStorage => StorageError::Full,
            _ => StorageError::Device,
        })
    }
}

impl<'d> ByteStorage for Rp2040BlockStorage<'d> {
    fn capacity(&self) -> usize {
        CAPACITY
    }

    async fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        check_range(addr, buf.len(), CAPACITY)?;
        check_aligned(addr, buf.len())?;
        for (i, chunk) in buf.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            let block = self
                .read_block(BlockIndex::containing(addr + i * BLOCK_SIZE))
                .await?;
            chunk.copy_from_slice(&block);
        }
        Ok(())
    }

    async fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        check_range(addr, data.len(), CAPACITY)?;
        check_aligned(addr, data.len())?;
        for (i, chunk) in data.chunks_exact(BLOCK_SIZE).enumerate() {
            self.write_block(BlockIndex::containing(addr + i * BLOCK_SIZE), chunk)
                .await?;
        }
        Ok(())
    }
}
