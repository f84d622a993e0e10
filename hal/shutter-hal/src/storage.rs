//! Byte storage abstractions
//!
//! Provides an addressable non-volatile byte range (EEPROM, or flash behind
//! a block map) that chip-specific HALs implement.

/// Size of the smallest unit the controller ever writes
///
/// Schedule records, the storage header and event log frames are all
/// exactly one block, placed on block-aligned addresses.
pub const BLOCK_SIZE: usize = 8;

/// Value of a byte that has never been written
pub const ERASED: u8 = 0xFF;

/// Index of an aligned block within the storage range
///
/// Used as the key when storage is backed by a key-value map rather than
/// directly addressable memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockIndex(pub u16);

impl BlockIndex {
    /// Block containing the given byte address
    pub const fn containing(addr: usize) -> Self {
        Self((addr / BLOCK_SIZE) as u16)
    }

    /// First byte address of this block
    pub const fn addr(self) -> usize {
        self.0 as usize * BLOCK_SIZE
    }
}

/// Errors from storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// Address range lies outside the device
    OutOfRange,
    /// Address or length is not block-aligned (block-mapped backends only)
    Unaligned,
    /// Underlying bus or flash operation failed
    Device,
    /// Backend is out of space (wear-levelled backends only)
    Full,
}

/// Addressable non-volatile byte storage
///
/// # Atomicity
///
/// A single `write` of exactly one [`BLOCK_SIZE`] block starting on a
/// block-aligned address is committed all-or-nothing: after a power loss a
/// reader observes either the old or the new block, never a mix. Longer or
/// unaligned writes carry no such guarantee. Callers that need crash safety
/// (settings records, log frames) only ever issue single aligned-block
/// writes and additionally protect each block with a checksum, so a backend
/// that breaks the guarantee degrades to a detected integrity error rather
/// than silent corruption.
pub trait ByteStorage {
    /// Total number of addressable bytes
    fn capacity(&self) -> usize;

    /// Read `buf.len()` bytes starting at `addr`
    fn read(
        &mut self,
        addr: usize,
        buf: &mut [u8],
    ) -> impl core::future::Future<Output = Result<(), StorageError>>;

    /// Write `data` starting at `addr`
    fn write(
        &mut self,
        addr: usize,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), StorageError>>;
}

/// Check that `addr..addr + len` fits inside a device of `capacity` bytes
pub fn check_range(addr: usize, len: usize, capacity: usize) -> Result<(), StorageError> {
    match addr.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StorageError::OutOfRange),
    }
}

/// Check that an access covers whole blocks only
pub fn check_aligned(addr: usize, len: usize) -> Result<(), StorageError> {
    if addr % BLOCK_SIZE == 0 && len % BLOCK_SIZE == 0 {
        Ok(())
    } else {
        Err(StorageError::Unaligned)
    }
}

/// RAM-backed storage
///
/// Starts fully erased (`0xFF`), like a fresh EEPROM. Writes complete
/// synchronously, so every write is trivially atomic.
#[derive(Clone)]
pub struct RamStorage<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> RamStorage<N> {
    /// Create erased storage
    pub const fn new() -> Self {
        Self { bytes: [ERASED; N] }
    }

    /// Raw view of the stored bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable raw view, for simulating corruption
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteStorage for RamStorage<N> {
    fn capacity(&self) -> usize {
        N
    }

    async fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        check_range(addr, buf.len(), N)?;
        buf.copy_from_slice(&self.bytes[addr..addr + buf.len()]);
        Ok(())
    }

    async fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        check_range(addr, data.len(), N)?;
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for BlockIndex {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.len() < 2 {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[..2].copy_from_slice(&self.0.to_le_bytes());
        Ok(2)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.len() < 2 {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        Ok((BlockIndex(u16::from_le_bytes([buffer[0], buffer[1]])), 2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn test_ram_storage_starts_erased() {
        let mut storage = RamStorage::<32>::new();
        let mut buf = [0u8; 8];
        block_on(storage.read(8, &mut buf)).unwrap();
        assert_eq!(buf, [ERASED; 8]);
    }

    #[test]
    fn test_ram_storage_write_read() {
        let mut storage = RamStorage::<32>::new();
        block_on(storage.write(16, &[1, 2, 3])).unwrap();

        let mut buf = [0u8; 4];
        block_on(storage.read(16, &mut buf)).unwrap();
        assert_eq!(buf, [1, 2, 3, ERASED]);
    }

    #[test]
    fn test_ram_storage_out_of_range() {
        let mut storage = RamStorage::<16>::new();
        let mut buf = [0u8; 8];
        assert_eq!(
            block_on(storage.read(12, &mut buf)),
            Err(StorageError::OutOfRange)
        );
        assert_eq!(
            block_on(storage.write(usize::MAX, &[0])),
            Err(StorageError::OutOfRange)
        );
    }

    #[test]
    fn test_block_index() {
        assert_eq!(BlockIndex::containing(0), BlockIndex(0));
        assert_eq!(BlockIndex::containing(15), BlockIndex(1));
        assert_eq!(BlockIndex(32).addr(), 256);
    }

    #[test]
    fn test_alignment_check() {
        assert!(check_aligned(64, 8).is_ok());
        assert_eq!(check_aligned(63, 8), Err(StorageError::Unaligned));
        assert_eq!(check_aligned(64, 7), Err(StorageError::Unaligned));
    }
}
