//! Block checksum
//!
//! Every persisted block (settings record, header, log frame) ends in a
//! single checksum byte: the XOR of all payload bytes folded into a
//! non-zero seed. The seed makes an all-zero block fail verification.

/// Initial value of the XOR fold
pub const CHECKSUM_SEED: u8 = 42;

/// Checksum of a payload
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(CHECKSUM_SEED, |acc, b| acc ^ b)
}

/// Check a frame whose last byte is the checksum of the rest
///
/// An empty frame never verifies.
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&cs, payload)) => checksum(payload) == cs,
        None => false,
    }
}

/// Write the checksum of `block[..n-1]` into the last byte
pub fn seal(block: &mut [u8]) {
    if let Some((last, payload)) = block.split_last_mut() {
        *last = checksum(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_record_checksum() {
        assert_eq!(checksum(&[0, 0, 0, 0, 0, 1]), 43);
        assert!(verify(&[0, 0, 0, 0, 0, 1, 43]));
        assert!(!verify(&[0, 0, 0, 0, 0, 1, 44]));
    }

    #[test]
    fn test_empty_payload_is_seed() {
        assert_eq!(checksum(&[]), CHECKSUM_SEED);
        assert!(verify(&[CHECKSUM_SEED]));
    }

    #[test]
    fn test_empty_frame_never_verifies() {
        assert!(!verify(&[]));
    }

    #[test]
    fn test_all_zero_block_fails() {
        assert!(!verify(&[0u8; 8]));
    }

    #[test]
    fn test_erased_block_fails() {
        assert!(!verify(&[0xFFu8; 8]));
    }

    #[test]
    fn test_seal() {
        let mut block = [7, 30, 19, 0, 0x2C, 0x01, 4, 0];
        seal(&mut block);
        assert!(verify(&block));
    }

    proptest! {
        #[test]
        fn prop_appended_checksum_verifies(payload in proptest::collection::vec(any::<u8>(), 0..16)) {
            let mut frame = payload.clone();
            frame.push(checksum(&payload));
            prop_assert!(verify(&frame));
        }

        #[test]
        fn prop_single_byte_mutation_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..16),
            idx in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut frame = payload.clone();
            frame.push(checksum(&payload));
            let i = idx.index(frame.len());
            frame[i] ^= flip;
            prop_assert!(!verify(&frame));
        }
    }
}
