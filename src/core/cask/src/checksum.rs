//! Trailing key checksum.
//!
//! The checksum is the first three bytes of the little-endian CRC-32 (IEEE)
//! of every byte that precedes it.

/// Computes the checksum over `bytes`.
#[inline]
pub(crate) fn compute(bytes: &[u8]) -> [u8; 3] {
    let [a, b, c, _] = crc32fast::hash(bytes).to_le_bytes();
    [a, b, c]
}
