//! Cryptographically secure random generation.
//!
//! Uses the operating system's CSPRNG. `OsRng` holds no per-thread state,
//! so concurrent generation needs no coordination.

use rand::{rngs::OsRng, RngCore};

/// Fills buffers with random bytes.
pub(crate) trait RandomSource {
    fn fill(&self, buffer: &mut [u8]);
}

/// The operating system CSPRNG.
pub(crate) struct OsRandom;

impl RandomSource for OsRandom {
    #[inline]
    fn fill(&self, buffer: &mut [u8]) {
        OsRng.fill_bytes(buffer);
    }
}

/// Emits a constant byte, for reproducible test vectors.
#[cfg(test)]
pub(crate) struct FixedRandom(pub u8);

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn fill(&self, buffer: &mut [u8]) {
        buffer.fill(self.0);
    }
}
