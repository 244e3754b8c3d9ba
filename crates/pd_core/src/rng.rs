// crates/pd_core/src/rng.rs
//
// Seedable RNG for draws.
//
// • Every draw consumes words from one continuing stream; a Monte-Carlo run of
//   N draws against the same runner therefore never replays the same sequence.
// • The stream is fully determined by a 64-bit seed. OS entropy is only used to
//   pick that seed, so every run can be replayed from the seed it reports.
// • Cross-platform determinism: explicit little-endian seed mapping and
//   word-index accounting.

use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};

use crate::errors::CoreError;

/// Deterministic RNG for refusal draws.
///
/// Internally uses ChaCha20 with an explicit 32-byte seed derived from the
/// 64-bit draw seed (little-endian bytes in the first 8 positions; the rest 0).
#[derive(Debug, Clone)]
pub struct DrawRng {
    rng: ChaCha20Rng,
    seed: u64,
    words_consumed: u128,
}

impl DrawRng {
    /// Construct from a 64-bit seed. The mapping from `u64` to the ChaCha20
    /// 32-byte seed is `seed.to_le_bytes()` into the first 8 bytes; the
    /// remaining 24 bytes are zero.
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            seed,
            words_consumed: 0,
        }
    }

    /// Pick a fresh seed from the operating system.
    ///
    /// Fails only when the OS cannot provide entropy; callers treat that as a
    /// construction error.
    pub fn from_os_entropy() -> Result<Self, CoreError> {
        let mut buf = [0u8; 8];
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| CoreError::NoRandomSource(e.to_string()))?;
        Ok(Self::from_seed_u64(u64::from_le_bytes(buf)))
    }

    /// The seed this stream was built from (for run records and replay).
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Total number of 64-bit words consumed so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    #[inline]
    fn count(&mut self, words: u128) {
        self.words_consumed = self.words_consumed.saturating_add(words);
    }
}

impl RngCore for DrawRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.count(1);
        self.rng.next_u32()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.count(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.count(dest.len().div_ceil(8) as u128);
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.count(dest.len().div_ceil(8) as u128);
        self.rng.try_fill_bytes(dest)
    }
}

/// Uniform `f64` in `[0, 1)` built from the top 53 bits of one 64-bit word.
#[inline]
pub fn unit_interval<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    const SCALE: f64 = 1.0 / (1u64 << 53) as f64;
    (rng.next_u64() >> 11) as f64 * SCALE
}
