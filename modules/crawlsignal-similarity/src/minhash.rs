//! 128-function MinHash signatures over word 3-gram shingles.
//!
//! Hash seeds are generated deterministically from a fixed xorshift32 PRNG so
//! that the same text always produces the same signature, in this process or
//! any other.

use crawlsignal_common::fnv1a_32_seeded;

pub const NUM_HASHES: usize = 128;
pub const SIGNATURE_BYTES: usize = NUM_HASHES * 4;
const XORSHIFT32_SEED: u32 = 0x1234_5678;
const DEFAULT_SHINGLE_SIZE: usize = 3;

/// xorshift32, used only to derive the 128 deterministic hash seeds.
struct XorShift32(u32);

impl XorShift32 {
    fn new(seed: u32) -> Self {
        XorShift32(seed)
    }
}

impl Iterator for XorShift32 {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        Some(x)
    }
}

fn hash_seeds() -> [u32; NUM_HASHES] {
    let mut seeds = [0u32; NUM_HASHES];
    let mut rng = XorShift32::new(XORSHIFT32_SEED);
    for seed in seeds.iter_mut() {
        *seed = rng.next().expect("xorshift32 never terminates");
    }
    seeds
}

/// Word 3-grams (configurable). Text shorter than the shingle size degrades
/// to the whole text as a single shingle.
pub fn shingle(text: &str, shingle_size: usize) -> Vec<String> {
    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= shingle_size {
        return vec![words.join(" ").to_lowercase()];
    }

    words
        .windows(shingle_size)
        .map(|w| w.join(" ").to_lowercase())
        .collect()
}

/// A 512-byte little-endian MinHash signature (128 x uint32).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHash(pub [u32; NUM_HASHES]);

impl MinHash {
    /// Returns `None` for text that shingles to nothing (empty text).
    pub fn compute(text: &str) -> Option<Self> {
        Self::compute_with_shingle_size(text, DEFAULT_SHINGLE_SIZE)
    }

    pub fn compute_with_shingle_size(text: &str, shingle_size: usize) -> Option<Self> {
        let shingles = shingle(text, shingle_size);
        if shingles.is_empty() {
            return None;
        }

        let seeds = hash_seeds();
        let mut signature = [u32::MAX; NUM_HASHES];
        for sh in &shingles {
            let bytes = sh.as_bytes();
            for (i, seed) in seeds.iter().enumerate() {
                let h = fnv1a_32_seeded(bytes, *seed);
                if h < signature[i] {
                    signature[i] = h;
                }
            }
        }
        Some(MinHash(signature))
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SIGNATURE_BYTES);
        for word in self.0 {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != SIGNATURE_BYTES {
            return None;
        }
        let mut sig = [0u32; NUM_HASHES];
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            sig[i] = u32::from_le_bytes(chunk.try_into().ok()?);
        }
        Some(MinHash(sig))
    }

    /// Estimated Jaccard similarity: fraction of matching signature positions.
    pub fn jaccard(&self, other: &MinHash) -> f64 {
        let matches = self.0.iter().zip(other.0.iter()).filter(|(a, b)| a == b).count();
        matches as f64 / NUM_HASHES as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_none() {
        assert!(MinHash::compute("").is_none());
    }

    #[test]
    fn identical_text_yields_identical_signature() {
        let a = MinHash::compute("the city council met to discuss the new budget proposal").unwrap();
        let b = MinHash::compute("the city council met to discuss the new budget proposal").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.jaccard(&b), 1.0);
    }

    #[test]
    fn short_text_degrades_to_whole_text_shingle() {
        let shingles = shingle("one two", 3);
        assert_eq!(shingles, vec!["one two".to_string()]);
    }

    #[test]
    fn round_trip_le_bytes() {
        let mh = MinHash::compute("round trip signature serialization test content").unwrap();
        let bytes = mh.to_le_bytes();
        assert_eq!(bytes.len(), SIGNATURE_BYTES);
        assert_eq!(MinHash::from_le_bytes(&bytes).unwrap(), mh);
    }

    #[test]
    fn similar_texts_share_many_signature_positions() {
        let a = MinHash::compute(
            "officials announced a new budget proposal for the upcoming fiscal year today",
        )
        .unwrap();
        let b = MinHash::compute(
            "officials announced a new budget plan for the upcoming fiscal year today",
        )
        .unwrap();
        assert!(a.jaccard(&b) > 0.5);
    }
}
