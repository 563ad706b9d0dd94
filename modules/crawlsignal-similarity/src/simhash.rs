//! 64-bit SimHash fingerprints.
//!
//! Tokenize -> FNV-1a 64-bit hash per token -> bit-vote -> fixed 8-byte
//! little-endian fingerprint. Two documents differing by a single word
//! substitution land within a Hamming distance of a few bits.

use crawlsignal_common::fnv1a_64;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "were", "will", "with",
];

/// Lowercase, strip non-word characters, drop stopwords and tokens shorter
/// than two characters.
pub fn tokenize(text: &str, drop_stopwords: bool) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|tok| tok.len() >= 2)
        .filter(|tok| !drop_stopwords || !STOPWORDS.contains(tok))
        .map(str::to_string)
        .collect()
}

/// A 64-bit SimHash fingerprint, little-endian on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimHash(pub u64);

impl SimHash {
    /// Compute the fingerprint for `text`. Empty text (or text that tokenizes
    /// to nothing) yields the all-zero fingerprint.
    pub fn compute(text: &str) -> Self {
        let tokens = tokenize(text, true);
        if tokens.is_empty() {
            return SimHash(0);
        }

        let mut votes = [0i32; 64];
        for token in &tokens {
            let hash = fnv1a_64(token.as_bytes());
            for (bit, vote) in votes.iter_mut().enumerate() {
                if (hash >> bit) & 1 == 1 {
                    *vote += 1;
                } else {
                    *vote -= 1;
                }
            }
        }

        let mut value = 0u64;
        for (bit, vote) in votes.iter().enumerate() {
            if *vote > 0 {
                value |= 1 << bit;
            }
        }
        SimHash(value)
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        SimHash(u64::from_le_bytes(bytes))
    }

    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }

    pub fn hamming_distance(self, other: SimHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// `1 - distance/64`, so distance + similarity*64 always reconstructs.
    pub fn similarity(self, other: SimHash) -> f64 {
        1.0 - (self.hamming_distance(other) as f64 / 64.0)
    }
}

/// Classification bucket for a Hamming distance between two fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Near,
    Similar,
    Different,
}

pub fn classify_distance(distance: u32) -> MatchType {
    match distance {
        0 => MatchType::Exact,
        1..=3 => MatchType::Near,
        4..=10 => MatchType::Similar,
        _ => MatchType::Different,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_zero_fingerprint() {
        assert_eq!(SimHash::compute("").0, 0);
    }

    #[test]
    fn identical_input_yields_identical_fingerprint() {
        let a = SimHash::compute("the quick brown fox jumps over the lazy dog");
        let b = SimHash::compute("the quick brown fox jumps over the lazy dog");
        assert_eq!(a, b);
        assert_eq!(a.hamming_distance(b), 0);
    }

    #[test]
    fn round_trip_le_bytes() {
        let a = SimHash::compute("round trip test content here");
        let bytes = a.to_le_bytes();
        assert_eq!(SimHash::from_le_bytes(bytes), a);
    }

    #[test]
    fn distance_and_similarity_reconstruct() {
        let a = SimHash::compute("breaking news about the city council meeting today");
        let b = SimHash::compute("breaking news about the town council meeting today");
        let d = a.hamming_distance(b);
        let s = a.similarity(b);
        assert!((s + d as f64 / 64.0 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn one_word_substitution_is_near_duplicate() {
        let a = SimHash::compute(
            "city officials announced a new budget proposal for the upcoming fiscal year",
        );
        let b = SimHash::compute(
            "city officials announced a new budget plan for the upcoming fiscal year",
        );
        let d = a.hamming_distance(b);
        assert!(d <= 3, "expected near-duplicate distance, got {d}");
        assert_eq!(classify_distance(d), MatchType::Near);
    }

    #[test]
    fn hex_rendering_is_lowercase_16_chars() {
        let hex = SimHash(0xDEADBEEFCAFEBABE).to_hex();
        assert_eq!(hex.len(), 16);
        assert_eq!(hex, hex.to_lowercase());
    }
}
