//! Locality-sensitive hashing over MinHash signatures.
//!
//! The 512-byte signature is split into 16 bands of 32 bytes (8 rows of
//! 4-byte hash words each). Two documents sharing a bucket id in any band are
//! candidates; final ranking is by SimHash Hamming distance, then MinHash
//! Jaccard.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::RwLock;

use crawlsignal_common::fnv1a_32_seeded;

use crate::minhash::MinHash;
use crate::simhash::{classify_distance, MatchType, SimHash};

pub const NUM_BANDS: usize = 16;
pub const ROWS_PER_BAND: usize = 8;

/// A stored fingerprint: SimHash is always present, MinHash only for text
/// long enough to shingle.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub simhash: SimHash,
    pub minhash: Option<MinHash>,
    pub word_count: usize,
}

/// Bucket id for one band: FNV-1a 32-bit over the band's raw bytes, rendered
/// as lowercase 8-hex.
fn band_bucket_id(band_bytes: &[u8]) -> String {
    format!("{:08x}", fnv1a_32_seeded(band_bytes, band_bytes.len() as u32))
}

fn bands_of(minhash: &MinHash) -> Vec<String> {
    let bytes = minhash.to_le_bytes();
    let band_size = bytes.len() / NUM_BANDS; // 512 / 16 = 32 bytes = 8 rows * 4 bytes
    (0..NUM_BANDS)
        .map(|b| band_bucket_id(&bytes[b * band_size..(b + 1) * band_size]))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch<Id> {
    pub content_id: Id,
    pub distance: u32,
    pub jaccard: f64,
    pub match_type: MatchType,
}

/// In-memory LSH index. Insertions are exclusive, queries are shared — backed
/// by a single `RwLock`, matching spec's read/write lock discipline for this
/// shared resource.
pub struct LshIndex<Id: Clone + Eq + Hash> {
    inner: RwLock<Inner<Id>>,
}

struct Inner<Id: Clone + Eq + Hash> {
    // One bucket map per band.
    buckets: Vec<HashMap<String, Vec<Id>>>,
    fingerprints: HashMap<Id, Fingerprint>,
}

impl<Id: Clone + Eq + Hash> Default for LshIndex<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Clone + Eq + Hash> LshIndex<Id> {
    pub fn new() -> Self {
        LshIndex {
            inner: RwLock::new(Inner {
                buckets: (0..NUM_BANDS).map(|_| HashMap::new()).collect(),
                fingerprints: HashMap::new(),
            }),
        }
    }

    /// Insert a fingerprint and return the near-duplicate set (Hamming
    /// distance <= 3) among the index's existing entries, computed before
    /// this insert takes effect.
    pub fn insert(&self, content_id: Id, fingerprint: Fingerprint) -> Vec<Id> {
        let near_dupes = self
            .query(&fingerprint)
            .into_iter()
            .filter(|m| m.distance <= 3)
            .map(|m| m.content_id)
            .collect();

        let mut inner = self.inner.write().expect("lsh index lock poisoned");
        if let Some(minhash) = &fingerprint.minhash {
            for (band_idx, bucket_id) in bands_of(minhash).into_iter().enumerate() {
                inner.buckets[band_idx]
                    .entry(bucket_id)
                    .or_default()
                    .push(content_id.clone());
            }
        }
        inner.fingerprints.insert(content_id, fingerprint);

        near_dupes
    }

    /// Find all candidates sharing at least one bucket with `fingerprint`,
    /// ranked by SimHash distance then MinHash Jaccard. Dropped matches
    /// (distance > 10) are excluded. When `fingerprint` has no MinHash (short
    /// text), falls back to a full scan ranked by SimHash alone.
    pub fn query(&self, fingerprint: &Fingerprint) -> Vec<RankedMatch<Id>> {
        let inner = self.inner.read().expect("lsh index lock poisoned");

        let candidate_ids: Vec<Id> = if let Some(minhash) = &fingerprint.minhash {
            let mut seen: HashSet<Id> = HashSet::new();
            for (band_idx, bucket_id) in bands_of(minhash).into_iter().enumerate() {
                if let Some(ids) = inner.buckets[band_idx].get(&bucket_id) {
                    seen.extend(ids.iter().cloned());
                }
            }
            seen.into_iter().collect()
        } else {
            inner.fingerprints.keys().cloned().collect()
        };

        let mut results: Vec<RankedMatch<Id>> = candidate_ids
            .into_iter()
            .filter_map(|id| {
                let existing = inner.fingerprints.get(&id)?;
                let distance = fingerprint.simhash.hamming_distance(existing.simhash);
                let match_type = classify_distance(distance);
                if matches!(match_type, MatchType::Different) {
                    return None;
                }
                let jaccard = match (&fingerprint.minhash, &existing.minhash) {
                    (Some(a), Some(b)) => a.jaccard(b),
                    _ => 0.0,
                };
                Some(RankedMatch {
                    content_id: id,
                    distance,
                    jaccard,
                    match_type,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .cmp(&b.distance)
                .then(b.jaccard.partial_cmp(&a.jaccard).unwrap_or(std::cmp::Ordering::Equal))
        });
        results
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("lsh index lock poisoned").fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, content_id: &Id) -> Option<Fingerprint> {
        self.inner
            .read()
            .expect("lsh index lock poisoned")
            .fingerprints
            .get(content_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(text: &str) -> Fingerprint {
        Fingerprint {
            simhash: SimHash::compute(text),
            minhash: MinHash::compute(text),
            word_count: text.split_whitespace().count(),
        }
    }

    #[test]
    fn insert_and_query_finds_near_duplicate() {
        let index: LshIndex<&'static str> = LshIndex::new();
        index.insert(
            "a",
            fp("city officials announced a new budget proposal for the upcoming fiscal year"),
        );
        let dupes = index.insert(
            "b",
            fp("city officials announced a new budget plan for the upcoming fiscal year"),
        );
        assert!(dupes.contains(&"a"), "expected near-duplicate match, got {dupes:?}");
    }

    #[test]
    fn unrelated_documents_do_not_match() {
        let index: LshIndex<&'static str> = LshIndex::new();
        index.insert("a", fp("the weather in paris was cold and rainy this week"));
        let dupes = index.insert(
            "b",
            fp("quarterly earnings exceeded analyst expectations across every division"),
        );
        assert!(dupes.is_empty());
    }

    #[test]
    fn empty_index_returns_no_matches() {
        let index: LshIndex<&'static str> = LshIndex::new();
        let results = index.query(&fp("anything at all"));
        assert!(results.is_empty());
    }
}
