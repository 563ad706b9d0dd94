pub mod lsh;
pub mod minhash;
pub mod recommend;
pub mod simhash;

pub use lsh::{Fingerprint, LshIndex, RankedMatch};
pub use minhash::MinHash;
pub use recommend::{recommend, Candidate, Recommendation, SimilarityInputs, Weights};
pub use simhash::{classify_distance, MatchType, SimHash};
