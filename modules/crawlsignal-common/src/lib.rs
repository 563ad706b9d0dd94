pub mod config;
pub mod error;
pub mod fnv;
pub mod logging;
pub mod url;

pub use config::CrawlConfig;
pub use error::{CrawlError, Result};
pub use fnv::{content_hash, fnv1a_32_seeded, fnv1a_64};
pub use logging::init_tracing;
pub use url::{canonicalize_url, registrable_domain};
