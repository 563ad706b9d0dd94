pub mod context;
pub mod error;
pub mod gazetteer;
pub mod hierarchy;
pub mod hub;
pub mod ndjson;
pub mod normalize;
pub mod text_extract;
pub mod types;
pub mod url_extract;

pub use context::{infer_context, DomainLocales};
pub use error::{GazetteerError, Result};
pub use gazetteer::{Gazetteer, GazetteerBuilder};
pub use hub::{detect_hub, HubCandidate};
pub use ndjson::{import, GazetteerImport};
pub use normalize::normalize;
pub use text_extract::extract_places_from_text;
pub use types::{
    Chain, Context, MatchSource, PlaceDetection, PlaceKind, PlaceMatch, PlaceRecord, SharedPlace, Topics, TopicHint,
    UrlPlaceResult,
};
pub use url_extract::resolve_url_places;
