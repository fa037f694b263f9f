pub mod content;
pub mod enrich;
pub mod feeds;
pub mod fetcher;
pub mod language;
pub mod parse;
pub mod trust;

pub use enrich::TagEnricher;
pub use fetcher::{FeedProbe, FetcherAgent, FetcherConfig};
pub use language::detect_language;
pub use trust::trust_score;

pub mod prelude {
    pub use super::fetcher::{FetcherAgent, FetcherConfig};
    pub use td_core::{Article, Error, Result};
}
