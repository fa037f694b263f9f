pub mod error;
pub mod keywords;
pub mod logging;
pub mod models;
pub mod types;

pub use error::{Error, Result};
pub use keywords::{Category, CategoryConfig, FeedEntry};
pub use models::{InferenceModel, SharedModel};
pub use types::{
    Article, CategoryScore, ClassifiedArticle, Language, QualityReport, SourceQuality,
    SummarizedArticle, SummarySource, TrustBand,
};

pub mod prelude {
    pub use super::{
        Article, ClassifiedArticle, Error, InferenceModel, Result, SummarizedArticle,
    };
}
