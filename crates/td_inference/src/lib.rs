pub mod classify;
pub mod models;
pub mod summarize;

pub use classify::{ClassificationReport, ClassificationStrategy, ClassifierAgent};
pub use models::{create_model, ModelProvider, ModelSettings};
pub use summarize::SummarizerAgent;

pub mod prelude {
    pub use super::classify::{ClassificationStrategy, ClassifierAgent};
    pub use super::models::{create_model, ModelProvider, ModelSettings};
    pub use super::summarize::SummarizerAgent;
    pub use td_core::{ClassifiedArticle, Error, Result, SummarizedArticle};
}
