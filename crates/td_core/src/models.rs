use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use crate::Result;

/// A text-in, text-out language model endpoint.
///
/// Classification, summarization, tag enrichment and editorial comments are
/// all prompts over this one call; callers own the prompt and the parsing.
#[async_trait]
pub trait InferenceModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Send a single prompt and return the model's text answer.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub type SharedModel = Arc<dyn InferenceModel>;

/// Extract the first JSON object from a model answer.
///
/// Models like to wrap JSON in markdown fences or prose; this keeps the
/// outermost `{ ... }` span.
pub fn extract_json_object(answer: &str) -> Option<&str> {
    let start = answer.find('{')?;
    let end = answer.rfind('}')?;
    (end > start).then(|| &answer[start..=end])
}
