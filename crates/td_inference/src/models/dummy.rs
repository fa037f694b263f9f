use std::fmt;
use td_core::{InferenceModel, Result};

const MAX_WORDS: usize = 20;
const MAX_CHARS: usize = 200;

/// Offline stand-in: answers with the head of the prompt's last paragraph.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let text = prompt.rsplit("\n\n").next().unwrap_or(prompt);
        let words: Vec<&str> = text.split_whitespace().take(MAX_WORDS).collect();
        Ok(words.join(" ").chars().take(MAX_CHARS).collect())
    }
}
