use serde_json::Value;
use td_core::models::extract_json_object;
use td_core::{Error, Result, SharedModel};

const MAX_TAGS: usize = 5;

/// Best-effort technical tag extraction through an external model.
#[derive(Debug, Clone, Default)]
pub struct TagEnricher {
    model: Option<SharedModel>,
}

impl TagEnricher {
    pub fn new(model: Option<SharedModel>) -> Self {
        Self { model }
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    /// Never fails: any problem with the model yields no tags.
    pub async fn tags_for(&self, text: &str) -> Vec<String> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        if text.trim().is_empty() {
            return Vec::new();
        }

        let prompt = format!(
            "以下の日本語テキストから技術的なキーワードを最大{}つ抽出し、\
             JSON形式で{{\"tags\": [\"tag1\", \"tag2\"]}}のみを出力してください。\n\n{}",
            MAX_TAGS, text
        );

        match model.complete(&prompt).await.and_then(|answer| parse_tags(&answer)) {
            Ok(tags) => tags,
            Err(Error::QuotaExceeded { used, limit }) => {
                tracing::warn!(used, limit, "Model quota exhausted, skipping tag extraction");
                Vec::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Tag extraction failed");
                Vec::new()
            }
        }
    }
}

fn parse_tags(answer: &str) -> Result<Vec<String>> {
    let trimmed = answer.trim();
    let value: Value = match extract_json_object(trimmed) {
        Some(object) => serde_json::from_str(object)?,
        None => serde_json::from_str(trimmed)?,
    };

    let tags = match &value {
        Value::Object(map) => map.get("tags").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };

    let Value::Array(items) = tags else {
        return Err(Error::Inference(format!("unexpected tag payload: {}", value)));
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .take(MAX_TAGS)
        .collect())
}
