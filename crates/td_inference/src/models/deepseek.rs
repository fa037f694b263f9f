use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use td_core::{Error, InferenceModel, Result};

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Any OpenAI-compatible `chat/completions` endpoint, DeepSeek by default.
pub struct DeepSeekModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    model: String,
}

impl DeepSeekModel {
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let Some(api_key) = api_key else {
            return Err(Error::Inference("DeepSeek API key is required".to_string()));
        };
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Inference(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl InferenceModel for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::Inference("DeepSeek returned no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_model_requires_api_key() {
        let result = DeepSeekModel::new(None, None, None, Duration::from_secs(5));
        assert!(result.is_err());

        let result = DeepSeekModel::new(Some("test-key".to_string()), None, None, Duration::from_secs(5));
        assert!(result.is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let model = DeepSeekModel::new(Some("sk-secret".to_string()), None, None, Duration::from_secs(5)).unwrap();
        assert!(!format!("{:?}", model).contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"tags\": [\"EKS\"]}"}}]
            })))
            .mount(&server)
            .await;

        let model = DeepSeekModel::new(
            Some("test-key".to_string()),
            Some(server.uri()),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(model.complete("tags?").await.unwrap(), "{\"tags\": [\"EKS\"]}");
    }

    #[tokio::test]
    async fn test_complete_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let model = DeepSeekModel::new(
            Some("test-key".to_string()),
            Some(server.uri()),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(matches!(model.complete("hi").await, Err(Error::Http(_))));
    }
}
