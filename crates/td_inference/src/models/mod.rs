use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use td_core::{Error, InferenceModel, Result, SharedModel};
use url::Url;

pub mod deepseek;
pub mod dummy;
pub mod gemini;
pub mod quota;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;
pub use gemini::GeminiModel;
pub use quota::QuotaLimitedModel;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_REQUESTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    Gemini,
    DeepSeek,
    Dummy,
    None,
}

impl FromStr for ModelProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ModelProvider::Gemini),
            "deepseek" => Ok(ModelProvider::DeepSeek),
            "dummy" => Ok(ModelProvider::Dummy),
            "none" | "" => Ok(ModelProvider::None),
            other => Err(Error::Config(format!("unknown inference model: {}", other))),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelProvider::Gemini => write!(f, "gemini"),
            ModelProvider::DeepSeek => write!(f, "deepseek"),
            ModelProvider::Dummy => write!(f, "dummy"),
            ModelProvider::None => write!(f, "none"),
        }
    }
}

#[derive(Clone)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_name: Option<String>,
    pub max_requests: usize,
    pub timeout: Duration,
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("max_requests", &self.max_requests)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::None,
            api_key: None,
            base_url: None,
            model_name: None,
            max_requests: DEFAULT_MAX_REQUESTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Build the configured model behind the request quota.
///
/// Returns `Ok(None)` when no external capability is available: either the
/// provider is `none` or its credentials are missing. Only malformed
/// settings are errors.
pub fn create_model(settings: &ModelSettings) -> Result<Option<SharedModel>> {
    let base_url = settings.base_url.as_deref().map(parse_base_url).transpose()?;
    let api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty());

    let model: SharedModel = match settings.provider {
        ModelProvider::None => return Ok(None),
        ModelProvider::Dummy => Arc::new(DummyModel::new()),
        ModelProvider::Gemini | ModelProvider::DeepSeek if api_key.is_none() => {
            tracing::warn!(
                provider = %settings.provider,
                "API key is not set, external model features are disabled"
            );
            return Ok(None);
        }
        ModelProvider::Gemini => Arc::new(GeminiModel::new(
            api_key,
            base_url,
            settings.model_name.clone(),
            settings.timeout,
        )?),
        ModelProvider::DeepSeek => Arc::new(DeepSeekModel::new(
            api_key,
            base_url,
            settings.model_name.clone(),
            settings.timeout,
        )?),
    };

    tracing::info!(model = model.name(), limit = settings.max_requests, "🧠 Inference model ready");
    Ok(Some(Arc::new(QuotaLimitedModel::new(model, settings.max_requests))))
}

fn parse_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| Error::Config(format!("invalid MODEL_URL {}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Config(format!("MODEL_URL must be http(s): {}", raw)));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
