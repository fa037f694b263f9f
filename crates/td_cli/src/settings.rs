use clap::{ArgAction, Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use td_core::{CategoryConfig, Error, Result, SharedModel};
use td_fetchers::{FetcherAgent, FetcherConfig, TagEnricher};
use td_inference::models::DEFAULT_TIMEOUT;
use td_inference::{
    create_model, ClassificationStrategy, ClassifierAgent, ModelProvider, ModelSettings,
    SummarizerAgent,
};
use td_notify::{NotifierAgent, NotifierConfig};

use crate::leader::{LeaderAgent, LeaderConfig};

/// One year.
const MAX_HOURS_BACK: i64 = 24 * 366;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Keyword hits from the category file
    Keyword,
    /// One external model call per article
    Model,
}

/// Run configuration. Every flag can also come from the environment or a
/// `.env` file.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Incoming webhook receiving the digest
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,

    /// Category and keyword definitions (YAML)
    #[arg(long, env = "KEYWORDS_CONFIG", default_value = "config/keywords.yaml")]
    pub keywords_config: PathBuf,

    /// External model: gemini, deepseek, dummy or none
    #[arg(long, env = "INFERENCE_MODEL", default_value = "gemini")]
    pub model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,

    #[arg(long, env = "MODEL_URL")]
    pub model_url: Option<String>,

    #[arg(long, env = "MODEL_NAME")]
    pub model_name: Option<String>,

    /// External model calls allowed per run
    #[arg(long, env = "GEMINI_MAX_REQUESTS", default_value_t = 50)]
    pub max_model_requests: usize,

    #[arg(long, env = "CLASSIFIER", value_enum, default_value_t = ClassifierKind::Keyword)]
    pub classifier: ClassifierKind,

    /// Articles below this trust score (1-10) are dropped
    #[arg(long, env = "MIN_TRUST_SCORE", default_value_t = 5)]
    pub min_trust_score: u8,

    #[arg(long, env = "MAX_ARTICLES_PER_CATEGORY", default_value_t = 10)]
    pub max_articles_per_category: usize,

    /// Only entries published within this many hours are fetched
    #[arg(
        long,
        env = "HOURS_BACK",
        default_value_t = 24,
        value_parser = clap::value_parser!(i64).range(1..=MAX_HOURS_BACK)
    )]
    pub hours_back: i64,

    #[arg(long, env = "FETCH_FULL_CONTENT", default_value_t = true, action = ArgAction::Set)]
    pub fetch_full_content: bool,
}

impl Settings {
    pub fn webhook_url(&self) -> Result<&str> {
        self.webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Config("SLACK_WEBHOOK_URL is not set".to_string()))
    }

    pub fn load_categories(&self) -> Result<CategoryConfig> {
        CategoryConfig::load(&self.keywords_config)
    }

    pub fn model_settings(&self) -> Result<ModelSettings> {
        let provider: ModelProvider = self.model.parse()?;
        let api_key = match provider {
            ModelProvider::Gemini => self.gemini_api_key.clone(),
            ModelProvider::DeepSeek => self.deepseek_api_key.clone(),
            ModelProvider::Dummy | ModelProvider::None => None,
        };
        Ok(ModelSettings {
            provider,
            api_key,
            base_url: self.model_url.clone(),
            model_name: self.model_name.clone(),
            max_requests: self.max_model_requests,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn fetcher_config(&self, categories: &CategoryConfig) -> FetcherConfig {
        let feeds = if categories.feeds.is_empty() {
            td_fetchers::feeds::default_feeds()
        } else {
            categories.feeds.iter().map(|f| f.url.clone()).collect()
        };
        FetcherConfig {
            feeds,
            hours_back: self.hours_back,
            fetch_full_content: self.fetch_full_content,
            feed_delay: Duration::from_secs(1),
        }
    }

    pub fn leader_config(&self) -> LeaderConfig {
        LeaderConfig {
            min_trust_score: self.min_trust_score,
            max_articles_per_category: self.max_articles_per_category,
        }
    }

    /// Wire every stage. Any error here is a fatal startup failure.
    pub fn build_leader(&self, dry_run: bool) -> Result<LeaderAgent> {
        let webhook_url = self.webhook_url()?;
        let categories = self.load_categories()?;
        let model = create_model(&self.model_settings()?)?;

        let fetcher = FetcherAgent::new(
            self.fetcher_config(&categories),
            categories.clone(),
            TagEnricher::new(model.clone()),
        )?;
        let classifier = ClassifierAgent::new(categories.clone(), self.classification_strategy(model.clone()));
        let summarizer = SummarizerAgent::new(model.clone());
        let notifier = NotifierAgent::new(
            NotifierConfig {
                dry_run,
                ..NotifierConfig::new(webhook_url)
            },
            categories,
            model,
        )?;

        Ok(LeaderAgent::new(fetcher, classifier, summarizer, notifier, self.leader_config()))
    }

    /// The configured strategy; `model` without an available model falls
    /// back to keywords.
    pub fn classification_strategy(&self, model: Option<SharedModel>) -> ClassificationStrategy {
        match (self.classifier, model) {
            (ClassifierKind::Model, Some(model)) => ClassificationStrategy::ExternalModel(model),
            (ClassifierKind::Model, None) => {
                tracing::warn!("CLASSIFIER=model but no model is available, using keywords");
                ClassificationStrategy::RuleBased
            }
            (ClassifierKind::Keyword, _) => ClassificationStrategy::RuleBased,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["td"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).settings
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = parse(&[
            "--webhook-url",
            "https://hooks.example.com/x",
            "--model",
            "dummy",
            "--classifier",
            "model",
            "--min-trust-score",
            "7",
            "--fetch-full-content",
            "false",
        ]);
        assert_eq!(settings.webhook_url().unwrap(), "https://hooks.example.com/x");
        assert_eq!(settings.classifier, ClassifierKind::Model);
        assert_eq!(settings.min_trust_score, 7);
        assert!(!settings.fetch_full_content);
        assert_eq!(settings.model_settings().unwrap().provider, ModelProvider::Dummy);
    }

    #[test]
    fn test_hours_back_is_bounded() {
        assert_eq!(parse(&["--hours-back", "48"]).hours_back, 48);
        for bad in ["0", "-5", "9223372036854775807"] {
            assert!(TestCli::try_parse_from(["td", "--hours-back", bad]).is_err());
        }
    }

    #[test]
    fn test_classification_strategy_follows_setting() {
        let model: Option<SharedModel> = create_model(&ModelSettings {
            provider: ModelProvider::Dummy,
            ..Default::default()
        })
        .unwrap();
        let keyword = parse(&[]);
        assert!(matches!(
            Settings { classifier: ClassifierKind::Keyword, ..keyword }.classification_strategy(model.clone()),
            ClassificationStrategy::RuleBased
        ));
        let with_model = Settings {
            classifier: ClassifierKind::Model,
            ..parse(&[])
        };
        assert!(matches!(
            with_model.classification_strategy(model),
            ClassificationStrategy::ExternalModel(_)
        ));
        assert!(matches!(
            with_model.classification_strategy(None),
            ClassificationStrategy::RuleBased
        ));
    }

    #[test]
    fn test_missing_webhook_is_config_error() {
        let settings = Settings {
            webhook_url: Some("  ".to_string()),
            ..parse(&[])
        };
        assert!(matches!(settings.webhook_url(), Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        let settings = Settings {
            model: "gpt-9".to_string(),
            ..parse(&[])
        };
        assert!(settings.model_settings().is_err());
    }

    #[test]
    fn test_model_key_follows_provider() {
        let settings = Settings {
            model: "deepseek".to_string(),
            gemini_api_key: Some("g".to_string()),
            deepseek_api_key: Some("d".to_string()),
            ..parse(&[])
        };
        assert_eq!(settings.model_settings().unwrap().api_key.as_deref(), Some("d"));
    }

    #[test]
    fn test_build_leader() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "categories:\n  - name: cloud\n    keywords: [AWS]\nfeeds:\n  - url: https://example.com/feed.xml"
        )
        .unwrap();

        let settings = Settings {
            webhook_url: Some("https://hooks.example.com/x".to_string()),
            keywords_config: file.path().to_path_buf(),
            model: "none".to_string(),
            ..parse(&[])
        };
        let categories = settings.load_categories().unwrap();
        assert_eq!(settings.fetcher_config(&categories).feeds, vec!["https://example.com/feed.xml"]);
        assert!(settings.build_leader(true).is_ok());

        let missing = Settings {
            keywords_config: PathBuf::from("/nonexistent/keywords.yaml"),
            ..settings
        };
        assert!(matches!(missing.build_leader(true), Err(Error::Config(_))));
    }
}
