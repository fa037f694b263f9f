use chrono::Local;
use serde_json::Value;
use std::time::Duration;
use td_core::{
    CategoryConfig, InferenceModel, QualityReport, Result, SharedModel, SummarizedArticle,
    TrustBand,
};
use tracing::{debug, error, info};

use crate::message::{
    render_digest, render_error, render_quality_report, render_test_message, NotificationBatch,
    MAX_ARTICLES_PER_GROUP,
};
use crate::webhook::WebhookClient;

const MAX_COMMENT_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub webhook_url: String,
    pub max_per_category: usize,
    /// Render and log payloads without posting them.
    pub dry_run: bool,
    pub timeout: Duration,
}

impl NotifierConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            max_per_category: MAX_ARTICLES_PER_GROUP,
            dry_run: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Turns summarized articles into one digest message on the webhook.
///
/// Every public send reports success as a bool and never returns an error;
/// failures are logged here.
#[derive(Debug)]
pub struct NotifierAgent {
    webhook: WebhookClient,
    categories: CategoryConfig,
    comment_model: Option<SharedModel>,
    max_per_category: usize,
    dry_run: bool,
    date: String,
}

impl NotifierAgent {
    pub fn new(config: NotifierConfig, categories: CategoryConfig, comment_model: Option<SharedModel>) -> Result<Self> {
        let webhook = WebhookClient::new(config.webhook_url, config.timeout)?;
        Ok(Self {
            webhook,
            categories,
            comment_model,
            max_per_category: config.max_per_category,
            dry_run: config.dry_run,
            date: Local::now().format("%Y-%m-%d").to_string(),
        })
    }

    /// Override the digest date.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn webhook(&self) -> &WebhookClient {
        &self.webhook
    }

    /// Render the digest without sending it.
    pub fn build_payload(&self, articles: &[SummarizedArticle], comment: Option<&str>) -> Value {
        let batch = NotificationBatch::build(articles, &self.categories, self.max_per_category);
        render_digest(&batch, &self.date, comment)
    }

    pub async fn send_notification(&self, articles: &[SummarizedArticle]) -> bool {
        if articles.is_empty() {
            info!("No articles to send");
            return true;
        }

        let batch = NotificationBatch::build(articles, &self.categories, self.max_per_category);
        if batch.is_empty() {
            info!("No article belongs to a configured category, nothing to send");
            return true;
        }

        let comment = self.editorial_comment(&batch).await;
        let payload = render_digest(&batch, &self.date, comment.as_deref());

        let sent = self.deliver(&payload).await;
        if sent {
            info!(count = batch.article_count(), groups = batch.groups.len(), "📨 Digest sent");
            log_trust_statistics(articles);
        } else {
            error!("Digest delivery failed");
        }
        sent
    }

    /// Last line of defense: failures are logged, never escalated.
    pub async fn send_error_notification(&self, message: &str) -> bool {
        let payload = render_error(message, &self.date);
        let sent = self.deliver(&payload).await;
        if !sent {
            error!("Error notification could not be delivered");
        }
        sent
    }

    pub async fn test_webhook(&self) -> bool {
        let sent = self.deliver(&render_test_message()).await;
        info!(success = sent, "Webhook test");
        sent
    }

    pub async fn send_quality_report(&self, report: &QualityReport) -> bool {
        self.deliver(&render_quality_report(report, &self.date)).await
    }

    async fn deliver(&self, payload: &Value) -> bool {
        debug!(payload = %payload, "Webhook payload");
        if self.dry_run {
            info!(payload = %payload, "Dry run, payload not posted");
            return true;
        }

        match self.webhook.post(payload).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Webhook delivery failed");
                false
            }
        }
    }

    /// One friendly line for the whole digest. Decorative: any failure
    /// just leaves it out.
    async fn editorial_comment(&self, batch: &NotificationBatch<'_>) -> Option<String> {
        let model = self.comment_model.as_ref()?;
        let prompt = format!(
            "以下の技術記事のタイトルを基に、Slack向けにフレンドリーな一文コメントを日本語で作成してください。\
             コメントのみを出力してください。\n\n{}",
            batch.titles().join("\n")
        );

        match model.complete(&prompt).await {
            Ok(answer) => {
                let line = answer.lines().map(str::trim).find(|l| !l.is_empty())?;
                Some(line.chars().take(MAX_COMMENT_CHARS).collect())
            }
            Err(e) => {
                debug!(model = model.name(), error = %e, "Comment generation failed");
                None
            }
        }
    }
}

fn log_trust_statistics(articles: &[SummarizedArticle]) {
    let scores: Vec<u8> = articles.iter().map(|a| a.article().trust_score).collect();
    if scores.is_empty() {
        return;
    }
    let average = scores.iter().map(|s| *s as f32).sum::<f32>() / scores.len() as f32;
    let count = |band: TrustBand| scores.iter().filter(|s| TrustBand::from_score(**s) == band).count();
    info!(
        average = %format!("{:.1}", average),
        high = count(TrustBand::High),
        medium = count(TrustBand::Medium),
        low = count(TrustBand::Low),
        unknown = count(TrustBand::Unknown),
        "Trust statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use td_core::{Article, CategoryScore, ClassifiedArticle, Error, Language, SummarySource};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct ScriptedModel(Option<&'static str>);

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| Error::Inference("offline".to_string()))
        }
    }

    fn categories() -> CategoryConfig {
        CategoryConfig::from_yaml(
            "categories:\n  - name: cloud\n    label: クラウド\n    keywords: [AWS]\n  - name: ai\n    label: AI\n    keywords: [LLM]\n",
        )
        .unwrap()
    }

    fn summarized(i: usize, category: &str) -> SummarizedArticle {
        SummarizedArticle {
            classified: ClassifiedArticle::new(
                Article {
                    url: format!("https://example.com/{}", i),
                    title: format!("記事 {}", i),
                    source: "feed".to_string(),
                    published_at: None,
                    content: "本文".to_string(),
                    language: Language::Japanese,
                    author: None,
                    tags: vec![],
                    trust_score: 8,
                },
                vec![CategoryScore {
                    name: category.to_string(),
                    score: 0.5,
                }],
            ),
            summary: format!("要約 {}", i),
            summary_source: SummarySource::Fallback,
        }
    }

    async fn webhook(status: u16, expected_posts: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected_posts)
            .mount(&server)
            .await;
        server
    }

    fn notifier(server: &MockServer, model: Option<SharedModel>) -> NotifierAgent {
        NotifierAgent::new(NotifierConfig::new(server.uri()), categories(), model)
            .unwrap()
            .with_date("2025-01-01")
    }

    #[tokio::test]
    async fn test_send_notification_posts_once() {
        let server = webhook(200, 1).await;
        let agent = notifier(&server, None);
        assert!(agent.send_notification(&[summarized(1, "cloud"), summarized(2, "ai")]).await);
    }

    #[tokio::test]
    async fn test_send_notification_http_500_returns_false() {
        let server = webhook(500, 1).await;
        let agent = notifier(&server, None);
        assert!(!agent.send_notification(&[summarized(1, "cloud")]).await);
    }

    #[tokio::test]
    async fn test_empty_list_sends_nothing() {
        let server = webhook(200, 0).await;
        let agent = notifier(&server, None);
        assert!(agent.send_notification(&[]).await);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_returns_false() {
        let config = NotifierConfig {
            timeout: Duration::from_secs(2),
            ..NotifierConfig::new("http://127.0.0.1:9/hook")
        };
        let agent = NotifierAgent::new(config, categories(), None).unwrap();
        assert!(!agent.send_notification(&[summarized(1, "cloud")]).await);
        assert!(!agent.send_error_notification("boom").await);
    }

    #[tokio::test]
    async fn test_dry_run_never_posts() {
        let server = webhook(200, 0).await;
        let config = NotifierConfig {
            dry_run: true,
            ..NotifierConfig::new(server.uri())
        };
        let agent = NotifierAgent::new(config, categories(), None).unwrap();
        assert!(agent.send_notification(&[summarized(1, "cloud")]).await);
        assert!(agent.test_webhook().await);
    }

    #[tokio::test]
    async fn test_comment_failure_does_not_block() {
        let server = webhook(200, 1).await;
        let model: SharedModel = Arc::new(ScriptedModel(None));
        let agent = notifier(&server, Some(model));
        assert!(agent.send_notification(&[summarized(1, "cloud")]).await);
    }

    #[tokio::test]
    async fn test_comment_is_first_line() {
        let server = MockServer::start().await;
        let model: SharedModel = Arc::new(ScriptedModel(Some("\n今日も良い記事がそろいました！\n二行目")));
        let agent = notifier(&server, Some(model));
        let articles = [summarized(1, "cloud")];
        let batch = NotificationBatch::build(&articles, &agent.categories, agent.max_per_category);
        assert_eq!(
            agent.editorial_comment(&batch).await.as_deref(),
            Some("今日も良い記事がそろいました！")
        );
    }

    #[tokio::test]
    async fn test_payload_is_stable() {
        let server = MockServer::start().await;
        let agent = notifier(&server, None);
        let articles = [summarized(1, "cloud"), summarized(2, "cloud"), summarized(3, "ai")];
        let first = serde_json::to_string(&agent.build_payload(&articles, None)).unwrap();
        let second = serde_json::to_string(&agent.build_payload(&articles, None)).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("2025-01-01"));
    }

    #[tokio::test]
    async fn test_error_notification_and_webhook_test() {
        let server = webhook(200, 2).await;
        let agent = notifier(&server, None);
        assert!(agent.send_error_notification("fetch stage failed").await);
        assert!(agent.test_webhook().await);
    }
}
