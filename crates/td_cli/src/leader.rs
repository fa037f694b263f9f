use std::collections::HashSet;
use std::fmt;
use std::time::Instant;
use td_core::{
    Article, CategoryConfig, ClassifiedArticle, QualityReport, SummarizedArticle, SummarySource,
    TrustBand,
};
use td_fetchers::{FeedProbe, FetcherAgent};
use td_inference::{ClassificationReport, ClassifierAgent, SummarizerAgent};
use td_notify::NotifierAgent;
use tracing::{debug, error, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Classifying,
    Summarizing,
    Notifying,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Classifying => "classifying",
            RunState::Summarizing => "summarizing",
            RunState::Notifying => "notifying",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub success: bool,
    pub articles_processed: usize,
    pub fallback_summaries: usize,
    pub error: Option<String>,
    pub state: RunState,
}

#[derive(Debug, Clone)]
pub struct LeaderConfig {
    pub min_trust_score: u8,
    pub max_articles_per_category: usize,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            min_trust_score: 5,
            max_articles_per_category: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub config_issues: Vec<String>,
    pub feeds: Vec<FeedProbe>,
    pub webhook_reachable: bool,
}

impl HealthReport {
    pub fn reachable_feeds(&self) -> usize {
        self.feeds.iter().filter(|p| p.reachable).count()
    }

    pub fn is_healthy(&self) -> bool {
        self.config_issues.is_empty() && self.reachable_feeds() > 0 && self.webhook_reachable
    }
}

/// A stage failure the run cannot recover from.
#[derive(Debug)]
struct StageError {
    stage: RunState,
    message: String,
}

/// Drives one run: fetch, classify, summarize, notify.
///
/// Stages only see the collection handed to them; the leader owns the
/// state machine and the error path.
pub struct LeaderAgent {
    fetcher: FetcherAgent,
    classifier: ClassifierAgent,
    summarizer: SummarizerAgent,
    notifier: NotifierAgent,
    config: LeaderConfig,
    state: RunState,
}

impl LeaderAgent {
    pub fn new(
        fetcher: FetcherAgent,
        classifier: ClassifierAgent,
        summarizer: SummarizerAgent,
        notifier: NotifierAgent,
        config: LeaderConfig,
    ) -> Self {
        Self {
            fetcher,
            classifier,
            summarizer,
            notifier,
            config,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
    }

    pub async fn run(&mut self) -> RunResult {
        let started = Instant::now();
        info!("🚀 News digest run started");

        match self.pipeline().await {
            Ok((processed, fallback)) => {
                self.transition(RunState::Done);
                info!(
                    articles = processed,
                    elapsed = ?started.elapsed(),
                    "✅ Run finished"
                );
                RunResult {
                    success: true,
                    articles_processed: processed,
                    fallback_summaries: fallback,
                    error: None,
                    state: self.state,
                }
            }
            Err(e) => {
                self.transition(RunState::Failed);
                let message = format!("{} stage failed: {}", e.stage, e.message);
                error!(stage = %e.stage, error = %e.message, "Run failed");
                if !self.notifier.send_error_notification(&message).await {
                    warn!("Error notification was not delivered");
                }
                RunResult {
                    success: false,
                    articles_processed: 0,
                    fallback_summaries: 0,
                    error: Some(message),
                    state: self.state,
                }
            }
        }
    }

    async fn pipeline(&mut self) -> Result<(usize, usize), StageError> {
        self.transition(RunState::Fetching);
        let articles = self.fetcher.fetch_articles().await;
        if articles.is_empty() {
            warn!("No articles fetched");
        }
        let articles = filter_by_quality(articles, self.config.min_trust_score);

        self.transition(RunState::Classifying);
        let classified = self.classifier.classify_articles(articles).await;
        ClassificationReport::from_articles(&classified, self.classifier.categories()).log();
        let selected = select_best_articles(
            classified,
            self.classifier.categories(),
            self.config.max_articles_per_category,
        );

        self.transition(RunState::Summarizing);
        let summarized = self.summarizer.summarize_articles(selected).await;
        log_trust_analysis(&summarized, self.classifier.categories());
        let fallback = summarized
            .iter()
            .filter(|s| s.summary_source == SummarySource::Fallback)
            .count();

        self.transition(RunState::Notifying);
        if !self.notifier.send_notification(&summarized).await {
            return Err(StageError {
                stage: RunState::Notifying,
                message: "webhook did not accept the digest".to_string(),
            });
        }

        Ok((summarized.len(), fallback))
    }

    /// Configuration sanity, feed reachability and webhook reachability,
    /// without running the pipeline.
    pub async fn health_check(&self) -> HealthReport {
        let mut config_issues = Vec::new();
        if self.classifier.categories().categories.is_empty() {
            config_issues.push("no categories configured".to_string());
        }
        if !(1..=10).contains(&self.config.min_trust_score) {
            config_issues.push(format!("MIN_TRUST_SCORE out of range: {}", self.config.min_trust_score));
        }
        let webhook_url = self.notifier.webhook().url();
        match Url::parse(webhook_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => config_issues.push("webhook URL is not an http(s) URL".to_string()),
        }

        let feeds = self.fetcher.probe_feeds().await;
        let webhook_reachable = match self.notifier.webhook().probe().await {
            Ok(status) => {
                debug!(status = %status, "Webhook probe answered");
                true
            }
            Err(e) => {
                warn!(error = %e, "Webhook is unreachable");
                false
            }
        };

        let report = HealthReport {
            config_issues,
            feeds,
            webhook_reachable,
        };
        for issue in &report.config_issues {
            error!(issue = %issue, "Configuration problem");
        }
        for probe in report.feeds.iter().filter(|p| !p.reachable) {
            warn!(feed = %probe.url, detail = %probe.detail, "Feed unreachable");
        }
        info!(
            healthy = report.is_healthy(),
            feeds = report.feeds.len(),
            reachable = report.reachable_feeds(),
            webhook = report.webhook_reachable,
            min_trust_score = self.config.min_trust_score,
            max_per_category = self.config.max_articles_per_category,
            "🩺 Health check finished"
        );
        report
    }

    /// Fetch only, then log and post the trust distribution.
    pub async fn quality_report(&mut self) -> bool {
        self.transition(RunState::Fetching);
        let articles = self.fetcher.fetch_articles().await;
        if articles.is_empty() {
            warn!("No articles for the quality report");
            self.transition(RunState::Done);
            return true;
        }

        let report = QualityReport::from_articles(&articles);
        info!(total = report.total, "📈 Quality report");
        for (band, count) in &report.distribution {
            info!(band = band.label(), count, "  trust range");
        }
        for source in &report.sources {
            info!(source = %source.source, average = source.average_trust, articles = source.articles, "  source");
        }

        self.transition(RunState::Notifying);
        let sent = self.notifier.send_quality_report(&report).await;
        self.transition(if sent { RunState::Done } else { RunState::Failed });
        sent
    }
}

/// Drop articles below the minimum trust score.
pub fn filter_by_quality(articles: Vec<Article>, min_trust_score: u8) -> Vec<Article> {
    let total = articles.len();
    let kept: Vec<Article> = articles
        .into_iter()
        .filter(|article| {
            let keep = article.trust_score >= min_trust_score;
            if !keep {
                debug!(title = %article.title, trust = article.trust_score, "Low trust article dropped");
            }
            keep
        })
        .collect();
    info!(kept = kept.len(), total, "Quality filter applied");
    kept
}

/// Keep an article when it ranks among the `max_per_category` most trusted
/// of at least one of its categories. Output keeps input order.
pub fn select_best_articles(
    articles: Vec<ClassifiedArticle>,
    categories: &CategoryConfig,
    max_per_category: usize,
) -> Vec<ClassifiedArticle> {
    let mut keep = HashSet::new();
    for category in &categories.categories {
        let mut ranked: Vec<usize> = articles
            .iter()
            .enumerate()
            .filter(|(_, a)| a.has_category(&category.name))
            .map(|(i, _)| i)
            .collect();
        ranked.sort_by(|&a, &b| articles[b].article.trust_score.cmp(&articles[a].article.trust_score));
        let chosen = ranked.len().min(max_per_category);
        info!(category = %category.name, selected = chosen, candidates = ranked.len(), "Articles selected");
        keep.extend(ranked.into_iter().take(max_per_category));
    }

    articles
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, a)| a)
        .collect()
}

fn log_trust_analysis(articles: &[SummarizedArticle], categories: &CategoryConfig) {
    let scores: Vec<u8> = articles.iter().map(|a| a.article().trust_score).collect();
    let (Some(max), Some(min)) = (scores.iter().max(), scores.iter().min()) else {
        return;
    };
    let average = scores.iter().map(|s| *s as f32).sum::<f32>() / scores.len() as f32;
    let band = |b: TrustBand| scores.iter().filter(|s| TrustBand::from_score(**s) == b).count();

    info!(average = %format!("{:.1}", average), max, min, "🔎 Trust analysis");
    info!(
        high = band(TrustBand::High),
        medium = band(TrustBand::Medium),
        low = band(TrustBand::Low),
        unknown = band(TrustBand::Unknown),
        "Trust distribution"
    );
    for category in &categories.categories {
        let in_category: Vec<u8> = articles
            .iter()
            .filter(|a| a.classified.has_category(&category.name))
            .map(|a| a.article().trust_score)
            .collect();
        if in_category.is_empty() {
            continue;
        }
        let average = in_category.iter().map(|s| *s as f32).sum::<f32>() / in_category.len() as f32;
        info!(category = %category.name, average = %format!("{:.1}", average), "Category trust");
    }
    for article in articles.iter().filter(|a| a.article().trust_score >= 9) {
        info!(title = %article.article().title, trust = article.article().trust_score, "High trust article");
    }
}
