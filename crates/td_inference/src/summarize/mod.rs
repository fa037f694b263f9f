use td_core::{
    ClassifiedArticle, Error, InferenceModel, SharedModel, SummarizedArticle, SummarySource,
};
use tracing::{debug, info, warn};

pub mod extractive;

/// Upper bound for any summary.
pub const MAX_SUMMARY_CHARS: usize = 300;
/// Budget of the truncation fallback, before the ellipsis.
pub const TRUNCATE_CHARS: usize = 250;
/// Bodies shorter than this are used as their own summary.
pub const SHORT_BODY_CHARS: usize = 200;
const MIN_EXTRACT_CHARS: usize = 50;
const EXTRACT_SENTENCES: usize = 3;
const PROMPT_BODY_CHARS: usize = 3000;

pub const PLACEHOLDER_SUMMARY: &str = "本文を取得できなかったため、要約はありません。";

#[derive(Debug, Clone, Default)]
pub struct SummarizerAgent {
    model: Option<SharedModel>,
}

impl SummarizerAgent {
    pub fn new(model: Option<SharedModel>) -> Self {
        Self { model }
    }

    /// One summary per input article; never drops an article.
    pub async fn summarize_articles(&self, articles: Vec<ClassifiedArticle>) -> Vec<SummarizedArticle> {
        info!(count = articles.len(), primary = self.model.is_some(), "✍️ Summarizing articles");
        let mut summarized = Vec::with_capacity(articles.len());

        for classified in articles {
            let (summary, summary_source) = self.summarize(&classified).await;
            debug!(url = %classified.article.url, source = %summary_source, "Summary ready");
            summarized.push(SummarizedArticle {
                classified,
                summary,
                summary_source,
            });
        }

        let fallback = summarized
            .iter()
            .filter(|s| s.summary_source == SummarySource::Fallback)
            .count();
        info!(count = summarized.len(), fallback, "Summarization finished");
        summarized
    }

    async fn summarize(&self, classified: &ClassifiedArticle) -> (String, SummarySource) {
        let article = &classified.article;
        let body = article.content.trim();
        if body.is_empty() {
            return (PLACEHOLDER_SUMMARY.to_string(), SummarySource::Fallback);
        }

        if let Some(model) = &self.model {
            match self.primary(model, &article.title, body).await {
                Ok(summary) => return (summary, SummarySource::Primary),
                Err(Error::QuotaExceeded { used, limit }) => {
                    warn!(url = %article.url, used, limit, "Model quota exhausted, using fallback summary");
                }
                Err(e) => {
                    warn!(url = %article.url, error = %e, "Summarization failed, using fallback");
                }
            }
        }

        (fallback_summary(body), SummarySource::Fallback)
    }

    async fn primary(&self, model: &SharedModel, title: &str, body: &str) -> td_core::Result<String> {
        let excerpt: String = body.chars().take(PROMPT_BODY_CHARS).collect();
        let prompt = format!(
            "以下の技術記事を日本語で150〜300文字程度に要約してください。要約文のみを出力してください。\n\n\
             タイトル: {}\n\n{}",
            title, excerpt
        );
        let answer = model.complete(&prompt).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::Inference(format!("{} returned an empty summary", model.name())));
        }
        Ok(cap(answer, MAX_SUMMARY_CHARS))
    }
}

/// Extractive summary, or truncation when that yields nothing useful.
pub fn fallback_summary(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() < SHORT_BODY_CHARS {
        return cap(body, MAX_SUMMARY_CHARS);
    }

    match extractive::summarize(body, EXTRACT_SENTENCES) {
        Some(summary) if summary.chars().count() >= MIN_EXTRACT_CHARS => cap(&summary, MAX_SUMMARY_CHARS),
        _ => truncate_summary(body),
    }
}

/// Whole sentences up to the truncation budget, then an ellipsis.
pub fn truncate_summary(body: &str) -> String {
    if body.chars().count() <= MAX_SUMMARY_CHARS {
        return body.to_string();
    }

    let mut summary = String::new();
    let mut length = 0;
    for sentence in body.split_inclusive('。') {
        let sentence_length = sentence.chars().count();
        if length + sentence_length > TRUNCATE_CHARS {
            break;
        }
        summary.push_str(sentence);
        length += sentence_length;
    }
    if summary.is_empty() {
        summary = body.chars().take(TRUNCATE_CHARS).collect();
    }
    summary.push_str("...");
    summary
}

fn cap(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut capped: String = text.chars().take(max - 3).collect();
    capped.push_str("...");
    capped
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use td_core::{Article, CategoryScore, Language, Result};

    #[derive(Debug)]
    struct ScriptedModel(Option<String>);

    #[async_trait]
    impl InferenceModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.0
                .clone()
                .ok_or_else(|| Error::Inference("boom".to_string()))
        }
    }

    fn classified(content: &str) -> ClassifiedArticle {
        ClassifiedArticle::new(
            Article {
                url: "https://example.com/a".to_string(),
                title: "AWS の記事".to_string(),
                source: "feed".to_string(),
                published_at: None,
                content: content.to_string(),
                language: Language::Japanese,
                author: None,
                tags: vec![],
                trust_score: 7,
            },
            vec![CategoryScore {
                name: "cloud".to_string(),
                score: 0.75,
            }],
        )
    }

    fn long_body() -> String {
        "クラウドのコスト最適化について説明します。".repeat(4)
            + &"リザーブドインスタンスを使うとコストを大きく削減できます。".repeat(4)
            + &"昼ご飯はラーメンでした。".repeat(2)
    }

    #[tokio::test]
    async fn test_primary_summary() {
        let model: SharedModel = Arc::new(ScriptedModel(Some("要約".repeat(200))));
        let agent = SummarizerAgent::new(Some(model));
        let out = agent.summarize_articles(vec![classified(&long_body())]).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].summary_source, SummarySource::Primary);
        assert_eq!(out[0].summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(out[0].summary.ends_with("..."));
    }

    #[tokio::test]
    async fn test_failing_model_falls_back() {
        let model: SharedModel = Arc::new(ScriptedModel(None));
        let agent = SummarizerAgent::new(Some(model));
        let out = agent
            .summarize_articles(vec![classified(&long_body()), classified("短い本文です。")])
            .await;

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.summary_source == SummarySource::Fallback));
        assert!(!out[0].summary.is_empty());
        assert!(out[0].summary.chars().count() <= MAX_SUMMARY_CHARS);
        assert_eq!(out[1].summary, "短い本文です。");
    }

    #[tokio::test]
    async fn test_empty_body_gets_placeholder() {
        let agent = SummarizerAgent::new(None);
        let out = agent.summarize_articles(vec![classified("   ")]).await;
        assert_eq!(out[0].summary, PLACEHOLDER_SUMMARY);
        assert_eq!(out[0].summary_source, SummarySource::Fallback);
    }

    #[test]
    fn test_truncate_summary() {
        let body = "これは文です。".repeat(60);
        let summary = truncate_summary(&body);
        assert!(summary.ends_with("。..."));
        assert!(summary.chars().count() <= TRUNCATE_CHARS + 3);

        let unbroken = "あ".repeat(400);
        assert_eq!(truncate_summary(&unbroken).chars().count(), TRUNCATE_CHARS + 3);

        assert_eq!(truncate_summary("短い"), "短い");
    }

    #[test]
    fn test_fallback_summary_bounds() {
        let summary = fallback_summary(&"長い文章が続きます。".repeat(100));
        assert!(!summary.is_empty());
        assert!(summary.chars().count() <= MAX_SUMMARY_CHARS);
    }
}
