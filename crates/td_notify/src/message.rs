use serde_json::{json, Value};
use td_core::{CategoryConfig, QualityReport, SummarizedArticle, TrustBand};

pub const MAX_ARTICLES_PER_GROUP: usize = 5;
pub const MAX_SUMMARY_CHARS: usize = 600;

const USERNAME: &str = "NewsBot";
const ICON_EMOJI: &str = ":newspaper:";
const TRUST_LEGEND: &str = "*■信頼度スコア*\n⭐⭐⭐ 10-9: 公式・企業公式\n⭐⭐ 8-7: 信頼性の高い技術メディア\n⭐ 6-5: 一般的な技術ブログ";

/// Articles of one category, best first.
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    pub name: &'a str,
    pub label: &'a str,
    pub articles: Vec<&'a SummarizedArticle>,
}

/// Summarized articles grouped by category in configuration order.
///
/// A multi-category article appears in every one of its groups. Each group
/// is ordered by descending confidence (input order on ties) and capped.
#[derive(Debug, Clone)]
pub struct NotificationBatch<'a> {
    pub groups: Vec<CategoryGroup<'a>>,
}

impl<'a> NotificationBatch<'a> {
    pub fn build(articles: &'a [SummarizedArticle], categories: &'a CategoryConfig, max_per_group: usize) -> Self {
        let groups = categories
            .categories
            .iter()
            .filter_map(|category| {
                let mut selected: Vec<&SummarizedArticle> = articles
                    .iter()
                    .filter(|a| a.classified.has_category(&category.name))
                    .collect();
                if selected.is_empty() {
                    return None;
                }
                selected.sort_by(|a, b| b.classified.confidence.total_cmp(&a.classified.confidence));
                selected.truncate(max_per_group);
                Some(CategoryGroup {
                    name: &category.name,
                    label: category.label(),
                    articles: selected,
                })
            })
            .collect();

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn article_count(&self) -> usize {
        self.groups.iter().map(|g| g.articles.len()).sum()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.articles.iter().map(|a| a.article().title.as_str()))
            .collect()
    }
}

/// Escape Slack mrkdwn control characters and drop non-printing characters.
pub fn sanitize_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Make a URL safe inside a `<url|title>` link: mrkdwn control characters
/// are escaped and `|` is percent-encoded so it cannot end the URL early.
pub fn sanitize_link(url: &str) -> String {
    url.trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('|', "%7C")
}

fn cap(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut capped: String = text.chars().take(max - 3).collect();
    capped.push_str("...");
    capped
}

fn section(text: String) -> Value {
    json!({
        "type": "section",
        "text": {"type": "mrkdwn", "text": text}
    })
}

fn divider() -> Value {
    json!({"type": "divider"})
}

fn envelope(mut payload: Value) -> Value {
    payload["username"] = json!(USERNAME);
    payload["icon_emoji"] = json!(ICON_EMOJI);
    payload
}

fn entry_text(index: usize, article: &SummarizedArticle) -> String {
    let trust = article.article().trust_score;
    format!(
        "{}. {} *<{}|{}>* (信頼度: {})\n　・{}",
        index,
        TrustBand::from_score(trust).emoji(),
        sanitize_link(&article.article().url),
        sanitize_text(&article.article().title),
        trust,
        cap(&sanitize_text(&article.summary), MAX_SUMMARY_CHARS)
    )
}

/// The digest payload. Pure: the same batch, date and comment always
/// render to the same JSON.
pub fn render_digest(batch: &NotificationBatch<'_>, date: &str, comment: Option<&str>) -> Value {
    let labels: Vec<&str> = batch.groups.iter().map(|g| g.label).collect();
    let mut blocks = vec![section(format!(
        "*■今日の{}記事まとめ（{}）*",
        labels.join(" & "),
        date
    ))];

    if let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) {
        blocks.push(section(format!("💬 {}", sanitize_text(comment))));
    }

    for group in &batch.groups {
        blocks.push(divider());
        blocks.push(section(format!("*■{}関連記事*", sanitize_text(group.label))));
        for (i, article) in group.articles.iter().enumerate() {
            blocks.push(section(entry_text(i + 1, article)));
        }
    }

    blocks.push(divider());
    blocks.push(section(TRUST_LEGEND.to_string()));

    envelope(json!({ "blocks": blocks }))
}

pub fn render_error(message: &str, date: &str) -> Value {
    envelope(json!({
        "text": format!("⚠️ *ニュース配信エラー*（{}）\n```{}```", date, sanitize_text(message))
    }))
}

pub fn render_test_message() -> Value {
    json!({"text": "✅ Webhookテスト送信 - 通信成功"})
}

pub fn render_quality_report(report: &QualityReport, date: &str) -> Value {
    let mut lines = vec![
        format!("*■記事品質レポート（{}）*", date),
        format!("総記事数: {}", report.total),
    ];
    for (band, count) in &report.distribution {
        lines.push(format!("{} {}: {}件", band.emoji(), band.label(), count));
    }
    if !report.sources.is_empty() {
        lines.push("*■ソース別平均信頼度*".to_string());
        for source in &report.sources {
            lines.push(format!(
                "・{}: {:.1} ({}件)",
                sanitize_text(&source.source),
                source.average_trust,
                source.articles
            ));
        }
    }
    envelope(json!({ "blocks": [section(lines.join("\n"))] }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::{Article, CategoryScore, ClassifiedArticle, Language, SummarySource};

    fn categories() -> CategoryConfig {
        CategoryConfig::from_yaml(
            "categories:\n  - name: cloud\n    label: クラウド\n    keywords: [AWS]\n  - name: ai\n    label: AI\n    keywords: [LLM]\n",
        )
        .unwrap()
    }

    fn summarized(i: usize, scores: &[(&str, f32)], trust: u8) -> SummarizedArticle {
        let article = Article {
            url: format!("https://example.com/{}", i),
            title: format!("記事 {}", i),
            source: "feed".to_string(),
            published_at: None,
            content: String::new(),
            language: Language::Japanese,
            author: None,
            tags: vec![],
            trust_score: trust,
        };
        let categories = scores
            .iter()
            .map(|(name, score)| CategoryScore {
                name: name.to_string(),
                score: *score,
            })
            .collect();
        SummarizedArticle {
            classified: ClassifiedArticle::new(article, categories),
            summary: format!("要約 {}", i),
            summary_source: SummarySource::Fallback,
        }
    }

    #[test]
    fn test_batch_fans_out_and_caps() {
        let config = categories();
        let mut articles: Vec<_> = (0..7).map(|i| summarized(i, &[("cloud", 0.5)], 7)).collect();
        articles.push(summarized(7, &[("cloud", 0.9), ("ai", 0.75)], 9));

        let batch = NotificationBatch::build(&articles, &config, MAX_ARTICLES_PER_GROUP);
        assert_eq!(batch.groups.len(), 2);
        let cloud = &batch.groups[0];
        assert_eq!(cloud.name, "cloud");
        assert_eq!(cloud.articles.len(), MAX_ARTICLES_PER_GROUP);
        assert_eq!(cloud.articles[0].article().url, "https://example.com/7");
        assert_eq!(cloud.articles[1].article().url, "https://example.com/0");
        assert_eq!(cloud.articles[4].article().url, "https://example.com/3");
        assert_eq!(batch.groups[1].articles.len(), 1);
        assert_eq!(batch.article_count(), 6);
    }

    #[test]
    fn test_batch_skips_empty_groups() {
        let config = categories();
        let articles = vec![summarized(1, &[("ai", 0.5)], 5)];
        let batch = NotificationBatch::build(&articles, &config, MAX_ARTICLES_PER_GROUP);
        assert_eq!(batch.groups.len(), 1);
        assert_eq!(batch.groups[0].label, "AI");
    }

    #[test]
    fn test_render_digest() {
        let config = categories();
        let articles = vec![summarized(1, &[("cloud", 0.75)], 9)];
        let batch = NotificationBatch::build(&articles, &config, MAX_ARTICLES_PER_GROUP);
        let payload = render_digest(&batch, "2025-01-01", Some("良い一日を！"));

        assert_eq!(payload["username"], "NewsBot");
        assert_eq!(payload["icon_emoji"], ":newspaper:");
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks[0]["text"]["text"], "*■今日のクラウド記事まとめ（2025-01-01）*");
        assert_eq!(blocks[1]["text"]["text"], "💬 良い一日を！");
        assert_eq!(blocks[3]["text"]["text"], "*■クラウド関連記事*");
        assert_eq!(
            blocks[4]["text"]["text"],
            "1. ⭐⭐⭐ *<https://example.com/1|記事 1>* (信頼度: 9)\n　・要約 1"
        );
        assert!(blocks.last().unwrap()["text"]["text"].as_str().unwrap().contains("信頼度スコア"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = categories();
        let articles: Vec<_> = (0..4)
            .map(|i| summarized(i, &[("cloud", 0.5), ("ai", 0.5)], 6))
            .collect();
        let render = || {
            let batch = NotificationBatch::build(&articles, &config, MAX_ARTICLES_PER_GROUP);
            serde_json::to_string(&render_digest(&batch, "2025-01-01", None)).unwrap()
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(sanitize_text("line\nnext\ttab\u{0007}bell"), "line\nnext\ttabbell");
    }

    #[test]
    fn test_link_url_cannot_break_markup() {
        let mut article = summarized(1, &[("cloud", 0.5)], 7);
        article.classified.article.url = "https://example.com/a?x=1&y=a|b>c".to_string();
        let text = entry_text(1, &article);
        assert!(text.contains("*<https://example.com/a?x=1&amp;y=a%7Cb&gt;c|記事 1>*"));
        assert_eq!(text.matches('|').count(), 1);
    }

    #[test]
    fn test_long_summary_is_capped() {
        let mut article = summarized(1, &[("cloud", 0.5)], 5);
        article.summary = "あ".repeat(700);
        let text = entry_text(1, &article);
        let summary = text.split("　・").nth(1).unwrap();
        assert_eq!(summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_render_error_escapes() {
        let payload = render_error("fetch <failed>", "2025-01-01");
        let text = payload["text"].as_str().unwrap();
        assert!(text.contains("fetch &lt;failed&gt;"));
        assert!(text.contains("2025-01-01"));
    }
}
