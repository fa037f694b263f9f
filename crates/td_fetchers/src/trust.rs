use url::Url;
use crate::feeds::{DOMAIN_TRUST, OFFICIAL_DOMAINS};

const AUTHOR_INDICATORS: &[&str] = &["author", "by", "著者", "執筆者", "written by", "posted by"];
const TECHNICAL_INDICATORS: &[&str] = &[
    "github", "api", "sdk", "terraform", "yaml", "json", "code",
    "implementation", "実装", "サンプル", "example", "tutorial",
];
const RELIABILITY_INDICATORS: &[&str] = &[
    "official", "documentation", "guide", "best practices",
    "公式", "ドキュメント", "ガイド", "ベストプラクティス",
];

/// Score an article from 1 (dubious) to 10 (vendor documentation).
pub fn trust_score(url: &str, title: &str, content: &str) -> u8 {
    let title = title.to_lowercase();
    let content = content.to_lowercase();
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default();

    let total = domain_score(&host) as f32 * 0.4
        + quality_score(&content) as f32 * 0.2
        + technical_depth_score(&content) as f32 * 0.2
        + official_score(&host, url, &title) as f32 * 0.1
        + length_score(&content) as f32 * 0.1;

    total.round().clamp(1.0, 10.0) as u8
}

fn domain_score(host: &str) -> u8 {
    if host.is_empty() {
        return 5;
    }
    if let Some((_, score)) = DOMAIN_TRUST.iter().find(|(domain, _)| host.contains(domain)) {
        return *score;
    }
    if ["github.io", "googleapis.com", "microsoft.com"]
        .iter()
        .any(|d| host.contains(d))
    {
        return 7;
    }
    5
}

fn count_present(content: &str, indicators: &[&str]) -> usize {
    indicators.iter().filter(|i| content.contains(*i)).count()
}

fn quality_score(content: &str) -> u8 {
    let mut score = 5;
    if count_present(content, AUTHOR_INDICATORS) > 0 {
        score += 1;
    }
    score += (count_present(content, TECHNICAL_INDICATORS) / 2).min(2);
    score += count_present(content, RELIABILITY_INDICATORS).min(2);
    score.min(10) as u8
}

fn technical_depth_score(content: &str) -> u8 {
    let mut score = 5;
    if ["```", "<code>", "github.com"].iter().any(|i| content.contains(i)) {
        score += 2;
    }
    if ["api", "sdk", "cli", "terraform"].iter().any(|i| content.contains(i)) {
        score += 1;
    }
    if ["implementation", "実装", "configure", "設定"].iter().any(|i| content.contains(i)) {
        score += 1;
    }
    if ["tutorial", "hands-on", "step-by-step", "ハンズオン"].iter().any(|i| content.contains(i)) {
        score += 1;
    }
    score.min(10)
}

fn official_score(host: &str, url: &str, title: &str) -> u8 {
    let mut score = 5;
    if OFFICIAL_DOMAINS.iter().any(|d| host.contains(d)) {
        score += 3;
    }
    let url = url.to_lowercase();
    if ["blog", "docs", "documentation"].iter().any(|k| url.contains(k)) {
        score += 1;
    }
    if ["announcing", "release", "リリース", "発表"].iter().any(|k| title.contains(k)) {
        score += 1;
    }
    score.min(10)
}

fn length_score(content: &str) -> u8 {
    match content.chars().count() {
        0..=199 => 3,
        200..=499 => 5,
        500..=1499 => 7,
        1500..=2999 => 9,
        _ => 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_score() {
        assert_eq!(domain_score("aws.amazon.com"), 10);
        assert_eq!(domain_score("qiita.com"), 6);
        assert_eq!(domain_score("someone.github.io"), 5);
        assert_eq!(domain_score("learn.microsoft.com"), 7);
        assert_eq!(domain_score("unknown.example"), 5);
        assert_eq!(domain_score(""), 5);
    }

    #[test]
    fn test_length_score() {
        assert_eq!(length_score("短い"), 3);
        assert_eq!(length_score(&"あ".repeat(200)), 5);
        assert_eq!(length_score(&"あ".repeat(1000)), 7);
        assert_eq!(length_score(&"あ".repeat(2000)), 9);
        assert_eq!(length_score(&"あ".repeat(5000)), 10);
    }

    #[test]
    fn test_official_vendor_article_scores_high() {
        let content = format!(
            "公式ドキュメントのガイドに従い、API と SDK を使った実装例を紹介します。```code``` {}",
            "詳細".repeat(800)
        );
        let score = trust_score(
            "https://aws.amazon.com/jp/blogs/news/new-feature/",
            "新機能のリリース",
            &content,
        );
        assert!(score >= 8, "score was {}", score);
    }

    #[test]
    fn test_unknown_short_article_scores_middle() {
        let score = trust_score("https://unknown.example/post", "雑記", "短い本文");
        assert!((1..=10).contains(&score));
        assert!(score <= 5, "score was {}", score);
    }

    #[test]
    fn test_invalid_url_does_not_panic() {
        let score = trust_score("not a url", "タイトル", "本文");
        assert!((1..=10).contains(&score));
    }
}
