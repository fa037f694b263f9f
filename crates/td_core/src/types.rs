use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "und")]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    /// Feed the article was discovered through.
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub content: String,
    pub language: Language,
    pub author: Option<String>,
    pub tags: Vec<String>,
    /// 1..=10, see `TrustBand`.
    pub trust_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedArticle {
    pub article: Article,
    /// Ordered by descending score.
    pub categories: Vec<CategoryScore>,
    pub confidence: f32,
}

impl ClassifiedArticle {
    pub fn new(article: Article, mut categories: Vec<CategoryScore>) -> Self {
        categories.sort_by(|a, b| b.score.total_cmp(&a.score));
        let confidence = categories
            .first()
            .map(|c| c.score.clamp(0.0, 1.0))
            .unwrap_or(0.0);
        Self {
            article,
            categories,
            confidence,
        }
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Primary,
    Fallback,
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarySource::Primary => write!(f, "primary"),
            SummarySource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizedArticle {
    pub classified: ClassifiedArticle,
    pub summary: String,
    pub summary_source: SummarySource,
}

impl SummarizedArticle {
    pub fn article(&self) -> &Article {
        &self.classified.article
    }
}

/// Coarse trust ranges shared by the logs, the digest and the quality report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrustBand {
    High,
    Medium,
    Low,
    Unknown,
}

impl TrustBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            9.. => TrustBand::High,
            7..=8 => TrustBand::Medium,
            5..=6 => TrustBand::Low,
            _ => TrustBand::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrustBand::High => "高 (9-10)",
            TrustBand::Medium => "中 (7-8)",
            TrustBand::Low => "低 (5-6)",
            TrustBand::Unknown => "不明 (<5)",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TrustBand::High => "⭐⭐⭐",
            TrustBand::Medium => "⭐⭐",
            TrustBand::Low => "⭐",
            TrustBand::Unknown => "❓",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceQuality {
    pub source: String,
    pub articles: usize,
    pub average_trust: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total: usize,
    pub distribution: BTreeMap<TrustBand, usize>,
    /// Sorted by source name.
    pub sources: Vec<SourceQuality>,
}

impl QualityReport {
    pub fn from_articles(articles: &[Article]) -> Self {
        let mut distribution = BTreeMap::new();
        let mut per_source: BTreeMap<&str, Vec<u8>> = BTreeMap::new();

        for article in articles {
            *distribution
                .entry(TrustBand::from_score(article.trust_score))
                .or_insert(0) += 1;
            per_source
                .entry(article.source.as_str())
                .or_default()
                .push(article.trust_score);
        }

        let sources = per_source
            .into_iter()
            .map(|(source, scores)| SourceQuality {
                source: source.to_string(),
                articles: scores.len(),
                average_trust: scores.iter().map(|s| *s as f32).sum::<f32>() / scores.len() as f32,
            })
            .collect();

        Self {
            total: articles.len(),
            distribution,
            sources,
        }
    }
}
