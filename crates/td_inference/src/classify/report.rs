use serde::Serialize;
use std::collections::HashMap;
use td_core::{CategoryConfig, ClassifiedArticle};
use tracing::{info, warn};

const LOW_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateTitle {
    pub title: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowConfidence {
    pub title: String,
    pub category: String,
    pub confidence: f32,
}

/// Sanity summary of a classified batch, logged by the leader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub total: usize,
    /// Articles per category in configuration order; multi-category
    /// articles count once per category.
    pub categories: Vec<(String, usize)>,
    pub duplicate_titles: Vec<DuplicateTitle>,
    pub low_confidence: Vec<LowConfidence>,
}

impl ClassificationReport {
    pub fn from_articles(articles: &[ClassifiedArticle], config: &CategoryConfig) -> Self {
        let categories = config
            .categories
            .iter()
            .map(|category| {
                let count = articles.iter().filter(|a| a.has_category(&category.name)).count();
                (category.name.clone(), count)
            })
            .collect();

        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut duplicate_titles: Vec<DuplicateTitle> = Vec::new();
        for (i, article) in articles.iter().enumerate() {
            let title = article.article.title.as_str();
            match first_seen.get(title) {
                Some(&index) => {
                    let existing = duplicate_titles.iter_mut().find(|d| d.title == title);
                    match existing {
                        Some(duplicate) => duplicate.urls.push(article.article.url.clone()),
                        None => duplicate_titles.push(DuplicateTitle {
                            title: title.to_string(),
                            urls: vec![articles[index].article.url.clone(), article.article.url.clone()],
                        }),
                    }
                }
                None => {
                    first_seen.insert(title, i);
                }
            }
        }

        let low_confidence = articles
            .iter()
            .filter(|a| a.confidence < LOW_CONFIDENCE)
            .map(|a| LowConfidence {
                title: a.article.title.clone(),
                category: a.categories.first().map(|c| c.name.clone()).unwrap_or_default(),
                confidence: a.confidence,
            })
            .collect();

        Self {
            total: articles.len(),
            categories,
            duplicate_titles,
            low_confidence,
        }
    }

    pub fn log(&self) {
        info!(total = self.total, "📊 Classification report");
        for (category, count) in &self.categories {
            info!(category = %category, count, "  category");
        }
        for duplicate in &self.duplicate_titles {
            warn!(title = %duplicate.title, urls = ?duplicate.urls, "Possible duplicate article");
        }
        for low in &self.low_confidence {
            warn!(title = %low.title, category = %low.category, confidence = low.confidence, "Low classification confidence");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use td_core::{Article, CategoryScore, Language};

    fn classified(url: &str, title: &str, scores: &[(&str, f32)]) -> ClassifiedArticle {
        let article = Article {
            url: url.to_string(),
            title: title.to_string(),
            source: "feed".to_string(),
            published_at: None,
            content: String::new(),
            language: Language::Japanese,
            author: None,
            tags: vec![],
            trust_score: 6,
        };
        let categories = scores
            .iter()
            .map(|(name, score)| CategoryScore {
                name: name.to_string(),
                score: *score,
            })
            .collect();
        ClassifiedArticle::new(article, categories)
    }

    #[test]
    fn test_report() {
        let config = CategoryConfig::from_yaml(
            "categories:\n  - name: cloud\n    keywords: [AWS]\n  - name: ai\n    keywords: [AI]\n",
        )
        .unwrap();
        let articles = vec![
            classified("u1", "同じタイトル", &[("cloud", 0.75)]),
            classified("u2", "別の記事", &[("ai", 0.45), ("cloud", 0.42)]),
            classified("u3", "同じタイトル", &[("ai", 0.9)]),
            classified("u4", "同じタイトル", &[("ai", 0.9)]),
        ];

        let report = ClassificationReport::from_articles(&articles, &config);
        assert_eq!(report.total, 4);
        assert_eq!(
            report.categories,
            vec![("cloud".to_string(), 2), ("ai".to_string(), 3)]
        );
        assert_eq!(report.duplicate_titles.len(), 1);
        assert_eq!(report.duplicate_titles[0].urls, vec!["u1", "u3", "u4"]);
        assert_eq!(report.low_confidence.len(), 1);
        assert_eq!(report.low_confidence[0].category, "ai");
    }
}
