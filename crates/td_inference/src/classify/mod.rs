use serde_json::Value;
use std::fmt;
use td_core::models::extract_json_object;
use td_core::{
    Article, CategoryConfig, CategoryScore, ClassifiedArticle, Error, InferenceModel, Result,
    SharedModel,
};
use tracing::{debug, info, warn};

mod report;

pub use report::{ClassificationReport, DuplicateTitle, LowConfidence};

/// Categories scoring above this are attached to the article.
pub const INCLUSION_THRESHOLD: f32 = 0.4;

/// How category scores are obtained.
#[derive(Clone)]
pub enum ClassificationStrategy {
    /// Keyword hits against the category configuration.
    RuleBased,
    /// One external model call per article, keyword hits on failure.
    ExternalModel(SharedModel),
}

impl fmt::Debug for ClassificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationStrategy::RuleBased => write!(f, "RuleBased"),
            ClassificationStrategy::ExternalModel(model) => {
                write!(f, "ExternalModel({})", model.name())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierAgent {
    categories: CategoryConfig,
    strategy: ClassificationStrategy,
}

impl ClassifierAgent {
    pub fn new(categories: CategoryConfig, strategy: ClassificationStrategy) -> Self {
        Self { categories, strategy }
    }

    pub fn categories(&self) -> &CategoryConfig {
        &self.categories
    }

    /// Attach categories to every article, dropping those that match none.
    /// Input order is preserved.
    pub async fn classify_articles(&self, articles: Vec<Article>) -> Vec<ClassifiedArticle> {
        info!(count = articles.len(), strategy = ?self.strategy, "🏷️ Classifying articles");
        let total = articles.len();
        let mut classified = Vec::with_capacity(total);

        for article in articles {
            let scores = self.score(&article).await;
            let categories: Vec<CategoryScore> = scores
                .into_iter()
                .filter(|c| c.score > INCLUSION_THRESHOLD)
                .collect();

            if categories.is_empty() {
                debug!(url = %article.url, "No category matched, dropping");
                continue;
            }
            classified.push(ClassifiedArticle::new(article, categories));
        }

        info!(kept = classified.len(), dropped = total - classified.len(), "Classification finished");
        classified
    }

    async fn score(&self, article: &Article) -> Vec<CategoryScore> {
        match &self.strategy {
            ClassificationStrategy::RuleBased => self.keyword_scores(article),
            ClassificationStrategy::ExternalModel(model) => {
                match self.model_scores(model, article).await {
                    Ok(scores) => scores,
                    Err(e) => {
                        warn!(url = %article.url, error = %e, "Model classification failed, using keywords");
                        self.keyword_scores(article)
                    }
                }
            }
        }
    }

    /// 1 hit scores 0.5, 2 hits 0.75, 3 hits 0.875 and so on.
    fn keyword_scores(&self, article: &Article) -> Vec<CategoryScore> {
        let text = format!("{}\n{}", article.title, article.content);
        self.categories
            .categories
            .iter()
            .map(|category| {
                let hits = category.count_matches(&text);
                CategoryScore {
                    name: category.name.clone(),
                    score: 1.0 - 0.5f32.powi(hits as i32),
                }
            })
            .collect()
    }

    async fn model_scores(&self, model: &SharedModel, article: &Article) -> Result<Vec<CategoryScore>> {
        let answer = model.complete(&self.prompt(article)).await?;
        self.parse_scores(&answer)
    }

    fn prompt(&self, article: &Article) -> String {
        let categories: Vec<String> = self
            .categories
            .categories
            .iter()
            .map(|c| format!("- {} ({}): {}", c.name, c.label(), c.keywords.join(", ")))
            .collect();
        let body: String = article.content.chars().take(1500).collect();

        format!(
            "次の技術記事が以下の各カテゴリにどの程度当てはまるかを0から1の数値で評価し、\
             JSON形式で{{\"scores\": {{\"カテゴリ名\": 数値}}}}のみを出力してください。\n\
             カテゴリ:\n{}\n\nタイトル: {}\n本文: {}",
            categories.join("\n"),
            article.title,
            body
        )
    }

    /// Scores for configured categories only, clamped to [0, 1]. Categories
    /// missing from the answer score 0; an answer naming none is an error.
    fn parse_scores(&self, answer: &str) -> Result<Vec<CategoryScore>> {
        let object = extract_json_object(answer)
            .ok_or_else(|| Error::Inference(format!("no JSON object in answer: {}", answer)))?;
        let value: Value = serde_json::from_str(object)?;
        let scores = value.get("scores").unwrap_or(&value);

        let mut known = 0usize;
        let parsed = self
            .categories
            .categories
            .iter()
            .map(|category| {
                let score = scores
                    .get(&category.name)
                    .and_then(Value::as_f64)
                    .map(|s| {
                        known += 1;
                        (s as f32).clamp(0.0, 1.0)
                    })
                    .unwrap_or(0.0);
                CategoryScore {
                    name: category.name.clone(),
                    score: if score.is_nan() { 0.0 } else { score },
                }
            })
            .collect();

        if known == 0 {
            return Err(Error::Inference(format!("no known category in answer: {}", object)));
        }
        Ok(parsed)
    }
}
