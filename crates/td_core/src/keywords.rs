use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Header text in the digest; the name is used when absent.
    #[serde(default)]
    pub label: Option<String>,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Number of distinct keywords of this category found in `text`.
    pub fn count_matches(&self, text: &str) -> usize {
        self.keywords
            .iter()
            .filter(|keyword| contains_keyword(text, keyword))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub categories: Vec<Category>,
    /// Overrides the built-in feed list when non-empty.
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

impl CategoryConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: CategoryConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config("no categories configured".to_string()));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(Error::Config("category with empty name".to_string()));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(Error::Config(format!("duplicate category: {}", category.name)));
            }
            if category.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "category {} has no keywords",
                    category.name
                )));
            }
        }
        Ok(())
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Union of all category keyword lists, first occurrence wins.
    pub fn all_keywords(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.categories
            .iter()
            .flat_map(|c| c.keywords.iter())
            .map(|k| k.trim())
            .filter(|k| !k.is_empty() && seen.insert(k.to_lowercase()))
            .collect()
    }

    pub fn matches_any(&self, text: &str) -> bool {
        self.all_keywords()
            .into_iter()
            .any(|keyword| contains_keyword(text, keyword))
    }
}

/// Case-insensitive keyword test against the original text.
///
/// Keywords with non-ASCII characters are plain substrings, since Japanese
/// has no word separators. ASCII keywords need a boundary on both sides so
/// that `ml` does not hit `html` and `ai` does not hit `email`:
///
/// - on the left, a non-alphanumeric character or a lowercase to uppercase
///   step (`ChatGPT`, `OpenAI`);
/// - on the right, anything but a letter (`GPT4`, `AI-powered`).
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return false;
    }
    if !keyword.is_ascii() {
        return text.to_lowercase().contains(&keyword.to_lowercase());
    }

    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let haystack = text.to_ascii_lowercase();
    let needle = keyword.to_ascii_lowercase();
    haystack.match_indices(&needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before = text[..start].chars().next_back();
        let first = text[start..].chars().next();
        let after = text[end..].chars().next();

        let left = match before {
            Some(c) if c.is_ascii_alphanumeric() => {
                c.is_ascii_lowercase() && first.is_some_and(|f| f.is_ascii_uppercase())
            }
            _ => true,
        };
        let right = !after.is_some_and(|c| c.is_ascii_alphabetic());
        left && right
    })
}
