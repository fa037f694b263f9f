use scraper::{ElementRef, Html, Selector};
use crate::parse::collapse_whitespace;

/// Candidate containers for the article body, tried in order; the first
/// one with enough text wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".article-content",
    ".entry-content",
    ".post-content",
    ".content",
    "main",
    ".main-content",
];

/// Bodies at or under this many characters are treated as navigation noise.
const MIN_BODY_CHARS: usize = 200;
const MAX_BODY_CHARS: usize = 2000;

/// Pull the readable body out of an article page.
pub fn extract_body(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = visible_text(element);
            if text.chars().count() > MIN_BODY_CHARS {
                return Some(text.chars().take(MAX_BODY_CHARS).collect());
            }
        }
    }

    None
}

fn visible_text(element: ElementRef) -> String {
    let parts: Vec<&str> = element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
            });
            (!hidden).then(|| text.trim())
        })
        .filter(|t| !t.is_empty())
        .collect();
    collapse_whitespace(&parts.join(" "))
}
