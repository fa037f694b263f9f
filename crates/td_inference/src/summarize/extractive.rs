//! Graph-based extractive summarization (LexRank over character bigrams).
//!
//! Japanese has no word separators, so sentences are compared as bags of
//! character bigrams instead of tokens.

use std::collections::HashMap;

const SIMILARITY_THRESHOLD: f64 = 0.1;
const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const EPSILON: f64 = 1e-6;

/// Split text into sentences, keeping the terminating punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            push_sentence(&mut sentences, &mut current);
            continue;
        }
        current.push(c);
        let ends = match c {
            '。' | '！' | '？' => true,
            '.' | '!' | '?' => chars.peek().map_or(true, |next| next.is_whitespace()),
            _ => false,
        };
        if ends {
            push_sentence(&mut sentences, &mut current);
        }
    }
    push_sentence(&mut sentences, &mut current);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, current: &mut String) {
    let sentence = current.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
    current.clear();
}

fn bigrams(sentence: &str) -> HashMap<(char, char), f64> {
    let chars: Vec<char> = sentence.chars().filter(|c| !c.is_whitespace()).collect();
    let mut counts = HashMap::new();
    if chars.len() == 1 {
        *counts.entry((chars[0], ' ')).or_insert(0.0) += 1.0;
    }
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0.0) += 1.0;
    }
    counts
}

fn cosine(a: &HashMap<(char, char), f64>, b: &HashMap<(char, char), f64>) -> f64 {
    let dot: f64 = a.iter().filter_map(|(k, v)| b.get(k).map(|w| v * w)).sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// LexRank centrality of each sentence.
pub fn rank(sentences: &[String]) -> Vec<f64> {
    let n = sentences.len();
    if n == 0 {
        return Vec::new();
    }

    let vectors: Vec<_> = sentences.iter().map(|s| bigrams(s)).collect();
    let mut matrix = vec![vec![0.0; n]; n];
    let mut dangling = vec![false; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && cosine(&vectors[i], &vectors[j]) > SIMILARITY_THRESHOLD {
                matrix[i][j] = 1.0;
            }
        }
        let degree: f64 = matrix[i].iter().sum();
        if degree == 0.0 {
            dangling[i] = true;
            continue;
        }
        for value in matrix[i].iter_mut() {
            *value /= degree;
        }
    }

    // Sentences similar to nothing spread their weight evenly.
    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..MAX_ITERATIONS {
        let spread: f64 = (0..n).filter(|&i| dangling[i]).map(|i| scores[i]).sum::<f64>() / n as f64;
        let next: Vec<f64> = (0..n)
            .map(|j| {
                let incoming: f64 = (0..n).map(|i| matrix[i][j] * scores[i]).sum();
                (1.0 - DAMPING) / n as f64 + DAMPING * (incoming + spread)
            })
            .collect();
        let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        scores = next;
        if delta < EPSILON {
            break;
        }
    }
    scores
}

/// The `count` most central sentences, joined in their original order.
/// `None` when the text has no sentences.
pub fn summarize(text: &str, count: usize) -> Option<String> {
    let sentences = split_sentences(text);
    if sentences.is_empty() || count == 0 {
        return None;
    }

    let scores = rank(&sentences);
    let mut order: Vec<usize> = (0..sentences.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    let mut chosen: Vec<usize> = order.into_iter().take(count).collect();
    chosen.sort_unstable();

    let mut summary = String::new();
    for index in chosen {
        let sentence = &sentences[index];
        if summary.chars().next_back().is_some_and(|c| c.is_ascii()) {
            summary.push(' ');
        }
        summary.push_str(sentence);
    }
    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("AWS を使う。Lambda も使う！\n最後の行 v1.2 is out. Done");
        assert_eq!(
            sentences,
            vec!["AWS を使う。", "Lambda も使う！", "最後の行 v1.2 is out.", "Done"]
        );
        assert!(split_sentences("   \n  ").is_empty());
    }

    #[test]
    fn test_rank_prefers_central_sentence() {
        let sentences: Vec<String> = vec![
            "クラウドのコスト最適化について説明します。".into(),
            "クラウドのコスト最適化にはリザーブドインスタンスが有効です。".into(),
            "昼ご飯はラーメンでした。".into(),
            "コスト最適化の効果はクラウドの利用量で変わります。".into(),
        ];
        let scores = rank(&sentences);
        assert_eq!(scores.len(), 4);
        let lowest = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(lowest, Some(2));
        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_summarize_keeps_original_order() {
        let text = "クラウドのコスト最適化について説明します。昼ご飯はラーメンでした。\
                    クラウドのコスト最適化にはリザーブドインスタンスが有効です。\
                    夕方に雨が降る。コスト最適化の効果はクラウドの利用量で変わります。";
        let summary = summarize(text, 3).unwrap();
        assert!(summary.starts_with("クラウドのコスト最適化について説明します。"));
        assert!(summary.ends_with("利用量で変わります。"));
        assert!(!summary.contains("ラーメン"));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize("", 3).is_none());
    }
}
