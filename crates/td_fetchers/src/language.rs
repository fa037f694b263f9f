use td_core::Language;

fn is_japanese_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{30FF}'   // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}' // CJK extension A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
    )
}

/// Japanese when at least 10% of the characters (and at least one) are
/// kana or kanji.
pub fn detect_language(text: &str) -> Language {
    let total = text.chars().count();
    if total == 0 {
        return Language::Other;
    }
    let japanese = text.chars().filter(|c| is_japanese_char(*c)).count();
    let required = (total / 10).max(1);
    if japanese >= required {
        Language::Japanese
    } else {
        Language::Other
    }
}
