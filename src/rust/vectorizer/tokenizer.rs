use lazy_static::lazy_static;
use regex::Regex;

use super::stop_words::is_stop_word;

lazy_static! {
    // Two or more word characters between word boundaries.
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is valid");
}

/// Lower-cases `text` and splits it into candidate terms.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// [`tokenize`] with English stop words removed.
pub fn analyze(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|token| !is_stop_word(token))
        .collect()
}
