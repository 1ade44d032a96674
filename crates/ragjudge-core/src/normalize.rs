//! Text normalization for the statistical metrics.
//!
//! Normalization is a pure function of the text and the options. The steps
//! always run in the same order:
//! lowercase → strip non-alphanumerics → drop standalone numbers →
//! remove stopwords → lemmatize.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-zA-Z0-9\s]").unwrap();
    static ref STANDALONE_NUMBER: Regex = Regex::new(r"\b\d+\b").unwrap();

    static ref IRREGULAR_LEMMAS: HashMap<&'static str, &'static str> = [
        ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"),
        ("been", "be"), ("has", "have"), ("had", "have"), ("does", "do"),
        ("did", "do"), ("children", "child"), ("men", "man"), ("women", "woman"),
        ("mice", "mouse"), ("feet", "foot"), ("teeth", "tooth"), ("geese", "goose"),
        ("went", "go"), ("gone", "go"), ("better", "good"), ("best", "good"),
    ]
    .into_iter()
    .collect();
}

/// English stopwords, most common first. `stopwords_top_n` takes a prefix.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your",
    "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "her",
    "hers", "herself", "it", "its", "itself", "they", "them", "their", "theirs",
    "themselves", "what", "which", "who", "whom", "this", "that", "these", "those",
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if",
    "or", "because", "as", "until", "while", "of", "at", "by", "for", "with",
    "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where",
    "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
    "very", "s", "t", "can", "will", "just", "don", "should", "now",
];

/// Which normalization steps to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub lowercase: bool,
    pub strip_non_alnum: bool,
    pub strip_standalone_numbers: bool,
    pub remove_stopwords: bool,
    pub stopwords_top_n: usize,
    pub lemmatize: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_non_alnum: true,
            strip_standalone_numbers: true,
            remove_stopwords: true,
            stopwords_top_n: 5,
            lemmatize: true,
        }
    }
}

impl NormalizeOptions {
    /// Only split on whitespace.
    pub fn none() -> Self {
        Self {
            lowercase: false,
            strip_non_alnum: false,
            strip_standalone_numbers: false,
            remove_stopwords: false,
            stopwords_top_n: 0,
            lemmatize: false,
        }
    }
}

/// Normalizes text before tokenization.
pub trait TextNormalizer: Send + Sync {
    fn normalize(&self, text: &str, options: &NormalizeOptions) -> String;

    /// Normalize and split on whitespace.
    fn tokens(&self, text: &str, options: &NormalizeOptions) -> Vec<String> {
        self.normalize(text, options)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// Rule-based English normalizer.
///
/// Lemmatization covers regular plurals and a short table of irregular forms.
#[derive(Debug, Clone)]
pub struct BasicNormalizer {
    stopwords: Vec<String>,
}

impl BasicNormalizer {
    pub fn new() -> Self {
        Self::with_stopwords(ENGLISH_STOPWORDS.iter().map(|s| s.to_string()).collect())
    }

    /// Use a custom stopword list, most common first.
    pub fn with_stopwords(stopwords: Vec<String>) -> Self {
        Self { stopwords }
    }

    fn is_stopword(&self, word: &str, top_n: usize) -> bool {
        let lower = word.to_lowercase();
        self.stopwords.iter().take(top_n).any(|s| *s == lower)
    }
}

impl Default for BasicNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer for BasicNormalizer {
    fn normalize(&self, text: &str, options: &NormalizeOptions) -> String {
        let mut text = if options.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        if options.strip_non_alnum {
            text = NON_ALNUM.replace_all(&text, "").into_owned();
        }

        if options.strip_standalone_numbers {
            text = STANDALONE_NUMBER.replace_all(&text, "").into_owned();
        }

        text.split_whitespace()
            .filter(|w| !(options.remove_stopwords && self.is_stopword(w, options.stopwords_top_n)))
            .map(|w| {
                if options.lemmatize {
                    lemmatize(w)
                } else {
                    w.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Reduce a word to its dictionary form.
pub fn lemmatize(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some(lemma) = IRREGULAR_LEMMAS.get(lower.as_str()) {
        return (*lemma).to_string();
    }

    let len = word.len();
    if len <= 3 || !word.is_ascii() {
        return word.to_string();
    }

    if lower.ends_with("ies") && len > 4 {
        return format!("{}y", &word[..len - 3]);
    }
    if lower.ends_with("sses") {
        return word[..len - 2].to_string();
    }
    if lower.ends_with("xes") || lower.ends_with("ches") || lower.ends_with("shes") {
        return word[..len - 2].to_string();
    }
    if lower.ends_with('s')
        && !lower.ends_with("ss")
        && !lower.ends_with("us")
        && !lower.ends_with("is")
    {
        return word[..len - 1].to_string();
    }

    word.to_string()
}
