//! Heuristic enrichment — summary, suggested tags, content kind.
//!
//! Purely advisory. The review surface asks for it after recognition;
//! nothing here can block or fail a save.

pub mod heuristics;

use crate::ports::Enricher;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

const SUMMARY_MAX_CHARS: usize = 200;
const MAX_TAGS: usize = 3;
const MIN_TAG_CHARS: usize = 5;

const CODE_TOKENS: [&str; 7] = ["{", "}", ";", "function", "def", "public", "#include"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Code,
    Table,
    Plain,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Code => "code",
            ContentKind::Table => "table",
            ContentKind::Plain => "plain",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    pub summary: String,
    pub tags: Vec<String>,
    pub language: ContentKind,
}

/// Default enricher backed by the functions in this module.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEnricher;

impl Enricher for HeuristicEnricher {
    fn enrich(&self, text: &str) -> Enrichment {
        Enrichment {
            summary: summarize(text),
            tags: suggest_tags(text),
            language: classify(text),
        }
    }
}

/// Trimmed text, cut to 200 chars with an ellipsis when longer.
pub fn summarize(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SUMMARY_MAX_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(SUMMARY_MAX_CHARS).collect();
    format!("{}…", head.trim_end())
}

/// First three distinct words longer than four characters.
pub fn suggest_tags(text: &str) -> Vec<String> {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^a-z0-9_\s]").expect("static regex"));

    let lowered = text.to_lowercase();
    let cleaned = non_word.replace_all(&lowered, " ");

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_TAG_CHARS)
        .filter(|w| seen.insert(w.to_string()))
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

pub fn classify(text: &str) -> ContentKind {
    if CODE_TOKENS.iter().any(|t| text.contains(t)) || heuristics::detect_code_structure(text) {
        ContentKind::Code
    } else if heuristics::detect_table_structure(text) {
        ContentKind::Table
    } else {
        ContentKind::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_summary_is_trimmed_text() {
        assert_eq!(summarize("  hello world \n"), "hello world");
    }

    #[test]
    fn long_text_summary_is_cut_with_ellipsis() {
        let text = format!("{} tail", "a".repeat(199));
        let summary = summarize(&text);
        // 199 a's + the space, trailing space trimmed.
        assert_eq!(summary, format!("{}…", "a".repeat(199)));
    }

    #[test]
    fn tags_are_unique_long_words_in_order() {
        let tags = suggest_tags("Async runtime: tokio spawns tasks; the RUNTIME drives futures.");
        assert_eq!(tags, vec!["async", "runtime", "tokio"]);
    }

    #[test]
    fn punctuation_splits_words() {
        let tags = suggest_tags("config.settings::loader");
        assert_eq!(tags, vec!["config", "settings", "loader"]);
    }

    #[test]
    fn classification() {
        assert_eq!(classify("int main() { return 0; }"), ContentKind::Code);
        assert_eq!(classify("a\tb\nc\td"), ContentKind::Table);
        assert_eq!(classify("Groceries: milk, eggs"), ContentKind::Plain);
    }

    #[test]
    fn enricher_combines_all_three() {
        let e = HeuristicEnricher.enrich("def handler(event): pass");
        assert_eq!(e.language, ContentKind::Code);
        assert_eq!(e.tags, vec!["handler", "event"]);
        assert_eq!(e.summary, "def handler(event): pass");
    }
}
