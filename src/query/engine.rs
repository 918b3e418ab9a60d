//! Answers prefix queries against a loaded vocabulary.

use crate::index::trie::Trie;
use crate::index::types::CorpusMode;
use crate::index::vocab::VocabularyLoader;
use crate::utils::{AppConfig, get_vocab_dir, normalize_prefix};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Suggestions returned when the caller does not ask for a bound
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;

/// Read-only autocomplete engine.
///
/// Cloning is cheap and every clone shares the same trie, so one engine can
/// serve any number of threads.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    trie: Arc<Trie>,
    max_suggestions: usize,
}

impl SuggestionEngine {
    pub fn new(trie: Trie, max_suggestions: usize) -> Self {
        Self {
            trie: Arc::new(trie),
            max_suggestions,
        }
    }

    /// Engine over the persisted vocabulary of a corpus.
    ///
    /// A missing or unreadable vocabulary gives an engine with no words.
    pub fn open(root_path: &Path, mode: CorpusMode, config: &AppConfig) -> Result<Self> {
        let vocab_dir = get_vocab_dir(root_path, mode)?;
        Ok(Self::from_dir(&vocab_dir, config))
    }

    pub fn from_dir(vocab_dir: &Path, config: &AppConfig) -> Self {
        let trie = VocabularyLoader::for_dir(vocab_dir, config.min_word_len).load(vocab_dir);
        Self::new(trie, config.max_suggestions)
    }

    /// Up to `max_suggestions` completions of a raw user prefix
    pub fn suggest(&self, raw_prefix: &str) -> Vec<String> {
        self.suggest_n(raw_prefix, self.max_suggestions)
    }

    /// Up to `limit` completions, never more than `max_suggestions`.
    ///
    /// The prefix is case-folded the same way indexed words were. A prefix
    /// holding anything but letters cannot match and yields nothing.
    pub fn suggest_n(&self, raw_prefix: &str, limit: usize) -> Vec<String> {
        match normalize_prefix(raw_prefix) {
            Some(prefix) => self.trie.suggest(&prefix, limit.min(self.max_suggestions)),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        normalize_prefix(word)
            .map(|w| self.trie.contains(&w))
            .unwrap_or(false)
    }

    pub fn has_prefix(&self, raw_prefix: &str) -> bool {
        normalize_prefix(raw_prefix)
            .map(|p| self.trie.has_prefix(&p))
            .unwrap_or(false)
    }

    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    pub fn word_count(&self) -> usize {
        self.trie.len()
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(Trie::new(), DEFAULT_MAX_SUGGESTIONS)
    }
}

/// Suggestions as a JSON array of strings
pub fn suggestions_json(suggestions: &[String]) -> String {
    serde_json::to_string(suggestions).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::vocab::VocabularyCollector;
    use crate::utils::Tokenizer;

    fn engine(text: &str) -> SuggestionEngine {
        let mut collector = VocabularyCollector::new(Tokenizer::new(5));
        collector.add_text(text);
        let trie = VocabularyLoader::new(collector.tokenizer()).trie_from_blob(&collector.serialize());
        SuggestionEngine::new(trie, DEFAULT_MAX_SUGGESTIONS)
    }

    #[test]
    fn test_mixed_case_prefix() {
        let engine = engine("Search series setup");
        assert_eq!(engine.suggest("SE"), vec!["search", "series", "setup"]);
        assert_eq!(engine.suggest("Sea"), vec!["search"]);
    }

    #[test]
    fn test_accented_word() {
        let engine = engine("CAFÉ");
        assert_eq!(engine.suggest_n("café", 5), Vec::<String>::new());
        let engine = SuggestionEngine::new(
            VocabularyLoader::new(Tokenizer::new(4)).trie_from_blob("CAFÉ"),
            DEFAULT_MAX_SUGGESTIONS,
        );
        assert_eq!(engine.suggest_n("café", 5), vec!["café"]);
        assert_eq!(engine.suggest_n("CAFÉ", 5), vec!["café"]);
        assert!(engine.contains("Café"));
    }

    #[test]
    fn test_limit_is_capped() {
        let words: Vec<String> = ('a'..='z').map(|c| format!("prefix{c}")).collect();
        let engine = SuggestionEngine::new(words.iter().collect(), 10);
        assert_eq!(engine.suggest("prefix").len(), 10);
        assert_eq!(engine.suggest_n("prefix", 3).len(), 3);
        assert_eq!(engine.suggest_n("prefix", 500).len(), 10);
        assert!(engine.suggest_n("prefix", 0).is_empty());
    }

    #[test]
    fn test_non_alphabetic_prefix() {
        let engine = engine("search engines");
        assert!(engine.suggest("se arch").is_empty());
        assert!(engine.suggest("sea1").is_empty());
        assert!(!engine.has_prefix("s-"));
        assert!(engine.has_prefix("ENG"));
    }

    #[test]
    fn test_empty_engine() {
        let engine = SuggestionEngine::default();
        assert!(engine.suggest("anything").is_empty());
        assert_eq!(engine.word_count(), 0);
    }

    #[test]
    fn test_concurrent_queries() {
        let words: Vec<String> = ('a'..='z')
            .flat_map(|a| ('a'..='z').map(move |b| format!("word{a}{b}")))
            .collect();
        let engine = SuggestionEngine::new(words.iter().collect(), 10);
        let expected = engine.suggest("wordm");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    (0..200).map(|_| engine.suggest("wordm")).collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            for result in handle.join().unwrap() {
                assert_eq!(result, expected);
            }
        }
    }

    #[test]
    fn test_suggestions_json() {
        let json = suggestions_json(&["search".to_string(), "café".to_string()]);
        assert_eq!(json, r#"["search","café"]"#);
        assert_eq!(suggestions_json(&[]), "[]");
    }
}
