//! # Oggle - prefix autocomplete for a small search engine
//!
//! Oggle collects the distinct words of a document corpus (HTML pages or image
//! file names), stores them as a plain sorted word list, and loads that list
//! into a character trie that answers "which words start with this prefix?"
//! while the user types.
//!
//! ## Architecture
//!
//! - [`utils`] - Tokenizer, corpus text extraction, app data layout
//! - [`index`] - Vocabulary collection, persistence, loading, and the trie
//! - [`query`] - Suggestion engine over a shared, read-only trie
//! - [`server`] - Daemon that keeps vocabularies warm (Unix only)
//! - [`output`] - Terminal formatting of suggestions
//! - [`error`] - Typed errors for the vocabulary layer
//!
//! ## Quick Start
//!
//! ```
//! use oggle::index::{Trie, VocabularyCollector, VocabularyLoader};
//! use oggle::query::SuggestionEngine;
//! use oggle::utils::Tokenizer;
//!
//! let mut collector = VocabularyCollector::new(Tokenizer::new(5));
//! collector.add_text("Volcanoes erupt; volcanic ash travels far.");
//!
//! let blob = collector.serialize();
//! let trie: Trie = VocabularyLoader::new(Tokenizer::new(5)).trie_from_blob(&blob);
//! let engine = SuggestionEngine::new(trie, 10);
//!
//! assert_eq!(engine.suggest("VOLC"), vec!["volcanic", "volcanoes"]);
//! ```

pub mod error;
pub mod index;
pub mod output;
pub mod query;
#[cfg(all(unix, feature = "daemon"))]
pub mod server;
pub mod utils;
