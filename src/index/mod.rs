pub mod build;
pub mod stats;
pub mod trie;
pub mod types;
pub mod vocab;

pub use trie::Trie;
pub use types::*;
pub use vocab::{VocabularyCollector, VocabularyLoader};
