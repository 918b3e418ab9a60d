//! Error types for the prefix index.

use std::path::PathBuf;

/// Result type for tokenizer, trie and vocabulary operations
pub type VocabResult<T, E = VocabError> = std::result::Result<T, E>;

/// Errors raised while building or loading a vocabulary.
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    /// A document is not valid UTF-8. The document is skipped.
    #[error("invalid UTF-8 after byte {valid_up_to}")]
    Encoding { valid_up_to: usize },

    /// No persisted vocabulary exists at the expected location.
    #[error("vocabulary not found at {}", path.display())]
    MissingVocabulary { path: PathBuf },

    /// Text handed to the trie is not a folded, alphabetic-only word.
    #[error("not a normalized word: {text:?}")]
    PreconditionViolation { text: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
