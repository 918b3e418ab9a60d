use crate::utils::{AppConfig, DEFAULT_MIN_WORD_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Current on-disk vocabulary format
pub const VOCAB_FORMAT_VERSION: u32 = 1;

/// File holding the space-joined word list
pub const VOCAB_FILE: &str = "vocabulary.txt";

/// File holding [`VocabMeta`]
pub const META_FILE: &str = "meta.json";

/// What kind of corpus a vocabulary was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorpusMode {
    /// HTML pages; words come from the title and the tag-stripped body
    #[default]
    Html,
    /// Image files; words come from the file name
    Images,
}

impl CorpusMode {
    pub fn from_flag(images: bool) -> Self {
        if images { CorpusMode::Images } else { CorpusMode::Html }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CorpusMode::Html => "html",
            CorpusMode::Images => "images",
        }
    }

    /// Does this file belong to the corpus?
    pub fn accepts(&self, path: &Path) -> bool {
        match self {
            CorpusMode::Html => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "html" | "htm"))
                .unwrap_or(false),
            CorpusMode::Images => crate::utils::is_image_file(path),
        }
    }
}

impl fmt::Display for CorpusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vocabulary metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabMeta {
    pub version: u32,
    pub root_path: PathBuf,
    pub mode: CorpusMode,
    /// Threshold the collector used; the loader must use the same one
    pub min_word_len: usize,
    pub word_count: usize,
    pub document_count: usize,
    pub skipped_documents: usize,
    pub created_at: u64,
}

impl Default for VocabMeta {
    fn default() -> Self {
        Self {
            version: VOCAB_FORMAT_VERSION,
            root_path: PathBuf::new(),
            mode: CorpusMode::default(),
            min_word_len: DEFAULT_MIN_WORD_LEN,
            word_count: 0,
            document_count: 0,
            skipped_documents: 0,
            created_at: 0,
        }
    }
}

/// Configuration for a vocabulary build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub min_word_len: usize,
    pub max_file_size: u64,
    pub ignored_paths: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for IndexConfig {
    fn from(app: &AppConfig) -> Self {
        Self {
            min_word_len: app.min_word_len,
            max_file_size: app.max_file_size,
            ignored_paths: vec![".git".to_string(), "node_modules".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_accepts() {
        assert!(CorpusMode::Html.accepts(Path::new("wiki/Rust.html")));
        assert!(CorpusMode::Html.accepts(Path::new("INDEX.HTM")));
        assert!(!CorpusMode::Html.accepts(Path::new("notes.txt")));
        assert!(!CorpusMode::Html.accepts(Path::new("html")));
        assert!(CorpusMode::Images.accepts(Path::new("special/Volcano.JPG")));
        assert!(!CorpusMode::Images.accepts(Path::new("special/Volcano.gif")));
    }

    #[test]
    fn test_meta_roundtrip() {
        let meta = VocabMeta {
            root_path: PathBuf::from("/srv/www"),
            mode: CorpusMode::Images,
            word_count: 12,
            ..VocabMeta::default()
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"mode\":\"images\""));
        let parsed: VocabMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.mode, CorpusMode::Images);
        assert_eq!(parsed.min_word_len, DEFAULT_MIN_WORD_LEN);
        assert_eq!(parsed.word_count, 12);
    }
}
