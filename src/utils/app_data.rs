use crate::index::types::{CorpusMode, META_FILE, VocabMeta};
use crate::utils::DEFAULT_MIN_WORD_LEN;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "oggle";
const CONFIG_FILE: &str = "config.json";
const VOCABULARIES_DIR: &str = "vocabularies";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shortest word (in code points) that gets indexed
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,

    /// Upper bound on suggestions returned for one prefix
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Prefixes cached per loaded vocabulary in the daemon
    #[serde(default = "default_suggestion_cache_size")]
    pub suggestion_cache_size: usize,

    /// Corpus files larger than this are skipped
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_min_word_len() -> usize {
    DEFAULT_MIN_WORD_LEN
}

fn default_max_suggestions() -> usize {
    10
}

fn default_suggestion_cache_size() -> usize {
    128
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_word_len: default_min_word_len(),
            max_suggestions: default_max_suggestions(),
            suggestion_cache_size: default_suggestion_cache_size(),
            max_file_size: default_max_file_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: AppConfig = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Like [`AppConfig::load`], falling back to defaults on a broken file
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("using default configuration: {:#}", e);
            Self::default()
        })
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Get the vocabulary directory for a corpus root and mode
pub fn get_vocab_dir(root_path: &Path, mode: CorpusMode) -> Result<PathBuf> {
    let app_data = get_app_data_dir()?;
    let vocab_root = app_data.join(VOCABULARIES_DIR);
    fs::create_dir_all(&vocab_root)?;

    Ok(vocab_dir_in(&vocab_root, root_path, mode))
}

/// Vocabulary directory for a corpus under an explicit vocabularies root
pub fn vocab_dir_in(vocab_root: &Path, root_path: &Path, mode: CorpusMode) -> PathBuf {
    vocab_root.join(vocab_folder_name(root_path, mode))
}

/// Folder name: first 16 chars of dir name + path hash + mode
fn vocab_folder_name(path: &Path, mode: CorpusMode) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    let dir_name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let sanitized: String = dir_name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(16)
        .collect();

    let mut hasher = DefaultHasher::new();
    path_str.hash(&mut hasher);
    let hash = hasher.finish();

    format!("{}-{:016x}-{}", sanitized, hash, mode)
}

/// Read meta.json from a vocabulary directory, if present and parseable
pub fn read_vocab_meta(vocab_dir: &Path) -> Option<VocabMeta> {
    let file = fs::File::open(vocab_dir.join(META_FILE)).ok()?;
    match serde_json::from_reader(file) {
        Ok(meta) => Some(meta),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {}", vocab_dir.join(META_FILE).display(), e);
            None
        }
    }
}

/// List all built vocabularies
pub fn list_vocabularies() -> Result<Vec<VocabLocation>> {
    let app_data = get_app_data_dir()?;
    let vocab_root = app_data.join(VOCABULARIES_DIR);

    if !vocab_root.exists() {
        return Ok(Vec::new());
    }

    let mut vocabularies = Vec::new();

    for entry in fs::read_dir(&vocab_root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(meta) = read_vocab_meta(&path) {
            vocabularies.push(VocabLocation {
                root_path: meta.root_path.clone(),
                vocab_dir: path,
                meta,
            });
        }
    }

    vocabularies.sort_by(|a, b| a.root_path.cmp(&b.root_path));
    Ok(vocabularies)
}

/// Remove the vocabulary built for a corpus
pub fn remove_vocabulary(root_path: &Path, mode: CorpusMode) -> Result<bool> {
    let vocab_dir = get_vocab_dir(root_path, mode)?;
    if vocab_dir.exists() {
        fs::remove_dir_all(&vocab_dir)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// A vocabulary found in the app data directory
#[derive(Debug, Clone)]
pub struct VocabLocation {
    pub root_path: PathBuf,
    pub vocab_dir: PathBuf,
    pub meta: VocabMeta,
}
