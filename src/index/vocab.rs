//! Vocabulary collection (build side) and loading (serve side).
//!
//! The collector gathers the distinct words of a corpus and persists them as a
//! single space-joined text file. The loader reads that file back, runs it
//! through the same tokenizer, and fills a fresh [`Trie`].

use crate::error::{VocabError, VocabResult};
use crate::index::trie::Trie;
use crate::index::types::{META_FILE, VOCAB_FILE, VOCAB_FORMAT_VERSION, VocabMeta};
use crate::utils::{Tokenizer, read_vocab_meta};
use rustc_hash::FxHashSet;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Deduplicating word collector used while indexing a corpus
#[derive(Debug, Clone, Default)]
pub struct VocabularyCollector {
    tokenizer: Tokenizer,
    words: FxHashSet<String>,
    documents: usize,
    skipped: usize,
}

impl VocabularyCollector {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            words: FxHashSet::default(),
            documents: 0,
            skipped: 0,
        }
    }

    /// Add the words of one document. Returns how many were new.
    pub fn add_text(&mut self, text: &str) -> usize {
        let before = self.words.len();
        self.words.extend(self.tokenizer.tokens(text));
        self.documents += 1;
        self.words.len() - before
    }

    /// Add a document given as raw bytes.
    ///
    /// Malformed UTF-8 skips the whole document; the collector is left
    /// untouched apart from its skip counter.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> VocabResult<usize> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(self.add_text(text)),
            Err(e) => {
                self.skipped += 1;
                Err(VocabError::Encoding {
                    valid_up_to: e.valid_up_to(),
                })
            }
        }
    }

    /// Count a document that was skipped before reaching the collector
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Sorted so that rebuilding an unchanged corpus gives an identical file
    fn sorted_words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        words.sort_unstable();
        words
    }

    /// All words joined by single spaces
    pub fn serialize(&self) -> String {
        self.sorted_words().join(" ")
    }

    /// Write vocabulary.txt and meta.json into `dir`.
    ///
    /// Word counts, threshold and timestamp in `meta` are filled in here.
    pub fn persist(&self, dir: &Path, mut meta: VocabMeta) -> VocabResult<VocabMeta> {
        fs::create_dir_all(dir)?;

        let mut writer = BufWriter::new(File::create(dir.join(VOCAB_FILE))?);
        for (i, word) in self.sorted_words().into_iter().enumerate() {
            if i > 0 {
                writer.write_all(b" ")?;
            }
            writer.write_all(word.as_bytes())?;
        }
        writer.flush()?;

        meta.version = VOCAB_FORMAT_VERSION;
        meta.min_word_len = self.tokenizer.min_len();
        meta.word_count = self.words.len();
        meta.document_count = self.documents;
        meta.skipped_documents = self.skipped;
        meta.created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let file = File::create(dir.join(META_FILE))?;
        serde_json::to_writer_pretty(file, &meta)?;

        Ok(meta)
    }
}

/// Builds a [`Trie`] from a persisted vocabulary
#[derive(Debug, Clone, Copy, Default)]
pub struct VocabularyLoader {
    tokenizer: Tokenizer,
}

impl VocabularyLoader {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Loader for a vocabulary directory, honouring the threshold recorded
    /// in its meta.json and falling back to `default_min_len`
    pub fn for_dir(dir: &Path, default_min_len: usize) -> Self {
        let min_len = read_vocab_meta(dir)
            .map(|meta| meta.min_word_len)
            .unwrap_or(default_min_len);
        Self::new(Tokenizer::new(min_len))
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Insert every word of a serialized vocabulary into a new trie
    pub fn trie_from_blob(&self, blob: &str) -> Trie {
        self.tokenizer.tokens(blob).collect()
    }

    /// Read vocabulary.txt from `dir` into a new trie
    pub fn try_load(&self, dir: &Path) -> VocabResult<Trie> {
        let path = dir.join(VOCAB_FILE);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VocabError::MissingVocabulary { path: path.clone() },
            _ => VocabError::Io(e),
        })?;

        let trie: Trie = self.tokenizer.tokenize_bytes(&bytes)?.collect();
        Ok(trie)
    }

    /// Like [`VocabularyLoader::try_load`], but never fails: any problem
    /// yields an empty trie so autocomplete degrades to no suggestions.
    pub fn load(&self, dir: &Path) -> Trie {
        match self.try_load(dir) {
            Ok(trie) => {
                log::info!("loaded {} words from {}", trie.len(), dir.display());
                trie
            }
            Err(e) => {
                log::warn!("autocomplete disabled for {}: {}", dir.display(), e);
                Trie::new()
            }
        }
    }
}
