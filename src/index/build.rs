use crate::index::types::{CorpusMode, IndexConfig, VocabMeta};
use crate::index::vocab::VocabularyCollector;
use crate::utils::progress::{document_bar, spinner};
use crate::utils::{
    AppConfig, Tokenizer, document_text, extract_title, get_vocab_dir, remove_vocabulary,
};
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a vocabulary build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    /// Canonical corpus root
    pub root: PathBuf,
    pub vocab_dir: PathBuf,
    pub documents: usize,
    pub skipped: usize,
    pub words: usize,
}

/// Collect the corpus files for a mode, in a stable order
fn discover_documents(root: &Path, mode: CorpusMode, config: &IndexConfig) -> Vec<PathBuf> {
    let ignored = config.ignored_paths.clone();
    WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            let name = entry.file_name().to_string_lossy();
            !ignored.iter().any(|skip| skip.as_str() == name.as_ref())
        })
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .filter(|path| mode.accepts(path))
        .collect()
}

/// Page title for HTML documents that have one, otherwise the file name
fn document_label(path: &Path, mode: CorpusMode, content: &[u8]) -> String {
    let title = match mode {
        CorpusMode::Html => std::str::from_utf8(content).ok().and_then(extract_title),
        CorpusMode::Images => None,
    };
    match title {
        Some(title) => format!("{} ({})", title, path.display()),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

/// Feed one document into the collector. Failures only skip this document.
fn collect_document(
    collector: &mut VocabularyCollector,
    path: &Path,
    mode: CorpusMode,
    config: &IndexConfig,
) {
    // Image mode never looks inside the file
    let content = match mode {
        CorpusMode::Images => Vec::new(),
        CorpusMode::Html => {
            let size = path.metadata().map(|m| m.len()).unwrap_or(0);
            if size > config.max_file_size {
                debug!("skipping {} ({} bytes)", path.display(), size);
                collector.record_skipped();
                return;
            }
            match fs::read(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    collector.record_skipped();
                    return;
                }
            }
        }
    };

    match document_text(mode, path, &content) {
        Ok(text) => {
            let added = collector.add_text(&text);
            info!(
                "indexed {}: {} new words",
                document_label(path, mode, &content),
                added
            );
        }
        Err(e) => {
            warn!("skipping {}: {}", path.display(), e);
            collector.record_skipped();
        }
    }
}

/// Build a vocabulary for `root` and write it into `vocab_dir`.
///
/// Documents are processed one at a time into a single collector. A document
/// that cannot be read or decoded is logged and skipped.
pub fn build_vocabulary_into(
    root: &Path,
    vocab_dir: &Path,
    mode: CorpusMode,
    config: &IndexConfig,
    silent: bool,
) -> Result<BuildSummary> {
    let root = root.canonicalize().context("Invalid corpus path")?;

    let discovering = spinner("Discovering documents...", silent);
    let documents = discover_documents(&root, mode, config);
    discovering.finish_with_message(format!("Found {} {} documents", documents.len(), mode));

    let mut collector = VocabularyCollector::new(Tokenizer::new(config.min_word_len));
    let pb = document_bar(documents.len() as u64, silent);
    pb.set_message("Collecting words...");

    for path in &documents {
        collect_document(&mut collector, path, mode, config);
        pb.inc(1);
    }
    pb.finish_with_message(format!("{} distinct words", collector.len()));

    let meta = VocabMeta {
        root_path: root.clone(),
        mode,
        ..VocabMeta::default()
    };
    let meta = collector
        .persist(vocab_dir, meta)
        .with_context(|| format!("Failed to write vocabulary to {}", vocab_dir.display()))?;

    Ok(BuildSummary {
        root,
        vocab_dir: vocab_dir.to_path_buf(),
        documents: meta.document_count,
        skipped: meta.skipped_documents,
        words: meta.word_count,
    })
}

/// Build or rebuild the vocabulary of a corpus in the app data directory
pub fn build_vocabulary(root_path: &Path, mode: CorpusMode, force: bool) -> Result<BuildSummary> {
    let root = root_path.canonicalize().context("Invalid corpus path")?;
    let vocab_dir = get_vocab_dir(&root, mode)?;

    if force && vocab_dir.exists() {
        remove_vocabulary(&root, mode).context("Failed to remove existing vocabulary")?;
    }

    let config = IndexConfig::from(&AppConfig::load_or_default());

    println!("Indexing {} corpus: {}", mode, root.display());
    let summary = build_vocabulary_into(&root, &vocab_dir, mode, &config, false)?;

    println!(
        "Indexed {} documents, {} distinct words",
        summary.documents, summary.words
    );
    if summary.skipped > 0 {
        eprintln!("({} documents were skipped)", summary.skipped);
    }
    println!("Vocabulary stored at: {}", summary.vocab_dir.display());

    Ok(summary)
}
