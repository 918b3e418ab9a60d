use crate::index::types::{CorpusMode, VOCAB_FILE};
use crate::index::vocab::VocabularyLoader;
use crate::utils::{AppConfig, get_vocab_dir, list_vocabularies, read_vocab_meta};
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;

/// Display vocabulary statistics
pub fn show_stats(root_path: &Path, mode: CorpusMode) -> Result<()> {
    let root = root_path.canonicalize().context("Invalid corpus path")?;
    let vocab_dir = get_vocab_dir(&root, mode)?;
    let meta = read_vocab_meta(&vocab_dir).with_context(|| {
        format!("No {} vocabulary for {} (run `oggle index` first)", mode, root.display())
    })?;

    let config = AppConfig::load_or_default();
    let start = Instant::now();
    let trie = VocabularyLoader::for_dir(&vocab_dir, config.min_word_len).load(&vocab_dir);
    let load_ms = start.elapsed().as_secs_f64() * 1000.0;

    println!("Vocabulary Statistics");
    println!("=====================");
    println!();
    println!("Corpus root:      {}", meta.root_path.display());
    println!("Corpus mode:      {}", meta.mode);
    println!("Location:         {}", vocab_dir.display());
    println!("Format version:   {}", meta.version);
    println!("Min word length:  {}", meta.min_word_len);
    println!("Documents:        {}", meta.document_count);
    println!("Skipped:          {}", meta.skipped_documents);
    println!("Distinct words:   {}", meta.word_count);

    if let Ok(file) = std::fs::metadata(vocab_dir.join(VOCAB_FILE)) {
        println!("File size:        {}", format_size(file.len()));
    }

    println!();
    println!("Trie words:       {}", trie.len());
    println!("Trie nodes:       {}", trie.node_count());
    println!("Trie memory:      {}", format_size(trie.memory_bytes() as u64));
    println!("Load time:        {:.1} ms", load_ms);

    if trie.len() != meta.word_count {
        eprintln!(
            "warning: trie holds {} words but meta.json records {}",
            trie.len(),
            meta.word_count
        );
    }

    println!();
    println!("Created:          {}", format_timestamp(meta.created_at));

    Ok(())
}

/// List all built vocabularies
pub fn list_vocabularies_cmd() -> Result<()> {
    let vocabularies = list_vocabularies()?;

    if vocabularies.is_empty() {
        println!("No vocabularies found.");
        return Ok(());
    }

    println!("Vocabularies");
    println!("============");
    println!();

    for vocab in vocabularies {
        let status = if vocab.root_path.exists() { "" } else { " [missing]" };
        println!("  {} ({}){}", vocab.root_path.display(), vocab.meta.mode, status);
        println!("    Words: {}", vocab.meta.word_count);
        println!("    Location: {}", vocab.vocab_dir.display());
        println!();
    }

    Ok(())
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format unix timestamp
fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
