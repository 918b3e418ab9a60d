//! End-to-end tests: corpus on disk -> persisted vocabulary -> suggestions.

use oggle::error::VocabError;
use oggle::index::build::build_vocabulary_into;
use oggle::index::types::{CorpusMode, IndexConfig, VOCAB_FILE};
use oggle::index::VocabularyLoader;
use oggle::query::SuggestionEngine;
use oggle::utils::{AppConfig, read_vocab_meta};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, name: &str, content: &[u8]) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Small wiki-like corpus of HTML pages and images
fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "wiki/Volcano.html",
        "<html><head><title>Volcano</title><style>.lava{color:red}</style></head>\
         <body><h1>Volcanoes</h1><p>Volcanic eruptions eject lava and ash.</p></body></html>"
            .as_bytes(),
    );
    write(
        root,
        "wiki/Cafe.html",
        "<title>Café culture</title><p>CAFÉ SOCIETY and Parisian cafés</p>".as_bytes(),
    );
    write(
        root,
        "wiki/Search.htm",
        b"<p>Search engines index series of pages; setup matters.</p>",
    );
    write(root, "wiki/.hidden/secret.html", b"<p>Classified material</p>");
    write(root, "images/Volcano_Eruption.JPG", b"\xff\xd8\xff binary");
    write(root, "images/mountain-lake.png", b"\x89PNG binary");
    write(root, "images/readme.txt", b"Description of images");
    dir
}

fn build(root: &Path, mode: CorpusMode, config: &IndexConfig) -> TempDir {
    let out = TempDir::new().unwrap();
    build_vocabulary_into(root, out.path(), mode, config, true).unwrap();
    out
}

#[test]
fn test_html_suggestions() {
    let corpus = corpus();
    let out = build(corpus.path(), CorpusMode::Html, &IndexConfig::default());
    let engine = SuggestionEngine::from_dir(out.path(), &AppConfig::default());

    assert_eq!(engine.suggest("volc"), vec!["volcanic", "volcano", "volcanoes"]);
    assert_eq!(engine.suggest("SE"), vec!["search", "series", "setup"]);
    assert_eq!(engine.suggest("Café"), vec!["cafés"]);
    assert!(engine.contains("society"));
    assert!(engine.contains("parisian"));

    // Style content, short words and hidden directories stay out
    assert!(!engine.contains("color"));
    assert!(!engine.contains("lava"));
    assert!(!engine.contains("classified"));
}

#[test]
fn test_image_names() {
    let corpus = corpus();
    let out = build(corpus.path(), CorpusMode::Images, &IndexConfig::default());
    let engine = SuggestionEngine::from_dir(out.path(), &AppConfig::default());

    assert_eq!(engine.word_count(), 3);
    assert_eq!(engine.suggest("m"), vec!["mountain"]);
    assert_eq!(engine.suggest("ERU"), vec!["eruption"]);
    assert!(!engine.contains("description"));
    assert!(!engine.contains("binary"));
}

#[test]
fn test_persisted_format() {
    let corpus = corpus();
    let out = build(corpus.path(), CorpusMode::Images, &IndexConfig::default());

    let blob = fs::read_to_string(out.path().join(VOCAB_FILE)).unwrap();
    assert_eq!(blob, "eruption mountain volcano");

    let meta = read_vocab_meta(out.path()).unwrap();
    assert_eq!(meta.mode, CorpusMode::Images);
    assert_eq!(meta.word_count, 3);
    assert_eq!(meta.document_count, 2);
    assert_eq!(meta.root_path, corpus.path().canonicalize().unwrap());
}

#[test]
fn test_loader_uses_recorded_threshold() {
    let corpus = corpus();
    let config = IndexConfig {
        min_word_len: 3,
        ..IndexConfig::default()
    };
    let out = build(corpus.path(), CorpusMode::Html, &config);

    // The application default is 5, but the vocabulary was built with 3
    let engine = SuggestionEngine::from_dir(out.path(), &AppConfig::default());
    assert!(engine.contains("ash"));
    assert_eq!(engine.suggest("lav"), vec!["lava"]);
    assert_eq!(read_vocab_meta(out.path()).unwrap().min_word_len, 3);
}

#[test]
fn test_missing_vocabulary() {
    let empty = TempDir::new().unwrap();
    let loader = VocabularyLoader::for_dir(empty.path(), 5);

    assert!(matches!(
        loader.try_load(empty.path()),
        Err(VocabError::MissingVocabulary { .. })
    ));

    let engine = SuggestionEngine::from_dir(empty.path(), &AppConfig::default());
    assert_eq!(engine.word_count(), 0);
    assert!(engine.suggest("any").is_empty());
}

#[test]
fn test_corrupt_vocabulary() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(VOCAB_FILE), b"search \xc3\x28 series").unwrap();

    let loader = VocabularyLoader::for_dir(dir.path(), 5);
    assert!(matches!(
        loader.try_load(dir.path()),
        Err(VocabError::Encoding { valid_up_to: 7 })
    ));
    assert!(loader.load(dir.path()).is_empty());
}

#[test]
fn test_rebuild_replaces_vocabulary() {
    let corpus = corpus();
    let out = TempDir::new().unwrap();
    build_vocabulary_into(corpus.path(), out.path(), CorpusMode::Html, &IndexConfig::default(), true)
        .unwrap();

    write(corpus.path(), "wiki/Glacier.html", b"<p>Glaciers carve valleys</p>");
    fs::remove_file(corpus.path().join("wiki/Search.htm")).unwrap();
    build_vocabulary_into(corpus.path(), out.path(), CorpusMode::Html, &IndexConfig::default(), true)
        .unwrap();

    let engine = SuggestionEngine::from_dir(out.path(), &AppConfig::default());
    assert_eq!(engine.suggest("gla"), vec!["glaciers"]);
    assert!(engine.suggest("sea").is_empty());
}
