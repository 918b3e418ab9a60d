//! Turning corpus files into plain text for the tokenizer.

use crate::error::{VocabError, VocabResult};
use crate::index::types::CorpusMode;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use memchr::{memchr, memmem};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// File name patterns indexed in image mode
const IMAGE_PATTERNS: &[&str] = &["*.png", "*.jpg", "*.jpeg"];

/// Elements whose content is never text
const RAW_TEXT_ELEMENTS: &[&[u8]] = &[b"script", b"style"];

fn image_globs() -> &'static GlobSet {
    static GLOBS: OnceLock<GlobSet> = OnceLock::new();
    GLOBS.get_or_init(|| {
        let mut builder = GlobSetBuilder::new();
        for pattern in IMAGE_PATTERNS {
            if let Ok(glob) = GlobBuilder::new(pattern).case_insensitive(true).build() {
                builder.add(glob);
            }
        }
        builder.build().unwrap_or_else(|_| GlobSet::empty())
    })
}

fn title_regex() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"))
}

/// True for png/jpg/jpeg files, any letter case
pub fn is_image_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| image_globs().is_match(name))
        .unwrap_or(false)
}

/// Contents of the first `<title>` element, trimmed
pub fn extract_title(html: &str) -> Option<&str> {
    title_regex()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
}

/// Remove markup from an HTML page.
///
/// Tags become word breaks, `<script>` and `<style>` blocks are dropped with
/// their content, and whitespace runs collapse to a single space.
pub fn strip_tags(html: &str) -> String {
    let bytes = html.as_bytes();
    let mut text = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(offset) = memchr(b'<', &bytes[pos..]) {
        let lt = pos + offset;
        text.push_str(&html[pos..lt]);
        text.push(' ');

        let raw_end = RAW_TEXT_ELEMENTS
            .iter()
            .find(|name| opens_element(bytes, lt, name))
            .and_then(|name| find_closing_tag(bytes, lt, name));

        pos = match raw_end {
            Some(end) => end,
            None => match memchr(b'>', &bytes[lt..]) {
                Some(gt) => lt + gt + 1,
                // Unterminated tag swallows the rest
                None => bytes.len(),
            },
        };
    }
    text.push_str(&html[pos..]);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Does the tag starting at `lt` open element `name`?
fn opens_element(bytes: &[u8], lt: usize, name: &[u8]) -> bool {
    let start = lt + 1;
    let end = start + name.len();
    match bytes.get(start..end) {
        Some(candidate) if candidate.eq_ignore_ascii_case(name) => bytes
            .get(end)
            .map(|b| !b.is_ascii_alphanumeric())
            .unwrap_or(true),
        _ => false,
    }
}

/// Offset just past `</name ...>`, searching from `from`
fn find_closing_tag(bytes: &[u8], from: usize, name: &[u8]) -> Option<usize> {
    memmem::find_iter(&bytes[from..], b"</").find_map(|offset| {
        let start = from + offset + 2;
        let end = start + name.len();
        let candidate = bytes.get(start..end)?;
        if !candidate.eq_ignore_ascii_case(name) {
            return None;
        }
        memchr(b'>', &bytes[end..]).map(|gt| end + gt + 1)
    })
}

/// Plain text of one corpus document.
///
/// HTML pages yield their stripped markup (title included); images yield
/// their file stem. Malformed UTF-8 in either is an encoding error.
pub fn document_text(mode: CorpusMode, path: &Path, content: &[u8]) -> VocabResult<String> {
    match mode {
        CorpusMode::Html => {
            let html = std::str::from_utf8(content).map_err(|e| VocabError::Encoding {
                valid_up_to: e.valid_up_to(),
            })?;
            Ok(strip_tags(html))
        }
        CorpusMode::Images => {
            let stem = path.file_stem().unwrap_or_default();
            let label = std::str::from_utf8(stem.as_encoded_bytes()).map_err(|e| {
                VocabError::Encoding {
                    valid_up_to: e.valid_up_to(),
                }
            })?;
            Ok(label.to_string())
        }
    }
}
