use crate::error::{VocabError, VocabResult};
use std::str::CharIndices;

/// Default minimum word length, in code points.
/// Shared by the collector and the loader so both sides agree on what a word is.
pub const DEFAULT_MIN_WORD_LEN: usize = 5;

/// Splits text into lowercase alphabetic words.
///
/// A word is a maximal run of alphabetic code points (Unicode `Alphabetic`,
/// not ASCII-only). Runs shorter than `min_len` are dropped; they never merge
/// with their neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    min_len: usize,
}

impl Tokenizer {
    pub fn new(min_len: usize) -> Self {
        Self { min_len }
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Lazily tokenize a string
    pub fn tokens<'a>(&self, text: &'a str) -> Tokens<'a> {
        Tokens {
            chars: text.char_indices(),
            min_len: self.min_len,
        }
    }

    /// Tokenize raw document bytes, failing on malformed UTF-8
    pub fn tokenize_bytes<'a>(&self, bytes: &'a [u8]) -> VocabResult<Tokens<'a>> {
        let text = std::str::from_utf8(bytes).map_err(|e| VocabError::Encoding {
            valid_up_to: e.valid_up_to(),
        })?;
        Ok(self.tokens(text))
    }

    /// Returns the folded word if `text` is exactly one indexable word
    pub fn normalize_word(&self, text: &str) -> Option<String> {
        let folded = normalize_prefix(text)?;
        if folded.chars().count() >= self.min_len {
            Some(folded)
        } else {
            None
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WORD_LEN)
    }
}

/// Iterator over the words of a borrowed string.
pub struct Tokens<'a> {
    chars: CharIndices<'a>,
    min_len: usize,
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut word = String::new();
        let mut len = 0usize;

        loop {
            match self.chars.next() {
                Some((_, ch)) if ch.is_alphabetic() => {
                    word.push(fold_char(ch));
                    len += 1;
                }
                Some(_) => {
                    if len >= self.min_len && len > 0 {
                        return Some(word);
                    }
                    word.clear();
                    len = 0;
                }
                None => {
                    return if len >= self.min_len && len > 0 {
                        Some(word)
                    } else {
                        None
                    };
                }
            }
        }
    }
}

/// Simple (one-to-one) lowercase mapping.
///
/// Characters whose full lowercase form expands to several code points are
/// kept unchanged, so folding is idempotent and never changes a word's length.
#[inline]
pub fn fold_char(ch: char) -> char {
    let mut lower = ch.to_lowercase();
    if lower.len() == 1 {
        lower.next().unwrap_or(ch)
    } else {
        ch
    }
}

/// Fold a user-typed prefix.
///
/// Returns `None` when the prefix holds a non-alphabetic code point: no
/// indexed word can start with it.
pub fn normalize_prefix(prefix: &str) -> Option<String> {
    prefix
        .chars()
        .map(|ch| ch.is_alphabetic().then(|| fold_char(ch)))
        .collect()
}

/// True if `text` is already in folded, alphabetic-only form
pub fn is_normalized(text: &str) -> bool {
    text.chars().all(|ch| ch.is_alphabetic() && fold_char(ch) == ch)
}
