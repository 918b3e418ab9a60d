#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use oggle::index::Trie;
use oggle::utils::normalize_prefix;

#[derive(Arbitrary, Debug)]
struct Input {
    words: Vec<String>,
    prefix: String,
    max: u8,
}

fuzz_target!(|input: Input| {
    let words: Vec<String> = input
        .words
        .iter()
        .filter_map(|w| normalize_prefix(w))
        .filter(|w| !w.is_empty())
        .collect();
    let trie: Trie = words.iter().collect();

    for word in &words {
        assert!(trie.contains(word));
    }

    if let Some(prefix) = normalize_prefix(&input.prefix) {
        let max = input.max as usize;
        let suggestions = trie.suggest(&prefix, max);
        assert!(suggestions.len() <= max);
        for s in &suggestions {
            assert!(s.starts_with(&prefix));
            assert!(trie.contains(s));
        }
    }
});
