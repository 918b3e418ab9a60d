#![no_main]

use libfuzzer_sys::fuzz_target;
use oggle::utils::{Tokenizer, is_normalized};

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either fail to decode or yield normalized words
    let tokenizer = Tokenizer::new(3);
    if let Ok(tokens) = tokenizer.tokenize_bytes(data) {
        for word in tokens {
            assert!(word.chars().count() >= 3);
            assert!(is_normalized(&word));
        }
    }
});
