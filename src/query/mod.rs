pub mod engine;

pub use engine::{DEFAULT_MAX_SUGGESTIONS, SuggestionEngine, suggestions_json};
