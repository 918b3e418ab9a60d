//! Utility functions shared by the build and serve sides.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration and vocabulary locations (XDG-compliant)
//! - [`corpus`] - Text extraction from HTML pages and image file names
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//! - [`tokenizer`] - Alphabetic word extraction and case folding
//!
//! ```
//! use oggle::utils::Tokenizer;
//!
//! let words: Vec<String> = Tokenizer::new(5).tokens("Hello, wonderful World!").collect();
//! assert_eq!(words, ["hello", "wonderful", "world"]);
//! ```

pub mod app_data;
pub mod corpus;
pub mod progress;
pub mod tokenizer;

pub use app_data::*;
pub use corpus::*;
pub use tokenizer::*;
