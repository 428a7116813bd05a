//! Text processing for the store assistant
//!
//! This crate provides:
//! - **Keyword extraction**: derive the catalog search term from a question
//! - **Recommendations**: static related-product suggestions
//!
//! # Example
//!
//! ```
//! use store_assistant_text_processing::KeywordExtractor;
//!
//! let keyword = KeywordExtractor::new().extract("tôi cần tìm bàn phím ở đâu");
//! assert_eq!(keyword, "bàn phím");
//! ```

pub mod keyword;
pub mod recommend;

pub use keyword::KeywordExtractor;
pub use recommend::Recommender;
