//! Retrieval for grounded answers
//!
//! Looks up catalog matches for a keyword and renders them into the
//! grounding text the answer generator embeds in its prompt.

pub mod context;

pub use context::{describe_record, summarize_record, ContextAssembler};
