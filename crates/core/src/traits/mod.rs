//! Capability traits consumed by the query pipeline
//!
//! Every external collaborator sits behind one of these so backends can be
//! swapped by configuration and replaced with stubs in tests.
//!
//! ```text
//! Speech:
//!   - SpeechToText: WAV bytes → text
//!   - TextToSpeech: text → WAV bytes
//!
//! Language models:
//!   - LanguageModel: prompt completion with bounded length and stop sequences
//!
//! Storage:
//!   - ProductStore: read-only lookups over product locations and vouchers
//! ```

mod llm;
mod speech;
mod store;

pub use llm::LanguageModel;
pub use speech::{SpeechToText, TextToSpeech};
pub use store::ProductStore;
