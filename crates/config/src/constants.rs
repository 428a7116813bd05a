//! Centralized defaults for the store assistant
//!
//! Single source of truth for endpoints, limits and timeouts used by the
//! settings defaults and by crates that need a value without a `Settings`.

/// Service endpoints
pub mod endpoints {
    /// Ollama LLM endpoint
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// OpenAI-compatible completion endpoint (llama.cpp server, vLLM)
    pub const OPENAI_COMPATIBLE_DEFAULT: &str = "http://localhost:8000/v1";

    /// Speech-to-text sidecar
    pub const STT_DEFAULT: &str = "http://127.0.0.1:8090";

    /// Text-to-speech sidecar
    pub const TTS_DEFAULT: &str = "http://127.0.0.1:8091";
}

/// Timeouts (in milliseconds)
pub mod timeouts {
    /// Speech-to-text call
    pub const STT_TIMEOUT_MS: u64 = 30_000;

    /// Generation call
    pub const LLM_REQUEST_MS: u64 = 60_000;

    /// Text-to-speech call
    pub const TTS_TIMEOUT_MS: u64 = 30_000;

    /// Structured store lookup
    pub const STORE_LOOKUP_MS: u64 = 5_000;
}

/// Answer generation defaults
pub mod generation {
    /// Upper bound on generated tokens
    pub const MAX_TOKENS: usize = 256;

    /// End-of-sequence marker for the completion model
    pub const STOP_SEQUENCE: &str = "</s>";

    /// Reply used when no product matches the question
    pub const NO_MATCH_MESSAGE: &str =
        "Xin lỗi, cửa hàng hiện không có sản phẩm bạn đang tìm.";
}

/// Upload and storage limits
pub mod limits {
    /// Largest accepted voice upload (10 MiB)
    pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;
}
