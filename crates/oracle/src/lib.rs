//! Oracle: the text-generation boundary of the whisper overlay.
//!
//! # Invariants
//! - One prompt in, one string out; no retry, batching or backpressure.
//! - Errors never escape [`hear_whisper`]; they become fallback text.
//! - The credential is read once at startup.

mod config;
mod error;
mod gemini;
mod prompt;
mod whisper;

pub use config::{DEFAULT_BASE_URL, DEFAULT_MODEL, OracleConfig};
pub use error::{OracleError, OracleResult};
pub use gemini::GeminiClient;
pub use prompt::{LOST_WORDS, MAX_WORDS, SILENT_WIND, whisper_prompt};
pub use whisper::{HeardWhisper, TextGenerator, hear_whisper};

pub fn crate_info() -> &'static str {
    "skyrealm-oracle v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("oracle"));
    }
}
