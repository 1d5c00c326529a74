use crate::error::OracleResult;
use crate::prompt::{LOST_WORDS, SILENT_WIND, whisper_prompt};
use skyrealm_common::{Location, WhisperOutcome};
use tracing::{error, info, warn};

/// A text-generation service.
///
/// The overlay only ever sends one prompt and reads one string back;
/// implementations decide how that maps onto a wire protocol.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`. An empty string is a valid answer.
    async fn generate(&self, prompt: &str) -> OracleResult<String>;
}

/// Text heard from the wind, and which branch produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeardWhisper {
    pub text: String,
    pub outcome: WhisperOutcome,
}

/// Ask the generator for a whisper at `location`.
///
/// Never fails: an empty answer becomes [`SILENT_WIND`], any error is logged
/// and becomes [`LOST_WORDS`].
pub async fn hear_whisper(generator: &dyn TextGenerator, location: Location) -> HeardWhisper {
    let prompt = whisper_prompt(location);
    match generator.generate(&prompt).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                warn!(%location, "wind answered with no words");
                HeardWhisper {
                    text: SILENT_WIND.to_string(),
                    outcome: WhisperOutcome::Silent,
                }
            } else {
                info!(%location, words = text.split_whitespace().count(), "wind spoke");
                HeardWhisper {
                    text: text.to_string(),
                    outcome: WhisperOutcome::Spoken,
                }
            }
        }
        Err(e) => {
            error!(%location, "failed to hear the wind: {e}");
            HeardWhisper {
                text: LOST_WORDS.to_string(),
                outcome: WhisperOutcome::Lost,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use std::sync::Mutex;

    struct Scripted {
        reply: Mutex<Option<OracleResult<String>>>,
        seen: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: OracleResult<String>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> OracleResult<String> {
            self.seen.lock().unwrap().push(prompt.to_string());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    #[tokio::test]
    async fn spoken_text_is_passed_through_trimmed() {
        let generator = Scripted::new(Ok("  salt remembers the sky \n".into()));
        let heard = hear_whisper(&generator, Location::MirrorVoid).await;
        assert_eq!(heard.text, "salt remembers the sky");
        assert_eq!(heard.outcome, WhisperOutcome::Spoken);
    }

    #[tokio::test]
    async fn empty_text_becomes_silent_placeholder() {
        let generator = Scripted::new(Ok(String::new()));
        let heard = hear_whisper(&generator, Location::WhisperingGrass).await;
        assert_eq!(heard.text, SILENT_WIND);
        assert_eq!(heard.outcome, WhisperOutcome::Silent);
    }

    #[tokio::test]
    async fn whitespace_only_text_becomes_silent_placeholder() {
        let generator = Scripted::new(Ok(" \n\t  ".into()));
        let heard = hear_whisper(&generator, Location::MirrorVoid).await;
        assert_eq!(heard.text, SILENT_WIND);
        assert_eq!(heard.outcome, WhisperOutcome::Silent);
    }

    #[tokio::test]
    async fn failure_becomes_lost_placeholder() {
        let generator = Scripted::new(Err(OracleError::Api {
            status: 429,
            body: "quota".into(),
        }));
        let heard = hear_whisper(&generator, Location::ErodedRuins).await;
        assert_eq!(heard.text, LOST_WORDS);
        assert_eq!(heard.outcome, WhisperOutcome::Lost);
    }

    #[tokio::test]
    async fn prompt_is_built_from_location() {
        let generator = Scripted::new(Ok("x".into()));
        hear_whisper(&generator, Location::ErodedRuins).await;
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains(Location::ErodedRuins.name()));
    }
}
