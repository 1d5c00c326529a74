/// Errors from the text-generation boundary.
///
/// None of these reach the overlay: the whisper path absorbs every variant
/// into the "lost" fallback text.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("no API key configured (set API_KEY or GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type OracleResult<T> = Result<T, OracleError>;
