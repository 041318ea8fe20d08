use thiserror::Error;

/// Why a submit was ignored. Never shown to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputRejected {
    #[error("input is empty or whitespace-only")]
    Blank,

    #[error("a reply is still outstanding")]
    Busy,
}

/// Everything that can go wrong with the outbound call.
///
/// All variants collapse to the same fallback turn in the transcript; the
/// distinction only reaches the log and [`crate::AssistantWidget::last_failure`].
#[derive(Debug, Error)]
pub enum ServiceFailure {
    #[error("no API key configured (set GEMINI_API_KEY or api_key in config.json)")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request task ended without a result")]
    TaskAborted,
}

/// Returned when a reply arrives while no request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("reply received while idle")]
pub struct UnexpectedReply;
