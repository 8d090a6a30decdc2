use thiserror::Error;

/// Outcome of a failed quote fetch. Always scoped to one instrument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("unexpected response schema: {0}")]
    Schema(String),

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("provider error {code}: {message}")]
    Provider { code: u16, message: String },
}
