use thiserror::Error;

use crate::error::ConfigError;
use crate::market::errors::QuoteError;

#[derive(Error, Debug)]
pub enum TwelveDataError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error {code}: {message}")]
    Api { code: u16, message: String },

    #[error("invalid response from twelvedata: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Credential(#[from] ConfigError),
}

impl From<TwelveDataError> for QuoteError {
    fn from(err: TwelveDataError) -> Self {
        match err {
            TwelveDataError::Http(e) if e.is_timeout() => QuoteError::Network(format!("timeout: {e}")),
            TwelveDataError::Http(e) => QuoteError::Network(e.to_string()),
            TwelveDataError::Api { code: 401 | 403, message } => QuoteError::Auth(message),
            TwelveDataError::Api { code: 429, message } => QuoteError::RateLimited(message),
            TwelveDataError::Api { code, message } => QuoteError::Provider { code, message },
            TwelveDataError::InvalidResponse(msg) => QuoteError::Schema(msg),
            TwelveDataError::Credential(e) => QuoteError::Auth(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_codes_map_to_quote_taxonomy() {
        let auth: QuoteError = TwelveDataError::Api {
            code: 401,
            message: "bad key".into(),
        }
        .into();
        assert_eq!(auth, QuoteError::Auth("bad key".into()));

        let limited: QuoteError = TwelveDataError::Api {
            code: 429,
            message: "slow down".into(),
        }
        .into();
        assert!(matches!(limited, QuoteError::RateLimited(_)));

        let other: QuoteError = TwelveDataError::Api {
            code: 400,
            message: "symbol not found".into(),
        }
        .into();
        assert!(matches!(other, QuoteError::Provider { code: 400, .. }));
    }

    #[test]
    fn missing_credential_is_an_auth_failure() {
        let err: QuoteError = TwelveDataError::Credential(ConfigError::MissingCredential {
            var: "TWELVE_API_KEY".into(),
        })
        .into();
        assert!(matches!(err, QuoteError::Auth(_)));
    }
}
