use thiserror::Error;

/// Global configuration problems. Halts scheduling until resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing credential: environment variable {var} is not set")]
    MissingCredential { var: String },

    #[error("invalid configuration value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Rejected threshold edit. Reported to the editor only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("threshold is not a number: {0:?}")]
    NotNumeric(String),

    #[error("threshold must not be negative")]
    Negative,

    #[error("threshold exceeds the maximum of {max}%")]
    OutOfRange { max: rust_decimal::Decimal },

    #[error("instrument {0} is not configured")]
    UnknownInstrument(String),
}
