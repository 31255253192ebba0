use thiserror::Error;

/// Fatal outcomes of a single parse call
///
/// Everything else is reported as an `AmbiguityFlag` on a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("transcript contains no usable content")]
    EmptyTranscript,

    #[error("no amount found in transcript")]
    MissingAmount,

    #[error("default currency {0:?} is not one of the configured currency codes")]
    UnknownDefaultCurrency(String),
}

impl ParseError {
    /// Question the dialog layer can ask to recover from this error
    pub fn clarification_prompt(&self) -> &'static str {
        match self {
            ParseError::EmptyTranscript => "Sorry, I didn't catch that. What did you spend?",
            ParseError::MissingAmount => "How much did you spend?",
            ParseError::UnknownDefaultCurrency(_) => "Which currency was that in?",
        }
    }
}

/// Problems found while building keyword tables from a resource
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unsupported keyword resource version {0:?} (expected 1.x)")]
    UnsupportedVersion(String),

    #[error("invalid currency code {0:?}")]
    InvalidCurrencyCode(String),

    #[error("currency {0} is listed more than once")]
    DuplicateCurrency(String),

    #[error("category {0} is listed more than once")]
    DuplicateCategory(String),

    #[error("category Other is the fallback and cannot carry keywords")]
    KeywordsOnFallback,

    #[error("empty keyword in entry {0}")]
    EmptyKeyword(String),
}
