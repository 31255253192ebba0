use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Preposition-like words that separate phrases in a spoken expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    At,
    From,
    For,
    On,
    In,
}

impl ConnectorKind {
    /// Recognize a lowercase word as a connector
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "at" => Some(Self::At),
            "from" => Some(Self::From),
            "for" => Some(Self::For),
            "on" => Some(Self::On),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    /// Connectors that introduce a merchant name
    pub fn introduces_merchant(self) -> bool {
        matches!(self, Self::At | Self::From)
    }
}

/// Lexical class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "connector")]
pub enum TokenKind {
    /// Alphabetic word (possibly with inner apostrophes or hyphens)
    Word,
    /// Numeric literal such as `150`, `1,500` or `12.75`
    Number,
    /// Currency symbol such as `$` or a configured multi-character symbol
    CurrencySymbol,
    /// Preposition that separates phrases
    Connector(ConnectorKind),
    /// Any other non-whitespace character
    Punctuation,
}

/// A classified lexical unit with its span in the original transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token class
    pub kind: TokenKind,
    /// Lowercased text of the token
    pub text: String,
    /// Byte range in the original transcript
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Number
    }

    pub fn is_punctuation(&self) -> bool {
        self.kind == TokenKind::Punctuation
    }

    /// The connector kind, if this token is a connector
    pub fn connector(&self) -> Option<ConnectorKind> {
        match self.kind {
            TokenKind::Connector(kind) => Some(kind),
            _ => None,
        }
    }

    /// Slice of the original transcript covered by this token
    pub fn original<'a>(&self, transcript: &'a str) -> &'a str {
        transcript.get(self.span.clone()).unwrap_or_default()
    }
}

/// The raw input of a single parse call plus its caller context
#[derive(Debug, Clone, Copy)]
pub struct Transcript<'a> {
    /// Raw transcript text, never modified
    pub text: &'a str,
    /// Currency code to fall back on when the text carries no currency signal
    pub default_currency: &'a str,
}

impl<'a> Transcript<'a> {
    pub fn new(text: &'a str, default_currency: &'a str) -> Self {
        Self {
            text,
            default_currency,
        }
    }
}
