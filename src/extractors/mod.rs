pub mod category;
pub mod currency;
pub mod merchant;
pub mod numbers;

pub use category::*;
pub use currency::*;
pub use merchant::*;
pub use numbers::*;

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::models::Token;

/// Configuration for all extractors
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Largest accepted amount; larger amounts are clamped and flagged
    pub max_amount: Decimal,
    /// Maximum merchant length in characters
    pub max_merchant_len: usize,
    /// Words that qualify an amount without changing it ("about 20")
    pub qualifier_words: Vec<String>,
    /// Words that cannot make up a merchant name on their own
    pub merchant_stop_words: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_amount: Decimal::new(99_999_999, 2),
            max_merchant_len: 100,
            qualifier_words: [
                "about",
                "almost",
                "exactly",
                "nearly",
                "around",
                "approximately",
                "roughly",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
            merchant_stop_words: [
                "the", "a", "an", "my", "our", "his", "her", "their", "this", "that", "some",
                "here", "there", "it", "me", "home", "work", "today", "yesterday", "tonight",
                "morning", "afternoon", "evening", "night", "card", "cash", "account", "wallet",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),
        }
    }
}

impl ParserConfig {
    /// Create config from environment variables, falling back to defaults
    ///
    /// Reads `EXPENSE_MAX_AMOUNT` and `EXPENSE_MAX_MERCHANT_LEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Create config from a variable lookup, falling back to defaults
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("EXPENSE_MAX_AMOUNT") {
            config.max_amount = Decimal::from_str(raw.trim())
                .with_context(|| format!("EXPENSE_MAX_AMOUNT is not a decimal: {:?}", raw))?;
        }

        if let Some(raw) = lookup("EXPENSE_MAX_MERCHANT_LEN") {
            config.max_merchant_len = raw
                .trim()
                .parse()
                .with_context(|| format!("EXPENSE_MAX_MERCHANT_LEN is not a number: {:?}", raw))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check limits that would break the output invariants
    pub fn validate(&self) -> Result<()> {
        if self.max_amount.is_sign_negative() {
            anyhow::bail!("max_amount must not be negative (got {})", self.max_amount);
        }
        if self.max_merchant_len == 0 {
            anyhow::bail!("max_merchant_len must be at least 1");
        }
        Ok(())
    }

    pub fn is_qualifier(&self, word: &str) -> bool {
        self.qualifier_words.iter().any(|q| q == word)
    }

    pub fn is_merchant_stop_word(&self, word: &str) -> bool {
        self.merchant_stop_words.iter().any(|s| s == word)
    }
}

/// Find the first occurrence of a phrase as a contiguous run of tokens
///
/// Returns the index of the first matched token. The last phrase word also
/// matches its plural form.
pub fn find_phrase(tokens: &[Token], words: &[String]) -> Option<usize> {
    if words.is_empty() || words.len() > tokens.len() {
        return None;
    }

    (0..=tokens.len() - words.len()).find(|&start| {
        words.iter().enumerate().all(|(offset, word)| {
            let is_last = offset + 1 == words.len();
            word_matches(&tokens[start + offset].text, word, is_last)
        })
    })
}

fn word_matches(token: &str, word: &str, allow_plural: bool) -> bool {
    if token == word {
        return true;
    }
    if !allow_plural {
        return false;
    }
    if let Some(rest) = token.strip_prefix(word) {
        return rest == "s" || rest == "es";
    }
    // grocery -> groceries
    match word.strip_suffix('y') {
        Some(stem) => token.strip_prefix(stem) == Some("ies"),
        None => false,
    }
}
