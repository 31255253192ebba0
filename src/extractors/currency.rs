use std::ops::Range;

use serde::Serialize;
use tracing::debug;

use super::find_phrase;
use crate::models::{AmbiguityFlag, CurrencyCode, CurrencyTable, Token, TokenKind};

/// Where a currency signal came from, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencySource {
    /// Explicit code such as "AED"
    Code,
    /// Symbol such as "$"
    Symbol,
    /// Spoken keyword such as "dirhams"
    Keyword,
    /// Caller-supplied default
    Default,
}

/// A single currency mention in the transcript
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySignal {
    pub code: CurrencyCode,
    pub source: CurrencySource,
    /// Token indices of the mention
    pub tokens: Range<usize>,
}

/// Result of currency detection
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyResolution {
    /// Resolved code, always a configured one
    pub code: CurrencyCode,
    pub source: CurrencySource,
    /// Every signal found, in priority then token order
    pub signals: Vec<CurrencySignal>,
    /// `ConflictingCurrency` and/or `CurrencyDefaulted`
    pub flags: Vec<AmbiguityFlag>,
}

impl CurrencyResolution {
    pub fn is_default(&self) -> bool {
        self.source == CurrencySource::Default
    }
}

/// Whether a code-looking word should be read as a currency code
///
/// Lowercase words only count next to a number or symbol, so that ordinary
/// words never collide with configured codes.
fn reads_as_code(tokens: &[Token], index: usize, text: &str) -> bool {
    let original = tokens[index].original(text);
    if original.chars().all(|c| c.is_uppercase()) {
        return true;
    }

    let is_amount_like = |t: &Token| matches!(t.kind, TokenKind::Number | TokenKind::CurrencySymbol);
    let before = index.checked_sub(1).and_then(|i| tokens.get(i));
    before.is_some_and(is_amount_like) || tokens.get(index + 1).is_some_and(is_amount_like)
}

fn code_signals(tokens: &[Token], text: &str, table: &CurrencyTable) -> Vec<CurrencySignal> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_word())
        .filter_map(|(i, t)| {
            let code = table.find_code(&t.text)?;
            reads_as_code(tokens, i, text).then(|| CurrencySignal {
                code: code.clone(),
                source: CurrencySource::Code,
                tokens: i..i + 1,
            })
        })
        .collect()
}

fn symbol_signals(tokens: &[Token], table: &CurrencyTable) -> Vec<CurrencySignal> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind == TokenKind::CurrencySymbol)
        .filter_map(|(i, t)| {
            let Some(code) = table.code_for_symbol(&t.text) else {
                debug!("Symbol {:?} is not configured, ignoring", t.text);
                return None;
            };
            Some(CurrencySignal {
                code: code.clone(),
                source: CurrencySource::Symbol,
                tokens: i..i + 1,
            })
        })
        .collect()
}

/// Keyword matches, dropping any match contained in a longer one
/// ("egyptian pounds" hides "pounds")
fn keyword_signals(tokens: &[Token], table: &CurrencyTable) -> Vec<CurrencySignal> {
    let matches: Vec<CurrencySignal> = table
        .keywords()
        .iter()
        .filter_map(|(phrase, code)| {
            let start = find_phrase(tokens, &phrase.words)?;
            Some(CurrencySignal {
                code: code.clone(),
                source: CurrencySource::Keyword,
                tokens: start..start + phrase.len(),
            })
        })
        .collect();

    let contained_in_longer = |signal: &CurrencySignal| {
        matches.iter().any(|other| {
            other.tokens.len() > signal.tokens.len()
                && other.tokens.start <= signal.tokens.start
                && signal.tokens.end <= other.tokens.end
        })
    };

    let mut kept: Vec<CurrencySignal> = matches
        .iter()
        .filter(|s| !contained_in_longer(s))
        .cloned()
        .collect();
    kept.sort_by_key(|s| s.tokens.start);
    kept
}

/// Collect every currency signal, ordered by priority then position
pub fn find_currency_signals(tokens: &[Token], text: &str, table: &CurrencyTable) -> Vec<CurrencySignal> {
    let mut signals = code_signals(tokens, text, table);
    signals.extend(symbol_signals(tokens, table));
    signals.extend(keyword_signals(tokens, table));
    signals.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then(a.tokens.start.cmp(&b.tokens.start))
    });
    signals
}

/// Resolve the currency of a transcript
///
/// The highest-priority signal wins (code, then symbol, then keyword). If
/// signals name different currencies, `ConflictingCurrency` is raised. With
/// no signal at all the caller default is used and `CurrencyDefaulted` is raised.
pub fn detect_currency(
    tokens: &[Token],
    text: &str,
    default: &CurrencyCode,
    table: &CurrencyTable,
) -> CurrencyResolution {
    let signals = find_currency_signals(tokens, text, table);

    let Some(chosen) = signals.first() else {
        debug!("No currency signal, using default {}", default);
        return CurrencyResolution {
            code: default.clone(),
            source: CurrencySource::Default,
            signals,
            flags: vec![AmbiguityFlag::CurrencyDefaulted],
        };
    };

    let mut flags = Vec::new();
    if signals.iter().any(|s| s.code != chosen.code) {
        debug!(
            "Conflicting currency signals, keeping {} from {:?}",
            chosen.code, chosen.source
        );
        flags.push(AmbiguityFlag::ConflictingCurrency);
    }

    CurrencyResolution {
        code: chosen.code.clone(),
        source: chosen.source,
        flags,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_currency_json;
    use crate::stages::Normalizer;

    const CURRENCIES: &str = r#"{
        "version": "1.0",
        "lastUpdated": "2024-03-01",
        "entries": [
            {"code": "AED", "symbol": "د.إ", "displayName": "UAE Dirham", "locale": "ar-AE", "isRTL": true,
             "voiceKeywords": ["dirham", "dirhams", "dhs"]},
            {"code": "USD", "symbol": "$", "displayName": "US Dollar", "locale": "en-US", "isRTL": false,
             "voiceKeywords": ["dollar", "dollars", "bucks"]},
            {"code": "GBP", "symbol": "£", "displayName": "British Pound",
             "voiceKeywords": ["pound", "pounds"]},
            {"code": "EGP", "displayName": "Egyptian Pound",
             "voiceKeywords": ["egyptian pound", "egyptian pounds"]}
        ]
    }"#;

    fn resolve(text: &str, default: &str) -> CurrencyResolution {
        let table = parse_currency_json(CURRENCIES).unwrap();
        let normalizer = Normalizer::with_symbols(table.symbols());
        let tokens = normalizer.normalize(text);
        let default = CurrencyCode::parse(default).unwrap();
        detect_currency(&tokens, text, &default, &table)
    }

    #[test]
    fn test_keyword_currency() {
        let result = resolve("I spent 150 dirhams on groceries", "USD");
        assert_eq!(result.code.as_str(), "AED");
        assert_eq!(result.source, CurrencySource::Keyword);
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_explicit_code() {
        let result = resolve("paid 40 USD for parking", "AED");
        assert_eq!(result.code.as_str(), "USD");
        assert_eq!(result.source, CurrencySource::Code);

        // lowercase code next to a number
        let result = resolve("paid 40 usd", "AED");
        assert_eq!(result.source, CurrencySource::Code);
    }

    #[test]
    fn test_symbol_currency() {
        let result = resolve("$12 on coffee", "AED");
        assert_eq!(result.code.as_str(), "USD");
        assert_eq!(result.source, CurrencySource::Symbol);

        let result = resolve("45 د.إ at the market", "USD");
        assert_eq!(result.code.as_str(), "AED");
        assert_eq!(result.source, CurrencySource::Symbol);
    }

    #[test]
    fn test_default_currency() {
        let result = resolve("50 on lunch", "AED");
        assert_eq!(result.code.as_str(), "AED");
        assert!(result.is_default());
        assert_eq!(result.flags, vec![AmbiguityFlag::CurrencyDefaulted]);
    }

    #[test]
    fn test_conflict_prefers_higher_priority() {
        let result = resolve("$20 in dirhams", "GBP");
        assert_eq!(result.code.as_str(), "USD");
        assert_eq!(result.source, CurrencySource::Symbol);
        assert_eq!(result.flags, vec![AmbiguityFlag::ConflictingCurrency]);
        assert_eq!(result.signals.len(), 2);
    }

    #[test]
    fn test_code_beats_symbol_and_keyword() {
        let result = resolve("paid $20 AED", "USD");
        assert_eq!(result.code.as_str(), "AED");
        assert_eq!(result.source, CurrencySource::Code);
        assert_eq!(result.flags, vec![AmbiguityFlag::ConflictingCurrency]);

        let result = resolve("20 GBP, I mean dollars", "AED");
        assert_eq!(result.code.as_str(), "GBP");
        assert_eq!(result.source, CurrencySource::Code);
        assert_eq!(result.flags, vec![AmbiguityFlag::ConflictingCurrency]);
    }

    #[test]
    fn test_conflict_within_keywords_keeps_first() {
        let result = resolve("20 dollars or maybe 70 dirhams", "GBP");
        assert_eq!(result.code.as_str(), "USD");
        assert_eq!(result.flags, vec![AmbiguityFlag::ConflictingCurrency]);
    }

    #[test]
    fn test_same_currency_twice_is_not_a_conflict() {
        let result = resolve("$20, twenty dollars", "AED");
        assert_eq!(result.code.as_str(), "USD");
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_longer_keyword_hides_contained_one() {
        let result = resolve("300 egyptian pounds for a taxi", "USD");
        assert_eq!(result.code.as_str(), "EGP");
        assert!(result.flags.is_empty());
    }
}
