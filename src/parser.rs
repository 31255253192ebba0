use tracing::debug;

use crate::error::ParseError;
use crate::extractors::ParserConfig;
use crate::models::{CategoryTable, CurrencyTable, KeywordTables, ParsedExpense, Transcript};
use crate::stages::{Normalizer, assemble, extract};

/// Parse a transcript into an expense draft with default limits
pub fn parse(
    transcript: &str,
    default_currency: &str,
    categories: &CategoryTable,
    currencies: &CurrencyTable,
) -> Result<ParsedExpense, ParseError> {
    parse_with_config(
        transcript,
        default_currency,
        categories,
        currencies,
        &ParserConfig::default(),
    )
}

/// Parse a transcript into an expense draft
pub fn parse_with_config(
    transcript: &str,
    default_currency: &str,
    categories: &CategoryTable,
    currencies: &CurrencyTable,
    config: &ParserConfig,
) -> Result<ParsedExpense, ParseError> {
    let normalizer = Normalizer::with_symbols(currencies.symbols());
    run(
        &normalizer,
        Transcript::new(transcript, default_currency),
        categories,
        currencies,
        config,
    )
}

fn run(
    normalizer: &Normalizer,
    transcript: Transcript,
    categories: &CategoryTable,
    currencies: &CurrencyTable,
    config: &ParserConfig,
) -> Result<ParsedExpense, ParseError> {
    // Stage 0: tokens
    let tokens = normalizer.normalize(transcript.text);
    if tokens.is_empty() {
        return Err(ParseError::EmptyTranscript);
    }
    debug!("Normalized transcript into {} tokens", tokens.len());

    let default_currency = currencies
        .find_code(transcript.default_currency)
        .cloned()
        .ok_or_else(|| ParseError::UnknownDefaultCurrency(transcript.default_currency.to_string()))?;

    // Stage 1: independent extractors
    let extraction = extract(
        &tokens,
        transcript.text,
        &default_currency,
        categories,
        currencies,
        config,
    );

    // Stage 2: merge
    assemble(&transcript, extraction)
}

/// Parser that owns its keyword tables and limits
///
/// Holds no mutable state, so one instance can be shared between threads
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ExpenseParser {
    tables: KeywordTables,
    normalizer: Normalizer,
    config: ParserConfig,
}

impl ExpenseParser {
    pub fn new(tables: KeywordTables, config: ParserConfig) -> Self {
        let normalizer = Normalizer::with_symbols(tables.currencies.symbols());
        Self {
            tables,
            normalizer,
            config,
        }
    }

    /// Parser over the built-in tables with default limits
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(KeywordTables::builtin()?, ParserConfig::default()))
    }

    pub fn tables(&self) -> &KeywordTables {
        &self.tables
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse(&self, transcript: &str, default_currency: &str) -> Result<ParsedExpense, ParseError> {
        run(
            &self.normalizer,
            Transcript::new(transcript, default_currency),
            &self.tables.categories,
            &self.tables.currencies,
            &self.config,
        )
    }
}
