use crate::error::ParseError;
use crate::models::{AmbiguityFlag, Confidence, ParsedExpense, Transcript};

use super::Extraction;

/// Perform Stage 2: merge the extractor outputs into a `ParsedExpense`
///
/// Only a missing amount is fatal here; every other condition is already
/// a flag on one of the sub-results.
pub fn assemble(transcript: &Transcript, extraction: Extraction) -> Result<ParsedExpense, ParseError> {
    let Extraction {
        amount,
        currency,
        category,
        merchant,
    } = extraction;

    let amount = amount.ok_or(ParseError::MissingAmount)?;

    let mut flags: Vec<AmbiguityFlag> = amount
        .flags
        .iter()
        .chain(&currency.flags)
        .chain(&category.flags)
        .chain(&merchant.flags)
        .copied()
        .collect();
    flags.sort();
    flags.dedup();

    let confidence = compute_confidence(&flags, currency.is_default(), category.is_default());

    Ok(ParsedExpense {
        amount: amount.amount,
        currency: currency.code,
        category: category.category,
        merchant: merchant.merchant,
        notes: Some(transcript.text.to_string()),
        ambiguity_flags: flags,
        confidence,
    })
}

/// Classify how far a result can be trusted
///
/// - Low: both currency and category defaulted, or any severe flag
/// - Medium: exactly one default, or only advisory flags
/// - High: no flags at all
pub fn compute_confidence(
    flags: &[AmbiguityFlag],
    currency_defaulted: bool,
    category_defaulted: bool,
) -> Confidence {
    let defaults = [currency_defaulted, category_defaulted]
        .iter()
        .filter(|d| **d)
        .count();

    if defaults == 2 || flags.iter().any(|f| f.is_severe()) {
        Confidence::Low
    } else if defaults == 1 || !flags.is_empty() {
        Confidence::Medium
    } else {
        Confidence::High
    }
}
