use tracing::debug;

use crate::extractors::{
    AmountExtraction, CategoryMatch, CurrencyResolution, MerchantExtraction, ParserConfig,
    classify_category, detect_currency, extract_amount, extract_merchant,
};
use crate::models::{CategoryTable, CurrencyCode, CurrencyTable, Token};

/// Result of Stage 1: the four independent sub-results
#[derive(Debug, Clone)]
pub struct Extraction {
    /// `None` when the transcript has no numeric content
    pub amount: Option<AmountExtraction>,
    pub currency: CurrencyResolution,
    pub category: CategoryMatch,
    pub merchant: MerchantExtraction,
}

/// Perform Stage 1: run every extractor over the same token stream
///
/// The extractors do not depend on each other; each reads the tokens and
/// the tables it needs and nothing else.
pub fn extract(
    tokens: &[Token],
    text: &str,
    default_currency: &CurrencyCode,
    categories: &CategoryTable,
    currencies: &CurrencyTable,
    config: &ParserConfig,
) -> Extraction {
    let amount = extract_amount(tokens, config);
    let currency = detect_currency(tokens, text, default_currency, currencies);
    let category = classify_category(tokens, categories);
    let merchant = extract_merchant(tokens, text, config);

    debug!(
        "Extracted amount={:?} currency={} ({:?}) category={} merchant={:?}",
        amount.as_ref().map(|a| a.amount),
        currency.code,
        currency.source,
        category.category,
        merchant.merchant
    );

    Extraction {
        amount,
        currency,
        category,
        merchant,
    }
}
