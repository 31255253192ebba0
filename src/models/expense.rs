use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Closed set of expense categories
///
/// `Other` is the catch-all used when no keyword matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Grocery")]
    Grocery,
    #[serde(rename = "Food & Dining")]
    FoodAndDining,
    #[serde(rename = "Transportation")]
    Transportation,
    #[serde(rename = "Shopping")]
    Shopping,
    #[serde(rename = "Bills & Utilities")]
    BillsAndUtilities,
    #[serde(rename = "Entertainment")]
    Entertainment,
    #[serde(rename = "Health")]
    Health,
    #[serde(rename = "Travel")]
    Travel,
    #[serde(rename = "Education")]
    Education,
    #[serde(rename = "Other")]
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Grocery,
        Category::FoodAndDining,
        Category::Transportation,
        Category::Shopping,
        Category::BillsAndUtilities,
        Category::Entertainment,
        Category::Health,
        Category::Travel,
        Category::Education,
        Category::Other,
    ];

    /// Display name, identical to the serialized form
    pub fn name(self) -> &'static str {
        match self {
            Category::Grocery => "Grocery",
            Category::FoodAndDining => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::BillsAndUtilities => "Bills & Utilities",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Travel => "Travel",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }

    /// Look up a category by its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Upper-case alphabetic currency code of three or four letters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> Result<Self, TableError> {
        let code = code.trim();
        let valid = (3..=4).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic());
        if !valid {
            return Err(TableError::InvalidCurrencyCode(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = TableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Non-fatal signal that part of the result was inferred, defaulted or conflicting
///
/// Variants are declared in the order flags appear on a `ParsedExpense`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AmbiguityFlag {
    /// More than one disjoint numeric run; the first was used
    AmbiguousAmount,
    /// The amount is exactly zero
    ZeroAmount,
    /// The amount exceeded the configured maximum and was clamped
    AmountOutOfRange,
    /// Currency signals disagreed; the highest-priority one was used
    ConflictingCurrency,
    /// No currency signal; the caller default was used
    CurrencyDefaulted,
    /// No category keyword matched; `Other` was used
    CategoryDefaulted,
    /// A merchant phrase was found but rejected
    MerchantRejected,
}

impl AmbiguityFlag {
    /// Severe flags always downgrade confidence to `Low`
    pub fn is_severe(self) -> bool {
        matches!(
            self,
            Self::AmbiguousAmount | Self::ConflictingCurrency | Self::AmountOutOfRange
        )
    }

    /// Short explanation suitable for a confirmation prompt
    pub fn describe(self) -> &'static str {
        match self {
            Self::AmbiguousAmount => "several amounts were mentioned; the first one was used",
            Self::ZeroAmount => "the amount is zero",
            Self::AmountOutOfRange => "the amount was above the allowed maximum and was capped",
            Self::ConflictingCurrency => "more than one currency was mentioned",
            Self::CurrencyDefaulted => "no currency was mentioned; the default was used",
            Self::CategoryDefaulted => "no category was recognized",
            Self::MerchantRejected => "the merchant name could not be used",
        }
    }
}

/// How far a result can be trusted without user confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Structured expense draft extracted from a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpense {
    /// Non-negative amount with two decimal places
    pub amount: Decimal,
    /// One of the configured currency codes
    pub currency: CurrencyCode,
    /// Category from the closed set
    pub category: Category,
    /// Merchant with original casing, if one was recovered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    /// The original transcript, verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ordered ambiguity flags; empty iff confidence is High
    #[serde(default)]
    pub ambiguity_flags: Vec<AmbiguityFlag>,
    pub confidence: Confidence,
}

impl ParsedExpense {
    pub fn has_flag(&self, flag: AmbiguityFlag) -> bool {
        self.ambiguity_flags.contains(&flag)
    }

    /// Whether the dialog layer should confirm this record before storing it
    pub fn needs_confirmation(&self) -> bool {
        !self.ambiguity_flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_name(category.name()), Some(category));
        }
        assert_eq!(Category::from_name("food & dining"), Some(Category::FoodAndDining));
        assert_eq!(Category::from_name("Pets"), None);
    }

    #[test]
    fn test_category_serializes_display_name() {
        let json = serde_json::to_string(&Category::BillsAndUtilities).unwrap();
        assert_eq!(json, "\"Bills & Utilities\"");
    }

    #[test]
    fn test_currency_code_validation() {
        assert_eq!(CurrencyCode::parse("aed").unwrap().as_str(), "AED");
        assert_eq!(CurrencyCode::parse("USDT").unwrap().as_str(), "USDT");
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("US1").is_err());
        assert!(CurrencyCode::parse("DOLLAR").is_err());
    }

    #[test]
    fn test_currency_code_rejected_on_deserialize() {
        let result: Result<CurrencyCode, _> = serde_json::from_str("\"d$\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_flag_order_matches_declaration() {
        let mut flags = vec![
            AmbiguityFlag::MerchantRejected,
            AmbiguityFlag::AmbiguousAmount,
            AmbiguityFlag::CurrencyDefaulted,
        ];
        flags.sort();
        assert_eq!(
            flags,
            vec![
                AmbiguityFlag::AmbiguousAmount,
                AmbiguityFlag::CurrencyDefaulted,
                AmbiguityFlag::MerchantRejected,
            ]
        );
    }

    #[test]
    fn test_parsed_expense_json_shape() {
        let expense = ParsedExpense {
            amount: Decimal::new(15000, 2),
            currency: CurrencyCode::parse("AED").unwrap(),
            category: Category::Grocery,
            merchant: Some("Carrefour".to_string()),
            notes: Some("150 dirhams at Carrefour".to_string()),
            ambiguity_flags: vec![],
            confidence: Confidence::High,
        };

        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["amount"], "150.00");
        assert_eq!(value["currency"], "AED");
        assert_eq!(value["category"], "Grocery");
        assert_eq!(value["ambiguityFlags"], serde_json::json!([]));
        assert_eq!(value["confidence"], "High");
        assert!(!expense.needs_confirmation());
    }
}
