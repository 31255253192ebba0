use std::ops::Range;

use tracing::debug;

use super::find_phrase;
use crate::models::{AmbiguityFlag, Category, CategoryTable, Token};

/// Result of category classification
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub category: Category,
    /// The configured keyword that matched, if any
    pub keyword: Option<String>,
    /// Token indices of the matched keyword
    pub tokens: Option<Range<usize>>,
    /// `CategoryDefaulted` when nothing matched
    pub flags: Vec<AmbiguityFlag>,
}

impl CategoryMatch {
    pub fn is_default(&self) -> bool {
        self.keyword.is_none()
    }
}

/// Classify a transcript into a category
///
/// The longest matching keyword phrase wins. Between phrases of equal length,
/// the category that comes first in the table wins. No match yields `Other`
/// with `CategoryDefaulted`.
pub fn classify_category(tokens: &[Token], table: &CategoryTable) -> CategoryMatch {
    let mut best: Option<(Category, &str, Range<usize>)> = None;

    for entry in table.entries() {
        for phrase in &entry.phrases {
            let Some(start) = find_phrase(tokens, &phrase.words) else {
                continue;
            };
            let longer = best
                .as_ref()
                .is_none_or(|(_, _, range)| phrase.len() > range.len());
            if longer {
                best = Some((entry.category, phrase.text.as_str(), start..start + phrase.len()));
            }
        }
    }

    match best {
        Some((category, keyword, range)) => {
            debug!("Category {} from keyword {:?}", category, keyword);
            CategoryMatch {
                category,
                keyword: Some(keyword.to_string()),
                tokens: Some(range),
                flags: vec![],
            }
        }
        None => {
            debug!("No category keyword matched, defaulting to {}", Category::Other);
            CategoryMatch {
                category: Category::Other,
                keyword: None,
                tokens: None,
                flags: vec![AmbiguityFlag::CategoryDefaulted],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_category_json;
    use crate::stages::normalize;

    const CATEGORIES: &str = r#"{
        "version": "1.0",
        "lastUpdated": "2024-03-01",
        "entries": [
            {"category": "Grocery", "keywords": ["grocery", "supermarket"]},
            {"category": "Food & Dining", "keywords": ["lunch", "restaurant bill", "coffee"]},
            {"category": "Bills & Utilities", "keywords": ["bill", "electricity"]},
            {"category": "Other", "keywords": []}
        ]
    }"#;

    fn classify(text: &str) -> CategoryMatch {
        let table = parse_category_json(CATEGORIES).unwrap();
        classify_category(&normalize(text), &table)
    }

    #[test]
    fn test_single_keyword() {
        let result = classify("I just spent twenty dollars for lunch");
        assert_eq!(result.category, Category::FoodAndDining);
        assert_eq!(result.keyword.as_deref(), Some("lunch"));
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_plural_keyword() {
        let result = classify("150 on groceries");
        assert_eq!(result.category, Category::Grocery);
    }

    #[test]
    fn test_canonical_order_breaks_ties() {
        // coffee (Food & Dining) and supermarket (Grocery) are both one word
        let result = classify("coffee from the supermarket");
        assert_eq!(result.category, Category::Grocery);

        let result = classify("the electricity bill and a coffee");
        assert_eq!(result.category, Category::FoodAndDining);
    }

    #[test]
    fn test_longer_phrase_beats_canonical_order() {
        let result = classify("paid the restaurant bill");
        assert_eq!(result.category, Category::FoodAndDining);
        assert_eq!(result.keyword.as_deref(), Some("restaurant bill"));
        assert_eq!(result.tokens, Some(2..4));

        let result = classify("paid the bill");
        assert_eq!(result.category, Category::BillsAndUtilities);
    }

    #[test]
    fn test_word_boundary_match_only() {
        // "billing" must not match "bill"
        let result = classify("50 for billing");
        assert_eq!(result.category, Category::Other);
    }

    #[test]
    fn test_no_match_defaults_to_other() {
        let result = classify("50");
        assert_eq!(result.category, Category::Other);
        assert!(result.is_default());
        assert_eq!(result.flags, vec![AmbiguityFlag::CategoryDefaulted]);
    }
}
