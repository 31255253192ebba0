use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Category, CurrencyCode};
use crate::error::TableError;
use crate::stages::normalize;

/// Schema major version this crate understands
pub const SUPPORTED_SCHEMA_MAJOR: &str = "1";

/// Versioned keyword resource as shipped in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordResource<E> {
    /// Schema version, e.g. "1.2"
    pub version: String,
    /// Date the resource was last edited
    pub last_updated: NaiveDate,
    /// Entries in canonical order
    pub entries: Vec<E>,
}

/// Currency metadata entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyEntry {
    /// Currency code, e.g. "AED"
    pub code: String,
    /// Symbol as written in text, e.g. "$" or "د.إ"
    #[serde(default)]
    pub symbol: Option<String>,
    /// Name shown to users
    pub display_name: String,
    /// Locale identifier, e.g. "ar-AE"
    #[serde(default)]
    pub locale: Option<String>,
    /// Whether the currency is usually displayed right-to-left
    #[serde(rename = "isRTL", default)]
    pub is_rtl: bool,
    /// Spoken names and synonyms, e.g. "dirhams"
    #[serde(default)]
    pub voice_keywords: Vec<String>,
}

/// Category keyword entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: Category,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A keyword split into the same lowercase tokens a transcript produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    /// Keyword as configured
    pub text: String,
    /// Token texts of the keyword
    pub words: Vec<String>,
}

impl Phrase {
    /// Tokenize a keyword; `None` if it has no content
    pub fn parse(text: &str) -> Option<Self> {
        let words: Vec<String> = normalize(text).into_iter().map(|t| t.text).collect();
        if words.is_empty() {
            return None;
        }
        Some(Self {
            text: text.trim().to_string(),
            words,
        })
    }

    /// Length in tokens
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn check_version(version: &str) -> Result<(), TableError> {
    let major = version.trim().split('.').next().unwrap_or_default();
    if major != SUPPORTED_SCHEMA_MAJOR {
        return Err(TableError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

/// Keywords for one category
#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    pub category: Category,
    pub phrases: Vec<Phrase>,
}

/// Immutable keyword-to-category table
///
/// Entry order is the canonical order used to break ties between categories.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    version: String,
    last_updated: NaiveDate,
    entries: Vec<CategoryKeywords>,
}

impl CategoryTable {
    /// Build the table from a decoded resource
    pub fn from_resource(resource: KeywordResource<CategoryEntry>) -> Result<Self, TableError> {
        check_version(&resource.version)?;

        let mut entries: Vec<CategoryKeywords> = Vec::with_capacity(resource.entries.len());
        for entry in resource.entries {
            if entries.iter().any(|e| e.category == entry.category) {
                return Err(TableError::DuplicateCategory(entry.category.to_string()));
            }
            if entry.category == Category::Other && !entry.keywords.is_empty() {
                return Err(TableError::KeywordsOnFallback);
            }

            let phrases = entry
                .keywords
                .iter()
                .map(|k| Phrase::parse(k).ok_or_else(|| TableError::EmptyKeyword(entry.category.to_string())))
                .collect::<Result<Vec<_>, _>>()?;

            entries.push(CategoryKeywords {
                category: entry.category,
                phrases,
            });
        }

        Ok(Self {
            version: resource.version,
            last_updated: resource.last_updated,
            entries,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn last_updated(&self) -> NaiveDate {
        self.last_updated
    }

    /// Entries in canonical order
    pub fn entries(&self) -> &[CategoryKeywords] {
        &self.entries
    }

    /// Total number of keyword phrases
    pub fn keyword_count(&self) -> usize {
        self.entries.iter().map(|e| e.phrases.len()).sum()
    }
}

/// Immutable currency table: codes, symbols and spoken keywords
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    version: String,
    last_updated: NaiveDate,
    entries: Vec<CurrencyEntry>,
    codes: Vec<CurrencyCode>,
    /// Lowercased symbol -> code, first entry wins
    symbols: Vec<(String, CurrencyCode)>,
    /// Keyword phrase -> code, first entry wins
    keywords: Vec<(Phrase, CurrencyCode)>,
}

impl CurrencyTable {
    /// Build the table from a decoded resource
    pub fn from_resource(resource: KeywordResource<CurrencyEntry>) -> Result<Self, TableError> {
        check_version(&resource.version)?;

        let mut codes: Vec<CurrencyCode> = Vec::with_capacity(resource.entries.len());
        let mut symbols: Vec<(String, CurrencyCode)> = Vec::new();
        let mut keywords: Vec<(Phrase, CurrencyCode)> = Vec::new();

        for entry in &resource.entries {
            let code = CurrencyCode::parse(&entry.code)?;
            if codes.contains(&code) {
                return Err(TableError::DuplicateCurrency(code.to_string()));
            }

            if let Some(symbol) = entry.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                let symbol = symbol.to_lowercase();
                match symbols.iter().find(|(s, _)| *s == symbol) {
                    Some((_, owner)) => warn!(
                        "Symbol {:?} of {} already belongs to {}, ignoring",
                        symbol, code, owner
                    ),
                    None => symbols.push((symbol, code.clone())),
                }
            }

            for keyword in &entry.voice_keywords {
                let phrase = Phrase::parse(keyword)
                    .ok_or_else(|| TableError::EmptyKeyword(code.to_string()))?;
                match keywords.iter().find(|(p, _)| p.words == phrase.words) {
                    Some((_, owner)) => warn!(
                        "Keyword {:?} of {} already belongs to {}, ignoring",
                        phrase.text, code, owner
                    ),
                    None => keywords.push((phrase, code.clone())),
                }
            }

            codes.push(code);
        }

        Ok(Self {
            version: resource.version,
            last_updated: resource.last_updated,
            entries: resource.entries,
            codes,
            symbols,
            keywords,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn last_updated(&self) -> NaiveDate {
        self.last_updated
    }

    /// Metadata entries in configured order
    pub fn entries(&self) -> &[CurrencyEntry] {
        &self.entries
    }

    pub fn codes(&self) -> &[CurrencyCode] {
        &self.codes
    }

    /// Metadata for a configured code
    pub fn entry(&self, code: &CurrencyCode) -> Option<&CurrencyEntry> {
        self.entries
            .iter()
            .find(|e| e.code.eq_ignore_ascii_case(code.as_str()))
    }

    /// Look up a configured code, ignoring case
    pub fn find_code(&self, code: &str) -> Option<&CurrencyCode> {
        let code = code.trim();
        self.codes
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
    }

    /// Code for a (lowercased) symbol
    pub fn code_for_symbol(&self, symbol: &str) -> Option<&CurrencyCode> {
        self.symbols
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, code)| code)
    }

    /// All configured symbols
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|(s, _)| s.as_str())
    }

    /// Keyword phrases with the code they map to
    pub fn keywords(&self) -> &[(Phrase, CurrencyCode)] {
        &self.keywords
    }
}

/// The pair of tables every parse call reads
#[derive(Debug, Clone)]
pub struct KeywordTables {
    pub categories: CategoryTable,
    pub currencies: CurrencyTable,
}

impl KeywordTables {
    /// Tables embedded in the crate from `resources/`
    pub fn builtin() -> anyhow::Result<Self> {
        crate::io::builtin_tables()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn currency(code: &str, symbol: Option<&str>, keywords: &[&str]) -> CurrencyEntry {
        CurrencyEntry {
            code: code.to_string(),
            symbol: symbol.map(String::from),
            display_name: code.to_string(),
            locale: None,
            is_rtl: false,
            voice_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    #[test]
    fn test_phrase_parse() {
        let phrase = Phrase::parse("  Electricity Bill ").unwrap();
        assert_eq!(phrase.text, "Electricity Bill");
        assert_eq!(phrase.words, vec!["electricity", "bill"]);
        assert_eq!(phrase.len(), 2);
        assert!(Phrase::parse("   ").is_none());
    }

    #[test]
    fn test_category_table_keeps_order() {
        let resource = KeywordResource {
            version: "1.0".to_string(),
            last_updated: date(),
            entries: vec![
                CategoryEntry {
                    category: Category::Travel,
                    keywords: vec!["flight".to_string()],
                },
                CategoryEntry {
                    category: Category::Grocery,
                    keywords: vec!["milk".to_string(), "grocery store".to_string()],
                },
            ],
        };

        let table = CategoryTable::from_resource(resource).unwrap();
        assert_eq!(table.entries()[0].category, Category::Travel);
        assert_eq!(table.entries()[1].category, Category::Grocery);
        assert_eq!(table.keyword_count(), 3);
    }

    #[test]
    fn test_category_table_rejects_bad_resources() {
        let dup = KeywordResource {
            version: "1".to_string(),
            last_updated: date(),
            entries: vec![
                CategoryEntry { category: Category::Travel, keywords: vec![] },
                CategoryEntry { category: Category::Travel, keywords: vec![] },
            ],
        };
        assert_eq!(
            CategoryTable::from_resource(dup).unwrap_err(),
            TableError::DuplicateCategory("Travel".to_string())
        );

        let fallback = KeywordResource {
            version: "1.0".to_string(),
            last_updated: date(),
            entries: vec![CategoryEntry {
                category: Category::Other,
                keywords: vec!["misc".to_string()],
            }],
        };
        assert_eq!(
            CategoryTable::from_resource(fallback).unwrap_err(),
            TableError::KeywordsOnFallback
        );

        let future = KeywordResource::<CategoryEntry> {
            version: "2.0".to_string(),
            last_updated: date(),
            entries: vec![],
        };
        assert!(matches!(
            CategoryTable::from_resource(future),
            Err(TableError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_currency_table_lookups() {
        let resource = KeywordResource {
            version: "1.1".to_string(),
            last_updated: date(),
            entries: vec![
                currency("AED", Some("د.إ"), &["dirham", "dirhams"]),
                currency("USD", Some("$"), &["dollars", "bucks"]),
                currency("CAD", Some("$"), &["canadian dollars", "dollars"]),
            ],
        };

        let table = CurrencyTable::from_resource(resource).unwrap();
        assert_eq!(table.codes().len(), 3);
        assert_eq!(table.find_code("aed").map(|c| c.as_str()), Some("AED"));
        assert_eq!(table.find_code("EUR"), None);
        // first entry owns a shared symbol or keyword
        assert_eq!(table.code_for_symbol("$").map(|c| c.as_str()), Some("USD"));
        assert_eq!(table.symbols().count(), 2);
        let dollars: Vec<_> = table
            .keywords()
            .iter()
            .filter(|(p, _)| p.text == "dollars")
            .collect();
        assert_eq!(dollars.len(), 1);
        assert_eq!(dollars[0].1.as_str(), "USD");
    }

    #[test]
    fn test_currency_table_rejects_invalid_code() {
        let resource = KeywordResource {
            version: "1.0".to_string(),
            last_updated: date(),
            entries: vec![currency("DOLLAR", None, &[])],
        };
        assert_eq!(
            CurrencyTable::from_resource(resource).unwrap_err(),
            TableError::InvalidCurrencyCode("DOLLAR".to_string())
        );
    }
}
