use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::{
    CategoryEntry, CategoryTable, CurrencyEntry, CurrencyTable, KeywordResource, KeywordTables,
};

const BUILTIN_CATEGORIES: &str = include_str!("../../resources/categories.json");
const BUILTIN_CURRENCIES: &str = include_str!("../../resources/currencies.json");

/// Parse a category keyword resource from a JSON string
pub fn parse_category_json(json: &str) -> Result<CategoryTable> {
    let resource: KeywordResource<CategoryEntry> =
        serde_json::from_str(json).context("Failed to parse category keyword JSON")?;
    let table = CategoryTable::from_resource(resource).context("Invalid category keyword resource")?;
    Ok(table)
}

/// Parse a currency resource from a JSON string
pub fn parse_currency_json(json: &str) -> Result<CurrencyTable> {
    let resource: KeywordResource<CurrencyEntry> =
        serde_json::from_str(json).context("Failed to parse currency JSON")?;
    let table = CurrencyTable::from_resource(resource).context("Invalid currency resource")?;
    Ok(table)
}

/// Load a category keyword resource from a file
pub fn load_category_file(path: &Path) -> Result<CategoryTable> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let table =
        parse_category_json(&content).with_context(|| format!("Failed to load {:?}", path))?;
    info!(
        "Loaded {} categories ({} keywords), version {} from {:?}",
        table.entries().len(),
        table.keyword_count(),
        table.version(),
        path
    );
    Ok(table)
}

/// Load a currency resource from a file
pub fn load_currency_file(path: &Path) -> Result<CurrencyTable> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let table =
        parse_currency_json(&content).with_context(|| format!("Failed to load {:?}", path))?;
    info!(
        "Loaded {} currencies, version {} from {:?}",
        table.codes().len(),
        table.version(),
        path
    );
    Ok(table)
}

/// Keyword tables embedded in the crate
pub fn builtin_tables() -> Result<KeywordTables> {
    Ok(KeywordTables {
        categories: parse_category_json(BUILTIN_CATEGORIES).context("Built-in category table")?,
        currencies: parse_currency_json(BUILTIN_CURRENCIES).context("Built-in currency table")?,
    })
}

/// Load tables from files, using the built-in resource for any path not given
pub fn load_tables(categories: Option<&Path>, currencies: Option<&Path>) -> Result<KeywordTables> {
    let categories = match categories {
        Some(path) => load_category_file(path)?,
        None => parse_category_json(BUILTIN_CATEGORIES).context("Built-in category table")?,
    };
    let currencies = match currencies {
        Some(path) => load_currency_file(path)?,
        None => parse_currency_json(BUILTIN_CURRENCIES).context("Built-in currency table")?,
    };
    Ok(KeywordTables {
        categories,
        currencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::models::Category;

    #[test]
    fn test_builtin_tables_load() {
        let tables = builtin_tables().unwrap();

        assert_eq!(tables.categories.entries()[0].category, Category::Grocery);
        assert_eq!(
            tables.categories.entries().last().unwrap().category,
            Category::Other
        );
        assert!(tables.currencies.find_code("AED").is_some());
        assert!(tables.currencies.find_code("USD").is_some());
        assert_eq!(tables.currencies.version(), "1.0");
    }

    #[test]
    fn test_builtin_categories_cover_closed_set() {
        let tables = builtin_tables().unwrap();
        let listed: Vec<Category> = tables
            .categories
            .entries()
            .iter()
            .map(|e| e.category)
            .collect();
        assert_eq!(listed, Category::ALL.to_vec());
    }

    #[test]
    fn test_unknown_category_fails() {
        let json = r#"{
            "version": "1.0",
            "lastUpdated": "2024-03-01",
            "entries": [{"category": "Pets", "keywords": ["dog food"]}]
        }"#;
        assert!(parse_category_json(json).is_err());
    }

    #[test]
    fn test_bad_date_fails() {
        let json = r#"{"version": "1.0", "lastUpdated": "yesterday", "entries": []}"#;
        assert!(parse_currency_json(json).is_err());
    }

    #[test]
    fn test_load_from_files() {
        let mut categories = tempfile::NamedTempFile::new().unwrap();
        write!(
            categories,
            r#"{{"version": "1.3", "lastUpdated": "2024-05-20",
                "entries": [{{"category": "Travel", "keywords": ["ferry"]}}]}}"#
        )
        .unwrap();

        let mut currencies = tempfile::NamedTempFile::new().unwrap();
        write!(
            currencies,
            r#"{{"version": "1.0", "lastUpdated": "2024-05-20",
                "entries": [{{"code": "OMR", "symbol": "ر.ع.", "displayName": "Omani Rial",
                              "voiceKeywords": ["omani rial"]}}]}}"#
        )
        .unwrap();

        let tables = load_tables(Some(categories.path()), Some(currencies.path())).unwrap();
        assert_eq!(tables.categories.version(), "1.3");
        assert_eq!(tables.categories.keyword_count(), 1);
        assert_eq!(tables.currencies.codes()[0].as_str(), "OMR");
        assert!(tables.currencies.entries()[0].locale.is_none());
    }

    #[test]
    fn test_missing_file_fails() {
        let result = load_tables(Some(Path::new("/nonexistent/categories.json")), None);
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Failed to read file"));
    }
}
