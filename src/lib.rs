pub mod error;
pub mod extractors;
pub mod io;
pub mod models;
pub mod parser;
pub mod stages;

pub use error::{ParseError, TableError};
pub use extractors::{
    AmountExtraction, CategoryMatch, CurrencyResolution, CurrencySource, MerchantExtraction,
    ParserConfig, classify_category, detect_currency, extract_amount, extract_merchant,
};
pub use io::{BatchRecord, ExpenseSummary, builtin_tables, load_tables};
pub use models::{
    AmbiguityFlag, Category, CategoryTable, Confidence, CurrencyCode, CurrencyTable,
    KeywordTables, ParsedExpense, Token, TokenKind,
};
pub use parser::{ExpenseParser, parse, parse_with_config};
pub use stages::{Normalizer, assemble, extract, normalize};
