use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::error::ParseError;
use crate::models::{CurrencyTable, ParsedExpense};

/// One line of batch output
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    /// 1-based line number in the input file
    pub line: usize,
    pub transcript: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<ParsedExpense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchRecord {
    pub fn from_result(
        line: usize,
        transcript: &str,
        result: Result<ParsedExpense, ParseError>,
    ) -> Self {
        let (expense, error) = match result {
            Ok(expense) => (Some(expense), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            line,
            transcript: transcript.to_string(),
            expense,
            error,
        }
    }
}

/// Write records as JSON lines
pub fn write_json_lines<W: Write>(mut writer: W, records: &[BatchRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record).context("Failed to write JSON")?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write records as JSON lines to a file
pub fn write_json_lines_file(path: &Path, records: &[BatchRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    write_json_lines(std::io::BufWriter::new(file), records)
}

/// Human-readable rendering of a parsed expense
pub struct ExpenseSummary<'a> {
    expense: &'a ParsedExpense,
    currencies: Option<&'a CurrencyTable>,
}

impl<'a> ExpenseSummary<'a> {
    pub fn new(expense: &'a ParsedExpense) -> Self {
        Self {
            expense,
            currencies: None,
        }
    }

    /// Use the currency table to show display names
    pub fn with_currencies(mut self, currencies: &'a CurrencyTable) -> Self {
        self.currencies = Some(currencies);
        self
    }

    pub fn format(&self) -> String {
        let expense = self.expense;
        let mut output = String::new();

        let currency_name = self
            .currencies
            .and_then(|t| t.entry(&expense.currency))
            .map(|e| format!(" ({})", e.display_name))
            .unwrap_or_default();

        output.push_str(&format!(
            "Amount:     {} {}{}\n",
            expense.amount, expense.currency, currency_name
        ));
        output.push_str(&format!("Category:   {}\n", expense.category));
        output.push_str(&format!(
            "Merchant:   {}\n",
            expense.merchant.as_deref().unwrap_or("-")
        ));
        output.push_str(&format!("Confidence: {}\n", expense.confidence));

        if expense.ambiguity_flags.is_empty() {
            output.push_str("Flags:      none\n");
        } else {
            output.push_str("Flags:\n");
            for flag in &expense.ambiguity_flags {
                output.push_str(&format!("  - {:?}: {}\n", flag, flag.describe()));
            }
        }

        output
    }
}
