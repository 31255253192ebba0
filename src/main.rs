use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use expense_parser::{
    BatchRecord, ExpenseParser, ExpenseSummary, KeywordTables, ParserConfig, load_tables,
};

#[derive(Parser)]
#[command(name = "expense-parser")]
#[command(author, version, about = "Turn spoken expense transcripts into structured records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single transcript
    Parse {
        /// Transcript text
        #[arg(short, long)]
        text: String,

        /// Currency to use when the transcript names none
        #[arg(short, long, default_value = "AED")]
        default_currency: String,

        /// Category keyword resource (JSON); built-in table if omitted
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Currency resource (JSON); built-in table if omitted
        #[arg(long)]
        currencies: Option<PathBuf>,

        /// Largest accepted amount
        #[arg(long)]
        max_amount: Option<Decimal>,

        /// Maximum merchant length in characters
        #[arg(long)]
        max_merchant_len: Option<usize>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse a file with one transcript per line into JSON lines
    Batch {
        /// Input file, one transcript per line
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (JSON lines); stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Currency to use when a transcript names none
        #[arg(short, long, default_value = "AED")]
        default_currency: String,

        /// Category keyword resource (JSON); built-in table if omitted
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Currency resource (JSON); built-in table if omitted
        #[arg(long)]
        currencies: Option<PathBuf>,

        /// Maximum number of transcripts parsed at the same time
        #[arg(long, default_value = "64", value_parser = clap::value_parser!(u64).range(1..))]
        jobs: u64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the loaded keyword tables
    Tables {
        /// Category keyword resource (JSON); built-in table if omitted
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Currency resource (JSON); built-in table if omitted
        #[arg(long)]
        currencies: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            text,
            default_currency,
            categories,
            currencies,
            max_amount,
            max_merchant_len,
            json,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = ParserConfig::from_env()?;
            if let Some(max_amount) = max_amount {
                config.max_amount = max_amount;
            }
            if let Some(max_merchant_len) = max_merchant_len {
                config.max_merchant_len = max_merchant_len;
            }
            config.validate()?;

            let tables = load_tables(categories.as_deref(), currencies.as_deref())?;
            parse_one(ExpenseParser::new(tables, config), &text, &default_currency, json)
        }
        Commands::Batch {
            input,
            output,
            default_currency,
            categories,
            currencies,
            jobs,
            verbose,
        } => {
            setup_logging(verbose);
            let config = ParserConfig::from_env()?;
            let tables = load_tables(categories.as_deref(), currencies.as_deref())?;
            let parser = ExpenseParser::new(tables, config);
            let jobs = usize::try_from(jobs).context("--jobs is too large")?;
            parse_batch(parser, &input, output.as_deref(), &default_currency, jobs).await
        }
        Commands::Tables {
            categories,
            currencies,
            verbose,
        } => {
            setup_logging(verbose);
            let tables = load_tables(categories.as_deref(), currencies.as_deref())?;
            show_tables(&tables);
            Ok(())
        }
    }
}

/// Log to stderr so stdout stays machine-readable; `RUST_LOG` overrides the level
fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn parse_one(parser: ExpenseParser, text: &str, default_currency: &str, json: bool) -> Result<()> {
    let expense = match parser.parse(text, default_currency) {
        Ok(expense) => expense,
        Err(e) => {
            info!("Clarification: {}", e.clarification_prompt());
            anyhow::bail!("Failed to parse transcript: {}", e);
        }
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(&expense).context("Failed to serialize expense")?;
        println!("{}", rendered);
    } else {
        print!(
            "{}",
            ExpenseSummary::new(&expense)
                .with_currencies(&parser.tables().currencies)
                .format()
        );
    }

    Ok(())
}

async fn parse_batch(
    parser: ExpenseParser,
    input: &Path,
    output: Option<&Path>,
    default_currency: &str,
    jobs: usize,
) -> Result<()> {
    info!("Loading transcripts from {:?}", input);
    let content = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read file: {:?}", input))?;

    let lines: Vec<(usize, String)> = content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim().to_string()))
        .filter(|(_, line)| !line.is_empty())
        .collect();
    info!("Parsing {} transcripts, {} at a time", lines.len(), jobs);

    let records = parse_lines(Arc::new(parser), lines, default_currency, jobs).await?;

    let failed = records.iter().filter(|r| r.error.is_some()).count();
    let flagged = records
        .iter()
        .filter_map(|r| r.expense.as_ref())
        .filter(|e| e.needs_confirmation())
        .count();
    if failed > 0 {
        warn!("{} of {} transcripts could not be parsed", failed, records.len());
    }

    match output {
        Some(path) => {
            expense_parser::io::write_json_lines_file(path, &records)?;
            info!("Output written to {:?}", path);
        }
        None => expense_parser::io::write_json_lines(std::io::stdout().lock(), &records)?,
    }

    info!(
        "Complete: {} parsed, {} need confirmation, {} failed",
        records.len() - failed,
        flagged,
        failed
    );

    Ok(())
}

/// Parse numbered lines on the blocking pool, at most `jobs` at a time
///
/// Records come back in input order.
async fn parse_lines(
    parser: Arc<ExpenseParser>,
    lines: Vec<(usize, String)>,
    default_currency: &str,
    jobs: usize,
) -> Result<Vec<BatchRecord>> {
    let mut records = Vec::with_capacity(lines.len());

    for chunk in lines.chunks(jobs.max(1)) {
        let handles: Vec<_> = chunk
            .iter()
            .cloned()
            .map(|(line, transcript)| {
                let parser = Arc::clone(&parser);
                let default_currency = default_currency.to_string();
                tokio::task::spawn_blocking(move || {
                    let result = parser.parse(&transcript, &default_currency);
                    BatchRecord::from_result(line, &transcript, result)
                })
            })
            .collect();

        for handle in handles {
            records.push(handle.await.context("Parse task failed")?);
        }
    }

    Ok(records)
}

fn show_tables(tables: &KeywordTables) {
    let categories = &tables.categories;
    let currencies = &tables.currencies;

    println!("Categories");
    println!("==========");
    println!(
        "Version {} (updated {})",
        categories.version(),
        categories.last_updated()
    );
    for entry in categories.entries() {
        println!("{:<20} {} keywords", entry.category, entry.phrases.len());
    }
    println!();

    println!("Currencies");
    println!("==========");
    println!(
        "Version {} (updated {})",
        currencies.version(),
        currencies.last_updated()
    );
    for entry in currencies.entries() {
        println!(
            "{:<5} {:<6} {:<20} {} keywords{}",
            entry.code,
            entry.symbol.as_deref().unwrap_or("-"),
            entry.display_name,
            entry.voice_keywords.len(),
            if entry.is_rtl { " (RTL)" } else { "" }
        );
    }
}
