//! Amount extraction
//!
//! Finds numeric runs in the token stream (digit literals and spelled-out
//! cardinals) and turns the first one into the expense amount.

use std::ops::Range;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use super::ParserConfig;
use crate::models::{AmbiguityFlag, Token, TokenKind};

/// A contiguous numeric run found in the token stream
#[derive(Debug, Clone, PartialEq)]
pub struct NumericRun {
    /// Value of the run, `None` if it overflowed
    pub value: Option<Decimal>,
    /// Token indices covered by the run
    pub tokens: Range<usize>,
    /// Byte range in the original transcript
    pub span: Range<usize>,
}

/// The amount chosen for an expense
#[derive(Debug, Clone, PartialEq)]
pub struct AmountExtraction {
    /// Amount with exactly two decimal places, clamped to the configured maximum
    pub amount: Decimal,
    /// Byte range of the run the amount came from
    pub span: Range<usize>,
    /// Number of disjoint numeric runs in the transcript
    pub run_count: usize,
    /// Qualifier preceding the amount ("about", "nearly"); informational only
    pub qualifier: Option<String>,
    /// Amount-related flags
    pub flags: Vec<AmbiguityFlag>,
}

const UNITS: &[(&str, u64)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
];

const TEENS: &[(&str, u64)] = &[
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS: &[(&str, u64)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

const SCALES: &[(&str, u64)] = &[
    ("thousand", 1_000),
    ("million", 1_000_000),
    ("billion", 1_000_000_000),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberWord {
    Unit(u64),
    Teen(u64),
    Tens(u64),
    /// Hyphenated tens and unit, e.g. "twenty-three"
    Compound(u64),
    Hundred,
    Scale(u64),
}

fn lookup(table: &[(&str, u64)], word: &str) -> Option<u64> {
    table.iter().find(|(name, _)| *name == word).map(|(_, v)| *v)
}

fn classify(word: &str) -> Option<NumberWord> {
    if let Some(v) = lookup(UNITS, word) {
        return Some(NumberWord::Unit(v));
    }
    if let Some(v) = lookup(TEENS, word) {
        return Some(NumberWord::Teen(v));
    }
    if let Some(v) = lookup(TENS, word) {
        return Some(NumberWord::Tens(v));
    }
    if word == "hundred" {
        return Some(NumberWord::Hundred);
    }
    if let Some(v) = lookup(SCALES, word) {
        return Some(NumberWord::Scale(v));
    }

    let (left, right) = word.split_once('-')?;
    let tens = lookup(TENS, left)?;
    match lookup(UNITS, right)? {
        0 => None,
        unit => Some(NumberWord::Compound(tens + unit)),
    }
}

/// Whether a lowercase word is a cardinal number word
pub fn is_number_word(word: &str) -> bool {
    classify(word).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Last {
    Start,
    Unit,
    Teen,
    Tens,
    Hundred,
    Scale,
}

/// Compose a run of cardinal words starting at `start`
///
/// Returns the value (`None` on overflow) and the index one past the run,
/// or `None` if no run starts here. The run stops as soon as the next word
/// would break English numeral composition, so "one two" is two runs.
fn parse_word_run(tokens: &[Token], start: usize) -> Option<(Option<u64>, usize)> {
    let mut total: Option<u64> = Some(0);
    let mut current: Option<u64> = Some(0);
    let mut last = Last::Start;
    let mut last_scale = u64::MAX;
    let mut group_has_hundred = false;
    let mut end = start;
    let mut i = start;

    while let Some(token) = tokens.get(i) {
        if !token.is_word() {
            break;
        }
        let word = token.text.as_str();
        let next = tokens
            .get(i + 1)
            .filter(|t| t.is_word())
            .and_then(|t| classify(&t.text));

        // "one hundred and five"
        if word == "and"
            && matches!(last, Last::Hundred | Last::Scale)
            && matches!(
                next,
                Some(NumberWord::Unit(1..) | NumberWord::Teen(_) | NumberWord::Tens(_) | NumberWord::Compound(_))
            )
        {
            i += 1;
            continue;
        }

        // "a hundred", "a thousand"
        if word == "a"
            && last == Last::Start
            && matches!(next, Some(NumberWord::Hundred | NumberWord::Scale(_)))
        {
            current = Some(1);
            last = Last::Unit;
            i += 1;
            continue;
        }

        let Some(class) = classify(word) else {
            break;
        };

        let accepted = match class {
            NumberWord::Unit(v) => {
                let ok = match last {
                    Last::Start => true,
                    Last::Tens | Last::Hundred | Last::Scale => v > 0,
                    Last::Unit | Last::Teen => false,
                };
                if ok {
                    current = current.and_then(|c| c.checked_add(v));
                    last = Last::Unit;
                }
                ok
            }
            NumberWord::Teen(v) | NumberWord::Tens(v) | NumberWord::Compound(v) => {
                let ok = matches!(last, Last::Start | Last::Hundred | Last::Scale);
                if ok {
                    current = current.and_then(|c| c.checked_add(v));
                    last = match class {
                        NumberWord::Teen(_) => Last::Teen,
                        NumberWord::Tens(_) => Last::Tens,
                        _ => Last::Unit,
                    };
                }
                ok
            }
            NumberWord::Hundred => {
                let ok = matches!(last, Last::Unit | Last::Teen | Last::Tens) && !group_has_hundred;
                if ok {
                    current = current.and_then(|c| c.checked_mul(100));
                    group_has_hundred = true;
                    last = Last::Hundred;
                }
                ok
            }
            NumberWord::Scale(m) => {
                let ok = matches!(last, Last::Unit | Last::Teen | Last::Tens | Last::Hundred)
                    && m < last_scale;
                if ok {
                    let group = current.and_then(|c| c.checked_mul(m));
                    total = total.zip(group).and_then(|(t, g)| t.checked_add(g));
                    current = Some(0);
                    last_scale = m;
                    group_has_hundred = false;
                    last = Last::Scale;
                }
                ok
            }
        };

        if !accepted {
            break;
        }
        i += 1;
        end = i;
    }

    if end == start {
        return None;
    }

    let value = total.zip(current).and_then(|(t, c)| t.checked_add(c));
    Some((value, end))
}

/// Parse a digit literal plus any multiplier words that follow it
///
/// Handles "5 thousand", "2 hundred thousand" and an attached "k" ("5k").
/// Returns the value, the index one past the run and whether a multiplier was used.
fn parse_literal_run(tokens: &[Token], start: usize) -> (Option<Decimal>, usize, bool) {
    let token = &tokens[start];
    let mut value = Decimal::from_str(&token.text).ok();
    let mut end = start + 1;
    let mut multiplied = false;

    let attached_k = tokens
        .get(end)
        .is_some_and(|next| next.is_word() && next.text == "k" && next.span.start == token.span.end);
    if attached_k {
        value = value.and_then(|v| v.checked_mul(Decimal::from(1_000u64)));
        return (value, end + 1, true);
    }

    let next_class = |i: usize| {
        tokens
            .get(i)
            .filter(|t| t.is_word())
            .and_then(|t| classify(&t.text))
    };

    if next_class(end) == Some(NumberWord::Hundred) {
        value = value.and_then(|v| v.checked_mul(Decimal::from(100u64)));
        end += 1;
        multiplied = true;
    }
    if let Some(NumberWord::Scale(m)) = next_class(end) {
        value = value.and_then(|v| v.checked_mul(Decimal::from(m)));
        end += 1;
        multiplied = true;
    }

    (value, end, multiplied)
}

/// Parse a spoken decimal fraction at `start`: "point 5", "point seven five"
///
/// Returns the fraction digits and the index one past them.
fn parse_fraction(tokens: &[Token], start: usize) -> Option<(String, usize)> {
    let point = tokens.get(start)?;
    if !point.is_word() || point.text != "point" {
        return None;
    }

    if let Some(next) = tokens.get(start + 1) {
        if next.is_number() && next.text.chars().all(|c| c.is_ascii_digit()) {
            return Some((next.text.clone(), start + 2));
        }
    }

    let mut digits = String::new();
    let mut i = start + 1;
    while let Some(NumberWord::Unit(d)) = tokens
        .get(i)
        .filter(|t| t.is_word())
        .and_then(|t| classify(&t.text))
    {
        digits.push_str(&d.to_string());
        i += 1;
    }

    if digits.is_empty() {
        None
    } else {
        Some((digits, i))
    }
}

/// Find all disjoint numeric runs in token order
pub fn find_numeric_runs(tokens: &[Token]) -> Vec<NumericRun> {
    let mut runs = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        let parsed = match token.kind {
            TokenKind::Number => {
                let (value, end, multiplied) = parse_literal_run(tokens, i);
                let integral = !multiplied && !token.text.contains('.');
                Some((value, end, integral))
            }
            TokenKind::Word => {
                parse_word_run(tokens, i).map(|(value, end)| (value.map(Decimal::from), end, true))
            }
            _ => None,
        };

        let Some((mut value, mut end, fraction_allowed)) = parsed else {
            i += 1;
            continue;
        };

        if fraction_allowed {
            if let Some((digits, after)) = parse_fraction(tokens, end) {
                let combined = value.and_then(|v| Decimal::from_str(&format!("{}.{}", v, digits)).ok());
                if combined.is_some() {
                    value = combined;
                    end = after;
                }
            }
        }

        runs.push(NumericRun {
            value,
            tokens: i..end,
            span: token.span.start..tokens[end - 1].span.end,
        });
        i = end;
    }

    runs
}

/// Qualifier word directly before a run, skipping currency symbols ("about $20")
fn find_qualifier(tokens: &[Token], run_start: usize, config: &ParserConfig) -> Option<String> {
    tokens[..run_start]
        .iter()
        .rev()
        .find(|t| t.kind != TokenKind::CurrencySymbol)
        .filter(|t| t.is_word() && config.is_qualifier(&t.text))
        .map(|t| t.text.clone())
}

/// Extract the expense amount from a token stream
///
/// The first numeric run wins; further runs raise `AmbiguousAmount`.
/// Returns `None` when the transcript has no numeric content at all.
pub fn extract_amount(tokens: &[Token], config: &ParserConfig) -> Option<AmountExtraction> {
    let runs = find_numeric_runs(tokens);
    let first = runs.first()?;
    let mut flags = Vec::new();

    if runs.len() > 1 {
        debug!("{} numeric runs found, using the first", runs.len());
        flags.push(AmbiguityFlag::AmbiguousAmount);
    }

    // a maximum with more than two places must not round up past itself
    let max_amount = config
        .max_amount
        .round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let rounded = first
        .value
        .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));
    let mut amount = match rounded {
        Some(v) if v <= max_amount => v,
        _ => {
            debug!("Amount {:?} exceeds maximum {}, clamping", rounded, max_amount);
            flags.push(AmbiguityFlag::AmountOutOfRange);
            max_amount
        }
    };

    if amount.is_zero() {
        flags.push(AmbiguityFlag::ZeroAmount);
    }
    amount.rescale(2);

    Some(AmountExtraction {
        amount,
        span: first.span.clone(),
        run_count: runs.len(),
        qualifier: find_qualifier(tokens, first.tokens.start, config),
        flags,
    })
}
