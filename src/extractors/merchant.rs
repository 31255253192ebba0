use std::ops::Range;

use tracing::debug;

use super::{ParserConfig, is_number_word};
use crate::models::{AmbiguityFlag, Token};

/// Result of merchant extraction
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MerchantExtraction {
    /// Merchant with original casing
    pub merchant: Option<String>,
    /// Token indices of the candidate phrase, accepted or rejected
    pub tokens: Option<Range<usize>>,
    /// `MerchantRejected` when a candidate was found but not usable
    pub flags: Vec<AmbiguityFlag>,
}

/// Capitalized number words ("Five Guys") are part of a name, lowercase ones
/// start an amount
fn is_merchant_word(token: &Token, text: &str, config: &ParserConfig) -> bool {
    if !token.is_word() || config.is_qualifier(&token.text) {
        return false;
    }
    !is_number_word(&token.text) || is_capitalized(token.original(text))
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Extract the merchant following "at" or "from"
///
/// Collects words after the first such connector up to the next connector,
/// punctuation, number or end of input. Trailing stop-words ("today") are
/// dropped. The candidate is rejected if it is only stop-words or longer than
/// `max_merchant_len` characters, or if it starts with a lowercase number word
/// followed by more words ("at five guys").
pub fn extract_merchant(tokens: &[Token], text: &str, config: &ParserConfig) -> MerchantExtraction {
    for (i, token) in tokens.iter().enumerate() {
        if !token.connector().is_some_and(|c| c.introduces_merchant()) {
            continue;
        }

        let start = i + 1;
        let mut end = start
            + tokens[start..]
                .iter()
                .take_while(|t| is_merchant_word(t, text, config))
                .count();
        if end == start {
            if let Some(range) = number_led_candidate(tokens, start, text, config) {
                debug!("Merchant candidate {:?} starts with a number word", range);
                return rejected(range);
            }
            continue;
        }
        let range = start..end;

        while end > start && config.is_merchant_stop_word(&tokens[end - 1].text) {
            end -= 1;
        }
        if end == start {
            debug!("Merchant candidate {:?} is only stop-words", range);
            return rejected(range);
        }

        let name = tokens[start..end]
            .iter()
            .map(|t| t.original(text))
            .collect::<Vec<_>>()
            .join(" ");

        if name.chars().count() > config.max_merchant_len {
            debug!(
                "Merchant candidate is {} characters, limit is {}",
                name.chars().count(),
                config.max_merchant_len
            );
            return rejected(range);
        }

        debug!("Merchant {:?}", name);
        return MerchantExtraction {
            merchant: Some(name),
            tokens: Some(start..end),
            flags: vec![],
        };
    }

    MerchantExtraction::default()
}

/// Range of a "number word + name words" phrase at `start`, if there is one
///
/// A lone number word ("at five") reads as a time and yields `None`.
fn number_led_candidate(
    tokens: &[Token],
    start: usize,
    text: &str,
    config: &ParserConfig,
) -> Option<Range<usize>> {
    tokens
        .get(start)
        .filter(|t| t.is_word() && is_number_word(&t.text))?;
    let rest: Vec<&Token> = tokens[start + 1..]
        .iter()
        .take_while(|t| is_merchant_word(t, text, config) && !is_number_word(&t.text))
        .collect();
    let has_name = rest.iter().any(|t| !config.is_merchant_stop_word(&t.text));
    has_name.then(|| start..start + 1 + rest.len())
}

fn rejected(range: Range<usize>) -> MerchantExtraction {
    MerchantExtraction {
        merchant: None,
        tokens: Some(range),
        flags: vec![AmbiguityFlag::MerchantRejected],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::normalize;

    fn merchant_of(text: &str) -> MerchantExtraction {
        extract_merchant(&normalize(text), text, &ParserConfig::default())
    }

    #[test]
    fn test_merchant_after_at() {
        let result = merchant_of("I spent 150 dirhams on groceries at Carrefour");
        assert_eq!(result.merchant.as_deref(), Some("Carrefour"));
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_merchant_keeps_original_casing_and_single_spaces() {
        let result = merchant_of("coffee from   Blue  Bottle Café, 20 dollars");
        assert_eq!(result.merchant.as_deref(), Some("Blue Bottle Café"));
    }

    #[test]
    fn test_merchant_stops_at_connector_and_numbers() {
        let result = merchant_of("lunch at Shake Shack for 45");
        assert_eq!(result.merchant.as_deref(), Some("Shake Shack"));

        let result = merchant_of("at Lulu twenty dirhams");
        assert_eq!(result.merchant.as_deref(), Some("Lulu"));
    }

    #[test]
    fn test_trailing_stop_words_dropped() {
        let result = merchant_of("50 at Spinneys yesterday");
        assert_eq!(result.merchant.as_deref(), Some("Spinneys"));
    }

    #[test]
    fn test_no_connector_means_no_merchant() {
        let result = merchant_of("I just spent twenty dollars for lunch");
        assert_eq!(result, MerchantExtraction::default());

        // a connector with nothing usable after it
        let result = merchant_of("20 at 5pm");
        assert!(result.merchant.is_none());
        assert!(result.flags.is_empty());
    }

    #[test]
    fn test_capitalized_number_word_is_part_of_name() {
        let result = merchant_of("I spent 20 dirhams on burgers at Five Guys");
        assert_eq!(result.merchant.as_deref(), Some("Five Guys"));
        assert!(result.flags.is_empty());

        let result = merchant_of("dinner at The Three Crowns for 80");
        assert_eq!(result.merchant.as_deref(), Some("The Three Crowns"));
    }

    #[test]
    fn test_lowercase_number_led_name_is_rejected() {
        let result = merchant_of("20 dirhams on burgers at five guys");
        assert!(result.merchant.is_none());
        assert_eq!(result.flags, vec![AmbiguityFlag::MerchantRejected]);
        assert_eq!(result.tokens, Some(5..7));

        // a bare number word after the connector reads as a time
        let result = merchant_of("lunch at one");
        assert_eq!(result, MerchantExtraction::default());
    }

    #[test]
    fn test_stop_words_only_is_rejected() {
        let result = merchant_of("paid 30 from my card");
        assert!(result.merchant.is_none());
        assert_eq!(result.flags, vec![AmbiguityFlag::MerchantRejected]);
    }

    #[test]
    fn test_too_long_is_rejected() {
        let config = ParserConfig {
            max_merchant_len: 10,
            ..Default::default()
        };
        let text = "50 at The Very Long Merchant Name";
        let result = extract_merchant(&normalize(text), text, &config);
        assert!(result.merchant.is_none());
        assert_eq!(result.flags, vec![AmbiguityFlag::MerchantRejected]);
        assert_eq!(result.tokens, Some(2..7));
    }
}
