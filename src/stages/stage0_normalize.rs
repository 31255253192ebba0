use crate::models::{ConnectorKind, Token, TokenKind};

/// Splits a raw transcript into classified, lowercased tokens
///
/// Besides the built-in single-character currency symbols, the normalizer
/// recognizes any extra symbols it is constructed with (for example
/// multi-character symbols such as `د.إ` or `Dhs` taken from the currency table).
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    /// Extra symbols, longest first
    symbols: Vec<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer that also recognizes the given currency symbols
    pub fn with_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut symbols: Vec<String> = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        symbols.dedup();
        Self { symbols }
    }

    /// Perform Stage 0: tokenize a transcript
    ///
    /// Every non-whitespace character ends up in exactly one token, in input
    /// order. A transcript with nothing but whitespace and punctuation yields
    /// an empty sequence.
    pub fn normalize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while let Some(c) = text[pos..].chars().next() {
            let rest = &text[pos..];

            if c.is_whitespace() {
                pos += c.len_utf8();
                continue;
            }

            if let Some(len) = self.match_symbol(rest) {
                tokens.push(Token::new(
                    TokenKind::CurrencySymbol,
                    rest[..len].to_lowercase(),
                    pos..pos + len,
                ));
                pos += len;
                continue;
            }

            if c.is_ascii_digit() {
                let len = scan_number(rest);
                let digits: String = rest[..len].chars().filter(|&ch| ch != ',').collect();
                tokens.push(Token::new(TokenKind::Number, digits, pos..pos + len));
                pos += len;
                continue;
            }

            // "-50" is kept as a word so that it never reads as an amount
            if c == '-' && is_word_start(text, pos) && rest[1..].starts_with(|ch: char| ch.is_ascii_digit()) {
                let len = 1 + scan_number(&rest[1..]);
                tokens.push(Token::new(TokenKind::Word, &rest[..len], pos..pos + len));
                pos += len;
                continue;
            }

            if c.is_alphabetic() {
                let len = scan_word(rest);
                let word = rest[..len].to_lowercase();
                let kind = match ConnectorKind::from_word(&word) {
                    Some(connector) => TokenKind::Connector(connector),
                    None => TokenKind::Word,
                };
                tokens.push(Token::new(kind, word, pos..pos + len));
                pos += len;
                continue;
            }

            let len = c.len_utf8();
            let kind = if is_currency_char(c) {
                TokenKind::CurrencySymbol
            } else {
                TokenKind::Punctuation
            };
            tokens.push(Token::new(kind, &rest[..len], pos..pos + len));
            pos += len;
        }

        if tokens.iter().all(Token::is_punctuation) {
            tokens.clear();
        }

        tokens
    }

    /// Length in bytes of a configured symbol at the start of `rest`
    fn match_symbol(&self, rest: &str) -> Option<usize> {
        self.symbols
            .iter()
            .find_map(|symbol| match_prefix(rest, symbol))
    }
}

/// Tokenize with the built-in symbol set only
pub fn normalize(text: &str) -> Vec<Token> {
    Normalizer::default().normalize(text)
}

/// Case-insensitive prefix match that never splits a word
fn match_prefix(rest: &str, symbol: &str) -> Option<usize> {
    let mut rest_chars = rest.char_indices();
    let mut consumed = 0;

    for sc in symbol.chars() {
        let (i, rc) = rest_chars.next()?;
        if !rc.to_lowercase().eq(sc.to_lowercase()) {
            return None;
        }
        consumed = i + rc.len_utf8();
    }

    let ends_in_letter = symbol.chars().last().is_some_and(char::is_alphabetic);
    let followed_by_letter = rest[consumed..].chars().next().is_some_and(char::is_alphabetic);
    if ends_in_letter && followed_by_letter {
        return None;
    }

    Some(consumed)
}

fn is_word_start(text: &str, pos: usize) -> bool {
    text[..pos]
        .chars()
        .next_back()
        .is_none_or(|prev| !prev.is_alphanumeric())
}

fn is_currency_char(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥' | '₹' | '﷼' | '\u{20A0}'..='\u{20CF}')
}

/// Length of a numeric literal: digits, `,` groups of three, one decimal point
fn scan_number(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = digits_from(bytes, 0);
    let mut seen_point = false;

    loop {
        match bytes.get(i) {
            Some(b',') if !seen_point => {
                if digits_from(bytes, i + 1) - (i + 1) == 3 {
                    i += 4;
                } else {
                    break;
                }
            }
            Some(b'.') if !seen_point && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                seen_point = true;
                i = digits_from(bytes, i + 1);
            }
            _ => break,
        }
    }

    i
}

fn digits_from(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

/// Length of a word: letters with inner apostrophes or hyphens
fn scan_word(s: &str) -> usize {
    let mut end = 0;
    let mut chars = s.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c.is_alphabetic() {
            end = i + c.len_utf8();
            continue;
        }
        let joins_letters = matches!(c, '\'' | '’' | '-')
            && chars.peek().is_some_and(|(_, next)| next.is_alphabetic());
        if !joins_letters {
            break;
        }
    }

    end
}
