//! Tokenizer for the query language.
//!
//! Produces a flat token stream terminated by an EOF token. Keywords are
//! recognized case-insensitively but keep their original spelling; string
//! literals have no escape sequences; numbers are unsigned digit runs.
//! Unknown characters are skipped with a warning rather than failing the
//! whole query.

use common::{KiteError, KiteResult};
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Str,
    Number,
    Symbol,
    Eof,
}

/// A token with its byte position in the source, used for error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }
}

const KEYWORDS: [&str; 6] = ["CREATE", "MATCH", "WHERE", "SET", "DELETE", "RETURN"];

const SINGLE_SYMBOLS: [char; 11] = ['(', ')', '{', '}', ':', ',', '=', '-', '[', ']', '.'];

/// Tokenize a query string. The only hard failure is an unterminated
/// string literal.
pub fn tokenize(input: &str) -> KiteResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_alphabetic() {
            let word = take_while(&mut chars, |c| c.is_alphanumeric() || c == '_');
            let kind = if KEYWORDS.iter().any(|kw| word.eq_ignore_ascii_case(kw)) {
                TokenKind::Keyword
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(kind, word, pos));
            continue;
        }

        if ch.is_ascii_digit() {
            let digits = take_while(&mut chars, |c| c.is_ascii_digit());
            tokens.push(Token::new(TokenKind::Number, digits, pos));
            continue;
        }

        if ch == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    closed = true;
                    break;
                }
                value.push(c);
            }
            if !closed {
                return Err(KiteError::Parse(format!(
                    "unterminated string literal at position {pos}"
                )));
            }
            tokens.push(Token::new(TokenKind::Str, value, pos));
            continue;
        }

        if ch == '-' {
            chars.next();
            if chars.peek().is_some_and(|&(_, next)| next == '>') {
                chars.next();
                tokens.push(Token::new(TokenKind::Symbol, "->", pos));
            } else {
                tokens.push(Token::new(TokenKind::Symbol, "-", pos));
            }
            continue;
        }

        if SINGLE_SYMBOLS.contains(&ch) {
            chars.next();
            tokens.push(Token::new(TokenKind::Symbol, ch, pos));
            continue;
        }

        warn!(character = %ch, pos, "skipping unexpected character");
        chars.next();
    }

    tokens.push(Token::new(TokenKind::Eof, "", input.len()));
    Ok(tokens)
}

fn take_while(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    keep: impl Fn(char) -> bool,
) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !keep(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}
