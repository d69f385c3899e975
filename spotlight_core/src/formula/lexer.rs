// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Character whitelist and tokenizer.

use super::FormulaError;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
}

/// Returns `true` for characters a formula may contain at all.
pub(crate) fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_ascii_whitespace()
        || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.' | ',' | '%' | '_')
}

/// Rejects the whole source if any character is outside the whitelist.
pub(crate) fn check_whitelist(src: &str) -> Result<(), FormulaError> {
    match src.char_indices().find(|&(_, c)| !is_allowed(c)) {
        Some((offset, ch)) => Err(FormulaError::Rejected { ch, offset }),
        None => Ok(()),
    }
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    check_whitelist(src)?;

    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b if b.is_ascii_whitespace() => i += 1,
            b'+' => push(&mut tokens, &mut i, Token::Plus),
            b'-' => push(&mut tokens, &mut i, Token::Minus),
            b'*' => push(&mut tokens, &mut i, Token::Star),
            b'/' => push(&mut tokens, &mut i, Token::Slash),
            b'%' => push(&mut tokens, &mut i, Token::Percent),
            b'(' => push(&mut tokens, &mut i, Token::LParen),
            b')' => push(&mut tokens, &mut i, Token::RParen),
            b',' => push(&mut tokens, &mut i, Token::Comma),
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let text = &src[start..i];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FormulaError::BadNumber(text.into()))?;
                tokens.push(Token::Number(value));
            }
            b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token::Ident(src[start..i].into()));
            }
            // The whitelist admits only ASCII, so every byte is handled above.
            _ => {
                return Err(FormulaError::Rejected {
                    ch: char::from(b),
                    offset: i,
                });
            }
        }
    }
    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token) {
    tokens.push(token);
    *i += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_mixed_input() {
        let tokens = tokenize("(rent + 1.5) * max(a_1, .5)").unwrap();
        assert_eq!(
            tokens,
            [
                Token::LParen,
                Token::Ident("rent".into()),
                Token::Plus,
                Token::Number(1.5),
                Token::RParen,
                Token::Star,
                Token::Ident("max".into()),
                Token::LParen,
                Token::Ident("a_1".into()),
                Token::Comma,
                Token::Number(0.5),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn rejects_first_foreign_character() {
        assert_eq!(
            tokenize("(rent); fetch('evil')"),
            Err(FormulaError::Rejected { ch: ';', offset: 6 })
        );
        assert!(matches!(
            tokenize("a = 1"),
            Err(FormulaError::Rejected { ch: '=', .. })
        ));
        assert!(matches!(
            tokenize("家賃 + 1"),
            Err(FormulaError::Rejected { offset: 0, .. })
        ));
    }

    #[test]
    fn malformed_number_is_an_error() {
        assert_eq!(
            tokenize("1.2.3"),
            Err(FormulaError::BadNumber("1.2.3".into()))
        );
        assert_eq!(tokenize("."), Err(FormulaError::BadNumber(".".into())));
    }
}
