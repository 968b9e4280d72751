//! Tokenizer for the CLI filter/format mini-language (spec.md Section 6:
//! "`section: field1, field2=value, …` where each argument is one section;
//! value tokens include identifiers, quoted strings, regex literals, and
//! path literals").

use crate::error::{ExprError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    QuotedString(String),
    Regex(String),
    Colon,
    Comma,
    Equals,
    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier {s:?}"),
            Token::QuotedString(s) => format!("string {s:?}"),
            Token::Regex(s) => format!("regex /{s}/"),
            Token::Colon => "':'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Equals => "'='".to_string(),
            Token::Eof => "end of expression".to_string(),
        }
    }
}

/// Lazily tokenizes an expression string, one `Token` per call to `next`.
pub struct Lexer<'a> {
    src: &'a str,
    chars: std::str::CharIndices<'a>,
    peeked: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices(),
            peeked: None,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.peeked.take().or_else(|| self.chars.next())
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn skip_whitespace(&mut self) {
        while let Some((_, c)) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn read_while(&mut self, start: usize, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let mut end = start;
        while let Some((idx, c)) = self.peek() {
            if pred(c) {
                end = idx + c.len_utf8();
                self.bump();
            } else {
                break;
            }
        }
        &self.src[start..end]
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let Some((idx, c)) = self.bump() else {
            return Ok(Token::Eof);
        };
        match c {
            ':' => Ok(Token::Colon),
            ',' => Ok(Token::Comma),
            '=' => Ok(Token::Equals),
            '"' => self.read_quoted_string(idx),
            '/' => self.read_regex(idx),
            c if is_ident_start(c) => {
                let word = self.read_while(idx, is_ident_continue);
                Ok(Token::Ident(word.to_string()))
            }
            other => Err(ExprError::UnexpectedChar(other, idx)),
        }
    }

    fn read_quoted_string(&mut self, start: usize) -> Result<Token> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some((_, '"')) => return Ok(Token::QuotedString(out)),
                Some((_, '\\')) => match self.bump() {
                    Some((_, escaped)) => out.push(escaped),
                    None => return Err(ExprError::UnterminatedString(start)),
                },
                Some((_, c)) => out.push(c),
                None => return Err(ExprError::UnterminatedString(start)),
            }
        }
    }

    fn read_regex(&mut self, start: usize) -> Result<Token> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some((_, '/')) => return Ok(Token::Regex(out)),
                Some((_, '\\')) => {
                    out.push('\\');
                    match self.bump() {
                        Some((_, escaped)) => out.push(escaped),
                        None => return Err(ExprError::UnterminatedRegex(start)),
                    }
                }
                Some((_, c)) => out.push(c),
                None => return Err(ExprError::UnterminatedRegex(start)),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c == '/'
}
