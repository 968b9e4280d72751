//! Parser for the CLI filter/format mini-language (spec.md Section 6).
//!
//! Produces a section-agnostic `Expression` tree; `filter`/`format` turn
//! that into their typed, recognized-field shape the way
//! `spectree-path::parse_expression` turns a transform string into a
//! `PathTransformation` — same two-stage "generic parse, then interpret"
//! split.

use crate::error::{ExprError, Result};
use crate::lexer::{Lexer, Token};
use regex::Regex;

/// One value a field may be bound to.
#[derive(Debug, Clone)]
pub enum Value {
    Ident(String),
    String(String),
    Regex(Regex),
    Path(String),
}

/// One `field` or `field=value` argument within a section.
#[derive(Debug, Clone)]
pub struct Arg {
    pub field: String,
    pub value: Option<Value>,
}

/// A fully parsed `section: arg, arg, …` expression.
#[derive(Debug, Clone)]
pub struct Expression {
    pub section: String,
    pub args: Vec<Arg>,
}

pub fn parse(src: &str) -> Result<Expression> {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return Err(ExprError::Empty);
    }
    let mut lexer = Lexer::new(trimmed);
    let section = expect_ident(&mut lexer)?;
    expect(&mut lexer, Token::Colon)?;

    let mut args = Vec::new();
    loop {
        let field = expect_ident(&mut lexer)?;
        let tok = lexer.next_token()?;
        let (value, next) = match tok {
            Token::Equals => {
                let value_tok = lexer.next_token()?;
                let value = token_to_value(value_tok)?;
                (Some(value), lexer.next_token()?)
            }
            other => (None, other),
        };
        args.push(Arg { field, value });
        match next {
            Token::Comma => continue,
            Token::Eof => break,
            other => return Err(ExprError::UnexpectedToken("',' or end", other.describe())),
        }
    }

    Ok(Expression { section, args })
}

fn token_to_value(tok: Token) -> Result<Value> {
    match tok {
        Token::Ident(s) if s.contains('/') || s.contains('.') => Ok(Value::Path(s)),
        Token::Ident(s) => Ok(Value::Ident(s)),
        Token::QuotedString(s) => Ok(Value::String(s)),
        Token::Regex(pattern) => Ok(Value::Regex(Regex::new(&pattern)?)),
        other => Err(ExprError::UnexpectedToken("a value", other.describe())),
    }
}

fn expect_ident(lexer: &mut Lexer<'_>) -> Result<String> {
    match lexer.next_token()? {
        Token::Ident(s) => Ok(s),
        other => Err(ExprError::UnexpectedToken("an identifier", other.describe())),
    }
}

fn expect(lexer: &mut Lexer<'_>, want: Token) -> Result<()> {
    let got = lexer.next_token()?;
    if got == want {
        Ok(())
    } else {
        Err(ExprError::UnexpectedToken("':'", got.describe()))
    }
}
