//! Tokenizer for the parenthesized-prefix syntax.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, recognize},
    sequence::pair,
    IResult, Parser,
};

use crate::error::{LvmError, LvmResult};

/// Reserved words. Matched case-insensitively and stored lowercased.
pub const RESERVED: &[&str] = &[
    "div", "mod", "gt", "lt", "geq", "leq", "eq", "neq", "cond", "and", "or", "not", "defun",
    "nil", "car", "cdr", "cons", "if", "print",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Integer(i64),
    /// One of `+ - * /`
    Operator(char),
    Keyword(String),
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => f.write_str("LPAREN ("),
            TokenKind::RParen => f.write_str("RPAREN )"),
            TokenKind::Integer(n) => write!(f, "INTEGER {}", n),
            TokenKind::Operator(c) => write!(f, "OPERATOR {}", c),
            TokenKind::Keyword(k) => write!(f, "{} {}", k.to_ascii_uppercase(), k),
            TokenKind::Identifier(name) => write!(f, "IDENTIFIER {}", name),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

enum Lexeme<'a> {
    Open,
    Close,
    Digits(&'a str),
    Operator(char),
    Word(&'a str),
}

fn lexeme(input: &str) -> IResult<&str, Lexeme<'_>> {
    alt((
        map(char('('), |_| Lexeme::Open),
        map(char(')'), |_| Lexeme::Close),
        map(digit1, Lexeme::Digits),
        map(one_of("+-*/"), Lexeme::Operator),
        map(
            recognize(pair(
                take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
                take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            )),
            Lexeme::Word,
        ),
    ))
    .parse(input)
}

/// Split source text into tokens, tracking 1-based line numbers.
pub fn tokenize(source: &str) -> LvmResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut rest = source;

    loop {
        let skipped = rest.trim_start_matches(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n');
        line += rest[..rest.len() - skipped.len()].matches('\n').count();
        rest = skipped;

        let Some(ch) = rest.chars().next() else {
            break;
        };

        let (remaining, lex) = lexeme(rest).map_err(|_| LvmError::IllegalCharacter { ch, line })?;
        let kind = match lex {
            Lexeme::Open => TokenKind::LParen,
            Lexeme::Close => TokenKind::RParen,
            Lexeme::Digits(text) => {
                let n = text.parse::<i64>().map_err(|_| LvmError::IntegerOutOfRange {
                    text: text.to_string(),
                    line,
                })?;
                TokenKind::Integer(n)
            }
            Lexeme::Operator(c) => TokenKind::Operator(c),
            Lexeme::Word(word) => {
                let lower = word.to_ascii_lowercase();
                if RESERVED.contains(&lower.as_str()) {
                    TokenKind::Keyword(lower)
                } else {
                    TokenKind::Identifier(word.to_string())
                }
            }
        };

        tokens.push(Token { kind, line });
        rest = remaining;
    }

    Ok(tokens)
}
