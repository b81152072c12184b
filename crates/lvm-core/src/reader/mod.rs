//! Source reader: tokenizer and parser producing `Expr` trees.

pub mod lexer;
pub mod parser;

pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse_program, parse_tokens, MAX_PARSE_DEPTH};
