//! Recursive-descent parser over the token stream.
//!
//! Grammar:
//!   expr  := INTEGER | atom | "(" ")" | "(" defun ")" | "(" if ")" | "(" op expr* ")"
//!   defun := "defun" IDENTIFIER "(" IDENTIFIER* ")" expr
//!   if    := "if" expr expr expr

use crate::ast::Expr;
use crate::error::{LvmError, LvmResult};

use super::lexer::{tokenize, Token, TokenKind};

/// Maximum nesting depth of parenthesized expressions
pub const MAX_PARSE_DEPTH: usize = 256;

/// Parse every top-level expression in `source`.
pub fn parse_program(source: &str) -> LvmResult<Vec<Expr>> {
    let tokens = tokenize(source)?;
    parse_tokens(&tokens)
}

/// Parse an already tokenized source.
pub fn parse_tokens(tokens: &[Token]) -> LvmResult<Vec<Expr>> {
    Parser::new(tokens).program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn program(&mut self) -> LvmResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        while self.peek().is_some() {
            exprs.push(self.expr(0)?);
        }
        Ok(exprs)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> LvmResult<&'a Token> {
        let token = self.tokens.get(self.pos).ok_or(LvmError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect_close(&mut self, context: &str) -> LvmResult<()> {
        let token = self.next()?;
        match token.kind {
            TokenKind::RParen => Ok(()),
            _ => Err(syntax(token, format!("expected ')' to close {}, found {}", context, token.kind))),
        }
    }

    fn expr(&mut self, depth: usize) -> LvmResult<Expr> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::Integer(n) => Ok(Expr::Integer(*n)),
            TokenKind::Identifier(name) => Ok(Expr::Symbol(name.clone())),
            TokenKind::Operator(c) => Ok(Expr::Symbol(c.to_string())),
            TokenKind::Keyword(k) if k == "nil" => Ok(Expr::Nil),
            TokenKind::Keyword(k) if k == "if" || k == "defun" => {
                Err(syntax(token, format!("'{}' cannot be used as a value", k)))
            }
            TokenKind::Keyword(k) => Ok(Expr::Symbol(k.clone())),
            TokenKind::RParen => Err(syntax(token, "unexpected ')'".to_string())),
            TokenKind::LParen => {
                if depth >= MAX_PARSE_DEPTH {
                    return Err(LvmError::NestingTooDeep {
                        max: MAX_PARSE_DEPTH,
                        line: token.line,
                    });
                }
                self.list(depth + 1)
            }
        }
    }

    /// Parse the rest of a list after its opening parenthesis
    fn list(&mut self, depth: usize) -> LvmResult<Expr> {
        let head = self.next()?;
        let name = match &head.kind {
            TokenKind::RParen => return Ok(Expr::Nil),
            TokenKind::Keyword(k) if k == "defun" => return self.defun(depth),
            TokenKind::Keyword(k) if k == "if" => return self.conditional(depth),
            TokenKind::Keyword(k) | TokenKind::Identifier(k) => k.clone(),
            TokenKind::Operator(c) => c.to_string(),
            other => {
                return Err(syntax(head, format!("expected an operator, found {}", other)));
            }
        };

        let mut args = Vec::new();
        loop {
            match self.peek() {
                Some(Token { kind: TokenKind::RParen, .. }) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => args.push(self.expr(depth)?),
                None => return Err(LvmError::UnexpectedEof),
            }
        }

        Ok(Expr::Operation { name, args })
    }

    fn defun(&mut self, depth: usize) -> LvmResult<Expr> {
        let name_token = self.next()?;
        let name = match &name_token.kind {
            TokenKind::Identifier(name) => name.clone(),
            other => {
                return Err(syntax(name_token, format!("expected a function name, found {}", other)));
            }
        };

        let open = self.next()?;
        if open.kind != TokenKind::LParen {
            return Err(syntax(open, format!("expected '(' before the parameters of {}", name)));
        }

        let mut params = Vec::new();
        loop {
            let token = self.next()?;
            match &token.kind {
                TokenKind::RParen => break,
                TokenKind::Identifier(param) => params.push(param.clone()),
                other => {
                    return Err(syntax(token, format!("expected a parameter name, found {}", other)));
                }
            }
        }

        let body = self.expr(depth)?;
        self.expect_close("defun")?;

        Ok(Expr::FunctionDefinition {
            name,
            params,
            body: Box::new(body),
        })
    }

    fn conditional(&mut self, depth: usize) -> LvmResult<Expr> {
        let cond = self.expr(depth)?;
        let then = self.expr(depth)?;
        let otherwise = self.expr(depth)?;
        self.expect_close("if")?;
        Ok(Expr::cond(cond, then, otherwise))
    }
}

fn syntax(token: &Token, message: String) -> LvmError {
    LvmError::Syntax {
        message,
        line: token.line,
    }
}
