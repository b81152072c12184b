//! Expression Tree
//!
//! The parsed form of one top-level source expression. Produced once by the
//! reader and never mutated afterwards.

use std::fmt;

/// Parsed source expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Integer(i64),
    Symbol(String),
    /// `()` or `nil`
    Nil,
    Operation {
        name: String,
        args: Vec<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    FunctionDefinition {
        name: String,
        params: Vec<String>,
        body: Box<Expr>,
    },
}

impl Expr {
    pub fn symbol(name: &str) -> Self {
        Expr::Symbol(name.to_string())
    }

    pub fn op(name: &str, args: Vec<Expr>) -> Self {
        Expr::Operation {
            name: name.to_string(),
            args,
        }
    }

    pub fn cond(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn defun(name: &str, params: &[&str], body: Expr) -> Self {
        Expr::FunctionDefinition {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Symbol(s) => f.write_str(s),
            Expr::Nil => f.write_str("nil"),
            Expr::Operation { name, args } => {
                write!(f, "({}", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_str(")")
            }
            Expr::Conditional { cond, then, otherwise } => {
                write!(f, "(if {} {} {})", cond, then, otherwise)
            }
            Expr::FunctionDefinition { name, params, body } => {
                write!(f, "(defun {} ({}) {})", name, params.join(" "), body)
            }
        }
    }
}

/// Draw an expression as an indented tree, two spaces per level.
/// Inner nodes print as `+ [head]`, leaves as `'-' atom`.
pub fn render_tree(expr: &Expr) -> String {
    let mut out = String::new();
    draw(expr, 0, &mut out);
    out
}

fn draw(expr: &Expr, level: usize, out: &mut String) {
    let indent = "  ".repeat(level);
    match expr {
        Expr::Integer(_) | Expr::Symbol(_) | Expr::Nil => {
            out.push_str(&format!("{}'-' {}\n", indent, expr));
        }
        Expr::Operation { name, args } => {
            out.push_str(&format!("{}+ [{}]\n", indent, name));
            for arg in args {
                draw(arg, level + 1, out);
            }
        }
        Expr::Conditional { cond, then, otherwise } => {
            out.push_str(&format!("{}+ [if]\n", indent));
            for child in [cond, then, otherwise] {
                draw(child, level + 1, out);
            }
        }
        Expr::FunctionDefinition { name, params, body } => {
            out.push_str(&format!("{}+ [defun {} ({})]\n", indent, name, params.join(" ")));
            draw(body, level + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_source_like() {
        let e = Expr::defun(
            "inc",
            &["x"],
            Expr::op("+", vec![Expr::symbol("x"), Expr::Integer(1)]),
        );
        assert_eq!(e.to_string(), "(defun inc (x) (+ x 1))");
    }

    #[test]
    fn tree_indents_children() {
        let e = Expr::cond(
            Expr::op("eq", vec![Expr::Integer(1), Expr::Nil]),
            Expr::Integer(10),
            Expr::Integer(20),
        );
        let expected = "+ [if]\n  + [eq]\n    '-' 1\n    '-' nil\n  '-' 10\n  '-' 20\n";
        assert_eq!(render_tree(&e), expected);
    }
}
