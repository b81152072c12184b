//! Runtime Value Representation
//!
//! Values are small and copied by value; there is no heap or collector.
//! Integer 0 and the empty list are the only falsy values.

use std::fmt;

/// Runtime value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer
    Integer(i64),

    /// Unevaluated symbol token
    Symbol(String),

    /// Ordered list; the empty list doubles as nil and false
    List(Vec<Value>),
}

impl Value {
    /// The empty list
    pub fn nil() -> Self {
        Value::List(Vec::new())
    }

    /// Boolean result encoding used by comparisons and logic ops
    pub fn from_bool(b: bool) -> Self {
        if b {
            Value::Integer(1)
        } else {
            Value::nil()
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::List(items) => !items.is_empty(),
            Value::Symbol(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Symbol(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_empty_list_are_falsy() {
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::nil().is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(Value::Symbol("nil".into()).is_truthy());
        assert!(Value::List(vec![Value::nil()]).is_truthy());
    }

    #[test]
    fn nested_lists_display_with_brackets() {
        let v = Value::List(vec![
            Value::Integer(1),
            Value::List(vec![Value::Symbol("a".into()), Value::Integer(2)]),
            Value::nil(),
        ]);
        assert_eq!(v.to_string(), "[1, [a, 2], []]");
    }
}
