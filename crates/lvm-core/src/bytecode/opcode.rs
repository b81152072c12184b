//! Instruction Opcode Definitions
//!
//! Defines the closed opcode set of the LVM instruction stream.
//! This file contains no execution semantics.
//! Mnemonics are the textual contract shared by the code generator and the loader.

use std::fmt;

/// Instruction opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // Stack operations
    Push,
    PushNil,
    PushLiteral,

    // Parameter access
    LoadParam,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Neq,
    Gt,
    Lt,
    Geq,
    Leq,

    // Logic
    And,
    Or,
    Not,

    // Lists
    Car,
    Cdr,
    Cons,

    // Control flow
    Jump,
    JumpFalse,
    Call,
    CallByName,
    Return,

    // System
    Print,
}

impl OpCode {
    /// Textual mnemonic used in instruction listings
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Push => "PUSH",
            OpCode::PushNil => "PUSH_NIL",
            OpCode::PushLiteral => "PUSH_LITERAL",

            OpCode::LoadParam => "LOAD_PARAM",

            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Mod => "MOD",

            OpCode::Eq => "EQ",
            OpCode::Neq => "NEQ",
            OpCode::Gt => "GT",
            OpCode::Lt => "LT",
            OpCode::Geq => "GEQ",
            OpCode::Leq => "LEQ",

            OpCode::And => "AND",
            OpCode::Or => "OR",
            OpCode::Not => "NOT",

            OpCode::Car => "CAR",
            OpCode::Cdr => "CDR",
            OpCode::Cons => "CONS",

            OpCode::Jump => "JUMP",
            OpCode::JumpFalse => "JUMP_FALSE",
            OpCode::Call => "CALL",
            OpCode::CallByName => "CALL_BY_NAME",
            OpCode::Return => "RETURN",

            OpCode::Print => "PRINT",
        }
    }

    /// Convert a mnemonic back to an opcode
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        match text {
            "PUSH" => Some(OpCode::Push),
            "PUSH_NIL" => Some(OpCode::PushNil),
            "PUSH_LITERAL" => Some(OpCode::PushLiteral),

            "LOAD_PARAM" => Some(OpCode::LoadParam),

            "ADD" => Some(OpCode::Add),
            "SUB" => Some(OpCode::Sub),
            "MUL" => Some(OpCode::Mul),
            "DIV" => Some(OpCode::Div),
            "MOD" => Some(OpCode::Mod),

            "EQ" => Some(OpCode::Eq),
            "NEQ" => Some(OpCode::Neq),
            "GT" => Some(OpCode::Gt),
            "LT" => Some(OpCode::Lt),
            "GEQ" => Some(OpCode::Geq),
            "LEQ" => Some(OpCode::Leq),

            "AND" => Some(OpCode::And),
            "OR" => Some(OpCode::Or),
            "NOT" => Some(OpCode::Not),

            "CAR" => Some(OpCode::Car),
            "CDR" => Some(OpCode::Cdr),
            "CONS" => Some(OpCode::Cons),

            "JUMP" => Some(OpCode::Jump),
            "JUMP_FALSE" => Some(OpCode::JumpFalse),
            "CALL" => Some(OpCode::Call),
            "CALL_BY_NAME" => Some(OpCode::CallByName),
            "RETURN" => Some(OpCode::Return),

            "PRINT" => Some(OpCode::Print),

            _ => None,
        }
    }

    /// Opcode emitted for a built-in source operator, if `name` is one.
    /// Reserved words match case-insensitively.
    pub fn for_builtin(name: &str) -> Option<Self> {
        let op = match name {
            "+" => OpCode::Add,
            "-" => OpCode::Sub,
            "*" => OpCode::Mul,
            "/" => OpCode::Div,
            _ => match name.to_ascii_lowercase().as_str() {
                "div" => OpCode::Div,
                "mod" => OpCode::Mod,
                "eq" => OpCode::Eq,
                "neq" => OpCode::Neq,
                "gt" => OpCode::Gt,
                "lt" => OpCode::Lt,
                "geq" => OpCode::Geq,
                "leq" => OpCode::Leq,
                "and" => OpCode::And,
                "or" => OpCode::Or,
                "not" => OpCode::Not,
                "car" => OpCode::Car,
                "cdr" => OpCode::Cdr,
                "cons" => OpCode::Cons,
                "print" => OpCode::Print,
                _ => return None,
            },
        };
        Some(op)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_ignores_case_for_words() {
        assert_eq!(OpCode::for_builtin("CAR"), Some(OpCode::Car));
        assert_eq!(OpCode::for_builtin("div"), Some(OpCode::Div));
        assert_eq!(OpCode::for_builtin("/"), Some(OpCode::Div));
        assert_eq!(OpCode::for_builtin("fact"), None);
        // `cond` is reserved by the reader but has no opcode
        assert_eq!(OpCode::for_builtin("cond"), None);
    }

    #[test]
    fn mnemonics_are_unique() {
        for op in [OpCode::JumpFalse, OpCode::CallByName, OpCode::PushLiteral, OpCode::Mod] {
            assert_eq!(OpCode::from_mnemonic(op.mnemonic()), Some(op));
        }
        assert_eq!(OpCode::from_mnemonic("push"), None);
    }
}
