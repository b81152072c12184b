//! Instruction Representation
//!
//! Defines the typed instruction format and program lines.
//! This layer contains no execution semantics.

use std::fmt;

use super::opcode::OpCode;

/// Typed instruction operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Integer(i64),
    /// Raw symbol name (PUSH_LITERAL) or callee name (CALL_BY_NAME)
    Name(String),
    Slot(usize),
    Label(String),
    /// Call target resolved at compile time
    Target { label: String, arity: usize },
}

/// A single instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Operand,
}

impl Instruction {
    /// Create an instruction with no operand
    pub fn new(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operand: Operand::None,
        }
    }

    /// Create an instruction with a single operand
    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Instruction { opcode, operand }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Integer(n) => write!(f, " {}", n),
            Operand::Name(name) | Operand::Label(name) => write!(f, " {}", name),
            Operand::Slot(slot) => write!(f, " {}", slot),
            Operand::Target { label, arity } => write!(f, " {} {}", label, arity),
        }
    }
}

/// One line of a program: an instruction or a label marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Label(String),
    Instr(Instruction),
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Label(name) => write!(f, "{}:", name),
            Line::Instr(instr) => write!(f, "{}", instr),
        }
    }
}

/// Render lines as an instruction listing, one line each.
pub fn listing(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_target_prints_label_and_arity() {
        let call = Instruction::with_operand(
            OpCode::Call,
            Operand::Target { label: "fn_fact_0".into(), arity: 1 },
        );
        assert_eq!(call.to_string(), "CALL fn_fact_0 1");
        assert_eq!(Line::Label("else_4".into()).to_string(), "else_4:");
        assert_eq!(Instruction::new(OpCode::PushNil).to_string(), "PUSH_NIL");
    }
}
