//! LVM Error Types
//!
//! Defines every error condition produced by the reader, the instruction loader
//! and the virtual machine. Errors are deterministic and carry enough context to
//! be reported without access to the machine state.

use thiserror::Error;

use crate::bytecode::opcode::OpCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LvmError {
    // Reader errors
    #[error("line {line}: illegal character '{ch}'")]
    IllegalCharacter { ch: char, line: usize },

    #[error("line {line}: integer literal '{text}' is out of range")]
    IntegerOutOfRange { text: String, line: usize },

    #[error("line {line}: syntax error: {message}")]
    Syntax { message: String, line: usize },

    #[error("syntax error: unexpected end of input")]
    UnexpectedEof,

    #[error("line {line}: expression nested deeper than {max} levels")]
    NestingTooDeep { max: usize, line: usize },

    // Instruction loader errors
    #[error("instruction line {line}: malformed instruction '{text}'")]
    MalformedInstruction { line: usize, text: String },

    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    // VM execution errors
    #[error("stack overflow (limit {0})")]
    StackOverflow(usize),

    #[error("stack underflow in {0}")]
    StackUnderflow(OpCode),

    #[error("call depth exceeded (limit {0})")]
    CallDepthExceeded(usize),

    #[error("call arity {arity} exceeds the stack limit {max}")]
    ArityTooLarge { arity: usize, max: usize },

    #[error("invalid parameter access: slot {0}")]
    InvalidParamAccess(usize),

    #[error("unresolved label: {0}")]
    UnresolvedLabel(String),

    #[error("RETURN with an empty call stack")]
    ReturnOutsideFunction,

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(OpCode),

    #[error("type mismatch in {opcode}: expected {expected}, found {found}")]
    TypeMismatch {
        opcode: OpCode,
        expected: &'static str,
        found: &'static str,
    },

    #[error("operand missing for {0}")]
    MissingOperand(OpCode),
}

pub type LvmResult<T> = Result<T, LvmError>;
