pub mod instruction;
pub mod opcode;

pub use instruction::{listing, Instruction, Line, Operand};
pub use opcode::OpCode;
