//! Instruction Loader
//!
//! Parses a textual instruction listing into typed program lines.
//! This layer performs structural validation only: label references are
//! resolved by the VM when they are jumped to.

use crate::bytecode::{Instruction, Line, OpCode, Operand};
use crate::error::{LvmError, LvmResult};

/// Instruction listing loader
pub struct ProgramLoader;

impl ProgramLoader {
    /// Parse a whole listing. Either every line parses or nothing is returned.
    pub fn load(text: &str) -> LvmResult<Vec<Line>> {
        let mut lines = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            lines.push(Self::parse_line(trimmed, index + 1)?);
        }

        Ok(lines)
    }

    /// Parse a single non-blank line
    fn parse_line(text: &str, line: usize) -> LvmResult<Line> {
        let malformed = || LvmError::MalformedInstruction {
            line,
            text: text.to_string(),
        };

        if let Some(name) = text.strip_suffix(':') {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(malformed());
            }
            return Ok(Line::Label(name.to_string()));
        }

        let mut parts = text.split_whitespace();
        let mnemonic = parts.next().ok_or_else(malformed)?;
        let opcode = OpCode::from_mnemonic(mnemonic).ok_or_else(malformed)?;
        let args: Vec<&str> = parts.collect();

        let operand = match (opcode, args.as_slice()) {
            (OpCode::Push, [n]) => Operand::Integer(n.parse().map_err(|_| malformed())?),
            (OpCode::PushLiteral | OpCode::CallByName, [name]) => Operand::Name(name.to_string()),
            (OpCode::LoadParam, [slot]) => Operand::Slot(slot.parse().map_err(|_| malformed())?),
            (OpCode::Jump | OpCode::JumpFalse, [label]) => Operand::Label(label.to_string()),
            (OpCode::Call, [label, arity]) => Operand::Target {
                label: label.to_string(),
                arity: arity.parse().map_err(|_| malformed())?,
            },
            (
                OpCode::Push
                | OpCode::PushLiteral
                | OpCode::CallByName
                | OpCode::LoadParam
                | OpCode::Jump
                | OpCode::JumpFalse
                | OpCode::Call,
                _,
            ) => return Err(malformed()),
            (_, []) => Operand::None,
            (_, _) => return Err(malformed()),
        };

        Ok(Line::Instr(Instruction::with_operand(opcode, operand)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::listing;

    #[test]
    fn parses_labels_and_operands() {
        let text = "JUMP end_fn_f_0\nfn_f_0:\n  LOAD_PARAM 0\nRETURN\n\nend_fn_f_0:\nPUSH 7\nCALL fn_f_0 1\nPRINT\n";
        let lines = ProgramLoader::load(text).expect("load failed");
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[1], Line::Label("fn_f_0".into()));
        assert_eq!(
            lines[2],
            Line::Instr(Instruction::with_operand(OpCode::LoadParam, Operand::Slot(0)))
        );
        assert_eq!(
            lines[6],
            Line::Instr(Instruction::with_operand(
                OpCode::Call,
                Operand::Target { label: "fn_f_0".into(), arity: 1 }
            ))
        );
    }

    #[test]
    fn listing_text_loads_back_unchanged() {
        let text = "PUSH -3\nPUSH_LITERAL foo\nCALL_BY_NAME bar\nelse_2:\nJUMP_FALSE else_2\nPRINT\n";
        let lines = ProgramLoader::load(text).expect("load failed");
        assert_eq!(listing(&lines), text);
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let err = ProgramLoader::load("PUSH 1\nFROB\n").unwrap_err();
        assert_eq!(
            err,
            LvmError::MalformedInstruction { line: 2, text: "FROB".into() }
        );
    }

    #[test]
    fn operand_shape_is_checked() {
        assert!(ProgramLoader::load("PUSH").is_err());
        assert!(ProgramLoader::load("PUSH x").is_err());
        assert!(ProgramLoader::load("ADD 1").is_err());
        assert!(ProgramLoader::load("CALL fn_f 1 2").is_err());
        assert!(ProgramLoader::load("LOAD_PARAM -1").is_err());
        assert!(ProgramLoader::load("bad label:").is_err());
    }
}
