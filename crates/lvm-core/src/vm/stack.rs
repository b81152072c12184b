//! VM Stack Implementation
//!
//! Operand stack for VM execution.
//! No execution semantics.

use crate::bytecode::OpCode;
use crate::error::{LvmError, LvmResult};
use super::value::Value;

/// VM operand stack
#[derive(Debug)]
pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    /// Create new stack with maximum size
    pub fn new(max_size: usize) -> Self {
        Stack {
            values: Vec::new(),
            max_size,
        }
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Value) -> LvmResult<()> {
        if self.values.len() >= self.max_size {
            return Err(LvmError::StackOverflow(self.max_size));
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack; `opcode` names the instruction for the underflow report
    pub fn pop(&mut self, opcode: OpCode) -> LvmResult<Value> {
        self.values.pop().ok_or(LvmError::StackUnderflow(opcode))
    }

    /// Pop value, or None when empty. Only the tolerated underflow sites use this.
    pub fn try_pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    /// Peek at top of stack without removing
    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Get current stack size
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clear stack
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_limit() {
        let mut stack = Stack::new(1);
        stack.push(Value::Integer(1)).expect("first push");
        assert_eq!(stack.push(Value::Integer(2)), Err(LvmError::StackOverflow(1)));
        assert_eq!(stack.size(), 1);
    }

    #[test]
    fn pop_reports_the_instruction() {
        let mut stack = Stack::new(4);
        assert_eq!(stack.pop(OpCode::Add), Err(LvmError::StackUnderflow(OpCode::Add)));
        assert_eq!(stack.try_pop(), None);
    }
}
