//! LVM - Core Library
//!
//! A small Lisp compiled to a label-addressed instruction stream and run on a
//! stack virtual machine. Public API surface for the LVM core.

pub mod error;
pub mod config;
pub mod ast;
pub mod reader;
pub mod bytecode;
pub mod compiler;
pub mod loader;
pub mod vm;
pub mod session;

// Re-export commonly used types
pub use error::{LvmError, LvmResult};
pub use config::LvmConfig;
pub use ast::Expr;
pub use bytecode::{Instruction, Line, OpCode, Operand};
pub use compiler::{Compiler, FunctionSignature, FunctionTable};
pub use loader::ProgramLoader;
pub use reader::parse_program;
pub use vm::{StateChange, Value, VirtualMachine};
pub use session::{ExecMode, Session};

#[cfg(test)]
mod tests {
	use super::*;
	use crate::bytecode::listing;

	#[test]
	fn compiled_listing_runs_from_text() {
		let exprs = parse_program("(defun sq (x) (* x x)) (print (sq 9))").expect("parse failed");
		let mut compiler = Compiler::new();
		for e in &exprs {
			compiler.compile_toplevel(e);
		}
		let text = listing(compiler.program());

		let mut vm = VirtualMachine::new(LvmConfig::new());
		vm.load(&text).expect("load failed");
		vm.run(compiler.functions()).expect("execution failed");
		let changes = vm.drain_state_changes();
		assert_eq!(changes, vec![StateChange::Printed(Value::Integer(81))]);
	}

	#[test]
	fn stack_overflow_trapped() {
		let mut cfg = LvmConfig::new();
		cfg.max_stack_size = 1;
		let mut vm = VirtualMachine::new(cfg);
		vm.load("PUSH 1\nPUSH 2\n").expect("load failed");
		let res = vm.run(&FunctionTable::new());
		assert_eq!(res, Err(LvmError::StackOverflow(1)));
	}

	#[test]
	fn push_literal_preserved() {
		let mut vm = VirtualMachine::default();
		vm.load("PUSH_LITERAL hello\n").expect("load failed");
		vm.run(&FunctionTable::new()).expect("execution failed");
		assert_eq!(vm.peek_top(), Some(&Value::Symbol("hello".into())));
	}
}
