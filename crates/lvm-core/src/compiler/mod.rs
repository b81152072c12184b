//! Code Generator
//!
//! Linearizes expression trees into the flat, label-addressed instruction
//! stream executed by the VM. Function bodies are emitted inline and skipped
//! by a leading jump, so definitions and top-level code share one sequence.
//!
//! No semantic validation happens here: an operator that is neither built in
//! nor already defined compiles to `CALL_BY_NAME` and is resolved when it runs.

pub mod functions;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::ast::Expr;
use crate::bytecode::{Instruction, Line, OpCode, Operand};

pub use functions::{FunctionSignature, FunctionTable};

/// Parameter name -> slot index for the function being compiled
pub type Scope = HashMap<String, usize>;

/// Compiler context: the pending program unit and the signature table.
#[derive(Debug, Default)]
pub struct Compiler {
    program: Vec<Line>,
    /// Lines already handed out by `take_program`
    emitted: usize,
    functions: FunctionTable,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a top-level expression (empty scope)
    pub fn compile_toplevel(&mut self, expr: &Expr) {
        self.compile(expr, &Scope::new());
    }

    /// Append the instructions for `expr` to the pending program
    pub fn compile(&mut self, expr: &Expr, scope: &Scope) {
        match expr {
            Expr::Integer(n) => self.emit(OpCode::Push, Operand::Integer(*n)),
            Expr::Symbol(name) => {
                if let Some(&slot) = scope.get(name) {
                    self.emit(OpCode::LoadParam, Operand::Slot(slot));
                } else if name.eq_ignore_ascii_case("nil") {
                    self.emit(OpCode::PushNil, Operand::None);
                } else {
                    self.emit(OpCode::PushLiteral, Operand::Name(name.clone()));
                }
            }
            Expr::Nil => self.emit(OpCode::PushNil, Operand::None),
            Expr::FunctionDefinition { name, params, body } => {
                self.compile_defun(name, params, body)
            }
            Expr::Conditional { cond, then, otherwise } => {
                self.compile(cond, scope);
                let id = self.position();
                let else_label = format!("else_{}", id);
                let end_label = format!("endif_{}", id);

                self.emit(OpCode::JumpFalse, Operand::Label(else_label.clone()));
                self.compile(then, scope);
                self.emit(OpCode::Jump, Operand::Label(end_label.clone()));
                self.label(else_label);
                self.compile(otherwise, scope);
                self.label(end_label);
            }
            Expr::Operation { name, args } => {
                for arg in args {
                    self.compile(arg, scope);
                }

                if let Some(opcode) = OpCode::for_builtin(name) {
                    self.emit(opcode, Operand::None);
                } else if let Some(sig) = self.functions.get(name) {
                    let operand = Operand::Target {
                        label: sig.label.clone(),
                        arity: sig.arity,
                    };
                    self.emit(OpCode::Call, operand);
                } else {
                    self.emit(OpCode::CallByName, Operand::Name(name.clone()));
                }
            }
        }
    }

    fn compile_defun(&mut self, name: &str, params: &[String], body: &Expr) {
        let id = self.position();
        let entry = format!("fn_{}_{}", name, id);
        let end = format!("end_fn_{}_{}", name, id);

        let scope: Scope = params
            .iter()
            .enumerate()
            .map(|(slot, param)| (param.clone(), slot))
            .collect();

        // Registered before the body so the body can call itself.
        self.functions.register(
            name,
            FunctionSignature {
                label: entry.clone(),
                arity: params.len(),
            },
        );
        debug!(function = name, arity = params.len(), label = %entry, "function registered");

        self.emit(OpCode::Jump, Operand::Label(end.clone()));
        self.label(entry);
        self.compile(body, &scope);
        self.emit(OpCode::Return, Operand::None);
        self.label(end);
    }

    fn emit(&mut self, opcode: OpCode, operand: Operand) {
        let line = Line::Instr(Instruction::with_operand(opcode, operand));
        trace!(%line, "emit");
        self.program.push(line);
    }

    fn label(&mut self, name: String) {
        self.program.push(Line::Label(name));
    }

    /// Session-wide index of the next emitted line; used to make labels unique.
    fn position(&self) -> usize {
        self.emitted + self.program.len()
    }

    /// The pending unit, not yet handed to a VM
    pub fn program(&self) -> &[Line] {
        &self.program
    }

    /// Hand the pending unit over for loading and start a new one
    pub fn take_program(&mut self) -> Vec<Line> {
        let unit = std::mem::take(&mut self.program);
        self.emitted += unit.len();
        unit
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }
}
