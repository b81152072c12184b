//! Virtual Machine Core
//!
//! Defines the LVM structure and its fetch-dispatch-advance loop.
//! The program only grows: each load appends instructions and labels, and
//! execution resumes at the first appended instruction.

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::bytecode::{Instruction, Line, OpCode, Operand};
use crate::compiler::FunctionTable;
use crate::config::LvmConfig;
use crate::error::{LvmError, LvmResult};
use crate::loader::ProgramLoader;

use super::memory::{Frame, Params};
use super::stack::Stack;
use super::value::Value;

/// Observable effects of execution, drained by the host after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    Printed(Value),
    /// PRINT found the operand stack empty
    PrintedEmpty,
    /// CALL_BY_NAME named a function that is not defined; the call was skipped
    UnresolvedCall { name: String },
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateChange::Printed(value) => write!(f, "=> {}", value),
            StateChange::PrintedEmpty => f.write_str("=> <empty stack>"),
            StateChange::UnresolvedCall { name } => {
                write!(f, "error: undefined function '{}'", name)
            }
        }
    }
}

/// LVM Virtual Machine
#[derive(Debug)]
pub struct VirtualMachine {
    config: LvmConfig,
    stack: Stack,

    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    ip: usize,

    call_stack: Vec<Frame>,
    params: Params,
    changes: Vec<StateChange>,
}

impl VirtualMachine {
    /// Create a new VM instance with an empty program
    pub fn new(config: LvmConfig) -> Self {
        VirtualMachine {
            stack: Stack::new(config.max_stack_size),
            instructions: Vec::new(),
            labels: HashMap::new(),
            ip: 0,
            call_stack: Vec::new(),
            params: Params::default(),
            changes: Vec::new(),
            config,
        }
    }

    /// Parse a textual instruction listing and append it to the program
    pub fn load(&mut self, text: &str) -> LvmResult<()> {
        let lines = ProgramLoader::load(text)?;
        self.load_lines(lines)
    }

    /// Append typed lines to the program. Nothing is appended if a label
    /// would be declared twice.
    pub fn load_lines(&mut self, lines: Vec<Line>) -> LvmResult<()> {
        let mut fresh: HashSet<&str> = HashSet::new();
        for line in &lines {
            if let Line::Label(name) = line {
                if self.labels.contains_key(name) || !fresh.insert(name.as_str()) {
                    return Err(LvmError::DuplicateLabel(name.clone()));
                }
            }
        }

        let start = self.instructions.len();
        for line in lines {
            match line {
                Line::Label(name) => {
                    self.labels.insert(name, self.instructions.len());
                }
                Line::Instr(instr) => self.instructions.push(instr),
            }
        }

        debug!(
            appended = self.instructions.len() - start,
            total = self.instructions.len(),
            "program loaded"
        );
        self.ip = start;
        Ok(())
    }

    /// Execute until the pointer passes the end of the program.
    ///
    /// A fatal fault abandons the cycle: operand stack, call stack and frame
    /// are discarded and the pointer moves past the end of the program.
    pub fn run(&mut self, functions: &FunctionTable) -> LvmResult<()> {
        while self.ip < self.instructions.len() {
            if let Err(e) = self.step(functions) {
                error!(ip = self.ip, error = %e, "execution aborted");
                self.abort();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Execute a single instruction
    fn step(&mut self, functions: &FunctionTable) -> LvmResult<()> {
        let instr = self.instructions[self.ip].clone();
        trace!(ip = self.ip, %instr, depth = self.stack.size(), "dispatch");

        let opcode = instr.opcode;
        let mut next = self.ip + 1;

        match (opcode, instr.operand) {
            (OpCode::Push, Operand::Integer(n)) => self.stack.push(Value::Integer(n))?,
            (OpCode::PushNil, _) => self.stack.push(Value::nil())?,
            (OpCode::PushLiteral, Operand::Name(name)) => self.stack.push(Value::Symbol(name))?,
            (OpCode::LoadParam, Operand::Slot(slot)) => {
                let value = self.params.load(slot)?;
                self.stack.push(value)?;
            }

            (OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod, _) => {
                let b = self.pop_integer(opcode)?;
                let a = self.pop_integer(opcode)?;
                let result = match opcode {
                    OpCode::Add => a.checked_add(b),
                    OpCode::Sub => a.checked_sub(b),
                    OpCode::Mul => a.checked_mul(b),
                    _ if b == 0 => return Err(LvmError::DivisionByZero),
                    OpCode::Div => a.checked_div(b),
                    _ => a.checked_rem(b),
                };
                let n = result.ok_or(LvmError::ArithmeticOverflow(opcode))?;
                self.stack.push(Value::Integer(n))?;
            }

            (OpCode::Eq | OpCode::Neq, _) => {
                let b = self.stack.pop(opcode)?;
                let a = self.stack.pop(opcode)?;
                let holds = (a == b) == (opcode == OpCode::Eq);
                self.stack.push(Value::from_bool(holds))?;
            }
            (OpCode::Gt | OpCode::Lt | OpCode::Geq | OpCode::Leq, _) => {
                let b = self.pop_integer(opcode)?;
                let a = self.pop_integer(opcode)?;
                let holds = match opcode {
                    OpCode::Gt => a > b,
                    OpCode::Lt => a < b,
                    OpCode::Geq => a >= b,
                    _ => a <= b,
                };
                self.stack.push(Value::from_bool(holds))?;
            }

            (OpCode::And | OpCode::Or, _) => {
                let b = self.stack.pop(opcode)?.is_truthy();
                let a = self.stack.pop(opcode)?.is_truthy();
                let holds = if opcode == OpCode::And { a && b } else { a || b };
                self.stack.push(Value::from_bool(holds))?;
            }
            (OpCode::Not, _) => {
                let a = self.stack.pop(opcode)?;
                self.stack.push(Value::from_bool(!a.is_truthy()))?;
            }

            (OpCode::Car, _) => {
                let items = self.pop_list(opcode)?;
                let head = items.into_iter().next().unwrap_or_else(Value::nil);
                self.stack.push(head)?;
            }
            (OpCode::Cdr, _) => {
                let items = self.pop_list(opcode)?;
                let tail = items.into_iter().skip(1).collect();
                self.stack.push(Value::List(tail))?;
            }
            (OpCode::Cons, _) => {
                let b = self.stack.pop(opcode)?;
                let a = self.stack.pop(opcode)?;
                let list = match b {
                    Value::List(mut items) => {
                        items.insert(0, a);
                        items
                    }
                    other => vec![a, other],
                };
                self.stack.push(Value::List(list))?;
            }

            (OpCode::Jump, Operand::Label(label)) => next = self.resolve_label(&label)?,
            (OpCode::JumpFalse, Operand::Label(label)) => {
                if !self.stack.pop(opcode)?.is_truthy() {
                    next = self.resolve_label(&label)?;
                }
            }
            (OpCode::Call, Operand::Target { label, arity }) => {
                next = self.enter(&label, arity)?;
            }
            (OpCode::CallByName, Operand::Name(name)) => match functions.get(&name) {
                Some(sig) => next = self.enter(&sig.label, sig.arity)?,
                None => {
                    warn!(function = %name, "call to undefined function skipped");
                    self.changes.push(StateChange::UnresolvedCall { name });
                }
            },
            (OpCode::Return, _) => {
                let frame = self.call_stack.pop().ok_or(LvmError::ReturnOutsideFunction)?;
                self.params = frame.params;
                next = frame.return_ip;
            }

            (OpCode::Print, _) => match self.stack.try_pop() {
                Some(value) => self.changes.push(StateChange::Printed(value)),
                None => self.changes.push(StateChange::PrintedEmpty),
            },

            (_, _) => return Err(LvmError::MissingOperand(opcode)),
        }

        self.ip = next;
        Ok(())
    }

    /// Enter a function: gather arguments, save the caller, return the entry index.
    fn enter(&mut self, label: &str, arity: usize) -> LvmResult<usize> {
        let entry = self.resolve_label(label)?;
        if self.call_stack.len() >= self.config.max_call_depth {
            return Err(LvmError::CallDepthExceeded(self.config.max_call_depth));
        }

        if arity > self.config.max_stack_size {
            return Err(LvmError::ArityTooLarge {
                arity,
                max: self.config.max_stack_size,
            });
        }

        // Underflow is tolerated here: missing arguments become the empty list.
        let present = arity.min(self.stack.size());
        let mut args = vec![Value::nil(); arity - present];
        let padded = args.len();
        for _ in 0..present {
            if let Some(value) = self.stack.try_pop() {
                args.push(value);
            }
        }
        args[padded..].reverse();

        let caller = std::mem::replace(&mut self.params, Params::new(args));
        self.call_stack.push(Frame {
            return_ip: self.ip + 1,
            params: caller,
        });
        Ok(entry)
    }

    fn resolve_label(&self, label: &str) -> LvmResult<usize> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| LvmError::UnresolvedLabel(label.to_string()))
    }

    fn pop_integer(&mut self, opcode: OpCode) -> LvmResult<i64> {
        match self.stack.pop(opcode)? {
            Value::Integer(n) => Ok(n),
            other => Err(LvmError::TypeMismatch {
                opcode,
                expected: "integer",
                found: other.type_name(),
            }),
        }
    }

    fn pop_list(&mut self, opcode: OpCode) -> LvmResult<Vec<Value>> {
        match self.stack.pop(opcode)? {
            Value::List(items) => Ok(items),
            other => Err(LvmError::TypeMismatch {
                opcode,
                expected: "list",
                found: other.type_name(),
            }),
        }
    }

    fn abort(&mut self) {
        self.stack.clear();
        self.call_stack.clear();
        self.params = Params::default();
        self.ip = self.instructions.len();
    }

    /// Drop the program and all execution state
    pub fn reset(&mut self) {
        self.abort();
        self.instructions.clear();
        self.labels.clear();
        self.ip = 0;
        self.changes.clear();
    }

    /// Take the state changes recorded since the last drain
    pub fn drain_state_changes(&mut self) -> Vec<StateChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn peek_top(&self) -> Option<&Value> {
        self.stack.peek()
    }

    pub fn stack_size(&self) -> usize {
        self.stack.size()
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Drop every value left on the operand stack
    pub fn discard_operands(&mut self) {
        if !self.stack.is_empty() {
            trace!(dropped = self.stack.size(), "operands discarded");
            self.stack.clear();
        }
    }

    pub fn ip(&self) -> usize {
        self.ip
    }
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new(LvmConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::FunctionSignature;

    fn run_text(text: &str) -> (VirtualMachine, LvmResult<()>) {
        let mut vm = VirtualMachine::default();
        vm.load(text).expect("load failed");
        let result = vm.run(&FunctionTable::new());
        (vm, result)
    }

    fn printed(vm: &mut VirtualMachine) -> Vec<String> {
        vm.drain_state_changes().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn binary_ops_take_left_operand_from_deeper_slot() {
        let (mut vm, res) = run_text("PUSH 7\nPUSH 2\nSUB\nPRINT\nPUSH -7\nPUSH 2\nDIV\nPRINT\nPUSH -7\nPUSH 2\nMOD\nPRINT\n");
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 5", "=> -3", "=> -1"]);
    }

    #[test]
    fn comparisons_yield_one_or_empty_list() {
        let (mut vm, res) = run_text("PUSH 3\nPUSH 2\nGT\nPRINT\nPUSH 3\nPUSH 2\nLT\nPRINT\nPUSH_NIL\nPUSH_NIL\nEQ\nPRINT\n");
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 1", "=> []", "=> 1"]);
    }

    #[test]
    fn logic_uses_truthiness() {
        let (mut vm, res) = run_text("PUSH 0\nNOT\nPRINT\nPUSH_LITERAL a\nPUSH_NIL\nOR\nPRINT\nPUSH 5\nPUSH 0\nAND\nPRINT\n");
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 1", "=> 1", "=> []"]);
    }

    #[test]
    fn list_primitives() {
        let text = "PUSH 1\nPUSH 2\nCONS\nPRINT\nPUSH_NIL\nCAR\nPRINT\nPUSH_NIL\nCDR\nPRINT\nPUSH 1\nPUSH 2\nPUSH_NIL\nCONS\nCONS\nCDR\nPRINT\n";
        let (mut vm, res) = run_text(text);
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> [1, 2]", "=> []", "=> []", "=> [2]"]);
    }

    #[test]
    fn division_by_zero_is_fatal_and_resets_cycle() {
        let (mut vm, res) = run_text("PUSH 9\nPUSH 1\nPUSH 0\nDIV\nPUSH 4\nPRINT\n");
        assert_eq!(res, Err(LvmError::DivisionByZero));
        assert!(printed(&mut vm).is_empty());
        assert_eq!(vm.stack_size(), 0);
        assert_eq!(vm.ip(), vm.instruction_count());
    }

    #[test]
    fn underflow_outside_tolerated_sites_is_fatal() {
        let (_, res) = run_text("PUSH 1\nADD\n");
        assert_eq!(res, Err(LvmError::StackUnderflow(OpCode::Add)));
        let (_, res) = run_text("CAR\n");
        assert_eq!(res, Err(LvmError::StackUnderflow(OpCode::Car)));
    }

    #[test]
    fn print_on_empty_stack_emits_notice() {
        let (mut vm, res) = run_text("PRINT\n");
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> <empty stack>"]);
    }

    #[test]
    fn type_errors_are_fatal() {
        let (_, res) = run_text("PUSH_LITERAL a\nPUSH 1\nADD\n");
        assert_eq!(
            res,
            Err(LvmError::TypeMismatch { opcode: OpCode::Add, expected: "integer", found: "symbol" })
        );
        let (_, res) = run_text("PUSH 1\nCDR\n");
        assert!(matches!(res, Err(LvmError::TypeMismatch { expected: "list", .. })));
    }

    #[test]
    fn call_pads_missing_arguments_with_empty_list() {
        // f(a, b, c) prints c, b, a
        let text = "JUMP end\nf:\nLOAD_PARAM 2\nPRINT\nLOAD_PARAM 1\nPRINT\nLOAD_PARAM 0\nPRINT\nRETURN\nend:\nPUSH 8\nCALL f 3\n";
        let (mut vm, res) = run_text(text);
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 8", "=> []", "=> []"]);
        assert_eq!(vm.call_depth(), 0);
    }

    #[test]
    fn call_arity_beyond_stack_limit_is_fatal() {
        let text = "JUMP end\nf:\nRETURN\nend:\nPUSH 1\nCALL f 18446744073709551615\n";
        let (vm, res) = run_text(text);
        assert_eq!(
            res,
            Err(LvmError::ArityTooLarge {
                arity: usize::MAX,
                max: LvmConfig::default().max_stack_size,
            })
        );
        assert_eq!(vm.stack_size(), 0);
        assert_eq!(vm.call_depth(), 0);
    }

    #[test]
    fn call_arity_at_stack_limit_is_padded() {
        let mut cfg = LvmConfig::new();
        cfg.max_stack_size = 4;
        let mut vm = VirtualMachine::new(cfg);
        vm.load("JUMP end\nf:\nLOAD_PARAM 3\nPRINT\nLOAD_PARAM 0\nPRINT\nRETURN\nend:\nPUSH 5\nPUSH 6\nCALL f 4\n")
            .expect("load failed");
        vm.run(&FunctionTable::new()).expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 6", "=> []"]);
    }

    #[test]
    fn return_restores_caller_frame() {
        // outer(x) calls inner(100) and then reads its own x again
        let text = "\
JUMP end_inner
inner:
LOAD_PARAM 0
RETURN
end_inner:
JUMP end_outer
outer:
PUSH 100
CALL inner 1
PRINT
LOAD_PARAM 0
PRINT
RETURN
end_outer:
PUSH 5
CALL outer 1
";
        let (mut vm, res) = run_text(text);
        res.expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 100", "=> 5"]);
    }

    #[test]
    fn unresolved_call_by_name_is_skipped() {
        let (mut vm, res) = run_text("PUSH 1\nCALL_BY_NAME nope\nPUSH 2\nPRINT\n");
        res.expect("run failed");
        assert_eq!(
            vm.drain_state_changes(),
            vec![
                StateChange::UnresolvedCall { name: "nope".into() },
                StateChange::Printed(Value::Integer(2)),
            ]
        );
        assert_eq!(vm.peek_top(), Some(&Value::Integer(1)));
    }

    #[test]
    fn call_by_name_resolves_through_table() {
        let mut vm = VirtualMachine::default();
        vm.load("PUSH 4\nCALL_BY_NAME id\nPRINT\nJUMP end\nid_entry:\nLOAD_PARAM 0\nRETURN\nend:\n")
            .expect("load failed");
        let mut table = FunctionTable::new();
        table.register("id", FunctionSignature { label: "id_entry".into(), arity: 1 });
        vm.run(&table).expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 4"]);
    }

    #[test]
    fn jump_to_unknown_label_is_fatal() {
        let (_, res) = run_text("JUMP nowhere\n");
        assert_eq!(res, Err(LvmError::UnresolvedLabel("nowhere".into())));
    }

    #[test]
    fn runaway_recursion_hits_call_depth_limit() {
        let mut vm = VirtualMachine::new(LvmConfig { max_stack_size: 64, max_call_depth: 8 });
        vm.load("JUMP end\nloop:\nCALL loop 0\nRETURN\nend:\nCALL loop 0\n").expect("load failed");
        assert_eq!(vm.run(&FunctionTable::new()), Err(LvmError::CallDepthExceeded(8)));
        assert_eq!(vm.call_depth(), 0);
    }

    #[test]
    fn load_appends_and_resumes_at_new_code() {
        let mut vm = VirtualMachine::default();
        let table = FunctionTable::new();
        vm.load("PUSH 1\nPRINT\n").expect("load failed");
        vm.run(&table).expect("run failed");
        vm.load("PUSH 2\nPRINT\n").expect("load failed");
        assert_eq!(vm.ip(), 2);
        vm.run(&table).expect("run failed");
        assert_eq!(printed(&mut vm), vec!["=> 1", "=> 2"]);
        assert_eq!(vm.instruction_count(), 4);
    }

    #[test]
    fn duplicate_label_rejects_whole_load() {
        let mut vm = VirtualMachine::default();
        vm.load("a:\nPUSH 1\n").expect("load failed");
        assert_eq!(vm.load("PUSH 2\na:\n"), Err(LvmError::DuplicateLabel("a".into())));
        assert_eq!(vm.instruction_count(), 1);
        assert_eq!(vm.load("b:\nb:\n"), Err(LvmError::DuplicateLabel("b".into())));
    }

    #[test]
    fn malformed_text_is_surfaced() {
        let mut vm = VirtualMachine::default();
        assert!(matches!(vm.load("PUSH 1\nWHAT 3\n"), Err(LvmError::MalformedInstruction { line: 2, .. })));
        assert_eq!(vm.instruction_count(), 0);
    }

    #[test]
    fn missing_operand_on_typed_lines_is_fatal() {
        let mut vm = VirtualMachine::default();
        vm.load_lines(vec![Line::Instr(Instruction::new(OpCode::Push))]).expect("load failed");
        assert_eq!(vm.run(&FunctionTable::new()), Err(LvmError::MissingOperand(OpCode::Push)));
    }
}
