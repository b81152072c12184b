//! Session driver
//!
//! Couples one compiler context with one VM. Batch mode compiles a whole unit
//! before running any of it, so calls may name functions defined later in the
//! unit. Incremental mode compiles and runs one expression at a time, so a
//! call issued before its definition has been submitted is unresolved.
//!
//! Output is not returned from the run methods: like the VM, the session
//! records state changes that the host drains afterwards, including the ones
//! produced before a fatal fault.

use tracing::debug;

use crate::ast::Expr;
use crate::bytecode::Line;
use crate::compiler::Compiler;
use crate::config::LvmConfig;
use crate::error::LvmResult;
use crate::reader::parse_program;
use crate::vm::{StateChange, VirtualMachine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Batch,
    Incremental,
}

#[derive(Debug)]
pub struct Session {
    compiler: Compiler,
    vm: VirtualMachine,
    /// Every line handed to the VM, in load order
    history: Vec<Line>,
}

impl Session {
    pub fn new(config: LvmConfig) -> Self {
        Session {
            compiler: Compiler::new(),
            vm: VirtualMachine::new(config),
            history: Vec::new(),
        }
    }

    /// Compile every expression, then load and run the unit once.
    pub fn run_batch(&mut self, exprs: &[Expr]) -> LvmResult<()> {
        for expr in exprs {
            self.compiler.compile_toplevel(expr);
        }
        self.load_and_run()
    }

    /// Compile, load and run a single expression. Values the expression
    /// leaves on the operand stack are dropped once it has run, so a long
    /// session does not creep towards the stack limit.
    pub fn submit(&mut self, expr: &Expr) -> LvmResult<()> {
        self.compiler.compile_toplevel(expr);
        self.load_and_run()?;
        self.vm.discard_operands();
        Ok(())
    }

    /// Execute already parsed expressions in the given mode. Incremental
    /// execution stops at the first fatal fault.
    pub fn run_exprs(&mut self, exprs: &[Expr], mode: ExecMode) -> LvmResult<()> {
        match mode {
            ExecMode::Batch => self.run_batch(exprs),
            ExecMode::Incremental => exprs.iter().try_for_each(|expr| self.submit(expr)),
        }
    }

    /// Parse `source` and execute it in the given mode.
    pub fn run_source(&mut self, source: &str, mode: ExecMode) -> LvmResult<()> {
        let exprs = parse_program(source)?;
        debug!(expressions = exprs.len(), ?mode, "source parsed");
        self.run_exprs(&exprs, mode)
    }

    fn load_and_run(&mut self) -> LvmResult<()> {
        let unit = self.compiler.take_program();
        self.vm.load_lines(unit.clone())?;
        self.history.extend(unit);
        self.vm.run(self.compiler.functions())
    }

    pub fn drain_state_changes(&mut self) -> Vec<StateChange> {
        self.vm.drain_state_changes()
    }

    /// Drain state changes rendered as output lines
    pub fn drain_output(&mut self) -> Vec<String> {
        self.drain_state_changes()
            .iter()
            .map(|change| change.to_string())
            .collect()
    }

    /// All lines loaded so far
    pub fn history(&self) -> &[Line] {
        &self.history
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn vm(&self) -> &VirtualMachine {
        &self.vm
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LvmConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LvmError;

    #[test]
    fn parse_errors_leave_session_untouched() {
        let mut session = Session::default();
        assert_eq!(
            session.run_source("(print 1", ExecMode::Batch),
            Err(LvmError::UnexpectedEof)
        );
        assert!(session.history().is_empty());
        assert_eq!(session.vm().instruction_count(), 0);
    }

    #[test]
    fn output_before_a_fault_is_kept() {
        let mut session = Session::default();
        let res = session.run_source("(print 1) (print (/ 1 0)) (print 2)", ExecMode::Batch);
        assert_eq!(res, Err(LvmError::DivisionByZero));
        assert_eq!(session.drain_output(), vec!["=> 1"]);
    }

    #[test]
    fn submitted_values_do_not_accumulate() {
        let mut config = LvmConfig::new();
        config.max_stack_size = 8;
        let mut session = Session::new(config);
        let exprs = parse_program("(+ 1 2) (undefined 1 2 3)").expect("parse failed");
        for _ in 0..100 {
            for expr in &exprs {
                session.submit(expr).expect("submit failed");
            }
        }
        assert_eq!(session.vm().stack_size(), 0);
        session
            .run_source("(print (* 6 7))", ExecMode::Incremental)
            .expect("run failed");
        assert_eq!(session.drain_output().last().map(String::as_str), Some("=> 42"));
    }

    #[test]
    fn session_recovers_after_a_fault() {
        let mut session = Session::default();
        let _ = session.run_source("(car 5)", ExecMode::Incremental);
        session
            .run_source("(print (+ 1 1))", ExecMode::Incremental)
            .expect("run failed");
        assert_eq!(session.drain_output(), vec!["=> 2"]);
    }
}
