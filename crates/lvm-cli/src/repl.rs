//! Interactive session on top of rustyline.
//!
//! Every input line is compiled and run incrementally in one long-lived
//! session. Values an input leaves on the operand stack are dropped after it
//! runs; functions it defines stay available to later inputs.

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::error;

use lvm_core::{parse_program, LvmConfig, Session};

pub fn run(config: LvmConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("LVM {} - type exit or Ctrl-D to quit, :ir to toggle instruction echo", env!("CARGO_PKG_VERSION"));

    let mut session = Session::new(config);
    let mut rl = DefaultEditor::new()?;
    let mut echo_ir = false;

    loop {
        match rl.readline("lvm> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line == "exit" || line == "(exit)" {
                    break;
                }
                if line == ":ir" {
                    echo_ir = !echo_ir;
                    println!("instruction echo {}", if echo_ir { "on" } else { "off" });
                    continue;
                }

                let exprs = match parse_program(line) {
                    Ok(exprs) => exprs,
                    Err(e) => {
                        error!("{}", e);
                        continue;
                    }
                };

                for expr in &exprs {
                    let before = session.history().len();
                    let result = session.submit(expr);
                    if echo_ir {
                        for ir in &session.history()[before..] {
                            println!("  {}", ir);
                        }
                    }
                    for out in session.drain_output() {
                        println!("{}", out);
                    }
                    if let Err(e) = result {
                        error!("runtime error: {}", e);
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(Box::new(err)),
        }
    }

    Ok(())
}
