//! # Host I/O Abstraction
//!
//! The VM never touches `stdout`/`stdin` directly; every `PRINT`/`INPUT`
//! opcode goes through this trait instead, so the dispatch loop in
//! [`crate::vm`] can be exercised with canned input and captured output in
//! tests instead of the real terminal.
//!
//! `StdHost` is what the CLI driver and REPL construct; `BufferHost` backs
//! the VM's own test suite.

/// A line-oriented print sink and blocking line source.
pub trait Host {
    fn print(&mut self, s: &str);
    fn read_line(&mut self) -> String;
}

/// Talks to the real process stdout/stdin.
pub struct StdHost;

impl Host for StdHost {
    fn print(&mut self, s: &str) {
        println!("{}", s);
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return String::new();
        }
        line.trim_end_matches(['\n', '\r']).to_string()
    }
}

/// Records every `PRINT` line and serves `INPUT` from a pre-loaded queue.
/// Used by the VM's own tests and by the end-to-end scenario tests.
#[derive(Default)]
pub struct BufferHost {
    pub output: Vec<String>,
    input: std::collections::VecDeque<String>,
}

impl BufferHost {
    pub fn with_input(lines: &[&str]) -> Self {
        BufferHost {
            output: Vec::new(),
            input: lines.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Host for BufferHost {
    fn print(&mut self, s: &str) {
        self.output.push(s.to_string());
    }

    fn read_line(&mut self) -> String {
        self.input.pop_front().unwrap_or_default()
    }
}
