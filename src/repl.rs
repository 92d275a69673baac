//! # Interactive REPL
//!
//! Reads lines from stdin, accumulates them until any open block
//! (`IF`/`WHILE`/`REPEAT`/`FOR`) is closed by its matching terminator
//! (`END IF`/`WEND`/`UNTIL`/`NEXT`), then compiles and runs the accumulated
//! buffer in-process against the running session's history - there is no
//! subprocess spawn, unlike a design that shells out to its own binary per
//! block, because this VM carries no global mutable state beyond what
//! [`basilisk::compile_and_run`] already reconstructs on every call.
//!
//! Because each block re-runs the full history from scratch, output is
//! diffed against the previous run so only genuinely new `PRINT` lines are
//! shown - re-executing `history` would otherwise reprint everything typed
//! so far.

use std::io::{self, Write};

use basilisk::compile_and_run;
use basilisk::host::BufferHost;

fn leading_keyword(line: &str) -> Option<String> {
    line.trim().split_whitespace().next().map(|w| w.to_uppercase())
}

fn depth_delta(line: &str) -> i32 {
    match leading_keyword(line).as_deref() {
        Some("IF") | Some("WHILE") | Some("REPEAT") | Some("FOR") => 1,
        Some("END") | Some("WEND") | Some("UNTIL") | Some("NEXT") => -1,
        _ => 0,
    }
}

/// Run an interactive REPL. Exits cleanly on EOF (Ctrl+D) or `exit`/`quit`.
pub fn run() {
    println!("basilisk - interactive session");
    println!("Type `exit` or `quit` to leave.");

    let mut history = String::new();
    let mut last_output_len = 0usize;
    let mut buffer = String::new();
    let mut depth: i32 = 0;

    loop {
        let prompt = if buffer.is_empty() { ">>> " } else { "... " };
        print!("{}", prompt);
        io::stdout().flush().ok();

        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            println!();
            break;
        }

        let trimmed = line.trim();
        if buffer.is_empty() && (trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit")) {
            break;
        }

        depth += depth_delta(&line);
        buffer.push_str(&line);
        if !line.ends_with('\n') {
            buffer.push('\n');
        }

        if depth > 0 {
            continue;
        }

        let source = format!("{}{}", history, buffer);
        let mut host = BufferHost::default();
        match compile_and_run(&source, &mut host) {
            Ok(()) => {
                for line in host.output.iter().skip(last_output_len) {
                    println!("{}", line);
                }
                last_output_len = host.output.len();
                history.push_str(&buffer);
            }
            Err(fault) => {
                eprintln!("{}", fault);
            }
        }

        buffer.clear();
        depth = 0;
    }
}
