//! basilisk CLI entry point.
//!
//! Behavior summary:
//! - With **no args**, start an interactive REPL.
//! - With `-h/--help`, print usage.
//! - With `-v/--version`, print build-target + version.
//! - With a script path, read the file as source text and run it through
//!   the full tokenize → parse → lower → emit → VM pipeline.

use std::env;
use std::fs;
use std::process::ExitCode;

use basilisk::compile_and_run;
use basilisk::host::StdHost;

mod repl;

/// Human-facing runtime version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> String {
    format!(
        r#"basilisk v{0}

Usage:
    basilisk <script.bas>

Arguments:
    <script.bas>
        Path to a BASIC-family source file to run.

Example:
    basilisk hello.bas

Options:
    -h, --help
        Show this help message and exit.
    -v, --version
        Show runtime version."#,
        VERSION
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() == 1 {
        repl::run();
        return ExitCode::SUCCESS;
    }

    if args[1] == "-h" || args[1] == "--help" {
        println!("{}", usage());
        return ExitCode::SUCCESS;
    }

    if args[1] == "-v" || args[1] == "--version" {
        println!(
            "basilisk-build-{}-{}: v{}",
            env::consts::OS,
            env::consts::ARCH,
            VERSION
        );
        return ExitCode::SUCCESS;
    }

    let path = &args[1];
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut host = StdHost;
    if let Err(fault) = compile_and_run(&source, &mut host) {
        eprintln!("{}", fault);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
