//! # basilisk
//!
//! A complete execution pipeline for a small imperative, line-oriented
//! BASIC-family language: tokenizer → parser (AST) → IR lowering → bytecode
//! emission → stack-based VM (spec §1/§2).
//!
//! [`compile_and_run`] drives the whole pipeline for a single source string.
//! Each stage is also exposed as its own module so callers that only need a
//! prefix of the pipeline (e.g. a linter that stops after parsing) can use it
//! directly.

pub mod ast;
pub mod bytecode;
pub mod emit;
pub mod error;
pub mod host;
pub mod ir;
pub mod lower;
pub mod parser;
pub mod token;
pub mod value;
pub mod vm;

use error::Fault;
use host::Host;
use parser::Parser;
use vm::VmConfig;

/// Run `source` to completion against `host`, driving every stage of the
/// pipeline in turn (spec §2): tokenize, parse, lower to IR, emit bytecode,
/// then hand the byte array to the VM. The first [`Fault`] from any stage
/// aborts the whole call - there is no partial recovery.
pub fn compile_and_run(source: &str, host: &mut dyn Host) -> Result<(), Fault> {
    let code = compile(source)?;
    vm::run(&code, host, &VmConfig::default())
}

/// Run the tokenize → parse → lower → emit stages only, returning the
/// resolved bytecode without executing it.
pub fn compile(source: &str) -> Result<Vec<u8>, Fault> {
    let tokens = token::tokenize(source)?;
    let program = Parser::parse_program(tokens)?;
    let ir = lower::lower_program(&program);
    emit::emit(&ir)
}
