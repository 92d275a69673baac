//! # Error Handling for the Compiler & VM
//!
//! This module defines [`Fault`], the single error type that flows through
//! every stage of the pipeline: tokenizer, parser, AST→IR lowerer, IR→bytecode
//! emitter, and the virtual machine.
//!
//! ## Design
//! Each pipeline stage produces a distinctly-shaped error (unexpected
//! character, unexpected token, unresolved label, type mismatch, stack
//! underflow, bad memory access), so rather than one flat enum per module we
//! keep a single enum with one variant per *taxonomy*, each carrying whatever
//! location information that stage can offer (source line, or instruction
//! pointer). A fault aborts its stage immediately; there is no recovery, no
//! retry.
//!
//! ## Display
//! Implements [`fmt::Display`] for human-readable top-level reporting, and
//! [`std::error::Error`] so it composes with the rest of the ecosystem.

use std::fmt;

/// Errors that can occur anywhere in the tokenize → parse → lower → emit → run
/// pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// An unrecognized character was encountered while tokenizing.
    Tokenize { line: u32, ch: char },
    /// An unexpected token was encountered while parsing.
    Parse { line: u32, message: String },
    /// The IR→bytecode emitter could not finish: undefined variable read,
    /// an unresolved jump label, or an IR node it does not implement.
    Emit { message: String },
    /// A VM opcode saw an operand of the wrong tag.
    Type {
        expected: &'static str,
        actual: &'static str,
        ip: usize,
    },
    /// A VM opcode popped from (or otherwise touched) an empty operand stack,
    /// or a bad/unknown opcode byte, or an empty frame stack on `RET`.
    Stack { ip: usize, message: String },
    /// Array index out of range, undefined local slot, or read past the end
    /// of the bytecode.
    Memory { ip: usize, address: i64 },
    /// Division or modulo by zero.
    DivideByZero { ip: usize },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Tokenize { line, ch } => {
                write!(f, "TokenizeError: unexpected character '{}' on line {}", ch, line)
            }
            Fault::Parse { line, message } => {
                write!(f, "ParseError: {} (line {})", message, line)
            }
            Fault::Emit { message } => write!(f, "EmitError: {}", message),
            Fault::Type {
                expected,
                actual,
                ip,
            } => write!(
                f,
                "TypeError: expected {} but found {} at ip={}",
                expected, actual, ip
            ),
            Fault::Stack { ip, message } => {
                write!(f, "StackError: {} at ip={}", message, ip)
            }
            Fault::Memory { ip, address } => {
                write!(f, "MemoryError: invalid access to {} at ip={}", address, ip)
            }
            Fault::DivideByZero { ip } => {
                write!(f, "ArithmeticError: division or modulo by zero at ip={}", ip)
            }
        }
    }
}

impl std::error::Error for Fault {}
