//! # Stack-Based Bytecode Virtual Machine (Runtime)
//!
//! Executes a linear byte array (produced by [`crate::emit`]) directly,
//! without a pre-decoding step: the instruction pointer `ip` is a byte
//! offset into `code`, not an index into some decoded instruction array.
//! This is required by the jump-offset invariant (spec §3/§4.3): an offset
//! is relative to the byte position immediately following its own 2-byte
//! encoding, which only lines up if `ip` tracks bytes.
//!
//! ## High-level model
//! - **Data stack (`stack`)**: holds [`Value`]s consumed/produced by ops.
//! - **Frame stack (`frames`)**: one [`Frame`] per active call, each with its
//!   own local-slot map. The program starts with a single root frame whose
//!   `return_ip` sentinel (`usize::MAX`) marks "no caller" (spec §3: "initial
//!   frame has return address = sentinel, signalling program root").
//! - **Instruction pointer (`ip`)**: byte offset into `code`.
//!
//! `STORE`/`LOAD` index only the current frame's locals map - the reference
//! design's second, process-wide local table (spec §9 Open Questions) is not
//! carried forward; there is exactly one place a local can live.
//!
//! The machine fails fast: any opcode error returns a [`Fault`] immediately,
//! unwinding the dispatch loop. There is no exception-handling machinery.

use std::collections::HashMap;

use crate::bytecode::{op, read_i16, read_i32, read_u32};
use crate::error::Fault;
use crate::host::Host;
use crate::value::Value;

mod ops_arith;
mod ops_control;
mod ops_struct;

#[cfg(test)]
mod tests;

/// Sentinel `return_ip` for the program's root frame (spec §3).
const ROOT_RETURN_IP: usize = usize::MAX;

/// Activation record: return address, local-variable slots, and the number
/// of arguments the call was made with (spec §3).
pub(super) struct Frame {
    return_ip: usize,
    locals: HashMap<u32, Value>,
    argument_count: usize,
}

/// Tunable VM limits, constructed fresh per [`run`] call - never a process
/// global.
#[derive(Debug, Clone, Copy)]
pub struct VmConfig {
    pub stack_limit: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { stack_limit: 1024 }
    }
}

/// Pop a single [`Value`] from the data stack, or fault with the current
/// instruction pointer.
pub(super) fn pop(stack: &mut Vec<Value>, ip: usize) -> Result<Value, Fault> {
    stack
        .pop()
        .ok_or_else(|| Fault::Stack { ip, message: "stack underflow".to_string() })
}

pub(super) fn push_checked(stack: &mut Vec<Value>, v: Value, ip: usize, config: &VmConfig) -> Result<(), Fault> {
    if stack.len() >= config.stack_limit {
        return Err(Fault::Stack { ip, message: "data stack overflow".to_string() });
    }
    stack.push(v);
    Ok(())
}

/// Execute `code` to completion (`HALT` or falling off the end) or until a
/// typed fault escapes.
pub fn run(code: &[u8], host: &mut dyn Host, config: &VmConfig) -> Result<(), Fault> {
    let mut stack: Vec<Value> = Vec::new();
    let mut frames: Vec<Frame> = vec![Frame {
        return_ip: ROOT_RETURN_IP,
        locals: HashMap::new(),
        argument_count: 0,
    }];
    let mut ip: usize = 0;

    while ip < code.len() {
        let instr_ip = ip;
        let opcode = code[ip];
        ip += 1;

        match opcode {
            op::PUSH => {
                let v = read_i32(code, &mut ip, instr_ip)?;
                push_checked(&mut stack, Value::Int(v as i64), instr_ip, config)?;
            }
            op::PUSHS => {
                let len = read_u32(code, &mut ip, instr_ip)? as usize;
                if ip + len > code.len() {
                    return Err(Fault::Memory { ip: instr_ip, address: (ip + len) as i64 });
                }
                let bytes = &code[ip..ip + len];
                ip += len;
                let s = String::from_utf8_lossy(bytes).into_owned();
                push_checked(&mut stack, Value::Str(s), instr_ip, config)?;
            }
            op::POP => ops_control::handle_pop(&mut stack, instr_ip)?,
            op::DUP => ops_control::handle_dup(&mut stack, instr_ip, config)?,
            op::SWAP => ops_control::handle_swap(&mut stack, instr_ip)?,
            op::OVER => ops_control::handle_over(&mut stack, instr_ip, config)?,

            op::ADD => ops_arith::handle_add(&mut stack, instr_ip)?,
            op::SUB => ops_arith::handle_sub(&mut stack, instr_ip)?,
            op::MUL => ops_arith::handle_mul(&mut stack, instr_ip)?,
            op::DIV => ops_arith::handle_div(&mut stack, instr_ip)?,
            op::MOD => ops_arith::handle_mod(&mut stack, instr_ip)?,
            op::NEG => ops_arith::handle_neg(&mut stack, instr_ip)?,

            op::AND => ops_arith::handle_and(&mut stack, instr_ip)?,
            op::OR => ops_arith::handle_or(&mut stack, instr_ip)?,
            op::NOT => ops_arith::handle_not(&mut stack, instr_ip)?,
            op::CMP => ops_arith::handle_cmp(&mut stack, instr_ip)?,
            op::EQ => ops_arith::handle_eq(&mut stack, instr_ip)?,
            op::NEQ => ops_arith::handle_neq(&mut stack, instr_ip)?,

            op::STORE => {
                let slot = read_u32(code, &mut ip, instr_ip)?;
                let v = pop(&mut stack, instr_ip)?;
                frames.last_mut().unwrap().locals.insert(slot, v);
            }
            op::LOAD => {
                let slot = read_u32(code, &mut ip, instr_ip)?;
                let v = frames
                    .last()
                    .unwrap()
                    .locals
                    .get(&slot)
                    .cloned()
                    .ok_or_else(|| Fault::Memory { ip: instr_ip, address: slot as i64 })?;
                push_checked(&mut stack, v, instr_ip, config)?;
            }

            op::JMP => {
                let offset = read_i16(code, &mut ip, instr_ip)?;
                ip = (ip as i64 + offset as i64) as usize;
            }
            op::JZ => {
                let offset = read_i16(code, &mut ip, instr_ip)?;
                let cond = pop(&mut stack, instr_ip)?;
                if !is_truthy_condition(&cond, instr_ip)? {
                    ip = (ip as i64 + offset as i64) as usize;
                }
            }
            op::JNZ => {
                let offset = read_i16(code, &mut ip, instr_ip)?;
                let cond = pop(&mut stack, instr_ip)?;
                if is_truthy_condition(&cond, instr_ip)? {
                    ip = (ip as i64 + offset as i64) as usize;
                }
            }
            op::CALL => {
                let target = read_u32(code, &mut ip, instr_ip)? as usize;
                ops_control::handle_call(&mut stack, &mut frames, instr_ip, ip, target)?;
                ip = target;
            }
            op::RET => {
                ip = ops_control::handle_ret(&mut frames, instr_ip)?;
            }

            op::PRINT => {
                let v = pop(&mut stack, instr_ip)?;
                host.print(&v.to_display_string());
            }
            op::INPUT => {
                // spec §4.4: "prints a prompt, reads a line from the host".
                host.print("? ");
                let line = host.read_line();
                let v = match line.parse::<i64>() {
                    Ok(n) => Value::Int(n),
                    Err(_) => Value::Str(line),
                };
                push_checked(&mut stack, v, instr_ip, config)?;
            }
            op::HALT => return Ok(()),

            op::NEWARRAY => ops_struct::handle_newarray(&mut stack, instr_ip, config)?,
            op::GETINDEX => ops_struct::handle_getindex(&mut stack, instr_ip, config)?,
            op::SETINDEX => ops_struct::handle_setindex(&mut stack, instr_ip)?,

            other => {
                return Err(Fault::Stack {
                    ip: instr_ip,
                    message: format!("unknown opcode 0x{:02x}", other),
                })
            }
        }
    }

    Ok(())
}

/// `JZ`/`JNZ` accept INT 0 or BOOL false as "falsy"; any other tag is a type
/// fault (spec §4.4: "Any other tag on the condition is a type fault").
fn is_truthy_condition(v: &Value, ip: usize) -> Result<bool, Fault> {
    match v {
        Value::Int(n) => Ok(*n != 0),
        Value::Bool(b) => Ok(*b),
        other => Err(Fault::Type { expected: "int or bool", actual: other.type_name(), ip }),
    }
}
