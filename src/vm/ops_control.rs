//! # Stack Manipulation and Call/Return Operations
//!
//! Implements `POP`/`DUP`/`SWAP`/`OVER` and the frame-based `CALL`/`RET`
//! pair (spec §4.4, §6). Every handler here either touches only the data
//! stack, or additionally pushes/pops a [`super::Frame`] on the frame stack;
//! neither the instruction pointer advance nor the `STORE`/`LOAD` local
//! lookups live here - those stay in [`crate::vm::run`]'s dispatch loop.

use std::collections::HashMap;

use super::{pop, push_checked, Frame, VmConfig};
use crate::error::Fault;
use crate::value::Value;

/// `POP`: `v ->`.
pub(super) fn handle_pop(stack: &mut Vec<Value>, ip: usize) -> Result<(), Fault> {
    pop(stack, ip)?;
    Ok(())
}

/// `DUP`: `a -> a a`.
pub(super) fn handle_dup(stack: &mut Vec<Value>, ip: usize, config: &VmConfig) -> Result<(), Fault> {
    let a = pop(stack, ip)?;
    push_checked(stack, a.clone(), ip, config)?;
    push_checked(stack, a, ip, config)?;
    Ok(())
}

/// `SWAP`: `a b -> b a`.
pub(super) fn handle_swap(stack: &mut Vec<Value>, ip: usize) -> Result<(), Fault> {
    let b = pop(stack, ip)?;
    let a = pop(stack, ip)?;
    stack.push(b);
    stack.push(a);
    Ok(())
}

/// `OVER`: `a b -> a b a`.
pub(super) fn handle_over(stack: &mut Vec<Value>, ip: usize, config: &VmConfig) -> Result<(), Fault> {
    let b = pop(stack, ip)?;
    let a = pop(stack, ip)?;
    push_checked(stack, a.clone(), ip, config)?;
    push_checked(stack, b, ip, config)?;
    push_checked(stack, a, ip, config)?;
    Ok(())
}

/// `CALL`: pops the argument count, then that many arguments (last-pushed
/// becomes local 0, via reverse fill - spec §4.4), and pushes a new frame
/// whose `return_ip` is the instruction pointer immediately after `CALL`'s
/// own operand (the caller advances `ip` to `target` itself once this
/// returns).
pub(super) fn handle_call(
    stack: &mut Vec<Value>,
    frames: &mut Vec<Frame>,
    ip: usize,
    return_ip: usize,
    _target: usize,
) -> Result<(), Fault> {
    let argc_val = pop(stack, ip)?;
    let argc = match argc_val {
        Value::Int(n) if n >= 0 => n as usize,
        other => return Err(Fault::Type { expected: "int", actual: other.type_name(), ip }),
    };
    let mut locals: HashMap<u32, Value> = HashMap::with_capacity(argc);
    for slot in 0..argc {
        let arg = pop(stack, ip)?;
        locals.insert(slot as u32, arg);
    }
    frames.push(Frame {
        return_ip,
        locals,
        argument_count: argc,
    });
    Ok(())
}

/// `RET`: pops the current frame and returns its `return_ip`. Popping the
/// root frame (the one with no caller) is a fault (spec §4.4: "returning
/// with an empty frame stack is a fault").
pub(super) fn handle_ret(frames: &mut Vec<Frame>, ip: usize) -> Result<usize, Fault> {
    if frames.len() <= 1 {
        return Err(Fault::Stack { ip, message: "RET with no caller frame".to_string() });
    }
    let frame = frames.pop().unwrap();
    Ok(frame.return_ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dup_duplicates_top_of_stack() {
        let mut stack = vec![Value::Int(7)];
        handle_dup(&mut stack, 0, &VmConfig::default()).unwrap();
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn swap_exchanges_top_two() {
        let mut stack = vec![Value::Int(1), Value::Int(2)];
        handle_swap(&mut stack, 0).unwrap();
        assert!(matches!(stack[0], Value::Int(2)));
        assert!(matches!(stack[1], Value::Int(1)));
    }

    #[test]
    fn over_copies_second_to_top() {
        let mut stack = vec![Value::Int(1), Value::Int(2)];
        handle_over(&mut stack, 0, &VmConfig::default()).unwrap();
        assert_eq!(stack.len(), 3);
        assert!(matches!(stack[2], Value::Int(1)));
    }

    #[test]
    fn ret_on_root_frame_is_a_fault() {
        let mut frames = vec![Frame {
            return_ip: usize::MAX,
            locals: HashMap::new(),
            argument_count: 0,
        }];
        assert!(handle_ret(&mut frames, 0).is_err());
    }
}
