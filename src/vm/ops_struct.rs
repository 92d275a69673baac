//! # Array Operations
//!
//! Implements `NEWARRAY`/`GETINDEX`/`SETINDEX` (spec §4.3/§4.4/§6), the only
//! compound-value opcodes this VM has. Arrays are reference-typed
//! (spec §3): [`Value::Array`] wraps an `Rc<RefCell<ArrayData>>`, so cloning
//! a value clones the handle, not the backing storage, and `SETINDEX`
//! mutation is visible through every other clone of the same array value.

use std::cell::RefCell;
use std::rc::Rc;

use super::{pop, push_checked, VmConfig};
use crate::error::Fault;
use crate::value::{ArrayData, Value};

/// `NEWARRAY`: `size -> array`. The size must be a non-negative `Int`; the
/// array is filled with `Null` and defaults to element type `"any"` (spec
/// §3: "declared element-type tag (default \"any\")").
pub(super) fn handle_newarray(stack: &mut Vec<Value>, ip: usize, config: &VmConfig) -> Result<(), Fault> {
    let size_val = pop(stack, ip)?;
    let size = match size_val {
        Value::Int(n) if n >= 0 => n as usize,
        other => return Err(Fault::Type { expected: "non-negative int", actual: other.type_name(), ip }),
    };
    let array = ArrayData {
        elements: vec![Value::Null; size],
        element_type: "any".to_string(),
    };
    push_checked(stack, Value::Array(Rc::new(RefCell::new(array))), ip, config)?;
    Ok(())
}

/// `GETINDEX`: `arr idx -> v` (index on top).
pub(super) fn handle_getindex(stack: &mut Vec<Value>, ip: usize, config: &VmConfig) -> Result<(), Fault> {
    let idx_val = pop(stack, ip)?;
    let arr_val = pop(stack, ip)?;
    let idx = as_index(&idx_val, ip)?;
    let array = as_array(&arr_val, ip)?;
    let elements = array.borrow();
    let v = elements
        .elements
        .get(idx)
        .cloned()
        .ok_or_else(|| Fault::Memory { ip, address: idx as i64 })?;
    drop(elements);
    push_checked(stack, v, ip, config)?;
    Ok(())
}

/// `SETINDEX`: `arr idx v ->` (value on top, no push; mutation propagates
/// through the shared reference - spec §4.3: "`SETINDEX` in the newer
/// design does not re-push the array").
pub(super) fn handle_setindex(stack: &mut Vec<Value>, ip: usize) -> Result<(), Fault> {
    let value = pop(stack, ip)?;
    let idx_val = pop(stack, ip)?;
    let arr_val = pop(stack, ip)?;
    let idx = as_index(&idx_val, ip)?;
    let array = as_array(&arr_val, ip)?;
    let mut elements = array.borrow_mut();
    let len = elements.elements.len();
    if idx >= len {
        return Err(Fault::Memory { ip, address: idx as i64 });
    }
    elements.elements[idx] = value;
    Ok(())
}

fn as_index(v: &Value, ip: usize) -> Result<usize, Fault> {
    match v {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        other => Err(Fault::Type { expected: "non-negative int", actual: other.type_name(), ip }),
    }
}

fn as_array(v: &Value, ip: usize) -> Result<Rc<RefCell<ArrayData>>, Fault> {
    match v {
        Value::Array(a) => Ok(a.clone()),
        other => Err(Fault::Type { expected: "array", actual: other.type_name(), ip }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newarray_fills_with_null() {
        let mut stack = vec![Value::Int(3)];
        handle_newarray(&mut stack, 0, &VmConfig::default()).unwrap();
        let arr = as_array(&stack[0], 0).unwrap();
        assert_eq!(arr.borrow().elements.len(), 3);
    }

    #[test]
    fn setindex_then_getindex_round_trips_through_shared_reference() {
        let mut stack = vec![Value::Int(2)];
        handle_newarray(&mut stack, 0, &VmConfig::default()).unwrap();
        let array_value = stack.pop().unwrap();

        let mut set_stack = vec![array_value.clone(), Value::Int(0), Value::Int(42)];
        handle_setindex(&mut set_stack, 0).unwrap();

        let mut get_stack = vec![array_value, Value::Int(0)];
        handle_getindex(&mut get_stack, 0, &VmConfig::default()).unwrap();
        assert!(matches!(get_stack[0], Value::Int(42)));
    }

    #[test]
    fn out_of_range_index_is_a_memory_fault() {
        let mut stack = vec![Value::Int(1)];
        handle_newarray(&mut stack, 0, &VmConfig::default()).unwrap();
        stack.push(Value::Int(5));
        let err = handle_getindex(&mut stack, 0, &VmConfig::default()).unwrap_err();
        assert!(matches!(err, Fault::Memory { .. }));
    }
}
