//! # Value Representation for the VM
//!
//! This module defines [`Value`], the tagged runtime type used on the
//! virtual machine's operand stack and in local/frame storage.
//!
//! ## Supported types
//! - `Int(i64)` - 64-bit signed integer
//! - `Float(f64)` - 64-bit floating point
//! - `Str(String)` - UTF-8 string
//! - `Bool(bool)` - boolean truth value
//! - `Array(Rc<RefCell<ArrayData>>)` - mutable, reference-counted, fixed-length
//!   sequence carrying a declared element-type tag
//! - `Null` - sentinel for "no value"
//!
//! ## Design
//! Arrays are reference-typed: cloning a `Value::Array` clones the `Rc`, not
//! the backing `Vec`, so `NEWARRAY`/`GETINDEX`/`SETINDEX` observe the same
//! storage through every copy of the value. This mirrors the way compound
//! values are represented elsewhere in this kind of VM (mutable collections
//! wrapped in `Rc<RefCell<_>>` for shared ownership with interior mutability)
//! rather than routing array access through a separate handle table - Rust's
//! ownership model gives us the aliasing-with-mutation semantics directly.
//!
//! ## Coercion rules
//! Unlike a dynamically-typed language runtime, arithmetic here is strict:
//! `as_int`/`as_float`/`as_bool` are used only where the VM already knows,
//! from its own tag check, that the coercion is legal. They do not attempt
//! to paper over a type mismatch - that is the job of the opcode handler,
//! which raises a typed fault instead.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Backing storage for an `Array` value: its elements plus the element-type
/// tag declared (or defaulted to `"any"`) when the array was created.
pub struct ArrayData {
    pub elements: Vec<Value>,
    pub element_type: String,
}

/// Value type for the VM operand stack, local slots, and array elements.
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Boolean truth value.
    Bool(bool),
    /// Mutable, reference-counted, fixed-length array.
    Array(Rc<RefCell<ArrayData>>),
    /// Sentinel for "no value".
    Null,
}

impl Value {
    /// The tag name used in type-fault messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
            Value::Null => "null",
        }
    }

    /// Structural equality of the underlying payload, regardless of tag, used
    /// by `EQ`/`NEQ` (spec: "compare by structural value equality of the
    /// underlying payload regardless of tag").
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Canonical textual form used by `PRINT`. Arrays print as `[e0, e1, ...]`.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(fl) => fl.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Array(a) => {
                let elems: Vec<String> = a
                    .borrow()
                    .elements
                    .iter()
                    .map(|v| v.to_display_string())
                    .collect();
                format!("[{}]", elems.join(", "))
            }
            Value::Null => "null".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}
