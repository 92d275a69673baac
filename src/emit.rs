//! # IR → Bytecode Emitter
//!
//! Two logical passes over a growing byte buffer (spec §4.3): an **emit
//! pass** that walks the IR list once, appending opcode and operand bytes
//! and recording forward-jump placeholders, and a **fixup pass** that
//! rewrites every placeholder into a signed 16-bit relative offset once all
//! labels have been placed. This, together with the parser and the VM, is
//! one of the three "hard core" components of the pipeline: it is where
//! control-flow constructs are expanded into the VM's smaller instruction
//! set and where relational operators that have no direct opcode (`<`,
//! `<=`, `>`, `>=`) are built out of `CMP`.
//!
//! ## Departures from the literal spec text (recorded in DESIGN.md)
//! - `<=`/`>=` are emitted as `CMP; DUP; PUSH(-1|1); EQ; SWAP; PUSH(0); EQ; OR`
//!   rather than the naive `CMP; PUSH(-1|1); EQ; PUSH(0); EQ; OR` spec §4.3
//!   describes, because the naive sequence re-compares the *first* `EQ`'s
//!   boolean result against `0` instead of comparing the original `CMP`
//!   result against `0` - it does not compute "less-than or equal" at all.
//!   The `DUP`/`SWAP` form keeps a copy of the `CMP` result alive for both
//!   comparisons, which is what spec §8 requires ("`a <= b` iff `a < b` or
//!   `a == b`").
//! - `FOR` loop termination tests `v > to` (continue while `v <= to`)
//!   instead of the literal "exact equality via `CMP`+`JZ`" spec §4.3
//!   describes, because the exact-equality test would skip the body on the
//!   final iteration (`FOR I = 1 TO 3` would print `1 2` instead of the
//!   `1 2 3` spec §8 scenario 3 requires) whenever the step is the default
//!   `1`. This is the "decide whether to match the reference or fix to an
//!   inequality test" choice spec §9 explicitly leaves open; we fix it.
//!   As spec §9 notes, step sign still is not validated: this inequality
//!   test only terminates for non-negative steps.
//!
//! ## Reserved, unimplemented IR
//! `Ir::Call` (builtin `LEN`/`VAL`/`ISNAN` invocations, and the dead
//! `CustomCall` path) has no opcode expansion and raises
//! [`Fault::Emit`]. Likewise `Goto` labels produced for `CONTINUE`/`EXIT`
//! are never placed, so a program using either raises an unresolved-label
//! fault in the fixup pass - both are reserved per spec §4.2/§1.

use std::collections::HashMap;

use crate::bytecode::{op, write_i16, write_i32, write_u32};
use crate::error::Fault;
use crate::ir::{ConstType, Ir};

/// Per-compilation builder state: label table, fixup list, and local-slot
/// counter. Instantiated once per [`emit`] call - never a process global.
struct Emitter {
    code: Vec<u8>,
    labels: HashMap<String, usize>,
    /// (byte position of the 2-byte placeholder, label it refers to)
    fixups: Vec<(usize, String)>,
    locals: HashMap<String, u32>,
    next_slot: u32,
    label_counter: u32,
}

impl Emitter {
    fn new() -> Self {
        Emitter {
            code: Vec::new(),
            labels: HashMap::new(),
            fixups: Vec::new(),
            locals: HashMap::new(),
            next_slot: 0,
            label_counter: 0,
        }
    }

    fn fresh_label(&mut self, tag: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("__{}_{}", tag, n)
    }

    fn place_label(&mut self, name: &str) {
        self.labels.insert(name.to_string(), self.code.len());
    }

    /// Reserve (on first assignment) or look up the local slot for `name`.
    fn slot_for_assign(&mut self, name: &str) -> u32 {
        if let Some(&slot) = self.locals.get(name) {
            slot
        } else {
            let slot = self.next_slot;
            self.next_slot += 1;
            self.locals.insert(name.to_string(), slot);
            slot
        }
    }

    fn slot_for_read(&self, name: &str) -> Result<u32, Fault> {
        self.locals
            .get(name)
            .copied()
            .ok_or_else(|| Fault::Emit { message: format!("undefined variable: {}", name) })
    }

    fn push_op(&mut self, opcode: u8) {
        self.code.push(opcode);
    }

    fn push_jump(&mut self, opcode: u8, label: &str) {
        self.code.push(opcode);
        let pos = self.code.len();
        write_i16(&mut self.code, 0); // placeholder, rewritten in the fixup pass
        self.fixups.push((pos, label.to_string()));
    }

    fn emit_const(&mut self, value: &str, ty: ConstType) -> Result<(), Fault> {
        match ty {
            ConstType::Int => {
                let n: i32 = value.parse().map_err(|_| Fault::Emit {
                    message: format!("integer literal out of range: {}", value),
                })?;
                self.push_op(op::PUSH);
                write_i32(&mut self.code, n);
            }
            ConstType::Str => {
                self.push_op(op::PUSHS);
                let bytes = value.as_bytes();
                write_u32(&mut self.code, bytes.len() as u32);
                self.code.extend_from_slice(bytes);
            }
            ConstType::Float => {
                // The wire format (spec §6) has no float-literal opcode - only
                // PUSH (int32) and PUSHS (length-prefixed string). Reserved,
                // unimplemented, like IrCall and the Continue/Exit gotos.
                return Err(Fault::Emit {
                    message: format!("floating-point literal not implemented: {}", value),
                });
            }
        }
        Ok(())
    }

    fn emit_node(&mut self, node: &Ir) -> Result<(), Fault> {
        match node {
            Ir::Const { value, ty } => self.emit_const(value, *ty)?,
            Ir::Var { name } => {
                let slot = self.slot_for_read(name)?;
                self.push_op(op::LOAD);
                write_u32(&mut self.code, slot);
            }
            Ir::Let { name, expr } => {
                self.emit_node(expr)?;
                let slot = self.slot_for_assign(name);
                self.push_op(op::STORE);
                write_u32(&mut self.code, slot);
            }
            Ir::Print { expr } => {
                self.emit_node(expr)?;
                self.push_op(op::PRINT);
            }
            Ir::Binary { op: bop, left, right } => self.emit_binary(bop, left, right)?,
            Ir::Unary { op: uop, operand } => {
                self.emit_node(operand)?;
                match uop.as_str() {
                    "-" => self.push_op(op::NEG),
                    "NOT" => self.push_op(op::NOT),
                    other => {
                        return Err(Fault::Emit { message: format!("unknown unary operator: {}", other) })
                    }
                }
            }
            Ir::Call { name, .. } => {
                // Builtins (LEN/VAL/ISNAN) and the unreachable CustomCall path:
                // reserved, not implemented by this emitter (spec §4.2).
                return Err(Fault::Emit { message: format!("builtin call not implemented: {}", name) });
            }
            Ir::If { cond, then_body, else_body } => self.emit_if(cond, then_body, else_body.as_deref())?,
            Ir::While { cond, body } => self.emit_while(cond, body)?,
            Ir::Repeat { body, cond } => self.emit_repeat(body, cond)?,
            Ir::For { var, from, to, step, body } => self.emit_for(var, from, to, step.as_deref(), body)?,
            Ir::Input { names } => {
                for name in names {
                    self.push_op(op::INPUT);
                    let slot = self.slot_for_assign(name);
                    self.push_op(op::STORE);
                    write_u32(&mut self.code, slot);
                }
            }
            Ir::Goto { label } => {
                // CONTINUE/EXIT markers: reserved, left unresolved on purpose
                // (spec §4.2) - the fixup pass will fault if one is ever
                // reached, since no matching `place_label` call exists.
                self.push_jump(op::JMP, label);
            }
            Ir::Label { name } => self.place_label(name),
            Ir::Index { target, index } => {
                self.emit_node(target)?;
                self.emit_node(index)?;
                self.push_op(op::GETINDEX);
            }
            Ir::StoreIndex { target, index, value } => {
                self.emit_node(target)?;
                self.emit_node(index)?;
                self.emit_node(value)?;
                self.push_op(op::SETINDEX);
            }
            Ir::NewArray { size, .. } => {
                self.emit_node(size)?;
                self.push_op(op::NEWARRAY);
            }
        }
        Ok(())
    }

    fn emit_binary(&mut self, bop: &str, left: &Ir, right: &Ir) -> Result<(), Fault> {
        match bop {
            "+" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::ADD);
            }
            "-" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::SUB);
            }
            "*" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::MUL);
            }
            "/" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::DIV);
            }
            "%" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::MOD);
            }
            "^" => {
                // No exponentiation opcode in the wire format (spec §6):
                // reserved, unimplemented, same as IrCall.
                return Err(Fault::Emit { message: "exponentiation ('^') not implemented".to_string() });
            }
            "==" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::EQ);
            }
            "!=" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::NEQ);
            }
            "AND" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::AND);
            }
            "OR" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::OR);
            }
            "<" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::CMP);
                self.push_op(op::PUSH);
                write_i32(&mut self.code, -1);
                self.push_op(op::EQ);
            }
            ">" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::CMP);
                self.push_op(op::PUSH);
                write_i32(&mut self.code, 1);
                self.push_op(op::EQ);
            }
            "<=" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::CMP);
                self.push_op(op::DUP);
                self.push_op(op::PUSH);
                write_i32(&mut self.code, -1);
                self.push_op(op::EQ);
                self.push_op(op::SWAP);
                self.push_op(op::PUSH);
                write_i32(&mut self.code, 0);
                self.push_op(op::EQ);
                self.push_op(op::OR);
            }
            ">=" => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.push_op(op::CMP);
                self.push_op(op::DUP);
                self.push_op(op::PUSH);
                write_i32(&mut self.code, 1);
                self.push_op(op::EQ);
                self.push_op(op::SWAP);
                self.push_op(op::PUSH);
                write_i32(&mut self.code, 0);
                self.push_op(op::EQ);
                self.push_op(op::OR);
            }
            other => return Err(Fault::Emit { message: format!("unknown binary operator: {}", other) }),
        }
        Ok(())
    }

    fn emit_if(&mut self, cond: &Ir, then_body: &[Ir], else_body: Option<&[Ir]>) -> Result<(), Fault> {
        let else_label = self.fresh_label("else");
        let end_label = self.fresh_label("endif");
        self.emit_node(cond)?;
        self.push_jump(op::JZ, &else_label);
        for n in then_body {
            self.emit_node(n)?;
        }
        self.push_jump(op::JMP, &end_label);
        self.place_label(&else_label);
        if let Some(else_body) = else_body {
            for n in else_body {
                self.emit_node(n)?;
            }
        }
        self.place_label(&end_label);
        Ok(())
    }

    fn emit_while(&mut self, cond: &Ir, body: &[Ir]) -> Result<(), Fault> {
        let start_label = self.fresh_label("wstart");
        let end_label = self.fresh_label("wend");
        self.place_label(&start_label);
        self.emit_node(cond)?;
        self.push_jump(op::JZ, &end_label);
        for n in body {
            self.emit_node(n)?;
        }
        self.push_jump(op::JMP, &start_label);
        self.place_label(&end_label);
        Ok(())
    }

    fn emit_repeat(&mut self, body: &[Ir], cond: &Ir) -> Result<(), Fault> {
        let start_label = self.fresh_label("rstart");
        self.place_label(&start_label);
        for n in body {
            self.emit_node(n)?;
        }
        self.emit_node(cond)?;
        // Loop while cond is false: JZ jumps back to start when the popped
        // condition is zero/false; falls through (exits) once it is truthy.
        self.push_jump(op::JZ, &start_label);
        Ok(())
    }

    fn emit_for(
        &mut self,
        var: &str,
        from: &Ir,
        to: &Ir,
        step: Option<&Ir>,
        body: &[Ir],
    ) -> Result<(), Fault> {
        self.emit_node(from)?;
        let slot = self.slot_for_assign(var);
        self.push_op(op::STORE);
        write_u32(&mut self.code, slot);

        let start_label = self.fresh_label("fstart");
        let end_label = self.fresh_label("fend");
        self.place_label(&start_label);

        // Continue while `v <= to` (v > to ends the loop) - see module docs
        // for why this departs from the literal exact-equality test in §4.3.
        self.push_op(op::LOAD);
        write_u32(&mut self.code, slot);
        self.emit_node(to)?;
        self.push_op(op::CMP);
        self.push_op(op::PUSH);
        write_i32(&mut self.code, 1);
        self.push_op(op::EQ);
        self.push_jump(op::JNZ, &end_label);

        for n in body {
            self.emit_node(n)?;
        }

        self.push_op(op::LOAD);
        write_u32(&mut self.code, slot);
        match step {
            Some(step_expr) => self.emit_node(step_expr)?,
            None => {
                self.push_op(op::PUSH);
                write_i32(&mut self.code, 1);
            }
        }
        self.push_op(op::ADD);
        self.push_op(op::STORE);
        write_u32(&mut self.code, slot);
        self.push_jump(op::JMP, &start_label);
        self.place_label(&end_label);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, Fault> {
        self.push_op(op::HALT);
        for (pos, label) in &self.fixups {
            let target = self
                .labels
                .get(label)
                .copied()
                .ok_or_else(|| Fault::Emit { message: format!("unresolved label: {}", label) })?;
            let offset = target as i64 - (*pos as i64 + 2);
            if offset < i16::MIN as i64 || offset > i16::MAX as i64 {
                return Err(Fault::Emit { message: format!("jump offset out of range for label {}", label) });
            }
            let offset = offset as i16;
            let bytes = offset.to_le_bytes();
            self.code[*pos] = bytes[0];
            self.code[*pos + 1] = bytes[1];
        }
        Ok(self.code)
    }
}

/// Emit a flat IR node list into a linear, immutable byte array ending in
/// `HALT`, with every forward jump resolved to a signed 16-bit relative
/// offset.
pub fn emit(ir: &[Ir]) -> Result<Vec<u8>, Fault> {
    let mut emitter = Emitter::new();
    for node in ir {
        emitter.emit_node(node)?;
    }
    emitter.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::read_i16;
    use crate::lower::lower_program;
    use crate::parser::Parser;
    use crate::token::tokenize;

    fn compile(src: &str) -> Vec<u8> {
        let program = Parser::parse_program(tokenize(src).unwrap()).unwrap();
        let ir = lower_program(&program);
        emit(&ir).unwrap()
    }

    #[test]
    fn every_emitted_program_ends_in_halt() {
        let code = compile("LET X = 1\nPRINT X\n");
        assert_eq!(*code.last().unwrap(), op::HALT);
    }

    #[test]
    fn jump_offsets_land_on_a_valid_opcode_boundary() {
        let code = compile("LET I = 0\nWHILE I < 3\nPRINT I\nLET I = I + 1\nWEND\n");
        let mut idx = 0;
        while idx < code.len() {
            let opcode = code[idx];
            idx += 1;
            match opcode {
                op::JZ | op::JNZ | op::JMP => {
                    let mut cursor = idx;
                    let offset = read_i16(&code, &mut cursor, idx).unwrap();
                    let target = (cursor as i64 + offset as i64) as usize;
                    assert!(target <= code.len(), "jump target out of range");
                    idx = cursor;
                }
                op::PUSH => idx += 4,
                op::STORE | op::LOAD => idx += 4,
                op::PUSHS => {
                    let mut cursor = idx;
                    let len = crate::bytecode::read_u32(&code, &mut cursor, idx).unwrap() as usize;
                    idx = cursor + len;
                }
                op::CALL => idx += 4,
                _ => {}
            }
        }
    }

    #[test]
    fn undefined_variable_read_raises_emit_fault() {
        let program = Parser::parse_program(tokenize("PRINT X\n").unwrap()).unwrap();
        let ir = lower_program(&program);
        let err = emit(&ir).unwrap_err();
        assert!(matches!(err, Fault::Emit { .. }));
    }

    #[test]
    fn local_slot_allocation_is_monotonic_in_assignment_order() {
        // `x` assigned before `y`: slot(x) < slot(y).
        let program = Parser::parse_program(tokenize("LET X = 1\nLET Y = 2\n").unwrap()).unwrap();
        let ir = lower_program(&program);
        let mut emitter = Emitter::new();
        for node in &ir {
            emitter.emit_node(node).unwrap();
        }
        assert!(emitter.locals["x"] < emitter.locals["y"]);
    }
}
