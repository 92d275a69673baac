//! # Bytecode Format
//!
//! This module defines the **opcode set** for the stack VM and the
//! little-endian readers the emitter and VM share to encode/decode operands.
//!
//! ## Binary layout
//! There is no header (unlike a richer bytecode container): a program is
//! simply a linear byte array, opcode byte followed immediately by its
//! operand bytes, ending in a `HALT` byte. See spec §6 for the full table.
//!
//! All multi-byte integer operands are little-endian two's-complement.
//! `PUSH` carries a 32-bit operand, `STORE`/`LOAD` a 32-bit slot index,
//! `JMP`/`JZ`/`JNZ` a 16-bit signed relative offset, and `CALL` a 32-bit
//! absolute address. `PUSHS` carries a 32-bit length prefix followed by that
//! many raw UTF-8 bytes.
//!
//! The `read_*` helpers are bounds-checked: an operand that runs past the
//! end of `code` raises `Fault::Memory` (spec §7: "read past bytecode end")
//! rather than panicking, the same way `PUSHS`'s length-prefixed body is
//! already bounds-checked in `vm::run`.

use crate::error::Fault;

/// Single-byte opcode identifiers, matching the hex values in spec §6.
pub mod op {
    pub const PUSH: u8 = 0x01;
    pub const POP: u8 = 0x02;
    pub const DUP: u8 = 0x03;
    pub const SWAP: u8 = 0x04;
    pub const OVER: u8 = 0x05;

    pub const ADD: u8 = 0x10;
    pub const SUB: u8 = 0x11;
    pub const MUL: u8 = 0x12;
    pub const DIV: u8 = 0x13;
    pub const MOD: u8 = 0x14;
    pub const NEG: u8 = 0x15;

    pub const AND: u8 = 0x20;
    pub const OR: u8 = 0x21;
    pub const NOT: u8 = 0x22;
    pub const CMP: u8 = 0x23;
    pub const EQ: u8 = 0x24;
    pub const NEQ: u8 = 0x25;

    pub const STORE: u8 = 0x30;
    pub const LOAD: u8 = 0x31;

    pub const JMP: u8 = 0x40;
    pub const JZ: u8 = 0x41;
    pub const JNZ: u8 = 0x42;
    pub const CALL: u8 = 0x43;
    pub const RET: u8 = 0x44;

    pub const PRINT: u8 = 0x50;
    pub const INPUT: u8 = 0x51;
    pub const HALT: u8 = 0x52;

    pub const PUSHS: u8 = 0x59;

    pub const NEWARRAY: u8 = 0x85;
    pub const GETINDEX: u8 = 0x86;
    pub const SETINDEX: u8 = 0x87;
}

/// Read a little-endian `i32` at `idx`, advancing past it. `ip` is the
/// instruction's starting position, reported on a short read.
pub fn read_i32(code: &[u8], idx: &mut usize, ip: usize) -> Result<i32, Fault> {
    let end = *idx + 4;
    if end > code.len() {
        return Err(Fault::Memory { ip, address: end as i64 });
    }
    let bytes: [u8; 4] = code[*idx..end].try_into().unwrap();
    *idx = end;
    Ok(i32::from_le_bytes(bytes))
}

/// Read a little-endian `u32` at `idx`, advancing past it. `ip` is the
/// instruction's starting position, reported on a short read.
pub fn read_u32(code: &[u8], idx: &mut usize, ip: usize) -> Result<u32, Fault> {
    let end = *idx + 4;
    if end > code.len() {
        return Err(Fault::Memory { ip, address: end as i64 });
    }
    let bytes: [u8; 4] = code[*idx..end].try_into().unwrap();
    *idx = end;
    Ok(u32::from_le_bytes(bytes))
}

/// Read a little-endian signed 16-bit relative jump offset at `idx`,
/// advancing past it. `ip` is the instruction's starting position, reported
/// on a short read.
pub fn read_i16(code: &[u8], idx: &mut usize, ip: usize) -> Result<i16, Fault> {
    let end = *idx + 2;
    if end > code.len() {
        return Err(Fault::Memory { ip, address: end as i64 });
    }
    let bytes: [u8; 2] = code[*idx..end].try_into().unwrap();
    *idx = end;
    Ok(i16::from_le_bytes(bytes))
}

/// Write a little-endian `i32` to `buf`.
pub fn write_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Write a little-endian `u32` to `buf`.
pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Write a little-endian signed 16-bit relative offset to `buf`.
pub fn write_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_round_trip_through_their_matching_writer() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -7);
        write_u32(&mut buf, 9);
        write_i16(&mut buf, -3);
        let mut idx = 0;
        assert_eq!(read_i32(&buf, &mut idx, 0).unwrap(), -7);
        assert_eq!(read_u32(&buf, &mut idx, 0).unwrap(), 9);
        assert_eq!(read_i16(&buf, &mut idx, 0).unwrap(), -3);
    }

    #[test]
    fn short_i32_read_is_a_memory_fault_not_a_panic() {
        let buf = vec![0u8; 3];
        let mut idx = 0;
        let err = read_i32(&buf, &mut idx, 0).unwrap_err();
        assert!(matches!(err, Fault::Memory { .. }));
    }

    #[test]
    fn short_u32_read_is_a_memory_fault_not_a_panic() {
        let buf = vec![0u8; 2];
        let mut idx = 0;
        let err = read_u32(&buf, &mut idx, 0).unwrap_err();
        assert!(matches!(err, Fault::Memory { .. }));
    }

    #[test]
    fn short_i16_read_is_a_memory_fault_not_a_panic() {
        let buf = vec![0u8; 1];
        let mut idx = 0;
        let err = read_i16(&buf, &mut idx, 0).unwrap_err();
        assert!(matches!(err, Fault::Memory { .. }));
    }
}
