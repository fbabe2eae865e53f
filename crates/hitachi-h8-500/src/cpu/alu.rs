//! Arithmetic and logic with H8/500 condition codes.
//!
//! Every function returns the result together with the N, Z, V and C bits
//! it produces. Callers decide which of those bits the instruction keeps.

use crate::flags::{C, N, V, Z};
use crate::registers::Size;

/// N and Z for a result of the given size.
pub(super) const fn nz(value: u16, size: Size) -> u16 {
    let value = value & size.mask();
    let mut flags = 0;
    if value == 0 {
        flags |= Z;
    }
    if value & size.sign() != 0 {
        flags |= N;
    }
    flags
}

/// `a + b + carry`.
pub(super) const fn add(a: u16, b: u16, carry: bool, size: Size) -> (u16, u16) {
    let mask = size.mask() as u32;
    let a32 = a as u32 & mask;
    let b32 = b as u32 & mask;
    let sum = a32 + b32 + carry as u32;
    let result = (sum & mask) as u16;
    let mut flags = nz(result, size);
    if sum > mask {
        flags |= C;
    }
    if (a32 as u16 ^ result) & (b32 as u16 ^ result) & size.sign() != 0 {
        flags |= V;
    }
    (result, flags)
}

/// `a - b - borrow`.
pub(super) const fn sub(a: u16, b: u16, borrow: bool, size: Size) -> (u16, u16) {
    let mask = size.mask() as u32;
    let a32 = a as u32 & mask;
    let b32 = b as u32 & mask;
    let subtrahend = b32 + borrow as u32;
    let result = (a32.wrapping_sub(subtrahend) & mask) as u16;
    let mut flags = nz(result, size);
    if subtrahend > a32 {
        flags |= C;
    }
    if (a32 as u16 ^ b32 as u16) & (a32 as u16 ^ result) & size.sign() != 0 {
        flags |= V;
    }
    (result, flags)
}

/// Shift and rotate operations, in opcode order (0x18-0x1F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Shift {
    Shal,
    Shar,
    Shll,
    Shlr,
    Rotl,
    Rotr,
    Rotxl,
    Rotxr,
}

impl Shift {
    pub(super) const fn from_opcode(op: u8) -> Self {
        match op & 7 {
            0 => Self::Shal,
            1 => Self::Shar,
            2 => Self::Shll,
            3 => Self::Shlr,
            4 => Self::Rotl,
            5 => Self::Rotr,
            6 => Self::Rotxl,
            _ => Self::Rotxr,
        }
    }
}

/// One-bit shift or rotate. `carry` is the incoming C flag for ROTX.
pub(super) const fn shift(kind: Shift, value: u16, carry: bool, size: Size) -> (u16, u16) {
    let mask = size.mask();
    let sign = size.sign();
    let value = value & mask;
    let msb = value & sign != 0;
    let lsb = value & 1 != 0;
    let (result, carry_out) = match kind {
        Shift::Shal | Shift::Shll => ((value << 1) & mask, msb),
        Shift::Shar => ((value >> 1) | (value & sign), lsb),
        Shift::Shlr => (value >> 1, lsb),
        Shift::Rotl => (((value << 1) & mask) | msb as u16, msb),
        Shift::Rotr => ((value >> 1) | if lsb { sign } else { 0 }, lsb),
        Shift::Rotxl => (((value << 1) & mask) | carry as u16, msb),
        Shift::Rotxr => ((value >> 1) | if carry { sign } else { 0 }, lsb),
    };
    let mut flags = nz(result, size);
    if carry_out {
        flags |= C;
    }
    if matches!(kind, Shift::Shal) && msb != (result & sign != 0) {
        flags |= V;
    }
    (result, flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_add_overflow_and_carry() {
        assert_eq!(add(0x7F, 0x01, false, Size::Byte), (0x80, N | V));
        assert_eq!(add(0xFF, 0x01, false, Size::Byte), (0x00, Z | C));
        assert_eq!(add(0xFF, 0x00, true, Size::Byte), (0x00, Z | C));
    }

    #[test]
    fn word_add_wraps() {
        assert_eq!(add(0xFFFF, 0x0002, false, Size::Word), (0x0001, C));
        assert_eq!(add(0x4000, 0x4000, false, Size::Word), (0x8000, N | V));
    }

    #[test]
    fn subtract_borrow_and_overflow() {
        assert_eq!(sub(0x00, 0x01, false, Size::Byte), (0xFF, N | C));
        assert_eq!(sub(0x80, 0x01, false, Size::Byte), (0x7F, V));
        assert_eq!(sub(0x1234, 0x1234, false, Size::Word), (0, Z));
        assert_eq!(sub(0x0001, 0x0000, true, Size::Word), (0, Z));
    }

    #[test]
    fn byte_operations_ignore_high_byte() {
        assert_eq!(add(0x12FF, 0x3401, false, Size::Byte), (0x00, Z | C));
        assert_eq!(nz(0xFF00, Size::Byte), Z);
    }

    #[test]
    fn arithmetic_shift_left_overflow() {
        assert_eq!(shift(Shift::Shal, 0x40, false, Size::Byte), (0x80, N | V));
        assert_eq!(shift(Shift::Shll, 0x40, false, Size::Byte), (0x80, N));
        assert_eq!(shift(Shift::Shal, 0x80, false, Size::Byte), (0x00, Z | C | V));
    }

    #[test]
    fn right_shifts() {
        assert_eq!(shift(Shift::Shar, 0x8001, false, Size::Word), (0xC000, N | C));
        assert_eq!(shift(Shift::Shlr, 0x8001, false, Size::Word), (0x4000, C));
    }

    #[test]
    fn rotates() {
        assert_eq!(shift(Shift::Rotl, 0x81, false, Size::Byte), (0x03, C));
        assert_eq!(shift(Shift::Rotr, 0x01, false, Size::Byte), (0x80, N | C));
        assert_eq!(shift(Shift::Rotxl, 0x00, true, Size::Byte), (0x01, 0));
        assert_eq!(shift(Shift::Rotxr, 0x0001, true, Size::Word), (0x8000, N | C));
    }
}
