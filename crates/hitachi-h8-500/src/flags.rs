//! H8/500 status register flags.
//!
//! The status register is 16 bits:
//! - Bits 0-3: Condition codes
//!   - C (bit 0): Carry
//!   - V (bit 1): Overflow
//!   - Z (bit 2): Zero
//!   - N (bit 3): Negative
//! - Bits 4-7: Reserved (always 0)
//! - Bits 8-10: Interrupt mask (I0, I1, I2)
//! - Bits 11-14: Reserved (always 0)
//! - Bit 15: Trace mode (T)

/// Carry flag.
pub const C: u16 = 0x0001;
/// Overflow flag.
pub const V: u16 = 0x0002;
/// Zero flag.
pub const Z: u16 = 0x0004;
/// Negative flag.
pub const N: u16 = 0x0008;

/// Interrupt mask field (I2-I0).
pub const INT_MASK: u16 = 0x0700;
/// Trace mode flag.
pub const T: u16 = 0x8000;

/// Condition code bits.
pub const CCR_MASK: u16 = N | Z | V | C;
/// Every bit that exists in the status register.
pub const SR_MASK: u16 = 0x870F;

/// Set or clear `mask` in `sr` depending on `condition`.
#[must_use]
pub const fn set_if(sr: u16, mask: u16, condition: bool) -> u16 {
    if condition { sr | mask } else { sr & !mask }
}

/// Branch condition codes in opcode order (BRA, BRN, BHI, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    True,
    False,
    Hi,
    Ls,
    Cc,
    Cs,
    Ne,
    Eq,
    Vc,
    Vs,
    Pl,
    Mi,
    Ge,
    Lt,
    Gt,
    Le,
}

impl Condition {
    /// Decode the low nibble of a Bcc opcode.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x0F {
            0x0 => Self::True,
            0x1 => Self::False,
            0x2 => Self::Hi,
            0x3 => Self::Ls,
            0x4 => Self::Cc,
            0x5 => Self::Cs,
            0x6 => Self::Ne,
            0x7 => Self::Eq,
            0x8 => Self::Vc,
            0x9 => Self::Vs,
            0xA => Self::Pl,
            0xB => Self::Mi,
            0xC => Self::Ge,
            0xD => Self::Lt,
            0xE => Self::Gt,
            _ => Self::Le,
        }
    }

    /// Evaluate against a status register value.
    #[must_use]
    pub const fn holds(self, sr: u16) -> bool {
        let c = sr & C != 0;
        let v = sr & V != 0;
        let z = sr & Z != 0;
        let n = sr & N != 0;
        match self {
            Self::True => true,
            Self::False => false,
            Self::Hi => !(c || z),
            Self::Ls => c || z,
            Self::Cc => !c,
            Self::Cs => c,
            Self::Ne => !z,
            Self::Eq => z,
            Self::Vc => !v,
            Self::Vs => v,
            Self::Pl => !n,
            Self::Mi => n,
            Self::Ge => n == v,
            Self::Lt => n != v,
            Self::Gt => !z && n == v,
            Self::Le => z || n != v,
        }
    }
}
