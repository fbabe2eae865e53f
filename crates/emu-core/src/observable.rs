//! Read-only state inspection.
//!
//! Debuggers, tests and the frontend look at emulator state through dotted
//! paths (`cpu.pc`, `lcd.line0`, `memory.0xFE00`). A query must never change
//! anything: peripheral reads with side effects are not reachable from here.

use std::fmt;

/// Result of a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    String(String),
}

impl fmt::Display for Value {
    /// Register-sized integers print as zero-padded hex, counters as decimal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v:#04X}"),
            Self::U16(v) => write!(f, "{v:#06X}"),
            Self::U32(v) => write!(f, "{v:#010X}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        })*
    };
}

value_from!(bool => Bool, u8 => U8, u16 => U16, u32 => U32, u64 => U64, String => String);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

/// Parse the address part of a `memory.<address>` path. Accepts `0x`-prefixed
/// hex or plain decimal.
#[must_use]
pub fn parse_address(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// A component whose state can be inspected by path.
pub trait Observable {
    /// Look up `path`. Unknown paths give `None`.
    fn query(&self, path: &str) -> Option<Value>;

    /// Paths `query` understands. Entries in angle brackets are templates.
    fn query_paths(&self) -> &'static [&'static str];
}
