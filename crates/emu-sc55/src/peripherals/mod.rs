//! On-chip peripherals behind the register window, and the board devices
//! the firmware drives through the external bus.
//!
//! Peripherals never call back into the CPU. The bus advances them to the
//! current cycle count after each instruction and copies their request
//! lines into the interrupt controller.

pub mod adc;
pub mod buttons;
pub mod frt;
pub mod gate_array;
pub mod pcm;
pub mod sci;
pub mod submcu;
pub mod tmr;

use std::collections::VecDeque;

use tracing::debug;

/// Status flags acknowledged the H8 way: a flag clears when it is written
/// as 0 after having been read as 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckFlags {
    value: u8,
    seen: u8,
}

impl AckFlags {
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self { value, seen: 0 }
    }

    /// Current flags without side effects.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.value
    }

    #[must_use]
    pub const fn is_set(self, bits: u8) -> bool {
        self.value & bits != 0
    }

    pub fn set(&mut self, bits: u8) {
        self.value |= bits;
    }

    /// CPU read: remembers which flags were seen set.
    pub fn read(&mut self) -> u8 {
        self.seen = self.value;
        self.value
    }

    /// CPU write: clears flags in `mask` that were seen set and are written
    /// as 0. Returns the bits that were cleared.
    pub fn write(&mut self, data: u8, mask: u8) -> u8 {
        let cleared = self.value & self.seen & !data & mask;
        self.value &= !cleared;
        self.seen &= !cleared;
        cleared
    }
}

/// Bounded byte FIFO feeding a receiver. Bytes posted to a full queue are
/// dropped.
#[derive(Debug, Clone)]
pub struct ByteQueue {
    bytes: VecDeque<u8>,
    capacity: usize,
}

impl ByteQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, byte: u8) {
        if self.bytes.len() >= self.capacity {
            debug!(byte, "receive queue full, byte dropped");
            return;
        }
        self.bytes.push_back(byte);
    }

    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Divides the CPU clock for a counter. Remainder states carry over between
/// calls so the count never drifts.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Prescaler {
    remainder: u64,
}

impl Prescaler {
    /// Counter clocks produced by `states` CPU states at `divider`.
    pub(crate) fn clocks(&mut self, states: u64, divider: u64) -> u64 {
        let total = self.remainder + states;
        self.remainder = total % divider;
        total / divider
    }
}
