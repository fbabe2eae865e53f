//! CPU core trait.

use crate::{Bus, Ticks};

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. The bus is
/// passed in, not owned, so it can be shared with the peripherals that the
/// machine advances between instructions.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu<B: Bus> {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction (or one idle slot while sleeping).
    ///
    /// Returns the number of clock states consumed.
    fn step(&mut self, bus: &mut B) -> Ticks;

    /// Returns the current program counter.
    ///
    /// Returns `u32` so paged CPUs can report the full code address.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted or sleeping.
    fn is_halted(&self) -> bool;

    /// Reset the CPU, fetching the reset vector through the bus.
    fn reset(&mut self, bus: &mut B);
}
