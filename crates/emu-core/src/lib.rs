//! Core traits and types for cycle-counted emulation.
//!
//! Every component advances against a single monotonic cycle count derived
//! from the master crystal. Peripherals catch up to the CPU after each
//! instruction, never the other way round.

mod bits;
mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bits::{bit_ceil, bit_floor, closest_power_of_two, has_single_bit, saturating_add_i32};
pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value, parse_address};
pub use ticks::Ticks;
