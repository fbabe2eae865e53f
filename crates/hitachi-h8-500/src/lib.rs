//! Hitachi H8/500 series CPU (H8/532 flavour) running in maximum mode.
//!
//! Each call to `step()` executes one instruction, takes one interrupt or
//! idles one sleep slot, and reports the clock states it consumed.

pub mod bus;
pub mod cpu;
pub mod flags;
pub mod interrupt;
pub mod registers;

pub use bus::{FlatBus, H8Bus};
pub use cpu::{H8500, STATES_PER_INSTRUCTION};
pub use interrupt::{Dispatch, Exception, InterruptController, InterruptSource};
pub use registers::{Registers, Size};
