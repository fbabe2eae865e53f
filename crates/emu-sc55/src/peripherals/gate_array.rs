//! Board gate array interrupt logic.
//!
//! Eight input lines feed one MCU IRQ pin (IRQ1, or IRQ0 on the JV-880).
//! A rising edge on an enabled line latches its number as the trigger; the
//! firmware reads the trigger register to find the source, which also
//! drops the IRQ. Line 0 never triggers.

/// Lines wired to the gate array.
pub mod line {
    /// PCM sample interrupt on first-generation boards.
    pub const PCM: u8 = 1;
    pub const ENCODER_DOWN: u8 = 3;
    pub const ENCODER_UP: u8 = 4;
}

#[derive(Debug, Clone, Default)]
pub struct GateArray {
    levels: u8,
    enable: u8,
    trigger: u8,
}

impl GateArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn set_line(&mut self, line: u8, active: bool) {
        let bit = 1u8 << (line & 7);
        if active && self.levels & bit == 0 && self.enable & bit != 0 {
            self.trigger = line & 7;
        }
        if active {
            self.levels |= bit;
        } else {
            self.levels &= !bit;
        }
    }

    pub fn write_enable(&mut self, value: u8) {
        self.enable = value;
    }

    #[must_use]
    pub const fn enable(&self) -> u8 {
        self.enable
    }

    /// Firmware read of the trigger register. Acknowledges the IRQ.
    pub fn read_trigger(&mut self) -> u8 {
        std::mem::take(&mut self.trigger)
    }

    /// IRQ output level.
    #[must_use]
    pub const fn irq(&self) -> bool {
        self.trigger != 0
    }
}
