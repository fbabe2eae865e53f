//! Front panel buttons and the infrared remote.
//!
//! The pressed mask is shared with the UI thread, so it lives in an atomic.
//! The firmware scans it in 8-button rows selected by the I/O select latch;
//! pressed buttons read as 0.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// SC-55 family button bits.
pub mod sc55 {
    pub const POWER: u32 = 0;
    pub const INST_L: u32 = 3;
    pub const INST_R: u32 = 4;
    pub const INST_MUTE: u32 = 5;
    pub const INST_ALL: u32 = 6;
    pub const MIDI_CH_L: u32 = 8;
    pub const MIDI_CH_R: u32 = 9;
    pub const CHORUS_L: u32 = 10;
    pub const CHORUS_R: u32 = 11;
    pub const PAN_L: u32 = 12;
    pub const PAN_R: u32 = 13;
    pub const PART_R: u32 = 14;
    pub const KEY_SHIFT_L: u32 = 16;
    pub const KEY_SHIFT_R: u32 = 17;
    pub const REVERB_L: u32 = 18;
    pub const REVERB_R: u32 = 19;
    pub const LEVEL_L: u32 = 20;
    pub const LEVEL_R: u32 = 21;
    pub const PART_L: u32 = 22;
}

/// Extra SC-155 panel buttons.
pub mod sc155 {
    pub const USER: u32 = 1;
    pub const PART_SEL: u32 = 2;
    pub const INST_CALL: u32 = 7;
    pub const PAN: u32 = 15;
    pub const LEVEL: u32 = 23;
    pub const PART1: u32 = 24;
    pub const PART2: u32 = 25;
    pub const PART3: u32 = 26;
    pub const PART4: u32 = 27;
    pub const PART5: u32 = 28;
    pub const PART6: u32 = 29;
    pub const PART7: u32 = 30;
    pub const PART8: u32 = 31;
}

/// JV-880 button bits.
pub mod jv880 {
    pub const CURSOR_L: u32 = 0;
    pub const CURSOR_R: u32 = 1;
    pub const TONE_SELECT: u32 = 2;
    pub const MUTE: u32 = 3;
    pub const DATA: u32 = 4;
    pub const MONITOR: u32 = 5;
    pub const COMPARE: u32 = 6;
    pub const ENTER: u32 = 7;
    pub const UTILITY: u32 = 8;
    pub const PREVIEW: u32 = 9;
    pub const PATCH_PERFORM: u32 = 10;
    pub const EDIT: u32 = 11;
    pub const SYSTEM: u32 = 12;
    pub const RHYTHM: u32 = 13;
}

/// How long a remote control press is held, in CPU states.
pub const REMOTE_HOLD_STATES: u64 = 1_200_000;

/// Shared pressed-button mask.
#[derive(Debug, Clone, Default)]
pub struct Buttons(Arc<AtomicU32>);

impl Buttons {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, button: u32) {
        self.0.fetch_or(1 << (button & 31), Ordering::Relaxed);
    }

    pub fn release(&self, button: u32) {
        self.0.fetch_and(!(1 << (button & 31)), Ordering::Relaxed);
    }

    pub fn set(&self, button: u32, pressed: bool) {
        if pressed {
            self.press(button);
        } else {
            self.release(button);
        }
    }

    #[must_use]
    pub fn pressed(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// Active-low scan of one 8-button row.
    #[must_use]
    pub fn row(&self, row: u8) -> u8 {
        !((self.pressed() >> (u32::from(row & 3) * 8)) as u8)
    }
}

/// Button a remote control code maps to. Transport keys (song, tempo,
/// play and so on) have no panel equivalent.
#[must_use]
pub const fn remote_button(code: u8) -> Option<u32> {
    Some(match code {
        0x00 => sc55::INST_ALL,
        0x01 => sc55::INST_MUTE,
        0x03 => sc55::POWER,
        0x04 => sc55::PART_L,
        0x05 => sc55::PART_R,
        0x06 => sc55::INST_L,
        0x07 => sc55::INST_R,
        0x08 => sc55::LEVEL_L,
        0x09 => sc55::LEVEL_R,
        0x0A => sc55::REVERB_L,
        0x0B => sc55::REVERB_R,
        _ => return None,
    })
}

/// Timed button presses from the remote.
#[derive(Debug, Clone, Default)]
pub struct RemoteControl {
    held: Option<(u32, u64)>,
}

impl RemoteControl {
    /// Press the button for `code` until `now + REMOTE_HOLD_STATES`.
    /// Returns false for codes without a panel button.
    pub fn trigger(&mut self, buttons: &Buttons, code: u8, now: u64) -> bool {
        let Some(button) = remote_button(code) else {
            return false;
        };
        self.release(buttons);
        buttons.press(button);
        self.held = Some((button, now + REMOTE_HOLD_STATES));
        true
    }

    pub fn advance(&mut self, buttons: &Buttons, now: u64) {
        if let Some((_, until)) = self.held
            && now >= until
        {
            self.release(buttons);
        }
    }

    fn release(&mut self, buttons: &Buttons) {
        if let Some((button, _)) = self.held.take() {
            buttons.release(button);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_active_low() {
        let buttons = Buttons::new();
        buttons.press(sc55::INST_L);
        buttons.press(sc55::MIDI_CH_R);
        assert_eq!(buttons.row(0), !0x08);
        assert_eq!(buttons.row(1), !0x02);
        assert_eq!(buttons.row(2), 0xFF);
        buttons.release(sc55::INST_L);
        assert_eq!(buttons.row(0), 0xFF);
    }

    #[test]
    fn shared_between_clones() {
        let ui = Buttons::new();
        let machine = ui.clone();
        ui.set(jv880::ENTER, true);
        assert_eq!(machine.pressed(), 1 << jv880::ENTER);
    }

    #[test]
    fn remote_press_is_released_after_hold() {
        let buttons = Buttons::new();
        let mut remote = RemoteControl::default();
        assert!(remote.trigger(&buttons, 0x03, 100));
        assert_eq!(buttons.pressed(), 1 << sc55::POWER);

        remote.advance(&buttons, 100 + REMOTE_HOLD_STATES - 1);
        assert_eq!(buttons.pressed(), 1 << sc55::POWER);
        remote.advance(&buttons, 100 + REMOTE_HOLD_STATES);
        assert_eq!(buttons.pressed(), 0);
    }

    #[test]
    fn transport_codes_are_ignored() {
        let buttons = Buttons::new();
        let mut remote = RemoteControl::default();
        assert!(!remote.trigger(&buttons, 0x11, 0));
        assert_eq!(buttons.pressed(), 0);
    }
}
