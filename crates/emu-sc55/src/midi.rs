//! MIDI byte stream framing.
//!
//! The UART transmits single bytes; listeners want whole messages. The
//! same framing splits host input into messages for routing between
//! instances.

/// GM System On.
pub const GM_RESET: [u8; 6] = [0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7];
/// GS Reset.
pub const GS_RESET: [u8; 11] = [
    0xF0, 0x41, 0x10, 0x42, 0x12, 0x40, 0x00, 0x7F, 0x00, 0x41, 0xF7,
];

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Data bytes following a status byte, `None` for SysEx.
#[must_use]
pub const fn data_length(status: u8) -> Option<usize> {
    match status {
        0x80..=0xBF | 0xE0..=0xEF | 0xF2 => Some(2),
        0xC0..=0xDF | 0xF1 | 0xF3 => Some(1),
        SYSEX_START => None,
        _ => Some(0),
    }
}

#[must_use]
pub const fn is_realtime(byte: u8) -> bool {
    byte >= 0xF8
}

/// Assembles complete messages from a byte stream.
///
/// Running status is honoured for channel messages. Real-time bytes are
/// delivered on their own, even in the middle of another message.
#[derive(Debug, Clone, Default)]
pub struct MessageCollector {
    buffer: Vec<u8>,
    running_status: Option<u8>,
    in_sysex: bool,
}

impl MessageCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.running_status = None;
        self.in_sysex = false;
    }

    /// Feed one byte; `emit` receives each message it completes.
    pub fn push(&mut self, byte: u8, emit: &mut dyn FnMut(&[u8])) {
        if is_realtime(byte) {
            emit(&[byte]);
            return;
        }

        if self.in_sysex {
            if byte == SYSEX_END {
                self.buffer.push(byte);
                emit(&self.buffer);
                self.buffer.clear();
                self.in_sysex = false;
                return;
            }
            if byte < 0x80 {
                self.buffer.push(byte);
                return;
            }
            // Any other status byte cuts the SysEx short.
            self.buffer.clear();
            self.in_sysex = false;
        }

        if byte >= 0x80 {
            self.buffer.clear();
            self.buffer.push(byte);
            match data_length(byte) {
                None => {
                    self.in_sysex = true;
                    self.running_status = None;
                }
                Some(0) => {
                    self.running_status = None;
                    emit(&self.buffer);
                    self.buffer.clear();
                }
                Some(_) => {
                    self.running_status = (byte < 0xF0).then_some(byte);
                }
            }
            return;
        }

        if self.buffer.is_empty() {
            match self.running_status {
                Some(status) => self.buffer.push(status),
                // Stray data byte.
                None => return,
            }
        }
        self.buffer.push(byte);
        if let Some(length) = data_length(self.buffer[0])
            && self.buffer.len() == length + 1
        {
            emit(&self.buffer);
            self.buffer.clear();
        }
    }

    /// Feed a slice, collecting completed messages.
    pub fn push_all(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut messages = Vec::new();
        for &byte in bytes {
            self.push(byte, &mut |m| messages.push(m.to_vec()));
        }
        messages
    }
}
