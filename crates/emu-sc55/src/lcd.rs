//! Front panel display.
//!
//! The HD44780 state machine runs on the stepping thread. After each write
//! it publishes a snapshot behind a mutex; renderers poll it with
//! `try_lock` and skip a frame rather than stall emulation. Drawing pixels
//! is the backend's job.

use std::sync::Arc;

use hitachi_hd44780::{DisplayState, Hd44780, Register};
use parking_lot::Mutex;
use tracing::debug;

use crate::romset::Romset;

/// Physical panel geometry and colours for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcdPanel {
    pub width: u32,
    pub height: u32,
    /// 0xRRGGBB of an unlit segment.
    pub off_color: u32,
    /// 0xRRGGBB of the backlight.
    pub backlight: u32,
}

impl LcdPanel {
    #[must_use]
    pub const fn for_romset(romset: Romset) -> Self {
        if romset.capabilities().jv880 {
            Self {
                width: 820,
                height: 100,
                off_color: 0x00_0000,
                backlight: 0x78_B500,
            }
        } else {
            Self {
                width: 741,
                height: 268,
                off_color: 0x00_0000,
                backlight: 0x00_50C8,
            }
        }
    }
}

/// Clamp a contrast value to what the board's panel accepts.
#[must_use]
pub fn clamp_contrast(romset: Romset, contrast: u8) -> u8 {
    if romset.capabilities().jv880 {
        contrast.min(10)
    } else {
        contrast.clamp(1, 16)
    }
}

/// What a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LcdSnapshot {
    pub display: DisplayState,
    pub enabled: bool,
    pub contrast: u8,
    /// Bumped on every publish.
    pub generation: u64,
}

/// Shared handle to the latest snapshot.
#[derive(Debug, Clone)]
pub struct LcdHandle(Arc<Mutex<LcdSnapshot>>);

impl LcdHandle {
    /// Latest snapshot, or `None` if the stepping thread holds the lock.
    #[must_use]
    pub fn try_snapshot(&self) -> Option<LcdSnapshot> {
        self.0.try_lock().map(|s| s.clone())
    }
}

#[cfg(test)]
impl LcdHandle {
    /// Hold the snapshot lock the way a slow renderer would.
    pub(crate) fn hold(&self) -> parking_lot::MutexGuard<'_, LcdSnapshot> {
        self.0.lock()
    }
}

/// A display frontend.
pub trait LcdBackend {
    /// Open the output. Returns false if it could not be created.
    fn start(&mut self, panel: &LcdPanel) -> bool;
    fn stop(&mut self);
    fn render(&mut self, snapshot: &LcdSnapshot);
}

/// The LCD as wired to the MCU.
pub struct Lcd {
    controller: Hd44780,
    romset: Romset,
    enabled: bool,
    contrast: u8,
    generation: u64,
    shared: Arc<Mutex<LcdSnapshot>>,
    /// A publish was skipped because a reader held the lock.
    dirty: bool,
}

impl Lcd {
    #[must_use]
    pub fn new(romset: Romset) -> Self {
        let controller = Hd44780::new();
        let snapshot = LcdSnapshot {
            display: controller.state(),
            enabled: true,
            contrast: clamp_contrast(romset, 8),
            generation: 0,
        };
        Self {
            controller,
            romset,
            enabled: true,
            contrast: snapshot.contrast,
            generation: 0,
            shared: Arc::new(Mutex::new(snapshot)),
            dirty: false,
        }
    }

    pub fn reset(&mut self) {
        self.controller.reset();
        self.enabled = true;
        self.publish();
    }

    /// Boards differ in panel and contrast range.
    pub fn set_romset(&mut self, romset: Romset) {
        self.romset = romset;
        self.contrast = clamp_contrast(romset, self.contrast);
        self.publish();
    }

    #[must_use]
    pub fn handle(&self) -> LcdHandle {
        LcdHandle(Arc::clone(&self.shared))
    }

    #[must_use]
    pub const fn panel(&self) -> LcdPanel {
        LcdPanel::for_romset(self.romset)
    }

    #[must_use]
    pub const fn controller(&self) -> &Hd44780 {
        &self.controller
    }

    pub fn write(&mut self, register: Register, value: u8) {
        self.controller.write(register, value);
        self.publish();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.publish();
        } else {
            self.flush_if_dirty();
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_contrast(&mut self, contrast: u8) {
        let contrast = clamp_contrast(self.romset, contrast);
        if self.contrast != contrast {
            self.contrast = contrast;
            self.publish();
        }
    }

    #[must_use]
    pub const fn contrast(&self) -> u8 {
        self.contrast
    }

    /// Retry a publish that lost the race with a reader. Called once per
    /// step so the snapshot catches up even if the firmware stops writing.
    pub fn flush_if_dirty(&mut self) {
        if self.dirty {
            self.store();
        }
    }

    fn publish(&mut self) {
        self.generation += 1;
        self.store();
    }

    fn store(&mut self) {
        if let Some(mut shared) = self.shared.try_lock() {
            *shared = LcdSnapshot {
                display: self.controller.state(),
                enabled: self.enabled,
                contrast: self.contrast,
                generation: self.generation,
            };
            self.dirty = false;
        } else {
            debug!("LCD snapshot busy, retrying on next step");
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contrast_clamps_per_board() {
        assert_eq!(clamp_contrast(Romset::Mk2, 0), 1);
        assert_eq!(clamp_contrast(Romset::Mk2, 40), 16);
        assert_eq!(clamp_contrast(Romset::Jv880, 0), 0);
        assert_eq!(clamp_contrast(Romset::Jv880, 12), 10);
    }

    #[test]
    fn panel_depends_on_board() {
        assert_eq!(LcdPanel::for_romset(Romset::Jv880).width, 820);
        assert_eq!(LcdPanel::for_romset(Romset::Mk1).height, 268);
    }

    #[test]
    fn writes_publish_snapshots() {
        let mut lcd = Lcd::new(Romset::Mk2);
        let handle = lcd.handle();
        lcd.write(Register::Instruction, 0x80);
        lcd.write(Register::Data, b'S');
        let snapshot = handle.try_snapshot().expect("uncontended");
        assert_eq!(snapshot.display.line(0)[0], b'S');
        assert!(snapshot.generation >= 2);
    }

    #[test]
    fn contended_publish_is_retried() {
        let mut lcd = Lcd::new(Romset::Mk2);
        let handle = lcd.handle();
        {
            let _guard = handle.0.lock();
            lcd.set_contrast(3);
        }
        assert_eq!(handle.try_snapshot().map(|s| s.contrast), Some(8));
        lcd.set_enabled(true);
        assert_eq!(handle.try_snapshot().map(|s| s.contrast), Some(3));
    }

    #[test]
    fn write_during_read_reaches_snapshot_on_flush() {
        let mut lcd = Lcd::new(Romset::Mk2);
        let handle = lcd.handle();
        {
            let _guard = handle.0.lock();
            lcd.write(Register::Instruction, 0x80);
            lcd.write(Register::Data, b'A');
        }
        let stale = handle.try_snapshot().expect("uncontended");
        assert_eq!(stale.display.line(0)[0], b' ');

        lcd.flush_if_dirty();
        let fresh = handle.try_snapshot().expect("uncontended");
        assert_eq!(fresh.display.line(0)[0], b'A');
        assert_eq!(fresh.generation, stale.generation + 2);

        lcd.flush_if_dirty();
        assert_eq!(handle.try_snapshot().map(|s| s.generation), Some(fresh.generation));
    }

    struct Recorder {
        started: bool,
        frames: usize,
    }

    impl LcdBackend for Recorder {
        fn start(&mut self, _panel: &LcdPanel) -> bool {
            self.started = true;
            true
        }

        fn stop(&mut self) {
            self.started = false;
        }

        fn render(&mut self, _snapshot: &LcdSnapshot) {
            self.frames += 1;
        }
    }

    #[test]
    fn backend_sees_snapshots() {
        let lcd = Lcd::new(Romset::Jv880);
        let mut backend = Recorder {
            started: false,
            frames: 0,
        };
        assert!(backend.start(&lcd.panel()));
        if let Some(snapshot) = lcd.handle().try_snapshot() {
            backend.render(&snapshot);
        }
        backend.stop();
        assert_eq!(backend.frames, 1);
        assert!(!backend.started);
    }
}
