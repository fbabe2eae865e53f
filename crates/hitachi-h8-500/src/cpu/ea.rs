//! General-format effective address decoding.
//!
//! | Prefix | Mode |
//! |--------|------|
//! | `04`/`0C` | #xx:8 / #xx:16 |
//! | `05`/`0D` | @aa:8 (BR supplies bits 15-8, page 0) |
//! | `15`/`1D` | @aa:16 (data page) |
//! | `A0-AF` | Rn |
//! | `B0-BF` | @-Rn |
//! | `C0-CF` | @Rn+ |
//! | `D0-DF` | @Rn |
//! | `E0-EF` | @(d:8,Rn) |
//! | `F0-FF` | @(d:16,Rn) |
//!
//! Bit 3 of the prefix selects word size. Pre-decrement and post-increment
//! step by the operand size, except that R7 always steps by two.

use crate::bus::{H8Bus, address, read16, write16};
use crate::registers::Size;

use super::H8500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Ea {
    Register(usize),
    Memory(u32),
    Immediate(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Operand {
    pub ea: Ea,
    pub size: Size,
}

impl Operand {
    pub(super) const fn is_immediate(self) -> bool {
        matches!(self.ea, Ea::Immediate(_))
    }

    pub(super) const fn is_register(self) -> bool {
        matches!(self.ea, Ea::Register(_))
    }
}

impl H8500 {
    /// Decode an EA prefix and consume its extension bytes. Side effects of
    /// @-Rn and @Rn+ happen here, once per instruction.
    pub(super) fn decode_ea<B: H8Bus>(&mut self, bus: &mut B, prefix: u8) -> Option<Operand> {
        let size = if prefix & 0x08 != 0 {
            Size::Word
        } else {
            Size::Byte
        };
        let reg = usize::from(prefix & 7);
        let step = if size == Size::Word || reg == 7 { 2 } else { 1 };

        let ea = match prefix {
            0x04 => Ea::Immediate(u16::from(self.fetch8(bus))),
            0x0C => Ea::Immediate(self.fetch16(bus)),
            0x05 | 0x0D => {
                let low = self.fetch8(bus);
                Ea::Memory(address(0, u16::from_be_bytes([self.regs.br, low])))
            }
            0x15 | 0x1D => {
                let offset = self.fetch16(bus);
                Ea::Memory(address(self.regs.dp, offset))
            }
            0xA0..=0xAF => Ea::Register(reg),
            0xB0..=0xBF => {
                self.regs.r[reg] = self.regs.r[reg].wrapping_sub(step);
                self.indirect(reg, 0)
            }
            0xC0..=0xCF => {
                let ea = self.indirect(reg, 0);
                self.regs.r[reg] = self.regs.r[reg].wrapping_add(step);
                ea
            }
            0xD0..=0xDF => self.indirect(reg, 0),
            0xE0..=0xEF => {
                let disp = self.fetch8(bus) as i8 as i16 as u16;
                self.indirect(reg, disp)
            }
            0xF0..=0xFF => {
                let disp = self.fetch16(bus);
                self.indirect(reg, disp)
            }
            _ => return None,
        };
        Some(Operand { ea, size })
    }

    fn indirect(&self, reg: usize, disp: u16) -> Ea {
        let offset = self.regs.r[reg].wrapping_add(disp);
        Ea::Memory(address(self.regs.page_for_register(reg), offset))
    }

    pub(super) fn read_operand<B: H8Bus>(&mut self, bus: &mut B, operand: Operand) -> u16 {
        let mask = operand.size.mask();
        match (operand.ea, operand.size) {
            (Ea::Register(reg), _) => self.regs.r[reg] & mask,
            (Ea::Immediate(value), _) => value & mask,
            (Ea::Memory(addr), Size::Byte) => u16::from(bus.read(addr)),
            (Ea::Memory(addr), Size::Word) => read16(bus, addr),
        }
    }

    /// Store to an operand. Byte stores to a register only touch its low
    /// byte. Immediates are never destinations; decode rejects them first.
    pub(super) fn write_operand<B: H8Bus>(&mut self, bus: &mut B, operand: Operand, value: u16) {
        match (operand.ea, operand.size) {
            (Ea::Register(reg), size) => self.set_register(reg, size, value),
            (Ea::Memory(addr), Size::Byte) => bus.write(addr, value as u8),
            (Ea::Memory(addr), Size::Word) => write16(bus, addr, value),
            (Ea::Immediate(_), _) => {}
        }
    }

    pub(super) fn set_register(&mut self, reg: usize, size: Size, value: u16) {
        self.regs.r[reg] = match size {
            Size::Byte => (self.regs.r[reg] & 0xFF00) | (value & 0x00FF),
            Size::Word => value,
        };
    }
}
