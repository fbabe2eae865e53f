//! Instruction execution for the H8/500.

use crate::bus::{H8Bus, address, read16, write16};
use crate::flags::{C, CCR_MASK, Condition, N, V, Z};
use crate::interrupt::Exception;
use crate::registers::Size;

use super::H8500;
use super::alu::{self, Shift};
use super::ea::Operand;

/// Bit manipulation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitOp {
    Set,
    Clear,
    Not,
    Test,
}

impl H8500 {
    /// Fetch, decode and execute one instruction.
    pub(super) fn execute<B: H8Bus>(&mut self, bus: &mut B) {
        let opcode = self.fetch8(bus);

        match opcode {
            // NOP
            0x00 => {}

            // SCB/F, SCB/NE, SCB/EQ
            0x01 | 0x06 | 0x07 => {
                let sub = self.fetch8(bus);
                if sub & 0xF8 != 0xB8 {
                    return self.invalid(bus);
                }
                let disp = self.fetch8(bus) as i8 as i16;
                let done = match opcode {
                    0x01 => false,
                    0x06 => Condition::Ne.holds(self.regs.sr),
                    _ => Condition::Eq.holds(self.regs.sr),
                };
                if !done {
                    let reg = usize::from(sub & 7);
                    self.regs.r[reg] = self.regs.r[reg].wrapping_sub(1);
                    if self.regs.r[reg] != 0xFFFF {
                        self.branch(disp);
                    }
                }
            }

            // LDM @SP+,<list>
            0x02 => {
                let list = self.fetch8(bus);
                for reg in 0..7 {
                    if list & (1 << reg) != 0 {
                        let Some(value) = self.pop(bus) else { return };
                        self.regs.r[reg] = value;
                    }
                }
            }

            // STM <list>,@-SP
            0x12 => {
                let list = self.fetch8(bus);
                for reg in (0..7).rev() {
                    if list & (1 << reg) != 0 && !self.push(bus, self.regs.r[reg]) {
                        return;
                    }
                }
            }

            // PJSR @aa:24
            0x03 => {
                let page = self.fetch8(bus);
                let offset = self.fetch16(bus);
                if self.push(bus, self.regs.pc) && self.push(bus, u16::from(self.regs.cp)) {
                    self.set_pc(page, offset);
                }
            }

            // PJMP @aa:24
            0x13 => {
                let page = self.fetch8(bus);
                let offset = self.fetch16(bus);
                self.set_pc(page, offset);
            }

            // TRAPA #n: taken immediately, no arbitration.
            0x08 => {
                let operand = self.fetch8(bus);
                if operand & 0xF0 != 0x10 {
                    return self.invalid(bus);
                }
                let interrupts = bus.interrupts();
                interrupts.raise_trapa(operand & 0x0F);
                if let Some(dispatch) = interrupts.peek(self.regs.interrupt_mask()) {
                    self.enter_exception(bus, dispatch);
                }
            }

            // TRAP/VS
            0x09 => {
                if self.regs.sr & V != 0 {
                    bus.interrupts().raise_exception(Exception::Trap);
                }
            }

            // RTE
            0x0A => {
                let Some(sr) = self.pop(bus) else { return };
                let Some(cp) = self.pop(bus) else { return };
                let Some(pc) = self.pop(bus) else { return };
                self.regs.set_sr(sr);
                self.set_pc(cp as u8, pc);
            }

            // BSR d:8 / d:16
            0x0E => {
                let disp = self.fetch8(bus) as i8 as i16;
                self.call_relative(bus, disp);
            }
            0x1E => {
                let disp = self.fetch16(bus) as i16;
                self.call_relative(bus, disp);
            }

            // UNLK FP
            0x0F => {
                self.regs.r[7] = self.regs.r[6];
                if let Some(fp) = self.pop(bus) {
                    self.regs.r[6] = fp;
                }
            }

            // LINK FP,#d:8 / #d:16
            0x17 => {
                let disp = self.fetch8(bus) as i8 as i16 as u16;
                self.link(bus, disp);
            }
            0x1F => {
                let disp = self.fetch16(bus);
                self.link(bus, disp);
            }

            // JMP @aa:16
            0x10 => {
                self.regs.pc = self.fetch16(bus);
            }

            // JSR @aa:16
            0x18 => {
                let target = self.fetch16(bus);
                self.call(bus, target);
            }

            0x11 => self.execute_page_group(bus),

            // RTD #xx:8 / #xx:16
            0x14 => {
                let release = u16::from(self.fetch8(bus));
                self.return_and_release(bus, release);
            }
            0x1C => {
                let release = self.fetch16(bus);
                self.return_and_release(bus, release);
            }

            // RTS
            0x19 => {
                if let Some(pc) = self.pop(bus) {
                    self.regs.pc = pc;
                }
            }

            // SLEEP
            0x1A => self.sleeping = true,

            // Bcc d:8
            0x20..=0x2F => {
                let disp = self.fetch8(bus) as i8 as i16;
                if Condition::from_bits(opcode).holds(self.regs.sr) {
                    self.branch(disp);
                }
            }

            // Bcc d:16
            0x30..=0x3F => {
                let disp = self.fetch16(bus) as i16;
                if Condition::from_bits(opcode).holds(self.regs.sr) {
                    self.branch(disp);
                }
            }

            // CMP:E #xx:8,Rd
            0x40..=0x47 => {
                let imm = u16::from(self.fetch8(bus));
                let reg = usize::from(opcode & 7);
                self.compare(self.regs.r[reg], imm, Size::Byte);
            }

            // CMP:I #xx:16,Rd
            0x48..=0x4F => {
                let imm = self.fetch16(bus);
                let reg = usize::from(opcode & 7);
                self.compare(self.regs.r[reg], imm, Size::Word);
            }

            // MOV:E #xx:8,Rd
            0x50..=0x57 => {
                let imm = u16::from(self.fetch8(bus));
                self.move_to_register(usize::from(opcode & 7), Size::Byte, imm);
            }

            // MOV:I #xx:16,Rd
            0x58..=0x5F => {
                let imm = self.fetch16(bus);
                self.move_to_register(usize::from(opcode & 7), Size::Word, imm);
            }

            // MOV:L @aa:8,Rd
            0x60..=0x6F => {
                let size = size_bit(opcode);
                let addr = self.short_absolute(bus);
                let value = self.load(bus, addr, size);
                self.move_to_register(usize::from(opcode & 7), size, value);
            }

            // MOV:S Rs,@aa:8
            0x70..=0x7F => {
                let size = size_bit(opcode);
                let addr = self.short_absolute(bus);
                let value = self.regs.r[usize::from(opcode & 7)];
                self.store(bus, addr, size, value);
                self.set_nz(value, size);
            }

            // MOV:F @(d:8,R6),Rd
            0x80..=0x8F => {
                let size = size_bit(opcode);
                let addr = self.frame_address(bus);
                let value = self.load(bus, addr, size);
                self.move_to_register(usize::from(opcode & 7), size, value);
            }

            // MOV:F Rs,@(d:8,R6)
            0x90..=0x9F => {
                let size = size_bit(opcode);
                let addr = self.frame_address(bus);
                let value = self.regs.r[usize::from(opcode & 7)];
                self.store(bus, addr, size, value);
                self.set_nz(value, size);
            }

            // General format: effective address prefix, then operation.
            0x04 | 0x05 | 0x0C | 0x0D | 0x15 | 0x1D | 0xA0..=0xFF => {
                self.execute_general(bus, opcode);
            }

            _ => self.invalid(bus),
        }
    }

    /// The 0x11 group: register-indirect jumps and page returns.
    fn execute_page_group<B: H8Bus>(&mut self, bus: &mut B) {
        let sub = self.fetch8(bus);
        let reg = usize::from(sub & 7);
        match sub {
            // PRTD #xx:8 / #xx:16
            0x14 => {
                let release = u16::from(self.fetch8(bus));
                if self.page_return(bus) {
                    self.regs.r[7] = self.regs.r[7].wrapping_add(release);
                }
            }
            0x1C => {
                let release = self.fetch16(bus);
                if self.page_return(bus) {
                    self.regs.r[7] = self.regs.r[7].wrapping_add(release);
                }
            }

            // PRTS
            0x19 => {
                self.page_return(bus);
            }

            // PJSR @Rn / PJMP @Rn: page in the low byte of the even
            // register, offset in the odd one.
            0xC0..=0xCF => {
                let pair = reg & 6;
                let page = self.regs.r[pair] as u8;
                let offset = self.regs.r[pair + 1];
                if sub < 0xC8
                    && !(self.push(bus, self.regs.pc) && self.push(bus, u16::from(self.regs.cp)))
                {
                    return;
                }
                self.set_pc(page, offset);
            }

            // JMP/JSR @Rn
            0xD0..=0xDF => {
                let target = self.regs.r[reg];
                self.jump(bus, target, sub & 0x08 != 0);
            }

            // JMP/JSR @(d:8,Rn)
            0xE0..=0xEF => {
                let disp = self.fetch8(bus) as i8 as i16 as u16;
                let target = self.regs.r[reg].wrapping_add(disp);
                self.jump(bus, target, sub & 0x08 != 0);
            }

            // JMP/JSR @(d:16,Rn)
            0xF0..=0xFF => {
                let disp = self.fetch16(bus);
                let target = self.regs.r[reg].wrapping_add(disp);
                self.jump(bus, target, sub & 0x08 != 0);
            }

            _ => self.invalid(bus),
        }
    }

    /// General-format instructions.
    fn execute_general<B: H8Bus>(&mut self, bus: &mut B, prefix: u8) {
        let Some(operand) = self.decode_ea(bus, prefix) else {
            return self.invalid(bus);
        };
        let op = self.fetch8(bus);
        let size = operand.size;
        let rd = usize::from(op & 7);
        let immediate = operand.is_immediate();

        match op {
            // CMP:G #xx,<EA>
            0x04 | 0x05 if !immediate => {
                let Some(imm) = self.fetch_immediate(bus, op == 0x05, size) else {
                    return self.invalid(bus);
                };
                let value = self.read_operand(bus, operand);
                self.compare(value, imm, size);
            }

            // MOV:G #xx,<EA>
            0x06 | 0x07 if !immediate => {
                let Some(imm) = self.fetch_immediate(bus, op == 0x07, size) else {
                    return self.invalid(bus);
                };
                self.write_operand(bus, operand, imm);
                self.set_nz(imm, size);
            }

            // ADD:Q #1, #2, #-1, #-2
            0x08 | 0x09 | 0x0C | 0x0D if !immediate => {
                let quick: u16 = match op {
                    0x08 => 1,
                    0x09 => 2,
                    0x0C => 0xFFFF,
                    _ => 0xFFFE,
                };
                let value = self.read_operand(bus, operand);
                let (result, flags) = alu::add(value, quick, false, size);
                self.write_operand(bus, operand, result);
                self.set_flags(flags);
            }

            // SWAP Rd
            0x10 if operand.is_register() => {
                let reg = register_index(operand);
                let value = self.regs.r[reg].swap_bytes();
                self.regs.r[reg] = value;
                self.set_nz(value, Size::Byte);
            }

            // EXTS Rd
            0x11 if operand.is_register() => {
                let reg = register_index(operand);
                let value = Size::Byte.sign_extend(self.regs.r[reg]);
                self.regs.r[reg] = value;
                self.set_flags(alu::nz(value, Size::Word));
            }

            // EXTU Rd
            0x12 if operand.is_register() => {
                let reg = register_index(operand);
                let value = self.regs.r[reg] & 0x00FF;
                self.regs.r[reg] = value;
                self.set_flags(alu::nz(value, Size::Word));
            }

            // CLR
            0x13 if !immediate => {
                self.write_operand(bus, operand, 0);
                self.set_flags(Z);
            }

            // NEG
            0x14 if !immediate => {
                let value = self.read_operand(bus, operand);
                let (result, flags) = alu::sub(0, value, false, size);
                self.write_operand(bus, operand, result);
                self.set_flags(flags);
            }

            // NOT
            0x15 if !immediate => {
                let value = !self.read_operand(bus, operand) & size.mask();
                self.write_operand(bus, operand, value);
                self.set_nz(value, size);
            }

            // TST
            0x16 if !immediate => {
                let value = self.read_operand(bus, operand);
                self.set_flags(alu::nz(value, size));
            }

            // TAS
            0x17 if !immediate => {
                let value = self.read_operand(bus, operand);
                self.set_flags(alu::nz(value, size));
                self.write_operand(bus, operand, value | size.sign());
            }

            // SHAL, SHAR, SHLL, SHLR, ROTL, ROTR, ROTXL, ROTXR
            0x18..=0x1F if !immediate => {
                let value = self.read_operand(bus, operand);
                let carry = self.regs.sr & C != 0;
                let (result, flags) = alu::shift(Shift::from_opcode(op), value, carry, size);
                self.write_operand(bus, operand, result);
                self.set_flags(flags);
            }

            // ADD:G <EA>,Rd
            0x20..=0x27 => {
                let src = self.read_operand(bus, operand);
                let (result, flags) = alu::add(self.regs.r[rd], src, false, size);
                self.set_register(rd, size, result);
                self.set_flags(flags);
            }

            // ADDS <EA>,Rd
            0x28..=0x2F => {
                let src = size.sign_extend(self.read_operand(bus, operand));
                self.regs.r[rd] = self.regs.r[rd].wrapping_add(src);
            }

            // SUB <EA>,Rd
            0x30..=0x37 => {
                let src = self.read_operand(bus, operand);
                let (result, flags) = alu::sub(self.regs.r[rd], src, false, size);
                self.set_register(rd, size, result);
                self.set_flags(flags);
            }

            // SUBS <EA>,Rd
            0x38..=0x3F => {
                let src = size.sign_extend(self.read_operand(bus, operand));
                self.regs.r[rd] = self.regs.r[rd].wrapping_sub(src);
            }

            // OR, AND, XOR <EA>,Rd
            0x40..=0x47 | 0x50..=0x57 | 0x60..=0x67 => {
                let src = self.read_operand(bus, operand);
                let dst = self.regs.r[rd];
                let result = match op & 0xF0 {
                    0x40 => dst | src,
                    0x50 => dst & src,
                    _ => dst ^ src,
                } & size.mask();
                self.set_register(rd, size, result);
                self.set_nz(result, size);
            }

            // ORC, ANDC, XORC #xx,CR
            0x48..=0x4F | 0x58..=0x5F | 0x68..=0x6F if immediate => {
                let imm = self.read_operand(bus, operand);
                let cr = op & 7;
                let Some(current) = self.regs.read_control(cr, size) else {
                    return self.invalid(bus);
                };
                let value = match op & 0xF0 {
                    0x40 => current | imm,
                    0x50 => current & imm,
                    _ => current ^ imm,
                };
                self.load_control(bus, cr, size, value);
            }

            // BSET, BCLR, BNOT, BTST Rn,<EA>
            0x48..=0x4F | 0x58..=0x5F | 0x68..=0x6F | 0x78..=0x7F => {
                let bit = self.regs.r[rd];
                let kind = match op & 0xF0 {
                    0x40 => BitOp::Set,
                    0x50 => BitOp::Clear,
                    0x60 => BitOp::Not,
                    _ => BitOp::Test,
                };
                self.bit_operation(bus, operand, kind, bit);
            }

            // CMP:G <EA>,Rd
            0x70..=0x77 => {
                let src = self.read_operand(bus, operand);
                self.compare(self.regs.r[rd], src, size);
            }

            // MOV:G <EA>,Rd
            0x80..=0x87 => {
                let value = self.read_operand(bus, operand);
                self.move_to_register(rd, size, value);
            }

            // LDC <EA>,CR
            0x88..=0x8F => {
                let value = self.read_operand(bus, operand);
                self.load_control(bus, op & 7, size, value);
            }

            // MOV:G Rs,<EA>
            0x90..=0x97 if !immediate => {
                let value = self.regs.r[rd] & size.mask();
                self.write_operand(bus, operand, value);
                self.set_nz(value, size);
            }

            // STC CR,<EA>
            0x98..=0x9F if !immediate => {
                let Some(value) = self.regs.read_control(op & 7, size) else {
                    return self.invalid(bus);
                };
                self.write_operand(bus, operand, value);
            }

            // ADDX <EA>,Rd
            0xA0..=0xA7 => {
                let src = self.read_operand(bus, operand);
                let carry = self.regs.sr & C != 0;
                let (result, flags) = alu::add(self.regs.r[rd], src, carry, size);
                self.set_register(rd, size, result);
                self.set_extended_flags(flags);
            }

            // MULXU <EA>,Rd
            0xA8..=0xAF => {
                let src = self.read_operand(bus, operand);
                self.multiply(rd, size, src);
            }

            // SUBX <EA>,Rd
            0xB0..=0xB7 => {
                let src = self.read_operand(bus, operand);
                let borrow = self.regs.sr & C != 0;
                let (result, flags) = alu::sub(self.regs.r[rd], src, borrow, size);
                self.set_register(rd, size, result);
                self.set_extended_flags(flags);
            }

            // DIVXU <EA>,Rd
            0xB8..=0xBF => {
                let src = self.read_operand(bus, operand);
                self.divide(bus, rd, size, src);
            }

            // BSET, BCLR, BNOT, BTST #n,<EA>
            0xC0..=0xFF if !immediate => {
                let kind = match op & 0xF0 {
                    0xC0 => BitOp::Set,
                    0xD0 => BitOp::Clear,
                    0xE0 => BitOp::Not,
                    _ => BitOp::Test,
                };
                self.bit_operation(bus, operand, kind, u16::from(op & 0x0F));
            }

            _ => self.invalid(bus),
        }
    }

    // === Helpers ===

    fn branch(&mut self, disp: i16) {
        self.regs.pc = self.regs.pc.wrapping_add(disp as u16);
    }

    fn call<B: H8Bus>(&mut self, bus: &mut B, target: u16) {
        if self.push(bus, self.regs.pc) {
            self.regs.pc = target;
        }
    }

    fn call_relative<B: H8Bus>(&mut self, bus: &mut B, disp: i16) {
        let target = self.regs.pc.wrapping_add(disp as u16);
        self.call(bus, target);
    }

    fn jump<B: H8Bus>(&mut self, bus: &mut B, target: u16, subroutine: bool) {
        if subroutine {
            self.call(bus, target);
        } else {
            self.regs.pc = target;
        }
    }

    fn link<B: H8Bus>(&mut self, bus: &mut B, disp: u16) {
        if self.push(bus, self.regs.r[6]) {
            self.regs.r[6] = self.regs.r[7];
            self.regs.r[7] = self.regs.r[7].wrapping_add(disp);
        }
    }

    fn return_and_release<B: H8Bus>(&mut self, bus: &mut B, release: u16) {
        if let Some(pc) = self.pop(bus) {
            self.regs.pc = pc;
            self.regs.r[7] = self.regs.r[7].wrapping_add(release);
        }
    }

    /// Pop CP then PC. Returns false when the stack was misaligned.
    fn page_return<B: H8Bus>(&mut self, bus: &mut B) -> bool {
        let Some(cp) = self.pop(bus) else {
            return false;
        };
        let Some(pc) = self.pop(bus) else {
            return false;
        };
        self.set_pc(cp as u8, pc);
        true
    }

    fn short_absolute<B: H8Bus>(&mut self, bus: &mut B) -> u32 {
        let low = self.fetch8(bus);
        address(0, u16::from_be_bytes([self.regs.br, low]))
    }

    fn frame_address<B: H8Bus>(&mut self, bus: &mut B) -> u32 {
        let disp = self.fetch8(bus) as i8 as i16 as u16;
        address(
            self.regs.page_for_register(6),
            self.regs.r[6].wrapping_add(disp),
        )
    }

    fn fetch_immediate<B: H8Bus>(&mut self, bus: &mut B, wide: bool, size: Size) -> Option<u16> {
        match (wide, size) {
            (false, Size::Byte) => Some(u16::from(self.fetch8(bus))),
            (false, Size::Word) => Some(Size::Byte.sign_extend(u16::from(self.fetch8(bus)))),
            (true, Size::Word) => Some(self.fetch16(bus)),
            (true, Size::Byte) => None,
        }
    }

    fn load<B: H8Bus>(&mut self, bus: &mut B, addr: u32, size: Size) -> u16 {
        match size {
            Size::Byte => u16::from(bus.read(addr)),
            Size::Word => read16(bus, addr),
        }
    }

    fn store<B: H8Bus>(&mut self, bus: &mut B, addr: u32, size: Size, value: u16) {
        match size {
            Size::Byte => bus.write(addr, value as u8),
            Size::Word => write16(bus, addr, value),
        }
    }

    fn move_to_register(&mut self, reg: usize, size: Size, value: u16) {
        self.set_register(reg, size, value);
        self.set_nz(value, size);
    }

    fn compare(&mut self, dst: u16, src: u16, size: Size) {
        let (_, flags) = alu::sub(dst, src, false, size);
        self.set_flags(flags);
    }

    /// Replace all four condition codes.
    fn set_flags(&mut self, flags: u16) {
        self.regs.sr = (self.regs.sr & !CCR_MASK) | (flags & CCR_MASK);
    }

    /// N and Z from the value, V cleared, C kept.
    fn set_nz(&mut self, value: u16, size: Size) {
        self.regs.sr = (self.regs.sr & !(N | Z | V)) | alu::nz(value, size);
    }

    /// ADDX/SUBX: Z can only be cleared, never set.
    fn set_extended_flags(&mut self, flags: u16) {
        let keep_z = self.regs.sr & Z;
        let z = if flags & Z != 0 { keep_z } else { 0 };
        self.regs.sr = (self.regs.sr & !CCR_MASK) | (flags & (N | V | C)) | z;
    }

    /// Write a control register; interrupts are held off for one
    /// instruction after a successful write.
    fn load_control<B: H8Bus>(&mut self, bus: &mut B, cr: u8, size: Size, value: u16) {
        if self.regs.write_control(cr, size, value) {
            self.inhibit = true;
        } else {
            self.invalid(bus);
        }
    }

    fn bit_operation<B: H8Bus>(&mut self, bus: &mut B, operand: Operand, kind: BitOp, bit: u16) {
        let size = operand.size;
        let mask = 1u16 << (u32::from(bit) % size.bits());
        let value = self.read_operand(bus, operand);
        let was_set = value & mask != 0;
        self.regs.sr = if was_set {
            self.regs.sr & !Z
        } else {
            self.regs.sr | Z
        };
        let result = match kind {
            BitOp::Set => value | mask,
            BitOp::Clear => value & !mask,
            BitOp::Not => value ^ mask,
            BitOp::Test => return,
        };
        self.write_operand(bus, operand, result);
    }

    /// Byte: Rd(low) x src -> Rd. Word: Rd x src -> Rd:Rd+1 (even pair).
    fn multiply(&mut self, rd: usize, size: Size, src: u16) {
        let sign_and_zero = match size {
            Size::Byte => {
                let product = (self.regs.r[rd] & 0xFF) * (src & 0xFF);
                self.regs.r[rd] = product;
                (product & 0x8000 != 0, product == 0)
            }
            Size::Word => {
                let pair = rd & 6;
                let product = u32::from(self.regs.r[pair]) * u32::from(src);
                self.regs.r[pair] = (product >> 16) as u16;
                self.regs.r[pair + 1] = product as u16;
                (product & 0x8000_0000 != 0, product == 0)
            }
        };
        self.set_quotient_flags(sign_and_zero);
    }

    /// Byte: Rd / src -> remainder:quotient in Rd.
    /// Word: Rd:Rd+1 / src -> remainder in Rd, quotient in Rd+1.
    fn divide<B: H8Bus>(&mut self, bus: &mut B, rd: usize, size: Size, src: u16) {
        if src == 0 {
            bus.interrupts().raise_exception(Exception::DivideByZero);
            return;
        }
        match size {
            Size::Byte => {
                let dividend = self.regs.r[rd];
                let divisor = src & 0xFF;
                let quotient = dividend / divisor;
                if quotient > 0xFF {
                    self.set_flags(V);
                    return;
                }
                let remainder = dividend % divisor;
                self.regs.r[rd] = (remainder << 8) | quotient;
                self.set_quotient_flags((quotient & 0x80 != 0, quotient == 0));
            }
            Size::Word => {
                let pair = rd & 6;
                let dividend =
                    (u32::from(self.regs.r[pair]) << 16) | u32::from(self.regs.r[pair + 1]);
                let divisor = u32::from(src);
                let quotient = dividend / divisor;
                if quotient > 0xFFFF {
                    self.set_flags(V);
                    return;
                }
                self.regs.r[pair] = (dividend % divisor) as u16;
                self.regs.r[pair + 1] = quotient as u16;
                self.set_quotient_flags((quotient & 0x8000 != 0, quotient == 0));
            }
        }
    }

    fn set_quotient_flags(&mut self, (negative, zero): (bool, bool)) {
        let mut flags = 0;
        if negative {
            flags |= N;
        }
        if zero {
            flags |= Z;
        }
        self.set_flags(flags);
    }
}

const fn size_bit(opcode: u8) -> Size {
    if opcode & 0x08 != 0 {
        Size::Word
    } else {
        Size::Byte
    }
}

const fn register_index(operand: Operand) -> usize {
    match operand.ea {
        super::ea::Ea::Register(reg) => reg,
        _ => 0,
    }
}
