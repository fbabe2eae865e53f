//! H8/500 CPU core with per-instruction execution.

mod alu;
mod ea;
mod execute;

use emu_core::{Cpu, Observable, Ticks, Value};
use tracing::trace;

use crate::bus::{H8Bus, address, read16, read32, write16};
use crate::flags::{C, N, T, V, Z};
use crate::interrupt::{Dispatch, Exception, vector};
use crate::registers::Registers;

/// Clock states charged per executed instruction, interrupt entry or idle
/// slot while sleeping. The firmware's timing loops are calibrated against
/// this flat cost.
pub const STATES_PER_INSTRUCTION: u64 = 12;

/// H8/500 CPU.
///
/// The CPU does not own the bus. The bus is passed to `step()` so that the
/// machine can advance its peripherals between instructions.
pub struct H8500 {
    /// Register file.
    pub(crate) regs: Registers,
    /// Set by SLEEP, cleared by any interrupt entry.
    sleeping: bool,
    /// Interrupts are not accepted directly after a control register write.
    inhibit: bool,
    /// Total clock states elapsed.
    cycles: Ticks,
}

impl Default for H8500 {
    fn default() -> Self {
        Self::new()
    }
}

impl H8500 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            sleeping: false,
            inhibit: false,
            cycles: Ticks::ZERO,
        }
    }

    /// Total clock states elapsed since creation.
    #[must_use]
    pub const fn cycles(&self) -> Ticks {
        self.cycles
    }

    #[must_use]
    pub const fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Mutable register access for loaders and tests.
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Jump to `page:offset` without touching the stack.
    pub fn set_pc(&mut self, page: u8, offset: u16) {
        self.regs.cp = page;
        self.regs.pc = offset;
    }

    #[must_use]
    pub const fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Execute one instruction, service one interrupt, or idle one slot.
    ///
    /// Interrupts are only taken at instruction boundaries, before the
    /// fetch; a taken interrupt replaces the next instruction.
    pub fn step<B: H8Bus>(&mut self, bus: &mut B) -> Ticks {
        let mask = self.regs.interrupt_mask();
        if self.inhibit {
            self.inhibit = false;
        } else if let Some(dispatch) = bus.interrupts().peek(mask) {
            self.enter_exception(bus, dispatch);
            return self.consume();
        }

        if self.sleeping {
            return self.consume();
        }

        let tracing = self.regs.sr & T != 0;
        self.execute(bus);
        if tracing {
            bus.interrupts().raise_exception(Exception::Trace);
        }
        self.consume()
    }

    fn consume(&mut self) -> Ticks {
        let ticks = Ticks::new(STATES_PER_INSTRUCTION);
        self.cycles += ticks;
        ticks
    }

    // === Fetch ===

    fn fetch8<B: H8Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(address(self.regs.cp, self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch16<B: H8Bus>(&mut self, bus: &mut B) -> u16 {
        let hi = self.fetch8(bus);
        let lo = self.fetch8(bus);
        u16::from_be_bytes([hi, lo])
    }

    // === Stack ===

    fn stack_address(&self) -> u32 {
        address(self.regs.page_for_register(7), self.regs.sp())
    }

    /// Push a word. An odd stack pointer raises an address error and the
    /// write does not happen.
    fn push<B: H8Bus>(&mut self, bus: &mut B, value: u16) -> bool {
        if self.regs.sp() & 1 != 0 {
            bus.interrupts().raise_exception(Exception::AddressError);
            return false;
        }
        self.regs.r[7] = self.regs.r[7].wrapping_sub(2);
        write16(bus, self.stack_address(), value);
        true
    }

    /// Pop a word. An odd stack pointer raises an address error and nothing
    /// is read.
    fn pop<B: H8Bus>(&mut self, bus: &mut B) -> Option<u16> {
        if self.regs.sp() & 1 != 0 {
            bus.interrupts().raise_exception(Exception::AddressError);
            return None;
        }
        let value = read16(bus, self.stack_address());
        self.regs.r[7] = self.regs.r[7].wrapping_add(2);
        Some(value)
    }

    // === Exceptions ===

    /// Push PC, CP and SR, then load the handler from the vector table.
    ///
    /// The request is only acknowledged once the frame is on the stack. If
    /// a push fails it stays latched behind the address error.
    fn enter_exception<B: H8Bus>(&mut self, bus: &mut B, dispatch: Dispatch) {
        self.sleeping = false;
        let (pc, cp, sr) = (self.regs.pc, self.regs.cp, self.regs.sr);
        if !self.push(bus, pc) || !self.push(bus, u16::from(cp)) || !self.push(bus, sr) {
            return;
        }
        bus.interrupts().acknowledge(dispatch);
        self.regs.sr &= !T;
        if let Some(level) = dispatch.level {
            self.regs.set_interrupt_mask(level);
        }
        let handler = read32(bus, u32::from(dispatch.vector) * 4);
        self.regs.cp = (handler >> 16) as u8;
        self.regs.pc = handler as u16;
        trace!(
            vector = dispatch.vector,
            from = address(cp, pc),
            to = address(self.regs.cp, self.regs.pc),
            "exception entry"
        );
    }

    fn invalid<B: H8Bus>(&mut self, bus: &mut B) {
        trace!(at = address(self.regs.cp, self.regs.pc), "invalid instruction");
        bus.interrupts().raise_exception(Exception::InvalidInstruction);
    }
}

impl<B: H8Bus> Cpu<B> for H8500 {
    type Registers = Registers;

    fn step(&mut self, bus: &mut B) -> Ticks {
        H8500::step(self, bus)
    }

    fn pc(&self) -> u32 {
        address(self.regs.cp, self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.sleeping
    }

    /// Registers return to their power-on values and execution starts at
    /// the reset vector. Pending interrupts belong to the bus and are reset
    /// there.
    fn reset(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.sleeping = false;
        self.inhibit = false;
        let handler = read32(bus, u32::from(vector::RESET) * 4);
        self.regs.cp = (handler >> 16) as u8;
        self.regs.pc = handler as u16;
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc", "cp", "dp", "ep", "tp", "br", "sr", "sr.t", "sr.n", "sr.z", "sr.v", "sr.c", "sr.mask",
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "sp", "fp", "sleep", "cycles",
];

impl Observable for H8500 {
    fn query(&self, path: &str) -> Option<Value> {
        let regs = &self.regs;
        let value = match path {
            "pc" => Value::U16(regs.pc),
            "cp" => Value::U8(regs.cp),
            "dp" => Value::U8(regs.dp),
            "ep" => Value::U8(regs.ep),
            "tp" => Value::U8(regs.tp),
            "br" => Value::U8(regs.br),
            "sr" => Value::U16(regs.sr),
            "sr.t" => Value::Bool(regs.sr & T != 0),
            "sr.n" => Value::Bool(regs.sr & N != 0),
            "sr.z" => Value::Bool(regs.sr & Z != 0),
            "sr.v" => Value::Bool(regs.sr & V != 0),
            "sr.c" => Value::Bool(regs.sr & C != 0),
            "sr.mask" => Value::U8(regs.interrupt_mask()),
            "sp" => Value::U16(regs.sp()),
            "fp" => Value::U16(regs.fp()),
            "sleep" => Value::Bool(self.sleeping),
            "cycles" => Value::U64(self.cycles.get()),
            _ => {
                let index = path.strip_prefix('r')?.parse::<usize>().ok()?;
                Value::U16(*regs.r.get(index)?)
            }
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatBus;
    use crate::interrupt::InterruptSource;
    use emu_core::Bus;

    fn cpu_at(bus: &mut FlatBus, program: &[u8]) -> H8500 {
        bus.load(0x1000, program);
        let mut cpu = H8500::new();
        cpu.set_pc(0, 0x1000);
        cpu.regs.r[7] = 0xFE00;
        cpu.regs.set_interrupt_mask(0);
        cpu
    }

    #[test]
    fn reset_loads_24_bit_vector() {
        let mut bus = FlatBus::new();
        bus.set_vector(vector::RESET, 0x02_1234);
        let mut cpu = H8500::new();
        cpu.regs.r[3] = 0x5555;
        Cpu::reset(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.cp, 0x02);
        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.regs.r[3], 0);
        assert_eq!(cpu.regs.interrupt_mask(), 7);
    }

    #[test]
    fn every_step_costs_the_same() {
        let mut bus = FlatBus::new();
        let mut cpu = cpu_at(&mut bus, &[0x00, 0x00]);
        assert_eq!(cpu.step(&mut bus), Ticks::new(STATES_PER_INSTRUCTION));
        cpu.step(&mut bus);
        assert_eq!(cpu.cycles(), Ticks::new(2 * STATES_PER_INSTRUCTION));
    }

    #[test]
    fn interrupt_entry_pushes_frame_and_sets_mask() {
        let mut bus = FlatBus::new();
        bus.set_vector(InterruptSource::SciRxi.vector(), 0x00_3000);
        let mut cpu = cpu_at(&mut bus, &[0x00]);
        cpu.regs.set_sr(0x0005);
        bus.interrupts.write_ipr(3, 0x40);
        bus.interrupts.set_request(InterruptSource::SciRxi, true);

        cpu.step(&mut bus);

        assert_eq!(cpu.regs.pc, 0x3000);
        assert_eq!(cpu.regs.interrupt_mask(), 4);
        assert_eq!(cpu.regs.sp(), 0xFDFA);
        // Frame, low to high: SR, CP, PC.
        assert_eq!(read16(&mut bus, 0xFDFA), 0x0005);
        assert_eq!(read16(&mut bus, 0xFDFC), 0x0000);
        assert_eq!(read16(&mut bus, 0xFDFE), 0x1000);
    }

    #[test]
    fn taken_interrupt_replaces_next_instruction() {
        let mut bus = FlatBus::new();
        bus.set_vector(vector::NMI, 0x00_2000);
        // MOV:E #0x42,R0 would run if the interrupt did not win.
        let mut cpu = cpu_at(&mut bus, &[0x50, 0x42]);
        bus.interrupts.set_request(InterruptSource::Nmi, true);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.r[0], 0);
        assert_eq!(cpu.regs.pc, 0x2000);
        assert_eq!(cpu.regs.interrupt_mask(), 7);
    }

    #[test]
    fn sleep_idles_until_interrupt() {
        let mut bus = FlatBus::new();
        bus.set_vector(InterruptSource::Adi.vector(), 0x00_4000);
        let mut cpu = cpu_at(&mut bus, &[0x1A, 0x00]);
        cpu.step(&mut bus);
        assert!(cpu.is_sleeping());
        let pc = cpu.regs.pc;
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, pc);
        assert_eq!(cpu.cycles(), Ticks::new(3 * STATES_PER_INSTRUCTION));

        bus.interrupts.write_ipr(3, 0x01);
        bus.interrupts.set_request(InterruptSource::Adi, true);
        cpu.step(&mut bus);
        assert!(!cpu.is_sleeping());
        assert_eq!(cpu.regs.pc, 0x4000);
    }

    #[test]
    fn odd_stack_pointer_blocks_push() {
        let mut bus = FlatBus::new();
        let mut cpu = H8500::new();
        cpu.regs.r[7] = 0x2001;
        bus.memory.write(0x1FFF, 0xAA);
        bus.memory.write(0x2000, 0xBB);
        assert!(!cpu.push(&mut bus, 0x1234));
        assert_eq!(cpu.regs.sp(), 0x2001);
        assert_eq!(bus.memory.peek(0x1FFF), 0xAA);
        assert_eq!(bus.memory.peek(0x2000), 0xBB);
        assert_eq!(
            bus.interrupts.pending_exception(),
            Some(Exception::AddressError)
        );
    }

    #[test]
    fn request_survives_a_failed_exception_frame() {
        let mut bus = FlatBus::new();
        bus.set_vector(vector::NMI, 0x00_2000);
        bus.set_vector(vector::ADDRESS_ERROR, 0x00_6000);
        let mut cpu = cpu_at(&mut bus, &[0x00]);
        cpu.regs.r[7] = 0xFE01;
        bus.interrupts.set_request(InterruptSource::Nmi, true);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1000);
        assert!(bus.interrupts.is_pending(InterruptSource::Nmi));
        assert_eq!(
            bus.interrupts.pending_exception(),
            Some(Exception::AddressError)
        );

        cpu.regs.r[7] = 0xFE00;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x6000);
        assert_eq!(bus.interrupts.pending_exception(), None);

        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x2000);
        assert!(!bus.interrupts.is_pending(InterruptSource::Nmi));
    }

    #[test]
    fn odd_stack_pointer_blocks_pop() {
        let mut bus = FlatBus::new();
        let mut cpu = H8500::new();
        cpu.regs.r[7] = 0x0301;
        assert_eq!(cpu.pop(&mut bus), None);
        assert_eq!(cpu.regs.sp(), 0x0301);
    }

    #[test]
    fn stack_lives_in_the_stack_page() {
        let mut bus = FlatBus::new();
        let mut cpu = H8500::new();
        cpu.regs.tp = 0x03;
        cpu.regs.r[7] = 0x0100;
        assert!(cpu.push(&mut bus, 0xCAFE));
        assert_eq!(read16(&mut bus, 0x03_00FE), 0xCAFE);
    }

    #[test]
    fn trace_flag_raises_trace_after_instruction() {
        let mut bus = FlatBus::new();
        bus.set_vector(vector::TRACE, 0x00_5000);
        let mut cpu = cpu_at(&mut bus, &[0x00, 0x00]);
        cpu.regs.sr |= T;
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x1001);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.pc, 0x5000);
        assert_eq!(cpu.regs.sr & T, 0);
    }

    #[test]
    fn observable_reports_registers() {
        let mut cpu = H8500::new();
        cpu.regs.r[5] = 0x1234;
        cpu.regs.sr = Z | 0x0300;
        assert_eq!(cpu.query("r5"), Some(Value::U16(0x1234)));
        assert_eq!(cpu.query("sr.z"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("sr.mask"), Some(Value::U8(3)));
        assert_eq!(cpu.query("r8"), None);
        assert_eq!(cpu.query("bogus"), None);
        assert!(cpu.query_paths().contains(&"cycles"));
    }
}
