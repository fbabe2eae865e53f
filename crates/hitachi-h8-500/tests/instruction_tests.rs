//! Unit tests for individual H8/500 instructions.
//!
//! Programs run from page 0 offset 0x1000 with the stack at 0xFE00 and
//! every interrupt level unmasked.

use emu_core::Bus;
use hitachi_h8_500::bus::read16;
use hitachi_h8_500::flags::{C, N, V, Z};
use hitachi_h8_500::interrupt::vector;
use hitachi_h8_500::{Exception, FlatBus, H8500};

fn setup(program: &[u8]) -> (H8500, FlatBus) {
    let mut bus = FlatBus::new();
    bus.load(0x1000, program);
    let mut cpu = H8500::new();
    cpu.set_pc(0, 0x1000);
    cpu.regs_mut().r[7] = 0xFE00;
    cpu.regs_mut().set_interrupt_mask(0);
    (cpu, bus)
}

/// Run a fixed number of steps.
fn run(cpu: &mut H8500, bus: &mut FlatBus, steps: usize) {
    for _ in 0..steps {
        cpu.step(bus);
    }
}

fn ccr(cpu: &H8500) -> u16 {
    cpu.regs().sr & (N | Z | V | C)
}

#[test]
fn test_mov_immediate_forms() {
    let (mut cpu, mut bus) = setup(&[
        0x50, 0x80, // MOV:E #0x80,R0
        0x59, 0x12, 0x34, // MOV:I #0x1234,R1
    ]);
    cpu.regs_mut().r[0] = 0xAB00;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0xAB80);
    assert_eq!(ccr(&cpu), N);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[1], 0x1234);
    assert_eq!(ccr(&cpu), 0);
}

#[test]
fn test_mov_short_absolute_uses_base_register() {
    let (mut cpu, mut bus) = setup(&[
        0x78, 0x90, // MOV:S.W R0,@0x90
        0x69, 0x90, // MOV:L.W @0x90,R1
    ]);
    cpu.regs_mut().br = 0xFE;
    cpu.regs_mut().r[0] = 0xBEEF;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(read16(&mut bus, 0xFE90), 0xBEEF);
    assert_eq!(cpu.regs().r[1], 0xBEEF);
}

#[test]
fn test_mov_frame_relative() {
    let (mut cpu, mut bus) = setup(&[
        0x92, 0xFC, // MOV:F.B R2,@(-4,R6)
        0x83, 0xFC, // MOV:F.B @(-4,R6),R3
    ]);
    cpu.regs_mut().r[6] = 0x2000;
    cpu.regs_mut().r[2] = 0x0055;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(bus.memory.peek(0x1FFC), 0x55);
    assert_eq!(cpu.regs().r[3] & 0xFF, 0x55);
}

#[test]
fn test_general_add_and_sub() {
    let (mut cpu, mut bus) = setup(&[
        0xA9, 0x20, // ADD:G.W R1,R0
        0xAA, 0x31, // SUB.W R2,R1
    ]);
    cpu.regs_mut().r[0] = 0x7FFF;
    cpu.regs_mut().r[1] = 0x0001;
    cpu.regs_mut().r[2] = 0x0002;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x8000);
    assert_eq!(ccr(&cpu), N | V);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[1], 0xFFFF);
    assert_eq!(ccr(&cpu), N | C);
}

#[test]
fn test_add_quick_to_memory() {
    let (mut cpu, mut bus) = setup(&[
        0xD8, 0x09, // ADD:Q.W #2,@R0
        0xD8, 0x0C, // ADD:Q.W #-1,@R0
    ]);
    cpu.regs_mut().r[0] = 0x3000;
    bus.load(0x3000, &[0x00, 0x10]);
    run(&mut cpu, &mut bus, 2);
    assert_eq!(read16(&mut bus, 0x3000), 0x0011);
}

#[test]
fn test_cmp_sets_flags_without_writing() {
    let (mut cpu, mut bus) = setup(&[
        0x43, 0x10, // CMP:E #0x10,R3
        0x4B, 0x00, 0x20, // CMP:I #0x0020,R3
    ]);
    cpu.regs_mut().r[3] = 0x0010;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(ccr(&cpu), Z);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(ccr(&cpu), N | C);
    assert_eq!(cpu.regs().r[3], 0x0010);
}

#[test]
fn test_cmp_general_immediate_against_memory() {
    let (mut cpu, mut bus) = setup(&[
        0x15, 0x30, 0x00, 0x04, 0x42, // CMP:G.B #0x42,@0x3000
    ]);
    bus.memory.write(0x3000, 0x42);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(ccr(&cpu), Z);
}

#[test]
fn test_logic_keeps_carry() {
    let (mut cpu, mut bus) = setup(&[
        0xA1, 0x50, // AND.B R1,R0
        0xA1, 0x40, // OR.B R1,R0
        0xA1, 0x60, // XOR.B R1,R0
    ]);
    cpu.regs_mut().sr |= C;
    cpu.regs_mut().r[0] = 0x00F0;
    cpu.regs_mut().r[1] = 0x000F;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x0000);
    assert_eq!(ccr(&cpu), Z | C);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x000F);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x0000);
    assert_eq!(ccr(&cpu), Z | C);
}

#[test]
fn test_single_operand_ops() {
    let (mut cpu, mut bus) = setup(&[
        0xA0, 0x14, // NEG.B R0
        0xA1, 0x15, // NOT.B R1
        0xAA, 0x13, // CLR.W R2
        0xA3, 0x10, // SWAP R3
    ]);
    cpu.regs_mut().r[0] = 0x0001;
    cpu.regs_mut().r[1] = 0x1200;
    cpu.regs_mut().r[2] = 0x5555;
    cpu.regs_mut().r[3] = 0x1234;
    run(&mut cpu, &mut bus, 4);
    assert_eq!(cpu.regs().r[0], 0x00FF);
    assert_eq!(cpu.regs().r[1], 0x12FF);
    assert_eq!(cpu.regs().r[2], 0);
    assert_eq!(cpu.regs().r[3], 0x3412);
}

#[test]
fn test_extend() {
    let (mut cpu, mut bus) = setup(&[
        0xA0, 0x11, // EXTS R0
        0xA1, 0x12, // EXTU R1
    ]);
    cpu.regs_mut().r[0] = 0x0080;
    cpu.regs_mut().r[1] = 0xFF80;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs().r[0], 0xFF80);
    assert_eq!(cpu.regs().r[1], 0x0080);
}

#[test]
fn test_tas_sets_sign_bit() {
    let (mut cpu, mut bus) = setup(&[0xD0, 0x17]); // TAS @R0
    cpu.regs_mut().r[0] = 0x3000;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory.peek(0x3000), 0x80);
    assert_eq!(ccr(&cpu), Z);
}

#[test]
fn test_shifts() {
    let (mut cpu, mut bus) = setup(&[
        0xA0, 0x1A, // SHLL.B R0
        0xA9, 0x19, // SHAR.W R1
    ]);
    cpu.regs_mut().r[0] = 0x0081;
    cpu.regs_mut().r[1] = 0x8002;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x0002);
    assert_eq!(ccr(&cpu), C);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[1], 0xC001);
    assert_eq!(ccr(&cpu), N);
}

#[test]
fn test_addx_only_clears_zero() {
    let (mut cpu, mut bus) = setup(&[
        0xA1, 0xA0, // ADDX.B R1,R0
    ]);
    cpu.regs_mut().sr |= C;
    cpu.regs_mut().r[0] = 0x00FF;
    cpu.regs_mut().r[1] = 0x0000;
    run(&mut cpu, &mut bus, 1);
    // Result is zero but Z was clear beforehand, so it stays clear.
    assert_eq!(cpu.regs().r[0], 0x0000);
    assert_eq!(ccr(&cpu), C);
}

#[test]
fn test_adds_sign_extends_bytes() {
    let (mut cpu, mut bus) = setup(&[0x04, 0xFF, 0x28]); // ADDS.B #-1,R0
    cpu.regs_mut().r[0] = 0x1000;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x0FFF);
}

#[test]
fn test_mulxu_word() {
    let (mut cpu, mut bus) = setup(&[0xA9, 0xAA]); // MULXU.W R1,R2
    cpu.regs_mut().r[2] = 0x1000;
    cpu.regs_mut().r[1] = 0x0100;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[2], 0x0010);
    assert_eq!(cpu.regs().r[3], 0x0000);
}

#[test]
fn test_divxu_byte() {
    let (mut cpu, mut bus) = setup(&[0x04, 0x07, 0xB8]); // DIVXU.B #7,R0
    cpu.regs_mut().r[0] = 100;
    run(&mut cpu, &mut bus, 1);
    // Remainder in the high byte, quotient in the low byte.
    assert_eq!(cpu.regs().r[0], (2 << 8) | 14);
}

#[test]
fn test_divxu_by_zero() {
    let (mut cpu, mut bus) = setup(&[0xA9, 0xB8]); // DIVXU.W R1,R0
    cpu.regs_mut().r[0] = 0x0001;
    cpu.regs_mut().r[1] = 0x0000;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(
        bus.interrupts.pending_exception(),
        Some(Exception::DivideByZero)
    );
}

#[test]
fn test_divxu_overflow_sets_v() {
    let (mut cpu, mut bus) = setup(&[0x04, 0x01, 0xB8]); // DIVXU.B #1,R0
    cpu.regs_mut().r[0] = 0x0200;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x0200);
    assert_eq!(ccr(&cpu), V);
}

#[test]
fn test_divxu_word() {
    let (mut cpu, mut bus) = setup(&[0x0C, 0x01, 0x00, 0xB8]); // DIVXU.W #0x100,R0
    cpu.regs_mut().r[0] = 0x0001;
    cpu.regs_mut().r[1] = 0x0234;
    run(&mut cpu, &mut bus, 1);
    // 0x0001_0234 / 0x100: quotient in R1, remainder in R0.
    assert_eq!(cpu.regs().r[1], 0x0102);
    assert_eq!(cpu.regs().r[0], 0x0034);
}

#[test]
fn test_bit_operations() {
    let (mut cpu, mut bus) = setup(&[
        0xD0, 0xC3, // BSET #3,@R0
        0xD0, 0xF3, // BTST #3,@R0
        0xD0, 0xD3, // BCLR #3,@R0
        0xA1, 0xE9, // BNOT #9,R1 (byte operand, bit 1)
    ]);
    cpu.regs_mut().r[0] = 0x3000;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory.peek(0x3000), 0x08);
    assert_eq!(ccr(&cpu) & Z, Z);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(ccr(&cpu) & Z, 0);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory.peek(0x3000), 0x00);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[1], 0x0002);
}

#[test]
fn test_bit_number_from_register() {
    let (mut cpu, mut bus) = setup(&[0xA8, 0x49]); // BSET.W R1,R0
    cpu.regs_mut().r[1] = 15;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x8000);
}

#[test]
fn test_branches() {
    let (mut cpu, mut bus) = setup(&[
        0x27, 0x02, // BEQ +2 (taken)
        0x00, 0x00, // skipped
        0x26, 0x10, // BNE (not taken)
        0x30, 0x00, 0x10, // BRA.W +0x10
    ]);
    cpu.regs_mut().sr |= Z;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1004);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1006);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1019);
}

#[test]
fn test_bsr_rts() {
    let (mut cpu, mut bus) = setup(&[
        0x0E, 0x02, // BSR +2
        0x00, 0x00,
        0x19, // RTS
    ]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1004);
    assert_eq!(cpu.regs().sp(), 0xFDFE);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1002);
    assert_eq!(cpu.regs().sp(), 0xFE00);
}

#[test]
fn test_jsr_register_indirect() {
    let (mut cpu, mut bus) = setup(&[0x11, 0xD8]); // JSR @R0
    cpu.regs_mut().r[0] = 0x2000;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x2000);
    assert_eq!(read16(&mut bus, 0xFDFE), 0x1002);
}

#[test]
fn test_pjsr_and_prts_cross_pages() {
    let (mut cpu, mut bus) = setup(&[0x03, 0x02, 0x40, 0x00]); // PJSR @0x024000
    bus.load(0x02_4000, &[0x11, 0x19]); // PRTS
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().cp, 0x02);
    assert_eq!(cpu.regs().pc, 0x4000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().cp, 0x00);
    assert_eq!(cpu.regs().pc, 0x1004);
    assert_eq!(cpu.regs().sp(), 0xFE00);
}

#[test]
fn test_pjmp_register_pair() {
    let (mut cpu, mut bus) = setup(&[0x11, 0xCA]); // PJMP @R2
    cpu.regs_mut().r[2] = 0x0003;
    cpu.regs_mut().r[3] = 0x1234;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().cp, 0x03);
    assert_eq!(cpu.regs().pc, 0x1234);
}

#[test]
fn test_scb_counts_down() {
    let (mut cpu, mut bus) = setup(&[
        0x01, 0xB8, 0xFD, // loop: SCB/F R0,loop
    ]);
    cpu.regs_mut().r[0] = 2;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0xFFFF);
    assert_eq!(cpu.regs().pc, 0x1003);
}

#[test]
fn test_stm_ldm() {
    let (mut cpu, mut bus) = setup(&[
        0x12, 0x05, // STM (R0,R2),@-SP
        0x02, 0x05, // LDM @SP+,(R0,R2)
    ]);
    cpu.regs_mut().r[0] = 0x1111;
    cpu.regs_mut().r[2] = 0x2222;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().sp(), 0xFDFC);
    assert_eq!(read16(&mut bus, 0xFDFC), 0x1111);
    assert_eq!(read16(&mut bus, 0xFDFE), 0x2222);
    cpu.regs_mut().r[0] = 0;
    cpu.regs_mut().r[2] = 0;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0], 0x1111);
    assert_eq!(cpu.regs().r[2], 0x2222);
    assert_eq!(cpu.regs().sp(), 0xFE00);
}

#[test]
fn test_link_unlk() {
    let (mut cpu, mut bus) = setup(&[
        0x17, 0xF0, // LINK FP,#-16
        0x0F, // UNLK FP
    ]);
    cpu.regs_mut().r[6] = 0xAAAA;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().fp(), 0xFDFE);
    assert_eq!(cpu.regs().sp(), 0xFDEE);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().fp(), 0xAAAA);
    assert_eq!(cpu.regs().sp(), 0xFE00);
}

#[test]
fn test_rtd_releases_arguments() {
    let (mut cpu, mut bus) = setup(&[0x14, 0x04]); // RTD #4
    cpu.regs_mut().r[7] = 0xFDFE;
    bus.load(0xFDFE, &[0x20, 0x00]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x2000);
    assert_eq!(cpu.regs().sp(), 0xFE04);
}

#[test]
fn test_ldc_holds_off_interrupts_for_one_instruction() {
    let (mut cpu, mut bus) = setup(&[
        0x04, 0x02, 0x8B, // LDC.B #2,BR
        0x00, // NOP
    ]);
    bus.set_vector(vector::NMI, 0x00_2000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().br, 0x02);
    bus.interrupts.set_request(hitachi_h8_500::InterruptSource::Nmi, true);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x1004);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x2000);
}

#[test]
fn test_andc_lowers_interrupt_mask() {
    let (mut cpu, mut bus) = setup(&[0x0C, 0xF8, 0xFF, 0x58]); // ANDC.W #0xF8FF,SR
    cpu.regs_mut().set_interrupt_mask(7);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().interrupt_mask(), 0);
}

#[test]
fn test_stc_reads_page_register() {
    let (mut cpu, mut bus) = setup(&[0xA0, 0x9B]); // STC.B BR,R0
    cpu.regs_mut().br = 0x5A;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().r[0] & 0xFF, 0x5A);
}

#[test]
fn test_trapa_enters_vector_immediately() {
    let (mut cpu, mut bus) = setup(&[0x08, 0x13]); // TRAPA #3
    bus.set_vector(vector::TRAPA_0 + 3, 0x00_6000);
    cpu.regs_mut().set_interrupt_mask(7);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x6000);
    assert_eq!(read16(&mut bus, 0xFDFE), 0x1002);
}

#[test]
fn test_rte_restores_frame() {
    let (mut cpu, mut bus) = setup(&[0x0A]); // RTE
    cpu.regs_mut().r[7] = 0xFDFA;
    bus.load(0xFDFA, &[0x03, 0x05, 0x00, 0x01, 0x23, 0x45]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().sr, 0x0305);
    assert_eq!(cpu.regs().cp, 0x01);
    assert_eq!(cpu.regs().pc, 0x2345);
    assert_eq!(cpu.regs().sp(), 0xFE00);
}

#[test]
fn test_invalid_opcode_raises_exception() {
    let (mut cpu, mut bus) = setup(&[0x0B, 0x00]);
    bus.set_vector(vector::INVALID_INSTRUCTION, 0x00_7000);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(
        bus.interrupts.pending_exception(),
        Some(Exception::InvalidInstruction)
    );
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs().pc, 0x7000);
}

#[test]
fn test_store_to_immediate_is_invalid() {
    let (mut cpu, mut bus) = setup(&[0x04, 0x01, 0x13]); // CLR #1
    run(&mut cpu, &mut bus, 1);
    assert_eq!(
        bus.interrupts.pending_exception(),
        Some(Exception::InvalidInstruction)
    );
}

#[test]
fn test_trap_on_overflow() {
    let (mut cpu, mut bus) = setup(&[0x09, 0x09]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.interrupts.pending_exception(), None);
    cpu.regs_mut().sr |= V;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.interrupts.pending_exception(), Some(Exception::Trap));
}
