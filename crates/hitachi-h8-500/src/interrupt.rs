//! On-chip interrupt and exception controller.
//!
//! The controller owns every pending flag and the interrupt priority
//! registers. Peripherals raise and drop their request lines through
//! [`InterruptController::set_request`]; the CPU asks for the next
//! [`Dispatch`] at each instruction boundary.
//!
//! | Vector | Source |
//! |--------|--------|
//! | 0 | Reset |
//! | 2 | Invalid instruction |
//! | 3 | Divide by zero |
//! | 4 | TRAP/VS |
//! | 8 | Address error |
//! | 9 | Trace |
//! | 11 | NMI |
//! | 16-31 | TRAPA #0-#15 |
//! | 32-33 | IRQ0, IRQ1 |
//! | 36-47 | FRT1-3: ICI, OCIA, OCIB, FOVI |
//! | 48-50 | 8-bit timer: CMIA, CMIB, OVI |
//! | 52-54 | SCI: ERI, RXI, TXI |
//! | 56 | A/D end |

/// Exception vector numbers. The handler address is the 32-bit value at
/// `vector * 4`.
pub mod vector {
    pub const RESET: u8 = 0;
    pub const INVALID_INSTRUCTION: u8 = 2;
    pub const DIVIDE_BY_ZERO: u8 = 3;
    pub const TRAP: u8 = 4;
    pub const ADDRESS_ERROR: u8 = 8;
    pub const TRACE: u8 = 9;
    pub const NMI: u8 = 11;
    pub const TRAPA_0: u8 = 16;
    pub const IRQ0: u8 = 32;
    pub const IRQ1: u8 = 33;
    pub const FRT1_ICI: u8 = 36;
    pub const TMR_CMIA: u8 = 48;
    pub const SCI_ERI: u8 = 52;
    pub const ADI: u8 = 56;
}

/// Level-triggered interrupt sources, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptSource {
    Nmi,
    Irq0,
    Irq1,
    FrtIci(u8),
    FrtOcia(u8),
    FrtOcib(u8),
    FrtFovi(u8),
    TmrCmia,
    TmrCmib,
    TmrOvi,
    SciEri,
    SciRxi,
    SciTxi,
    Adi,
}

/// Number of distinct interrupt sources.
pub const SOURCE_COUNT: usize = 22;

impl InterruptSource {
    /// Vector number for this source.
    #[must_use]
    pub const fn vector(self) -> u8 {
        match self {
            Self::Nmi => vector::NMI,
            Self::Irq0 => vector::IRQ0,
            Self::Irq1 => vector::IRQ1,
            Self::FrtIci(n) => vector::FRT1_ICI + 4 * (n % 3),
            Self::FrtOcia(n) => vector::FRT1_ICI + 4 * (n % 3) + 1,
            Self::FrtOcib(n) => vector::FRT1_ICI + 4 * (n % 3) + 2,
            Self::FrtFovi(n) => vector::FRT1_ICI + 4 * (n % 3) + 3,
            Self::TmrCmia => vector::TMR_CMIA,
            Self::TmrCmib => vector::TMR_CMIA + 1,
            Self::TmrOvi => vector::TMR_CMIA + 2,
            Self::SciEri => vector::SCI_ERI,
            Self::SciRxi => vector::SCI_ERI + 1,
            Self::SciTxi => vector::SCI_ERI + 2,
            Self::Adi => vector::ADI,
        }
    }

    /// Dense index used for the pending table.
    const fn index(self) -> usize {
        match self {
            Self::Nmi => 0,
            Self::Irq0 => 1,
            Self::Irq1 => 2,
            Self::FrtIci(n) => 3 + 4 * (n as usize % 3),
            Self::FrtOcia(n) => 4 + 4 * (n as usize % 3),
            Self::FrtOcib(n) => 5 + 4 * (n as usize % 3),
            Self::FrtFovi(n) => 6 + 4 * (n as usize % 3),
            Self::TmrCmia => 15,
            Self::TmrCmib => 16,
            Self::TmrOvi => 17,
            Self::SciEri => 18,
            Self::SciRxi => 19,
            Self::SciTxi => 20,
            Self::Adi => 21,
        }
    }

    /// Every maskable source, lowest vector first.
    pub const MASKABLE: [Self; 21] = [
        Self::Irq0,
        Self::Irq1,
        Self::FrtIci(0),
        Self::FrtOcia(0),
        Self::FrtOcib(0),
        Self::FrtFovi(0),
        Self::FrtIci(1),
        Self::FrtOcia(1),
        Self::FrtOcib(1),
        Self::FrtFovi(1),
        Self::FrtIci(2),
        Self::FrtOcia(2),
        Self::FrtOcib(2),
        Self::FrtFovi(2),
        Self::TmrCmia,
        Self::TmrCmib,
        Self::TmrOvi,
        Self::SciEri,
        Self::SciRxi,
        Self::SciTxi,
        Self::Adi,
    ];
}

/// Synchronous exceptions raised by the CPU itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    AddressError,
    InvalidInstruction,
    DivideByZero,
    Trap,
    Trace,
}

impl Exception {
    #[must_use]
    pub const fn vector(self) -> u8 {
        match self {
            Self::AddressError => vector::ADDRESS_ERROR,
            Self::InvalidInstruction => vector::INVALID_INSTRUCTION,
            Self::DivideByZero => vector::DIVIDE_BY_ZERO,
            Self::Trap => vector::TRAP,
            Self::Trace => vector::TRACE,
        }
    }
}

/// What the CPU should do at an instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    /// Vector number to fetch the handler from.
    pub vector: u8,
    /// New interrupt mask level, or `None` to keep the current one.
    pub level: Option<u8>,
}

/// Interrupt priority register indices (IPRA-IPRD).
pub const IPR_COUNT: usize = 4;

/// P1CR bit enabling the IRQ0 pin.
pub const P1CR_IRQ0: u8 = 0x20;
/// P1CR bit enabling the IRQ1 pin.
pub const P1CR_IRQ1: u8 = 0x40;

/// Pending-source bookkeeping and priority arbitration.
#[derive(Debug, Clone)]
pub struct InterruptController {
    /// Request line state per source.
    pending: [bool; SOURCE_COUNT],
    /// Latched synchronous exception, if any.
    exception: Option<Exception>,
    /// TRAPA requests, one bit per vector.
    trapa: u16,
    /// IPRA-IPRD.
    ipr: [u8; IPR_COUNT],
    /// Port 1 control (IRQ pin enables).
    p1cr: u8,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: [false; SOURCE_COUNT],
            exception: None,
            trapa: 0,
            ipr: [0; IPR_COUNT],
            p1cr: 0,
        }
    }

    /// Drop every request and clear the priority registers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drive a source's request line.
    pub fn set_request(&mut self, source: InterruptSource, active: bool) {
        self.pending[source.index()] = active;
    }

    #[must_use]
    pub const fn is_pending(&self, source: InterruptSource) -> bool {
        self.pending[source.index()]
    }

    /// Latch a synchronous exception.
    ///
    /// An address error always wins over anything already latched; otherwise
    /// the first exception stays until it is dispatched.
    pub fn raise_exception(&mut self, exception: Exception) {
        match self.exception {
            None => self.exception = Some(exception),
            Some(_) if exception == Exception::AddressError => self.exception = Some(exception),
            Some(_) => {}
        }
    }

    #[must_use]
    pub const fn pending_exception(&self) -> Option<Exception> {
        self.exception
    }

    /// Request a TRAPA vector (0-15).
    pub fn raise_trapa(&mut self, number: u8) {
        self.trapa |= 1 << (number & 0x0F);
    }

    /// Write IPRA-IPRD (`index` 0-3).
    pub fn write_ipr(&mut self, index: usize, value: u8) {
        if let Some(slot) = self.ipr.get_mut(index) {
            *slot = value & 0x77;
        }
    }

    #[must_use]
    pub fn ipr(&self, index: usize) -> u8 {
        self.ipr.get(index).copied().unwrap_or(0)
    }

    pub fn write_p1cr(&mut self, value: u8) {
        self.p1cr = value;
    }

    #[must_use]
    pub const fn p1cr(&self) -> u8 {
        self.p1cr
    }

    /// Priority level assigned to a maskable source, `None` when the source
    /// is disabled at the controller.
    #[must_use]
    pub const fn level(&self, source: InterruptSource) -> Option<u8> {
        let (register, high) = match source {
            InterruptSource::Nmi => return Some(7),
            InterruptSource::Irq0 => {
                if self.p1cr & P1CR_IRQ0 == 0 {
                    return None;
                }
                (0, true)
            }
            InterruptSource::Irq1 => {
                if self.p1cr & P1CR_IRQ1 == 0 {
                    return None;
                }
                (0, false)
            }
            InterruptSource::FrtIci(n)
            | InterruptSource::FrtOcia(n)
            | InterruptSource::FrtOcib(n)
            | InterruptSource::FrtFovi(n) => match n % 3 {
                0 => (1, true),
                1 => (1, false),
                _ => (2, true),
            },
            InterruptSource::TmrCmia | InterruptSource::TmrCmib | InterruptSource::TmrOvi => {
                (2, false)
            }
            InterruptSource::SciEri | InterruptSource::SciRxi | InterruptSource::SciTxi => {
                (3, true)
            }
            InterruptSource::Adi => (3, false),
        };
        let value = self.ipr[register];
        Some(if high { (value >> 4) & 7 } else { value & 7 })
    }

    /// True when something would be dispatched with the given mask.
    #[must_use]
    pub fn has_dispatchable(&self, mask: u8) -> bool {
        self.trapa != 0
            || self.exception.is_some()
            || self.pending[InterruptSource::Nmi.index()]
            || self.best_maskable(mask).is_some()
    }

    fn best_maskable(&self, mask: u8) -> Option<(InterruptSource, u8)> {
        let mut best: Option<(InterruptSource, u8)> = None;
        for source in InterruptSource::MASKABLE {
            if !self.pending[source.index()] {
                continue;
            }
            let Some(level) = self.level(source) else {
                continue;
            };
            if level <= mask {
                continue;
            }
            // MASKABLE is in vector order, so only a strictly higher level
            // displaces an earlier candidate.
            if best.is_none_or(|(_, best_level)| level > best_level) {
                best = Some((source, level));
            }
        }
        best
    }

    /// What would be serviced at this boundary, without consuming it.
    ///
    /// An address error comes first: it reports a failed exception frame,
    /// and the request whose frame failed is still latched behind it. Then
    /// TRAPA, other exceptions, NMI and the best maskable source.
    #[must_use]
    pub fn peek(&self, mask: u8) -> Option<Dispatch> {
        if self.exception == Some(Exception::AddressError) {
            return Some(Dispatch {
                vector: vector::ADDRESS_ERROR,
                level: None,
            });
        }
        if self.trapa != 0 {
            let number = self.trapa.trailing_zeros() as u8;
            return Some(Dispatch {
                vector: vector::TRAPA_0 + number,
                level: None,
            });
        }
        if let Some(exception) = self.exception {
            return Some(Dispatch {
                vector: exception.vector(),
                level: None,
            });
        }
        if self.pending[InterruptSource::Nmi.index()] {
            return Some(Dispatch {
                vector: vector::NMI,
                level: Some(7),
            });
        }
        self.best_maskable(mask).map(|(source, level)| Dispatch {
            vector: source.vector(),
            level: Some(level),
        })
    }

    /// The exception frame for `dispatch` has been written.
    ///
    /// TRAPA requests, exceptions and NMI are consumed here. Maskable
    /// requests stay pending until the peripheral drops them.
    pub fn acknowledge(&mut self, dispatch: Dispatch) {
        let vector = dispatch.vector;
        if (vector::TRAPA_0..vector::TRAPA_0 + 16).contains(&vector) {
            self.trapa &= !(1 << (vector - vector::TRAPA_0));
        } else if self.exception.is_some_and(|e| e.vector() == vector) {
            self.exception = None;
        } else if vector == vector::NMI {
            self.pending[InterruptSource::Nmi.index()] = false;
        }
    }

    /// `peek` and `acknowledge` in one go.
    pub fn next(&mut self, mask: u8) -> Option<Dispatch> {
        let dispatch = self.peek(mask)?;
        self.acknowledge(dispatch);
        Some(dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_vectors_follow_table() {
        assert_eq!(InterruptSource::FrtOcia(0).vector(), 37);
        assert_eq!(InterruptSource::FrtFovi(1).vector(), 43);
        assert_eq!(InterruptSource::FrtOcib(2).vector(), 46);
        assert_eq!(InterruptSource::TmrOvi.vector(), 50);
        assert_eq!(InterruptSource::SciRxi.vector(), 53);
        assert_eq!(InterruptSource::SciTxi.vector(), 54);
        assert_eq!(InterruptSource::Adi.vector(), 56);
    }

    #[test]
    fn dense_indices_are_unique() {
        let mut seen = [false; SOURCE_COUNT];
        seen[InterruptSource::Nmi.index()] = true;
        for source in InterruptSource::MASKABLE {
            assert!(!seen[source.index()], "{source:?}");
            seen[source.index()] = true;
        }
    }

    #[test]
    fn masked_source_stays_pending() {
        let mut ic = InterruptController::new();
        ic.write_ipr(3, 0x30);
        ic.set_request(InterruptSource::SciRxi, true);
        assert_eq!(ic.next(3), None);
        assert!(ic.is_pending(InterruptSource::SciRxi));
        assert_eq!(
            ic.next(2),
            Some(Dispatch {
                vector: 53,
                level: Some(3)
            })
        );
        // Level-triggered: still pending until the SCI drops the line.
        assert!(ic.is_pending(InterruptSource::SciRxi));
    }

    #[test]
    fn higher_priority_wins() {
        let mut ic = InterruptController::new();
        ic.write_ipr(1, 0x20); // FRT1 level 2
        ic.write_ipr(3, 0x05); // ADI level 5
        ic.set_request(InterruptSource::FrtOcia(0), true);
        ic.set_request(InterruptSource::Adi, true);
        assert_eq!(ic.next(0).map(|d| d.vector), Some(vector::ADI));
        ic.set_request(InterruptSource::Adi, false);
        assert_eq!(ic.next(0).map(|d| d.vector), Some(37));
    }

    #[test]
    fn equal_priority_prefers_lowest_vector() {
        let mut ic = InterruptController::new();
        ic.write_ipr(3, 0x44);
        ic.set_request(InterruptSource::Adi, true);
        ic.set_request(InterruptSource::SciTxi, true);
        assert_eq!(ic.next(0).map(|d| d.vector), Some(54));
    }

    #[test]
    fn level_zero_never_dispatches() {
        let mut ic = InterruptController::new();
        ic.set_request(InterruptSource::TmrCmia, true);
        assert!(!ic.has_dispatchable(0));
        assert_eq!(ic.next(0), None);
    }

    #[test]
    fn irq_pins_need_port_enable() {
        let mut ic = InterruptController::new();
        ic.write_ipr(0, 0x60);
        ic.set_request(InterruptSource::Irq0, true);
        assert_eq!(ic.next(0), None);
        ic.write_p1cr(P1CR_IRQ0);
        assert_eq!(ic.next(0).map(|d| d.vector), Some(vector::IRQ0));
    }

    #[test]
    fn nmi_ignores_mask_and_is_consumed() {
        let mut ic = InterruptController::new();
        ic.set_request(InterruptSource::Nmi, true);
        assert_eq!(
            ic.next(7),
            Some(Dispatch {
                vector: vector::NMI,
                level: Some(7)
            })
        );
        assert_eq!(ic.next(7), None);
    }

    #[test]
    fn traps_and_exceptions_come_before_interrupts() {
        let mut ic = InterruptController::new();
        ic.set_request(InterruptSource::Nmi, true);
        ic.raise_exception(Exception::DivideByZero);
        ic.raise_trapa(5);
        assert_eq!(ic.next(7).map(|d| d.vector), Some(vector::TRAPA_0 + 5));
        assert_eq!(ic.next(7).map(|d| d.vector), Some(vector::DIVIDE_BY_ZERO));
        assert_eq!(ic.next(7).map(|d| d.vector), Some(vector::NMI));
    }

    #[test]
    fn peek_leaves_requests_latched() {
        let mut ic = InterruptController::new();
        ic.raise_trapa(3);
        let dispatch = ic.peek(7);
        assert_eq!(dispatch.map(|d| d.vector), Some(vector::TRAPA_0 + 3));
        assert_eq!(ic.peek(7), dispatch);
        ic.acknowledge(dispatch.unwrap());
        assert_eq!(ic.peek(7), None);
    }

    #[test]
    fn failed_frame_keeps_original_request_behind_address_error() {
        let mut ic = InterruptController::new();
        ic.set_request(InterruptSource::Nmi, true);
        ic.raise_trapa(2);
        ic.raise_exception(Exception::AddressError);
        assert_eq!(ic.next(7).map(|d| d.vector), Some(vector::ADDRESS_ERROR));
        assert_eq!(ic.next(7).map(|d| d.vector), Some(vector::TRAPA_0 + 2));
        assert_eq!(ic.next(7).map(|d| d.vector), Some(vector::NMI));
        assert_eq!(ic.next(7), None);
    }

    #[test]
    fn address_error_overrides_latched_exception() {
        let mut ic = InterruptController::new();
        ic.raise_exception(Exception::Trace);
        ic.raise_exception(Exception::AddressError);
        ic.raise_exception(Exception::InvalidInstruction);
        assert_eq!(ic.pending_exception(), Some(Exception::AddressError));
    }
}
