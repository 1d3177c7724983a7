//! The CSR dispatch table.
//!
//! A flat array with one slot per encodable 12-bit specifier, each holding
//! up to three accessors: a reader, a writer, and a combined
//! read-modify-write operation for the registers (mip, sip) whose read and
//! write halves must happen atomically under the interrupt-controller
//! mutex. Range-allocated registers (PMP, hpm counters) are expanded at
//! construction, so dispatch is a single index. A slot with no accessors is
//! an unimplemented CSR.
//!
//! The table is the sole enumeration of which CSRs exist. Registers that
//! only exist under one spec revision still get a slot; their accessors
//! reject the other revision, which keeps the table immutable and the
//! version policy next to the register it concerns.

use crate::csr::{self, CsrSpecifier};

use super::{counter_control, counters, fp, interrupts, pmp, status, translation, trap};
use super::{CsrResult, Hart};

pub(super) type CsrReadFn = fn(&Hart, CsrSpecifier) -> CsrResult;
pub(super) type CsrWriteFn = fn(&mut Hart, CsrSpecifier, u64) -> CsrResult<()>;
pub(super) type CsrRmwFn = fn(&mut Hart, CsrSpecifier, u64, u64) -> CsrResult<u64>;

/// Accessors for one CSR number.
#[derive(Clone, Copy)]
pub(super) struct CsrOps {
    pub read: Option<CsrReadFn>,
    pub write: Option<CsrWriteFn>,
    pub rmw: Option<CsrRmwFn>,
}

impl CsrOps {
    const NONE: Self = Self {
        read: None,
        write: None,
        rmw: None,
    };

    /// Read-only register; the gate drops writes to it silently.
    const fn r(read: CsrReadFn) -> Self {
        Self {
            read: Some(read),
            write: None,
            rmw: None,
        }
    }

    const fn rw(read: CsrReadFn, write: CsrWriteFn) -> Self {
        Self {
            read: Some(read),
            write: Some(write),
            rmw: None,
        }
    }

    const fn rmw(rmw: CsrRmwFn) -> Self {
        Self {
            read: None,
            write: None,
            rmw: Some(rmw),
        }
    }
}

pub(super) static CSR_TABLE: [CsrOps; 4096] = build_table();

const fn build_table() -> [CsrOps; 4096] {
    let mut t = [CsrOps::NONE; 4096];

    // User floating-point CSRs.
    t[csr::FFLAGS as usize] = CsrOps::rw(fp::read_fflags, fp::write_fflags);
    t[csr::FRM as usize] = CsrOps::rw(fp::read_frm, fp::write_frm);
    t[csr::FCSR as usize] = CsrOps::rw(fp::read_fcsr, fp::write_fcsr);

    // User counters and timers.
    t[csr::CYCLE as usize] = CsrOps::r(counters::read_counter);
    t[csr::TIME as usize] = CsrOps::r(counters::read_counter);
    t[csr::INSTRET as usize] = CsrOps::r(counters::read_counter);
    t[csr::CYCLEH as usize] = CsrOps::r(counters::read_counterh);
    t[csr::TIMEH as usize] = CsrOps::r(counters::read_counterh);
    t[csr::INSTRETH as usize] = CsrOps::r(counters::read_counterh);

    // Machine counters and timers share the user reader; their specifiers
    // already demand machine privilege, where the enable gate passes.
    t[csr::MCYCLE as usize] = CsrOps::r(counters::read_counter);
    t[csr::MINSTRET as usize] = CsrOps::r(counters::read_counter);
    t[csr::MCYCLEH as usize] = CsrOps::r(counters::read_counterh);
    t[csr::MINSTRETH as usize] = CsrOps::r(counters::read_counterh);

    // Machine information registers.
    t[csr::MVENDORID as usize] = CsrOps::r(super::read_zero);
    t[csr::MARCHID as usize] = CsrOps::r(super::read_zero);
    t[csr::MIMPID as usize] = CsrOps::r(super::read_zero);
    t[csr::MHARTID as usize] = CsrOps::r(super::read_mhartid);

    // Machine trap setup.
    t[csr::MSTATUS as usize] = CsrOps::rw(status::read_mstatus, status::write_mstatus);
    t[csr::MISA as usize] = CsrOps::r(super::read_misa);
    t[csr::MEDELEG as usize] = CsrOps::rw(trap::read_medeleg, trap::write_medeleg);
    t[csr::MIDELEG as usize] = CsrOps::rw(interrupts::read_mideleg, interrupts::write_mideleg);
    t[csr::MIE as usize] = CsrOps::rw(interrupts::read_mie, interrupts::write_mie);
    t[csr::MTVEC as usize] = CsrOps::rw(trap::read_mtvec, trap::write_mtvec);
    t[csr::MCOUNTEREN as usize] =
        CsrOps::rw(counter_control::read_mcounteren, counter_control::write_mcounteren);

    // Legacy counter setup (until 1.9.1).
    t[csr::MUCOUNTEREN as usize] =
        CsrOps::rw(counter_control::read_mucounteren, counter_control::write_mucounteren);
    t[csr::MSCOUNTEREN as usize] =
        CsrOps::rw(counter_control::read_mscounteren, counter_control::write_mscounteren);

    // Machine trap handling.
    t[csr::MSCRATCH as usize] = CsrOps::rw(trap::read_mscratch, trap::write_mscratch);
    t[csr::MEPC as usize] = CsrOps::rw(trap::read_mepc, trap::write_mepc);
    t[csr::MCAUSE as usize] = CsrOps::rw(trap::read_mcause, trap::write_mcause);
    t[csr::MBADADDR as usize] = CsrOps::rw(trap::read_mbadaddr, trap::write_mbadaddr);
    t[csr::MIP as usize] = CsrOps::rmw(interrupts::rmw_mip);

    // Supervisor trap setup.
    t[csr::SSTATUS as usize] = CsrOps::rw(status::read_sstatus, status::write_sstatus);
    t[csr::SIE as usize] = CsrOps::rw(interrupts::read_sie, interrupts::write_sie);
    t[csr::STVEC as usize] = CsrOps::rw(trap::read_stvec, trap::write_stvec);
    t[csr::SCOUNTEREN as usize] =
        CsrOps::rw(counter_control::read_scounteren, counter_control::write_scounteren);

    // Supervisor trap handling.
    t[csr::SSCRATCH as usize] = CsrOps::rw(trap::read_sscratch, trap::write_sscratch);
    t[csr::SEPC as usize] = CsrOps::rw(trap::read_sepc, trap::write_sepc);
    t[csr::SCAUSE as usize] = CsrOps::rw(trap::read_scause, trap::write_scause);
    t[csr::SBADADDR as usize] = CsrOps::rw(trap::read_sbadaddr, trap::write_sbadaddr);
    t[csr::SIP as usize] = CsrOps::rmw(interrupts::rmw_sip);

    // Supervisor protection and translation.
    t[csr::SATP as usize] = CsrOps::rw(translation::read_satp, translation::write_satp);

    // Physical memory protection.
    let mut i = csr::PMPCFG0 as usize;
    while i <= csr::PMPCFG3 as usize {
        t[i] = CsrOps::rw(pmp::read_pmpcfg, pmp::write_pmpcfg);
        i += 1;
    }
    let mut i = csr::PMPADDR0 as usize;
    while i <= csr::PMPADDR15 as usize {
        t[i] = CsrOps::rw(pmp::read_pmpaddr, pmp::write_pmpaddr);
        i += 1;
    }

    // Performance counters.
    let mut i = csr::HPMCOUNTER3 as usize;
    while i <= csr::HPMCOUNTER31 as usize {
        t[i] = CsrOps::r(counters::read_zero_counter);
        i += 1;
    }
    let mut i = csr::HPMCOUNTER3H as usize;
    while i <= csr::HPMCOUNTER31H as usize {
        t[i] = CsrOps::r(counters::read_zero_counterh);
        i += 1;
    }
    let mut i = csr::MHPMCOUNTER3 as usize;
    while i <= csr::MHPMCOUNTER31 as usize {
        t[i] = CsrOps::r(super::read_zero);
        i += 1;
    }
    let mut i = csr::MHPMCOUNTER3H as usize;
    while i <= csr::MHPMCOUNTER31H as usize {
        t[i] = CsrOps::r(counters::read_zeroh);
        i += 1;
    }
    let mut i = csr::MHPMEVENT3 as usize;
    while i <= csr::MHPMEVENT31 as usize {
        t[i] = CsrOps::r(super::read_zero);
        i += 1;
    }

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implemented_slots() {
        assert!(CSR_TABLE[csr::MSTATUS as usize].read.is_some());
        assert!(CSR_TABLE[csr::MSTATUS as usize].write.is_some());
        assert!(CSR_TABLE[csr::MISA as usize].read.is_some());
        // misa has no writer: the gate drops writes.
        assert!(CSR_TABLE[csr::MISA as usize].write.is_none());
        // mip and sip dispatch through the combined accessor only.
        assert!(CSR_TABLE[csr::MIP as usize].rmw.is_some());
        assert!(CSR_TABLE[csr::MIP as usize].read.is_none());
        assert!(CSR_TABLE[csr::SIP as usize].rmw.is_some());
    }

    #[test]
    fn test_range_slots_expanded() {
        for i in csr::HPMCOUNTER3..=csr::HPMCOUNTER31 {
            assert!(CSR_TABLE[i as usize].read.is_some());
        }
        for i in csr::PMPADDR0..=csr::PMPADDR15 {
            assert!(CSR_TABLE[i as usize].write.is_some());
        }
        for i in csr::MHPMEVENT3..=csr::MHPMEVENT31 {
            assert!(CSR_TABLE[i as usize].read.is_some());
        }
    }

    #[test]
    fn test_unimplemented_slots_are_empty() {
        // Hypervisor and debug CSRs are not supported.
        for i in [0x600, 0x643, 0x680, 0x7A0, 0x7B0, 0x5A8] {
            let ops = &CSR_TABLE[i];
            assert!(ops.read.is_none() && ops.write.is_none() && ops.rmw.is_none());
        }
    }
}
