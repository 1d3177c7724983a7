//! Specifiers for all CSRs this hart implements, and the access attributes
//! that a specifier encodes in its own bits.
//!
//! Debug-mode and hypervisor CSRs are not supported. Registers that only
//! exist under one privileged-spec revision (e.g. mcounteren vs. the legacy
//! mucounteren) all have constants here; their accessors reject the wrong
//! revision at access time.

use crate::RawPrivilegeLevel;

/// General 12-bit value representing a CSR specifier. Note that this can
/// hold any 12-bit value, even if the value represents an unsupported or
/// non-existent CSR.
pub type CsrSpecifier = u16;

//
// Unprivileged floating-point CSRs (`0x001..=0x003`).
//
/// Floating-point accrued exceptions.
pub const FFLAGS: CsrSpecifier = 0x001;
/// Floating-point dynamic rounding mode.
pub const FRM: CsrSpecifier = 0x002;
/// Floating-point CSR ([`FRM`] + [`FFLAGS`]).
pub const FCSR: CsrSpecifier = 0x003;

//
// Unprivileged counters/timers (`0xC00..=0xC1F`, `0xC80..=0xC9F`).
//
/// Cycle counter for the RDCYCLE instruction.
pub const CYCLE: CsrSpecifier = 0xC00;
/// Timer for the RDTIME instruction.
pub const TIME: CsrSpecifier = 0xC01;
/// Instructions-retired counter for the RDINSTRET instruction.
pub const INSTRET: CsrSpecifier = 0xC02;
/// First performance-monitoring counter.
pub const HPMCOUNTER3: CsrSpecifier = 0xC03;
/// Last performance-monitoring counter.
pub const HPMCOUNTER31: CsrSpecifier = 0xC1F;
/// Upper 32 bits of [`CYCLE`], RV32 only.
pub const CYCLEH: CsrSpecifier = 0xC80;
/// Upper 32 bits of [`TIME`], RV32 only.
pub const TIMEH: CsrSpecifier = 0xC81;
/// Upper 32 bits of [`INSTRET`], RV32 only.
pub const INSTRETH: CsrSpecifier = 0xC82;
/// Upper 32 bits of [`HPMCOUNTER3`], RV32 only.
pub const HPMCOUNTER3H: CsrSpecifier = 0xC83;
/// Upper 32 bits of [`HPMCOUNTER31`], RV32 only.
pub const HPMCOUNTER31H: CsrSpecifier = 0xC9F;

//
// Supervisor trap setup (`0x100`, `0x104..=0x106`).
//
/// Supervisor status register; a masked window onto [`MSTATUS`].
pub const SSTATUS: CsrSpecifier = 0x100;
/// Supervisor interrupt-enable register; [`MIE`] seen through mideleg.
pub const SIE: CsrSpecifier = 0x104;
/// Supervisor trap handler base address.
pub const STVEC: CsrSpecifier = 0x105;
/// Supervisor counter enable. Since 1.10.0.
pub const SCOUNTEREN: CsrSpecifier = 0x106;

//
// Supervisor trap handling (`0x140..=0x144`).
//
/// Scratch register for supervisor trap handlers.
pub const SSCRATCH: CsrSpecifier = 0x140;
/// Supervisor exception program counter.
pub const SEPC: CsrSpecifier = 0x141;
/// Supervisor trap cause.
pub const SCAUSE: CsrSpecifier = 0x142;
/// Supervisor bad address. Named stval from 1.10.0 on.
pub const SBADADDR: CsrSpecifier = 0x143;
/// Supervisor interrupt pending; [`MIP`] seen through mideleg.
pub const SIP: CsrSpecifier = 0x144;

//
// Supervisor protection and translation (`0x180`).
//
/// Supervisor address translation and protection. Since 1.10.0.
pub const SATP: CsrSpecifier = 0x180;
/// Supervisor page-table base register, the pre-1.10 face of [`SATP`].
pub const SPTBR: CsrSpecifier = SATP;

//
// Machine information registers (`0xF11..=0xF14`).
//
/// Vendor ID.
pub const MVENDORID: CsrSpecifier = 0xF11;
/// Architecture ID.
pub const MARCHID: CsrSpecifier = 0xF12;
/// Implementation ID.
pub const MIMPID: CsrSpecifier = 0xF13;
/// Hardware thread ID.
pub const MHARTID: CsrSpecifier = 0xF14;

//
// Machine trap setup (`0x300..=0x306`, legacy `0x320..=0x321`).
//
/// Machine status register.
pub const MSTATUS: CsrSpecifier = 0x300;
/// ISA and extensions.
pub const MISA: CsrSpecifier = 0x301;
/// Machine exception delegation register.
pub const MEDELEG: CsrSpecifier = 0x302;
/// Machine interrupt delegation register.
pub const MIDELEG: CsrSpecifier = 0x303;
/// Machine interrupt-enable register.
pub const MIE: CsrSpecifier = 0x304;
/// Machine trap-handler base address.
pub const MTVEC: CsrSpecifier = 0x305;
/// Machine counter enable. Since 1.10.0.
pub const MCOUNTEREN: CsrSpecifier = 0x306;
/// Legacy user counter enable, until 1.9.1. Aliases the storage that
/// 1.10.0 calls scounteren.
pub const MUCOUNTEREN: CsrSpecifier = 0x320;
/// Legacy supervisor counter enable, until 1.9.1. Aliases the storage that
/// 1.10.0 calls mcounteren.
pub const MSCOUNTEREN: CsrSpecifier = 0x321;

//
// Machine trap handling (`0x340..=0x344`).
//
/// Scratch register for machine trap handlers.
pub const MSCRATCH: CsrSpecifier = 0x340;
/// Machine exception program counter.
pub const MEPC: CsrSpecifier = 0x341;
/// Machine trap cause.
pub const MCAUSE: CsrSpecifier = 0x342;
/// Machine bad address. Named mtval from 1.10.0 on.
pub const MBADADDR: CsrSpecifier = 0x343;
/// Machine interrupt pending.
pub const MIP: CsrSpecifier = 0x344;

//
// Machine memory protection (`0x3A0..=0x3A3`, `0x3B0..=0x3BF`).
//
/// First physical-memory-protection configuration register.
pub const PMPCFG0: CsrSpecifier = 0x3A0;
/// Last physical-memory-protection configuration register backed by the
/// sixteen implemented entries.
pub const PMPCFG3: CsrSpecifier = 0x3A3;
/// First physical-memory-protection address register.
pub const PMPADDR0: CsrSpecifier = 0x3B0;
/// Last physical-memory-protection address register.
pub const PMPADDR15: CsrSpecifier = 0x3BF;

//
// Machine counters/timers (`0xB00`, `0xB02..=0xB1F`, `0xB80..=0xB9F`).
//
/// Machine cycle counter.
pub const MCYCLE: CsrSpecifier = 0xB00;
/// Machine instructions-retired counter.
pub const MINSTRET: CsrSpecifier = 0xB02;
/// First machine performance-monitoring counter.
pub const MHPMCOUNTER3: CsrSpecifier = 0xB03;
/// Last machine performance-monitoring counter.
pub const MHPMCOUNTER31: CsrSpecifier = 0xB1F;
/// Upper 32 bits of [`MCYCLE`], RV32 only.
pub const MCYCLEH: CsrSpecifier = 0xB80;
/// Upper 32 bits of [`MINSTRET`], RV32 only.
pub const MINSTRETH: CsrSpecifier = 0xB82;
/// Upper 32 bits of [`MHPMCOUNTER3`], RV32 only.
pub const MHPMCOUNTER3H: CsrSpecifier = 0xB83;
/// Upper 32 bits of [`MHPMCOUNTER31`], RV32 only.
pub const MHPMCOUNTER31H: CsrSpecifier = 0xB9F;

//
// Machine counter setup (`0x323..=0x33F`).
//
/// First machine performance-monitoring event selector.
pub const MHPMEVENT3: CsrSpecifier = 0x323;
/// Last machine performance-monitoring event selector.
pub const MHPMEVENT31: CsrSpecifier = 0x33F;

/// Returns `true` if `specifier` is valid, which is the case if it fits in
/// 12 bits.
pub fn is_valid(specifier: CsrSpecifier) -> bool {
    specifier < 1 << 12
}

/// Returns `true` if this CSR only supports read access.
///
/// Requires [`is_valid(specifier)`](is_valid), otherwise the return value
/// is undefined.
pub fn is_read_only(specifier: CsrSpecifier) -> bool {
    // The top two bits of a CSR specifier indicate whether the CSR is
    // read-only (0b11) or read/write (0b00, 0b01, 0b10).
    specifier >> 10 == 0b11
}

/// Returns the minimum privilege level required to access this CSR.
///
/// Requires [`is_valid(specifier)`](is_valid), otherwise the return value
/// is undefined.
///
/// Note that this returns a [`RawPrivilegeLevel`]: the minimum required
/// level may be the (never-taken) hypervisor level, which still has a
/// defined meaning — only machine mode may access the CSR.
pub fn required_privilege_level(specifier: CsrSpecifier) -> RawPrivilegeLevel {
    // Bits `9:8` encode the minimum required privilege level.
    RawPrivilegeLevel::from_u2(((specifier >> 8) & 0b11) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_encoding() {
        assert!(is_read_only(MVENDORID));
        assert!(is_read_only(MHARTID));
        assert!(is_read_only(CYCLE));
        assert!(is_read_only(HPMCOUNTER31H));
        assert!(!is_read_only(MSTATUS));
        assert!(!is_read_only(SSTATUS));
        assert!(!is_read_only(FCSR));
        assert!(!is_read_only(MCYCLE));
    }

    #[test]
    fn test_required_privilege_level() {
        assert_eq!(RawPrivilegeLevel::User, required_privilege_level(FFLAGS));
        assert_eq!(RawPrivilegeLevel::User, required_privilege_level(CYCLE));
        assert_eq!(
            RawPrivilegeLevel::Supervisor,
            required_privilege_level(SSTATUS)
        );
        assert_eq!(RawPrivilegeLevel::Supervisor, required_privilege_level(SATP));
        assert_eq!(RawPrivilegeLevel::Machine, required_privilege_level(MSTATUS));
        assert_eq!(RawPrivilegeLevel::Machine, required_privilege_level(MHARTID));
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(0));
        assert!(is_valid(0xFFF));
        assert!(!is_valid(0x1000));
    }
}
