//! Control-plane (CSR file) of an emulated RISC-V hart.
//!
//! This crate implements the Zicsr-visible control and status registers of a
//! single hart for privileged-architecture versions 1.9.1 and 1.10.0: the
//! per-register semantics, the privilege/writability access gate, and the
//! narrow interfaces to the MMU (translation-cache flushes), the interrupt
//! controller (the shared pending bitmap), the FP unit (rounding mode and
//! accrued flags), the host clock (cycle/time/instret), and the PMP table.
//!
//! It deliberately does *not* decode instructions, walk page tables, or
//! deliver traps; those collaborators drive a [`Hart`] through its public
//! surface.

#[macro_use]
extern crate static_assertions;

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

pub mod csr;
pub mod hart;

pub use hart::{Config, CsrError, CsrResult, Hart, IrqLines, NullTlb, TickSource, Tlb, WallClock};

/// Width of the hart's integer registers, and therefore of its CSRs.
///
/// Fixed at hart creation; mirrored by the MXL field of misa.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Xlen {
    Rv32,
    Rv64,
}

impl Xlen {
    pub const fn bits(self) -> u32 {
        match self {
            Xlen::Rv32 => 32,
            Xlen::Rv64 => 64,
        }
    }

    /// All-ones mask of this width.
    pub const fn mask(self) -> u64 {
        match self {
            Xlen::Rv32 => 0xFFFF_FFFF,
            Xlen::Rv64 => u64::MAX,
        }
    }

    /// The MXL field placed in the top two bits of misa (1 = 32-bit,
    /// 2 = 64-bit).
    pub(crate) const fn misa_mxl(self) -> u64 {
        match self {
            Xlen::Rv32 => 1 << 30,
            Xlen::Rv64 => 2 << 62,
        }
    }

    /// Position of the SD (status dirty) bit of mstatus, which sits at the
    /// most significant bit for either width.
    pub(crate) const fn status_sd(self) -> u64 {
        1 << (self.bits() - 1)
    }
}

/// Revision of the privileged architecture a hart claims to implement.
///
/// The two supported revisions have incompatible CSR sets: 1.10.0 introduces
/// mcounteren/scounteren/satp (and renames mbadaddr/sbadaddr to
/// mtval/stval), while 1.9.1 has mucounteren/mscounteren/sptbr and carries
/// the VM field inside mstatus. The choice is fixed at hart creation and
/// never changes; registers of the other revision answer as illegal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum PrivilegeSpec {
    V1_9_1,
    V1_10_0,
}

/// Extension-letter bits for misa, one bit per letter 'A'..='Z'.
pub mod isa {
    const fn ext(letter: u8) -> u64 {
        1 << (letter - b'A')
    }

    pub const A: u64 = ext(b'A');
    pub const C: u64 = ext(b'C');
    pub const D: u64 = ext(b'D');
    pub const F: u64 = ext(b'F');
    pub const I: u64 = ext(b'I');
    pub const M: u64 = ext(b'M');
    pub const S: u64 = ext(b'S');
    pub const U: u64 = ext(b'U');
}

/// All four encodable privilege levels.
///
/// Same as [`PrivilegeLevel`], except that it can also name level `0b10`
/// (hypervisor), which is encodable in CSR numbers and in mstatus.MPP but is
/// never a level this hart runs at. Minimum-required-privilege values
/// decoded from a CSR number are of this type, since the encoding space
/// includes the hypervisor level.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum RawPrivilegeLevel {
    User = 0,
    Supervisor = 1,
    /// Level `0b10`. Defined by the 1.9/1.10-era specs for the hypervisor
    /// extension, but no hart here ever runs at it and mstatus.MPP refuses
    /// to hold it.
    Hypervisor = 2,
    Machine = 3,
}

impl RawPrivilegeLevel {
    /// Converts a 2-bit value. Panics if `value_u2 > 3`.
    pub fn from_u2(value_u2: u8) -> Self {
        match value_u2 {
            0 => Self::User,
            1 => Self::Supervisor,
            2 => Self::Hypervisor,
            3 => Self::Machine,
            _ => panic!("out of range u2 used"),
        }
    }
}

impl fmt::Display for RawPrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            RawPrivilegeLevel::User => "U",
            RawPrivilegeLevel::Supervisor => "S",
            RawPrivilegeLevel::Hypervisor => "H",
            RawPrivilegeLevel::Machine => "M",
        })
    }
}

/// Privilege levels a hart can actually run at.
///
/// U < S < M in authority. The hypervisor level exists only in the encoding
/// space (see [`RawPrivilegeLevel`]); it is never taken.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum PrivilegeLevel {
    User = 0,
    Supervisor = 1,
    // Level 2 (hypervisor) is never taken.
    Machine = 3,
}

impl PartialEq<PrivilegeLevel> for RawPrivilegeLevel {
    fn eq(&self, other: &PrivilegeLevel) -> bool {
        *self as usize == *other as usize
    }
}

impl PartialEq<RawPrivilegeLevel> for PrivilegeLevel {
    fn eq(&self, other: &RawPrivilegeLevel) -> bool {
        *self as usize == *other as usize
    }
}

impl PartialOrd<PrivilegeLevel> for RawPrivilegeLevel {
    fn partial_cmp(&self, other: &PrivilegeLevel) -> Option<Ordering> {
        (*self as usize).partial_cmp(&(*other as usize))
    }
}

impl PartialOrd<RawPrivilegeLevel> for PrivilegeLevel {
    fn partial_cmp(&self, other: &RawPrivilegeLevel) -> Option<Ordering> {
        (*self as usize).partial_cmp(&(*other as usize))
    }
}

impl fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            PrivilegeLevel::User => "U",
            PrivilegeLevel::Supervisor => "S",
            PrivilegeLevel::Machine => "M",
        })
    }
}

impl From<PrivilegeLevel> for RawPrivilegeLevel {
    fn from(value: PrivilegeLevel) -> Self {
        match value {
            PrivilegeLevel::User => Self::User,
            PrivilegeLevel::Supervisor => Self::Supervisor,
            PrivilegeLevel::Machine => Self::Machine,
        }
    }
}

impl TryFrom<RawPrivilegeLevel> for PrivilegeLevel {
    type Error = HypervisorLevelError;
    fn try_from(value: RawPrivilegeLevel) -> Result<Self, Self::Error> {
        match value {
            RawPrivilegeLevel::User => Ok(Self::User),
            RawPrivilegeLevel::Supervisor => Ok(Self::Supervisor),
            RawPrivilegeLevel::Hypervisor => Err(HypervisorLevelError(value)),
            RawPrivilegeLevel::Machine => Ok(Self::Machine),
        }
    }
}

#[derive(Error, Debug)]
#[error("privilege level {0} is not implemented")]
pub struct HypervisorLevelError(RawPrivilegeLevel);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlen_masks() {
        assert_eq!(0xFFFF_FFFF, Xlen::Rv32.mask());
        assert_eq!(u64::MAX, Xlen::Rv64.mask());
        assert_eq!(1 << 31, Xlen::Rv32.status_sd());
        assert_eq!(1 << 63, Xlen::Rv64.status_sd());
        assert_eq!(0x4000_0000, Xlen::Rv32.misa_mxl());
        assert_eq!(0x8000_0000_0000_0000, Xlen::Rv64.misa_mxl());
    }

    #[test]
    fn test_privilege_ordering() {
        assert!(PrivilegeLevel::User < RawPrivilegeLevel::Supervisor);
        assert!(PrivilegeLevel::Supervisor < RawPrivilegeLevel::Hypervisor);
        assert!(PrivilegeLevel::Machine > RawPrivilegeLevel::Hypervisor);
        assert!(PrivilegeLevel::Machine == RawPrivilegeLevel::Machine);
    }

    #[test]
    fn test_hypervisor_level_is_rejected() {
        assert!(PrivilegeLevel::try_from(RawPrivilegeLevel::Hypervisor).is_err());
        for raw in [
            RawPrivilegeLevel::User,
            RawPrivilegeLevel::Supervisor,
            RawPrivilegeLevel::Machine,
        ] {
            assert_eq!(raw, RawPrivilegeLevel::from(PrivilegeLevel::try_from(raw).unwrap()));
        }
    }

    #[test]
    fn test_spec_versions_are_ordered() {
        assert!(PrivilegeSpec::V1_9_1 < PrivilegeSpec::V1_10_0);
    }

    #[test]
    fn test_isa_letters() {
        assert_eq!(1 << 8, isa::I);
        assert_eq!(1 << 18, isa::S);
        assert_eq!(1 << 20, isa::U);
    }
}
