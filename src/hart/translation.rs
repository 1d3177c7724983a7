//! The supervisor translation root register: satp from 1.10.0 on, sptbr up
//! to 1.9.1.
//!
//! Any accepted change to the translation root flushes cached translations
//! *before* the new value is stored, so no stale mapping can be observed
//! through the old root. Harts without an MMU expose the register as
//! read-zero/write-ignored.

use log::{debug, trace};

use crate::csr::CsrSpecifier;
use crate::{PrivilegeSpec, Xlen};

use super::{CsrResult, Hart};

/// Translation-scheme encodings of the mstatus.VM field (until 1.9.1).
pub mod vm_1_09 {
    pub const MBARE: u64 = 0;
    pub const SV32: u64 = 8;
    pub const SV39: u64 = 9;
    pub const SV48: u64 = 10;
}

/// Translation-scheme encodings of the satp.MODE field (since 1.10.0).
pub mod vm_1_10 {
    pub const BARE: u64 = 0;
    pub const SV32: u64 = 1;
    pub const SV39: u64 = 8;
    pub const SV48: u64 = 9;
    pub const SV57: u64 = 10;
}

// satp field layout, RV32: MODE[31] | ASID[30:22] | PPN[21:0].
const SATP32_MODE: u64 = 0x8000_0000;
const SATP32_ASID: u64 = 0x7FC0_0000;
const SATP32_PPN: u64 = 0x003F_FFFF;
// satp field layout, RV64: MODE[63:60] | ASID[59:44] | PPN[43:0].
const SATP64_MODE: u64 = 0xF000_0000_0000_0000;
const SATP64_ASID: u64 = 0x0FFF_F000_0000_0000;
const SATP64_PPN: u64 = 0x0000_0FFF_FFFF_FFFF;

const_assert_eq!(u32::MAX as u64, SATP32_MODE | SATP32_ASID | SATP32_PPN);
const_assert_eq!(u64::MAX, SATP64_MODE | SATP64_ASID | SATP64_PPN);

/// Implemented physical-address bits, which bound the page-table root PPN.
const fn phys_addr_bits(xlen: Xlen) -> u32 {
    match xlen {
        Xlen::Rv32 => 34,
        Xlen::Rv64 => 50,
    }
}

/// Returns whether `vm` names a translation scheme this hart width
/// implements, in the encoding of the given spec revision.
pub(super) fn valid_vm(spec: PrivilegeSpec, xlen: Xlen, vm: u64) -> bool {
    match (spec, xlen) {
        (PrivilegeSpec::V1_9_1, Xlen::Rv32) => {
            matches!(vm, vm_1_09::MBARE | vm_1_09::SV32)
        }
        (PrivilegeSpec::V1_9_1, Xlen::Rv64) => {
            matches!(vm, vm_1_09::MBARE | vm_1_09::SV39 | vm_1_09::SV48)
        }
        (PrivilegeSpec::V1_10_0, Xlen::Rv32) => {
            matches!(vm, vm_1_10::BARE | vm_1_10::SV32)
        }
        (PrivilegeSpec::V1_10_0, Xlen::Rv64) => {
            matches!(vm, vm_1_10::SV39 | vm_1_10::SV48 | vm_1_10::SV57 | vm_1_10::BARE)
        }
    }
}

fn satp_mode(xlen: Xlen, value: u64) -> u64 {
    match xlen {
        Xlen::Rv32 => (value & SATP32_MODE) >> 31,
        Xlen::Rv64 => (value & SATP64_MODE) >> 60,
    }
}

/// Root page-table pointer register. One word backs both the satp and sptbr
/// personalities, since the spec revision is fixed for the hart's lifetime.
#[derive(Debug, Clone, Default)]
pub(super) struct Translation {
    pub root: u64,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(super) fn read_satp(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    match hart.config.mmu {
        false => Ok(0),
        true => Ok(hart.translation.root),
    }
}

pub(super) fn write_satp(hart: &mut Hart, _csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    if !hart.config.mmu {
        return Ok(());
    }
    let xlen = hart.config.xlen;
    match hart.config.priv_spec {
        PrivilegeSpec::V1_9_1 => {
            // sptbr is a bare PPN; the translation scheme lives in
            // mstatus.VM. Every change invalidates cached translations.
            if value != hart.translation.root {
                hart.tlb_flush();
                let ppn_mask = (1 << (phys_addr_bits(xlen) - 12)) - 1;
                hart.translation.root = value & ppn_mask;
            }
        }
        PrivilegeSpec::V1_10_0 => {
            if !valid_vm(hart.config.priv_spec, xlen, satp_mode(xlen, value)) {
                debug!("dropping satp write with invalid mode: {value:#x}");
                return Ok(());
            }
            let changed = match xlen {
                Xlen::Rv32 => {
                    (value ^ hart.translation.root) & (SATP32_MODE | SATP32_ASID | SATP32_PPN)
                }
                Xlen::Rv64 => {
                    (value ^ hart.translation.root) & (SATP64_MODE | SATP64_ASID | SATP64_PPN)
                }
            };
            if changed != 0 {
                trace!("translation root changed, flushing: {value:#x}");
                hart.tlb_flush();
                hart.translation.root = value;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_vm_tables() {
        // 1.10.0 satp modes.
        assert!(valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv32, vm_1_10::BARE));
        assert!(valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv32, vm_1_10::SV32));
        assert!(!valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv32, vm_1_10::SV39));
        assert!(valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv64, vm_1_10::SV39));
        assert!(valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv64, vm_1_10::SV57));
        assert!(!valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv64, vm_1_10::SV32));
        assert!(!valid_vm(PrivilegeSpec::V1_10_0, Xlen::Rv64, 7));
        // 1.9.1 mstatus.VM values use the older encoding.
        assert!(valid_vm(PrivilegeSpec::V1_9_1, Xlen::Rv32, vm_1_09::SV32));
        assert!(!valid_vm(PrivilegeSpec::V1_9_1, Xlen::Rv32, vm_1_09::SV39));
        assert!(valid_vm(PrivilegeSpec::V1_9_1, Xlen::Rv64, vm_1_09::SV48));
        assert!(!valid_vm(PrivilegeSpec::V1_9_1, Xlen::Rv64, vm_1_09::SV32));
    }

    #[test]
    fn test_satp_mode_extraction() {
        assert_eq!(1, satp_mode(Xlen::Rv32, 0x8000_0000));
        assert_eq!(8, satp_mode(Xlen::Rv64, 0x8000_0000_0000_0000));
        assert_eq!(0, satp_mode(Xlen::Rv64, 0x0000_0FFF_FFFF_FFFF));
    }
}
