//! The mstatus register and its sstatus window.
//!
//! > The mstatus register is an MXLEN-bit read/write register [...]. The
//! > mstatus register keeps track of and controls the hart's current
//! > operating state. A restricted view of mstatus appears as the sstatus
//! > register in the S-level ISA.
//!
//! Only the fields that exist in privileged specs 1.9.1 and 1.10.0 are
//! modeled. The SD bit is derived from FS/XS on every read rather than
//! stored, so it can never go stale.

use bitvec::{field::BitField, order::Lsb0, view::BitView};
use log::trace;

use crate::{isa, PrivilegeSpec, RawPrivilegeLevel, Xlen};

use super::{CsrResult, Hart};
use crate::csr::CsrSpecifier;

/// Field masks for mstatus. Positions are fixed by the privileged ISA.
pub mod bits {
    pub const UIE: u64 = 1 << 0;
    pub const SIE: u64 = 1 << 1;
    pub const MIE: u64 = 1 << 3;
    pub const UPIE: u64 = 1 << 4;
    pub const SPIE: u64 = 1 << 5;
    pub const MPIE: u64 = 1 << 7;
    pub const SPP: u64 = 1 << 8;
    /// Previous privilege level before the last machine-mode trap.
    pub const MPP: u64 = 0b11 << MPP_SHIFT;
    pub const MPP_SHIFT: u32 = 11;
    /// Floating-point unit context status.
    pub const FS: u64 = 0b11 << FS_SHIFT;
    pub const FS_SHIFT: u32 = 13;
    /// Additional extension context status (read-only zero here).
    pub const XS: u64 = 0b11 << XS_SHIFT;
    pub const XS_SHIFT: u32 = 15;
    pub const MPRV: u64 = 1 << 17;
    /// Permit supervisor access to user memory. Named PUM until 1.9.1, SUM
    /// from 1.10.0; same position either way.
    pub const SUM: u64 = 1 << 18;
    pub const MXR: u64 = 1 << 19;
    /// Virtualization management field; only exists until 1.9.1 (1.10.0
    /// moved the translation mode into satp).
    pub const VM: u64 = 0b11111 << VM_SHIFT;
    pub const VM_SHIFT: u32 = 24;
}

const_assert_eq!(bits::MPP, 0x1800);
const_assert_eq!(bits::FS, 0x6000);
const_assert_eq!(bits::VM, 0x1F00_0000);

/// Writable mstatus fields common to both spec revisions.
const WRITABLE: u64 = bits::SIE
    | bits::SPIE
    | bits::MIE
    | bits::MPIE
    | bits::SPP
    | bits::FS
    | bits::MPRV
    | bits::SUM
    | bits::MPP
    | bits::MXR;

/// mstatus fields whose change invalidates cached address translations.
const TRANSLATION_FIELDS: u64 = bits::MXR | bits::MPP | bits::MPRV | bits::SUM;

/// sstatus exposes this subset of mstatus (plus the width-dependent SD bit
/// and, from 1.10.0 on, MXR).
const SSTATUS_BASE: u64 = bits::SIE
    | bits::SPIE
    | bits::UIE
    | bits::UPIE
    | bits::SPP
    | bits::FS
    | bits::XS
    | bits::SUM;

/// Returns the mask that carves the sstatus window out of mstatus.
pub(super) fn sstatus_mask(spec: PrivilegeSpec, xlen: Xlen) -> u64 {
    let base = SSTATUS_BASE | xlen.status_sd();
    match spec {
        PrivilegeSpec::V1_9_1 => base,
        PrivilegeSpec::V1_10_0 => base | bits::MXR,
    }
}

/// Storage for mstatus. The SD bit is not stored; [`Status::read`] derives
/// it from FS/XS.
#[derive(Debug, Clone, Default)]
pub(super) struct Status {
    mstatus: u64,
}

impl Status {
    pub fn new() -> Self {
        Self { mstatus: 0 }
    }

    /// Architectural value of mstatus, with SD placed at bit XLEN-1.
    pub fn read(&self, xlen: Xlen) -> u64 {
        let fs_dirty = self.mstatus & bits::FS == bits::FS;
        let xs_dirty = self.mstatus & bits::XS == bits::XS;
        match fs_dirty | xs_dirty {
            true => self.mstatus | xlen.status_sd(),
            false => self.mstatus,
        }
    }

    /// Returns `true` if the FS field is Off, meaning any access to
    /// floating-point state must raise an illegal-instruction exception.
    pub fn fs_off(&self) -> bool {
        self.mstatus & bits::FS == 0
    }

    /// Marks the floating-point context Dirty. FS must not be Off.
    pub fn set_fs_dirty(&mut self) {
        self.mstatus |= bits::FS;
    }

    /// The privilege level currently held by the MPP field.
    pub fn mpp(&self) -> RawPrivilegeLevel {
        let mpp = self.mstatus.view_bits::<Lsb0>()
            [bits::MPP_SHIFT as usize..bits::MPP_SHIFT as usize + 2]
            .load_le::<u8>();
        RawPrivilegeLevel::from_u2(mpp)
    }

    pub fn mprv(&self) -> bool {
        self.mstatus & bits::MPRV != 0
    }
}

pub(super) fn read_mstatus(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(hart.status.read(hart.config.xlen))
}

/// Writes mstatus, honoring the spec revision's writable mask, the WARL MPP
/// rule, and the FS/SD collapse, and flushing cached translations before a
/// change to any translation-governing field becomes visible.
pub(super) fn write_mstatus(hart: &mut Hart, _csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    let mstatus = hart.status.mstatus;
    let mut mask = WRITABLE;

    match hart.config.priv_spec {
        PrivilegeSpec::V1_9_1 => {
            if (value ^ mstatus) & (TRANSLATION_FIELDS | bits::VM) != 0 {
                hart.tlb_flush();
            }
            // The VM field only takes values that name a translation scheme
            // this XLEN implements; other writes leave it unchanged.
            let vm = (value & bits::VM) >> bits::VM_SHIFT;
            if super::translation::valid_vm(hart.config.priv_spec, hart.config.xlen, vm) {
                mask |= bits::VM;
            }
        }
        PrivilegeSpec::V1_10_0 => {
            if (value ^ mstatus) & TRANSLATION_FIELDS != 0 {
                hart.tlb_flush();
            }
        }
    }

    // MPP writes naming a privilege level this hart cannot return to are
    // silently discarded.
    let mpp = value.view_bits::<Lsb0>()[bits::MPP_SHIFT as usize..bits::MPP_SHIFT as usize + 2]
        .load_le::<u8>();
    let mpp = RawPrivilegeLevel::from_u2(mpp);
    if mpp == RawPrivilegeLevel::Hypervisor
        || (!hart.has_extension(isa::S) && mpp == RawPrivilegeLevel::Supervisor)
        || (!hart.has_extension(isa::U) && mpp == RawPrivilegeLevel::User)
    {
        trace!("dropping mstatus.MPP write of unsupported level {mpp}");
        mask &= !bits::MPP;
    }

    let mut mstatus = mstatus & !mask | value & mask;

    // FS only reports Off or Dirty: Initial and Clean collapse to Dirty, at
    // the cost of extra context save/restore.
    if mstatus & bits::FS != 0 {
        mstatus |= bits::FS;
    }

    hart.status.mstatus = mstatus;
    Ok(())
}

pub(super) fn read_sstatus(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    let mask = sstatus_mask(hart.config.priv_spec, hart.config.xlen);
    Ok(hart.status.read(hart.config.xlen) & mask)
}

pub(super) fn write_sstatus(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    let mask = sstatus_mask(hart.config.priv_spec, hart.config.xlen);
    let merged = hart.status.read(hart.config.xlen) & !mask | value & mask;
    write_mstatus(hart, csrno, merged)
}
