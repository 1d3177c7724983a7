//! Floating-point accessory CSRs: the accrued exception flags (fflags), the
//! dynamic rounding mode (frm), and their composite (fcsr).
//!
//! The FP execution unit keeps its operational state elsewhere; the hart
//! only caches the two fields software sees through these CSRs. Every
//! access requires mstatus.FS to be on, and every write marks the FP
//! context Dirty.

use crate::csr::CsrSpecifier;

use super::{CsrError, CsrResult, Hart};

/// Accrued exception flags occupy fcsr[4:0].
const ACCRUED_MASK: u64 = 0x1F;
/// Rounding mode occupies fcsr[7:5].
const ROUND_MODE_MASK: u64 = 0x7;
const ROUND_MODE_SHIFT: u32 = 5;

/// Cached rounding mode and accrued exception flags.
#[derive(Debug, Clone, Default)]
pub(super) struct FpStatus {
    pub frm: u8,
    pub fflags: u8,
}

impl FpStatus {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_fs(hart: &Hart, csrno: CsrSpecifier) -> CsrResult<()> {
    if hart.status.fs_off() {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(())
}

pub(super) fn read_fflags(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_fs(hart, csrno)?;
    Ok(hart.fp.fflags as u64)
}

pub(super) fn write_fflags(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_fs(hart, csrno)?;
    hart.status.set_fs_dirty();
    hart.fp.fflags = (value & ACCRUED_MASK) as u8;
    Ok(())
}

pub(super) fn read_frm(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_fs(hart, csrno)?;
    Ok(hart.fp.frm as u64)
}

pub(super) fn write_frm(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_fs(hart, csrno)?;
    hart.status.set_fs_dirty();
    hart.fp.frm = (value & ROUND_MODE_MASK) as u8;
    Ok(())
}

pub(super) fn read_fcsr(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_fs(hart, csrno)?;
    Ok(hart.fp.fflags as u64 | (hart.fp.frm as u64) << ROUND_MODE_SHIFT)
}

pub(super) fn write_fcsr(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_fs(hart, csrno)?;
    hart.status.set_fs_dirty();
    hart.fp.frm = (value >> ROUND_MODE_SHIFT & ROUND_MODE_MASK) as u8;
    hart.fp.fflags = (value & ACCRUED_MASK) as u8;
    Ok(())
}
