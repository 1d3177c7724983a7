//! Counter-enable registers.
//!
//! The storage is one pair of enable words; which CSR numbers reach it
//! depends on the spec revision. Under 1.10.0 they are mcounteren (gating
//! S-mode reads) and scounteren (gating U-mode reads). Under 1.9.1 the same
//! words answer to the legacy numbers mscounteren and mucounteren instead.
//! Accessing a revision's registers from a hart of the other revision is an
//! illegal-CSR access.

use crate::csr::CsrSpecifier;
use crate::PrivilegeSpec;

use super::{CsrError, CsrResult, Hart};

/// Counter-enable words. Bit `n` permits reads of the counter CSR at offset
/// `n` from the next-lower privilege level.
#[derive(Debug, Clone, Default)]
pub(super) struct CounterControl {
    pub mcounteren: u64,
    pub scounteren: u64,
}

impl CounterControl {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_version(hart: &Hart, csrno: CsrSpecifier, required: PrivilegeSpec) -> CsrResult<()> {
    if hart.config.priv_spec != required {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(())
}

pub(super) fn read_mcounteren(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_version(hart, csrno, PrivilegeSpec::V1_10_0)?;
    Ok(hart.counter_control.mcounteren)
}

pub(super) fn write_mcounteren(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_version(hart, csrno, PrivilegeSpec::V1_10_0)?;
    hart.counter_control.mcounteren = value;
    Ok(())
}

pub(super) fn read_scounteren(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_version(hart, csrno, PrivilegeSpec::V1_10_0)?;
    Ok(hart.counter_control.scounteren)
}

pub(super) fn write_scounteren(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_version(hart, csrno, PrivilegeSpec::V1_10_0)?;
    hart.counter_control.scounteren = value;
    Ok(())
}

/// Legacy mscounteren: the 1.9.1 name for the word gating S-mode counter
/// reads, i.e. what 1.10.0 calls mcounteren.
pub(super) fn read_mscounteren(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_version(hart, csrno, PrivilegeSpec::V1_9_1)?;
    Ok(hart.counter_control.mcounteren)
}

pub(super) fn write_mscounteren(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_version(hart, csrno, PrivilegeSpec::V1_9_1)?;
    hart.counter_control.mcounteren = value;
    Ok(())
}

/// Legacy mucounteren: the 1.9.1 name for the word gating U-mode counter
/// reads, i.e. what 1.10.0 calls scounteren.
pub(super) fn read_mucounteren(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    check_version(hart, csrno, PrivilegeSpec::V1_9_1)?;
    Ok(hart.counter_control.scounteren)
}

pub(super) fn write_mucounteren(hart: &mut Hart, csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    check_version(hart, csrno, PrivilegeSpec::V1_9_1)?;
    hart.counter_control.scounteren = value;
    Ok(())
}
