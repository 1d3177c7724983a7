//! Counter and timer CSRs.
//!
//! > RISC-V ISAs provide a set of up to 32×64-bit performance counters and
//! > timers that are accessible via unprivileged XLEN read-only CSR
//! > registers 0xC00–0xC1F (with the upper 32 bits accessed via CSR
//! > registers 0xC80–0xC9F on RV32).
//!
//! cycle, time, instret and their machine twins all share one reader backed
//! by the host [`TickSource`]; the hardware performance counters read as
//! zero. Reads from U- or S-mode are gated by the counter-enable registers
//! (see `counter_control`); the gate key is the low five bits of the CSR
//! number, so bit `n` of an enable register covers counter offset `n`.

use std::time::Instant;

use crate::csr::CsrSpecifier;
use crate::{PrivilegeLevel, Xlen};

use super::{CsrError, CsrResult, Hart};

/// Host supply for the cycle/time/instret counters.
///
/// When deterministic instruction counting is engaged the source reports
/// the retired-instruction count through [`icount`](Self::icount) and the
/// counters follow it; otherwise they follow free-running host ticks. The
/// handle survives CPU reset.
pub trait TickSource: Send + Sync {
    /// Free-running host tick count.
    fn host_ticks(&self) -> u64;

    /// Deterministic instruction count, if that mode is engaged.
    fn icount(&self) -> Option<u64> {
        None
    }
}

/// [`TickSource`] backed by the host's monotonic clock, one tick per
/// nanosecond.
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for WallClock {
    fn host_ticks(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Returns whether the counter CSR `csrno` may be read at the current
/// privilege level. Machine mode always may; U and S consult their enable
/// registers.
fn counter_enabled(hart: &Hart, csrno: CsrSpecifier) -> bool {
    let enabled = match hart.privilege_mode {
        PrivilegeLevel::User => hart.counter_control.scounteren,
        PrivilegeLevel::Supervisor => hart.counter_control.mcounteren,
        PrivilegeLevel::Machine => u64::MAX,
    };
    enabled >> (csrno & 31) & 1 != 0
}

fn ticks(hart: &Hart) -> u64 {
    hart.ticks
        .icount()
        .unwrap_or_else(|| hart.ticks.host_ticks())
}

/// Shared reader for cycle/time/instret and mcycle/minstret.
pub(super) fn read_counter(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    if !counter_enabled(hart, csrno) {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(ticks(hart))
}

/// Shared reader for the RV32-only upper halves.
pub(super) fn read_counterh(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    if hart.config.xlen != Xlen::Rv32 {
        return Err(CsrError::Unsupported(csrno));
    }
    if !counter_enabled(hart, csrno) {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(ticks(hart) >> 32)
}

/// hpmcounter3..31: no events are wired, so they read zero, but the enable
/// gate still applies.
pub(super) fn read_zero_counter(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    if !counter_enabled(hart, csrno) {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(0)
}

pub(super) fn read_zero_counterh(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    if hart.config.xlen != Xlen::Rv32 {
        return Err(CsrError::Unsupported(csrno));
    }
    if !counter_enabled(hart, csrno) {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(0)
}

/// mhpmcounter3h..31h read zero ungated, and only exist on RV32. The full
/// registers share the generic zero reader with the id registers.
pub(super) fn read_zeroh(hart: &Hart, csrno: CsrSpecifier) -> CsrResult {
    if hart.config.xlen != Xlen::Rv32 {
        return Err(CsrError::Unsupported(csrno));
    }
    Ok(0)
}
