//! The per-hart CSR file and its access gate.
//!
//! A [`Hart`] owns every architectural register addressed by a CSR number,
//! except the interrupt pending bitmap, which is shared with device threads
//! through [`IrqLines`]. All guest accesses funnel through
//! [`Hart::csrrw`], which decodes the privilege and writability attributes
//! a CSR number carries in its own bits, then dispatches through the flat
//! accessor table.
//!
//! > RISC-V defines a separate address space of 4096 Control and Status
//! > registers associated with each hart.
//!
//! > By convention, the upper 4 bits of the CSR address (csr\[11:8]) are
//! > used to encode the read and write accessibility of the CSRs according
//! > to privilege level. The top two bits (csr\[11:10]) indicate whether
//! > the register is read/write (00, 01, or 10) or read-only (11). The next
//! > two bits (csr\[9:8]) encode the lowest privilege level that can access
//! > the CSR.

mod counter_control;
pub mod counters;
mod fp;
pub mod interrupts;
pub mod pmp;
pub mod status;
mod table;
pub mod translation;
pub mod trap;

use std::sync::Arc;

use log::{debug, trace};
use thiserror::Error;

use crate::csr::{self, CsrSpecifier};
use crate::{PrivilegeLevel, PrivilegeSpec, RawPrivilegeLevel, Xlen};

use counter_control::CounterControl;
use fp::FpStatus;
use interrupts::Interrupts;
use status::Status;
use table::CSR_TABLE;
use translation::Translation;

pub use counters::{TickSource, WallClock};
pub use interrupts::IrqLines;
pub use pmp::PmpTable;
pub use trap::Trap;

/// User-spec version 2.2, the only one harts of this vintage claim.
pub const USER_VERSION_2_02_0: u32 = 0x0002_0200;

/// Address-translation cache attached to a hart.
///
/// The CSR file never inspects the cache; it only demands that everything
/// cached under the old translation-governing state be thrown away, which
/// it does *before* storing the new state. The call is synchronous from the
/// issuing hart's perspective.
pub trait Tlb: Send + Sync {
    fn flush(&self);
}

/// [`Tlb`] for harts whose translation caches are invalidated elsewhere, or
/// that have none.
#[derive(Debug, Default)]
pub struct NullTlb;

impl Tlb for NullTlb {
    fn flush(&self) {}
}

/// Immutable identity of a hart, fixed at creation.
#[derive(Debug, Clone)]
pub struct Config {
    /// > The mhartid CSR is an MXLEN-bit read-only register containing the
    /// > integer ID of the hardware thread running the code. [...] Hart IDs
    /// > must be unique within the execution environment.
    pub hart_id: u64,
    /// Integer register and CSR width.
    pub xlen: Xlen,
    /// Revision of the privileged architecture this hart implements.
    pub priv_spec: PrivilegeSpec,
    /// Version of the user-level architecture this hart implements.
    pub user_ver: u32,
    /// Implemented extension letters, as [`crate::isa`] bits. Reported
    /// through misa and consulted by the WARL rules of mstatus.MPP.
    pub extensions: u64,
    /// Whether a page-walking MMU backs this hart. Without one, the
    /// translation-root register reads zero and ignores writes.
    pub mmu: bool,
}

/// Errors a CSR access can produce.
///
/// Whatever the variant, the decoder's reaction is the same: raise an
/// illegal-instruction exception with the offending instruction word as the
/// trap value. No access that errors has made any state change.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CsrError {
    /// The CSR is not implemented, not present under this hart's spec
    /// revision, or currently inaccessible (FS off, counter not enabled).
    #[error("unsupported CSR {0:#05x}")]
    Unsupported(CsrSpecifier),
    /// The CSR requires a higher privilege level.
    #[error(
        "cannot access CSR {specifier:#05x} from privilege level {actual_level}, \
         since it requires privilege level {required_level}"
    )]
    Privileged {
        specifier: CsrSpecifier,
        required_level: RawPrivilegeLevel,
        actual_level: PrivilegeLevel,
    },
    /// Attempt to write a CSR whose number marks it read-only.
    #[error("write to read-only CSR {0:#05x}")]
    WriteToReadOnly(CsrSpecifier),
}

pub type CsrResult<T = u64> = Result<T, CsrError>;

/// The CSR file of one hart.
///
/// Owned and driven by the hart's execution thread; the only concurrent
/// access is interrupt injection through the shared [`IrqLines`].
pub struct Hart {
    config: Config,
    /// misa value: MXL in the top two bits, extension letters in the low
    /// 26. Read-only for guests.
    misa: u64,
    privilege_mode: PrivilegeLevel,
    status: Status,
    trap: Trap,
    interrupts: Interrupts,
    irq: Arc<IrqLines>,
    counter_control: CounterControl,
    translation: Translation,
    fp: FpStatus,
    pmp: PmpTable,
    /// Reservation address of an in-flight LR/SC sequence.
    load_res: u64,
    /// Virtual address of the last memory fault, staged here until the trap
    /// unit moves it into m/sbadaddr.
    badaddr: u64,
    tlb: Arc<dyn Tlb>,
    ticks: Arc<dyn TickSource>,
}

impl Hart {
    pub fn new(config: Config, tlb: Arc<dyn Tlb>, ticks: Arc<dyn TickSource>) -> Self {
        let misa = config.xlen.misa_mxl() | config.extensions;
        Self {
            config,
            misa,
            privilege_mode: PrivilegeLevel::Machine,
            status: Status::new(),
            trap: Trap::new(),
            interrupts: Interrupts::new(),
            irq: Arc::new(IrqLines::new()),
            counter_control: CounterControl::new(),
            translation: Translation::new(),
            fp: FpStatus::new(),
            pmp: PmpTable::new(),
            load_res: 0,
            badaddr: 0,
            tlb,
            ticks,
        }
    }

    /// Provide a read-only view of this hart's configuration.
    ///
    /// It is not possible to modify the configuration after creation.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hart_id(&self) -> u64 {
        self.config.hart_id
    }

    /// The interrupt wires of this hart. Device threads and the interrupt
    /// controller clone this handle to inject interrupts.
    pub fn irq_lines(&self) -> Arc<IrqLines> {
        Arc::clone(&self.irq)
    }

    /// Resets the hart: all mutable architectural state returns to zero and
    /// the privilege level to machine mode. The identity fields, interrupt
    /// wires, and tick-source handle survive.
    pub fn reset(&mut self) {
        self.privilege_mode = PrivilegeLevel::Machine;
        self.status = Status::new();
        self.trap = Trap::new();
        self.interrupts = Interrupts::new();
        self.counter_control = CounterControl::new();
        self.translation = Translation::new();
        self.fp = FpStatus::new();
        self.pmp = PmpTable::new();
        self.load_res = 0;
        self.badaddr = 0;
        self.irq.reset();
    }

    /// Read and/or update a CSR.
    ///
    /// The four CSR instruction shapes map onto this single entry point:
    ///
    /// ```text
    /// csrr   <->  csrrw(csrno, 0, 0)
    /// csrw   <->  csrrw(csrno, value, !0)
    /// csrrs  <->  csrrw(csrno, !0, value)
    /// csrrc  <->  csrrw(csrno, 0, value)
    /// ```
    ///
    /// Only the bits of `new_value` selected by `write_mask` are written;
    /// the prior value is returned. A zero mask performs no write at all
    /// and has no side effects. On any error the CSR file is unchanged; the
    /// decoder turns every error into an illegal-instruction exception.
    pub fn csrrw(
        &mut self,
        specifier: CsrSpecifier,
        new_value: u64,
        write_mask: u64,
    ) -> CsrResult<u64> {
        if !csr::is_valid(specifier) {
            return Err(CsrError::Unsupported(specifier));
        }
        let xlen_mask = self.config.xlen.mask();
        let new_value = new_value & xlen_mask;
        let write_mask = write_mask & xlen_mask;

        let required_level = csr::required_privilege_level(specifier);
        if self.privilege_mode < required_level {
            debug!(
                "denied access to csr {specifier:#05x} from {} (requires {})",
                self.privilege_mode, required_level
            );
            return Err(CsrError::Privileged {
                specifier,
                required_level,
                actual_level: self.privilege_mode,
            });
        }
        if write_mask != 0 && csr::is_read_only(specifier) {
            return Err(CsrError::WriteToReadOnly(specifier));
        }

        trace!(new_value, write_mask; "accessing csr {specifier:#05x}");
        let ops = &CSR_TABLE[specifier as usize];

        // Registers whose read and write halves must be one atomic step
        // (mip, sip) provide a combined accessor that handles both.
        if let Some(rmw) = ops.rmw {
            return rmw(self, specifier, new_value, write_mask).map(|old| old & xlen_mask);
        }

        let Some(read) = ops.read else {
            return Err(CsrError::Unsupported(specifier));
        };
        let old_value = read(self, specifier)?;

        // Write if writable and the mask selects anything; a register with
        // no writer (misa, the counters) drops writes silently.
        if write_mask != 0 {
            if let Some(write) = ops.write {
                let merged = old_value & !write_mask | new_value & write_mask;
                write(self, specifier, merged)?;
            }
        }

        Ok(old_value & xlen_mask)
    }

    /// Convenience read: `csrrw(specifier, 0, 0)`.
    pub fn read_csr(&mut self, specifier: CsrSpecifier) -> CsrResult<u64> {
        self.csrrw(specifier, 0, 0)
    }

    /// Convenience whole-register write: `csrrw(specifier, value, !0)`.
    pub fn write_csr(&mut self, specifier: CsrSpecifier, value: u64) -> CsrResult<()> {
        self.csrrw(specifier, value, u64::MAX).map(|_| ())
    }

    /// The privilege level the hart is currently running at.
    pub fn privilege_mode(&self) -> PrivilegeLevel {
        self.privilege_mode
    }

    /// Moves the hart to another privilege level. Called by the trap unit
    /// on trap entry and xRET.
    pub fn set_privilege_mode(&mut self, level: PrivilegeLevel) {
        self.privilege_mode = level;
    }

    /// The privilege level at which loads and stores execute, which
    /// mstatus.MPRV can decouple from the fetch privilege.
    pub fn effective_privilege_mode(&self) -> PrivilegeLevel {
        if self.status.mprv() {
            if let Ok(level) = PrivilegeLevel::try_from(self.status.mpp()) {
                return level;
            }
        }
        self.privilege_mode
    }

    pub fn misa(&self) -> u64 {
        self.misa
    }

    /// Returns whether the extension with the given [`crate::isa`] bit is
    /// implemented.
    pub fn has_extension(&self, extension: u64) -> bool {
        self.misa & extension != 0
    }

    /// Asks the attached translation cache to drop everything. Fires before
    /// any translation-governing CSR change becomes observable.
    pub fn tlb_flush(&self) {
        trace!("requesting full tlb flush");
        self.tlb.flush();
    }

    /// Atomically updates the pending-interrupt bitmap, returning the prior
    /// one. This is the same path device threads use through
    /// [`IrqLines`]; the mutex inside serializes them all.
    pub fn set_local_interrupt(&self, mask: u64, value: u64) -> u64 {
        self.irq.set_local_interrupt(mask, value)
    }

    /// Pending-interrupt bitmap (mip), lock-free.
    pub fn pending_interrupts(&self) -> u64 {
        self.irq.pending()
    }

    /// Enabled-interrupt bitmap (mie).
    pub fn enabled_interrupts(&self) -> u64 {
        self.interrupts.mie
    }

    /// Interrupts delegated to supervisor mode (mideleg).
    pub fn interrupt_delegation(&self) -> u64 {
        self.interrupts.mideleg
    }

    /// Exceptions delegated to supervisor mode (medeleg).
    pub fn exception_delegation(&self) -> u64 {
        self.trap.read_medeleg()
    }

    /// Trap-state registers, for the trap unit to consult during delivery.
    pub fn trap_state(&self) -> &Trap {
        &self.trap
    }

    /// Trap-state registers, for the trap unit to fill during delivery.
    pub fn trap_state_mut(&mut self) -> &mut Trap {
        &mut self.trap
    }

    /// Current translation-root register (satp/sptbr) as the page walker
    /// sees it: zero when no MMU is attached.
    pub fn translation_root(&self) -> u64 {
        match self.config.mmu {
            false => 0,
            true => self.translation.root,
        }
    }

    /// The PMP table, for the permission-check engine.
    pub fn pmp(&self) -> &PmpTable {
        &self.pmp
    }

    /// Accrued floating-point exception flags, for the FP unit.
    pub fn fflags(&self) -> u8 {
        self.fp.fflags
    }

    /// Replaces the accrued floating-point exception flags. The FP unit
    /// calls this after an operation raises exceptions.
    pub fn set_fflags(&mut self, fflags: u8) {
        self.fp.fflags = fflags & 0x1F;
    }

    /// Dynamic floating-point rounding mode, for the FP unit.
    pub fn frm(&self) -> u8 {
        self.fp.frm
    }

    /// Reservation address of an in-flight LR/SC sequence.
    pub fn load_reservation(&self) -> u64 {
        self.load_res
    }

    pub fn set_load_reservation(&mut self, address: u64) {
        self.load_res = address;
    }

    /// Virtual address of the last memory fault.
    pub fn bad_address(&self) -> u64 {
        self.badaddr
    }

    pub fn set_bad_address(&mut self, address: u64) {
        self.badaddr = address;
    }
}

/// Reader for the hardwired-zero registers (mvendorid, marchid, mimpid, the
/// machine hpm counters and event selectors).
fn read_zero(_hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(0)
}

fn read_mhartid(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(hart.config.hart_id)
}

fn read_misa(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(hart.misa)
}
