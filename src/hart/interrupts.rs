//! Interrupt pending/enable/delegation registers.
//!
//! Everything here is hart-local except the pending bitmap (mip): device
//! threads inject interrupts concurrently with the hart's own csrrs/csrrc
//! accesses, so mip lives in the shared [`IrqLines`] record and is only
//! modified under the interrupt-controller mutex. A pure read of mip is an
//! atomic load and takes no lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use log::trace;

use crate::csr::{self, CsrSpecifier};

use super::{CsrResult, Hart};

/// Supervisor software interrupt pending.
pub const MIP_SSIP: u64 = 1 << 1;
/// Machine software interrupt pending.
pub const MIP_MSIP: u64 = 1 << 3;
/// Supervisor timer interrupt pending.
pub const MIP_STIP: u64 = 1 << 5;
/// Machine timer interrupt pending.
pub const MIP_MTIP: u64 = 1 << 7;
/// Supervisor external interrupt pending.
pub const MIP_SEIP: u64 = 1 << 9;
/// Machine external interrupt pending.
pub const MIP_MEIP: u64 = 1 << 11;

/// Interrupts machine mode may delegate to supervisor mode.
pub const DELEGABLE_INTERRUPTS: u64 = MIP_SSIP | MIP_STIP | MIP_SEIP;

/// All interrupts with a writable enable bit in mie.
pub const ALL_INTERRUPTS: u64 = MIP_SSIP | MIP_STIP | MIP_SEIP | MIP_MSIP | MIP_MTIP;

const_assert_eq!(0, DELEGABLE_INTERRUPTS & !ALL_INTERRUPTS);

/// Hart-local interrupt state: the enable bitmap and the delegation bitmap.
#[derive(Debug, Clone, Default)]
pub(super) struct Interrupts {
    pub mie: u64,
    pub mideleg: u64,
}

impl Interrupts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The hart's interrupt wires: the pending bitmap plus the controller mutex
/// that serializes updates to it.
///
/// One clone of the `Arc` holding this record lives in the hart; the
/// interrupt controller and device threads hold the others and inject
/// through [`set_local_interrupt`](Self::set_local_interrupt). The record
/// survives CPU reset (only the pending bits themselves are cleared).
#[derive(Debug, Default)]
pub struct IrqLines {
    /// Serializes all modifications of `mip`, across the owning hart and
    /// injecting device threads.
    controller: Mutex<()>,
    mip: AtomicU64,
    /// Raised whenever the pending set changes; the hart's execution loop
    /// consumes it to re-evaluate interrupt delivery.
    delivery_request: AtomicBool,
}

impl IrqLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pending bitmap. Lock-free; pairs with the mutex-ordered
    /// updates in [`set_local_interrupt`](Self::set_local_interrupt).
    pub fn pending(&self) -> u64 {
        self.mip.load(Ordering::SeqCst)
    }

    /// Atomically applies `mip = (mip & !mask) | (value & mask)` under the
    /// controller mutex and returns the prior bitmap. Any change raises the
    /// delivery-request flag so the hart re-evaluates what to take.
    pub fn set_local_interrupt(&self, mask: u64, value: u64) -> u64 {
        let _controller = self.controller.lock().unwrap();
        let old = self.mip.load(Ordering::SeqCst);
        let new = old & !mask | value & mask;
        self.mip.store(new, Ordering::SeqCst);
        if new != old {
            self.delivery_request.store(true, Ordering::SeqCst);
        }
        old
    }

    /// Consumes the delivery-request flag, returning whether it was raised.
    pub fn take_delivery_request(&self) -> bool {
        self.delivery_request.swap(false, Ordering::SeqCst)
    }

    /// Clears all pending bits. Used by hart reset; the wires themselves
    /// stay connected.
    pub(super) fn reset(&self) {
        let _controller = self.controller.lock().unwrap();
        self.mip.store(0, Ordering::SeqCst);
        self.delivery_request.store(false, Ordering::SeqCst);
    }
}

pub(super) fn read_mideleg(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(hart.interrupts.mideleg)
}

pub(super) fn write_mideleg(hart: &mut Hart, _csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    let mideleg = &mut hart.interrupts.mideleg;
    *mideleg = *mideleg & !DELEGABLE_INTERRUPTS | value & DELEGABLE_INTERRUPTS;
    Ok(())
}

pub(super) fn read_mie(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(hart.interrupts.mie)
}

pub(super) fn write_mie(hart: &mut Hart, _csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    let mie = &mut hart.interrupts.mie;
    *mie = *mie & !ALL_INTERRUPTS | value & ALL_INTERRUPTS;
    Ok(())
}

/// Combined read/write for mip.
///
/// Guest software may only touch the delegable bits, and not SEIP: a
/// supervisor that could clear a pending external interrupt would lose it
/// outright when a platform-level interrupt controller drives that wire, so
/// SEIP stays hardware-controlled. A zero mask degenerates to a lock-free
/// read.
pub(super) fn rmw_mip(
    hart: &mut Hart,
    _csrno: CsrSpecifier,
    new_value: u64,
    write_mask: u64,
) -> CsrResult<u64> {
    let mask = write_mask & DELEGABLE_INTERRUPTS & !MIP_SEIP;
    let old = match mask {
        0 => hart.irq.pending(),
        _ => {
            trace!("updating mip bits {mask:#x}");
            hart.irq.set_local_interrupt(mask, new_value & mask)
        }
    };
    Ok(old)
}

pub(super) fn read_sie(hart: &Hart, _csrno: CsrSpecifier) -> CsrResult {
    Ok(hart.interrupts.mie & hart.interrupts.mideleg)
}

pub(super) fn write_sie(hart: &mut Hart, _csrno: CsrSpecifier, value: u64) -> CsrResult<()> {
    let mideleg = hart.interrupts.mideleg;
    let merged = hart.interrupts.mie & !mideleg | value & mideleg;
    write_mie(hart, csr::MIE, merged)
}

/// Combined read/write for sip: mip through the mideleg window.
pub(super) fn rmw_sip(
    hart: &mut Hart,
    _csrno: CsrSpecifier,
    new_value: u64,
    write_mask: u64,
) -> CsrResult<u64> {
    let mideleg = hart.interrupts.mideleg;
    rmw_mip(hart, csr::MIP, new_value, write_mask & mideleg).map(|old| old & mideleg)
}
