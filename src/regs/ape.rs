use core::ptr::NonNull;

use mbarrier::mb;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::{register_bitfields, register_structs, registers::ReadWrite};

register_structs! {
    pub ApeBlock {
        (0x000 => pub status: ReadWrite<u32, APE_STATUS::Register>),
        (0x004 => pub status2: ReadWrite<u32, APE_STATUS2::Register>),
        (0x008 => pub gpio: ReadWrite<u32, APE_GPIO::Register>),
        (0x00c => @END),
    }
}

register_bitfields! [
    u32,

    /// GRC-reset-in-progress bits for ports 0 and 1; ports 2/3 live in
    /// `APE_STATUS2` because the original hardware register ran out of
    /// room in the first word.
    pub APE_STATUS [
        PORT0_GRC_RESET OFFSET(0) NUMBITS(1) [],
        PORT1_GRC_RESET OFFSET(1) NUMBITS(1) [],
    ],

    pub APE_STATUS2 [
        PORT2_GRC_RESET OFFSET(0) NUMBITS(1) [],
        PORT3_GRC_RESET OFFSET(1) NUMBITS(1) [],
    ],

    /// The three GPIO pins bit-banged during `handle_reset`'s recovery
    /// clock: two clock phases plus the clock-source mux select.
    pub APE_GPIO [
        PIN0_MODE_OUTPUT OFFSET(0) NUMBITS(1) [],
        PIN1_MODE_OUTPUT OFFSET(1) NUMBITS(1) [],
        PIN2_MODE_OUTPUT OFFSET(2) NUMBITS(1) [],
        PIN0_OUT OFFSET(3) NUMBITS(1) [], // Clock_P
        PIN1_OUT OFFSET(4) NUMBITS(1) [], // Clock_N
        PIN2_OUT OFFSET(5) NUMBITS(1) [
            Pcie = 0,
            Ape = 1,
        ],
    ],
];

/// A snapshot of `Status`/`Status2` taken together so the GRC-reset check
/// and the acknowledging write-back observe the same bits.
#[derive(Clone, Copy, Debug)]
pub struct ApeStatusSnapshot {
    pub status: u32,
    pub status2: u32,
}

impl ApeStatusSnapshot {
    pub fn reset_in_progress(&self) -> bool {
        use tock_registers::LocalRegisterCopy;
        let status = LocalRegisterCopy::<u32, APE_STATUS::Register>::new(self.status);
        let status2 = LocalRegisterCopy::<u32, APE_STATUS2::Register>::new(self.status2);
        status.is_set(APE_STATUS::PORT0_GRC_RESET)
            || status.is_set(APE_STATUS::PORT1_GRC_RESET)
            || status2.is_set(APE_STATUS2::PORT2_GRC_RESET)
            || status2.is_set(APE_STATUS2::PORT3_GRC_RESET)
    }
}

/// Global APE control window: reset status for all four ports plus the
/// GPIO bank used to bit-bang the recovery clock. Unlike the per-port
/// device/shared-memory windows, there is exactly one of these.
#[derive(Clone, Copy)]
pub struct ApeRegisters {
    regs: NonNull<ApeBlock>,
}

unsafe impl Send for ApeRegisters {}
unsafe impl Sync for ApeRegisters {}

impl ApeRegisters {
    /// # Safety
    /// `base` must point at a valid APE control register window for the
    /// lifetime of the returned handle.
    pub const unsafe fn new(base: NonNull<u8>) -> Self {
        Self { regs: base.cast() }
    }

    fn regs(&self) -> &ApeBlock {
        unsafe { self.regs.as_ref() }
    }

    /// Read `Status`/`Status2` together, for either the GRC-reset check or
    /// the subsequent acknowledging write-back.
    pub fn snapshot_status(&self) -> ApeStatusSnapshot {
        let status = self.regs().status.get();
        let status2 = self.regs().status2.get();
        ApeStatusSnapshot { status, status2 }
    }

    /// Write back a previously read snapshot to acknowledge the
    /// W1C reset-status bits it carries.
    pub fn ack_status(&self, snapshot: ApeStatusSnapshot) {
        self.regs().status.set(snapshot.status);
        self.regs().status2.set(snapshot.status2);
        mb();
    }

    pub fn gpio(&self) -> tock_registers::LocalRegisterCopy<u32, APE_GPIO::Register> {
        self.regs().gpio.extract()
    }

    pub fn set_gpio(&self, value: tock_registers::LocalRegisterCopy<u32, APE_GPIO::Register>) {
        self.regs().gpio.set(value.get());
        mb();
    }

    #[cfg(test)]
    pub(crate) fn regs_for_test(&self) -> &ApeBlock {
        self.regs()
    }
}
