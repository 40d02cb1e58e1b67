use core::ptr::NonNull;

use tock_registers::interfaces::Writeable;
use tock_registers::{register_bitfields, register_structs, registers::ReadWrite};

register_structs! {
    pub NvicBlock {
        (0x00 => pub clear_pending: ReadWrite<u32, IRQ::Register>),
        (0x04 => pub set_enable: ReadWrite<u32, IRQ::Register>),
        (0x08 => pub clear_enable: ReadWrite<u32, IRQ::Register>),
        (0x0c => pub vector_table_offset: ReadWrite<u32>),
        (0x10 => @END),
    }
}

register_bitfields! [
    u32,

    pub IRQ [
        VMAIN OFFSET(0) NUMBITS(1) [],
        GENERAL_RESET OFFSET(1) NUMBITS(1) [],
    ],
];

/// Vectored interrupt controller: pending/enable bits for the two sources
/// this core cares about, plus the vector table base used at bring-up.
#[derive(Clone, Copy)]
pub struct NvicRegisters {
    regs: NonNull<NvicBlock>,
}

unsafe impl Send for NvicRegisters {}
unsafe impl Sync for NvicRegisters {}

impl NvicRegisters {
    /// # Safety
    /// `base` must point at a valid interrupt-controller register window
    /// for the lifetime of the returned handle.
    pub const unsafe fn new(base: NonNull<u8>) -> Self {
        Self { regs: base.cast() }
    }

    fn regs(&self) -> &NvicBlock {
        unsafe { self.regs.as_ref() }
    }

    pub fn clear_all_pending(&self) {
        self.regs().clear_pending.set(u32::MAX);
    }

    pub fn clear_pending_vmain(&self) {
        self.regs().clear_pending.write(IRQ::VMAIN::SET);
    }

    pub fn clear_pending_general_reset(&self) {
        self.regs().clear_pending.write(IRQ::GENERAL_RESET::SET);
    }

    pub fn enable_vmain_and_general_reset(&self) {
        self.regs()
            .set_enable
            .write(IRQ::VMAIN::SET + IRQ::GENERAL_RESET::SET);
    }

    pub fn enable_general_reset(&self) {
        self.regs().set_enable.write(IRQ::GENERAL_RESET::SET);
    }

    pub fn disable_general_reset(&self) {
        self.regs().clear_enable.write(IRQ::GENERAL_RESET::SET);
    }

    pub fn set_vector_table_offset(&self, offset: u32) {
        self.regs().vector_table_offset.set(offset);
    }
}
