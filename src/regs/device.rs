use core::ptr::NonNull;

use tock_registers::interfaces::Readable;
use tock_registers::{register_bitfields, register_structs, registers::ReadOnly};

register_structs! {
    pub DeviceBlock {
        (0x000 => pub chip_id: ReadOnly<u32>),
        (0x004 => pub status: ReadOnly<u32, DEVICE_STATUS::Register>),
        (0x008 => pub rx_risc_status: ReadOnly<u32, RX_RISC_STATUS::Register>),
        (0x00c => @END),
    }
}

register_bitfields! [
    u32,

    pub DEVICE_STATUS [
        VMAIN_POWER_STATUS OFFSET(0) NUMBITS(1) [
            Aux = 0,
            Main = 1,
        ],
    ],

    pub RX_RISC_STATUS [
        HALTED OFFSET(0) NUMBITS(1) [],
    ],
];

/// One physical port's device-register window. Read-only from the MC's
/// point of view: the receive CPU owns this block.
#[derive(Clone, Copy)]
pub struct DeviceRegisters {
    regs: NonNull<DeviceBlock>,
}

// SAFETY: the MC runs single-threaded; MMIO windows are shared by address,
// not by aliasing Rust references, across the whole crate.
unsafe impl Send for DeviceRegisters {}
unsafe impl Sync for DeviceRegisters {}

impl DeviceRegisters {
    /// # Safety
    /// `base` must point at a valid device register window for the
    /// lifetime of the returned handle.
    pub const unsafe fn new(base: NonNull<u8>) -> Self {
        Self { regs: base.cast() }
    }

    fn regs(&self) -> &DeviceBlock {
        unsafe { self.regs.as_ref() }
    }

    pub fn chip_id(&self) -> u32 {
        self.regs().chip_id.get()
    }

    pub fn vmain_power_status(&self) -> bool {
        self.regs()
            .status
            .is_set(DEVICE_STATUS::VMAIN_POWER_STATUS)
    }

    pub fn rx_halted(&self) -> bool {
        self.regs().rx_risc_status.is_set(RX_RISC_STATUS::HALTED)
    }
}
