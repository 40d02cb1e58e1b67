use core::ptr::NonNull;

use mbarrier::mb;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::{register_bitfields, register_structs, registers::ReadWrite};

register_structs! {
    pub ApePeriBlock {
        (0x000 => pub bmc_to_nc_rx_status: ReadWrite<u32, BMC_RX_STATUS::Register>),
        (0x004 => pub bmc_to_nc_read_buffer: ReadWrite<u32>),
        (0x008 => pub bmc_to_nc_tx_status: ReadWrite<u32, BMC_TX_STATUS::Register>),
        (0x00c => pub bmc_to_nc_tx_buffer: ReadWrite<u32>),
        (0x010 => pub bmc_to_nc_tx_control: ReadWrite<u32>),
        (0x014 => pub bmc_to_nc_tx_buffer_last: ReadWrite<u32>),
        (0x018 => pub rx_buf_offset: ReadWrite<u32, RX_WINDOW::Register>),
        (0x01c => pub rx_pool_retire: ReadWrite<u32, RX_POOL_RETIRE::Register>),
        (0x020 => @END),
    }
}

register_bitfields! [
    u32,

    pub BMC_RX_STATUS [
        NEW OFFSET(0) NUMBITS(1) [],
        BAD OFFSET(1) NUMBITS(1) [],
        IN_PROGRESS OFFSET(2) NUMBITS(1) [],
        PASSTHRU OFFSET(3) NUMBITS(1) [],
        PACKET_LENGTH OFFSET(8) NUMBITS(12) [],
    ],

    pub BMC_TX_STATUS [
        IN_FIFO OFFSET(0) NUMBITS(8) [],
    ],

    /// RX ring window: `Head`/`Tail`/`Count` describe the chain currently
    /// offered by hardware; bit 31 is written back by software to
    /// acknowledge consumption.
    pub RX_WINDOW [
        HEAD OFFSET(0) NUMBITS(10) [],
        TAIL OFFSET(10) NUMBITS(10) [],
        COUNT OFFSET(20) NUMBITS(4) [],
        VALID OFFSET(30) NUMBITS(1) [],
        ACK OFFSET(31) NUMBITS(1) [],
    ],

    pub RX_POOL_RETIRE [
        HEAD OFFSET(0) NUMBITS(10) [],
        TAIL OFFSET(10) NUMBITS(10) [],
        COUNT OFFSET(20) NUMBITS(4) [],
        COMMIT OFFSET(24) NUMBITS(1) [],
    ],
];

/// Decoded view of the RX ring window register.
#[derive(Clone, Copy, Debug)]
pub struct RxWindow {
    pub valid: bool,
    pub head: u32,
    pub tail: u32,
    pub count: u32,
}

/// Decoded view of `BmcToNcRxStatus`.
#[derive(Clone, Copy, Debug)]
pub struct BmcRxStatus {
    pub new: bool,
    pub bad: bool,
    pub in_progress: bool,
    pub passthru: bool,
    pub packet_length: u32,
}

/// Global BMC-to-network peripheral window: RMU status/FIFO registers and
/// the RX ring retirement interface, both scoped to this firmware
/// instance's own port.
#[derive(Clone, Copy)]
pub struct ApePeriRegisters {
    regs: NonNull<ApePeriBlock>,
}

unsafe impl Send for ApePeriRegisters {}
unsafe impl Sync for ApePeriRegisters {}

impl ApePeriRegisters {
    /// # Safety
    /// `base` must point at a valid APE peripheral register window for the
    /// lifetime of the returned handle.
    pub const unsafe fn new(base: NonNull<u8>) -> Self {
        Self { regs: base.cast() }
    }

    fn regs(&self) -> &ApePeriBlock {
        unsafe { self.regs.as_ref() }
    }

    pub fn rmu_status(&self) -> BmcRxStatus {
        let raw = self.regs().bmc_to_nc_rx_status.extract();
        BmcRxStatus {
            new: raw.is_set(BMC_RX_STATUS::NEW),
            bad: raw.is_set(BMC_RX_STATUS::BAD),
            in_progress: raw.is_set(BMC_RX_STATUS::IN_PROGRESS),
            passthru: raw.is_set(BMC_RX_STATUS::PASSTHRU),
            packet_length: raw.read(BMC_RX_STATUS::PACKET_LENGTH),
        }
    }

    pub fn read_rx_word(&self) -> u32 {
        self.regs().bmc_to_nc_read_buffer.get()
    }

    pub fn tx_in_fifo(&self) -> u32 {
        self.regs().bmc_to_nc_tx_status.read(BMC_TX_STATUS::IN_FIFO)
    }

    pub fn tx_write_word(&self, word: u32) {
        self.regs().bmc_to_nc_tx_buffer.set(word);
    }

    /// Posts the final word of a pass-through packet: a "full word"
    /// control value followed by the word itself on the distinct
    /// last-word register, signalling the packet boundary to hardware.
    pub fn tx_write_last_word(&self, word: u32) {
        self.regs().bmc_to_nc_tx_control.set(0);
        self.regs().bmc_to_nc_tx_buffer_last.set(word);
    }

    pub fn rx_window(&self) -> RxWindow {
        let raw = self.regs().rx_buf_offset.extract();
        RxWindow {
            valid: raw.is_set(RX_WINDOW::VALID),
            head: raw.read(RX_WINDOW::HEAD),
            tail: raw.read(RX_WINDOW::TAIL),
            count: raw.read(RX_WINDOW::COUNT),
        }
    }

    /// Writes the window register back with the ack bit set, telling
    /// hardware this chain has been consumed.
    pub fn ack_rx_window(&self, window: RxWindow) {
        self.regs().rx_buf_offset.write(
            RX_WINDOW::HEAD.val(window.head)
                + RX_WINDOW::TAIL.val(window.tail)
                + RX_WINDOW::COUNT.val(window.count)
                + RX_WINDOW::VALID.val(window.valid as u32)
                + RX_WINDOW::ACK::SET,
        );
        mb();
    }

    /// Retires a span of blocks back to the hardware pool with the commit
    /// bit set.
    pub fn retire(&self, head: u32, tail: u32, count: u32) {
        self.regs().rx_pool_retire.write(
            RX_POOL_RETIRE::HEAD.val(head)
                + RX_POOL_RETIRE::TAIL.val(tail)
                + RX_POOL_RETIRE::COUNT.val(count)
                + RX_POOL_RETIRE::COMMIT::SET,
        );
        mb();
    }

    #[cfg(test)]
    pub(crate) fn regs_for_test(&self) -> &ApePeriBlock {
        self.regs()
    }
}
