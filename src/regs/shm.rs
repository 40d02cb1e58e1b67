use core::ptr::NonNull;

use mbarrier::mb;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::{register_bitfields, register_structs, registers::ReadWrite};

register_structs! {
    pub ShmBlock {
        (0x00 => pub seg_sig: ReadWrite<u32, SEG_SIG::Register>),
        (0x04 => pub fw_version: ReadWrite<u32>),
        (0x08 => pub fw_features: ReadWrite<u32, FW_FEATURES::Register>),
        (0x0c => pub fw_status: ReadWrite<u32, FW_STATUS::Register>),
        (0x10 => pub loader_command: ReadWrite<u32, LOADER_COMMAND::Register>),
        (0x14 => pub loader_arg0: ReadWrite<u32>),
        (0x18 => pub loader_arg1: ReadWrite<u32>),
        (0x1c => pub host_driver_state: ReadWrite<u32, HOST_DRIVER_STATE::Register>),
        (0x20 => pub rcpu_seg_sig: ReadWrite<u32>),
        (0x24 => pub channel_info: ReadWrite<u32, CHANNEL_INFO::Register>),
        (0x28 => pub channel_ncsi_rx: ReadWrite<u32>),
        (0x2c => @END),
    }
}

register_bitfields! [
    u32,

    pub SEG_SIG [
        /// Low-byte sub-signature, meaningful only before `init` stamps
        /// the full four-byte tag over it.
        SIG OFFSET(0) NUMBITS(8) [
            Loader = 0x4c, // 'L'
        ],
    ],

    pub FW_FEATURES [
        NCSI OFFSET(0) NUMBITS(1) [],
    ],

    pub FW_STATUS [
        READY OFFSET(0) NUMBITS(1) [],
    ],

    pub LOADER_COMMAND [
        COMMAND OFFSET(0) NUMBITS(8) [
            None = 0,
            ReadMem = 1,
            WriteMem = 2,
            Call = 3,
        ],
    ],

    pub HOST_DRIVER_STATE [
        STATE OFFSET(0) NUMBITS(8) [
            Start = 0,
            Unload = 1,
        ],
    ],

    pub CHANNEL_INFO [
        ENABLED OFFSET(0) NUMBITS(1) [],
    ],
];

/// The literal four-byte tag `APE!`, pinned to an explicit byte sequence
/// so the stored word reads as `A`,`P`,`E`,`!` regardless of the target's
/// native endianness.
pub const SEG_SIG_APE: u32 = u32::from_be_bytes(*b"APE!");

/// The sub-firmware owned tag that signals "receive CPU firmware ready".
pub const SEG_SIG_RCPU: u32 = u32::from_be_bytes(*b"RCPU");

/// Host driver state values known to the MC. Anything else is treated as
/// "other" (interpreted as wake-on-LAN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostDriverState {
    Start,
    Unload,
    Other(u32),
}

/// Per-port shared-memory window: the generic firmware-status header, the
/// loader mailbox, and the channel-info segment, modeled together since
/// they share one MMIO window.
#[derive(Clone, Copy)]
pub struct ShmRegisters {
    regs: NonNull<ShmBlock>,
}

unsafe impl Send for ShmRegisters {}
unsafe impl Sync for ShmRegisters {}

impl ShmRegisters {
    /// # Safety
    /// `base` must point at a valid shared-memory window for the lifetime
    /// of the returned handle.
    pub const unsafe fn new(base: NonNull<u8>) -> Self {
        Self { regs: base.cast() }
    }

    fn regs(&self) -> &ShmBlock {
        unsafe { self.regs.as_ref() }
    }

    /// Stamps the loader sub-signature into the segment-signature byte.
    /// Mirrors the original firmware's `SegSig.bits.Sig = LOADER` write
    /// that precedes `init`; `init`'s full-word write supersedes it, so
    /// this is observable only to a reader racing the two writes.
    pub fn mark_loader_active(&self) {
        self.regs().seg_sig.write(SEG_SIG::SIG::Loader);
    }

    /// Populates version/feature/ready fields and stamps the segment
    /// signature, in that order, so a concurrent reader never observes a
    /// ready bit without a valid signature.
    pub fn init(&self, version: u32) {
        self.regs().fw_version.set(version);
        self.regs().fw_features.write(FW_FEATURES::NCSI::SET);
        self.regs().fw_status.write(FW_STATUS::READY::SET);
        mb();
        self.regs().seg_sig.set(SEG_SIG_APE);
    }

    pub fn loader_command(&self) -> u32 {
        self.regs().loader_command.read(LOADER_COMMAND::COMMAND)
    }

    pub fn loader_arg0(&self) -> u32 {
        self.regs().loader_arg0.get()
    }

    pub fn loader_arg1(&self) -> u32 {
        self.regs().loader_arg1.get()
    }

    pub fn set_loader_arg0(&self, value: u32) {
        self.regs().loader_arg0.set(value);
    }

    pub fn set_loader_arg1(&self, value: u32) {
        self.regs().loader_arg1.set(value);
    }

    /// Clears `Command` to 0, which is the ACK the mailbox protocol uses.
    pub fn clear_loader_command(&self) {
        mb();
        self.regs().loader_command.write(LOADER_COMMAND::COMMAND::None);
    }

    pub fn host_driver_state(&self) -> HostDriverState {
        match self.regs().host_driver_state.read(HOST_DRIVER_STATE::STATE) {
            0 => HostDriverState::Start,
            1 => HostDriverState::Unload,
            other => HostDriverState::Other(other),
        }
    }

    pub fn rcpu_seg_sig(&self) -> u32 {
        self.regs().rcpu_seg_sig.get()
    }

    pub fn channel_enabled(&self) -> bool {
        self.regs().channel_info.is_set(CHANNEL_INFO::ENABLED)
    }

    /// Increments the pass-through receive counter. The original firmware
    /// counts every BMC-to-network arrival here, dropped or forwarded
    /// alike; see the Open Question in the design notes.
    pub fn bump_ncsi_channel_rx(&self) {
        let count = self.regs().channel_ncsi_rx.get();
        self.regs().channel_ncsi_rx.set(count.wrapping_add(1));
    }

    #[cfg(test)]
    pub(crate) fn regs_for_test(&self) -> &ShmBlock {
        self.regs()
    }
}
