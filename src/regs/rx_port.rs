use core::ptr::NonNull;

use tock_registers::interfaces::Readable;
use tock_registers::{register_bitfields, registers::ReadOnly, LocalRegisterCopy};

register_bitfields! [
    u32,

    /// The control word at the start of every RX block record.
    pub RX_BLOCK_CONTROL [
        PAYLOAD_LENGTH OFFSET(0) NUMBITS(7) [],
        NEXT_BLOCK OFFSET(7) NUMBITS(23) [],
        FIRST OFFSET(30) NUMBITS(1) [],
        NOT_LAST OFFSET(31) NUMBITS(1) [],
    ],
];

/// Number of 32-bit words in one hardware ring block record, control word
/// included. Large enough to hold the widest payload a 7-bit length field
/// can describe (127 bytes, rounded up to 32 words) plus the offsets
/// below.
pub const BLOCK_WORDS: usize = 40;

/// Payload words on the first block of a chain start here: the first
/// block also carries fixed per-packet metadata ahead of the payload.
pub const FIRST_PAYLOAD_WORD: usize = 4;

/// Payload words on every continuation block start right after the
/// control word.
pub const CONTINUATION_PAYLOAD_WORD: usize = 1;

/// A decoded RX block control word.
#[derive(Clone, Copy, Debug)]
pub struct BlockControl {
    pub payload_length: u32,
    pub next_block: u32,
    pub first: bool,
    pub not_last: bool,
}

impl BlockControl {
    pub fn payload_words(&self) -> u32 {
        (self.payload_length + 3) / 4
    }

    pub fn payload_offset(&self) -> usize {
        if self.first {
            FIRST_PAYLOAD_WORD
        } else {
            CONTINUATION_PAYLOAD_WORD
        }
    }
}

/// The hardware-owned RX ring: a flat array of fixed-size block records,
/// indexed by block id. `rx.rs` walks chains through this view; retirement
/// and the window register live in `ApePeriRegisters`.
#[derive(Clone, Copy)]
pub struct RxPort {
    base: NonNull<u32>,
}

unsafe impl Send for RxPort {}
unsafe impl Sync for RxPort {}

impl RxPort {
    /// # Safety
    /// `base` must point at a valid RX ring covering at least as many
    /// blocks as hardware can ever report in a window's `Count`/`Head`/
    /// `Tail` fields, for the lifetime of the returned handle.
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }

    fn block_word(&self, block_id: u32, word: usize) -> &ReadOnly<u32> {
        let index = block_id as usize * BLOCK_WORDS + word;
        unsafe { &*(self.base.as_ptr().add(index) as *const ReadOnly<u32>) }
    }

    pub fn control(&self, block_id: u32) -> BlockControl {
        let raw = self.block_word(block_id, 0).get();
        let copy = LocalRegisterCopy::<u32, RX_BLOCK_CONTROL::Register>::new(raw);
        BlockControl {
            payload_length: copy.read(RX_BLOCK_CONTROL::PAYLOAD_LENGTH),
            next_block: copy.read(RX_BLOCK_CONTROL::NEXT_BLOCK),
            first: copy.is_set(RX_BLOCK_CONTROL::FIRST),
            not_last: copy.is_set(RX_BLOCK_CONTROL::NOT_LAST),
        }
    }

    pub fn payload_word(&self, block_id: u32, offset: usize, index: usize) -> u32 {
        self.block_word(block_id, offset + index).get()
    }
}
