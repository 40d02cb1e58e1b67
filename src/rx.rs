//! Component C3: RX block reader.
//!
//! Two traversals over the same hardware ring: one that assembles a
//! packet into a word buffer for local consumption, one that streams a
//! packet word-for-word into the BMC-to-network transmit FIFO.

use crate::regs::{ApePeriRegisters, RxPort};

/// Local control-frame assembly buffer, sized to match the original
/// firmware's 1024-word scratch buffer.
pub const BUFFER_WORDS: usize = 1024;

/// Drains one packet out of the RX ring into `buf`, word-aligned from
/// index 0. Returns the packet length in bytes, or `None` if the window
/// register isn't `Valid`.
///
/// Retires the whole chain in a single call after the last block is
/// copied, then acknowledges the window register. Every block named by
/// `Count` is traversed and retired exactly once.
pub fn rx_into_buffer(peri: &ApePeriRegisters, ring: &RxPort, buf: &mut [u32; BUFFER_WORDS]) -> Option<u32> {
    let window = peri.rx_window();
    if !window.valid {
        return None;
    }

    let mut block_id = window.head;
    let mut remaining = window.count;
    let mut pos = 0usize;

    while remaining > 0 {
        let control = ring.control(block_id);
        let words = control.payload_words() as usize;
        let offset = control.payload_offset();

        for i in 0..words {
            if pos < buf.len() {
                buf[pos] = ring.payload_word(block_id, offset, i);
                pos += 1;
            }
        }

        block_id = control.next_block;
        remaining -= 1;
    }

    peri.retire(window.head, window.tail, window.count);
    peri.ack_rx_window(window);

    Some(4 * pos as u32)
}

/// Streams one packet word-for-word into the BMC-to-network transmit
/// FIFO, waiting for FIFO headroom before each block and posting the
/// final word of the final block to the dedicated "last word" register.
///
/// Each block is retired individually (`Count = 1`) as soon as it's
/// pushed, so FIFO backpressure on one block never holds the rest of the
/// chain hostage. Returns `true` if a packet was drained.
pub fn rx_passthrough_stream(peri: &ApePeriRegisters, ring: &RxPort) -> bool {
    let window = peri.rx_window();
    if !window.valid {
        return false;
    }

    let mut block_id = window.head;
    let mut remaining = window.count;

    while remaining > 0 {
        remaining -= 1;
        let control = ring.control(block_id);
        let words = control.payload_words();
        let offset = control.payload_offset();

        while peri.tx_in_fifo() < words {}

        for i in 0..words as usize {
            let word = ring.payload_word(block_id, offset, i);
            let is_last_word_of_chain = remaining == 0 && i + 1 == words as usize;
            if is_last_word_of_chain {
                peri.tx_write_last_word(word);
            } else {
                peri.tx_write_word(word);
            }
        }

        peri.retire(block_id, block_id, 1);
        block_id = control.next_block;
    }

    peri.ack_rx_window(window);
    true
}
