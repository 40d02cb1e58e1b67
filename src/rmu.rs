//! Component C5: RMU packet pump.
//!
//! Drains BMC-to-network traffic each loop iteration, distinguishing
//! control frames (handed to the NC-SI collaborator) from pass-through
//! frames (handed to the network TX collaborator), and carries a small
//! watchdog that reinitializes the RMU if it gets stuck mid-packet.

use log::{error, warn};

use crate::ncsi::{NcsiFrame, NcsiReloadPolicy, NcsiReloadTrigger};
use crate::network::PassthroughTx;
use crate::regs::{ApePeriRegisters, DeviceRegisters, ShmRegisters};
use crate::reset;
use crate::rx;
use crate::timer;

/// How long an `InProgress` status is allowed to sit without advancing to
/// `New` before the pump concludes the RMU is stuck.
pub const RMU_WATCHDOG_TIMEOUT_MS: u32 = 10;

/// ACKs and drops the packet currently latched in the RMU after a bad
/// (CRC/length) status. Out of scope for this crate; the RMU pump only
/// needs to invoke it.
pub trait RmuBadPacketAck {
    fn reset_bad_packet(&self);
}

/// Reinitializes the RMU hardware block. Out of scope for this crate; the
/// watchdog path only needs to invoke it.
pub trait RmuInit {
    fn rmu_init(&self);
}

/// Everything the RMU pump needs from the outside world, gathered behind
/// one bound so a single `&mut` borrow covers every call it makes —
/// reading a bad-packet ACK, a reload trigger, and a TX call all at once
/// would otherwise need three independent borrows of the same collaborator.
pub trait RmuCollaborators: NcsiFrame + NcsiReloadTrigger + PassthroughTx + RmuBadPacketAck + RmuInit {}
impl<T> RmuCollaborators for T where T: NcsiFrame + NcsiReloadTrigger + PassthroughTx + RmuBadPacketAck + RmuInit {}

/// Private state the watchdog needs across calls: whether a packet is
/// currently mid-delivery, and when that was first observed. Promoted
/// out of C-style function statics into named component state.
#[derive(Debug, Default, Clone, Copy)]
pub struct RmuPump {
    packet_in_progress: bool,
    in_progress_start: u32,
}

impl RmuPump {
    pub const fn new() -> Self {
        Self {
            packet_in_progress: false,
            in_progress_start: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_in_progress(&self) -> bool {
        self.packet_in_progress
    }

    /// Reads the BMC-to-network RX status once and acts on whichever of
    /// the three disjoint cases it matches. `passthrough_enabled` is
    /// false while a reset debounce is in progress, suppressing the
    /// untrusted external network path.
    pub fn handle_bmc_packet<C: RmuCollaborators>(
        &mut self,
        peri: &ApePeriRegisters,
        shm: &ShmRegisters,
        collab: &mut C,
        passthrough_enabled: bool,
        ports: &[(DeviceRegisters, ShmRegisters); 4],
    ) {
        let status = peri.rmu_status();

        if status.new {
            self.packet_in_progress = false;

            if status.bad {
                collab.reset_bad_packet();
                return;
            }

            if !status.passthru {
                Self::handle_control_frame(peri, collab, status.packet_length);
            } else {
                Self::handle_passthrough_frame(peri, shm, collab, status.packet_length, passthrough_enabled, ports);
            }
        } else if status.in_progress {
            if self.packet_in_progress {
                if timer::elapsed_since(self.in_progress_start, RMU_WATCHDOG_TIMEOUT_MS) {
                    warn!("RMU Hang detected, resetting.");
                    collab.rmu_init();
                    self.packet_in_progress = false;
                }
            } else {
                self.packet_in_progress = true;
                self.in_progress_start = timer::now();
            }
        }
    }

    fn handle_control_frame<C: RmuCollaborators>(peri: &ApePeriRegisters, collab: &mut C, bytes: u32) {
        let words = ((bytes + 3) / 4) as usize;
        let mut buffer = [0u32; rx::BUFFER_WORDS];

        if words > buffer.len() {
            warn!("Dropping NCSI packet");
            for _ in 0..words {
                let _ = peri.read_rx_word();
            }
            return;
        }

        for word in buffer.iter_mut().take(words) {
            *word = peri.read_rx_word();
        }

        collab.handle_ncsi_frame(&buffer[..words]);
    }

    fn handle_passthrough_frame<C: RmuCollaborators>(
        peri: &ApePeriRegisters,
        shm: &ShmRegisters,
        collab: &mut C,
        bytes: u32,
        passthrough_enabled: bool,
        ports: &[(DeviceRegisters, ShmRegisters); 4],
    ) {
        shm.bump_ncsi_channel_rx();

        if shm.channel_enabled() && passthrough_enabled {
            if !collab.transmit_passthrough_packet(bytes) {
                error!("Resetting TX...");
                reset::wait_for_all_rx(ports);
                collab.reload(NcsiReloadPolicy::AsNeeded);
            }
        } else {
            warn!("Dropping PT");
            let words = (bytes + 3) / 4;
            for _ in 0..words {
                let _ = peri.read_rx_word();
            }
        }
    }
}
