//! Component C8: main control loop.

use core::sync::atomic::Ordering;

use log::info;

use crate::loader;
use crate::ncsi::{NcsiPassthrough, NcsiReloadPolicy, NcsiReloadTrigger};
use crate::network::PortState;
use crate::regs::shm::HostDriverState;
use crate::reset;
use crate::rmu::RmuCollaborators;
use crate::timer;
use crate::Mc;

/// How long a GRC reset debounce must hold before the loop treats it as
/// settled.
pub const GRC_RESET_TIMEOUT_MS: u32 = 150;

/// Tracks the host driver's last observed state and whether a reset is
/// currently permitted in response to an APE-mode change. Threaded
/// through loop iterations the way the original firmware's locals in
/// `loaderLoop` persist across its `for(;;)`.
pub struct LoopState {
    host_state: HostDriverState,
    reset_allowed: bool,
}

/// One-time setup before entering the loop: samples the host driver state
/// from port 0, stamps all four shared-memory segments ready, and enables
/// the two interrupt sources.
pub fn setup(mc: &Mc, version: u32) -> LoopState {
    let host_state = mc.ports[0].1.host_driver_state();
    let reset_allowed = host_state == HostDriverState::Start;

    for (_, shm) in &mc.ports {
        shm.mark_loader_active();
        shm.init(version);
    }

    mc.nvic.enable_vmain_and_general_reset();

    LoopState {
        host_state,
        reset_allowed,
    }
}

/// Runs one iteration of the forever-loop: either branch A (reset
/// debounce in progress) or branch B (steady state), then always drains
/// the four loader mailboxes. Split out of an infinite `loop` so tests
/// can drive it iteration-by-iteration.
pub fn step<C: RmuCollaborators + NcsiPassthrough + PortState>(mc: &mut Mc, state: &mut LoopState, collab: &mut C) {
    if mc.debounce.is_armed(Ordering::SeqCst) {
        branch_reset_debounce(mc, collab);
    } else {
        branch_steady_state(mc, state, collab);
    }

    loader::drain_all(&mc.shm_windows());
}

fn branch_reset_debounce<C: RmuCollaborators>(mc: &mut Mc, collab: &mut C) {
    let snapshot = mc.ape.snapshot_status();

    if snapshot.reset_in_progress() {
        mc.ape.ack_status(snapshot);
        mc.debounce.arm(Ordering::SeqCst);
    } else if timer::elapsed_since(mc.debounce.get(Ordering::SeqCst), GRC_RESET_TIMEOUT_MS) {
        mc.nvic.clear_pending_general_reset();
        mc.debounce.clear(Ordering::SeqCst);

        info!("Handling reset...");
        reset::wait_for_all_rx(&mc.ports);
        collab.reload(NcsiReloadPolicy::AsNeeded);

        mc.nvic.enable_general_reset();
    }

    // Pass-through is suppressed during the debounce: the external
    // network path is untrusted until the reset has settled.
    let active = mc.active_port.get() as usize;
    mc.rmu_pump
        .handle_bmc_packet(&mc.ape_peri, &mc.ports[active].1, collab, false, &mc.ports);
}

fn branch_steady_state<C: RmuCollaborators + NcsiPassthrough + PortState>(mc: &mut Mc, state: &mut LoopState, collab: &mut C) {
    collab.check_port_state();

    let active = mc.active_port.get() as usize;
    mc.rmu_pump
        .handle_bmc_packet(&mc.ape_peri, &mc.ports[active].1, collab, true, &mc.ports);
    collab.handle_passthrough();

    let current = mc.ports[active].1.host_driver_state();
    if current != state.host_state {
        state.host_state = current;
        state.reset_allowed = current == HostDriverState::Start;
        match current {
            HostDriverState::Start => info!("host started"),
            HostDriverState::Unload => info!("host unloaded."),
            HostDriverState::Other(_) => info!("wol?"),
        }
    } else if state.reset_allowed && !collab.check_enable_state() && !mc.debounce.is_armed(Ordering::SeqCst) {
        info!("APE mode change, resetting.");
        reset::wait_for_all_rx(&mc.ports);
        collab.reload(NcsiReloadPolicy::AsNeeded);
        state.host_state = mc.ports[active].1.host_driver_state();
        state.reset_allowed = false;
    }
}

#[cfg(test)]
mod tests {
    use tock_registers::interfaces::Writeable;

    use super::*;
    use crate::ncsi::NcsiFrame;
    use crate::network::PassthroughTx;
    use crate::regmock::{advance_mock_time, set_mock_time, McMock};
    use crate::regs::ape::APE_STATUS;
    use crate::rmu::{RmuBadPacketAck, RmuInit};

    #[derive(Default)]
    struct FakeCollaborator {
        reload_calls: u32,
        port_state_checks: u32,
        enabled: bool,
        passthrough_calls: u32,
    }

    impl NcsiFrame for FakeCollaborator {
        fn handle_ncsi_frame(&mut self, _frame: &[u32]) {}
    }
    impl NcsiReloadTrigger for FakeCollaborator {
        fn init(&mut self) {}
        fn reload(&mut self, _policy: NcsiReloadPolicy) {
            self.reload_calls += 1;
        }
        fn use_port(&mut self, _port: u8) {}
    }
    impl NcsiPassthrough for FakeCollaborator {
        fn handle_passthrough(&mut self) {
            self.passthrough_calls += 1;
        }
    }
    impl PassthroughTx for FakeCollaborator {
        fn transmit_passthrough_packet(&self, _length: u32) -> bool {
            true
        }
    }
    impl PortState for FakeCollaborator {
        fn check_port_state(&mut self) {
            self.port_state_checks += 1;
        }
        fn check_enable_state(&self) -> bool {
            self.enabled
        }
    }
    impl RmuBadPacketAck for FakeCollaborator {
        fn reset_bad_packet(&self) {}
    }
    impl RmuInit for FakeCollaborator {
        fn rmu_init(&self) {}
    }

    #[test]
    fn steady_state_polls_port_state_and_drains_passthrough() {
        set_mock_time(1);
        let mut mock = McMock::new();
        let mut mc = mock.mc();
        let mut state = setup(&mc, 0x0001_0000);
        let mut collab = FakeCollaborator { enabled: true, ..Default::default() };

        step(&mut mc, &mut state, &mut collab);

        assert_eq!(collab.port_state_checks, 1);
        assert_eq!(collab.passthrough_calls, 1);
        assert_eq!(collab.reload_calls, 0);
    }

    #[test]
    fn grc_reset_debounce_settles_after_timeout_and_reloads_once() {
        set_mock_time(10);
        let mut mock = McMock::new();
        let mut mc = mock.mc();
        let mut state = setup(&mc, 0x0001_0000);
        let mut collab = FakeCollaborator { enabled: true, ..Default::default() };

        // A prior interrupt has already armed the debounce; hardware still
        // reports the reset in progress, so the loop re-arms and waits.
        mc.debounce.arm(Ordering::SeqCst);
        mc.ape.regs_for_test().status.write(APE_STATUS::PORT0_GRC_RESET::SET);
        step(&mut mc, &mut state, &mut collab);
        assert!(mc.debounce.is_armed(Ordering::SeqCst));

        mc.ape.regs_for_test().status.set(0); // reset has cleared in hardware

        advance_mock_time(GRC_RESET_TIMEOUT_MS);
        step(&mut mc, &mut state, &mut collab);

        assert!(!mc.debounce.is_armed(Ordering::SeqCst));
        assert_eq!(collab.reload_calls, 1);
    }

    #[test]
    fn ape_mode_change_triggers_reset_when_host_allows_it() {
        set_mock_time(1);
        let mut mock = McMock::new();
        let mut mc = mock.mc();
        let mut state = setup(&mc, 0x0001_0000);
        let mut collab = FakeCollaborator { enabled: false, ..Default::default() };

        step(&mut mc, &mut state, &mut collab);

        assert_eq!(collab.reload_calls, 1);
        assert!(!state.reset_allowed);
    }
}
