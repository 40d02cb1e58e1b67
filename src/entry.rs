//! Component C9: bring-up / entry.

use core::sync::atomic::Ordering;

use log::{info, warn};

use crate::console::{Console, ConsoleState};
use crate::ncsi::{NcsiReloadPolicy, NcsiReloadTrigger};
use crate::regs::shm::HostDriverState;
use crate::reset;
use crate::rmu::RmuInit;
use crate::{mainloop, BuildConfig, Collaborators, Mc, VersionBanner};

/// Runs the bring-up sequence and enters the main loop. Never returns, as
/// the original firmware's `__start` is `noreturn`.
pub fn start<C>(mc: &mut Mc, config: BuildConfig, collab: &mut C) -> !
where
    C: Collaborators,
{
    mc.nvic.clear_all_pending();
    mc.debounce.clear(Ordering::SeqCst);
    mc.nvic.set_vector_table_offset(vector_table_address());

    let own_device = mc.ports[config.network_port as usize].0;
    let mut full_init = reset::handle_reset(&mc.ape, &own_device, collab, &mc.ports);

    match collab.reset() {
        Ok(ConsoleState::Cold) => full_init = true,
        Ok(ConsoleState::Warm) => {}
        Err(e) => {
            warn!("Console reset failed: {e}");
            full_init = true;
        }
    }

    info!("{}", VersionBanner(config));

    mc.active_port.set(config.network_port);
    collab.use_port(config.network_port);

    collab.rmu_init();

    if full_init {
        info!("Chip Reset.");
        collab.init();
    } else {
        info!("APE Reload.");
        let host_state = mc.ports[config.network_port as usize].1.host_driver_state();
        let policy = if host_state != HostDriverState::Start {
            NcsiReloadPolicy::AsNeeded
        } else {
            NcsiReloadPolicy::NeverReset
        };
        collab.reload(policy);
    }

    let mut state = mainloop::setup(mc, config.fw_version_word());
    loop {
        mainloop::step(mc, &mut state, collab);
    }
}

/// Address of this crate's vector table. A real firmware image supplies
/// this via its linker script and `extern` symbol; defined here as a
/// stand-in so `start` has something concrete to install.
fn vector_table_address() -> u32 {
    extern "C" {
        static __VECTORS: u8;
    }
    unsafe { &__VECTORS as *const u8 as u32 }
}
