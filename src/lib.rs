#![cfg_attr(not(test), no_std)]

//! Event/control core for a Management Controller (MC) embedded in a
//! multi-port gigabit Ethernet adapter: power/reset bring-up, the
//! BMC↔network packet pump, cross-port reset coordination, and the
//! shared-memory loader mailbox.
//!
//! NC-SI frame parsing, NVRAM/timer/console/PHY access, and low-level TX
//! framing are external collaborators this crate calls through traits
//! (module [`ncsi`], [`network`], [`console`], [`reset::LockOwner`]).

pub mod console;
pub mod entry;
pub mod irq;
pub mod loader;
pub mod mainloop;
pub mod ncsi;
pub mod network;
pub mod osal;
pub mod regs;
pub mod reset;
pub mod rmu;
pub mod rx;
pub mod state;
pub mod timer;

#[cfg(test)]
mod regmock;

use core::ptr::NonNull;

use regs::{ApePeriRegisters, ApeRegisters, DeviceRegisters, NvicRegisters, RxPort, ShmRegisters};
use rmu::RmuPump;
use state::{ActivePort, ResetDebounce};

/// Build-time configuration: which of the four physical ports this
/// firmware image serves, and the version banner it prints at bring-up.
/// Expressed as `const` scalars rather than Cargo features, since they
/// are genuinely compile-time-fixed per firmware image, not optional
/// functionality to turn on or off.
#[derive(Debug, Clone, Copy)]
pub struct BuildConfig {
    pub network_port: u8,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_patch: u8,
}

impl BuildConfig {
    pub const fn fw_version_word(&self) -> u32 {
        ((self.version_major as u32) << 24) | ((self.version_minor as u32) << 16) | (self.version_patch as u32)
    }
}

/// A formatted `"APE vMAJOR.MINOR.PATCH NCSI Port N"` banner, matching
/// the original firmware's boot log line verbatim.
pub struct VersionBanner(pub BuildConfig);

impl core::fmt::Display for VersionBanner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "APE v{}.{}.{} NCSI Port {}",
            self.0.version_major, self.0.version_minor, self.0.version_patch, self.0.network_port
        )
    }
}

/// Every MMIO base address this crate needs, handed in by the platform
/// (the linker-fixed address map in a real firmware image). `ports[i]`
/// covers physical port `i`'s device and shared-memory windows; `ape`,
/// `ape_peri`, `nvic`, and `rx_port` are singleton windows scoped to
/// whichever port [`BuildConfig::network_port`] names.
#[derive(Clone, Copy)]
pub struct HardwareLayout {
    pub ports: [PortLayout; 4],
    pub ape: NonNull<u8>,
    pub ape_peri: NonNull<u8>,
    pub nvic: NonNull<u8>,
    pub rx_port: NonNull<u32>,
}

#[derive(Clone, Copy)]
pub struct PortLayout {
    pub device: NonNull<u8>,
    pub shm: NonNull<u8>,
}

/// The assembled register facade plus the small amount of process-wide
/// state the core owns (§3's reset-debounce timestamp and in-progress
/// RMU timestamp, §5's single-writer-mostly scalars).
pub struct Mc {
    pub ports: [(DeviceRegisters, ShmRegisters); 4],
    pub ape: ApeRegisters,
    pub ape_peri: ApePeriRegisters,
    pub nvic: NvicRegisters,
    pub rx_port: RxPort,
    pub debounce: ResetDebounce,
    pub active_port: ActivePort,
    pub rmu_pump: RmuPump,
}

impl Mc {
    /// # Safety
    /// Every address in `layout` must point at a valid, live register
    /// window of the matching shape for the lifetime of the returned
    /// `Mc`.
    pub unsafe fn new(layout: HardwareLayout) -> Self {
        let ports = core::array::from_fn(|i| {
            let p = layout.ports[i];
            (DeviceRegisters::new(p.device), ShmRegisters::new(p.shm))
        });

        Self {
            ports,
            ape: ApeRegisters::new(layout.ape),
            ape_peri: ApePeriRegisters::new(layout.ape_peri),
            nvic: NvicRegisters::new(layout.nvic),
            rx_port: RxPort::new(layout.rx_port),
            debounce: ResetDebounce::new(),
            active_port: ActivePort::new(),
            rmu_pump: RmuPump::new(),
        }
    }

    pub fn device_windows(&self) -> [DeviceRegisters; 4] {
        core::array::from_fn(|i| self.ports[i].0)
    }

    pub fn shm_windows(&self) -> [ShmRegisters; 4] {
        core::array::from_fn(|i| self.ports[i].1)
    }

    pub fn own_port(&self) -> &(DeviceRegisters, ShmRegisters) {
        &self.ports[self.active_port.get() as usize]
    }
}

/// Everything the core calls out to that isn't register access: lock
/// release, console reset, NC-SI, and network TX/port-state. Bundled into
/// one trait so main-loop and bring-up signatures don't carry half a
/// dozen independent generic parameters; implement it once on whatever
/// type wires up the real NC-SI stack and network driver.
pub trait Collaborators:
    reset::LockOwner
    + console::Console
    + ncsi::NcsiFrame
    + ncsi::NcsiReloadTrigger
    + ncsi::NcsiPassthrough
    + network::PassthroughTx
    + network::PortState
    + rmu::RmuBadPacketAck
    + rmu::RmuInit
{
}

impl<T> Collaborators for T where
    T: reset::LockOwner
        + console::Console
        + ncsi::NcsiFrame
        + ncsi::NcsiReloadTrigger
        + ncsi::NcsiPassthrough
        + network::PassthroughTx
        + network::PortState
        + rmu::RmuBadPacketAck
        + rmu::RmuInit
{
}
