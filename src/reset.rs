//! Component C4: reset controller.
//!
//! Detects whether the chip is held in reset, bit-bangs a recovery clock
//! into the PHY block through three GPIO pins when it is, and waits for
//! all four receive CPUs to finish their own bring-up before handing
//! control back to the caller.

use log::{info, warn};
use tock_registers::interfaces::{Readable, Writeable};

use crate::osal::FirmwareError;
use crate::regs::ape::APE_GPIO;
use crate::regs::shm::SEG_SIG_RCPU;
use crate::regs::{ApeRegisters, DeviceRegisters, ShmRegisters};
use crate::timer;

/// Number of GPIO writes in the recovery-clock bit-bang. Each iteration
/// inverts both clock phases, so this is the number of half-cycles, not
/// full cycles.
const CLOCK_BANG_CYCLES: usize = 38;

/// Upper bound on how long a single receive CPU gets to signal it has
/// started (or surrendered) during reset.
pub const RX_CPU_RESET_TIMEOUT_MS: u32 = 1000;

/// Releases the peripheral/NVRAM locks the four receive CPUs need to
/// proceed through bring-up. Modeled as an external collaborator: lock
/// ownership and release mechanics live outside this crate's scope.
pub trait LockOwner {
    fn release_all_peripheral_locks(&self) -> Result<(), FirmwareError>;
    fn release_all_nvram_locks(&self) -> Result<(), FirmwareError>;
}

/// Reads the chip-id register and, if the chip is held in reset, performs
/// the full bring-up sequence: release locks, bit-bang the recovery
/// clock, wait for the chip id to become readable, restore the clock mux,
/// then wait for every receive CPU. Returns whether a reset was actually
/// performed.
pub fn handle_reset<L: LockOwner>(
    ape: &ApeRegisters,
    device: &DeviceRegisters,
    locks: &L,
    ports: &[(DeviceRegisters, ShmRegisters); 4],
) -> bool {
    if device.chip_id() != 0 {
        return false;
    }

    info!("Resetting...");
    if let Err(e) = locks.release_all_nvram_locks() {
        warn!("NVRAM lock release failed: {e}");
    }
    if let Err(e) = locks.release_all_peripheral_locks() {
        warn!("Peripheral lock release failed: {e}");
    }

    let mut gpio = ape.gpio();
    gpio.modify(
        APE_GPIO::PIN0_MODE_OUTPUT::SET
            + APE_GPIO::PIN1_MODE_OUTPUT::SET
            + APE_GPIO::PIN2_MODE_OUTPUT::SET
            + APE_GPIO::PIN0_OUT::SET // Clock_P = 1
            + APE_GPIO::PIN1_OUT::CLEAR // Clock_N = 0
            + APE_GPIO::PIN2_OUT::Ape, // clock mux driven by the APE
    );
    ape.set_gpio(gpio);

    for _ in 0..CLOCK_BANG_CYCLES {
        let clock_p = gpio.is_set(APE_GPIO::PIN0_OUT);
        let clock_n = gpio.is_set(APE_GPIO::PIN1_OUT);
        gpio.modify(
            (if clock_p { APE_GPIO::PIN0_OUT::CLEAR } else { APE_GPIO::PIN0_OUT::SET })
                + (if clock_n { APE_GPIO::PIN1_OUT::CLEAR } else { APE_GPIO::PIN1_OUT::SET }),
        );
        ape.set_gpio(gpio);
    }

    while device.chip_id() == 0 {}

    gpio.modify(APE_GPIO::PIN2_OUT::Pcie);
    ape.set_gpio(gpio);

    wait_for_all_rx(ports);

    true
}

/// Waits up to [`RX_CPU_RESET_TIMEOUT_MS`] for a receive CPU to either
/// halt (`RxRiscStatus.Halted`) or hand off with the `RCPU` shared-memory
/// signature. Either condition means the CPU is done with its own
/// bring-up; a timeout is logged but is not treated as an error (the
/// caller proceeds best-effort).
pub fn wait_for_rx(device: &DeviceRegisters, shm: &ShmRegisters) {
    let start = timer::now();
    loop {
        if device.rx_halted() {
            return;
        }
        if shm.rcpu_seg_sig() == SEG_SIG_RCPU {
            return;
        }
        if timer::elapsed_since(start, RX_CPU_RESET_TIMEOUT_MS) {
            warn!("RX CPU reset timeout.");
            return;
        }
    }
}

/// Sequentially waits for all four ports' receive CPUs.
pub fn wait_for_all_rx(ports: &[(DeviceRegisters, ShmRegisters); 4]) {
    for (device, shm) in ports {
        wait_for_rx(device, shm);
    }
}
