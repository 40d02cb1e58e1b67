//! Component C6: power/reset interrupt handlers.
//!
//! Both handlers share a post-condition: on the path that decides a
//! reset is underway, they arm [`ResetDebounce`] to a non-zero tick so
//! the main loop picks up the debounce. Vectoring these onto the actual
//! hardware interrupt table is a platform concern outside this crate;
//! these are the handler bodies a platform's vector table entries call
//! into.

use core::sync::atomic::Ordering;

use log::{info, warn};

use crate::regs::{ApeRegisters, DeviceRegisters, NvicRegisters};
use crate::state::ResetDebounce;

/// Voltage-source-changed interrupt: clears its pending bit, logs which
/// rail is now active, and unconditionally arms the debounce — a
/// voltage-source change always means "reinitialize after settling".
pub fn voltage_source_changed(nvic: &NvicRegisters, device: &DeviceRegisters, debounce: &ResetDebounce) {
    nvic.clear_pending_vmain();

    if device.vmain_power_status() {
        info!("Vsrc: Main");
    } else {
        info!("Vsrc: Aux");
    }

    debounce.arm(Ordering::SeqCst);
}

/// General-reset/power-state-changed interrupt: acks the W1C status
/// bits, then arms the debounce and disables this interrupt source only
/// if a GRC reset is actually in progress and no debounce is already
/// running. If a debounce is already running, this event is already
/// covered and the handler does nothing further.
pub fn power_state_changed(nvic: &NvicRegisters, ape: &ApeRegisters, debounce: &ResetDebounce) {
    let snapshot = ape.snapshot_status();
    ape.ack_status(snapshot);
    nvic.clear_pending_general_reset();

    info!("PowerStateChanged.");

    if !debounce.is_armed(Ordering::SeqCst) && snapshot.reset_in_progress() {
        warn!("GRC Reset.");
        debounce.arm(Ordering::SeqCst);
        nvic.disable_general_reset();
    }
}

#[cfg(test)]
mod tests {
    use tock_registers::interfaces::Writeable;

    use super::*;
    use crate::regmock::{set_mock_time, ApeMock, DeviceMock, NvicMock};
    use crate::regs::ape::APE_STATUS;

    #[test]
    fn power_state_changed_arms_debounce_only_when_reset_in_progress() {
        set_mock_time(5);
        let mut ape_mock = ApeMock::new();
        let ape = ape_mock.registers();
        let mut nvic_mock = NvicMock::new();
        let nvic = nvic_mock.registers();
        let debounce = ResetDebounce::new();

        power_state_changed(&nvic, &ape, &debounce);
        assert!(!debounce.is_armed(Ordering::SeqCst));
    }

    #[test]
    fn power_state_changed_arms_debounce_on_grc_reset() {
        set_mock_time(5);
        let mut ape_mock = ApeMock::new();
        let ape = ape_mock.registers();
        ape.regs_for_test().status.write(APE_STATUS::PORT0_GRC_RESET::SET);
        let mut nvic_mock = NvicMock::new();
        let nvic = nvic_mock.registers();
        let debounce = ResetDebounce::new();

        power_state_changed(&nvic, &ape, &debounce);
        assert!(debounce.is_armed(Ordering::SeqCst));
    }

    #[test]
    fn power_state_changed_is_idempotent_while_already_armed() {
        set_mock_time(5);
        let mut ape_mock = ApeMock::new();
        let ape = ape_mock.registers();
        ape.regs_for_test().status.write(APE_STATUS::PORT0_GRC_RESET::SET);
        let mut nvic_mock = NvicMock::new();
        let nvic = nvic_mock.registers();
        let debounce = ResetDebounce::new();
        debounce.arm(Ordering::SeqCst);

        let armed_at = debounce.get(Ordering::SeqCst);
        power_state_changed(&nvic, &ape, &debounce);
        assert_eq!(debounce.get(Ordering::SeqCst), armed_at);
    }

    #[test]
    fn voltage_source_changed_always_arms_debounce() {
        set_mock_time(3);
        let mut device_mock = DeviceMock::new();
        let device = device_mock.registers();
        let mut nvic_mock = NvicMock::new();
        let nvic = nvic_mock.registers();
        let debounce = ResetDebounce::new();

        voltage_source_changed(&nvic, &device, &debounce);
        assert!(debounce.is_armed(Ordering::SeqCst));
    }
}
