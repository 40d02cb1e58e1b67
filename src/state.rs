//! Process-wide scalars shared between interrupt handlers and the main
//! loop (§5, design notes on `gResetTime`/`gPort`).
//!
//! Encapsulated as atomics rather than bare `static mut`s: the "0 means
//! no debounce pending" sentinel is part of the type's API, and a 32-bit
//! atomic store is exactly as cheap as the plain memory-mapped-order
//! write the original firmware relied on, with none of the aliasing
//! hazard of a raw global.

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::timer;

/// The reset-debounce timestamp. `0` means "no reset in progress"; any
/// other value is the 1 kHz tick at which a reset was first observed.
#[derive(Debug, Default)]
pub struct ResetDebounce(AtomicU32);

impl ResetDebounce {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Stamps the debounce timestamp to `max(now(), 1)`, mapping a
    /// freshly sampled `0` to the preceding tick so `0` stays the unique
    /// "no reset" sentinel. May be called from interrupt context.
    pub fn arm(&self, ordering: Ordering) {
        self.0.store(timer::arm_non_zero(), ordering);
    }

    pub fn get(&self, ordering: Ordering) -> u32 {
        self.0.load(ordering)
    }

    pub fn is_armed(&self, ordering: Ordering) -> bool {
        self.get(ordering) != 0
    }

    pub fn clear(&self, ordering: Ordering) {
        self.0.store(0, ordering);
    }
}

/// The NC-SI port this firmware image is bound to, set once at bring-up
/// from the `NETWORK_PORT` build constant.
#[derive(Debug, Default)]
pub struct ActivePort(AtomicU8);

impl ActivePort {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub fn set(&self, port: u8) {
        self.0.store(port, Ordering::Relaxed);
    }

    pub fn get(&self) -> u8 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regmock::set_mock_time;

    #[test]
    fn fresh_debounce_is_disarmed() {
        let d = ResetDebounce::new();
        assert!(!d.is_armed(Ordering::SeqCst));
    }

    #[test]
    fn arming_at_tick_zero_still_reads_armed() {
        set_mock_time(0);
        let d = ResetDebounce::new();
        d.arm(Ordering::SeqCst);
        assert!(d.is_armed(Ordering::SeqCst));
        assert_eq!(d.get(Ordering::SeqCst), u32::MAX);
    }

    #[test]
    fn clear_disarms() {
        set_mock_time(10);
        let d = ResetDebounce::new();
        d.arm(Ordering::SeqCst);
        d.clear(Ordering::SeqCst);
        assert!(!d.is_armed(Ordering::SeqCst));
    }

    #[test]
    fn active_port_defaults_to_zero() {
        let p = ActivePort::new();
        assert_eq!(p.get(), 0);
        p.set(2);
        assert_eq!(p.get(), 2);
    }
}
