//! Component C2: monotonic millisecond timer service.

use crate::osal::kernel;

/// Current 1 kHz tick count. Wraps at `u32::MAX`.
pub fn now() -> u32 {
    kernel::now_1khz()
}

/// True iff at least `ms` ticks have passed since `t0`, using wrapping
/// (modular) subtraction so a wraparound between `t0` and now doesn't
/// falsely report "not yet elapsed".
pub fn elapsed_since(t0: u32, ms: u32) -> bool {
    now().wrapping_sub(t0) >= ms
}

/// Arms a debounce-style timestamp to `max(now(), 1)`: zero is reserved
/// to mean "no debounce pending", so a tick of exactly zero is nudged
/// back to the preceding tick instead.
pub fn arm_non_zero() -> u32 {
    let t = now();
    if t == 0 {
        u32::MAX
    } else {
        t
    }
}
