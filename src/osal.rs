use trait_ffi::def_extern_trait;

/// Errors surfaced by fallible collaborator calls in the bring-up and
/// reset paths. Nothing in this crate propagates one past the main loop
/// (there is no caller above it to propagate to); bring-up logs and
/// treats the failing step as if a cold reset happened, rather than
/// aborting.
#[derive(Debug, thiserror::Error)]
pub enum FirmwareError {
    #[error("operation timed out")]
    Timeout,
    #[error("console reset failed")]
    ConsoleReset,
    #[error("lock release failed: {0}")]
    LockRelease(&'static str),
}

/// Platform services the core needs but does not implement itself: a
/// millisecond tick source and the ability to block briefly. Supplied by
/// the surrounding firmware image, the same way `Kernel::sleep` is
/// supplied by whatever runs a driver built on this pattern.
#[def_extern_trait]
pub trait Kernel {
    /// Monotonic 1 kHz tick count. Wraps; callers compare with wrapping
    /// subtraction.
    fn now_1khz() -> u32;
    fn sleep_ms(ms: u32);
}
