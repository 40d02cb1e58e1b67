//! External debug console collaborator interface (§1, §4.C9).
//!
//! Console/printing is explicitly out of scope; bring-up only needs to
//! know whether the console came back from a cold or warm state so it
//! can force a full chip init.

use crate::osal::FirmwareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Cold,
    Warm,
}

pub trait Console {
    fn reset(&mut self) -> Result<ConsoleState, FirmwareError>;
}
