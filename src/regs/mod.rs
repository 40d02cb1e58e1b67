//! Typed MMIO register facade (component C1).
//!
//! Every block here is a `tock-registers` `register_structs!` layout paired
//! with `register_bitfields!` for its named fields: no raw pointer
//! bit-twiddling outside this module, volatility lives in the accessor
//! type rather than the struct.

pub mod ape;
pub mod ape_peri;
pub mod device;
pub mod nvic;
pub mod rx_port;
pub mod shm;

pub use ape::{ApeRegisters, ApeStatusSnapshot};
pub use ape_peri::ApePeriRegisters;
pub use device::DeviceRegisters;
pub use nvic::NvicRegisters;
pub use rx_port::RxPort;
pub use shm::ShmRegisters;
