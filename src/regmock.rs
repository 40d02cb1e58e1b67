//! Software-backed register windows for unit tests: same typed facade as
//! production code, pointed at a zeroed local buffer instead of MMIO.

use core::mem::MaybeUninit;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU32, Ordering};

use trait_ffi::impl_trait;

use crate::osal::Kernel;
use crate::regs::ape::ApeBlock;
use crate::regs::ape_peri::ApePeriBlock;
use crate::regs::device::DeviceBlock;
use crate::regs::nvic::NvicBlock;
use crate::regs::shm::ShmBlock;
use crate::regs::{ApePeriRegisters, ApeRegisters, DeviceRegisters, NvicRegisters, RxPort, ShmRegisters};

/// Installs `env_logger` so `log::` output from the code under test shows
/// up when a unit test is run with `--nocapture`. Idempotent; call at the
/// top of any test that wants to see it.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

static MOCK_TICK: AtomicU32 = AtomicU32::new(1);

/// Sets the tick `timer::now()` reports for the rest of this test.
pub fn set_mock_time(t: u32) {
    MOCK_TICK.store(t, Ordering::SeqCst);
}

/// Advances the mock clock by `delta` ticks.
pub fn advance_mock_time(delta: u32) {
    MOCK_TICK.fetch_add(delta, Ordering::SeqCst);
}

struct KernelImpl;

impl_trait! {
    impl Kernel for KernelImpl {
        fn now_1khz() -> u32 {
            MOCK_TICK.load(Ordering::SeqCst)
        }

        fn sleep_ms(_ms: u32) {}
    }
}

pub struct ApeMock(MaybeUninit<ApeBlock>);

impl ApeMock {
    pub fn new() -> Self {
        Self(MaybeUninit::zeroed())
    }

    pub fn registers(&mut self) -> ApeRegisters {
        let ptr = NonNull::new(self.0.as_mut_ptr() as *mut u8).unwrap();
        unsafe { ApeRegisters::new(ptr) }
    }
}

pub struct ApePeriMock(MaybeUninit<ApePeriBlock>);

impl ApePeriMock {
    pub fn new() -> Self {
        Self(MaybeUninit::zeroed())
    }

    pub fn registers(&mut self) -> ApePeriRegisters {
        let ptr = NonNull::new(self.0.as_mut_ptr() as *mut u8).unwrap();
        unsafe { ApePeriRegisters::new(ptr) }
    }
}

pub struct DeviceMock(MaybeUninit<DeviceBlock>);

impl DeviceMock {
    pub fn new() -> Self {
        Self(MaybeUninit::zeroed())
    }

    pub fn registers(&mut self) -> DeviceRegisters {
        let ptr = NonNull::new(self.0.as_mut_ptr() as *mut u8).unwrap();
        unsafe { DeviceRegisters::new(ptr) }
    }
}

pub struct ShmMock(MaybeUninit<ShmBlock>);

impl ShmMock {
    pub fn new() -> Self {
        Self(MaybeUninit::zeroed())
    }

    pub fn registers(&mut self) -> ShmRegisters {
        let ptr = NonNull::new(self.0.as_mut_ptr() as *mut u8).unwrap();
        unsafe { ShmRegisters::new(ptr) }
    }
}

pub struct NvicMock(MaybeUninit<NvicBlock>);

impl NvicMock {
    pub fn new() -> Self {
        Self(MaybeUninit::zeroed())
    }

    pub fn registers(&mut self) -> NvicRegisters {
        let ptr = NonNull::new(self.0.as_mut_ptr() as *mut u8).unwrap();
        unsafe { NvicRegisters::new(ptr) }
    }
}

/// Backing storage for all four ports' device/shared-memory windows, kept
/// together so a test can hold one value alive for as long as it needs the
/// `[(DeviceRegisters, ShmRegisters); 4]` view into it.
pub struct PortMocks([(DeviceMock, ShmMock); 4]);

impl PortMocks {
    pub fn new() -> Self {
        Self(core::array::from_fn(|_| (DeviceMock::new(), ShmMock::new())))
    }

    pub fn registers(&mut self) -> [(DeviceRegisters, ShmRegisters); 4] {
        core::array::from_fn(|i| (self.0[i].0.registers(), self.0[i].1.registers()))
    }
}

/// A handful of RX ring blocks, laid out the way `RxPort` expects:
/// `rx_port::BLOCK_WORDS` words per block, control word first.
pub struct RxPortMock {
    blocks: [[u32; crate::regs::rx_port::BLOCK_WORDS]; Self::BLOCKS],
}

impl RxPortMock {
    const BLOCKS: usize = 8;

    pub fn new() -> Self {
        Self {
            blocks: [[0u32; crate::regs::rx_port::BLOCK_WORDS]; Self::BLOCKS],
        }
    }

    pub fn registers(&mut self) -> RxPort {
        let ptr = NonNull::new(self.blocks.as_mut_ptr() as *mut u32).unwrap();
        unsafe { RxPort::new(ptr) }
    }

    pub fn set_control(&mut self, block_id: u32, control: u32) {
        self.blocks[block_id as usize][0] = control;
    }

    pub fn set_payload_word(&mut self, block_id: u32, word_offset: usize, value: u32) {
        self.blocks[block_id as usize][word_offset] = value;
    }
}

/// Backing storage for a complete software-mocked [`crate::Mc`], built
/// without going through `Mc::new`'s `unsafe` MMIO-address contract.
pub struct McMock {
    ape: ApeMock,
    ape_peri: ApePeriMock,
    nvic: NvicMock,
    rx_port: RxPortMock,
    ports: PortMocks,
}

impl McMock {
    pub fn new() -> Self {
        Self {
            ape: ApeMock::new(),
            ape_peri: ApePeriMock::new(),
            nvic: NvicMock::new(),
            rx_port: RxPortMock::new(),
            ports: PortMocks::new(),
        }
    }

    pub fn mc(&mut self) -> crate::Mc {
        crate::Mc {
            ports: self.ports.registers(),
            ape: self.ape.registers(),
            ape_peri: self.ape_peri.registers(),
            nvic: self.nvic.registers(),
            rx_port: self.rx_port.registers(),
            debounce: crate::state::ResetDebounce::new(),
            active_port: crate::state::ActivePort::new(),
            rmu_pump: crate::rmu::RmuPump::new(),
        }
    }
}
