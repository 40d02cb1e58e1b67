//! Component C7: per-port loader mailbox.
//!
//! A privileged debug hole by design: `Call` jumps to an arbitrary
//! address with an arbitrary argument, and none of the three commands
//! validate their operands. Production builds should gate `Call` behind
//! a feature flag; this crate exposes that gate as the `loader-call`
//! feature so a production build can drop it.

use crate::regs::ShmRegisters;

/// One pass over a single port's mailbox: read `Command`, dispatch, ack.
/// Unknown commands are silently ignored but still acked, matching the
/// original firmware's `switch` with a no-op `default`.
pub fn handle_command(shm: &ShmRegisters) {
    let command = shm.loader_command();
    if command == 0 {
        return;
    }

    let arg0 = shm.loader_arg0();
    let arg1 = shm.loader_arg1();

    match command {
        1 => {
            // READ_MEM: *arg0 -> arg0
            let value = unsafe { core::ptr::read_volatile(arg0 as *const u32) };
            shm.set_loader_arg0(value);
        }
        2 => {
            // WRITE_MEM: arg1 -> *arg0
            unsafe { core::ptr::write_volatile(arg0 as *mut u32, arg1) };
        }
        #[cfg(feature = "loader-call")]
        3 => {
            // CALL: jump to arg0 with arg1.
            let function: extern "C" fn(u32) = unsafe { core::mem::transmute(arg0 as usize) };
            function(arg1);
        }
        _ => {}
    }

    shm.clear_loader_command();
}

/// Drains all four ports' mailboxes, one pass each, in port order.
pub fn drain_all(ports: &[ShmRegisters; 4]) {
    for shm in ports {
        handle_command(shm);
    }
}

#[cfg(test)]
mod tests {
    use tock_registers::interfaces::Writeable;

    use super::*;
    use crate::regmock::ShmMock;

    // READ_MEM/WRITE_MEM operate on raw addresses truncated to the 32-bit
    // word this mailbox carries; these tests assume a 32-bit target address
    // space, matching where this mailbox protocol actually runs.

    #[test]
    fn idle_mailbox_is_a_no_op() {
        let mut mock = ShmMock::new();
        let shm = mock.registers();
        handle_command(&shm);
        assert_eq!(shm.loader_command(), 0);
    }

    #[test]
    fn read_mem_copies_target_word_into_arg0_and_acks() {
        let target: u32 = 0xdead_beef;
        let mut mock = ShmMock::new();
        let shm = mock.registers();
        shm.set_loader_arg0(&target as *const u32 as u32);
        shm.regs_for_test().loader_command.set(1);

        handle_command(&shm);

        assert_eq!(shm.loader_arg0(), 0xdead_beef);
        assert_eq!(shm.loader_command(), 0);
    }

    #[test]
    fn write_mem_stores_arg1_at_arg0_and_acks() {
        let mut target: u32 = 0;
        let mut mock = ShmMock::new();
        let shm = mock.registers();
        shm.set_loader_arg0(&mut target as *mut u32 as u32);
        shm.set_loader_arg1(0x1234_5678);
        shm.regs_for_test().loader_command.set(2);

        handle_command(&shm);

        assert_eq!(target, 0x1234_5678);
        assert_eq!(shm.loader_command(), 0);
    }

    #[test]
    fn unknown_command_is_ignored_but_still_acked() {
        let mut mock = ShmMock::new();
        let shm = mock.registers();
        shm.regs_for_test().loader_command.set(0xff);

        handle_command(&shm);

        assert_eq!(shm.loader_command(), 0);
    }
}
