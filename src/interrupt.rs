//! Host interrupt (SIGINT) handling so Ctrl-C on the host ends the menu cleanly.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Flag set by the SIGINT handler; consumed by the terminal input wait.
static SIGINT_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Only touches an atomic (async-signal-safe).
extern "C" fn handle_sigint(_: libc::c_int) {
    SIGINT_RECEIVED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT handler for the host process.
///
/// # Errors
///
/// Returns the OS error if the handler cannot be installed.
pub fn install_sigint_handler() -> io::Result<()> {
    // SAFETY: the handler only stores to an atomic. `sigemptyset` and `sigaction`
    // get initialized pointers and their return codes are checked.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_flags = libc::SA_RESTART;
        action.sa_sigaction = handle_sigint as *const () as usize;
        if libc::sigemptyset(&mut action.sa_mask) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

fn take_flag(flag: &AtomicBool) -> bool {
    flag.swap(false, Ordering::SeqCst)
}

/// Consume a pending interrupt, if any.
pub fn take_interrupt() -> bool {
    take_flag(&SIGINT_RECEIVED)
}
