use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag::register_usize;
use tracing::{info, warn};

use crate::ThreadHandle;
use crate::error::RuntimeError;
use crate::signal_bits::ABORT;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Registers `SIGINT`/`SIGTERM`/`SIGHUP` the way `ScopedSpine::new` does
/// (`signal_hook::flag::register_usize`), then spawns a daemon poller that
/// folds any of them into `ABORT` on `root`.
///
/// The poller, not the signal handler itself, does the OR-into-bitmask and
/// condvar wakeup — async-signal-safety rules forbid taking locks or
/// allocating from inside the actual signal handler.
pub fn install_interrupt_bridge(root: &ThreadHandle) -> Result<(), RuntimeError> {
    let flag = Arc::new(AtomicUsize::new(0));
    for sig in [SIGINT, SIGTERM, SIGHUP] {
        register_usize(sig, flag.clone(), sig as usize).map_err(|_| RuntimeError::BridgeAlreadyInstalled)?;
    }

    let root = root.clone();
    thread::spawn(move || {
        loop {
            let observed = flag.swap(0, Ordering::SeqCst);
            if observed != 0 {
                info!(signal = observed, "bridging OS signal to ABORT");
                root.signal(ABORT);
            }
            if root.has_signal(ABORT) {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }
    });
    Ok(())
}

pub(crate) fn warn_spawn_failure(err: &std::io::Error) {
    warn!(%err, "OS thread spawn failed");
}
