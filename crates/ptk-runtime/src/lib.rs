//! Cooperative worker threads: a `ThreadHandle` exposes a signal bitmask, a
//! lifecycle state machine, and parent/child tracking. Cancellation is
//! cooperative — `ABORT` is a bit a worker's blocking operations must
//! observe themselves; there is no asynchronous termination.

mod descriptor;
mod error;
pub mod logging;
pub mod signal_bits;
mod signals;
mod state;

use std::thread;

pub use descriptor::{ThreadArg, ThreadHandle, WaitResult};
pub use error::RuntimeError;
pub use logging::{LogSink, SinkLayer};
pub use ptk_utils::ThreadPriority;
pub use signals::install_interrupt_bridge;
pub use state::ThreadState;

/// Where and how `thread_start` should boot the OS thread, mirroring
/// `ptk_utils::thread_boot`'s `(core, priority)` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadConfig {
    pub core: Option<usize>,
    pub priority: ThreadPriority,
}

/// Reserves a descriptor in `NEW` state, optionally as a child of `parent`.
/// The parent's child list gains a clone of the new handle so
/// `thread_signal_all_children`/`thread_cleanup_dead_children` can reach it.
#[must_use]
pub fn thread_create(parent: Option<&ThreadHandle>) -> ThreadHandle {
    let handle = ThreadHandle::new(parent.cloned());
    if let Some(parent) = parent {
        parent.children().lock().unwrap().push(handle.clone());
    }
    handle
}

/// Appends a typed argument to `handle`'s argument list. Only valid while
/// the descriptor is still `NEW`.
pub fn thread_add_arg(handle: &ThreadHandle, arg: ThreadArg) -> Result<(), RuntimeError> {
    if handle.state() != ThreadState::New {
        return Err(RuntimeError::InvalidState);
    }
    handle.push_arg(arg);
    Ok(())
}

/// Returns a copy of the arguments bound so far via `thread_add_arg`.
#[must_use]
pub fn thread_args(handle: &ThreadHandle) -> Vec<ThreadArg> {
    handle.args_snapshot()
}

/// Binds the entry function. Only valid while the descriptor is still `NEW`;
/// fails with [`RuntimeError::RunAlreadySet`] if a function is already bound.
pub fn thread_set_run<F>(handle: &ThreadHandle, f: F) -> Result<(), RuntimeError>
where
    F: FnOnce(&ThreadHandle) + Send + 'static,
{
    if handle.state() != ThreadState::New {
        return Err(RuntimeError::InvalidState);
    }
    handle.set_run(Box::new(f))
}

/// Transitions `NEW -> RUNNABLE` and spawns the OS worker. The worker itself
/// transitions to `RUNNING`, boots affinity/priority, runs the bound
/// function, then transitions to `EXITED` and posts `CHILD_DIED` to its
/// parent, if any.
pub fn thread_start(handle: &ThreadHandle, config: ThreadConfig) -> Result<(), RuntimeError> {
    if !handle.has_run() {
        return Err(RuntimeError::InvalidState);
    }
    if !handle.start_from_new() {
        return Err(RuntimeError::InvalidState);
    }
    let Some(run_fn) = handle.take_run() else {
        return Err(RuntimeError::InvalidState);
    };

    let worker = handle.clone();
    let parent = handle.parent_for_notification();
    let spawned = thread::Builder::new().spawn(move || {
        ptk_utils::thread_boot(config.core, config.priority);
        worker.mark_running();
        run_fn(&worker);
        worker.mark_exited();
        if let Some(parent) = parent {
            parent.signal(signal_bits::CHILD_DIED);
        }
    });

    match spawned {
        Ok(join) => {
            drop(join);
            Ok(())
        }
        Err(err) => {
            signals::warn_spawn_failure(&err);
            handle.mark_exited();
            Err(RuntimeError::NoResources)
        }
    }
}

/// ORs `bits` into `handle`'s pending-signal mask, waking any `thread_wait`.
pub fn thread_signal(handle: &ThreadHandle, bits: u64) {
    handle.signal(bits);
}

#[must_use]
pub fn thread_get_pending(handle: &ThreadHandle) -> u64 {
    handle.pending()
}

#[must_use]
pub fn thread_has_signal(handle: &ThreadHandle, bits: u64) -> bool {
    handle.has_signal(bits)
}

pub fn thread_clear_signals(handle: &ThreadHandle, bits: u64) -> u64 {
    handle.clear_signals(bits)
}

/// Blocks the calling thread until `handle` is signaled or `duration`
/// elapses. Meant to be called by `handle`'s own worker on itself.
#[must_use]
pub fn thread_wait(handle: &ThreadHandle, duration: std::time::Duration) -> WaitResult {
    handle.wait(duration)
}

/// Fans `bits` out to every child currently tracked by `parent`.
pub fn thread_signal_all_children(parent: &ThreadHandle, bits: u64) {
    for child in parent.children().lock().unwrap().iter() {
        child.signal(bits);
    }
}

/// Removes every `EXITED` child from `parent`'s list, up to `timeout` spent
/// waiting for stragglers to finish. Returns how many were reaped.
pub fn thread_cleanup_dead_children(parent: &ThreadHandle, timeout: std::time::Duration) -> usize {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        let mut children = parent.children().lock().unwrap();
        let before = children.len();
        children.retain(|child| child.state() != ThreadState::Exited);
        let reaped = before - children.len();
        let any_left = !children.is_empty();
        drop(children);

        if reaped > 0 || !any_left || std::time::Instant::now() >= deadline {
            return reaped;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}
