use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use ptk_handles::Handle as ObjectHandle;

use crate::state::{StateCell, ThreadState};

/// A reactor's external-wakeup hook, registered on the [`ThreadHandle`] it
/// blocks on behalf of so that [`ThreadHandle::signal`] can pull it out of a
/// `mio::Poll::poll` the same instant it ORs a bit into the pending mask.
/// Lives here, not in `ptk-reactor`, because a `ThreadHandle` must be
/// constructible (and signalable) long before any reactor exists for it.
pub(crate) type WakeFn = dyn Fn() + Send + Sync;

/// One argument bound to a thread descriptor before `thread_start`, typed so
/// a collaborator can pass scalars, cross-thread object handles, or raw
/// bytes without an intermediate allocation scheme per kind.
#[derive(Debug, Clone)]
pub enum ThreadArg {
    Scalar(i64),
    Handle(ObjectHandle),
    Bytes(Vec<u8>),
}

pub(crate) type RunFn = dyn FnOnce(&ThreadHandle) + Send;

pub(crate) struct Descriptor {
    pub(crate) state: StateCell,
    pub(crate) pending_signals: AtomicU64,
    pub(crate) parent: Option<ThreadHandle>,
    pub(crate) args: Mutex<Vec<ThreadArg>>,
    pub(crate) run_fn: Mutex<Option<Box<RunFn>>>,
    pub(crate) children: Mutex<Vec<ThreadHandle>>,
    pub(crate) wait_lock: Mutex<()>,
    pub(crate) wait_cv: Condvar,
    pub(crate) reactor_wake: Mutex<Option<Arc<WakeFn>>>,
}

/// A cheaply-cloneable reference to a worker's descriptor: its signal
/// bitmask, lifecycle state, and child list. This is the unit every runtime
/// operation (`thread_signal`, `thread_wait`, `thread_start`, ...) takes.
#[derive(Clone)]
pub struct ThreadHandle(pub(crate) Arc<Descriptor>);

/// Outcome of [`crate::thread_wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// At least one pending bit was observed.
    Signal,
    /// The timeout elapsed with no signal pending.
    Timeout,
    /// A zero-duration poll found nothing pending.
    Ok,
}

impl ThreadHandle {
    pub(crate) fn new(parent: Option<ThreadHandle>) -> Self {
        ThreadHandle(Arc::new(Descriptor {
            state: StateCell::default(),
            pending_signals: AtomicU64::new(0),
            parent,
            args: Mutex::new(Vec::new()),
            run_fn: Mutex::new(None),
            children: Mutex::new(Vec::new()),
            wait_lock: Mutex::new(()),
            wait_cv: Condvar::new(),
            reactor_wake: Mutex::new(None),
        }))
    }

    #[must_use]
    pub fn state(&self) -> ThreadState {
        self.0.state.load()
    }

    #[must_use]
    pub fn pending(&self) -> u64 {
        self.0.pending_signals.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn has_signal(&self, bits: u64) -> bool {
        self.pending() & bits != 0
    }

    /// ORs `bits` into the pending-signal mask and wakes anyone parked in
    /// `thread_wait`. Level-triggered: the bit stays set until cleared.
    ///
    /// If a reactor has bound its user-event channel to this handle via
    /// [`Self::register_wake_hook`], it is woken too — a thread blocked in
    /// `mio::Poll::poll` on behalf of this handle doesn't see the condvar
    /// `notify_all` above at all, so without this it would only notice the
    /// new bit at its next socket event or timer deadline.
    pub fn signal(&self, bits: u64) {
        self.0.pending_signals.fetch_or(bits, Ordering::AcqRel);
        let _unused = self.0.wait_lock.lock().unwrap();
        self.0.wait_cv.notify_all();
        drop(_unused);
        if let Some(hook) = self.0.reactor_wake.lock().unwrap().as_ref() {
            hook();
        }
    }

    /// Binds `hook` as this handle's reactor wakeup: called from
    /// [`Self::signal`] in addition to the condvar notify. A reactor calls
    /// this once per `ThreadHandle` it's asked to block on behalf of;
    /// rebinding (a different reactor, or none) simply replaces it.
    pub fn register_wake_hook(&self, hook: Arc<dyn Fn() + Send + Sync>) {
        *self.0.reactor_wake.lock().unwrap() = Some(hook);
    }

    /// Clears `bits` from the pending mask, returning the mask as it was
    /// immediately before the clear.
    pub fn clear_signals(&self, bits: u64) -> u64 {
        self.0.pending_signals.fetch_and(!bits, Ordering::AcqRel)
    }

    /// Blocks until some bit is pending or `timeout` elapses. A zero
    /// duration is a non-blocking poll.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> WaitResult {
        if self.pending() != 0 {
            return WaitResult::Signal;
        }
        if timeout == Duration::ZERO {
            return WaitResult::Ok;
        }

        let deadline = Instant::now() + timeout;
        let mut guard = self.0.wait_lock.lock().unwrap();
        loop {
            if self.pending() != 0 {
                return WaitResult::Signal;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return WaitResult::Timeout;
            };
            let (next, result) = self.0.wait_cv.wait_timeout(guard, remaining).unwrap();
            guard = next;
            if result.timed_out() && self.pending() == 0 {
                return WaitResult::Timeout;
            }
        }
    }

    pub(crate) fn children(&self) -> &Mutex<Vec<ThreadHandle>> {
        &self.0.children
    }

    pub(crate) fn push_arg(&self, arg: ThreadArg) {
        self.0.args.lock().unwrap().push(arg);
    }

    pub(crate) fn args_snapshot(&self) -> Vec<ThreadArg> {
        self.0.args.lock().unwrap().clone()
    }

    /// Binds the run function. Fails if one is already bound.
    pub(crate) fn set_run(&self, f: Box<RunFn>) -> Result<(), crate::error::RuntimeError> {
        let mut slot = self.0.run_fn.lock().unwrap();
        if slot.is_some() {
            return Err(crate::error::RuntimeError::RunAlreadySet);
        }
        *slot = Some(f);
        Ok(())
    }

    pub(crate) fn take_run(&self) -> Option<Box<RunFn>> {
        self.0.run_fn.lock().unwrap().take()
    }

    pub(crate) fn has_run(&self) -> bool {
        self.0.run_fn.lock().unwrap().is_some()
    }

    /// Moves `NEW -> RUNNABLE`. Returns `false` if the descriptor wasn't `NEW`.
    pub(crate) fn start_from_new(&self) -> bool {
        self.0.state.start_from_new()
    }

    pub(crate) fn mark_running(&self) {
        self.0.state.store(ThreadState::Running);
    }

    pub(crate) fn mark_exited(&self) {
        self.0.state.store(ThreadState::Exited);
    }

    pub(crate) fn parent_for_notification(&self) -> Option<ThreadHandle> {
        self.0.parent.clone()
    }
}

impl PartialEq for ThreadHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for ThreadHandle {}
