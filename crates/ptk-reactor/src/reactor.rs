use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use mio::event::Source;
use mio::{Events, Interest, Poll, Registry, Token, Waker};
use ptk_runtime::{ThreadHandle, signal_bits};
use tracing::trace;

use crate::error::ReactorError;
use crate::timer::{TimerId, TimerWheel};

static NEXT_REACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Reserved token for the reactor's own user-event channel (an `eventfd`
/// stand-in): never handed out by [`Reactor::register`], so it can never
/// collide with a socket's token.
const WAKE_TOKEN: Token = Token(usize::MAX);

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Readiness {
    pub(crate) readable: bool,
    pub(crate) writable: bool,
    pub(crate) error: bool,
}

/// One reactor per worker thread: multiplexes socket readiness, a soonest
/// timer deadline, and the caller's own `ABORT`/signal bitmask into a single
/// blocking wait.
///
/// Every public socket operation in [`crate::tcp`] / [`crate::udp`] is built
/// from `reactor_wait` plus exactly one non-blocking system call — never a
/// bare blocking syscall.
pub struct Reactor {
    pub(crate) id: u64,
    poll: Poll,
    events: Events,
    next_token: usize,
    pending: HashMap<Token, Readiness>,
    timers: TimerWheel,
    waker: Arc<Waker>,
    bound_thread: Option<ThreadHandle>,
}

impl Reactor {
    pub fn new() -> std::io::Result<Self> {
        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKE_TOKEN)?);
        Ok(Reactor {
            id: NEXT_REACTOR_ID.fetch_add(1, Ordering::Relaxed),
            poll,
            events: Events::with_capacity(256),
            next_token: 0,
            pending: HashMap::new(),
            timers: TimerWheel::new(),
            waker,
            bound_thread: None,
        })
    }

    /// Registers `callback` to run on this reactor's own thread, the next
    /// time it's between two blocking operations, every `period` (coarsened
    /// to [`crate::timer::MIN_PERIOD`]).
    pub fn start_periodic(&mut self, period: Duration, callback: impl FnMut() + Send + 'static) -> TimerId {
        self.timers.start_periodic(period, Box::new(callback))
    }

    /// As [`Self::start_periodic`] but `callback` runs at most once.
    pub fn start_oneshot(&mut self, after: Duration, callback: impl FnOnce() + Send + 'static) -> TimerId {
        self.timers.start_oneshot(after, Box::new(callback))
    }

    pub fn cancel_timer(&mut self, id: TimerId) {
        self.timers.cancel(id);
    }

    /// Registers `source` for `interest`, allocating a fresh token. Used by
    /// socket wrappers the first time they're driven by this reactor.
    pub(crate) fn register(&mut self, source: &mut dyn Source, interest: Interest) -> std::io::Result<Token> {
        let token = Token(self.next_token);
        self.next_token += 1;
        self.poll.registry().register(source, token, interest)?;
        self.pending.insert(token, Readiness::default());
        Ok(token)
    }

    pub(crate) fn reregister(&mut self, source: &mut dyn Source, token: Token, interest: Interest) -> std::io::Result<()> {
        self.poll.registry().reregister(source, token, interest)
    }

    pub(crate) fn deregister(&mut self, source: &mut dyn Source, token: Token) {
        let _ = self.poll.registry().deregister(source);
        self.pending.remove(&token);
    }

    /// Registers `source` with this reactor as part of a migration away from
    /// a different one. Callers (`TcpListener`/`TcpSocket`/`UdpSocket`'s
    /// `ensure_registered`) are responsible for deregistering `source` from
    /// its previous reactor's [`Self::registry`] clone first — this method
    /// only performs the new-reactor half, so a socket is never monitored by
    /// two reactors at once only as long as that deregister actually runs.
    pub(crate) fn adopt(&mut self, source: &mut dyn Source, interest: Interest) -> std::io::Result<Token> {
        self.register(source, interest)
    }

    /// A cloned handle onto this reactor's `mio::Registry`, independent of
    /// `&mut self` — kept by a socket wrapper alongside its token so that a
    /// later migration to a *different* reactor can deregister from this one
    /// without needing this `Reactor` to still be reachable.
    pub(crate) fn registry(&self) -> std::io::Result<Registry> {
        self.poll.registry().try_clone()
    }

    /// Binds this reactor's user-event channel to `abort` so that
    /// `abort.signal(...)` wakes a blocked `poll()` immediately instead of
    /// only at the next socket event or timer deadline. A no-op once
    /// already bound to the same handle; idempotent across repeated calls
    /// from the same owning thread.
    fn bind_wake_hook(&mut self, abort: &ThreadHandle) {
        if self.bound_thread.as_ref() == Some(abort) {
            return;
        }
        let waker = self.waker.clone();
        abort.register_wake_hook(Arc::new(move || {
            let _ = waker.wake();
        }));
        self.bound_thread = Some(abort.clone());
    }

    /// Blocks until `token` becomes ready for (any bit of) `interest`, a
    /// timer fires, `deadline` passes, or `abort` observes a pending signal
    /// — `ABORT` specifically surfaces as [`ReactorError::Abort`], any other
    /// bit (`INTERRUPT`, a `USER_n`) as [`ReactorError::Signal`].
    pub(crate) fn reactor_wait(
        &mut self,
        token: Token,
        interest: Interest,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<Readiness, ReactorError> {
        self.bind_wake_hook(abort);
        loop {
            if abort.has_signal(signal_bits::ABORT) {
                return Err(ReactorError::Abort);
            }
            if abort.pending() != 0 {
                return Err(ReactorError::Signal);
            }
            if let Some(ready) = self.pending.get_mut(&token) {
                let satisfied = (interest.is_readable() && (ready.readable || ready.error))
                    || (interest.is_writable() && (ready.writable || ready.error));
                if satisfied {
                    let out = *ready;
                    ready.readable &= !interest.is_readable();
                    ready.writable &= !interest.is_writable();
                    return Ok(out);
                }
            }

            // Note: no early deadline-elapsed check here. A caller probing
            // with an already-past deadline (the zero-wait drain pattern)
            // still needs the `poll()` below to run once with a clamped
            // zero timeout, so readiness already queued in the kernel is
            // observed before we report a timeout.
            let poll_deadline = soonest(deadline, self.timers.soonest());
            let timeout = poll_deadline.map(|d| d.saturating_duration_since(Instant::now()));
            if let Err(err) = self.poll.poll(&mut self.events, timeout) {
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ReactorError::from(err));
            }

            for ev in self.events.iter() {
                if ev.token() == WAKE_TOKEN {
                    trace!("reactor woken via user-event channel");
                    continue;
                }
                let entry = self.pending.entry(ev.token()).or_default();
                entry.readable |= ev.is_readable();
                entry.writable |= ev.is_writable();
                entry.error |= ev.is_error() || ev.is_read_closed() || ev.is_write_closed();
                trace!(token = ?ev.token(), ?entry, "socket readiness updated");
            }

            self.timers.expire();

            if let Some(d) = deadline
                && Instant::now() >= d
            {
                return Err(ReactorError::Timeout);
            }
        }
    }
}

fn soonest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
