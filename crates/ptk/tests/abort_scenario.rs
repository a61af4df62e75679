//! Scenario S4: a blocking reactor call must return promptly once `ABORT`
//! is raised on the `ThreadHandle` it was given, even with a long caller
//! deadline and nothing ever arriving on the socket.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ptk::reactor::{Reactor, ReactorError, TcpListener};
use ptk::runtime::{signal_bits, thread_create, thread_signal};

#[test]
fn accept_returns_abort_promptly_once_signaled() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut reactor = Reactor::new().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();

    let worker = thread_create(None);
    let abort_target = worker.clone();

    // No caller deadline at all: the only thing that can ever end this
    // `accept` is the `ABORT` below. If the reactor's `poll()` only woke on
    // socket events or its own deadline, this would hang forever — the
    // reactor's user-event channel must be what wakes it.
    let started = Instant::now();
    let waiter = std::thread::spawn(move || listener.accept(&mut reactor, None, &worker));

    std::thread::sleep(Duration::from_millis(50));
    thread_signal(&abort_target, signal_bits::ABORT);

    let result = waiter.join().unwrap();
    assert!(matches!(result, Err(ReactorError::Abort)));
    // S4: within 100ms of the signal (50ms sleep above + slack).
    assert!(started.elapsed() < Duration::from_millis(250), "accept took {:?} to observe ABORT", started.elapsed());
}
