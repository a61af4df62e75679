use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ptk_buffer::Buffer;
use ptk_reactor::{Reactor, ReactorError, TcpListener, TcpSocket};
use ptk_runtime::thread_create;

fn deadline(ms: u64) -> Option<Instant> {
    Some(Instant::now() + Duration::from_millis(ms))
}

#[test]
fn connect_send_recv_round_trip() {
    let mut server_reactor = Reactor::new().unwrap();
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener_local_addr(&mut listener, &mut server_reactor);

    let mut client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();

    let (mut server_side, _peer) = listener.accept(&mut server_reactor, deadline(2000), &abort).unwrap();

    let mut out = Buffer::allocate(64);
    out.write(b"hello reactor").unwrap();
    client.send(&mut client_reactor, &mut out, deadline(2000), &abort).unwrap();

    let mut inbound = Buffer::allocate(64);
    server_side.recv(&mut server_reactor, &mut inbound, deadline(2000), &abort).unwrap();
    assert_eq!(inbound.as_read_slice(), b"hello reactor");
}

#[test]
fn recv_returns_closed_when_peer_shuts_down() {
    let mut server_reactor = Reactor::new().unwrap();
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener_local_addr(&mut listener, &mut server_reactor);

    let mut client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();
    let (mut server_side, _peer) = listener.accept(&mut server_reactor, deadline(2000), &abort).unwrap();

    client.close(&mut client_reactor);

    let mut inbound = Buffer::allocate(64);
    let err = server_side.recv(&mut server_reactor, &mut inbound, deadline(2000), &abort).unwrap_err();
    assert!(matches!(err, ReactorError::Closed));
}

#[test]
fn connect_to_closed_port_is_refused() {
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    // bind and immediately drop to get a port nothing is listening on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = TcpSocket::connect(&mut client_reactor, addr, deadline(2000), &abort).unwrap_err();
    assert!(matches!(err, ReactorError::ConnectionRefused | ReactorError::NetworkError(_)));
}

#[test]
fn recv_times_out_when_nothing_arrives() {
    let mut server_reactor = Reactor::new().unwrap();
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener_local_addr(&mut listener, &mut server_reactor);

    let _client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();
    let (mut server_side, _peer) = listener.accept(&mut server_reactor, deadline(2000), &abort).unwrap();

    let mut inbound = Buffer::allocate(64);
    let err = server_side.recv(&mut server_reactor, &mut inbound, deadline(100), &abort).unwrap_err();
    assert!(matches!(err, ReactorError::Timeout));
}

#[test]
fn timer_fires_while_waiting_on_idle_socket() {
    let mut server_reactor = Reactor::new().unwrap();
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener_local_addr(&mut listener, &mut server_reactor);

    let _client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();
    let (mut server_side, _peer) = listener.accept(&mut server_reactor, deadline(2000), &abort).unwrap();

    let _timer = server_reactor.start_oneshot(Duration::from_millis(50), || {});
    let started = Instant::now();
    let mut inbound = Buffer::allocate(64);
    // the deadline is generous; the timer firing must not make recv return
    // early with a bogus result, only the eventual timeout or data should.
    let err = server_side.recv(&mut server_reactor, &mut inbound, deadline(200), &abort).unwrap_err();
    assert!(matches!(err, ReactorError::Timeout));
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[test]
fn periodic_timer_callback_fires_between_blocking_recvs() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut server_reactor = Reactor::new().unwrap();
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener_local_addr(&mut listener, &mut server_reactor);

    let _client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();
    let (mut server_side, _peer) = listener.accept(&mut server_reactor, deadline(2000), &abort).unwrap();

    let fires = Arc::new(AtomicUsize::new(0));
    let counter = fires.clone();
    server_reactor.start_periodic(Duration::from_millis(100), move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Nobody ever sends, so every `recv` below blocks for its full 60ms
    // deadline and returns `Timeout` — `reactor_wait`'s poll loop still runs
    // `timers.expire()` on every wakeup in between, per S6.
    let started = Instant::now();
    for _ in 0..10 {
        let mut inbound = Buffer::allocate(64);
        let _ = server_side.recv(&mut server_reactor, &mut inbound, deadline(60), &abort);
    }
    let elapsed = started.elapsed();

    let observed = fires.load(Ordering::SeqCst);
    let floor = (elapsed.as_millis() / 100) as usize;
    let ceil = elapsed.as_millis().div_ceil(100) as usize + 1;
    assert!(observed >= floor, "observed {observed} fires, expected at least {floor}");
    assert!(observed <= ceil, "observed {observed} fires, expected at most {ceil}");
}

#[test]
fn set_buffer_size_does_not_disturb_a_live_connection() {
    let mut server_reactor = Reactor::new().unwrap();
    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);

    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener_local_addr(&mut listener, &mut server_reactor);

    let mut client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();
    client.set_buffer_size(1 << 16);
    let (mut server_side, _peer) = listener.accept(&mut server_reactor, deadline(2000), &abort).unwrap();
    server_side.set_buffer_size(1 << 16);

    let mut out = Buffer::allocate(64);
    out.write(b"still works").unwrap();
    client.send(&mut client_reactor, &mut out, deadline(2000), &abort).unwrap();

    let mut inbound = Buffer::allocate(64);
    server_side.recv(&mut server_reactor, &mut inbound, deadline(2000), &abort).unwrap();
    assert_eq!(inbound.as_read_slice(), b"still works");
}

fn listener_local_addr(listener: &mut TcpListener, _reactor: &mut Reactor) -> SocketAddr {
    listener.local_addr().unwrap()
}
