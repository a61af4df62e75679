use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ptk_buffer::Buffer;
use ptk_reactor::{Reactor, ReactorError, UdpSocket};
use ptk_runtime::thread_create;

fn deadline(ms: u64) -> Option<Instant> {
    Some(Instant::now() + Duration::from_millis(ms))
}

#[test]
fn send_to_and_recv_from_round_trip() {
    let mut reactor_a = Reactor::new().unwrap();
    let mut reactor_b = Reactor::new().unwrap();
    let abort = thread_create(None);

    let mut a = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let mut b = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let b_addr = b.local_addr().unwrap();

    a.send_to(&mut reactor_a, b"ping", b_addr, false, deadline(2000), &abort).unwrap();

    let mut inbound = Buffer::allocate(64);
    let (n, _from) = b.recv_from(&mut reactor_b, &mut inbound, deadline(2000), &abort).unwrap();
    assert_eq!(n, 4);
    assert_eq!(inbound.as_read_slice(), b"ping");
}

#[test]
fn recv_from_drains_a_burst_of_datagrams_until_would_block() {
    let mut reactor_a = Reactor::new().unwrap();
    let mut reactor_b = Reactor::new().unwrap();
    let abort = thread_create(None);

    let mut a = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let mut b = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let b_addr = b.local_addr().unwrap();

    for i in 0..5u8 {
        a.send_to(&mut reactor_a, &[i], b_addr, false, deadline(2000), &abort).unwrap();
    }

    // give the kernel a moment to queue every datagram before we drain.
    std::thread::sleep(Duration::from_millis(50));

    let mut received = 0;
    loop {
        let mut inbound = Buffer::allocate(8);
        let zero_wait = Some(Instant::now());
        match b.recv_from(&mut reactor_b, &mut inbound, zero_wait, &abort) {
            Ok(_) => received += 1,
            Err(ReactorError::Timeout) => break,
            Err(other) => panic!("unexpected error draining burst: {other}"),
        }
    }
    assert_eq!(received, 5);
}

#[test]
fn recv_from_times_out_with_nothing_queued() {
    let mut reactor_b = Reactor::new().unwrap();
    let abort = thread_create(None);
    let mut b = UdpSocket::bind("127.0.0.1:0".parse().unwrap()).unwrap();

    let mut inbound = Buffer::allocate(64);
    let err = b.recv_from(&mut reactor_b, &mut inbound, deadline(100), &abort).unwrap_err();
    assert!(matches!(err, ReactorError::Timeout));
}
