//! End-to-end exercise of every core component together: a server thread
//! accepts one connection and echoes back an arithmetic result, a client
//! thread connects, sends a request, and checks the response — the same
//! shape `demos/arithmetic` implements as a real binary.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use ptk::buffer::{Buffer, Cursor, CursorMut};
use ptk::codec::{CRC8_ARITHMETIC, CRC16_MODBUS, Endian, Field, FieldMut, decode_framed, encode_framed};
use ptk::reactor::{Reactor, TcpListener, TcpSocket};
use ptk::runtime::{ThreadConfig, ThreadHandle, thread_create, thread_set_run, thread_start, thread_wait};

const ADD: u8 = 1;

fn deadline(ms: u64) -> Option<Instant> {
    Some(Instant::now() + Duration::from_millis(ms))
}

fn encode_request(op: u8, a: f32, b: f32) -> Buffer {
    let mut scratch = [0u8; 32];
    let written = {
        let mut cursor = CursorMut::new(&mut scratch);
        let before = cursor.len();
        encode_framed(&mut cursor, Endian::Big, &[Field::U8(op), Field::F32(a), Field::F32(b)], CRC16_MODBUS).unwrap();
        before - cursor.len()
    };
    Buffer::from_vec(scratch[..written].to_vec())
}

fn decode_response(bytes: &[u8]) -> (u8, f64) {
    let mut op = 0u8;
    let mut result = 0.0f64;
    let mut cursor = Cursor::new(bytes);
    decode_framed(&mut cursor, Endian::Little, &mut [FieldMut::U8(&mut op), FieldMut::F64(&mut result)], CRC8_ARITHMETIC)
        .unwrap();
    (op, result)
}

fn encode_response(op: u8, result: f64) -> Buffer {
    let mut scratch = [0u8; 32];
    let written = {
        let mut cursor = CursorMut::new(&mut scratch);
        let before = cursor.len();
        encode_framed(&mut cursor, Endian::Little, &[Field::U8(op), Field::F64(result)], CRC8_ARITHMETIC).unwrap();
        before - cursor.len()
    };
    Buffer::from_vec(scratch[..written].to_vec())
}

#[test]
fn client_server_arithmetic_round_trip() {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut server_reactor = Reactor::new().unwrap();
    let mut listener = TcpListener::bind(addr, 16).unwrap();
    let bound_addr = listener.local_addr().unwrap();

    let parent = thread_create(None);
    let server = thread_create(Some(&parent));
    thread_set_run(&server, move |handle: &ThreadHandle| {
        let (mut conn, _peer) = listener.accept(&mut server_reactor, deadline(2000), handle).unwrap();

        let mut inbound = Buffer::allocate(64);
        conn.recv(&mut server_reactor, &mut inbound, deadline(2000), handle).unwrap();

        let mut op = 0u8;
        let mut a = 0f32;
        let mut b = 0f32;
        let mut cursor = inbound.cursor();
        decode_framed(&mut cursor, Endian::Big, &mut [FieldMut::U8(&mut op), FieldMut::F32(&mut a), FieldMut::F32(&mut b)], CRC16_MODBUS)
            .unwrap();
        assert_eq!(op, ADD);

        let result = f64::from(a) + f64::from(b);
        let inverted_op = !op;
        let mut outbound = encode_response(inverted_op, result);
        conn.send(&mut server_reactor, &mut outbound, deadline(2000), handle).unwrap();
    })
    .unwrap();
    thread_start(&server, ThreadConfig::default()).unwrap();

    let mut client_reactor = Reactor::new().unwrap();
    let abort = thread_create(None);
    let mut client = TcpSocket::connect(&mut client_reactor, bound_addr, deadline(2000), &abort).unwrap();

    let mut request = encode_request(ADD, 5.0, 3.0);
    client.send(&mut client_reactor, &mut request, deadline(2000), &abort).unwrap();

    let mut response_buf = Buffer::allocate(64);
    client.recv(&mut client_reactor, &mut response_buf, deadline(2000), &abort).unwrap();
    let (op, result) = decode_response(response_buf.as_read_slice());

    assert_eq!(op, 0xFE);
    assert_eq!(result, 8.0);

    thread_wait(&server, Duration::from_secs(2));
}
