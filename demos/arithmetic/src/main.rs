//! Arithmetic client/server: an external collaborator over PTK, not part of
//! the toolkit itself. It owns the one thing the core explicitly doesn't —
//! argument parsing — and fills a [`ptk::ToolkitConfig`] by hand before
//! handing control to the runtime.
//!
//! ```text
//! ptk-arithmetic server 127.0.0.1:12345
//! ptk-arithmetic client 127.0.0.1:12345 add 5 3
//! ```

mod protocol;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use ptk::buffer::Buffer;
use ptk::reactor::{Reactor, ReactorError, TcpListener, TcpSocket};
use ptk::runtime::{
    ThreadConfig, ThreadHandle, install_interrupt_bridge, signal_bits, thread_cleanup_dead_children, thread_create,
    thread_set_run, thread_signal_all_children, thread_start, thread_wait,
};
use protocol::{Op, Request, Response, RESPONSE_WIRE_LEN};
use tracing::{error, info, warn};

struct Args {
    role: Role,
}

enum Role {
    Server { addr: SocketAddr },
    Client { addr: SocketAddr, op: Op, a: f64, b: f64 },
    Help,
}

fn parse_args() -> Option<Args> {
    let mut argv = std::env::args().skip(1);
    match argv.next().as_deref() {
        Some("server") => {
            let addr = argv.next()?.parse().ok()?;
            Some(Args { role: Role::Server { addr } })
        }
        Some("client") => {
            let addr: SocketAddr = argv.next()?.parse().ok()?;
            let op = Op::parse(&argv.next()?)?;
            let a: f64 = argv.next()?.parse().ok()?;
            let b: f64 = argv.next()?.parse().ok()?;
            Some(Args { role: Role::Client { addr, op, a, b } })
        }
        Some("-h" | "--help") | None => Some(Args { role: Role::Help }),
        _ => None,
    }
}

fn print_usage() {
    println!("usage:");
    println!("  ptk-arithmetic server <listen-addr>");
    println!("  ptk-arithmetic client <server-addr> <add|sub|mul|div> <a> <b>");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let Some(args) = parse_args() else {
        print_usage();
        return ExitCode::from(1);
    };

    match args.role {
        Role::Help => {
            print_usage();
            ExitCode::SUCCESS
        }
        Role::Server { addr } => run_server(addr),
        Role::Client { addr, op, a, b } => run_client(addr, op, a, b),
    }
}

fn run_server(addr: SocketAddr) -> ExitCode {
    let config = ptk::ToolkitConfig::default();

    let mut listener = match TcpListener::bind(addr, 128) {
        Ok(l) => l,
        Err(err) => {
            error!(%err, "failed to bind arithmetic server");
            return ExitCode::from(1);
        }
    };
    let bound = listener.local_addr().unwrap_or(addr);
    info!(%bound, "arithmetic server listening");

    let root = thread_create(None);
    if let Err(err) = install_interrupt_bridge(&root) {
        warn!(%err, "interrupt bridge already installed; continuing without it");
    }

    let server = thread_create(Some(&root));
    let run_result = thread_set_run(&server, move |handle: &ThreadHandle| {
        serve_forever(&mut listener, handle, config.timer_resolution_floor());
    });
    if run_result.is_err() {
        error!("failed to bind server run function");
        return ExitCode::from(1);
    }
    if thread_start(&server, ThreadConfig::default()).is_err() {
        error!("failed to start server thread");
        return ExitCode::from(1);
    }

    // Blocks until SIGINT/SIGTERM/SIGHUP is bridged to ABORT on `root`, then
    // fans that out to the server child and waits for it to unwind out of
    // its accept loop before the process exits.
    loop {
        if thread_wait(&root, Duration::from_secs(3600)) == ptk::runtime::WaitResult::Signal {
            break;
        }
    }
    thread_signal_all_children(&root, signal_bits::ABORT);
    thread_cleanup_dead_children(&root, Duration::from_secs(5));
    ExitCode::SUCCESS
}

fn serve_forever(listener: &mut TcpListener, handle: &ThreadHandle, health_period: Duration) {
    let Ok(mut reactor) = Reactor::new() else {
        error!("failed to create server reactor");
        return;
    };
    reactor.start_periodic(health_period, || {
        tracing::trace!("arithmetic server heartbeat");
    });

    loop {
        if handle.has_signal(signal_bits::ABORT) {
            info!("server observed ABORT, shutting down");
            return;
        }
        let deadline = Some(Instant::now() + Duration::from_millis(500));
        match listener.accept(&mut reactor, deadline, handle) {
            Ok((conn, peer)) => {
                info!(%peer, "accepted connection");
                serve_one(conn, &mut reactor, handle, peer);
            }
            Err(ReactorError::Timeout) => continue,
            Err(ReactorError::Abort) => {
                info!("accept aborted, shutting down");
                return;
            }
            Err(err) => {
                warn!(%err, "accept failed");
            }
        }
    }
}

fn serve_one(mut conn: TcpSocket, reactor: &mut Reactor, handle: &ThreadHandle, peer: SocketAddr) {
    let mut inbound = Buffer::allocate(64);
    let deadline = Some(Instant::now() + Duration::from_secs(5));
    if let Err(err) = conn.recv(reactor, &mut inbound, deadline, handle) {
        warn!(%peer, %err, "request recv failed");
        return;
    }

    let request = match Request::decode(inbound.as_read_slice()) {
        Ok(req) => req,
        Err(err) => {
            warn!(%peer, %err, "malformed arithmetic request");
            return;
        }
    };

    let result = request.op.apply(f64::from(request.a), f64::from(request.b));
    let response = Response::for_request(&request, result);

    let mut scratch = [0u8; RESPONSE_WIRE_LEN];
    let written = match response.encode(&mut scratch) {
        Ok(n) => n,
        Err(err) => {
            error!(%err, "failed to encode response");
            return;
        }
    };
    let mut outbound = Buffer::from_vec(scratch[..written].to_vec());

    if let Err(err) = conn.send(reactor, &mut outbound, deadline, handle) {
        warn!(%peer, %err, "response send failed");
        return;
    }
    conn.close(reactor);
}

fn run_client(addr: SocketAddr, op: Op, a: f64, b: f64) -> ExitCode {
    let Ok(mut reactor) = Reactor::new() else {
        error!("failed to create client reactor");
        return ExitCode::from(1);
    };
    let abort = thread_create(None);
    let deadline = Some(Instant::now() + Duration::from_secs(5));

    let mut conn = match TcpSocket::connect(&mut reactor, addr, deadline, &abort) {
        Ok(c) => c,
        Err(err) => {
            error!(%err, "connect failed");
            return ExitCode::from(1);
        }
    };

    let request = Request { op, a: a as f32, b: b as f32 };
    let mut scratch = [0u8; protocol::REQUEST_WIRE_LEN];
    let written = match request.encode(&mut scratch) {
        Ok(n) => n,
        Err(err) => {
            error!(%err, "failed to encode request");
            return ExitCode::from(1);
        }
    };
    let mut outbound = Buffer::from_vec(scratch[..written].to_vec());
    if let Err(err) = conn.send(&mut reactor, &mut outbound, deadline, &abort) {
        error!(%err, "send failed");
        return ExitCode::from(1);
    }

    let mut inbound = Buffer::allocate(64);
    if let Err(err) = conn.recv(&mut reactor, &mut inbound, deadline, &abort) {
        error!(%err, "recv failed");
        return ExitCode::from(1);
    }

    match Response::decode(inbound.as_read_slice()) {
        Ok(response) => {
            println!("result = {}", response.result);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "malformed arithmetic response");
            ExitCode::from(1)
        }
    }
}
