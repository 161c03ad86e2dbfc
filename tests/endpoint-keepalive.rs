// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Client timing behavior against a scripted test-side broker: a raw
//! `TcpListener` owned by the test stands in for the peer so the exact
//! bytes on the wire can be observed.

mod common;

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mqtt_endpoint_core::mqtt::endpoint::{ClientEventHandler, ClientState, MqttClient};
use mqtt_endpoint_core::mqtt::result_code::ConnackReturnCode;

#[derive(Default)]
struct Events {
    connected: AtomicBool,
    refused: Mutex<Vec<ConnackReturnCode>>,
    lost: AtomicBool,
}

struct Handler(Arc<Events>);

impl ClientEventHandler for Handler {
    fn on_connect(&mut self, connected: bool, return_code: ConnackReturnCode) {
        if connected {
            self.0.connected.store(true, Ordering::SeqCst);
        } else {
            self.0.refused.lock().unwrap().push(return_code);
        }
    }

    fn on_disconnect(&mut self, expected: bool) {
        if !expected {
            self.0.lost.store(true, Ordering::SeqCst);
        }
    }
}

fn scripted_client(keepalive: u16) -> (MqttClient, Arc<Events>, TcpListener) {
    let events = Arc::new(Events::default());
    let mut client = MqttClient::new(common::fast_client_config());
    client.set_client_id("timing").unwrap();
    client.set_keepalive(keepalive).unwrap();
    client.set_handler(Box::new(Handler(events.clone()))).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    (client, events, listener)
}

/// Accept the client and consume its CONNECT (fixed header + body).
fn accept_and_read_connect(listener: &TcpListener, client: &mut MqttClient) -> TcpStream {
    listener.set_nonblocking(true).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    let socket = loop {
        client.task().unwrap();
        match listener.accept() {
            Ok((socket, _)) => break socket,
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                assert!(Instant::now() < deadline, "client never connected");
            }
            Err(e) => panic!("accept failed: {e}"),
        }
    };
    socket
        .set_read_timeout(Some(Duration::from_millis(10)))
        .unwrap();

    let mut header = [0u8; 2];
    read_exact_driving(&socket, client, &mut header);
    assert_eq!(header[0], 0x10, "expected CONNECT");
    let mut body = vec![0u8; header[1] as usize]; // test frames stay short
    read_exact_driving(&socket, client, &mut body);
    socket
}

/// Blocking-ish read that keeps the client's task loop turning.
fn read_exact_driving(mut socket: &TcpStream, client: &mut MqttClient, buf: &mut [u8]) {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut done = 0;
    while done < buf.len() {
        client.task().unwrap();
        match socket.read(&mut buf[done..]) {
            Ok(0) => panic!("client closed the connection"),
            Ok(n) => done += n,
            Err(ref e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => panic!("read failed: {e}"),
        }
        assert!(Instant::now() < deadline, "wire went quiet");
    }
}

#[test]
fn test_single_pingreq_after_one_keepalive_period() {
    common::init_tracing();
    let (mut client, events, listener) = scripted_client(1);
    let port = listener.local_addr().unwrap().port();
    client.connect("127.0.0.1", port).unwrap();

    let mut socket = accept_and_read_connect(&listener, &mut client);
    socket.write_all(&[0x20, 0x02, 0x00, 0x00]).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !events.connected.load(Ordering::SeqCst) {
        client.task().unwrap();
        assert!(Instant::now() < deadline, "CONNACK not processed");
    }

    // silence for 1.6 keepalive periods: exactly one PINGREQ may appear
    let silence_start = Instant::now();
    let mut received = Vec::new();
    while silence_start.elapsed() < Duration::from_millis(1600) {
        client.task().unwrap();
        let mut chunk = [0u8; 16];
        match (&socket).read(&mut chunk) {
            Ok(0) => panic!("client closed the connection"),
            Ok(n) => received.extend_from_slice(&chunk[..n]),
            Err(ref e)
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => panic!("read failed: {e}"),
        }
    }
    assert_eq!(received, [0xC0, 0x00], "expected exactly one PINGREQ");
    // answer it so the connection stays healthy
    socket.write_all(&[0xD0, 0x00]).unwrap();
    client.task().unwrap();
    assert_eq!(client.state(), ClientState::MqttConnected);
}

#[test]
fn test_refused_connack_reports_both_events() {
    common::init_tracing();
    let (mut client, events, listener) = scripted_client(0);
    let port = listener.local_addr().unwrap().port();
    client.connect("127.0.0.1", port).unwrap();

    let mut socket = accept_and_read_connect(&listener, &mut client);
    socket.write_all(&[0x20, 0x02, 0x00, 0x05]).unwrap(); // NotAuthorized

    let deadline = Instant::now() + Duration::from_secs(5);
    while client.state() != ClientState::Disconnected {
        client.task().unwrap();
        assert!(Instant::now() < deadline, "refusal not processed");
    }

    // the refusal itself, then the teardown notification
    let refused = events.refused.lock().unwrap();
    assert_eq!(
        *refused,
        [
            ConnackReturnCode::NotAuthorized,
            ConnackReturnCode::Disconnected
        ]
    );
    assert!(!events.connected.load(Ordering::SeqCst));
}

#[test]
fn test_missing_connack_times_out() {
    common::init_tracing();
    let (mut client, events, listener) = scripted_client(0);
    client.set_broker_response_timeout(200).unwrap();
    let port = listener.local_addr().unwrap().port();
    client.connect("127.0.0.1", port).unwrap();

    // accept, swallow the CONNECT, never answer
    let _socket = accept_and_read_connect(&listener, &mut client);

    let deadline = Instant::now() + Duration::from_secs(5);
    while client.state() != ClientState::Disconnected {
        client.task().unwrap();
        assert!(Instant::now() < deadline, "response timer never fired");
    }
    assert_eq!(
        *events.refused.lock().unwrap(),
        [ConnackReturnCode::Disconnected]
    );
}

#[test]
fn test_broker_eof_while_connected_is_unexpected_disconnect() {
    common::init_tracing();
    let (mut client, events, listener) = scripted_client(0);
    let port = listener.local_addr().unwrap().port();
    client.connect("127.0.0.1", port).unwrap();

    let mut socket = accept_and_read_connect(&listener, &mut client);
    socket.write_all(&[0x20, 0x02, 0x00, 0x00]).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while !events.connected.load(Ordering::SeqCst) {
        client.task().unwrap();
        assert!(Instant::now() < deadline, "CONNACK not processed");
    }

    drop(socket);
    let deadline = Instant::now() + Duration::from_secs(5);
    while !events.lost.load(Ordering::SeqCst) {
        client.task().unwrap();
        assert!(Instant::now() < deadline, "EOF not noticed");
    }
    assert_eq!(client.state(), ClientState::Disconnected);
}
