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

mod common;

use mqtt_endpoint_core::mqtt::packet::{
    Connect, ConnectLimits, Credentials, PacketHeader, PacketType, Qos, Will,
};
use mqtt_endpoint_core::mqtt::result_code::MqttError;
use mqtt_endpoint_core::mqtt::stream::BufferInputStream;

#[test]
fn test_minimal_connect_wire_bytes() {
    common::init_tracing();
    let connect = Connect::builder()
        .client_id("abc")
        .unwrap()
        .clean_session(true)
        .keepalive(60u16)
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| connect.encode(out));
    assert_eq!(
        wire,
        [
            0x10, 0x0F, // CONNECT, remaining length 15
            0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, // "MQTT"
            0x04, // protocol level
            0x02, // clean session
            0x00, 0x3C, // keepalive 60
            0x00, 0x03, 0x61, 0x62, 0x63, // "abc"
        ]
    );
    assert_eq!(connect.size(), wire.len());
}

#[test]
fn test_round_trip_with_will_and_credentials() {
    common::init_tracing();
    let connect = Connect::builder()
        .client_id("dev-42")
        .unwrap()
        .clean_session(true)
        .keepalive(30u16)
        .will(Will::new("state/dev-42", b"offline", Qos::AtLeastOnce, true).unwrap())
        .credentials(Credentials::new("user", Some(b"secret")).unwrap())
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| connect.encode(out));

    let mut stream = BufferInputStream::new(&wire);
    let header = PacketHeader::decode(&mut stream).unwrap();
    assert_eq!(header.packet_type, PacketType::Connect);
    assert_eq!(header.remaining_length as usize, wire.len() - 2);

    let decoded = Connect::decode(&mut stream, &ConnectLimits::default()).unwrap();
    assert_eq!(decoded, connect);
    assert_eq!(decoded.keepalive(), 30);
    assert!(decoded.clean_session());
    let will = decoded.will().as_ref().unwrap();
    assert_eq!(will.topic.as_str(), "state/dev-42");
    assert_eq!(will.message, b"offline");
    assert_eq!(will.qos, Qos::AtLeastOnce);
    assert!(will.retain);
    let credentials = decoded.credentials().as_ref().unwrap();
    assert_eq!(credentials.username.as_str(), "user");
    assert_eq!(credentials.password.as_deref(), Some(b"secret".as_slice()));
}

#[test]
fn test_wrong_protocol_name_is_rejected() {
    common::init_tracing();
    let wire = [
        0x00u8, 0x04, b'M', b'Q', b'X', b'X', 0x04, 0x02, 0x00, 0x3C, 0x00, 0x03, b'a', b'b',
        b'c',
    ];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        Connect::decode(&mut stream, &ConnectLimits::default()),
        Err(MqttError::InvalidProtocolName)
    );
}

#[test]
fn test_wrong_protocol_level_is_rejected() {
    common::init_tracing();
    let wire = [
        0x00u8, 0x04, b'M', b'Q', b'T', b'T', 0x05, 0x02, 0x00, 0x3C, 0x00, 0x03, b'a', b'b',
        b'c',
    ];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        Connect::decode(&mut stream, &ConnectLimits::default()),
        Err(MqttError::InvalidProtocolName)
    );
}

#[test]
fn test_client_id_capacity_is_enforced() {
    common::init_tracing();
    let connect = Connect::builder()
        .client_id("much-too-long-for-the-broker")
        .unwrap()
        .build()
        .unwrap();
    let wire = common::encode_to_vec(|out| connect.encode(out));

    let limits = ConnectLimits {
        max_client_id_length: 8,
        ..ConnectLimits::default()
    };
    let mut stream = BufferInputStream::new(&wire[2..]); // skip fixed header
    assert_eq!(
        Connect::decode(&mut stream, &limits),
        Err(MqttError::MqttStringTooSmall)
    );
}

#[test]
fn test_will_message_capacity_is_enforced() {
    common::init_tracing();
    let connect = Connect::builder()
        .client_id("dev")
        .unwrap()
        .will(Will::new("t", &[0u8; 64], Qos::AtMostOnce, false).unwrap())
        .build()
        .unwrap();
    let wire = common::encode_to_vec(|out| connect.encode(out));

    let limits = ConnectLimits {
        max_will_message_size: 32,
        ..ConnectLimits::default()
    };
    let mut stream = BufferInputStream::new(&wire[2..]);
    assert_eq!(
        Connect::decode(&mut stream, &limits),
        Err(MqttError::BufferTooSmall)
    );
}

#[test]
fn test_builder_requires_client_id() {
    common::init_tracing();
    assert_eq!(
        Connect::builder().keepalive(10u16).build().unwrap_err(),
        MqttError::InvalidParam
    );
}
