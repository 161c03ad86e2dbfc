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

use mqtt_endpoint_core::mqtt::packet::{PacketHeader, PacketType, Publish, Qos};
use mqtt_endpoint_core::mqtt::result_code::MqttError;
use mqtt_endpoint_core::mqtt::stream::BufferInputStream;

#[test]
fn test_qos0_wire_bytes() {
    common::init_tracing();
    let publish = Publish::builder()
        .topic("t")
        .unwrap()
        .payload(b"hi".as_slice())
        .qos(Qos::AtMostOnce)
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| publish.encode(out));
    assert_eq!(wire, [0x30, 0x05, 0x00, 0x01, 0x74, 0x68, 0x69]);
    assert_eq!(publish.size(), wire.len());
}

#[test]
fn test_qos1_wire_bytes() {
    common::init_tracing();
    let publish = Publish::builder()
        .topic("t")
        .unwrap()
        .payload(b"hi".as_slice())
        .qos(Qos::AtLeastOnce)
        .packet_id(42u16)
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| publish.encode(out));
    assert_eq!(wire, [0x32, 0x07, 0x00, 0x01, 0x74, 0x00, 0x2A, 0x68, 0x69]);
}

#[test]
fn test_decode_qos0_and_qos1() {
    common::init_tracing();
    for wire in [
        vec![0x30u8, 0x05, 0x00, 0x01, 0x74, 0x68, 0x69],
        vec![0x32u8, 0x07, 0x00, 0x01, 0x74, 0x00, 0x2A, 0x68, 0x69],
    ] {
        let mut stream = BufferInputStream::new(&wire);
        let header = PacketHeader::decode(&mut stream).unwrap();
        assert_eq!(header.packet_type, PacketType::Publish);

        let publish =
            Publish::decode(&mut stream, header.flags, header.remaining_length, 512, 1024)
                .unwrap();
        assert_eq!(publish.topic().as_str(), "t");
        assert_eq!(publish.payload(), b"hi");
        assert!(!publish.retain());
        assert!(!publish.dup());
        match publish.qos() {
            Qos::AtMostOnce => assert_eq!(publish.packet_id(), None),
            _ => assert_eq!(publish.packet_id(), Some(42)),
        }
    }
}

#[test]
fn test_flag_bits_round_trip() {
    common::init_tracing();
    let publish = Publish::builder()
        .topic("a/b")
        .unwrap()
        .payload(b"x".as_slice())
        .qos(Qos::ExactlyOnce)
        .packet_id(7u16)
        .retain(true)
        .dup(true)
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| publish.encode(out));
    // DUP | QoS2 | RETAIN
    assert_eq!(wire[0], 0x3D);

    let mut stream = BufferInputStream::new(&wire);
    let header = PacketHeader::decode(&mut stream).unwrap();
    let decoded =
        Publish::decode(&mut stream, header.flags, header.remaining_length, 512, 1024).unwrap();
    assert_eq!(decoded, publish);
}

#[test]
fn test_qos3_is_rejected() {
    common::init_tracing();
    // flag nibble 0b0110 encodes QoS 3
    let wire = [0x00u8, 0x01, 0x74, 0x68, 0x69];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        Publish::decode(&mut stream, 0x06, 5, 512, 1024),
        Err(MqttError::InvalidPacketQos)
    );
}

#[test]
fn test_payload_capacity_is_enforced() {
    common::init_tracing();
    let wire = [0x00u8, 0x01, 0x74, 0x68, 0x69];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        Publish::decode(&mut stream, 0x00, 5, 512, 1),
        Err(MqttError::BufferTooSmall)
    );
}

#[test]
fn test_topic_capacity_is_enforced() {
    common::init_tracing();
    let wire = [0x00u8, 0x04, b't', b'o', b'p', b'c', 0x68];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        Publish::decode(&mut stream, 0x00, 7, 3, 1024),
        Err(MqttError::MqttStringTooSmall)
    );
}

#[test]
fn test_remaining_length_shorter_than_topic_is_malformed() {
    common::init_tracing();
    let wire = [0x00u8, 0x03, b'a', b'b', b'c'];
    let mut stream = BufferInputStream::new(&wire);
    // declared remaining length (2) is less than the consumed topic (5)
    assert_eq!(
        Publish::decode(&mut stream, 0x00, 2, 512, 1024),
        Err(MqttError::InvalidPacketSize)
    );
}

#[test]
fn test_builder_packet_id_rules() {
    common::init_tracing();
    // QoS > 0 requires a non-zero packet id
    assert_eq!(
        Publish::builder()
            .topic("t")
            .unwrap()
            .qos(Qos::AtLeastOnce)
            .build()
            .unwrap_err(),
        MqttError::InvalidParam
    );
    // QoS 0 must not carry one
    assert_eq!(
        Publish::builder()
            .topic("t")
            .unwrap()
            .qos(Qos::AtMostOnce)
            .packet_id(5u16)
            .build()
            .unwrap_err(),
        MqttError::InvalidParam
    );
}
