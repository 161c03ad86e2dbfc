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
    PacketHeader, PacketType, Qos, Suback, Subscribe, Unsubscribe,
};
use mqtt_endpoint_core::mqtt::result_code::{MqttError, SubackReturnCode};
use mqtt_endpoint_core::mqtt::stream::BufferInputStream;

#[test]
fn test_subscribe_wire_bytes() {
    common::init_tracing();
    let subscribe = Subscribe::builder()
        .packet_id(1u16)
        .topic("a/b")
        .unwrap()
        .qos(Qos::AtLeastOnce)
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| subscribe.encode(out));
    assert_eq!(
        wire,
        [0x82, 0x08, 0x00, 0x01, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x01]
    );
    assert_eq!(subscribe.size(), wire.len());
}

#[test]
fn test_subscribe_round_trip() {
    common::init_tracing();
    let subscribe = Subscribe::builder()
        .packet_id(77u16)
        .topic("sensors/+/temp")
        .unwrap()
        .qos(Qos::ExactlyOnce)
        .build()
        .unwrap();
    let wire = common::encode_to_vec(|out| subscribe.encode(out));

    let mut stream = BufferInputStream::new(&wire);
    let header = PacketHeader::decode(&mut stream).unwrap();
    assert_eq!(header.packet_type, PacketType::Subscribe);
    assert_eq!(header.flags, 0x02);

    let decoded = Subscribe::decode(&mut stream, 512).unwrap();
    assert_eq!(decoded, subscribe);
}

#[test]
fn test_subscribe_reserved_flags_are_checked() {
    common::init_tracing();
    // SUBSCRIBE with low nibble 0 instead of 0b0010
    let wire = [0x80u8, 0x08, 0x00, 0x01, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x01];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        PacketHeader::decode(&mut stream),
        Err(MqttError::InvalidPacketType)
    );
}

#[test]
fn test_subscribe_invalid_requested_qos() {
    common::init_tracing();
    let wire = [0x00u8, 0x01, 0x00, 0x01, b't', 0x03];
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        Subscribe::decode(&mut stream, 512),
        Err(MqttError::InvalidPacketQos)
    );
}

#[test]
fn test_suback_round_trip_and_failure_sentinel() {
    common::init_tracing();
    for code in [
        SubackReturnCode::SuccessMaximumQos0,
        SubackReturnCode::SuccessMaximumQos1,
        SubackReturnCode::SuccessMaximumQos2,
        SubackReturnCode::Failure,
    ] {
        let suback = Suback::new(9, code).unwrap();
        let wire = common::encode_to_vec(|out| suback.encode(out));
        assert_eq!(wire[..2], [0x90, 0x03]);
        assert_eq!(wire[4], code.as_u8());

        let mut stream = BufferInputStream::new(&wire[2..]);
        let decoded = Suback::decode(&mut stream).unwrap();
        assert_eq!(decoded.packet_id(), 9);
        assert_eq!(decoded.return_code(), code);
    }
}

#[test]
fn test_suback_rejects_other_grant_values() {
    common::init_tracing();
    let wire = [0x00u8, 0x09, 0x03]; // granted QoS 3
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(Suback::decode(&mut stream), Err(MqttError::InvalidPacketQos));
}

#[test]
fn test_unsubscribe_wire_bytes_and_round_trip() {
    common::init_tracing();
    let unsubscribe = Unsubscribe::builder()
        .packet_id(2u16)
        .topic("a/b")
        .unwrap()
        .build()
        .unwrap();

    let wire = common::encode_to_vec(|out| unsubscribe.encode(out));
    assert_eq!(wire, [0xA2, 0x07, 0x00, 0x02, 0x00, 0x03, 0x61, 0x2F, 0x62]);

    let mut stream = BufferInputStream::new(&wire);
    let header = PacketHeader::decode(&mut stream).unwrap();
    assert_eq!(header.packet_type, PacketType::Unsubscribe);
    let decoded = Unsubscribe::decode(&mut stream, 512).unwrap();
    assert_eq!(decoded, unsubscribe);
}

#[test]
fn test_packet_id_zero_is_reserved() {
    common::init_tracing();
    assert!(Subscribe::builder()
        .packet_id(0u16)
        .topic("t")
        .unwrap()
        .build()
        .is_err());
    assert!(Unsubscribe::builder()
        .packet_id(0u16)
        .topic("t")
        .unwrap()
        .build()
        .is_err());
    assert!(Suback::new(0, SubackReturnCode::SuccessMaximumQos0).is_err());
}
