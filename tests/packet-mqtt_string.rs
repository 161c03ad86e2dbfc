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

use mqtt_endpoint_core::mqtt::packet::MqttString;
use mqtt_endpoint_core::mqtt::result_code::MqttError;
use mqtt_endpoint_core::mqtt::stream::BufferInputStream;

#[test]
fn test_wire_layout() {
    common::init_tracing();
    let s = MqttString::new("hi").unwrap();
    assert_eq!(s.as_bytes(), &[0x00, 0x02, b'h', b'i']);
    assert_eq!(s.as_str(), "hi");
    assert_eq!(s.len(), 2);
    assert_eq!(s.size(), 4);
    assert!(!s.is_empty());

    let empty = MqttString::new("").unwrap();
    assert_eq!(empty.as_bytes(), &[0x00, 0x00]);
    assert!(empty.is_empty());
}

#[test]
fn test_round_trip_at_exact_capacity() {
    common::init_tracing();
    let original = MqttString::new("a/b/c").unwrap();
    let wire = common::encode_to_vec(|out| original.encode(out));

    let mut stream = BufferInputStream::new(&wire);
    let decoded = MqttString::decode(&mut stream, original.len()).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_capacity_one_below_fails() {
    common::init_tracing();
    let original = MqttString::new("a/b/c").unwrap();
    let wire = common::encode_to_vec(|out| original.encode(out));

    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        MqttString::decode(&mut stream, original.len() - 1),
        Err(MqttError::MqttStringTooSmall)
    );
}

#[test]
fn test_non_utf8_data_is_rejected() {
    common::init_tracing();
    let wire = [0x00u8, 0x02, 0xC3, 0x28]; // invalid UTF-8 pair
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        MqttString::decode(&mut stream, 16),
        Err(MqttError::InvalidPacketPayload)
    );
}

#[test]
fn test_truncated_data_reports_empty_stream() {
    common::init_tracing();
    let wire = [0x00u8, 0x05, b'a', b'b']; // announces 5 bytes, carries 2
    let mut stream = BufferInputStream::new(&wire);
    assert_eq!(
        MqttString::decode(&mut stream, 16),
        Err(MqttError::InputStreamEmpty)
    );
}

#[test]
fn test_oversized_construction_is_invalid() {
    common::init_tracing();
    let long = "x".repeat(MqttString::MAX_SIZE + 1);
    assert_eq!(MqttString::new(&long), Err(MqttError::InvalidParam));
    // exactly at the limit is fine
    let max = "x".repeat(MqttString::MAX_SIZE);
    assert!(MqttString::new(&max).is_ok());
}

#[test]
fn test_serialize_as_plain_string() {
    common::init_tracing();
    let s = MqttString::new("sensors/temp").unwrap();
    assert_eq!(serde_json::to_string(&s).unwrap(), "\"sensors/temp\"");
    assert_eq!(format!("{s}"), "sensors/temp");
}
