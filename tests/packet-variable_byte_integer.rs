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

use mqtt_endpoint_core::mqtt::packet::VariableByteInteger;
use mqtt_endpoint_core::mqtt::result_code::MqttError;
use mqtt_endpoint_core::mqtt::stream::BufferInputStream;

#[test]
fn test_encode_decode_boundary_values() {
    common::init_tracing();
    // each boundary value with its expected wire form and width
    let test_cases = [
        (0u32, vec![0x00u8]),
        (127, vec![0x7F]),
        (128, vec![0x80, 0x01]),
        (16383, vec![0xFF, 0x7F]),
        (16384, vec![0x80, 0x80, 0x01]),
        (2097151, vec![0xFF, 0xFF, 0x7F]),
        (2097152, vec![0x80, 0x80, 0x80, 0x01]),
        (268435455, vec![0xFF, 0xFF, 0xFF, 0x7F]),
    ];

    for (value, expected_wire) in test_cases {
        let vbi = VariableByteInteger::new(value).unwrap();
        assert_eq!(vbi.size(), expected_wire.len(), "width of {value}");

        let wire = common::encode_to_vec(|out| vbi.encode(out));
        assert_eq!(wire, expected_wire, "encoding of {value}");

        let mut stream = BufferInputStream::new(&wire);
        let decoded = VariableByteInteger::decode(&mut stream).unwrap();
        assert_eq!(decoded.value(), value);
        assert_eq!(decoded, vbi);
    }
}

#[test]
fn test_encode_too_large_value() {
    common::init_tracing();
    assert_eq!(VariableByteInteger::MAX, 268435455);
    assert!(VariableByteInteger::new(268435456).is_none()); // 1 over the max
    assert_eq!(
        VariableByteInteger::try_from(268435456u32),
        Err(MqttError::InvalidPacketSize)
    );
}

#[test]
fn test_decode_fifth_byte_is_malformed() {
    common::init_tracing();
    let bytes = [0x80u8, 0x80, 0x80, 0x80, 0x01];
    let mut stream = BufferInputStream::new(&bytes);
    assert_eq!(
        VariableByteInteger::decode(&mut stream),
        Err(MqttError::InvalidPacketSize)
    );
}

#[test]
fn test_decode_starved_stream() {
    common::init_tracing();
    // continuation bit set but no terminating byte available
    let bytes = [0x80u8, 0x80];
    let mut stream = BufferInputStream::new(&bytes);
    assert_eq!(
        VariableByteInteger::decode(&mut stream),
        Err(MqttError::InputStreamEmpty)
    );
}

#[test]
fn test_serde_round_trip_validates() {
    common::init_tracing();
    let vbi = VariableByteInteger::new(12345).unwrap();
    assert_eq!(serde_json::to_string(&vbi).unwrap(), "12345");
    assert_eq!(
        serde_json::from_str::<VariableByteInteger>("12345").unwrap(),
        vbi
    );
    // values over the encodable range are rejected on deserialize too
    assert!(serde_json::from_str::<VariableByteInteger>("268435456").is_err());
}

#[test]
fn test_display() {
    common::init_tracing();
    let vbi = VariableByteInteger::new(42).unwrap();
    assert_eq!(format!("{vbi}"), "42");
}
