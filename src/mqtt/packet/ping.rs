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

//! The zero-length packet family: PINGREQ, PINGRESP and DISCONNECT carry no
//! variable header and no payload. Their remaining length must equal 0; any
//! other value is rejected as `InvalidPacketSize`.

use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::mqtt::packet::packet_type::PacketType;
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::OutputStream;

macro_rules! zero_length_packet {
    ($(#[$doc:meta])* $name:ident, $packet_type:expr, $json_type:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name;

        impl $name {
            pub fn new() -> Self {
                Self
            }

            pub const fn packet_type() -> PacketType {
                $packet_type
            }

            pub fn size(&self) -> usize {
                2
            }

            pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
                stream.write(&[Self::packet_type().to_first_byte(), 0])
            }

            /// Validate the remaining length taken from the fixed header;
            /// there is nothing else to read.
            pub fn decode(remaining_length: u32) -> Result<Self, MqttError> {
                if remaining_length != 0 {
                    return Err(MqttError::InvalidPacketSize);
                }
                Ok(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut state = serializer.serialize_struct(stringify!($name), 1)?;
                state.serialize_field("type", $json_type)?;
                state.end()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match serde_json::to_string(self) {
                    Ok(json) => write!(f, "{json}"),
                    Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self, f)
            }
        }
    };
}

zero_length_packet!(
    /// MQTT v3.1.1 PINGREQ packet (keep-alive probe)
    Pingreq,
    PacketType::Pingreq,
    "pingreq"
);

zero_length_packet!(
    /// MQTT v3.1.1 PINGRESP packet (keep-alive answer)
    Pingresp,
    PacketType::Pingresp,
    "pingresp"
);

zero_length_packet!(
    /// MQTT v3.1.1 DISCONNECT packet (graceful connection end)
    Disconnect,
    PacketType::Disconnect,
    "disconnect"
);
