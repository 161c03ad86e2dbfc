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

//! The packet-id-only acknowledgement family: PUBACK, PUBREC, PUBREL,
//! PUBCOMP and UNSUBACK all share one wire shape, a fixed header followed by
//! a 2-byte big-endian packet identifier (remaining length 2).
//!
//! The QoS 1/2 delivery flows these packets belong to are extension points
//! of this engine; the packets themselves are fully recognized, encoded and
//! decoded so a future flow implementation only has to wire them up.

use std::fmt;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use getset::CopyGetters;

use crate::mqtt::packet::packet_type::PacketType;
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

macro_rules! packet_id_only_packet {
    ($(#[$doc:meta])* $name:ident, $packet_type:expr, $json_type:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, CopyGetters)]
        pub struct $name {
            #[getset(get_copy = "pub")]
            packet_id: u16,
        }

        impl $name {
            const REMAINING_LENGTH: u8 = 2;

            pub fn new(packet_id: u16) -> Result<Self, MqttError> {
                if packet_id == 0 {
                    return Err(MqttError::InvalidParam);
                }
                Ok(Self { packet_id })
            }

            pub const fn packet_type() -> PacketType {
                $packet_type
            }

            pub fn size(&self) -> usize {
                4
            }

            pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
                let id = self.packet_id.to_be_bytes();
                stream.write(&[
                    Self::packet_type().to_first_byte(),
                    Self::REMAINING_LENGTH,
                    id[0],
                    id[1],
                ])
            }

            /// Parse the 2-byte packet identifier; the fixed header must
            /// already be consumed.
            pub fn decode(stream: &mut dyn InputStream) -> Result<Self, MqttError> {
                let mut id_be = [0u8; 2];
                stream.read(&mut id_be)?;
                Ok(Self {
                    packet_id: u16::from_be_bytes(id_be),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                let mut state = serializer.serialize_struct(stringify!($name), 2)?;
                state.serialize_field("type", $json_type)?;
                state.serialize_field("packet_id", &self.packet_id)?;
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

packet_id_only_packet!(
    /// MQTT v3.1.1 PUBACK packet (QoS 1 publish acknowledgement)
    Puback,
    PacketType::Puback,
    "puback"
);

packet_id_only_packet!(
    /// MQTT v3.1.1 PUBREC packet (QoS 2 delivery, step 1)
    Pubrec,
    PacketType::Pubrec,
    "pubrec"
);

packet_id_only_packet!(
    /// MQTT v3.1.1 PUBREL packet (QoS 2 delivery, step 2)
    Pubrel,
    PacketType::Pubrel,
    "pubrel"
);

packet_id_only_packet!(
    /// MQTT v3.1.1 PUBCOMP packet (QoS 2 delivery, step 3)
    Pubcomp,
    PacketType::Pubcomp,
    "pubcomp"
);

packet_id_only_packet!(
    /// MQTT v3.1.1 UNSUBACK packet
    Unsuback,
    PacketType::Unsuback,
    "unsuback"
);
