use num_enum::TryFromPrimitive;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
/**
 * MIT License
 *
 * Copyright (c) 2025 Takatoshi Kondo
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use std::fmt;

use crate::mqtt::packet::variable_byte_integer::VariableByteInteger;
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::InputStream;

/// Header value required in the low nibble of SUBSCRIBE and UNSUBSCRIBE.
pub(crate) const SUB_UNSUBSCRIBE_FLAGS: u8 = 0b0010;

/// MQTT v3.1.1 Control Packet Type enumeration
///
/// The fourteen packet types defined by the MQTT 3.1.1 specification,
/// corresponding to bits 7-4 of the fixed header's first byte. Each variant
/// maps to its numeric value as defined in the protocol.
///
/// # Examples
///
/// ```ignore
/// use mqtt_endpoint_core::mqtt::packet::PacketType;
///
/// let packet_type = PacketType::Connect;
/// assert_eq!(packet_type.as_u8(), 1);
/// assert_eq!(packet_type.as_str(), "connect");
/// ```
#[derive(Deserialize, PartialEq, Eq, Copy, Clone, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum PacketType {
    /// Client connection request packet
    Connect = 1,
    /// Server connection acknowledgment packet
    Connack = 2,
    /// Publish message packet (QoS 0, 1, 2)
    Publish = 3,
    /// Publish acknowledgment packet (QoS 1)
    Puback = 4,
    /// Publish received packet (QoS 2, step 1)
    Pubrec = 5,
    /// Publish release packet (QoS 2, step 2)
    Pubrel = 6,
    /// Publish complete packet (QoS 2, step 3)
    Pubcomp = 7,
    /// Client subscription request packet
    Subscribe = 8,
    /// Server subscription acknowledgment packet
    Suback = 9,
    /// Client unsubscription request packet
    Unsubscribe = 10,
    /// Server unsubscription acknowledgment packet
    Unsuback = 11,
    /// Ping request packet (keep-alive)
    Pingreq = 12,
    /// Ping response packet (keep-alive)
    Pingresp = 13,
    /// Disconnect notification packet
    Disconnect = 14,
}

impl PacketType {
    /// Convert the packet type to its numeric value (1-14).
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name, suitable for logging and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            PacketType::Connect => "connect",
            PacketType::Connack => "connack",
            PacketType::Publish => "publish",
            PacketType::Puback => "puback",
            PacketType::Pubrec => "pubrec",
            PacketType::Pubrel => "pubrel",
            PacketType::Pubcomp => "pubcomp",
            PacketType::Subscribe => "subscribe",
            PacketType::Suback => "suback",
            PacketType::Unsubscribe => "unsubscribe",
            PacketType::Unsuback => "unsuback",
            PacketType::Pingreq => "pingreq",
            PacketType::Pingresp => "pingresp",
            PacketType::Disconnect => "disconnect",
        }
    }

    /// First byte of the fixed header for this type with its default flags.
    ///
    /// SUBSCRIBE and UNSUBSCRIBE carry the reserved value 0b0010 in the low
    /// nibble; PUBLISH flags are supplied by the packet itself; every other
    /// type uses 0b0000.
    pub fn to_first_byte(self) -> u8 {
        let flags = match self {
            PacketType::Subscribe | PacketType::Unsubscribe => SUB_UNSUBSCRIBE_FLAGS,
            _ => 0,
        };
        (self.as_u8() << 4) | flags
    }

    /// Validate the low nibble of a received first byte for this type.
    ///
    /// SUBSCRIBE/UNSUBSCRIBE require 0b0010, PUBLISH is unconstrained (the
    /// nibble carries DUP/QoS/RETAIN), and all other types require 0b0000.
    /// Violations are [`MqttError::InvalidPacketType`].
    pub fn validate_flags(self, flags: u8) -> Result<(), MqttError> {
        let ok = match self {
            PacketType::Publish => true,
            PacketType::Subscribe | PacketType::Unsubscribe => flags == SUB_UNSUBSCRIBE_FLAGS,
            _ => flags == 0,
        };
        if ok {
            Ok(())
        } else {
            Err(MqttError::InvalidPacketType)
        }
    }
}

/// Serialize `PacketType` as a string
impl Serialize for PacketType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Display `PacketType` as JSON string
impl fmt::Display for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

/// Debug `PacketType` using Display implementation
impl fmt::Debug for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Decoded MQTT fixed header: packet type, flag nibble, remaining length.
///
/// This is the first thing an endpoint reads off the wire for every control
/// packet; the per-type decoders then consume exactly `remaining_length`
/// bytes of variable header and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketHeader {
    pub packet_type: PacketType,
    pub flags: u8,
    pub remaining_length: u32,
}

impl PacketHeader {
    /// Read and validate a fixed header from the stream.
    ///
    /// The high nibble must map to a known packet type and the low nibble
    /// must satisfy the type-specific reserved-bits rules; the remaining
    /// length is a variable byte integer of at most four bytes.
    pub fn decode(stream: &mut dyn InputStream) -> Result<Self, MqttError> {
        let mut first = [0u8; 1];
        stream.read(&mut first)?;

        let packet_type = PacketType::try_from(first[0] >> 4)
            .map_err(|_| MqttError::InvalidPacketType)?;
        let flags = first[0] & 0x0F;
        packet_type.validate_flags(flags)?;

        let remaining_length = VariableByteInteger::decode(stream)?.value();
        Ok(Self {
            packet_type,
            flags,
            remaining_length,
        })
    }
}
