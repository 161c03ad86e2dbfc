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

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use getset::CopyGetters;

use crate::mqtt::packet::packet_type::PacketType;
use crate::mqtt::result_code::{MqttError, SubackReturnCode};
use crate::mqtt::stream::{InputStream, OutputStream};

/// MQTT v3.1.1 SUBACK packet
///
/// Variable header: the packet identifier echoing the SUBSCRIBE. Payload:
/// one return code, either the granted maximum QoS (0..=2) or the failure
/// sentinel 0x80; any other value is [`MqttError::InvalidPacketQos`]. One
/// code per packet, matching this engine's single-topic SUBSCRIBE.
#[derive(Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct Suback {
    #[getset(get_copy = "pub")]
    packet_id: u16,
    #[getset(get_copy = "pub")]
    return_code: SubackReturnCode,
}

impl Suback {
    const REMAINING_LENGTH: u8 = 3;

    pub fn new(packet_id: u16, return_code: SubackReturnCode) -> Result<Self, MqttError> {
        if packet_id == 0 {
            return Err(MqttError::InvalidParam);
        }
        Ok(Self {
            packet_id,
            return_code,
        })
    }

    pub const fn packet_type() -> PacketType {
        PacketType::Suback
    }

    pub fn size(&self) -> usize {
        5
    }

    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        let id = self.packet_id.to_be_bytes();
        stream.write(&[
            Self::packet_type().to_first_byte(),
            Self::REMAINING_LENGTH,
            id[0],
            id[1],
            self.return_code.as_u8(),
        ])
    }

    /// Parse the variable header and payload; the fixed header must already
    /// be consumed.
    pub fn decode(stream: &mut dyn InputStream) -> Result<Self, MqttError> {
        let mut id_be = [0u8; 2];
        stream.read(&mut id_be)?;
        let mut code = [0u8; 1];
        stream.read(&mut code)?;
        let return_code =
            SubackReturnCode::try_from(code[0]).map_err(|_| MqttError::InvalidPacketQos)?;
        Ok(Self {
            packet_id: u16::from_be_bytes(id_be),
            return_code,
        })
    }
}

impl Serialize for Suback {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Suback", 3)?;
        state.serialize_field("type", "suback")?;
        state.serialize_field("packet_id", &self.packet_id)?;
        state.serialize_field("return_code", &self.return_code)?;
        state.end()
    }
}

impl fmt::Display for Suback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Suback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
