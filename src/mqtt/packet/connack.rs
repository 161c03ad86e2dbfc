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
use crate::mqtt::result_code::{ConnackReturnCode, MqttError};
use crate::mqtt::stream::{InputStream, OutputStream};

/// MQTT v3.1.1 CONNACK packet
///
/// Two payload bytes: the session-present flag (strictly 0 or 1, anything
/// else is [`MqttError::InvalidPacketPayload`]) and the connect return code.
/// The internal `Disconnected` (0xFF) sentinel of [`ConnackReturnCode`] is
/// rejected on both encode and decode; it exists only for event reporting.
#[derive(Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct Connack {
    #[getset(get_copy = "pub")]
    session_present: bool,
    #[getset(get_copy = "pub")]
    return_code: ConnackReturnCode,
}

impl Connack {
    const REMAINING_LENGTH: u8 = 2;

    pub fn new(session_present: bool, return_code: ConnackReturnCode) -> Result<Self, MqttError> {
        if return_code == ConnackReturnCode::Disconnected {
            return Err(MqttError::InvalidParam);
        }
        Ok(Self {
            session_present,
            return_code,
        })
    }

    pub const fn packet_type() -> PacketType {
        PacketType::Connack
    }

    pub fn size(&self) -> usize {
        4
    }

    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        stream.write(&[
            Self::packet_type().to_first_byte(),
            Self::REMAINING_LENGTH,
            u8::from(self.session_present),
            self.return_code.as_u8(),
        ])
    }

    /// Parse the two payload bytes; the fixed header must already be
    /// consumed.
    pub fn decode(stream: &mut dyn InputStream) -> Result<Self, MqttError> {
        let mut payload = [0u8; 2];
        stream.read(&mut payload)?;
        let session_present = match payload[0] {
            0 => false,
            1 => true,
            _ => return Err(MqttError::InvalidPacketPayload),
        };
        let return_code = ConnackReturnCode::try_from(payload[1])
            .map_err(|_| MqttError::InvalidPacketPayload)?;
        if return_code == ConnackReturnCode::Disconnected {
            return Err(MqttError::InvalidPacketPayload);
        }
        Ok(Self {
            session_present,
            return_code,
        })
    }
}

impl Serialize for Connack {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Connack", 3)?;
        state.serialize_field("type", "connack")?;
        state.serialize_field("session_present", &self.session_present)?;
        state.serialize_field("return_code", &self.return_code)?;
        state.end()
    }
}

impl fmt::Display for Connack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Connack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
