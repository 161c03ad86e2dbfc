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

use derive_builder::Builder;
use getset::{CopyGetters, Getters};

use crate::mqtt::packet::mqtt_string::MqttString;
use crate::mqtt::packet::packet_type::PacketType;
use crate::mqtt::packet::variable_byte_integer::VariableByteInteger;
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// MQTT v3.1.1 UNSUBSCRIBE packet
///
/// Packet identifier plus one length-prefixed topic filter, mirroring the
/// single-topic SUBSCRIBE. The fixed-header low nibble is the reserved value
/// 0b0010.
#[derive(PartialEq, Eq, Builder, Clone, Getters, CopyGetters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Unsubscribe {
    #[getset(get_copy = "pub")]
    packet_id: u16,
    #[builder(setter(custom))]
    #[getset(get = "pub")]
    topic: MqttString,
}

impl Unsubscribe {
    pub fn builder() -> UnsubscribeBuilder {
        UnsubscribeBuilder::default()
    }

    pub const fn packet_type() -> PacketType {
        PacketType::Unsubscribe
    }

    fn remaining_length(&self) -> u32 {
        (2 + self.topic.size()) as u32
    }

    pub fn size(&self) -> usize {
        let remaining = self.remaining_length();
        1 + VariableByteInteger::new(remaining).unwrap().size() + remaining as usize
    }

    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        stream.write(&[Self::packet_type().to_first_byte()])?;
        VariableByteInteger::new(self.remaining_length())
            .ok_or(MqttError::InvalidPacketSize)?
            .encode(stream)?;
        stream.write(&self.packet_id.to_be_bytes())?;
        self.topic.encode(stream)
    }

    /// Parse the variable header and payload; the fixed header must already
    /// be consumed.
    pub fn decode(
        stream: &mut dyn InputStream,
        max_topic_length: usize,
    ) -> Result<Self, MqttError> {
        let mut id_be = [0u8; 2];
        stream.read(&mut id_be)?;
        let topic = MqttString::decode(stream, max_topic_length)?;
        Ok(Self {
            packet_id: u16::from_be_bytes(id_be),
            topic,
        })
    }
}

impl UnsubscribeBuilder {
    /// Set the topic filter. Fails when it exceeds 65,535 bytes.
    pub fn topic(mut self, topic: impl AsRef<str>) -> Result<Self, MqttError> {
        self.topic = Some(MqttString::new(topic)?);
        Ok(self)
    }

    fn validate(&self) -> Result<(), MqttError> {
        if self.topic.is_none() {
            return Err(MqttError::InvalidParam);
        }
        if self.packet_id.unwrap_or(0) == 0 {
            return Err(MqttError::InvalidParam);
        }
        Ok(())
    }

    pub fn build(self) -> Result<Unsubscribe, MqttError> {
        self.validate()?;
        Ok(Unsubscribe {
            packet_id: self.packet_id.unwrap(),
            topic: self.topic.unwrap(),
        })
    }
}

impl Serialize for Unsubscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Unsubscribe", 3)?;
        state.serialize_field("type", "unsubscribe")?;
        state.serialize_field("packet_id", &self.packet_id)?;
        state.serialize_field("topic", &self.topic)?;
        state.end()
    }
}

impl fmt::Display for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
