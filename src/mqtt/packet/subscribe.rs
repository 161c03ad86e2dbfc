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
use crate::mqtt::packet::qos::Qos;
use crate::mqtt::packet::variable_byte_integer::VariableByteInteger;
use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// MQTT v3.1.1 SUBSCRIBE packet
///
/// Variable header: packet identifier. Payload: one length-prefixed topic
/// filter and a 1-byte requested QoS. This engine supports a single topic
/// per SUBSCRIBE; multi-topic subscription lists are a documented extension
/// point. The fixed-header low nibble is the reserved value 0b0010.
#[derive(PartialEq, Eq, Builder, Clone, Getters, CopyGetters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Subscribe {
    #[getset(get_copy = "pub")]
    packet_id: u16,
    #[builder(setter(custom))]
    #[getset(get = "pub")]
    topic: MqttString,
    #[getset(get_copy = "pub")]
    qos: Qos,
}

impl Subscribe {
    pub fn builder() -> SubscribeBuilder {
        SubscribeBuilder::default()
    }

    pub const fn packet_type() -> PacketType {
        PacketType::Subscribe
    }

    fn remaining_length(&self) -> u32 {
        // packet id + topic + requested qos
        (2 + self.topic.size() + 1) as u32
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
        self.topic.encode(stream)?;
        stream.write(&[self.qos.as_u8()])
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
        let mut qos_byte = [0u8; 1];
        stream.read(&mut qos_byte)?;
        let qos = Qos::try_from(qos_byte[0]).map_err(|_| MqttError::InvalidPacketQos)?;
        Ok(Self {
            packet_id: u16::from_be_bytes(id_be),
            topic,
            qos,
        })
    }
}

impl SubscribeBuilder {
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

    pub fn build(self) -> Result<Subscribe, MqttError> {
        self.validate()?;
        Ok(Subscribe {
            packet_id: self.packet_id.unwrap(),
            topic: self.topic.unwrap(),
            qos: self.qos.unwrap_or(Qos::AtMostOnce),
        })
    }
}

impl Serialize for Subscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Subscribe", 4)?;
        state.serialize_field("type", "subscribe")?;
        state.serialize_field("packet_id", &self.packet_id)?;
        state.serialize_field("topic", &self.topic)?;
        state.serialize_field("qos", &self.qos)?;
        state.end()
    }
}

impl fmt::Display for Subscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Subscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
