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

// PUBLISH fixed-header flag bits
const FLAG_DUP: u8 = 1 << 3;
const FLAG_QOS_SHIFT: u8 = 1;
const FLAG_QOS_MASK: u8 = 0b0110;
const FLAG_RETAIN: u8 = 1 << 0;

/// MQTT v3.1.1 PUBLISH packet
///
/// Variable header: topic string, then the packet identifier iff QoS > 0.
/// The payload is whatever remains of the declared remaining length after
/// the variable header. DUP, QoS and RETAIN live in the fixed-header flag
/// nibble.
///
/// # Examples
///
/// ```ignore
/// use mqtt_endpoint_core::mqtt;
///
/// let publish = mqtt::packet::Publish::builder()
///     .topic("t")
///     .unwrap()
///     .payload(b"hi".as_slice())
///     .qos(mqtt::packet::Qos::AtMostOnce)
///     .build()
///     .unwrap();
/// assert_eq!(publish.size(), 7);
/// ```
#[derive(PartialEq, Eq, Builder, Clone, Getters, CopyGetters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Publish {
    #[builder(setter(custom))]
    #[getset(get = "pub")]
    topic: MqttString,
    #[getset(get_copy = "pub")]
    packet_id: Option<u16>,
    #[getset(get = "pub")]
    payload: Vec<u8>,
    #[getset(get_copy = "pub")]
    qos: Qos,
    #[getset(get_copy = "pub")]
    retain: bool,
    #[getset(get_copy = "pub")]
    dup: bool,
}

impl Publish {
    pub fn builder() -> PublishBuilder {
        PublishBuilder::default()
    }

    pub const fn packet_type() -> PacketType {
        PacketType::Publish
    }

    fn first_byte(&self) -> u8 {
        let mut byte =
            (Self::packet_type().as_u8() << 4) | (self.qos.as_u8() << FLAG_QOS_SHIFT);
        if self.retain {
            byte |= FLAG_RETAIN;
        }
        if self.dup {
            byte |= FLAG_DUP;
        }
        byte
    }

    fn remaining_length(&self) -> u32 {
        let mut remaining = self.topic.size() + self.payload.len();
        if self.qos.needs_packet_id() {
            remaining += 2;
        }
        remaining as u32
    }

    /// Total wire size of the packet in bytes.
    pub fn size(&self) -> usize {
        let remaining = self.remaining_length();
        1 + VariableByteInteger::new(remaining).unwrap().size() + remaining as usize
    }

    /// Serialize the packet to an output stream.
    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        stream.write(&[self.first_byte()])?;
        VariableByteInteger::new(self.remaining_length())
            .ok_or(MqttError::InvalidPacketSize)?
            .encode(stream)?;
        self.topic.encode(stream)?;
        if self.qos.needs_packet_id() {
            // validated at build time
            stream.write(&self.packet_id.unwrap_or(0).to_be_bytes())?;
        }
        if !self.payload.is_empty() {
            stream.write(&self.payload)?;
        }
        Ok(())
    }

    /// Parse the variable header and payload of a PUBLISH packet.
    ///
    /// Takes the flag nibble and remaining length from the already-consumed
    /// fixed header. A QoS above 2 is [`MqttError::InvalidPacketQos`]; a
    /// topic above `max_topic_length` is [`MqttError::MqttStringTooSmall`];
    /// a payload above `max_payload_size` is [`MqttError::BufferTooSmall`].
    pub fn decode(
        stream: &mut dyn InputStream,
        flags: u8,
        remaining_length: u32,
        max_topic_length: usize,
        max_payload_size: usize,
    ) -> Result<Self, MqttError> {
        let qos = Qos::try_from((flags & FLAG_QOS_MASK) >> FLAG_QOS_SHIFT)
            .map_err(|_| MqttError::InvalidPacketQos)?;
        let retain = flags & FLAG_RETAIN != 0;
        let dup = flags & FLAG_DUP != 0;

        let topic = MqttString::decode(stream, max_topic_length)?;
        let mut consumed = topic.size();

        let packet_id = if qos.needs_packet_id() {
            let mut id_be = [0u8; 2];
            stream.read(&mut id_be)?;
            consumed += 2;
            Some(u16::from_be_bytes(id_be))
        } else {
            None
        };

        let payload_len = (remaining_length as usize)
            .checked_sub(consumed)
            .ok_or(MqttError::InvalidPacketSize)?;
        if payload_len > max_payload_size {
            return Err(MqttError::BufferTooSmall);
        }
        let mut payload = vec![0u8; payload_len];
        stream.read(&mut payload)?;

        Ok(Self {
            topic,
            packet_id,
            payload,
            qos,
            retain,
            dup,
        })
    }
}

impl PublishBuilder {
    /// Set the topic name. Fails when it exceeds 65,535 bytes.
    pub fn topic(mut self, topic: impl AsRef<str>) -> Result<Self, MqttError> {
        self.topic = Some(MqttString::new(topic)?);
        Ok(self)
    }

    fn validate(&self) -> Result<(), MqttError> {
        let Some(topic) = &self.topic else {
            return Err(MqttError::InvalidParam);
        };
        let payload_len = self.payload.as_ref().map_or(0, Vec::len);
        if topic.size() + 2 + payload_len > VariableByteInteger::MAX as usize {
            return Err(MqttError::InvalidParam);
        }
        let qos = self.qos.unwrap_or(Qos::AtMostOnce);
        let packet_id = self.packet_id.flatten();
        // packet id zero is reserved for unacknowledged QoS 0 publishes
        if qos.needs_packet_id() && packet_id.unwrap_or(0) == 0 {
            return Err(MqttError::InvalidParam);
        }
        if !qos.needs_packet_id() && packet_id.is_some() {
            return Err(MqttError::InvalidParam);
        }
        Ok(())
    }

    pub fn build(self) -> Result<Publish, MqttError> {
        self.validate()?;
        Ok(Publish {
            topic: self.topic.unwrap(),
            packet_id: self.packet_id.flatten(),
            payload: self.payload.unwrap_or_default(),
            qos: self.qos.unwrap_or(Qos::AtMostOnce),
            retain: self.retain.unwrap_or(false),
            dup: self.dup.unwrap_or(false),
        })
    }
}

impl Serialize for Publish {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut field_count = 5; // type, topic, qos, retain, dup
        if self.packet_id.is_some() {
            field_count += 1;
        }
        if !self.payload.is_empty() {
            field_count += 1;
        }
        let mut state = serializer.serialize_struct("Publish", field_count)?;
        state.serialize_field("type", "publish")?;
        state.serialize_field("topic", &self.topic)?;
        if let Some(packet_id) = self.packet_id {
            state.serialize_field("packet_id", &packet_id)?;
        }
        state.serialize_field("qos", &self.qos)?;
        state.serialize_field("retain", &self.retain)?;
        state.serialize_field("dup", &self.dup)?;
        if !self.payload.is_empty() {
            state.serialize_field("payload_len", &self.payload.len())?;
        }
        state.end()
    }
}

impl fmt::Display for Publish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Publish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
