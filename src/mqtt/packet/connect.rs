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

/// The six protocol-name bytes followed by the protocol level byte.
const PROTOCOL_NAME: [u8; 6] = [0x00, 0x04, b'M', b'Q', b'T', b'T'];
const PROTOCOL_LEVEL: u8 = 4;

// Connect flag bits
const FLAG_USERNAME: u8 = 1 << 7;
const FLAG_PASSWORD: u8 = 1 << 6;
const FLAG_WILL_RETAIN: u8 = 1 << 5;
const FLAG_WILL_QOS_SHIFT: u8 = 3;
const FLAG_WILL: u8 = 1 << 2;
const FLAG_CLEAN_SESSION: u8 = 1 << 1;

/// Authentication data carried in CONNECT.
///
/// Absence of a username means no authentication is present; a password can
/// only accompany a username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: MqttString,
    /// Raw password bytes; `None` when the password flag is absent.
    pub password: Option<Vec<u8>>,
}

impl Credentials {
    pub fn new(username: impl AsRef<str>, password: Option<&[u8]>) -> Result<Self, MqttError> {
        if password.is_some_and(|p| p.len() > MqttString::MAX_SIZE) {
            return Err(MqttError::InvalidParam);
        }
        Ok(Self {
            username: MqttString::new(username)?,
            password: password.map(|p| p.to_vec()),
        })
    }

    fn wire_size(&self) -> usize {
        self.username.size() + self.password.as_ref().map_or(0, |p| 2 + p.len())
    }
}

/// Message the broker publishes on behalf of a client that disconnects
/// ungracefully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Will {
    pub topic: MqttString,
    pub message: Vec<u8>,
    pub qos: Qos,
    pub retain: bool,
}

impl Will {
    pub fn new(
        topic: impl AsRef<str>,
        message: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<Self, MqttError> {
        if message.len() > MqttString::MAX_SIZE {
            return Err(MqttError::InvalidParam);
        }
        Ok(Self {
            topic: MqttString::new(topic)?,
            message: message.to_vec(),
            qos,
            retain,
        })
    }

    fn wire_size(&self) -> usize {
        self.topic.size() + 2 + self.message.len()
    }
}

/// Capacity limits applied while decoding a CONNECT packet.
///
/// The broker fills these from its configuration so inline session buffers
/// can never be overrun by a hostile peer.
#[derive(Debug, Clone, Copy)]
pub struct ConnectLimits {
    pub max_client_id_length: usize,
    pub max_will_topic_length: usize,
    pub max_will_message_size: usize,
}

impl Default for ConnectLimits {
    fn default() -> Self {
        Self {
            max_client_id_length: MqttString::MAX_SIZE,
            max_will_topic_length: MqttString::MAX_SIZE,
            max_will_message_size: MqttString::MAX_SIZE,
        }
    }
}

/// MQTT v3.1.1 CONNECT packet
///
/// First packet a client sends after the TCP connection is established.
/// The variable header carries the protocol name "MQTT", protocol level 4,
/// the connect flags and the keepalive; the payload carries the client id
/// followed by the optional will topic/message and credentials, in that
/// order. The encoder computes the remaining length from the payload shape.
///
/// # Examples
///
/// ```ignore
/// use mqtt_endpoint_core::mqtt;
///
/// let connect = mqtt::packet::Connect::builder()
///     .client_id("abc")
///     .unwrap()
///     .clean_session(true)
///     .keepalive(60)
///     .build()
///     .unwrap();
/// assert_eq!(connect.size(), 17);
/// ```
#[derive(PartialEq, Eq, Builder, Clone, Getters, CopyGetters)]
#[builder(derive(Debug), pattern = "owned", setter(into), build_fn(skip))]
pub struct Connect {
    #[builder(setter(custom))]
    #[getset(get = "pub")]
    client_id: MqttString,
    #[getset(get = "pub")]
    credentials: Option<Credentials>,
    #[getset(get = "pub")]
    will: Option<Will>,
    #[getset(get_copy = "pub")]
    clean_session: bool,
    #[getset(get_copy = "pub")]
    keepalive: u16,
}

impl Connect {
    pub fn builder() -> ConnectBuilder {
        ConnectBuilder::default()
    }

    pub const fn packet_type() -> PacketType {
        PacketType::Connect
    }

    fn remaining_length(&self) -> u32 {
        // variable header: name(6) + level(1) + flags(1) + keepalive(2)
        let mut remaining = 10 + self.client_id.size();
        if let Some(will) = &self.will {
            remaining += will.wire_size();
        }
        if let Some(credentials) = &self.credentials {
            remaining += credentials.wire_size();
        }
        remaining as u32
    }

    fn connect_flags(&self) -> u8 {
        let mut flags = 0u8;
        if let Some(credentials) = &self.credentials {
            flags |= FLAG_USERNAME;
            if credentials.password.is_some() {
                flags |= FLAG_PASSWORD;
            }
        }
        if let Some(will) = &self.will {
            flags |= FLAG_WILL | (will.qos.as_u8() << FLAG_WILL_QOS_SHIFT);
            if will.retain {
                flags |= FLAG_WILL_RETAIN;
            }
        }
        if self.clean_session {
            flags |= FLAG_CLEAN_SESSION;
        }
        flags
    }

    /// Total wire size of the packet in bytes.
    pub fn size(&self) -> usize {
        let remaining = self.remaining_length();
        1 + VariableByteInteger::new(remaining).unwrap().size() + remaining as usize
    }

    /// Serialize the packet to an output stream.
    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        stream.write(&[Self::packet_type().to_first_byte()])?;
        VariableByteInteger::new(self.remaining_length())
            .ok_or(MqttError::InvalidPacketSize)?
            .encode(stream)?;

        stream.write(&PROTOCOL_NAME)?;
        stream.write(&[PROTOCOL_LEVEL, self.connect_flags()])?;
        stream.write(&self.keepalive.to_be_bytes())?;

        self.client_id.encode(stream)?;
        if let Some(will) = &self.will {
            will.topic.encode(stream)?;
            stream.write(&(will.message.len() as u16).to_be_bytes())?;
            stream.write(&will.message)?;
        }
        if let Some(credentials) = &self.credentials {
            credentials.username.encode(stream)?;
            if let Some(password) = &credentials.password {
                stream.write(&(password.len() as u16).to_be_bytes())?;
                stream.write(password)?;
            }
        }
        Ok(())
    }

    /// Parse the variable header and payload of a CONNECT packet.
    ///
    /// The fixed header must already be consumed. Protocol name or level
    /// mismatch fails with [`MqttError::InvalidProtocolName`]; the caller's
    /// capacity limits are enforced on the client id and the will.
    pub fn decode(stream: &mut dyn InputStream, limits: &ConnectLimits) -> Result<Self, MqttError> {
        let mut name = [0u8; 6];
        stream.read(&mut name)?;
        if name != PROTOCOL_NAME {
            return Err(MqttError::InvalidProtocolName);
        }
        let mut level_and_flags = [0u8; 2];
        stream.read(&mut level_and_flags)?;
        if level_and_flags[0] != PROTOCOL_LEVEL {
            return Err(MqttError::InvalidProtocolName);
        }
        let flags = level_and_flags[1];

        let mut keepalive_be = [0u8; 2];
        stream.read(&mut keepalive_be)?;
        let keepalive = u16::from_be_bytes(keepalive_be);

        let client_id = MqttString::decode(stream, limits.max_client_id_length)?;

        let will = if flags & FLAG_WILL != 0 {
            let topic = MqttString::decode(stream, limits.max_will_topic_length)?;
            let mut len_be = [0u8; 2];
            stream.read(&mut len_be)?;
            let len = u16::from_be_bytes(len_be) as usize;
            if len > limits.max_will_message_size {
                return Err(MqttError::BufferTooSmall);
            }
            let mut message = vec![0u8; len];
            stream.read(&mut message)?;
            let qos = Qos::try_from((flags >> FLAG_WILL_QOS_SHIFT) & 0x03)
                .map_err(|_| MqttError::InvalidPacketQos)?;
            Some(Will {
                topic,
                message,
                qos,
                retain: flags & FLAG_WILL_RETAIN != 0,
            })
        } else {
            None
        };

        let credentials = if flags & FLAG_USERNAME != 0 {
            let username = MqttString::decode(stream, MqttString::MAX_SIZE)?;
            let password = if flags & FLAG_PASSWORD != 0 {
                let mut len_be = [0u8; 2];
                stream.read(&mut len_be)?;
                let mut password = vec![0u8; u16::from_be_bytes(len_be) as usize];
                stream.read(&mut password)?;
                Some(password)
            } else {
                None
            };
            Some(Credentials { username, password })
        } else {
            None
        };

        Ok(Self {
            client_id,
            credentials,
            will,
            clean_session: flags & FLAG_CLEAN_SESSION != 0,
            keepalive,
        })
    }
}

impl ConnectBuilder {
    /// Set the client identifier. Fails when it exceeds 65,535 bytes.
    pub fn client_id(mut self, id: impl AsRef<str>) -> Result<Self, MqttError> {
        self.client_id = Some(MqttString::new(id)?);
        Ok(self)
    }

    fn validate(&self) -> Result<(), MqttError> {
        if self.client_id.is_none() {
            return Err(MqttError::InvalidParam);
        }
        Ok(())
    }

    pub fn build(self) -> Result<Connect, MqttError> {
        self.validate()?;
        Ok(Connect {
            client_id: self.client_id.unwrap(),
            credentials: self.credentials.flatten(),
            will: self.will.flatten(),
            clean_session: self.clean_session.unwrap_or(true),
            keepalive: self.keepalive.unwrap_or(0),
        })
    }
}

impl Serialize for Connect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut field_count = 4; // type, client_id, clean_session, keepalive
        if self.will.is_some() {
            field_count += 1;
        }
        if self.credentials.is_some() {
            field_count += 1;
        }
        let mut state = serializer.serialize_struct("Connect", field_count)?;
        state.serialize_field("type", "connect")?;
        state.serialize_field("client_id", &self.client_id)?;
        state.serialize_field("clean_session", &self.clean_session)?;
        state.serialize_field("keepalive", &self.keepalive)?;
        if let Some(will) = &self.will {
            state.serialize_field("will", will)?;
        }
        if let Some(credentials) = &self.credentials {
            state.serialize_field("username", &credentials.username)?;
        }
        state.end()
    }
}

/// Display as JSON, the crate's loggable packet form
impl fmt::Display for Connect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(e) => write!(f, "{{\"error\": \"{e}\"}}"),
        }
    }
}

impl fmt::Debug for Connect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
