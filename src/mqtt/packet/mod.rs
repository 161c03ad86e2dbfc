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
mod ack;
mod connack;
mod connect;
mod frame;
mod mqtt_string;
mod packet_type;
mod ping;
mod publish;
mod qos;
mod suback;
mod subscribe;
mod unsubscribe;
mod variable_byte_integer;

pub use ack::{Puback, Pubcomp, Pubrec, Pubrel, Unsuback};
pub use connack::Connack;
pub use connect::{Connect, ConnectLimits, Credentials, Will};
pub use frame::{FrameDecoder, FrameProgress, FrameState};
pub use mqtt_string::MqttString;
pub use packet_type::{PacketHeader, PacketType};
pub use ping::{Disconnect, Pingreq, Pingresp};
pub use publish::Publish;
pub use qos::Qos;
pub use suback::Suback;
pub use subscribe::Subscribe;
pub use unsubscribe::Unsubscribe;
pub use variable_byte_integer::VariableByteInteger;

use std::fmt;

use enum_dispatch::enum_dispatch;
use serde::Serialize;

use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// Capacity limits applied while decoding packets into owned buffers.
///
/// Endpoints build this from their configuration; the codec enforces it so
/// a peer announcing a huge topic or payload fails fast with
/// `MqttStringTooSmall` / `BufferTooSmall` instead of exhausting memory.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    pub max_topic_length: usize,
    pub max_payload_size: usize,
    pub connect: ConnectLimits,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_topic_length: MqttString::MAX_SIZE,
            max_payload_size: VariableByteInteger::MAX as usize,
            connect: ConnectLimits::default(),
        }
    }
}

/// Common interface over every control packet.
#[enum_dispatch]
pub trait PacketTrait {
    /// Packet type tag.
    fn packet_type(&self) -> PacketType;

    /// Total wire size of the packet in bytes.
    fn size(&self) -> usize;

    /// Serialize the whole packet (fixed header included) to a stream.
    fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError>;
}

macro_rules! impl_packet_trait {
    ($($packet:ident),+ $(,)?) => {
        $(
            impl PacketTrait for $packet {
                fn packet_type(&self) -> PacketType {
                    $packet::packet_type()
                }

                fn size(&self) -> usize {
                    // inherent method takes precedence
                    self.size()
                }

                fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
                    self.encode(stream)
                }
            }
        )+
    };
}

impl_packet_trait!(
    Connect,
    Connack,
    Publish,
    Puback,
    Pubrec,
    Pubrel,
    Pubcomp,
    Subscribe,
    Suback,
    Unsubscribe,
    Unsuback,
    Pingreq,
    Pingresp,
    Disconnect,
);

/// Any MQTT v3.1.1 control packet.
///
/// `From` conversions from every concrete packet are generated by
/// `enum_dispatch`, so `connect.into()` yields a `Packet`.
#[enum_dispatch(PacketTrait)]
#[derive(Serialize, Clone, PartialEq, Eq)]
pub enum Packet {
    Connect(Connect),
    Connack(Connack),
    Publish(Publish),
    Puback(Puback),
    Pubrec(Pubrec),
    Pubrel(Pubrel),
    Pubcomp(Pubcomp),
    Subscribe(Subscribe),
    Suback(Suback),
    Unsubscribe(Unsubscribe),
    Unsuback(Unsuback),
    Pingreq(Pingreq),
    Pingresp(Pingresp),
    Disconnect(Disconnect),
}

impl Packet {
    /// Parse the variable header and payload matching an already-decoded
    /// fixed header.
    ///
    /// The stream must be positioned immediately after the fixed header and
    /// must hold at least `header.remaining_length` bytes (framing is the
    /// caller's business, usually through [`FrameDecoder`]).
    pub fn decode(
        header: &PacketHeader,
        stream: &mut dyn InputStream,
        limits: &DecodeLimits,
    ) -> Result<Self, MqttError> {
        Ok(match header.packet_type {
            PacketType::Connect => Connect::decode(stream, &limits.connect)?.into(),
            PacketType::Connack => Connack::decode(stream)?.into(),
            PacketType::Publish => Publish::decode(
                stream,
                header.flags,
                header.remaining_length,
                limits.max_topic_length,
                limits.max_payload_size,
            )?
            .into(),
            PacketType::Puback => Puback::decode(stream)?.into(),
            PacketType::Pubrec => Pubrec::decode(stream)?.into(),
            PacketType::Pubrel => Pubrel::decode(stream)?.into(),
            PacketType::Pubcomp => Pubcomp::decode(stream)?.into(),
            PacketType::Subscribe => {
                Subscribe::decode(stream, limits.max_topic_length)?.into()
            }
            PacketType::Suback => Suback::decode(stream)?.into(),
            PacketType::Unsubscribe => {
                Unsubscribe::decode(stream, limits.max_topic_length)?.into()
            }
            PacketType::Unsuback => Unsuback::decode(stream)?.into(),
            PacketType::Pingreq => Pingreq::decode(header.remaining_length)?.into(),
            PacketType::Pingresp => Pingresp::decode(header.remaining_length)?.into(),
            PacketType::Disconnect => Disconnect::decode(header.remaining_length)?.into(),
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Connect(p) => fmt::Display::fmt(p, f),
            Packet::Connack(p) => fmt::Display::fmt(p, f),
            Packet::Publish(p) => fmt::Display::fmt(p, f),
            Packet::Puback(p) => fmt::Display::fmt(p, f),
            Packet::Pubrec(p) => fmt::Display::fmt(p, f),
            Packet::Pubrel(p) => fmt::Display::fmt(p, f),
            Packet::Pubcomp(p) => fmt::Display::fmt(p, f),
            Packet::Subscribe(p) => fmt::Display::fmt(p, f),
            Packet::Suback(p) => fmt::Display::fmt(p, f),
            Packet::Unsubscribe(p) => fmt::Display::fmt(p, f),
            Packet::Unsuback(p) => fmt::Display::fmt(p, f),
            Packet::Pingreq(p) => fmt::Display::fmt(p, f),
            Packet::Pingresp(p) => fmt::Display::fmt(p, f),
            Packet::Disconnect(p) => fmt::Display::fmt(p, f),
        }
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
