use core::fmt;
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
use num_enum::TryFromPrimitive;
use serde::{Serialize, Serializer};

/// Error kinds produced by the codec, the streams, and the endpoints.
///
/// Every fallible public operation in this crate returns
/// `Result<_, MqttError>`; the variant identifies the failing layer:
///
/// - `InvalidParam` is a caller error and never has side effects.
/// - `OutputStreamFull` / `InputStreamEmpty` are stream boundary conditions
///   raised by buffer-backed streams during codec I/O.
/// - `InvalidPacket*` and `InvalidProtocolName` are wire violations local to
///   one packet; the endpoint decides whether they imply disconnect.
/// - `MqttStringTooSmall` / `BufferTooSmall` mean a configured capacity
///   cannot hold decoded data.
/// - `SocketPending` is the non-blocking "would block" condition and is never
///   fatal; the whole-packet decoder translates it to in-progress.
/// - `SocketFailed` is terminal to the connection that raised it.
/// - `ClientInvalidState` / `BrokerInvalidState` reject an operation issued
///   in the wrong endpoint state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MqttError {
    /// Null, empty or out-of-range argument
    InvalidParam = 1,
    /// Output stream is full or not big enough
    OutputStreamFull = 2,
    /// Input stream is empty or does not contain enough data
    InputStreamEmpty = 3,
    /// Invalid packet type or reserved flag bits
    InvalidPacketType = 4,
    /// Invalid packet size field
    InvalidPacketSize = 5,
    /// Invalid packet payload
    InvalidPacketPayload = 6,
    /// Invalid packet QoS
    InvalidPacketQos = 7,
    /// CONNECT protocol name or level mismatch
    InvalidProtocolName = 8,
    /// Provided MQTT string capacity is too small for the decoded data
    MqttStringTooSmall = 9,
    /// Provided buffer is too small for the decoded data
    BufferTooSmall = 10,
    /// Resumable operation has consumed all currently available bytes
    InProgress = 11,
    /// Non-blocking socket operation would block
    SocketPending = 12,
    /// Socket operation failed, terminal for the connection
    SocketFailed = 13,
    /// Operation issued in an invalid client state
    ClientInvalidState = 14,
    /// Operation issued in an invalid broker state
    BrokerInvalidState = 15,
}

impl MqttError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidParam => "InvalidParam",
            Self::OutputStreamFull => "OutputStreamFull",
            Self::InputStreamEmpty => "InputStreamEmpty",
            Self::InvalidPacketType => "InvalidPacketType",
            Self::InvalidPacketSize => "InvalidPacketSize",
            Self::InvalidPacketPayload => "InvalidPacketPayload",
            Self::InvalidPacketQos => "InvalidPacketQos",
            Self::InvalidProtocolName => "InvalidProtocolName",
            Self::MqttStringTooSmall => "MqttStringTooSmall",
            Self::BufferTooSmall => "BufferTooSmall",
            Self::InProgress => "InProgress",
            Self::SocketPending => "SocketPending",
            Self::SocketFailed => "SocketFailed",
            Self::ClientInvalidState => "ClientInvalidState",
            Self::BrokerInvalidState => "BrokerInvalidState",
        }
    }
}

impl fmt::Display for MqttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for MqttError {}

impl Serialize for MqttError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// MQTT v3.1.1 CONNACK return code
///
/// Values 0 through 5 are wire values defined by the protocol. The value
/// `Disconnected` (0xFF) is an internal sentinel reported to the connect
/// event when the connection drops before any CONNACK arrives; it is never
/// sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum ConnackReturnCode {
    /// Connection accepted (not an error)
    Accepted = 0,
    /// The server does not support the requested protocol level
    RefusedProtocol = 1,
    /// The client identifier is correct UTF-8 but not allowed by the server
    RefusedClientId = 2,
    /// The network connection has been made but the MQTT service is unavailable
    ServerUnavailable = 3,
    /// The data in the user name or password is malformed
    BadCredentials = 4,
    /// The client is not authorized to connect
    NotAuthorized = 5,
    /// Internal sentinel: disconnected before a CONNACK was received
    Disconnected = 0xFF,
}

impl ConnackReturnCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True for the only code that lets the session proceed.
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::RefusedProtocol => "RefusedProtocol",
            Self::RefusedClientId => "RefusedClientId",
            Self::ServerUnavailable => "ServerUnavailable",
            Self::BadCredentials => "BadCredentials",
            Self::NotAuthorized => "NotAuthorized",
            Self::Disconnected => "Disconnected",
        }
    }
}

impl fmt::Display for ConnackReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ConnackReturnCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// MQTT v3.1.1 SUBACK return code
///
/// A successful code carries the granted maximum QoS; `Failure` (0x80) is the
/// protocol's failure sentinel. Any other wire value is a malformed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum SubackReturnCode {
    /// Subscription granted with maximum QoS 0
    SuccessMaximumQos0 = 0x00,
    /// Subscription granted with maximum QoS 1
    SuccessMaximumQos1 = 0x01,
    /// Subscription granted with maximum QoS 2
    SuccessMaximumQos2 = 0x02,
    /// Subscription failed
    Failure = 0x80,
}

impl SubackReturnCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Granted QoS level for success codes, `None` for `Failure`.
    pub fn granted_qos(self) -> Option<crate::mqtt::packet::Qos> {
        match self {
            Self::SuccessMaximumQos0 => Some(crate::mqtt::packet::Qos::AtMostOnce),
            Self::SuccessMaximumQos1 => Some(crate::mqtt::packet::Qos::AtLeastOnce),
            Self::SuccessMaximumQos2 => Some(crate::mqtt::packet::Qos::ExactlyOnce),
            Self::Failure => None,
        }
    }

    pub fn is_success(self) -> bool {
        self != Self::Failure
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuccessMaximumQos0 => "SuccessMaximumQos0",
            Self::SuccessMaximumQos1 => "SuccessMaximumQos1",
            Self::SuccessMaximumQos2 => "SuccessMaximumQos2",
            Self::Failure => "Failure",
        }
    }
}

impl From<crate::mqtt::packet::Qos> for SubackReturnCode {
    fn from(qos: crate::mqtt::packet::Qos) -> Self {
        match qos {
            crate::mqtt::packet::Qos::AtMostOnce => Self::SuccessMaximumQos0,
            crate::mqtt::packet::Qos::AtLeastOnce => Self::SuccessMaximumQos1,
            crate::mqtt::packet::Qos::ExactlyOnce => Self::SuccessMaximumQos2,
        }
    }
}

impl fmt::Display for SubackReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for SubackReturnCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
