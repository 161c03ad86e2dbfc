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
use serde::{Serialize, Serializer};
use std::fmt;

use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// MQTT String representation with pre-encoded byte buffer
///
/// Represents a length-prefixed string as specified by the MQTT wire format:
/// a 2-byte big-endian length followed by that many UTF-8 bytes. The data is
/// stored pre-encoded so serialization to a stream is a single write and size
/// calculations are trivial.
///
/// # Size Limits
///
/// The maximum size of string data is 65,535 bytes (2^16 - 1). Constructing
/// an `MqttString` with longer data fails; decoding enforces the *caller's*
/// capacity instead, so an endpoint with a 512-byte topic buffer rejects
/// longer topics with [`MqttError::MqttStringTooSmall`] without allocating.
///
/// # UTF-8 Validation
///
/// String data is validated as UTF-8 at construction and at decode time, so
/// `as_str` is a zero-cost view.
///
/// # Examples
///
/// ```ignore
/// use mqtt_endpoint_core::mqtt;
///
/// let s = mqtt::packet::MqttString::new("hi").unwrap();
/// assert_eq!(s.as_str(), "hi");
/// assert_eq!(s.as_bytes(), &[0x00, 0x02, b'h', b'i']);
/// assert_eq!(s.size(), 4);
/// assert_eq!(s.len(), 2);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MqttString {
    /// Complete buffer including length prefix (2 bytes) + UTF-8 byte sequence
    encoded: Vec<u8>,
}

impl MqttString {
    /// Maximum string data length in bytes.
    pub const MAX_SIZE: usize = 0xFFFF;

    /// Create a new MqttString from string data.
    ///
    /// Fails with [`MqttError::InvalidParam`] when the data exceeds 65,535
    /// bytes.
    pub fn new(s: impl AsRef<str>) -> Result<Self, MqttError> {
        let s_ref = s.as_ref();
        let len = s_ref.len();

        if len > Self::MAX_SIZE {
            return Err(MqttError::InvalidParam);
        }

        let mut encoded = Vec::with_capacity(2 + len);
        encoded.extend_from_slice(&(len as u16).to_be_bytes());
        encoded.extend_from_slice(s_ref.as_bytes());

        Ok(Self { encoded })
    }

    /// Complete encoded byte sequence including the 2-byte length prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// String content excluding the length prefix.
    pub fn as_str(&self) -> &str {
        // UTF-8 validity is guaranteed at construction and decode; no
        // mutable access to `encoded` is exposed.
        unsafe { std::str::from_utf8_unchecked(&self.encoded[2..]) }
    }

    /// Length of the string data in bytes (not characters), excluding the
    /// length prefix.
    pub fn len(&self) -> usize {
        self.encoded.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.encoded.len() <= 2
    }

    /// Total encoded size: 2-byte length prefix plus string data.
    pub fn size(&self) -> usize {
        self.encoded.len()
    }

    /// Write the encoded form (prefix + data) to an output stream.
    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        stream.write(&self.encoded)
    }

    /// Read a length-prefixed string from an input stream.
    ///
    /// `capacity` is the caller's buffer limit: a wire length above it fails
    /// with [`MqttError::MqttStringTooSmall`] before any data byte is
    /// consumed. Non-UTF-8 data is [`MqttError::InvalidPacketPayload`].
    pub fn decode(stream: &mut dyn InputStream, capacity: usize) -> Result<Self, MqttError> {
        let mut len_be = [0u8; 2];
        stream.read(&mut len_be)?;
        let len = u16::from_be_bytes(len_be) as usize;
        if len > capacity {
            return Err(MqttError::MqttStringTooSmall);
        }

        let mut encoded = vec![0u8; 2 + len];
        encoded[..2].copy_from_slice(&len_be);
        stream.read(&mut encoded[2..])?;

        std::str::from_utf8(&encoded[2..]).map_err(|_| MqttError::InvalidPacketPayload)?;
        Ok(Self { encoded })
    }
}

impl TryFrom<&str> for MqttString {
    type Error = MqttError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for MqttString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Serialize as the plain string content
impl Serialize for MqttString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for MqttString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for MqttString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
