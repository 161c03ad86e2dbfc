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
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mqtt::result_code::MqttError;
use crate::mqtt::stream::{InputStream, OutputStream};

/// MQTT Variable Byte Integer: the remaining-length field of the fixed
/// header.
///
/// A base-128 integer encoded least-significant group first. Each wire byte
/// carries 7 value bits; the top bit marks "more bytes follow". Valid
/// encodings are 1 to 4 bytes long, covering 0..=268,435,455, and a fifth
/// continuation byte on the wire is malformed
/// ([`MqttError::InvalidPacketSize`]).
///
/// The integer is held as its numeric value; the wire form is produced on
/// [`encode`](Self::encode) and [`size`](Self::size) is derived from the
/// value range, so a `VariableByteInteger` is a plain `Copy` wrapper around
/// a validated `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct VariableByteInteger(u32);

impl VariableByteInteger {
    /// Largest encodable value (4 bytes of 7 data bits each).
    pub const MAX: u32 = (1 << 28) - 1;

    /// Wrap a value, or `None` when it exceeds [`Self::MAX`].
    pub fn new(value: u32) -> Option<Self> {
        if value > Self::MAX {
            return None;
        }
        Some(Self(value))
    }

    /// The numeric value.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Width of the wire encoding in bytes (1..=4).
    pub fn size(&self) -> usize {
        match self.0 {
            0..=0x7F => 1,
            0x80..=0x3FFF => 2,
            0x4000..=0x001F_FFFF => 3,
            _ => 4,
        }
    }

    /// Write the wire encoding as a single stream write.
    pub fn encode(&self, stream: &mut dyn OutputStream) -> Result<(), MqttError> {
        let mut bytes = ArrayVec::<u8, 4>::new();
        let mut left = self.0;
        loop {
            let group = (left & 0x7F) as u8;
            left >>= 7;
            bytes.push(if left != 0 { group | 0x80 } else { group });
            if left == 0 {
                break;
            }
        }
        stream.write(&bytes)
    }

    /// Read a wire encoding from the stream.
    ///
    /// Consumes bytes until one arrives without the continuation bit; more
    /// than four is [`MqttError::InvalidPacketSize`]. Stream boundary
    /// errors pass through unchanged so a resumable caller can retry.
    pub fn decode(stream: &mut dyn InputStream) -> Result<Self, MqttError> {
        let mut value = 0u32;
        for shift in [0u32, 7, 14, 21] {
            let mut byte = [0u8; 1];
            stream.read(&mut byte)?;
            value |= u32::from(byte[0] & 0x7F) << shift;
            if byte[0] & 0x80 == 0 {
                return Ok(Self(value));
            }
        }
        // a fifth continuation byte can never terminate a valid encoding
        Err(MqttError::InvalidPacketSize)
    }
}

impl fmt::Display for VariableByteInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<VariableByteInteger> for u32 {
    fn from(vbi: VariableByteInteger) -> Self {
        vbi.0
    }
}

impl TryFrom<u32> for VariableByteInteger {
    type Error = MqttError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(MqttError::InvalidPacketSize)
    }
}
