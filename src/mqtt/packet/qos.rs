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
use serde::{Deserialize, Serialize};

/// MQTT Quality of Service levels
///
/// Delivery guarantee levels for PUBLISH exchanges. Higher levels provide
/// stronger guarantees at the cost of additional acknowledgement traffic:
///
/// - **QoS 0 (At Most Once)**: fire-and-forget, no acknowledgement.
/// - **QoS 1 (At Least Once)**: PUBLISH must be acknowledged with PUBACK;
///   duplicates may occur.
/// - **QoS 2 (Exactly Once)**: four-part handshake
///   (PUBLISH -> PUBREC -> PUBREL -> PUBCOMP).
///
/// Endpoints cap the level they accept via their configuration; the codec
/// rejects wire values above 2 with `InvalidPacketQos`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, TryFromPrimitive,
)]
#[repr(u8)]
pub enum Qos {
    /// QoS level 0: at most once delivery
    AtMostOnce = 0,
    /// QoS level 1: at least once delivery
    AtLeastOnce = 1,
    /// QoS level 2: exactly once delivery
    ExactlyOnce = 2,
}

impl Qos {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// True when packets at this level carry a packet identifier.
    pub fn needs_packet_id(self) -> bool {
        self != Self::AtMostOnce
    }
}

impl fmt::Display for Qos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AtMostOnce => "AtMostOnce",
            Self::AtLeastOnce => "AtLeastOnce",
            Self::ExactlyOnce => "ExactlyOnce",
        };
        write!(f, "{s}")
    }
}
