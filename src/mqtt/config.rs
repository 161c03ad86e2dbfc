// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Fixed capacities and timing knobs for the two endpoints.
//!
//! Capacities are bound at endpoint construction: they size the inline
//! receive buffers and, for the broker, the session/topic/subscription
//! pools. 16-bit big-endian conversion needs no configuration in Rust
//! (`u16::to_be_bytes` is host-order independent), and thread-safety is the
//! caller's choice of sharing (endpoints take `&mut self`), so neither
//! appears here.

use serde::Serialize;

use crate::mqtt::packet::Qos;

/// Client endpoint configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ClientConfig {
    /// Capacity of the inline topic buffer for received PUBLISH packets.
    pub max_topic_length: usize,
    /// Capacity of the inline payload buffer for received PUBLISH packets.
    pub max_payload_size: usize,
    /// Upper bound on accepted and requested QoS levels.
    pub max_qos: Qos,
    /// Bounded poll duration of one `task` step, in milliseconds.
    pub poll_period_ms: u64,
    /// Deadline for broker responses (CONNACK, SUBACK, UNSUBACK), in
    /// milliseconds.
    pub broker_response_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_topic_length: 512,
            max_payload_size: 1024,
            max_qos: Qos::ExactlyOnce,
            poll_period_ms: 100,
            broker_response_timeout_ms: 5000,
        }
    }
}

/// Broker endpoint configuration.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerConfig {
    /// Capacity of the scratch topic buffer for received PUBLISH packets.
    pub max_topic_length: usize,
    /// Capacity of the scratch payload buffer for received PUBLISH packets.
    pub max_payload_size: usize,
    /// Session pool size: maximum number of simultaneous clients.
    pub max_clients: usize,
    /// Topic pool size.
    pub max_topics: usize,
    /// Subscription pool size.
    pub max_subscriptions: usize,
    /// Capacity of a session's inline will-topic buffer.
    pub max_will_topic_length: usize,
    /// Capacity of a session's inline will-message buffer.
    pub max_will_message_size: usize,
    /// Capacity of a session's inline client-id buffer.
    pub max_client_id_length: usize,
    /// Upper bound on granted QoS levels.
    pub max_qos: Qos,
    /// Idle sleep of one `task` step when no session had work, in
    /// milliseconds.
    pub poll_period_ms: u64,
    /// Deadline for the CONNECT packet after TCP accept, in milliseconds.
    pub connect_timeout_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_topic_length: 512,
            max_payload_size: 2048,
            max_clients: 10,
            max_topics: 32,
            max_subscriptions: 64,
            max_will_topic_length: 512,
            max_will_message_size: 2048,
            max_client_id_length: 32,
            max_qos: Qos::ExactlyOnce,
            poll_period_ms: 50,
            connect_timeout_ms: 5000,
        }
    }
}
