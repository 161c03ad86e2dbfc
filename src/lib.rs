//! # MQTT Endpoint Core
//!
//! A lightweight MQTT v3.1.1 engine providing both a client and a broker
//! over TCP, built around a stream-based wire codec.
//!
//! The hard part of the crate is the protocol core: a bit-exact MQTT 3.1.1
//! codec (serialize/deserialize for every control packet) layered under two
//! state-machine-driven endpoints that share the same framing, timing and
//! failure model. All I/O goes through the [`mqtt::stream`] traits bound to
//! either a memory buffer or a TCP socket, so the codec is fully testable
//! with literal byte vectors and no sockets at all.
//!
//! ## Design
//!
//! - **Stream-mediated codec**: packets encode to and decode from
//!   [`mqtt::stream::OutputStream`] / [`mqtt::stream::InputStream`], never
//!   from sockets directly. The broker frames a packet into a scratch
//!   buffer first, then parses, so framing and interpretation stay separate
//!   (see [`mqtt::packet::FrameDecoder`]).
//! - **Caller-driven endpoints**: neither endpoint creates threads or pulls
//!   in an async runtime. The application calls `task()` periodically; each
//!   step polls for at most the configured poll period, advances the state
//!   machine, checks timers and delivers events.
//! - **Bounded resources**: the broker's sessions, topics and subscriptions
//!   live in fixed-capacity generational pools sized by
//!   [`mqtt::config::BrokerConfig`]; admission beyond capacity is rejected
//!   at accept time.
//!
//! ## Client example
//!
//! ```rust,no_run
//! use mqtt_endpoint_core::mqtt::config::ClientConfig;
//! use mqtt_endpoint_core::mqtt::endpoint::MqttClient;
//!
//! let mut client = MqttClient::new(ClientConfig::default());
//! client.set_client_id("example").unwrap();
//! client.set_keepalive(60).unwrap();
//! client.connect("127.0.0.1", 1883).unwrap();
//! loop {
//!     client.task().unwrap();
//!     if client.is_connected() {
//!         break;
//!     }
//! }
//! ```
//!
//! ## Broker example
//!
//! ```rust,no_run
//! use mqtt_endpoint_core::mqtt::config::BrokerConfig;
//! use mqtt_endpoint_core::mqtt::endpoint::MqttBroker;
//!
//! let mut broker = MqttBroker::new(BrokerConfig::default());
//! broker.start("0.0.0.0", 1883).unwrap();
//! loop {
//!     broker.task().unwrap();
//! }
//! ```
//!
//! ## Scope
//!
//! MQTT v3.1.1 only. QoS 0 flows are complete end to end; the QoS 1/2
//! packet types (PUBACK, PUBREC, PUBREL, PUBCOMP) are recognized and fully
//! parseable, with the delivery flows left as documented extension points.
//! Topic matching is by equality; wildcard filters are an extension point.
//! No TLS, no persistent sessions, no bridging.

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

pub mod logger;
pub mod mqtt;
