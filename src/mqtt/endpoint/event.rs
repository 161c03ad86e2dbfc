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
use crate::mqtt::packet::Publish;
use crate::mqtt::result_code::{ConnackReturnCode, SubackReturnCode};

/// Event sink for a client endpoint.
///
/// One polymorphic sink replaces the original's six raw function pointers:
/// implement the methods you care about, every one defaults to a no-op. The
/// endpoint owns the sink (`Box<dyn ClientEventHandler + Send>`) and invokes
/// it from inside [`task`](crate::mqtt::endpoint::MqttClient::task) and from
/// operations that detect a dead connection, always on the calling thread.
///
/// # Examples
///
/// ```ignore
/// use mqtt_endpoint_core::mqtt::endpoint::ClientEventHandler;
/// use mqtt_endpoint_core::mqtt::packet::Publish;
///
/// struct Printer;
///
/// impl ClientEventHandler for Printer {
///     fn on_publish_received(&mut self, publish: &Publish) {
///         println!("{} {:?}", publish.topic(), publish.payload());
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait ClientEventHandler {
    /// CONNACK arrived (`connected == true` only for `Accepted`), or the
    /// connection died before any CONNACK (`ConnackReturnCode::Disconnected`).
    fn on_connect(&mut self, connected: bool, return_code: ConnackReturnCode) {}

    /// SUBACK arrived for the outstanding SUBSCRIBE.
    fn on_subscribe(&mut self, return_code: SubackReturnCode, success: bool) {}

    /// UNSUBACK arrived for the outstanding UNSUBSCRIBE.
    fn on_unsubscribe(&mut self, success: bool) {}

    /// A publish operation completed (for QoS 0, when the packet was handed
    /// to the transport).
    fn on_publish(&mut self, success: bool) {}

    /// A PUBLISH from the broker was decoded.
    fn on_publish_received(&mut self, publish: &Publish) {}

    /// The connection ended. `expected` is true only for a disconnect the
    /// application requested.
    fn on_disconnect(&mut self, expected: bool) {}
}
