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
use std::sync::Once;
use std::time::{Duration, Instant};

use mqtt_endpoint_core::mqtt::config::{BrokerConfig, ClientConfig};
use mqtt_endpoint_core::mqtt::endpoint::{MqttBroker, MqttClient};
use mqtt_endpoint_core::mqtt::result_code::MqttError;
use mqtt_endpoint_core::mqtt::stream::{BufferOutputStream, OutputStream};

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Serialize one packet through the stream layer into owned bytes.
#[allow(dead_code)]
pub fn encode_to_vec(
    encode: impl FnOnce(&mut dyn OutputStream) -> Result<(), MqttError>,
) -> Vec<u8> {
    let mut buf = [0u8; 8192];
    let mut outstream = BufferOutputStream::new(&mut buf);
    encode(&mut outstream).expect("encode failed");
    outstream.written().to_vec()
}

/// Client configuration with short poll periods so interleaved
/// single-threaded tests stay fast.
#[allow(dead_code)]
pub fn fast_client_config() -> ClientConfig {
    ClientConfig {
        poll_period_ms: 10,
        broker_response_timeout_ms: 2000,
        ..ClientConfig::default()
    }
}

#[allow(dead_code)]
pub fn fast_broker_config() -> BrokerConfig {
    BrokerConfig {
        poll_period_ms: 5,
        ..BrokerConfig::default()
    }
}

/// Interleave a broker and any number of clients on the calling thread
/// until `done` reports true or the timeout elapses. Returns whether `done`
/// was reached.
#[allow(dead_code)]
pub fn drive(
    broker: &mut MqttBroker,
    clients: &mut [&mut MqttClient],
    timeout: Duration,
    mut done: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        broker.task().expect("broker task");
        for client in clients.iter_mut() {
            client.task().expect("client task");
        }
        if done() {
            return true;
        }
    }
    false
}
