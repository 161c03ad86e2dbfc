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

mod common;

use mqtt_endpoint_core::mqtt::config::ClientConfig;
use mqtt_endpoint_core::mqtt::endpoint::{ClientState, MqttClient};
use mqtt_endpoint_core::mqtt::packet::Qos;
use mqtt_endpoint_core::mqtt::result_code::MqttError;

#[test]
fn test_task_only_client_stays_disconnected() {
    common::init_tracing();
    let mut client = MqttClient::new(ClientConfig::default());
    for _ in 0..10 {
        client.task().unwrap();
        assert_eq!(client.state(), ClientState::Disconnected);
    }
}

#[test]
fn test_session_operations_rejected_while_disconnected() {
    common::init_tracing();
    let mut client = MqttClient::new(ClientConfig::default());
    assert_eq!(
        client.publish("t", b"x", Qos::AtMostOnce, false),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(
        client.subscribe("t", Qos::AtMostOnce),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(client.unsubscribe("t"), Err(MqttError::ClientInvalidState));
    assert_eq!(client.disconnect(), Err(MqttError::ClientInvalidState));
}

#[test]
fn test_session_operations_rejected_while_connecting() {
    common::init_tracing();
    let mut client = MqttClient::new(ClientConfig::default());
    client.set_client_id("cid1").unwrap();
    client.connect("127.0.0.1", 18883).unwrap();
    assert_eq!(client.state(), ClientState::TcpConnecting);

    assert_eq!(
        client.publish("t", b"x", Qos::AtMostOnce, false),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(
        client.subscribe("t", Qos::AtMostOnce),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(client.disconnect(), Err(MqttError::ClientInvalidState));
}

#[test]
fn test_configuration_locked_outside_disconnected() {
    common::init_tracing();
    let mut client = MqttClient::new(ClientConfig::default());
    client.set_client_id("cid1").unwrap();
    client.connect("127.0.0.1", 18883).unwrap();

    assert_eq!(
        client.set_client_id("other"),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(client.set_keepalive(10), Err(MqttError::ClientInvalidState));
    assert_eq!(
        client.set_will("w", b"gone", Qos::AtMostOnce, false),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(
        client.set_credentials("user", None),
        Err(MqttError::ClientInvalidState)
    );
    assert_eq!(
        client.set_poll_period(5),
        Err(MqttError::ClientInvalidState)
    );
    // a second connect is equally invalid
    assert_eq!(
        client.connect("127.0.0.1", 18883),
        Err(MqttError::ClientInvalidState)
    );
}

#[test]
fn test_parameter_validation() {
    common::init_tracing();
    let mut client = MqttClient::new(ClientConfig::default());
    assert_eq!(client.set_client_id(""), Err(MqttError::InvalidParam));
    assert_eq!(client.set_poll_period(0), Err(MqttError::InvalidParam));
    assert_eq!(
        client.set_broker_response_timeout(0),
        Err(MqttError::InvalidParam)
    );
    assert_eq!(
        client.set_credentials("", None),
        Err(MqttError::InvalidParam)
    );
    // connect without a client id configured
    assert_eq!(
        client.connect("127.0.0.1", 1883),
        Err(MqttError::InvalidParam)
    );
}

#[test]
fn test_will_qos_is_capped_by_config() {
    common::init_tracing();
    let config = ClientConfig {
        max_qos: Qos::AtMostOnce,
        ..ClientConfig::default()
    };
    let mut client = MqttClient::new(config);
    assert_eq!(
        client.set_will("w", b"gone", Qos::AtLeastOnce, false),
        Err(MqttError::InvalidParam)
    );
    assert!(client.set_will("w", b"gone", Qos::AtMostOnce, false).is_ok());
}

#[test]
fn test_user_data_round_trip() {
    common::init_tracing();
    let mut client = MqttClient::new(ClientConfig::default());
    client.set_user_data(Box::new(41u32)).unwrap();
    let value = client
        .user_data()
        .and_then(|data| data.downcast_mut::<u32>())
        .expect("stored u32");
    *value += 1;
    assert_eq!(
        client
            .user_data()
            .and_then(|data| data.downcast_ref::<u32>()),
        Some(&42)
    );
}
