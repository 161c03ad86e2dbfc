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
use std::any::Any;
use std::io::ErrorKind;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::mqtt::config::ClientConfig;
use crate::mqtt::endpoint::event::ClientEventHandler;
use crate::mqtt::packet::{
    Connack, Connect, Credentials, Disconnect, PacketHeader, PacketType, Pingreq, Pingresp,
    Publish, Qos, Suback, Subscribe, Unsuback, Unsubscribe, Will,
};
use crate::mqtt::result_code::{ConnackReturnCode, MqttError};
use crate::mqtt::stream::{SocketInputStream, SocketOutputStream};
use crate::mqtt::time::Timer;

/// Client endpoint state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientState {
    /// No connection; configuration operations are accepted here.
    Disconnected = 1,
    /// TCP connect initiated, not yet established.
    TcpConnecting = 2,
    /// CONNECT sent, waiting for CONNACK.
    MqttConnecting = 3,
    /// Session established; publish/subscribe operations are accepted here.
    MqttConnected = 4,
    /// DISCONNECT sent; the next task step completes the transition.
    MqttDisconnecting = 5,
}

/// One packet worth of inbound work, decoded off the socket.
enum Inbound {
    Publish(Publish),
    Suback(Suback),
    Unsuback,
    Pingresp,
}

/// MQTT v3.1.1 client endpoint.
///
/// A state machine connecting one client to a broker over TCP. The client
/// never creates threads: the application drives it by calling [`task`]
/// periodically, and each task step polls the socket for at most the
/// configured poll period, advances the state machine, checks the timers and
/// delivers any completed event through the installed
/// [`ClientEventHandler`]. Concurrency, if any, is supplied by the caller
/// (the endpoint is `Send`; share it behind a mutex and every operation
/// observes a total order).
///
/// [`task`]: MqttClient::task
///
/// # Examples
///
/// ```ignore
/// use mqtt_endpoint_core::mqtt::config::ClientConfig;
/// use mqtt_endpoint_core::mqtt::endpoint::MqttClient;
///
/// let mut client = MqttClient::new(ClientConfig::default());
/// client.set_client_id("sensor-7").unwrap();
/// client.set_keepalive(60).unwrap();
/// client.connect("127.0.0.1", 1883).unwrap();
/// loop {
///     client.task().unwrap();
/// }
/// ```
pub struct MqttClient {
    config: ClientConfig,
    state: ClientState,
    client_id: String,
    credentials: Option<Credentials>,
    will: Option<Will>,
    handler: Option<Box<dyn ClientEventHandler + Send>>,
    user_data: Option<Box<dyn Any + Send>>,
    keepalive: u16,
    packet_id: u16,
    remote: Option<SocketAddr>,
    socket: Option<TcpStream>,
    keepalive_timer: Timer,
    response_timer: Timer,
    waiting_response: bool,
}

impl MqttClient {
    /// Create a client in `Disconnected` with the given capacities.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: ClientState::Disconnected,
            client_id: String::new(),
            credentials: None,
            will: None,
            handler: None,
            user_data: None,
            keepalive: 0,
            packet_id: 0,
            remote: None,
            socket: None,
            keepalive_timer: Timer::new(),
            response_timer: Timer::new(),
            waiting_response: false,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ClientState::MqttConnected
    }

    fn check_disconnected(&self) -> Result<(), MqttError> {
        if self.state == ClientState::Disconnected {
            Ok(())
        } else {
            Err(MqttError::ClientInvalidState)
        }
    }

    /// Set the client identifier. Only valid in `Disconnected`.
    pub fn set_client_id(&mut self, client_id: impl Into<String>) -> Result<(), MqttError> {
        self.check_disconnected()?;
        let client_id = client_id.into();
        if client_id.is_empty() || client_id.len() > crate::mqtt::packet::MqttString::MAX_SIZE {
            return Err(MqttError::InvalidParam);
        }
        self.client_id = client_id;
        Ok(())
    }

    /// Set the credentials carried in CONNECT. Only valid in `Disconnected`.
    pub fn set_credentials(
        &mut self,
        username: &str,
        password: Option<&[u8]>,
    ) -> Result<(), MqttError> {
        self.check_disconnected()?;
        if username.is_empty() {
            return Err(MqttError::InvalidParam);
        }
        self.credentials = Some(Credentials::new(username, password)?);
        Ok(())
    }

    /// Set the will carried in CONNECT. Only valid in `Disconnected`; the
    /// will QoS must not exceed the configured maximum.
    pub fn set_will(
        &mut self,
        topic: &str,
        message: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), MqttError> {
        self.check_disconnected()?;
        if topic.is_empty() || qos > self.config.max_qos {
            return Err(MqttError::InvalidParam);
        }
        self.will = Some(Will::new(topic, message, qos, retain)?);
        Ok(())
    }

    /// Install the event sink. Only valid in `Disconnected`.
    pub fn set_handler(
        &mut self,
        handler: Box<dyn ClientEventHandler + Send>,
    ) -> Result<(), MqttError> {
        self.check_disconnected()?;
        self.handler = Some(handler);
        Ok(())
    }

    /// Set the keepalive in seconds (0 disables). Only valid in
    /// `Disconnected`.
    pub fn set_keepalive(&mut self, keepalive_sec: u16) -> Result<(), MqttError> {
        self.check_disconnected()?;
        self.keepalive = keepalive_sec;
        Ok(())
    }

    /// Set the broker response deadline in milliseconds. Only valid in
    /// `Disconnected`.
    pub fn set_broker_response_timeout(&mut self, timeout_ms: u64) -> Result<(), MqttError> {
        self.check_disconnected()?;
        if timeout_ms == 0 {
            return Err(MqttError::InvalidParam);
        }
        self.config.broker_response_timeout_ms = timeout_ms;
        Ok(())
    }

    /// Set the bounded poll period of one task step, in milliseconds. Only
    /// valid in `Disconnected`.
    pub fn set_poll_period(&mut self, poll_period_ms: u64) -> Result<(), MqttError> {
        self.check_disconnected()?;
        if poll_period_ms == 0 {
            return Err(MqttError::InvalidParam);
        }
        self.config.poll_period_ms = poll_period_ms;
        Ok(())
    }

    /// Store an opaque user context. Only valid in `Disconnected`.
    pub fn set_user_data(&mut self, user_data: Box<dyn Any + Send>) -> Result<(), MqttError> {
        self.check_disconnected()?;
        self.user_data = Some(user_data);
        Ok(())
    }

    /// Borrow the stored user context.
    pub fn user_data(&mut self) -> Option<&mut (dyn Any + Send)> {
        self.user_data.as_deref_mut()
    }

    /// Initiate a connection to `host:port`.
    ///
    /// Only valid in `Disconnected`. The TCP connect itself happens inside
    /// subsequent [`task`](Self::task) steps, each attempt bounded by the
    /// poll period, so this never blocks.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), MqttError> {
        if host.is_empty() || self.client_id.is_empty() {
            return Err(MqttError::InvalidParam);
        }
        self.check_disconnected()?;
        let remote = (host, port)
            .to_socket_addrs()
            .map_err(|_| MqttError::InvalidParam)?
            .next()
            .ok_or(MqttError::InvalidParam)?;
        info!(%remote, client_id = %self.client_id, "connecting");
        self.remote = Some(remote);
        self.state = ClientState::TcpConnecting;
        Ok(())
    }

    /// Gracefully disconnect: send DISCONNECT, close the socket and let the
    /// next task step finish the transition. Only valid in `MqttConnected`.
    pub fn disconnect(&mut self) -> Result<(), MqttError> {
        if self.state != ClientState::MqttConnected {
            return Err(MqttError::ClientInvalidState);
        }
        if let Some(socket) = self.socket.as_ref() {
            let mut outstream = SocketOutputStream::new(socket);
            if let Err(err) = Disconnect::new().encode(&mut outstream) {
                warn!(%err, "DISCONNECT not sent");
            }
        }
        self.state = ClientState::MqttDisconnecting;
        self.socket = None;
        Ok(())
    }

    /// Subscribe to one topic. Only valid in `MqttConnected`; sets
    /// waiting-for-response until the SUBACK arrives or the response timer
    /// fires.
    pub fn subscribe(&mut self, topic: &str, qos: Qos) -> Result<(), MqttError> {
        if topic.is_empty() || qos > self.config.max_qos {
            return Err(MqttError::InvalidParam);
        }
        if self.state != ClientState::MqttConnected {
            return Err(MqttError::ClientInvalidState);
        }
        let packet_id = self.next_packet_id();
        let packet = Subscribe::builder()
            .packet_id(packet_id)
            .topic(topic)?
            .qos(qos)
            .build()?;
        debug!(topic, ?qos, packet_id, "subscribe");
        self.send_while_connected(|outstream| packet.encode(outstream))?;
        self.keepalive_timer.reset();
        self.response_timer
            .start(self.config.broker_response_timeout_ms, false);
        self.waiting_response = true;
        Ok(())
    }

    /// Unsubscribe from one topic. Only valid in `MqttConnected`; sets
    /// waiting-for-response until the UNSUBACK arrives or the response
    /// timer fires.
    pub fn unsubscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        if topic.is_empty() {
            return Err(MqttError::InvalidParam);
        }
        if self.state != ClientState::MqttConnected {
            return Err(MqttError::ClientInvalidState);
        }
        let packet_id = self.next_packet_id();
        let packet = Unsubscribe::builder()
            .packet_id(packet_id)
            .topic(topic)?
            .build()?;
        debug!(topic, packet_id, "unsubscribe");
        self.send_while_connected(|outstream| packet.encode(outstream))?;
        self.keepalive_timer.reset();
        self.response_timer
            .start(self.config.broker_response_timeout_ms, false);
        self.waiting_response = true;
        Ok(())
    }

    /// Publish a message. Only valid in `MqttConnected`.
    pub fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: Qos,
        retain: bool,
    ) -> Result<(), MqttError> {
        if topic.is_empty() || qos > self.config.max_qos {
            return Err(MqttError::InvalidParam);
        }
        if self.state != ClientState::MqttConnected {
            return Err(MqttError::ClientInvalidState);
        }
        let mut builder = Publish::builder()
            .topic(topic)?
            .payload(payload)
            .qos(qos)
            .retain(retain);
        if qos.needs_packet_id() {
            builder = builder.packet_id(self.next_packet_id());
        }
        let packet = builder.build()?;
        debug!(topic, ?qos, retain, len = payload.len(), "publish");
        self.send_while_connected(|outstream| packet.encode(outstream))?;
        self.keepalive_timer.reset();
        if let Some(handler) = self.handler.as_mut() {
            handler.on_publish(true);
        }
        Ok(())
    }

    /// One step of the state machine.
    ///
    /// Polls the socket for at most the configured poll period, advances the
    /// state machine, checks the timers and delivers completed events. Never
    /// blocks longer than the poll period.
    pub fn task(&mut self) -> Result<(), MqttError> {
        let disconnected = match self.state {
            ClientState::Disconnected => false,
            ClientState::MqttDisconnecting => {
                self.state = ClientState::Disconnected;
                false
            }
            ClientState::TcpConnecting => self.task_tcp_connecting(),
            ClientState::MqttConnecting => self.task_mqtt_connecting(),
            ClientState::MqttConnected => self.task_mqtt_connected(),
        };
        if disconnected {
            self.disconnect_with_notification();
        }
        Ok(())
    }

    /// Allocate the next packet identifier; wraps at 0xFFFF and skips zero,
    /// which is reserved for unacknowledged QoS 0 publishes.
    fn next_packet_id(&mut self) -> u16 {
        self.packet_id = if self.packet_id == u16::MAX {
            1
        } else {
            self.packet_id + 1
        };
        self.packet_id
    }

    /// Serialize a packet to the socket from a connected state. A terminal
    /// socket failure tears the connection down and notifies the sink
    /// before the error is returned.
    fn send_while_connected(
        &mut self,
        encode: impl FnOnce(&mut SocketOutputStream<'_>) -> Result<(), MqttError>,
    ) -> Result<(), MqttError> {
        let result = match self.socket.as_ref() {
            Some(socket) => {
                let mut outstream = SocketOutputStream::new(socket);
                encode(&mut outstream)
            }
            None => Err(MqttError::SocketFailed),
        };
        if let Err(err) = result {
            if err == MqttError::SocketFailed {
                self.disconnect_with_notification();
            }
            return Err(err);
        }
        Ok(())
    }

    fn build_connect(&self) -> Result<Connect, MqttError> {
        let mut builder = Connect::builder()
            .client_id(&self.client_id)?
            .clean_session(true)
            .keepalive(self.keepalive);
        if let Some(credentials) = &self.credentials {
            builder = builder.credentials(credentials.clone());
        }
        if let Some(will) = &self.will {
            builder = builder.will(will.clone());
        }
        builder.build()
    }

    /// Bounded poll for readable bytes: blocks up to the poll period.
    fn poll_readable(&self) -> Result<bool, MqttError> {
        let socket = self.socket.as_ref().ok_or(MqttError::SocketFailed)?;
        let mut probe = [0u8; 1];
        match socket.peek(&mut probe) {
            Ok(0) => Err(MqttError::SocketFailed),
            Ok(_) => Ok(true),
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(false)
            }
            Err(_) => Err(MqttError::SocketFailed),
        }
    }

    /// Returns true when the connection must be torn down.
    fn task_tcp_connecting(&mut self) -> bool {
        let Some(remote) = self.remote else {
            return true;
        };
        let timeout = Duration::from_millis(self.config.poll_period_ms.max(1));
        let socket = match TcpStream::connect_timeout(&remote, timeout) {
            Ok(socket) => socket,
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                // connection still pending, try again next step
                return false;
            }
            Err(err) => {
                warn!(%remote, %err, "tcp connect failed");
                return true;
            }
        };
        if socket.set_read_timeout(Some(timeout)).is_err()
            || socket.set_write_timeout(Some(timeout)).is_err()
        {
            return true;
        }
        let _ = socket.set_nodelay(true);
        self.socket = Some(socket);

        let connect = match self.build_connect() {
            Ok(connect) => connect,
            Err(_) => return true,
        };
        let sent = match self.socket.as_ref() {
            Some(socket) => {
                let mut outstream = SocketOutputStream::new(socket);
                connect.encode(&mut outstream)
            }
            None => Err(MqttError::SocketFailed),
        };
        match sent {
            Ok(()) => {
                debug!(packet = %connect, "CONNECT sent");
                self.state = ClientState::MqttConnecting;
                if self.keepalive != 0 {
                    self.keepalive_timer
                        .start(u64::from(self.keepalive) * 1000, true);
                }
                self.response_timer
                    .start(self.config.broker_response_timeout_ms, false);
                false
            }
            Err(_) => true,
        }
    }

    fn task_mqtt_connecting(&mut self) -> bool {
        match self.poll_readable() {
            Ok(true) => {
                let result = match self.socket.as_ref() {
                    Some(socket) => {
                        let mut instream = SocketInputStream::new(socket);
                        PacketHeader::decode(&mut instream).and_then(|header| {
                            if header.packet_type != PacketType::Connack {
                                return Err(MqttError::InvalidPacketType);
                            }
                            Connack::decode(&mut instream)
                        })
                    }
                    None => Err(MqttError::SocketFailed),
                };
                match result {
                    Ok(connack) if connack.return_code().is_accepted() => {
                        info!(session_present = connack.session_present(), "connected");
                        self.state = ClientState::MqttConnected;
                        self.waiting_response = false;
                        if let Some(handler) = self.handler.as_mut() {
                            handler.on_connect(true, ConnackReturnCode::Accepted);
                        }
                        false
                    }
                    Ok(connack) => {
                        warn!(return_code = %connack.return_code(), "connection refused");
                        if let Some(handler) = self.handler.as_mut() {
                            handler.on_connect(false, connack.return_code());
                        }
                        true
                    }
                    Err(err) => {
                        warn!(%err, "CONNACK not understood");
                        true
                    }
                }
            }
            Ok(false) => self.response_timer.has_expired(),
            Err(_) => true,
        }
    }

    fn task_mqtt_connected(&mut self) -> bool {
        if self.keepalive != 0 && self.keepalive_timer.has_expired() {
            // transient send failures surface at the next poll
            if let Some(socket) = self.socket.as_ref() {
                debug!("PINGREQ");
                let mut outstream = SocketOutputStream::new(socket);
                let _ = Pingreq::new().encode(&mut outstream);
            }
        }
        match self.poll_readable() {
            Ok(true) => self.dispatch_one_packet(),
            Ok(false) => self.waiting_response && self.response_timer.has_expired(),
            Err(_) => true,
        }
    }

    /// Decode and deliver one inbound packet. Returns true on a protocol or
    /// socket failure that must tear the connection down.
    fn dispatch_one_packet(&mut self) -> bool {
        let Some(socket) = self.socket.as_ref() else {
            return true;
        };
        let result: Result<Inbound, MqttError> = {
            let mut instream = SocketInputStream::new(socket);
            PacketHeader::decode(&mut instream).and_then(|header| match header.packet_type {
                PacketType::Publish => Publish::decode(
                    &mut instream,
                    header.flags,
                    header.remaining_length,
                    self.config.max_topic_length,
                    self.config.max_payload_size,
                )
                .map(Inbound::Publish),
                PacketType::Suback => Suback::decode(&mut instream).map(Inbound::Suback),
                PacketType::Unsuback => {
                    Unsuback::decode(&mut instream).map(|_| Inbound::Unsuback)
                }
                PacketType::Pingresp => {
                    Pingresp::decode(header.remaining_length).map(|_| Inbound::Pingresp)
                }
                _ => Err(MqttError::InvalidPacketType),
            })
        };
        match result {
            Ok(Inbound::Publish(publish)) => {
                debug!(packet = %publish, "publish received");
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_publish_received(&publish);
                }
                false
            }
            Ok(Inbound::Suback(suback)) => {
                debug!(packet = %suback, "suback received");
                self.waiting_response = false;
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_subscribe(suback.return_code(), true);
                }
                false
            }
            Ok(Inbound::Unsuback) => {
                debug!("unsuback received");
                self.waiting_response = false;
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_unsubscribe(true);
                }
                false
            }
            Ok(Inbound::Pingresp) => {
                debug!("pingresp received");
                self.waiting_response = false;
                false
            }
            Err(err) => {
                warn!(%err, "inbound packet rejected");
                true
            }
        }
    }

    /// Close the socket and notify the application.
    ///
    /// From `MqttConnected`/`MqttDisconnecting` the sink sees
    /// `on_disconnect(expected)`; from earlier states it sees
    /// `on_connect(false, Disconnected)` because no session was ever
    /// established.
    fn disconnect_with_notification(&mut self) {
        self.socket = None;
        let prior = self.state;
        self.state = ClientState::Disconnected;
        self.keepalive_timer.stop();
        self.response_timer.stop();
        self.waiting_response = false;
        info!(?prior, "disconnected");
        match prior {
            ClientState::MqttConnected | ClientState::MqttDisconnecting => {
                let expected = prior == ClientState::MqttDisconnecting;
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_disconnect(expected);
                }
            }
            _ => {
                if let Some(handler) = self.handler.as_mut() {
                    handler.on_connect(false, ConnackReturnCode::Disconnected);
                }
            }
        }
    }
}
