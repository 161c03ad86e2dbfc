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
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::mqtt::common::{Pool, SlotId};
use crate::mqtt::config::BrokerConfig;
use crate::mqtt::packet::{
    Connack, ConnectLimits, DecodeLimits, FrameDecoder, FrameProgress, Packet, Pingresp, Publish,
    Qos, Suback, Unsuback, Will,
};
use crate::mqtt::result_code::{ConnackReturnCode, MqttError, SubackReturnCode};
use crate::mqtt::stream::{
    BufferInputStream, BufferOutputStream, InputStream, SocketInputStream, SocketOutputStream,
};
use crate::mqtt::time::Timer;

/// Floor for the session keepalive window, applied to 1.5x the client's
/// declared keepalive.
const MIN_KEEPALIVE_MS: u64 = 1000;

/// Scratch allowance for CONNECT credentials (username + password).
const CREDENTIALS_ALLOWANCE: usize = 2 * (2 + 256);

/// Broker endpoint state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BrokerState {
    Stopped = 1,
    Running = 2,
}

/// Per-connection state of one broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum SessionState {
    /// TCP accepted, CONNECT not yet received.
    TcpConnected = 1,
    /// CONNECT accepted, session live.
    MqttConnected = 2,
    /// Being torn down; guards reentrant will delivery.
    Closed = 3,
}

/// One broker-side connection record.
struct Session {
    state: SessionState,
    socket: TcpStream,
    decoder: FrameDecoder,
    /// Scratch the frame decoder copies variable header + payload into.
    frame_buf: Vec<u8>,
    frame_len: usize,
    client_id: String,
    will: Option<Will>,
    keepalive_timer: Timer,
}

impl Session {
    fn new(socket: TcpStream, frame_capacity: usize) -> Self {
        Self {
            state: SessionState::TcpConnected,
            socket,
            decoder: FrameDecoder::new(),
            frame_buf: vec![0u8; frame_capacity],
            frame_len: 0,
            client_id: String::new(),
            will: None,
            keepalive_timer: Timer::new(),
        }
    }
}

/// Topic table entry: name plus the head of its subscription list.
struct Topic {
    name: String,
    sub_head: Option<SlotId>,
}

/// Subscription table entry, threaded through its topic's list.
struct Subscription {
    qos: Qos,
    session: SlotId,
    next: Option<SlotId>,
}

/// What servicing one session produced.
enum SessionEvent {
    /// Nothing available on this session.
    Idle,
    /// Bytes consumed but no complete packet yet.
    Worked,
    /// A whole packet arrived.
    Packet(Packet),
    /// Refuse the connection attempt with a CONNACK, then tear down.
    Reject(ConnackReturnCode),
    /// Tear the session down.
    Teardown { deliver_will: bool },
}

/// MQTT v3.1.1 broker endpoint.
///
/// Listens on TCP, manages a fixed pool of sessions plus topic and
/// subscription tables, and mirrors the client's state-machine discipline:
/// all progress happens inside [`task`], one bounded step at a time, with no
/// threads of its own. Session, topic and subscription records live in
/// bounded pools sized by [`BrokerConfig`]; nothing is allocated per packet
/// on the hot path except the decoded packet itself.
///
/// Each task step accepts at most one pending connection, then round-robins
/// the live sessions in admission order, feeding each session's resumable
/// frame decoder from its non-blocking socket. A completed frame is parsed
/// and answered (CONNACK, SUBACK, UNSUBACK, PINGRESP), PUBLISH packets are
/// re-serialized to every subscriber of the matching topic, and failed or
/// expired sessions are torn down with their will delivered to matching
/// subscribers.
///
/// [`task`]: MqttBroker::task
pub struct MqttBroker {
    config: BrokerConfig,
    state: BrokerState,
    listener: Option<TcpListener>,
    sessions: Pool<Session>,
    topics: Pool<Topic>,
    subscriptions: Pool<Subscription>,
    packet_id: u16,
    limits: DecodeLimits,
    frame_capacity: usize,
}

impl MqttBroker {
    /// Create a broker in `Stopped` with pools sized by `config`.
    pub fn new(config: BrokerConfig) -> Self {
        let limits = DecodeLimits {
            max_topic_length: config.max_topic_length,
            max_payload_size: config.max_payload_size,
            connect: ConnectLimits {
                max_client_id_length: config.max_client_id_length,
                max_will_topic_length: config.max_will_topic_length,
                max_will_message_size: config.max_will_message_size,
            },
        };
        let publish_frame = 2 + config.max_topic_length + 2 + config.max_payload_size;
        let connect_frame = 12
            + 2
            + config.max_client_id_length
            + 2
            + config.max_will_topic_length
            + 2
            + config.max_will_message_size
            + CREDENTIALS_ALLOWANCE;
        let frame_capacity = publish_frame.max(connect_frame);
        Self {
            sessions: Pool::with_capacity(config.max_clients),
            topics: Pool::with_capacity(config.max_topics),
            subscriptions: Pool::with_capacity(config.max_subscriptions),
            state: BrokerState::Stopped,
            listener: None,
            packet_id: 0,
            limits,
            frame_capacity,
            config,
        }
    }

    pub fn state(&self) -> BrokerState {
        self.state
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Address the broker is listening on, once `Running`.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Bind, listen and transition to `Running`.
    ///
    /// On any error the broker remains `Stopped` and the cause surfaces as
    /// the returned error.
    pub fn start(&mut self, host: &str, port: u16) -> Result<(), MqttError> {
        if self.state != BrokerState::Stopped {
            return Err(MqttError::BrokerInvalidState);
        }
        if host.is_empty() {
            return Err(MqttError::InvalidParam);
        }
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| MqttError::InvalidParam)?
            .next()
            .ok_or(MqttError::InvalidParam)?;
        let listener = TcpListener::bind(addr).map_err(|err| {
            warn!(%addr, %err, "bind failed");
            MqttError::SocketFailed
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|_| MqttError::SocketFailed)?;
        info!(%addr, "broker listening");
        self.listener = Some(listener);
        self.state = BrokerState::Running;
        Ok(())
    }

    /// Stop listening and drop every session without delivering wills
    /// (cancellation is not an ungraceful client death). Only valid in
    /// `Running`.
    pub fn stop(&mut self) -> Result<(), MqttError> {
        if self.state != BrokerState::Running {
            return Err(MqttError::BrokerInvalidState);
        }
        info!(sessions = self.sessions.len(), "broker stopping");
        self.listener = None;
        for id in self.sessions.live_ids() {
            self.sessions.release(id);
        }
        for id in self.subscriptions.live_ids() {
            self.subscriptions.release(id);
        }
        for id in self.topics.live_ids() {
            self.topics.release(id);
        }
        self.state = BrokerState::Stopped;
        Ok(())
    }

    /// One step of the broker: accept at most one pending connection, then
    /// service every live session in admission order. Sleeps the configured
    /// poll period when the whole step found no work.
    pub fn task(&mut self) -> Result<(), MqttError> {
        if self.state != BrokerState::Running {
            return Err(MqttError::BrokerInvalidState);
        }

        let mut worked = self.accept_one();

        for id in self.sessions.live_ids() {
            if !self.sessions.is_live(id) {
                // torn down by a cascading failure earlier in this pass
                continue;
            }
            match self.pump_session(id) {
                SessionEvent::Idle => {}
                SessionEvent::Worked => worked = true,
                SessionEvent::Packet(packet) => {
                    worked = true;
                    if let Some(event) = self.handle_packet(id, packet) {
                        self.finish_session(id, event);
                    }
                }
                event @ (SessionEvent::Reject(_) | SessionEvent::Teardown { .. }) => {
                    worked = true;
                    self.finish_session(id, event);
                }
            }
        }

        if !worked {
            thread::sleep(Duration::from_millis(self.config.poll_period_ms));
        }
        Ok(())
    }

    /// Accept at most one pending connection per task step.
    ///
    /// A connection is accepted into a pre-allocated slot from the free
    /// list; with the pool exhausted the socket is accepted and immediately
    /// closed (admission rejection).
    fn accept_one(&mut self) -> bool {
        let Some(listener) = self.listener.as_ref() else {
            return false;
        };
        match listener.accept() {
            Ok((socket, peer)) => {
                if self.sessions.is_full() {
                    info!(%peer, "admission rejected: session pool exhausted");
                    return true;
                }
                if socket.set_nonblocking(true).is_err() {
                    warn!(%peer, "could not make session socket non-blocking");
                    return true;
                }
                let _ = socket.set_nodelay(true);
                let mut session = Session::new(socket, self.frame_capacity);
                // the CONNECT must arrive before this deadline
                session
                    .keepalive_timer
                    .start(self.config.connect_timeout_ms, false);
                let id = self
                    .sessions
                    .allocate(session)
                    .expect("free slot checked above");
                debug!(%peer, slot = id.index(), "session accepted");
                true
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(err) => {
                warn!(%err, "accept failed");
                false
            }
        }
    }

    /// Feed one session's frame decoder from its socket and parse a
    /// completed frame.
    fn pump_session(&mut self, id: SlotId) -> SessionEvent {
        let limits = self.limits;
        let Some(session) = self.sessions.get_mut(id) else {
            return SessionEvent::Idle;
        };

        if session.keepalive_timer.has_expired() {
            debug!(client_id = %session.client_id, "session keepalive expired");
            return SessionEvent::Teardown {
                deliver_will: session.state == SessionState::MqttConnected,
            };
        }

        let (progress, consumed) = {
            let Session {
                socket,
                decoder,
                frame_buf,
                frame_len,
                ..
            } = session;
            let mut instream = SocketInputStream::new(socket);
            let mut outstream = BufferOutputStream::new(&mut frame_buf[*frame_len..]);
            let progress = decoder.feed(&mut instream, &mut outstream);
            let consumed = instream.bytes_read();
            *frame_len += outstream.position();
            (progress, consumed)
        };

        match progress {
            Ok(FrameProgress::InProgress) => {
                if consumed == 0 {
                    SessionEvent::Idle
                } else {
                    SessionEvent::Worked
                }
            }
            Ok(FrameProgress::Complete(header)) => {
                let Some(session) = self.sessions.get_mut(id) else {
                    return SessionEvent::Idle;
                };
                let parsed = {
                    let mut inbuf = BufferInputStream::new(&session.frame_buf[..session.frame_len]);
                    Packet::decode(&header, &mut inbuf, &limits)
                };
                session.frame_len = 0;
                session.keepalive_timer.reset();
                match parsed {
                    Ok(packet) => SessionEvent::Packet(packet),
                    Err(err) => self.reject_for_decode_error(id, err),
                }
            }
            Err(err) => {
                let session_state = self
                    .sessions
                    .get(id)
                    .map(|s| s.state)
                    .unwrap_or(SessionState::Closed);
                debug!(%err, "session framing failed");
                SessionEvent::Teardown {
                    deliver_will: session_state == SessionState::MqttConnected,
                }
            }
        }
    }

    /// Map a packet-decode failure to the session's fate. Pre-CONNECT
    /// violations answer with a refusal CONNACK where the protocol defines
    /// one.
    fn reject_for_decode_error(&self, id: SlotId, err: MqttError) -> SessionEvent {
        let state = self.sessions.get(id).map(|s| s.state);
        if state == Some(SessionState::TcpConnected) {
            return match err {
                MqttError::InvalidProtocolName => {
                    SessionEvent::Reject(ConnackReturnCode::RefusedProtocol)
                }
                MqttError::MqttStringTooSmall => {
                    SessionEvent::Reject(ConnackReturnCode::RefusedClientId)
                }
                MqttError::BufferTooSmall => {
                    SessionEvent::Reject(ConnackReturnCode::ServerUnavailable)
                }
                _ => SessionEvent::Teardown {
                    deliver_will: false,
                },
            };
        }
        SessionEvent::Teardown {
            deliver_will: state == Some(SessionState::MqttConnected),
        }
    }

    /// React to one parsed packet. Returns the session's fate when it must
    /// be rejected or torn down.
    fn handle_packet(&mut self, id: SlotId, packet: Packet) -> Option<SessionEvent> {
        let state = self.sessions.get(id)?.state;
        match (state, packet) {
            (SessionState::TcpConnected, Packet::Connect(connect)) => {
                self.handle_connect(id, connect)
            }
            (SessionState::TcpConnected, _) => {
                // nothing but CONNECT is legal on a fresh connection
                Some(SessionEvent::Teardown {
                    deliver_will: false,
                })
            }
            (SessionState::MqttConnected, Packet::Publish(publish)) => {
                let mut dead = Vec::new();
                self.route_publish(
                    publish.topic().as_str(),
                    publish.payload(),
                    publish.qos(),
                    None,
                    &mut dead,
                );
                self.reap(dead);
                None
            }
            (SessionState::MqttConnected, Packet::Subscribe(subscribe)) => {
                let granted = self.add_subscription(
                    id,
                    subscribe.topic().as_str(),
                    subscribe.qos().min(self.config.max_qos),
                );
                let return_code = match granted {
                    Some(qos) => SubackReturnCode::from(qos),
                    None => SubackReturnCode::Failure,
                };
                debug!(topic = %subscribe.topic(), %return_code, "subscribe");
                match Suback::new(subscribe.packet_id(), return_code) {
                    Ok(suback) => self.reply(id, |outstream| suback.encode(outstream)),
                    // packet id zero is a protocol violation
                    Err(_) => Some(SessionEvent::Teardown { deliver_will: true }),
                }
            }
            (SessionState::MqttConnected, Packet::Unsubscribe(unsubscribe)) => {
                self.remove_subscription(id, unsubscribe.topic().as_str());
                debug!(topic = %unsubscribe.topic(), "unsubscribe");
                match Unsuback::new(unsubscribe.packet_id()) {
                    Ok(unsuback) => self.reply(id, |outstream| unsuback.encode(outstream)),
                    Err(_) => Some(SessionEvent::Teardown { deliver_will: true }),
                }
            }
            (SessionState::MqttConnected, Packet::Pingreq(_)) => {
                self.reply(id, |outstream| Pingresp::new().encode(outstream))
            }
            (SessionState::MqttConnected, Packet::Disconnect(_)) => {
                // expected close, the will dies with the session
                Some(SessionEvent::Teardown {
                    deliver_will: false,
                })
            }
            (SessionState::MqttConnected, _) => Some(SessionEvent::Teardown {
                deliver_will: true,
            }),
            (SessionState::Closed, _) => None,
        }
    }

    fn handle_connect(
        &mut self,
        id: SlotId,
        connect: crate::mqtt::packet::Connect,
    ) -> Option<SessionEvent> {
        if connect.client_id().len() > self.config.max_client_id_length {
            return Some(SessionEvent::Reject(ConnackReturnCode::RefusedClientId));
        }
        let keepalive = connect.keepalive();
        let session = self.sessions.get_mut(id)?;
        session.client_id = connect.client_id().as_str().to_string();
        session.will = connect.will().clone();
        info!(client_id = %session.client_id, keepalive, "session connected");

        if keepalive == 0 {
            session.keepalive_timer.stop();
        } else {
            let period = (u64::from(keepalive) * 1500).max(MIN_KEEPALIVE_MS);
            session.keepalive_timer.start(period, false);
        }
        session.state = SessionState::MqttConnected;

        let connack = Connack::new(false, ConnackReturnCode::Accepted).ok()?;
        self.reply(id, |outstream| connack.encode(outstream))
    }

    /// Serialize a response onto a session's socket. `SocketPending` on the
    /// reply path counts as back-pressure failure for that session.
    fn reply(
        &self,
        id: SlotId,
        encode: impl FnOnce(&mut SocketOutputStream<'_>) -> Result<(), MqttError>,
    ) -> Option<SessionEvent> {
        let session = self.sessions.get(id)?;
        let mut outstream = SocketOutputStream::new(&session.socket);
        match encode(&mut outstream) {
            Ok(()) => None,
            Err(err) => {
                debug!(%err, "session reply failed");
                Some(SessionEvent::Teardown {
                    deliver_will: session.state == SessionState::MqttConnected,
                })
            }
        }
    }

    /// Allocate the next broker-side packet identifier (for fan-out at an
    /// effective QoS above 0); wraps at 0xFFFF, skipping zero.
    fn next_packet_id(&mut self) -> u16 {
        self.packet_id = if self.packet_id == u16::MAX {
            1
        } else {
            self.packet_id + 1
        };
        self.packet_id
    }

    fn find_topic(&self, name: &str) -> Option<SlotId> {
        self.topics
            .iter()
            .find(|(_, topic)| topic.name == name)
            .map(|(id, _)| id)
    }

    /// Reserve or find the topic, reserve a subscription, and link it at
    /// the head of the topic's list. Returns the granted QoS, or `None`
    /// when a pool is exhausted (the caller answers SUBACK 0x80).
    fn add_subscription(&mut self, session: SlotId, topic_name: &str, granted: Qos) -> Option<Qos> {
        let (topic_id, fresh_topic) = match self.find_topic(topic_name) {
            Some(id) => (id, false),
            None => {
                let id = self.topics.allocate(Topic {
                    name: topic_name.to_string(),
                    sub_head: None,
                })?;
                (id, true)
            }
        };

        // a re-subscribe from the same session updates the grant in place
        let mut cursor = self.topics.get(topic_id).and_then(|t| t.sub_head);
        while let Some(sub_id) = cursor {
            let sub = self.subscriptions.get_mut(sub_id)?;
            if sub.session == session {
                sub.qos = granted;
                return Some(granted);
            }
            cursor = sub.next;
        }

        let head = self.topics.get(topic_id).and_then(|t| t.sub_head);
        match self.subscriptions.allocate(Subscription {
            qos: granted,
            session,
            next: head,
        }) {
            Some(sub_id) => {
                self.topics.get_mut(topic_id)?.sub_head = Some(sub_id);
                Some(granted)
            }
            None => {
                if fresh_topic {
                    self.topics.release(topic_id);
                }
                None
            }
        }
    }

    /// Unlink `session`'s subscription from the named topic; an emptied
    /// topic returns to the free list.
    fn remove_subscription(&mut self, session: SlotId, topic_name: &str) {
        let Some(topic_id) = self.find_topic(topic_name) else {
            return;
        };
        let mut prev: Option<SlotId> = None;
        let mut cursor = self.topics.get(topic_id).and_then(|t| t.sub_head);
        while let Some(sub_id) = cursor {
            let Some(sub) = self.subscriptions.get(sub_id) else {
                break;
            };
            let next = sub.next;
            if sub.session == session {
                match prev {
                    Some(prev_id) => {
                        if let Some(prev_sub) = self.subscriptions.get_mut(prev_id) {
                            prev_sub.next = next;
                        }
                    }
                    None => {
                        if let Some(topic) = self.topics.get_mut(topic_id) {
                            topic.sub_head = next;
                        }
                    }
                }
                self.subscriptions.release(sub_id);
                break;
            }
            prev = Some(sub_id);
            cursor = next;
        }
        if self
            .topics
            .get(topic_id)
            .is_some_and(|topic| topic.sub_head.is_none())
        {
            self.topics.release(topic_id);
        }
    }

    /// Fan a message out to every subscriber of the topic (v3.1.1 equality
    /// match; wildcard matching is an extension point).
    ///
    /// Each delivery is re-serialized with the subscription's granted QoS,
    /// downgraded to the publisher's QoS when that is lower. `SocketPending`
    /// on a subscriber drops that delivery (at-most-once semantics);
    /// `SocketFailed` queues the subscriber for teardown via `dead`.
    fn route_publish(
        &mut self,
        topic_name: &str,
        payload: &[u8],
        publish_qos: Qos,
        exclude: Option<SlotId>,
        dead: &mut Vec<SlotId>,
    ) {
        let Some(topic_id) = self.find_topic(topic_name) else {
            debug!(topic = topic_name, "no subscribers");
            return;
        };

        // snapshot the list; delivery below needs the pools again
        let mut targets: Vec<(SlotId, Qos)> = Vec::new();
        let mut cursor = self.topics.get(topic_id).and_then(|t| t.sub_head);
        while let Some(sub_id) = cursor {
            let Some(sub) = self.subscriptions.get(sub_id) else {
                break;
            };
            if Some(sub.session) != exclude {
                targets.push((sub.session, sub.qos));
            }
            cursor = sub.next;
        }

        for (session_id, granted) in targets {
            let effective = granted.min(publish_qos);
            let mut builder = match Publish::builder().topic(topic_name) {
                Ok(builder) => builder.payload(payload).qos(effective),
                Err(_) => return,
            };
            if effective.needs_packet_id() {
                builder = builder.packet_id(self.next_packet_id());
            }
            let Ok(packet) = builder.build() else {
                continue;
            };
            let Some(session) = self.sessions.get(session_id) else {
                continue;
            };
            if session.state != SessionState::MqttConnected {
                continue;
            }
            let mut outstream = SocketOutputStream::new(&session.socket);
            match packet.encode(&mut outstream) {
                Ok(()) => {
                    debug!(topic = topic_name, slot = session_id.index(), "delivered");
                }
                Err(MqttError::SocketPending) => {
                    // back-pressure: at-most-once drops the delivery
                    debug!(slot = session_id.index(), "subscriber busy, dropped");
                }
                Err(_) => dead.push(session_id),
            }
        }
    }

    /// Apply a rejection or teardown decision to a session.
    fn finish_session(&mut self, id: SlotId, event: SessionEvent) {
        match event {
            SessionEvent::Reject(return_code) => {
                if let Ok(connack) = Connack::new(false, return_code) {
                    let _ = self.reply(id, |outstream| connack.encode(outstream));
                }
                self.teardown_session(id, false);
            }
            SessionEvent::Teardown { deliver_will } => {
                self.teardown_session(id, deliver_will);
            }
            _ => {}
        }
    }

    /// Tear a session down: deliver its will (unless the close was
    /// expected), release its subscriptions and any emptied topics, and
    /// return the session slot last.
    fn teardown_session(&mut self, id: SlotId, deliver_will: bool) {
        let Some(session) = self.sessions.get_mut(id) else {
            return;
        };
        if session.state == SessionState::Closed {
            return;
        }
        session.state = SessionState::Closed;
        let client_id = std::mem::take(&mut session.client_id);
        let will = session.will.take();

        let mut dead = Vec::new();
        if deliver_will {
            if let Some(will) = will {
                debug!(client_id = %client_id, topic = %will.topic, "delivering will");
                self.route_publish(
                    will.topic.as_str(),
                    &will.message,
                    will.qos,
                    Some(id),
                    &mut dead,
                );
            }
        }

        // unlink this session's subscriptions from every topic
        for topic_id in self.topics.live_ids() {
            let mut prev: Option<SlotId> = None;
            let mut cursor = self.topics.get(topic_id).and_then(|t| t.sub_head);
            while let Some(sub_id) = cursor {
                let Some(sub) = self.subscriptions.get(sub_id) else {
                    break;
                };
                let next = sub.next;
                if sub.session == id || !self.sessions.is_live(sub.session) {
                    match prev {
                        Some(prev_id) => {
                            if let Some(prev_sub) = self.subscriptions.get_mut(prev_id) {
                                prev_sub.next = next;
                            }
                        }
                        None => {
                            if let Some(topic) = self.topics.get_mut(topic_id) {
                                topic.sub_head = next;
                            }
                        }
                    }
                    self.subscriptions.release(sub_id);
                } else {
                    prev = Some(sub_id);
                }
                cursor = next;
            }
            if self
                .topics
                .get(topic_id)
                .is_some_and(|topic| topic.sub_head.is_none())
            {
                self.topics.release(topic_id);
            }
        }

        // session slot returns last; dropping it closes the socket
        self.sessions.release(id);
        info!(client_id = %client_id, "session closed");

        self.reap(dead);
    }

    /// Tear down sessions whose sockets failed during fan-out; cascades
    /// until the dead-list is drained.
    fn reap(&mut self, dead: Vec<SlotId>) {
        for session_id in dead {
            if self.sessions.is_live(session_id) {
                self.teardown_session(session_id, true);
            }
        }
    }
}
