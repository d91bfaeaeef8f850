//! In-process channel.
//!
//! [`MemoryChannel`] implements [`Channel`] without any network underneath.
//! Whoever owns it plays the network's part: completing connection attempts
//! with [`MemoryChannel::establish`], dropping them with
//! [`MemoryChannel::drop_connection`], pushing server events with
//! [`MemoryChannel::deliver`], and collecting what the client sent with
//! [`MemoryChannel::take_outbound`].
//!
//! Semantics match a real reconnecting socket: emits while disconnected are
//! dropped, `connect()` is idempotent, and a drop does not cancel the intent
//! to stay connected.

use std::collections::VecDeque;

use huddle_proto::{ClientMessage, EventKind, MemberId, ServerMessage};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    channel::{Channel, ChannelEvent, ConnectionEpoch, Delivery, Handler, HandlerId, HandlerRegistry},
    error::ChannelError,
};

/// Channel backed by in-process queues.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    handlers: HandlerRegistry,
    outbound: VecDeque<ClientMessage>,
    self_id: Option<MemberId>,
    epoch: ConnectionEpoch,
    connected: bool,
    wants_connection: bool,
    connect_attempts: usize,
    dropped_emits: usize,
}

impl MemoryChannel {
    /// Create a channel that has not started connecting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete a pending connection attempt, starting a new epoch.
    ///
    /// # Errors
    ///
    /// - `NotConnecting` if `connect()` was never called
    /// - `AlreadyConnected` if the transport is already up
    pub fn establish(&mut self, self_id: impl Into<MemberId>) -> Result<usize, ChannelError> {
        if !self.wants_connection {
            return Err(ChannelError::NotConnecting);
        }
        if self.connected {
            return Err(ChannelError::AlreadyConnected);
        }

        let self_id = self_id.into();
        self.connected = true;
        self.epoch = self.epoch.next();
        self.self_id = Some(self_id.clone());
        debug!(epoch = %self.epoch, %self_id, "channel connected");

        Ok(self.dispatch(ChannelEvent::Connected { self_id }))
    }

    /// Drop the transport. The channel stays willing to reconnect.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if the transport is already down
    pub fn drop_connection(&mut self, reason: impl Into<String>) -> Result<usize, ChannelError> {
        if !self.connected {
            return Err(ChannelError::NotConnected);
        }

        let reason = reason.into();
        self.connected = false;
        self.self_id = None;
        debug!(epoch = %self.epoch, %reason, "channel disconnected");

        Ok(self.dispatch(ChannelEvent::Disconnected { reason }))
    }

    /// Push a server event to subscribers.
    ///
    /// Returns the number of handlers invoked.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if the transport is down
    pub fn deliver(&mut self, message: ServerMessage) -> Result<usize, ChannelError> {
        if !self.connected {
            return Err(ChannelError::NotConnected);
        }
        Ok(self.dispatch(ChannelEvent::Server(message)))
    }

    /// Decode a raw wire event and push it to subscribers.
    ///
    /// # Errors
    ///
    /// - `Protocol` if the event name or payload is invalid
    /// - `NotConnected` if the transport is down
    pub fn deliver_raw(&mut self, event: &str, data: &Value) -> Result<usize, ChannelError> {
        let message = ServerMessage::decode_parts(event, data)?;
        self.deliver(message)
    }

    /// Dispatch a delivery exactly as given, bypassing connection checks.
    ///
    /// Models events that reach handlers late, after the connection they
    /// belong to has already been replaced.
    pub fn inject(&mut self, delivery: &Delivery) -> usize {
        self.handlers.dispatch(delivery)
    }

    /// Drain everything the client emitted while connected.
    pub fn take_outbound(&mut self) -> Vec<ClientMessage> {
        self.outbound.drain(..).collect()
    }

    /// Outbound messages not yet drained.
    pub fn outbound(&self) -> impl Iterator<Item = &ClientMessage> {
        self.outbound.iter()
    }

    /// Number of times a connection attempt was started.
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }

    /// Number of emits dropped because the transport was down.
    pub fn dropped_emits(&self) -> usize {
        self.dropped_emits
    }

    /// Number of registered handlers across all event kinds.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Number of registered handlers for one event kind.
    pub fn handler_count_for(&self, kind: EventKind) -> usize {
        self.handlers.count(kind)
    }

    fn dispatch(&mut self, event: ChannelEvent) -> usize {
        let delivery = Delivery { epoch: self.epoch, event };
        let invoked = self.handlers.dispatch(&delivery);
        trace!(kind = %delivery.event.kind(), epoch = %delivery.epoch, invoked, "dispatched");
        invoked
    }
}

impl Channel for MemoryChannel {
    fn connect(&mut self) {
        if self.connected || self.wants_connection {
            return;
        }
        self.wants_connection = true;
        self.connect_attempts += 1;
        debug!("channel connecting");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    fn epoch(&self) -> ConnectionEpoch {
        self.epoch
    }

    fn emit(&mut self, message: ClientMessage) -> bool {
        if !self.connected {
            self.dropped_emits += 1;
            debug!(kind = %message.kind(), "emit dropped while disconnected");
            return false;
        }
        trace!(kind = %message.kind(), "emit");
        self.outbound.push_back(message);
        true
    }

    fn on(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        self.handlers.register(kind, handler)
    }

    fn off(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }
}
