//! Transport channel contract.
//!
//! A channel is a reconnecting, bidirectional, named-event connection to a
//! single logical endpoint. Outbound traffic is fire-and-forget; inbound
//! traffic is pushed to handlers registered per [`EventKind`].
//!
//! # Connection epochs
//!
//! Every successful connect starts a new [`ConnectionEpoch`]. Each
//! [`Delivery`] is tagged with the epoch it was received in, so a consumer can
//! tell events from a dead connection apart from events on the live one. No
//! ordering is promised across an epoch boundary.
//!
//! # Handlers
//!
//! Handlers are plain closures. Consumers in this workspace only use them to
//! enqueue deliveries; the actual state mutation happens when the consumer
//! drains its queue, which keeps every controller single-owner.

use std::fmt;

use huddle_proto::{ClientMessage, EventKind, MemberId, ServerMessage};

/// One continuous period of connectivity, counted from 1. Epoch 0 means the
/// channel has never connected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionEpoch(u64);

impl ConnectionEpoch {
    /// Epoch of a channel that has never connected.
    pub const NEVER: Self = Self(0);

    /// Epoch following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

/// Identifies a single handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Something the channel has to tell its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Transport connected and was assigned an identity.
    Connected {
        /// Identity assigned by the transport for this epoch.
        self_id: MemberId,
    },
    /// Transport dropped. The channel keeps retrying on its own.
    Disconnected {
        /// Transport-specific reason.
        reason: String,
    },
    /// Event pushed by the server.
    Server(ServerMessage),
}

impl ChannelEvent {
    /// Event kind handlers are registered under.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connected { .. } => EventKind::Connect,
            Self::Disconnected { .. } => EventKind::Disconnect,
            Self::Server(message) => message.kind(),
        }
    }
}

/// A channel event tagged with the epoch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Epoch the event was received in. `Disconnected` carries the epoch
    /// that just ended.
    pub epoch: ConnectionEpoch,
    /// The event itself.
    pub event: ChannelEvent,
}

/// Callback invoked for every matching delivery.
pub type Handler = Box<dyn FnMut(&Delivery) + Send>;

/// Reconnecting, bidirectional, named-event connection.
pub trait Channel {
    /// Start connecting. Idempotent; once called the channel reconnects on
    /// its own after every drop.
    fn connect(&mut self);

    /// Whether the transport is currently up.
    fn is_connected(&self) -> bool;

    /// Identity assigned for the current epoch, `None` while disconnected.
    fn self_id(&self) -> Option<&str>;

    /// Current (or most recent) connection epoch.
    fn epoch(&self) -> ConnectionEpoch;

    /// Send an event. Dropped, not queued, while disconnected.
    ///
    /// Returns `true` if the message was handed to the transport.
    fn emit(&mut self, message: ClientMessage) -> bool;

    /// Register a handler for one event kind.
    fn on(&mut self, kind: EventKind, handler: Handler) -> HandlerId;

    /// Remove a handler. Returns `false` if it was not registered.
    fn off(&mut self, id: HandlerId) -> bool;
}

struct Registration {
    id: HandlerId,
    kind: EventKind,
    handler: Handler,
}

/// Handler bookkeeping shared by channel implementations.
///
/// Registrations are kept in insertion order so that handlers for the same
/// event fire in the order they were added.
#[derive(Default)]
pub struct HandlerRegistry {
    registrations: Vec<Registration>,
    next_id: u64,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler and return its id.
    pub fn register(&mut self, kind: EventKind, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.registrations.push(Registration { id, kind, handler });
        id
    }

    /// Remove a handler by id.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|registration| registration.id != id);
        self.registrations.len() != before
    }

    /// Invoke every handler registered for the delivery's kind.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&mut self, delivery: &Delivery) -> usize {
        let kind = delivery.event.kind();
        let mut invoked = 0;
        for registration in self.registrations.iter_mut().filter(|r| r.kind == kind) {
            (registration.handler)(delivery);
            invoked += 1;
        }
        invoked
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Number of live registrations for one kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.registrations.iter().filter(|r| r.kind == kind).count()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registrations", &self.registrations.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
