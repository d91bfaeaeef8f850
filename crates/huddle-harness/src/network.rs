//! Simulated network.
//!
//! [`SimNetwork`] owns one [`MemoryChannel`] per client and a [`SimBroker`]
//! standing in for the server. Nothing moves until the test says so:
//! [`SimNetwork::flush`] carries everything clients emitted to the broker and
//! delivers the broker's answers to the addressed channels.

use huddle_core::{channel::Channel, memory::MemoryChannel};
use huddle_proto::MemberId;
use tracing::{debug, trace};

use crate::{
    broker::{Routed, SimBroker},
    error::HarnessError,
};

/// Index of a client in a [`SimNetwork`].
pub type ClientId = usize;

#[derive(Debug, Default)]
struct SimClient {
    channel: MemoryChannel,
    socket_id: Option<MemberId>,
}

/// Clients wired to one broker.
#[derive(Debug, Default)]
pub struct SimNetwork {
    broker: SimBroker,
    clients: Vec<SimClient>,
    next_socket: u64,
}

impl SimNetwork {
    /// Network around the given broker.
    pub fn new(broker: SimBroker) -> Self {
        Self { broker, clients: Vec::new(), next_socket: 0 }
    }

    /// Add a client with a fresh, unconnected channel.
    pub fn add_client(&mut self) -> ClientId {
        self.clients.push(SimClient::default());
        self.clients.len() - 1
    }

    /// Channel of a client, for mounting views on.
    pub fn channel(&mut self, client: ClientId) -> Result<&mut MemoryChannel, HarnessError> {
        self.clients
            .get_mut(client)
            .map(|c| &mut c.channel)
            .ok_or(HarnessError::UnknownClient(client))
    }

    /// Connection id currently assigned to a client.
    pub fn socket_id(&self, client: ClientId) -> Option<&str> {
        self.clients.get(client)?.socket_id.as_deref()
    }

    /// Complete the client's pending connection attempt under a fresh
    /// connection id.
    pub fn connect(&mut self, client: ClientId) -> Result<MemberId, HarnessError> {
        self.next_socket += 1;
        let socket_id = format!("sock-{}", self.next_socket);

        let sim = self.clients.get_mut(client).ok_or(HarnessError::UnknownClient(client))?;
        sim.channel
            .establish(socket_id.clone())
            .map_err(|source| HarnessError::Channel { client, source })?;
        sim.socket_id = Some(socket_id.clone());

        debug!(client, %socket_id, "client connected");
        Ok(socket_id)
    }

    /// Drop the client's transport. The broker forgets its memberships, and
    /// the rest of each room is told.
    pub fn disconnect(&mut self, client: ClientId, reason: &str) -> Result<(), HarnessError> {
        let sim = self.clients.get_mut(client).ok_or(HarnessError::UnknownClient(client))?;
        sim.channel
            .drop_connection(reason)
            .map_err(|source| HarnessError::Channel { client, source })?;
        // Anything the client queued but never flushed dies with the transport.
        sim.channel.take_outbound();

        if let Some(socket_id) = sim.socket_id.take() {
            debug!(client, %socket_id, %reason, "client disconnected");
            let routed = self.broker.disconnect(&socket_id);
            self.route(routed);
        }
        Ok(())
    }

    /// Carry every emitted client event to the broker and deliver the
    /// answers. Returns the number of client events processed.
    pub fn flush(&mut self) -> usize {
        let mut processed = 0;
        for index in 0..self.clients.len() {
            let Some(sim) = self.clients.get_mut(index) else {
                continue;
            };
            let Some(socket_id) = sim.socket_id.clone() else {
                continue;
            };
            for message in sim.channel.take_outbound() {
                processed += 1;
                let routed = self.broker.handle(&socket_id, message);
                self.route(routed);
            }
        }
        trace!(processed, "flushed");
        processed
    }

    /// The broker, for assertions.
    pub fn broker(&self) -> &SimBroker {
        &self.broker
    }

    /// The broker, for setting up rooms.
    pub fn broker_mut(&mut self) -> &mut SimBroker {
        &mut self.broker
    }

    fn route(&mut self, routed: Vec<Routed>) {
        for (to, message) in routed {
            let Some(target) =
                self.clients.iter_mut().find(|c| c.socket_id.as_deref() == Some(to.as_str()))
            else {
                trace!(%to, "no live client for routed event");
                continue;
            };
            if !target.channel.is_connected() {
                continue;
            }
            if let Err(error) = target.channel.deliver(message) {
                debug!(%to, %error, "delivery failed");
            }
        }
    }
}
