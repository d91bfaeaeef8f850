//! In-process room server.
//!
//! [`SimBroker`] is a small reference model of the server side of the room
//! protocol. It is addressed by connection id and answers each client event
//! with the server events it would push, without any I/O.
//!
//! Server behaviour modelled here:
//!
//! - `room:create` allocates a room and answers `room:created` to the caller
//! - the first member to join a room owns it; ownership passes to the oldest
//!   remaining member when the owner goes away
//! - a joiner receives `room:joined`, then one `room:member_joined` per
//!   member already present; everyone else receives `room:member_joined`
//! - messages are relayed to every member including the sender
//! - only the owner may kick; the target receives `room:kick` and the rest of
//!   the room `room:member_left`
//! - a dropped connection leaves every room it was in
//! - empty rooms are deleted

use std::collections::BTreeMap;

use huddle_proto::{
    ChatMessage, ClientMessage, InboundMessage, KickMember, Kicked, MemberChange, MemberId,
    OutboundMessage, RoomCreated, RoomError, RoomId, RoomJoined, RoomPresence, ServerMessage,
};
use tracing::{debug, trace};

/// A server event addressed to one connection.
pub type Routed = (MemberId, ServerMessage);

#[derive(Debug, Default)]
struct SimRoom {
    owner: Option<MemberId>,
    /// (connection id, display name) in join order.
    members: Vec<(MemberId, String)>,
}

impl SimRoom {
    fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|(member, _)| member == id)
    }

    fn remove(&mut self, id: &str) -> Option<String> {
        let index = self.members.iter().position(|(member, _)| member == id)?;
        let (_, name) = self.members.remove(index);
        if self.owner.as_deref() == Some(id) {
            self.owner = self.members.first().map(|(member, _)| member.clone());
        }
        Some(name)
    }

    fn broadcast(&self, message: &ServerMessage, out: &mut Vec<Routed>) {
        for (member, _) in &self.members {
            out.push((member.clone(), message.clone()));
        }
    }
}

/// Reference room server.
#[derive(Debug)]
pub struct SimBroker {
    rooms: BTreeMap<RoomId, SimRoom>,
    next_room: u64,
    next_message: u64,
    relay_client_ids: bool,
}

impl Default for SimBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBroker {
    /// Broker that relays correlation ids back to senders.
    pub fn new() -> Self {
        Self { rooms: BTreeMap::new(), next_room: 0, next_message: 0, relay_client_ids: true }
    }

    /// Broker that strips correlation ids from relayed messages, like a
    /// server that predates them.
    pub fn without_client_ids() -> Self {
        Self { relay_client_ids: false, ..Self::new() }
    }

    /// Open a room directly, as if some earlier client had created it.
    pub fn open_room(&mut self, room_id: impl Into<RoomId>) {
        self.rooms.entry(room_id.into()).or_default();
    }

    /// Process one client event.
    pub fn handle(&mut self, from: &str, message: ClientMessage) -> Vec<Routed> {
        trace!(%from, kind = %message.kind(), "broker received");
        let mut out = Vec::new();
        match message {
            ClientMessage::CreateRoom => self.create_room(from, &mut out),
            ClientMessage::Join(presence) => self.join(from, presence, &mut out),
            ClientMessage::Leave(presence) => self.leave(from, &presence.room_id, &mut out),
            ClientMessage::KickMember(request) => self.kick(from, request, &mut out),
            ClientMessage::Message(outbound) => self.relay(from, outbound, &mut out),
        }
        out
    }

    /// The connection went away: leave every room it was in.
    pub fn disconnect(&mut self, id: &str) -> Vec<Routed> {
        let mut out = Vec::new();
        let joined: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, room)| room.contains(id))
            .map(|(room_id, _)| room_id.clone())
            .collect();
        for room_id in joined {
            self.leave(id, &room_id, &mut out);
        }
        out
    }

    /// Connection ids in a room, in join order.
    pub fn members(&self, room_id: &str) -> Vec<MemberId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members.iter().map(|(member, _)| member.clone()).collect())
            .unwrap_or_default()
    }

    /// Current owner of a room.
    pub fn owner(&self, room_id: &str) -> Option<&str> {
        self.rooms.get(room_id)?.owner.as_deref()
    }

    /// Whether a room exists.
    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    fn create_room(&mut self, from: &str, out: &mut Vec<Routed>) {
        self.next_room += 1;
        let room_id = format!("room-{}", self.next_room);
        debug!(%from, %room_id, "room created");
        self.rooms.insert(room_id.clone(), SimRoom::default());
        out.push((from.to_string(), ServerMessage::RoomCreated(RoomCreated { room_id })));
    }

    fn join(&mut self, from: &str, presence: RoomPresence, out: &mut Vec<Routed>) {
        let Some(room) = self.rooms.get_mut(&presence.room_id) else {
            out.push(error_to(from, "room not found"));
            return;
        };

        if let Some(index) = room.members.iter().position(|(member, _)| member == from) {
            room.members[index].1 = presence.sender.clone();
        } else {
            let joined = ServerMessage::MemberJoined(MemberChange {
                member_id: from.to_string(),
                sender: presence.sender.clone(),
            });
            room.broadcast(&joined, out);
            room.members.push((from.to_string(), presence.sender));
        }
        let owner = room.owner.get_or_insert_with(|| from.to_string()).clone();

        out.push((
            from.to_string(),
            ServerMessage::RoomJoined(RoomJoined {
                room_id: presence.room_id.clone(),
                owner_id: Some(owner),
            }),
        ));
        for (member, name) in room.members.iter().filter(|(member, _)| member != from) {
            out.push((
                from.to_string(),
                ServerMessage::MemberJoined(MemberChange {
                    member_id: member.clone(),
                    sender: name.clone(),
                }),
            ));
        }
        debug!(%from, room_id = %presence.room_id, members = room.members.len(), "joined");
    }

    fn leave(&mut self, from: &str, room_id: &str, out: &mut Vec<Routed>) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some(name) = room.remove(from) else {
            return;
        };
        debug!(%from, %room_id, "left");
        let left =
            ServerMessage::MemberLeft(MemberChange { member_id: from.to_string(), sender: name });
        room.broadcast(&left, out);
        self.drop_if_empty(room_id);
    }

    fn kick(&mut self, from: &str, request: KickMember, out: &mut Vec<Routed>) {
        let Some(room) = self.rooms.get_mut(&request.room_id) else {
            out.push(error_to(from, "room not found"));
            return;
        };
        if room.owner.as_deref() != Some(from) {
            out.push(error_to(from, "only the owner can remove members"));
            return;
        }
        if request.target_socket_id == from {
            out.push(error_to(from, "cannot remove yourself"));
            return;
        }
        let Some(name) = room.remove(&request.target_socket_id) else {
            out.push(error_to(from, "member not found"));
            return;
        };

        debug!(%from, target = %request.target_socket_id, room_id = %request.room_id, "kicked");
        out.push((
            request.target_socket_id.clone(),
            ServerMessage::Kick(Kicked { reason: Some("removed by owner".into()) }),
        ));
        let left = ServerMessage::MemberLeft(MemberChange {
            member_id: request.target_socket_id,
            sender: name,
        });
        room.broadcast(&left, out);
    }

    fn relay(&mut self, from: &str, outbound: OutboundMessage, out: &mut Vec<Routed>) {
        let Some(room) = self.rooms.get(&outbound.room_id) else {
            out.push(error_to(from, "room not found"));
            return;
        };
        if !room.contains(from) {
            out.push(error_to(from, "not a member of this room"));
            return;
        }

        self.next_message += 1;
        let message = ServerMessage::Message(InboundMessage::Structured(ChatMessage {
            id: Some(format!("m{}", self.next_message)),
            text: outbound.text,
            sender: Some(outbound.sender),
            timestamp: None,
            client_id: outbound.client_id.filter(|_| self.relay_client_ids),
        }));
        room.broadcast(&message, out);
    }

    fn drop_if_empty(&mut self, room_id: &str) {
        if self.rooms.get(room_id).is_some_and(|room| room.members.is_empty()) {
            debug!(%room_id, "room closed");
            self.rooms.remove(room_id);
        }
    }
}

fn error_to(to: &str, message: &str) -> Routed {
    (to.to_string(), ServerMessage::RoomError(RoomError { message: message.to_string() }))
}
