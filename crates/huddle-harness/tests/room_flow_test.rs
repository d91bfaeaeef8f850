//! Multi-client room flows.
//!
//! Real views and controllers from `huddle-app` running against the
//! simulated network and broker:
//! - Create, share the code, join
//! - Ownership and kicking
//! - Message relay and echo suppression
//! - Reconnect and rejoin

use huddle_app::{
    IdentityProvider, JoinState, LobbyConfig, LobbyView, MemoryIdentityStore, MessageKind,
    RoomView, Route, SessionConfig, ViewSignal,
};
use huddle_harness::{ClientId, SimBroker, SimEnv, SimNetwork};

type TestResult = Result<(), Box<dyn std::error::Error>>;

struct Client {
    id: ClientId,
    identity: IdentityProvider<MemoryIdentityStore>,
    env: SimEnv,
}

impl Client {
    fn new(network: &mut SimNetwork, name: &str, seed: u64) -> Self {
        Self {
            id: network.add_client(),
            identity: IdentityProvider::new(MemoryIdentityStore::with_name(name)),
            env: SimEnv::with_seed(seed),
        }
    }

    fn enter(
        &self,
        network: &mut SimNetwork,
        room_id: &str,
    ) -> Result<RoomView<SimEnv>, Box<dyn std::error::Error>> {
        let channel = network.channel(self.id)?;
        let view = RoomView::mount(
            channel,
            self.env.clone(),
            &self.identity,
            room_id,
            SessionConfig::default(),
        )?;
        Ok(view)
    }
}

fn pump(
    network: &mut SimNetwork,
    client: &Client,
    view: &mut RoomView<SimEnv>,
) -> Vec<ViewSignal> {
    match network.channel(client.id) {
        Ok(channel) => view.pump(channel),
        Err(_) => Vec::new(),
    }
}

/// Alice creates a room in the lobby and enters it; returns the room id.
fn create_room(
    network: &mut SimNetwork,
    alice: &Client,
) -> Result<String, Box<dyn std::error::Error>> {
    let channel = network.channel(alice.id)?;
    let mut lobby = LobbyView::mount(channel, alice.env.clone(), LobbyConfig::default());
    network.connect(alice.id)?;

    lobby.create_room(network.channel(alice.id)?);
    network.flush();
    let signals = lobby.pump(network.channel(alice.id)?);
    lobby.unmount(network.channel(alice.id)?);

    match signals.as_slice() {
        [ViewSignal::Navigate(Route::Room(room_id))] => Ok(room_id.clone()),
        other => Err(format!("expected navigation to a room, got {other:?}").into()),
    }
}

#[test]
fn create_share_and_join() -> TestResult {
    let mut network = SimNetwork::default();
    let alice = Client::new(&mut network, "Alice", 1);
    let bob = Client::new(&mut network, "Bob", 2);

    let room_id = create_room(&mut network, &alice)?;
    let mut alice_view = alice.enter(&mut network, &room_id)?;
    network.flush();
    pump(&mut network, &alice, &mut alice_view);
    assert_eq!(alice_view.session().state(), JoinState::Joined);
    assert!(alice_view.session().is_owner());

    let mut bob_view = bob.enter(&mut network, &room_id)?;
    network.connect(bob.id)?;
    pump(&mut network, &bob, &mut bob_view);
    network.flush();
    pump(&mut network, &alice, &mut alice_view);
    pump(&mut network, &bob, &mut bob_view);

    assert_eq!(bob_view.session().state(), JoinState::Joined);
    assert!(!bob_view.session().is_owner());

    let alice_sock = network.socket_id(alice.id).ok_or("alice offline")?.to_string();
    let bob_sock = network.socket_id(bob.id).ok_or("bob offline")?.to_string();
    for view in [&alice_view, &bob_view] {
        let members = view.session().members();
        assert_eq!(members.len(), 2);
        assert!(members.contains(&alice_sock));
        assert!(members.contains(&bob_sock));
    }

    assert!(alice_view.session().can_kick(&bob_sock));
    assert!(!bob_view.session().can_kick(&alice_sock));

    // Alice saw Bob arrive.
    let announcements: Vec<&str> = alice_view
        .session()
        .timeline()
        .messages()
        .iter()
        .filter(|m| m.kind == MessageKind::System)
        .map(|m| m.text.as_str())
        .collect();
    assert_eq!(announcements, vec!["Bob đã tham gia phòng"]);
    Ok(())
}

#[test]
fn messages_relay_without_duplicates() -> TestResult {
    for broker in [SimBroker::new(), SimBroker::without_client_ids()] {
        let mut network = SimNetwork::new(broker);
        network.broker_mut().open_room("R1");
        let alice = Client::new(&mut network, "Alice", 3);
        let bob = Client::new(&mut network, "Bob", 4);

        let mut alice_view = alice.enter(&mut network, "R1")?;
        let mut bob_view = bob.enter(&mut network, "R1")?;
        network.connect(alice.id)?;
        network.connect(bob.id)?;
        pump(&mut network, &alice, &mut alice_view);
        pump(&mut network, &bob, &mut bob_view);
        network.flush();
        pump(&mut network, &alice, &mut alice_view);
        pump(&mut network, &bob, &mut bob_view);

        alice_view.send(network.channel(alice.id)?, "hello");
        network.flush();
        pump(&mut network, &alice, &mut alice_view);
        pump(&mut network, &bob, &mut bob_view);

        let chat = |view: &RoomView<SimEnv>| -> Vec<(String, String)> {
            view.session()
                .timeline()
                .messages()
                .iter()
                .filter(|m| m.kind != MessageKind::System)
                .map(|m| (m.sender.clone(), m.text.clone()))
                .collect()
        };
        let expected = vec![("Alice".to_string(), "hello".to_string())];
        assert_eq!(chat(&alice_view), expected);
        assert_eq!(chat(&bob_view), expected);
        let timeline = alice_view.session().timeline();
        let last = timeline.messages().last().ok_or("empty timeline")?;
        assert!(timeline.is_own(last));
    }
    Ok(())
}

#[test]
fn owner_kicks_member() -> TestResult {
    let mut network = SimNetwork::default();
    network.broker_mut().open_room("R1");
    let alice = Client::new(&mut network, "Alice", 5);
    let bob = Client::new(&mut network, "Bob", 6);

    let mut alice_view = alice.enter(&mut network, "R1")?;
    network.connect(alice.id)?;
    pump(&mut network, &alice, &mut alice_view);
    network.flush();
    pump(&mut network, &alice, &mut alice_view);

    let mut bob_view = bob.enter(&mut network, "R1")?;
    network.connect(bob.id)?;
    pump(&mut network, &bob, &mut bob_view);
    network.flush();
    pump(&mut network, &alice, &mut alice_view);
    pump(&mut network, &bob, &mut bob_view);

    let bob_sock = network.socket_id(bob.id).ok_or("bob offline")?.to_string();
    alice_view.kick(network.channel(alice.id)?, &bob_sock);
    network.flush();

    let alice_signals = pump(&mut network, &alice, &mut alice_view);
    let bob_signals = pump(&mut network, &bob, &mut bob_view);

    assert!(alice_signals.is_empty());
    assert!(!alice_view.session().members().contains(&bob_sock));
    assert_eq!(bob_signals, vec![
        ViewSignal::Navigate(Route::Root),
        ViewSignal::Alert("Bạn đã bị đá khỏi phòng.".into()),
    ]);
    assert_eq!(bob_view.session().state(), JoinState::Left);

    // Unmounting after a kick sends nothing further.
    bob_view.unmount(network.channel(bob.id)?);
    assert_eq!(network.flush(), 0);
    assert_eq!(network.channel(bob.id)?.handler_count(), 0);
    Ok(())
}

#[test]
fn non_owner_kick_surfaces_error() -> TestResult {
    let mut network = SimNetwork::default();
    network.broker_mut().open_room("R1");
    let alice = Client::new(&mut network, "Alice", 7);
    let bob = Client::new(&mut network, "Bob", 8);

    let mut alice_view = alice.enter(&mut network, "R1")?;
    network.connect(alice.id)?;
    pump(&mut network, &alice, &mut alice_view);
    network.flush();
    let mut bob_view = bob.enter(&mut network, "R1")?;
    network.connect(bob.id)?;
    pump(&mut network, &bob, &mut bob_view);
    network.flush();
    pump(&mut network, &bob, &mut bob_view);

    let alice_sock = network.socket_id(alice.id).ok_or("alice offline")?.to_string();
    bob_view.kick(network.channel(bob.id)?, &alice_sock);
    network.flush();
    pump(&mut network, &bob, &mut bob_view);

    assert_eq!(bob_view.session().state(), JoinState::Joined);
    assert!(bob_view.session().session().last_error.is_some());
    bob_view.dismiss_error();
    assert!(bob_view.session().session().last_error.is_none());
    Ok(())
}

#[test]
fn reconnect_rejoins_once() -> TestResult {
    let mut network = SimNetwork::default();
    network.broker_mut().open_room("R1");
    let alice = Client::new(&mut network, "Alice", 9);
    let bob = Client::new(&mut network, "Bob", 10);

    let mut alice_view = alice.enter(&mut network, "R1")?;
    let mut bob_view = bob.enter(&mut network, "R1")?;
    network.connect(alice.id)?;
    network.connect(bob.id)?;
    pump(&mut network, &alice, &mut alice_view);
    pump(&mut network, &bob, &mut bob_view);
    network.flush();
    pump(&mut network, &alice, &mut alice_view);
    pump(&mut network, &bob, &mut bob_view);

    let old_sock = network.socket_id(bob.id).ok_or("bob offline")?.to_string();
    network.disconnect(bob.id, "ping timeout")?;
    pump(&mut network, &alice, &mut alice_view);
    pump(&mut network, &bob, &mut bob_view);
    assert!(!bob_view.session().session().connected);
    assert!(!alice_view.session().members().contains(&old_sock));

    let new_sock = network.connect(bob.id)?;
    pump(&mut network, &bob, &mut bob_view);
    assert_eq!(bob_view.session().state(), JoinState::Joining);
    assert_eq!(network.flush(), 1, "exactly one room:join after reconnect");
    pump(&mut network, &alice, &mut alice_view);
    pump(&mut network, &bob, &mut bob_view);

    assert_eq!(bob_view.session().state(), JoinState::Joined);
    assert!(bob_view.session().members().contains(&new_sock));
    assert!(!bob_view.session().members().contains(&old_sock));
    assert!(alice_view.session().members().contains(&new_sock));
    Ok(())
}

#[test]
fn missing_identity_never_joins() -> TestResult {
    let mut network = SimNetwork::default();
    network.broker_mut().open_room("R1");
    let id = network.add_client();
    let identity = IdentityProvider::new(MemoryIdentityStore::default());

    let result = RoomView::mount(
        network.channel(id)?,
        SimEnv::with_seed(11),
        &identity,
        "R1",
        SessionConfig::default(),
    );
    let error = result.err().ok_or("mount should fail without a name")?;
    assert_eq!(error.redirect(), Route::NameEntry);

    assert_eq!(network.channel(id)?.connect_attempts(), 0);
    assert_eq!(network.flush(), 0);
    assert!(network.broker().members("R1").is_empty());
    Ok(())
}
