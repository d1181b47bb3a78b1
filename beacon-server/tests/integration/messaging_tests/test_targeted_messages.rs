use beacon_core::error::codes;
use beacon_core::{Envelope, SignalMessage, Targeting};
use beacon_server::{ServerOptions, SignalingServer};
use serde_json::json;

use crate::integration::{init_tracing, start_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_room_targeting_reaches_all_other_occupants() {
    init_tracing();

    let server = SignalingServer::new(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut alice = TestClient::connect(&url).await.expect("alice connect");
    let alice_id = alice.hello("demo", Some("alice"), vec![]).await.expect("alice hello");
    let mut bob = TestClient::connect(&url).await.expect("bob connect");
    bob.hello("demo", Some("bob"), vec![]).await.expect("bob hello");
    let mut carol = TestClient::connect(&url).await.expect("carol connect");
    carol
        .hello("demo", Some("carol"), vec![])
        .await
        .expect("carol hello");

    // Everyone settles into the default room.
    for client in [&mut alice, &mut bob, &mut carol] {
        client
            .recv_until(
                |msg| matches!(msg, SignalMessage::RoomData { room } if room.occupants.len() == 3),
                5000,
            )
            .await
            .expect("no full snapshot");
    }

    alice
        .send(&SignalMessage::Message {
            seq: Some(11),
            sender: None,
            envelope: Envelope::json("chat", json!({"text": "hi"}), Targeting::room("default")),
        })
        .await
        .expect("send chat");

    // The sender gets the ack, not a copy.
    let ack = alice
        .recv_until(|msg| matches!(msg, SignalMessage::Ack { .. }), 5000)
        .await
        .expect("no ack");
    assert!(matches!(ack, SignalMessage::Ack { seq: 11, .. }));

    for client in [&mut bob, &mut carol] {
        let msg = client
            .recv_until(|msg| matches!(msg, SignalMessage::Message { .. }), 5000)
            .await
            .expect("no relayed message");
        match msg {
            SignalMessage::Message { sender, envelope, .. } => {
                assert_eq!(sender, Some(alice_id));
                assert_eq!(envelope.msg_type, "chat");
                assert_eq!(envelope.msg_data.as_json(), Some(&json!({"text": "hi"})));
            }
            other => panic!("Unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_client_and_room_targeting_restrict_each_other() {
    init_tracing();

    let server = SignalingServer::new(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut alice = TestClient::connect(&url).await.expect("alice connect");
    alice.hello("demo", Some("alice"), vec![]).await.expect("alice hello");
    let mut bob = TestClient::connect(&url).await.expect("bob connect");
    let bob_id = bob.hello("demo", Some("bob"), vec![]).await.expect("bob hello");

    alice
        .recv_until(
            |msg| matches!(msg, SignalMessage::RoomData { room } if room.occupants.len() == 2),
            5000,
        )
        .await
        .expect("no snapshot");

    // Bob is in "default", not "game": the AND of both fields matches nothing.
    alice
        .send(&SignalMessage::Message {
            seq: Some(21),
            sender: None,
            envelope: Envelope::json(
                "chat",
                json!({"text": "lost"}),
                Targeting::client(bob_id).and_room("game"),
            ),
        })
        .await
        .expect("send");

    let err = alice
        .recv_until(|msg| matches!(msg, SignalMessage::Error { .. }), 5000)
        .await
        .expect("no rejection");
    match err {
        SignalMessage::Error { seq, code, .. } => {
            assert_eq!(seq, Some(21));
            assert_eq!(code, codes::MSG_REJECTED);
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    // Narrowed to the room bob actually occupies, it goes through.
    alice
        .send(&SignalMessage::Message {
            seq: Some(22),
            sender: None,
            envelope: Envelope::json(
                "chat",
                json!({"text": "found"}),
                Targeting::client(bob_id).and_room("default"),
            ),
        })
        .await
        .expect("send");

    bob.recv_until(
        |msg| {
            matches!(msg, SignalMessage::Message { envelope, .. }
                if envelope.msg_data.as_json() == Some(&json!({"text": "found"})))
        },
        5000,
    )
    .await
    .expect("bob never got the message");
}
