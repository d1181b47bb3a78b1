use beacon_core::SignalMessage;
use beacon_server::{ServerOptions, SignalingServer};

use crate::integration::{init_tracing, start_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_ws_handshake_and_room_updates() {
    init_tracing();

    let server = SignalingServer::new(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut alice = TestClient::connect(&url).await.expect("alice connect");
    let alice_id = alice
        .hello("demo", Some("alice"), vec![])
        .await
        .expect("alice hello");

    // The default room is joined automatically.
    let data = alice
        .recv_until(|msg| matches!(msg, SignalMessage::RoomData { .. }), 5000)
        .await
        .expect("no room data");
    match &data {
        SignalMessage::RoomData { room } => {
            assert_eq!(room.room, "default");
            assert_eq!(room.occupants.len(), 1);
            assert_eq!(
                room.occupants[&alice_id].username.as_deref(),
                Some("alice")
            );
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    let mut bob = TestClient::connect(&url).await.expect("bob connect");
    let bob_id = bob
        .hello("demo", Some("bob"), vec![])
        .await
        .expect("bob hello");

    // Alice observes bob arriving.
    alice
        .recv_until(
            |msg| {
                matches!(msg, SignalMessage::RoomData { room }
                    if room.occupants.len() == 2 && room.occupants.contains_key(&bob_id))
            },
            5000,
        )
        .await
        .expect("alice never saw bob");

    // Ice config and room list are served on demand.
    alice
        .send(&SignalMessage::GetIceConfig { seq: Some(4) })
        .await
        .expect("send get ice");
    let ice = alice
        .recv_until(|msg| matches!(msg, SignalMessage::IceConfig { .. }), 5000)
        .await
        .expect("no ice config");
    match ice {
        SignalMessage::IceConfig { seq, ice_servers } => {
            assert_eq!(seq, Some(4));
            assert!(!ice_servers.is_empty());
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    alice
        .send(&SignalMessage::GetRoomList { seq: Some(5) })
        .await
        .expect("send get room list");
    let list = alice
        .recv_until(|msg| matches!(msg, SignalMessage::RoomList { .. }), 5000)
        .await
        .expect("no room list");
    match list {
        SignalMessage::RoomList { rooms, .. } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].room_name, "default");
            assert_eq!(rooms[0].number_clients, 2);
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    // Dropping bob's socket evicts him.
    bob.close().await.expect("bob close");
    alice
        .recv_until(
            |msg| {
                matches!(msg, SignalMessage::RoomData { room }
                    if room.occupants.len() == 1 && !room.occupants.contains_key(&bob_id))
            },
            5000,
        )
        .await
        .expect("alice never saw bob leave");

    alice.close().await.expect("alice close");
}
