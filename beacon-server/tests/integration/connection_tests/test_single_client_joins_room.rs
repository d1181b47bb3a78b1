use beacon_core::{ClientId, SignalMessage};
use beacon_server::RoomCommand;

use crate::integration::{create_test_rooms, init_tracing, occupant};
use crate::utils::{wait_for_signal, SIGNAL_TIMEOUT_MS};

#[tokio::test]
async fn test_single_client_joins_room() {
    init_tracing();

    let (manager, mut signal_rx, signaling, behavior) = create_test_rooms();

    let client = ClientId::new();
    manager
        .send(
            "lobby",
            RoomCommand::Join {
                client,
                occupant: occupant("fred"),
                parameters: None,
                seq: Some(1),
            },
        )
        .await
        .expect("Failed to send join");

    // The ack is addressed before the snapshot goes out.
    let ack = wait_for_signal(
        &mut signal_rx,
        |id, msg| *id == client && matches!(msg, SignalMessage::Ack { .. }),
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No ack");
    assert!(matches!(ack, SignalMessage::Ack { seq: 1, .. }));

    let data = wait_for_signal(
        &mut signal_rx,
        |id, msg| *id == client && matches!(msg, SignalMessage::RoomData { .. }),
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No room data");

    match data {
        SignalMessage::RoomData { room } => {
            assert_eq!(room.room, "lobby");
            assert_eq!(room.occupants.len(), 1);
            assert_eq!(room.occupants[&client].username.as_deref(), Some("fred"));
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    assert!(behavior.wait_for_events(2, 5000).await, "Expected events");
    assert!(behavior.has_join(&client, "lobby").await);
    assert!(signaling.rooms_of(&client).contains("lobby"));
    assert_eq!(signaling.acks_for(&client).await, vec![(1, "roomJoin".into())]);
    assert_eq!(signaling.room_data_for(&client).await.len(), 1);
}

#[tokio::test]
async fn test_rejoin_is_idempotent() {
    init_tracing();

    let (manager, mut signal_rx, _signaling, _behavior) = create_test_rooms();

    let client = ClientId::new();
    for seq in [1, 2] {
        manager
            .send(
                "lobby",
                RoomCommand::Join {
                    client,
                    occupant: occupant("fred"),
                    parameters: None,
                    seq: Some(seq),
                },
            )
            .await
            .expect("Failed to send join");
    }

    // Both joins ack, but only the first produces a snapshot.
    let mut acks = 0;
    let mut snapshots = 0;
    while let Ok(msg) = wait_for_signal(&mut signal_rx, |_, _| true, 500).await {
        match msg {
            SignalMessage::Ack { .. } => acks += 1,
            SignalMessage::RoomData { room } => {
                snapshots += 1;
                assert_eq!(room.occupants.len(), 1);
            }
            other => panic!("Unexpected frame: {other:?}"),
        }
    }
    assert_eq!(acks, 2);
    assert_eq!(snapshots, 1);
}
