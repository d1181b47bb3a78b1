use beacon_core::{ClientId, SignalMessage};
use beacon_server::RoomCommand;

use crate::integration::{create_test_rooms, init_tracing, occupant};
use crate::utils::{wait_for_signal, SIGNAL_TIMEOUT_MS};

#[tokio::test]
async fn test_client_leaves_others_stay() {
    init_tracing();

    let (manager, mut signal_rx, signaling, behavior) = create_test_rooms();

    let fred = ClientId::new();
    let barney = ClientId::new();

    for (client, name) in [(fred, "fred"), (barney, "barney")] {
        manager
            .send(
                "lobby",
                RoomCommand::Join {
                    client,
                    occupant: occupant(name),
                    parameters: None,
                    seq: None,
                },
            )
            .await
            .expect("Failed to send join");
    }

    wait_for_signal(
        &mut signal_rx,
        |id, msg| {
            *id == fred
                && matches!(msg, SignalMessage::RoomData { room } if room.occupants.len() == 2)
        },
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No two-occupant snapshot");

    manager
        .send(
            "lobby",
            RoomCommand::Leave {
                client: barney,
                seq: Some(7),
            },
        )
        .await
        .expect("Failed to send leave");

    // The leaver gets the ack and the RoomLeft confirmation.
    let ack = wait_for_signal(
        &mut signal_rx,
        |id, msg| *id == barney && matches!(msg, SignalMessage::Ack { .. }),
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No ack");
    assert!(matches!(ack, SignalMessage::Ack { seq: 7, .. }));

    wait_for_signal(
        &mut signal_rx,
        |id, msg| {
            *id == barney
                && matches!(msg, SignalMessage::RoomLeft { room } if room == "lobby")
        },
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No RoomLeft");

    // The stayer sees the shrunken room.
    wait_for_signal(
        &mut signal_rx,
        |id, msg| {
            *id == fred
                && matches!(msg, SignalMessage::RoomData { room } if room.occupants.len() == 1)
        },
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No eviction snapshot");

    assert!(behavior.has_leave(&barney, "lobby").await);
    assert!(signaling.rooms_of(&barney).is_empty());
    assert!(signaling.rooms_of(&fred).contains("lobby"));
}

#[tokio::test]
async fn test_leaving_a_room_you_are_not_in_fails() {
    init_tracing();

    let (manager, mut signal_rx, signaling, _behavior) = create_test_rooms();

    let fred = ClientId::new();
    manager
        .send(
            "lobby",
            RoomCommand::Leave {
                client: fred,
                seq: Some(3),
            },
        )
        .await
        .expect("Failed to send leave");

    let err = wait_for_signal(
        &mut signal_rx,
        |id, msg| *id == fred && matches!(msg, SignalMessage::Error { .. }),
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("No error");
    assert!(matches!(err, SignalMessage::Error { seq: Some(3), .. }));
    assert_eq!(
        signaling.errors_for(&fred).await,
        vec![beacon_core::error::codes::DEVELOPER_ERR.to_owned()]
    );
}
