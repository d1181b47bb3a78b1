use beacon_core::{Envelope, SignalMessage, Targeting};
use beacon_server::ServerOptions;
use serde_json::json;

use crate::integration::{create_behavior_server, init_tracing, start_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_untargeted_message_goes_to_the_application() {
    init_tracing();

    let (server, behavior) = create_behavior_server(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut client = TestClient::connect(&url).await.expect("connect");
    client.hello("demo", Some("fred"), vec![]).await.expect("hello");

    client
        .send(&SignalMessage::Message {
            seq: Some(9),
            sender: None,
            envelope: Envelope::json("ping", json!({"n": 1}), Targeting::default()),
        })
        .await
        .expect("send");

    let ack = client
        .recv_until(|msg| matches!(msg, SignalMessage::Ack { .. }), 5000)
        .await
        .expect("no ack");
    match ack {
        SignalMessage::Ack { seq, msg_type } => {
            assert_eq!(seq, 9);
            assert_eq!(msg_type, "ping");
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    // TestBehavior echoes the payload back with no sender.
    let reply = client
        .recv_until(|msg| matches!(msg, SignalMessage::Message { .. }), 5000)
        .await
        .expect("no reply");
    match reply {
        SignalMessage::Message { sender, envelope, .. } => {
            assert_eq!(sender, None);
            assert_eq!(envelope.msg_type, "echo");
            assert_eq!(envelope.msg_data.as_json(), Some(&json!({"n": 1})));
        }
        other => panic!("Unexpected frame: {other:?}"),
    }

    assert!(behavior.wait_for_events(1, 5000).await);
    let events = behavior.events().await;
    assert!(events
        .iter()
        .any(|e| matches!(e, crate::utils::BehaviorEvent::ServerMessage(_, t) if t == "ping")));
}
