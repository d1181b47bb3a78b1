use beacon_core::error::codes;
use beacon_core::SignalMessage;
use beacon_server::{ServerOptions, SignalingServer};

use crate::integration::{init_tracing, start_test_server};
use crate::utils::TestClient;

#[tokio::test]
async fn test_hello_required_first() {
    init_tracing();

    let server = SignalingServer::new(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut client = TestClient::connect(&url).await.expect("connect");
    client
        .send(&SignalMessage::RoomJoin {
            seq: Some(1),
            room: "lobby".into(),
            parameters: None,
        })
        .await
        .expect("send");

    match client.recv(5000).await.expect("no reply") {
        SignalMessage::Error { code, .. } => assert_eq!(code, codes::CONNECT_ERR),
        other => panic!("Unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_username_is_rejected() {
    init_tracing();

    let server = SignalingServer::new(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut client = TestClient::connect(&url).await.expect("connect");
    client
        .send(&SignalMessage::Hello {
            app_name: "demo".into(),
            username: Some("fred flintstone".into()),
            credential: None,
            rooms: vec![],
        })
        .await
        .expect("send");

    match client.recv(5000).await.expect("no reply") {
        SignalMessage::Error { code, .. } => assert_eq!(code, codes::BAD_NAME),
        other => panic!("Unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn test_second_hello_is_rejected() {
    init_tracing();

    let server = SignalingServer::new(ServerOptions::default());
    let url = start_test_server(&server).await;

    let mut client = TestClient::connect(&url).await.expect("connect");
    client
        .hello("demo", Some("fred"), vec![])
        .await
        .expect("hello");

    client
        .send(&SignalMessage::Hello {
            app_name: "demo".into(),
            username: None,
            credential: None,
            rooms: vec![],
        })
        .await
        .expect("send");

    let err = client
        .recv_until(|msg| matches!(msg, SignalMessage::Error { .. }), 5000)
        .await
        .expect("no error");
    match err {
        SignalMessage::Error { code, .. } => assert_eq!(code, codes::ALREADY_CONNECTED),
        other => panic!("Unexpected frame: {other:?}"),
    }
}
