use anyhow::{Context, Result};
use beacon_core::{ClientId, RoomJoinSpec, SignalMessage};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Bare WebSocket client speaking the signaling protocol, for driving the
/// server end to end.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _response) = connect_async(url)
            .await
            .context("Failed to open websocket")?;
        Ok(Self { ws })
    }

    /// Send a Hello and wait for the Token. Returns the assigned id.
    pub async fn hello(
        &mut self,
        app_name: &str,
        username: Option<&str>,
        rooms: Vec<RoomJoinSpec>,
    ) -> Result<ClientId> {
        self.send(&SignalMessage::Hello {
            app_name: app_name.to_owned(),
            username: username.map(str::to_owned),
            credential: None,
            rooms,
        })
        .await?;

        match self.recv(5000).await? {
            SignalMessage::Token { client_id, .. } => Ok(client_id),
            other => anyhow::bail!("Expected Token, got {other:?}"),
        }
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws
            .send(Message::text(json))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    /// Next protocol frame, skipping transport-level frames.
    pub async fn recv(&mut self, timeout_ms: u64) -> Result<SignalMessage> {
        let deadline = std::time::Duration::from_millis(timeout_ms);
        let start = std::time::Instant::now();

        loop {
            let remaining = deadline
                .checked_sub(start.elapsed())
                .context("Timeout waiting for frame")?;

            let msg = tokio::time::timeout(remaining, self.ws.next())
                .await
                .context("Timeout waiting for frame")?
                .context("Socket closed")?
                .context("Socket error")?;

            if msg.is_text() {
                let text = msg.to_text()?;
                return serde_json::from_str(text).context("Unparseable frame");
            }
            if msg.is_close() {
                anyhow::bail!("Socket closed");
            }
        }
    }

    /// Keep reading until a frame satisfies the predicate.
    pub async fn recv_until(
        &mut self,
        pred: impl Fn(&SignalMessage) -> bool,
        timeout_ms: u64,
    ) -> Result<SignalMessage> {
        let deadline = std::time::Duration::from_millis(timeout_ms);
        let start = std::time::Instant::now();

        loop {
            if start.elapsed() > deadline {
                anyhow::bail!("Timeout waiting for matching frame");
            }
            let msg = self.recv(timeout_ms).await?;
            if pred(&msg) {
                return Ok(msg);
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close socket")?;
        Ok(())
    }
}
