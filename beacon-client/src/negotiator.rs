use async_trait::async_trait;
use beacon_core::{ClientId, SignalingError};

/// Seam to the media engine that actually produces and consumes session
/// descriptions. The signaling client treats sdp and candidate bodies as
/// opaque; a real deployment plugs its WebRTC stack in here.
#[async_trait]
pub trait MediaNegotiator: Send + Sync + 'static {
    async fn create_offer(
        &self,
        peer: ClientId,
        stream_names: &[String],
    ) -> Result<String, SignalingError>;

    async fn create_answer(
        &self,
        peer: ClientId,
        offer_sdp: &str,
        stream_names: &[String],
    ) -> Result<String, SignalingError>;

    async fn apply_answer(&self, peer: ClientId, answer_sdp: &str) -> Result<(), SignalingError>;

    async fn add_remote_candidate(
        &self,
        peer: ClientId,
        candidate: &str,
    ) -> Result<(), SignalingError>;

    async fn close_session(&self, peer: ClientId);
}

/// Negotiator that emits placeholder descriptions. Enough to exercise the
/// full signaling exchange without a media engine.
pub struct StubNegotiator;

#[async_trait]
impl MediaNegotiator for StubNegotiator {
    async fn create_offer(
        &self,
        peer: ClientId,
        stream_names: &[String],
    ) -> Result<String, SignalingError> {
        Ok(format!(
            "v=0 beacon-offer peer={peer} streams={}",
            stream_names.join(",")
        ))
    }

    async fn create_answer(
        &self,
        peer: ClientId,
        _offer_sdp: &str,
        stream_names: &[String],
    ) -> Result<String, SignalingError> {
        Ok(format!(
            "v=0 beacon-answer peer={peer} streams={}",
            stream_names.join(",")
        ))
    }

    async fn apply_answer(&self, _peer: ClientId, _answer_sdp: &str) -> Result<(), SignalingError> {
        Ok(())
    }

    async fn add_remote_candidate(
        &self,
        _peer: ClientId,
        _candidate: &str,
    ) -> Result<(), SignalingError> {
        Ok(())
    }

    async fn close_session(&self, _peer: ClientId) {}
}
