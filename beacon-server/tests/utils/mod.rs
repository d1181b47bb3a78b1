mod test_behavior;
mod test_client;

pub use mock_signaling::MockSignalingOutput;
pub use signal_helpers::{wait_for_signal, SIGNAL_TIMEOUT_MS};
pub use test_behavior::{BehaviorEvent, TestBehavior};
pub use test_client::TestClient;
