use async_trait::async_trait;

/// Failure to hand a notification to the external message bus. Logged by the
/// caller, never surfaced to the game core.
#[derive(Debug, thiserror::Error)]
#[error("publish failed: {0}")]
pub struct PublishError(String);

impl PublishError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Outbound hook for match lifecycle notifications. Implementations bridge
/// to whatever bus the deployment uses; delivery is fire-and-forget.
#[async_trait]
pub trait MatchPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<(), PublishError>;
}

/// Default publisher: discards everything.
pub struct NoopPublisher;

#[async_trait]
impl MatchPublisher for NoopPublisher {
    async fn publish(&self, _topic: &str, _payload: serde_json::Value) -> Result<(), PublishError> {
        Ok(())
    }
}
