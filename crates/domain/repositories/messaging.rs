use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

/// Outbound text channel shared by command replies, payment notices and lesson delivery.
#[async_trait]
#[automock]
pub trait OutboundChannel {
    /// Sends `body` to a canonical `+254...` address and returns the provider message id.
    async fn send_text(&self, to: &str, body: &str) -> Result<String>;
}
