use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::outbound_messages::NewOutboundMessageEntity;

#[async_trait]
#[automock]
pub trait OutboundMessageRepository {
    async fn log_message(&self, message: NewOutboundMessageEntity) -> Result<Uuid>;
}
