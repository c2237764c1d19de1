use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::{
    entities::outbound_messages::NewOutboundMessageEntity,
    repositories::{messaging::OutboundChannel, outbound_messages::OutboundMessageRepository},
    value_objects::enums::{delivery_statuses::DeliveryStatus, message_types::MessageType},
};

/// A message addressed to a known user.
pub struct Delivery<'a> {
    pub user_id: Uuid,
    pub to: &'a str,
    pub message_type: MessageType,
    pub body: &'a str,
}

/// Sends `delivery` and appends one audit row with the outcome. Neither a send failure nor an
/// audit write failure is propagated; the returned status reflects the send only.
pub async fn deliver_and_log<C, O>(
    channel: &C,
    message_log: &O,
    delivery: Delivery<'_>,
) -> DeliveryStatus
where
    C: OutboundChannel + Send + Sync + ?Sized,
    O: OutboundMessageRepository + Send + Sync + ?Sized,
{
    let audit_content = delivery.body;
    deliver_and_log_as(channel, message_log, delivery, audit_content).await
}

/// Like [`deliver_and_log`], but records `audit_content` instead of the sent body.
pub async fn deliver_and_log_as<C, O>(
    channel: &C,
    message_log: &O,
    delivery: Delivery<'_>,
    audit_content: &str,
) -> DeliveryStatus
where
    C: OutboundChannel + Send + Sync + ?Sized,
    O: OutboundMessageRepository + Send + Sync + ?Sized,
{
    let user_id = delivery.user_id;
    let message_type = delivery.message_type;

    let status = match channel.send_text(delivery.to, delivery.body).await {
        Ok(_) => DeliveryStatus::Sent,
        Err(err) => {
            warn!(
                %user_id,
                message_type = %message_type,
                error = ?err,
                "delivery: outbound send failed"
            );
            DeliveryStatus::Failed
        }
    };

    let entry = NewOutboundMessageEntity {
        user_id,
        message_type: message_type.to_string(),
        content: audit_content.to_string(),
        sent_at: Utc::now(),
        delivery_status: status.to_string(),
    };

    if let Err(err) = message_log.log_message(entry).await {
        error!(
            %user_id,
            message_type = %message_type,
            db_error = ?err,
            "delivery: failed to record outbound message"
        );
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{
        messaging::MockOutboundChannel, outbound_messages::MockOutboundMessageRepository,
    };

    #[tokio::test]
    async fn successful_send_is_logged_as_sent() {
        let user_id = Uuid::new_v4();
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        channel
            .expect_send_text()
            .withf(|to, body| to == "+254712345678" && body == "hello")
            .times(1)
            .returning(|_, _| Box::pin(async { Ok("wamid.1".to_string()) }));

        message_log
            .expect_log_message()
            .withf(move |entry| {
                entry.user_id == user_id
                    && entry.message_type == "welcome"
                    && entry.delivery_status == "sent"
                    && entry.content == "hello"
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let status = deliver_and_log(
            &channel,
            &message_log,
            Delivery {
                user_id,
                to: "+254712345678",
                message_type: MessageType::Welcome,
                body: "hello",
            },
        )
        .await;

        assert_eq!(status, DeliveryStatus::Sent);
    }

    #[tokio::test]
    async fn failed_send_is_still_audited() {
        let mut channel = MockOutboundChannel::new();
        let mut message_log = MockOutboundMessageRepository::new();

        channel
            .expect_send_text()
            .returning(|_, _| Box::pin(async { Err(anyhow::anyhow!("timeout")) }));

        message_log
            .expect_log_message()
            .withf(|entry| entry.delivery_status == "failed" && entry.message_type == "lesson")
            .times(1)
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("db down")) }));

        let status = deliver_and_log(
            &channel,
            &message_log,
            Delivery {
                user_id: Uuid::new_v4(),
                to: "+254712345678",
                message_type: MessageType::Lesson,
                body: "lesson",
            },
        )
        .await;

        assert_eq!(status, DeliveryStatus::Failed);
    }
}
