use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::{
        payments::{NewPaymentEntity, PaymentEntity, PaymentStatusUpdate},
        users::UserEntity,
    },
    value_objects::enums::subscription_plans::SubscriptionPlan,
};

#[async_trait]
#[automock]
pub trait PaymentRepository {
    async fn create_payment(&self, payment: NewPaymentEntity) -> Result<PaymentEntity>;

    async fn attach_provider_refs(
        &self,
        payment_id: Uuid,
        checkout_request_id: &str,
        merchant_request_id: &str,
    ) -> Result<()>;

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentEntity>>;

    /// Compare-and-set from `pending`. Returns `false` when the payment had already reached a
    /// terminal state and nothing was written.
    async fn update_payment_status(
        &self,
        payment_id: Uuid,
        update: PaymentStatusUpdate,
    ) -> Result<bool>;

    /// Marks a pending payment completed and activates the payer's subscription in one
    /// transaction. Returns `None` when the payment was no longer pending; nothing is written then.
    async fn complete_and_extend(
        &self,
        payment_id: Uuid,
        update: PaymentStatusUpdate,
        plan: SubscriptionPlan,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<UserEntity>>;
}
