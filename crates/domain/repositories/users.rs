use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::users::{UpsertUserEntity, UserEntity},
    value_objects::enums::{
        preferred_times::PreferredTime, subscription_plans::SubscriptionPlan,
        subscription_statuses::SubscriptionStatus,
    },
};

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;

    async fn find_by_whatsapp_number(&self, whatsapp_number: &str) -> Result<Option<UserEntity>>;

    async fn upsert_user(&self, user: UpsertUserEntity) -> Result<UserEntity>;

    async fn update_subscription(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserEntity>;

    async fn update_status(&self, user_id: Uuid, status: SubscriptionStatus) -> Result<()>;

    /// Active subscribers due at `preferred_time` with an expiry at or after `now`. A NULL expiry
    /// never matches.
    async fn list_active_users_at_hour(
        &self,
        preferred_time: PreferredTime,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserEntity>>;

    /// Active, paid subscribers whose expiry falls inside `[from, to)`.
    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserEntity>>;
}
