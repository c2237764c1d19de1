use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update, upsert::excluded};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::users::{UpsertUserEntity, UserEntity},
        repositories::users::UserRepository,
        value_objects::enums::{
            preferred_times::PreferredTime, subscription_plans::SubscriptionPlan,
            subscription_statuses::SubscriptionStatus,
        },
    },
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::users},
};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<UserEntity>> {
            let mut conn = db_pool.get()?;

            let user = users::table
                .filter(users::id.eq(user_id))
                .select(UserEntity::as_select())
                .first::<UserEntity>(&mut conn)
                .optional()?;

            Ok(user)
        })
        .await?
    }

    async fn find_by_whatsapp_number(&self, whatsapp_number: &str) -> Result<Option<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let whatsapp_number = whatsapp_number.to_string();

        task::spawn_blocking(move || -> Result<Option<UserEntity>> {
            let mut conn = db_pool.get()?;

            let user = users::table
                .filter(users::whatsapp_number.eq(whatsapp_number))
                .select(UserEntity::as_select())
                .first::<UserEntity>(&mut conn)
                .optional()?;

            Ok(user)
        })
        .await?
    }

    async fn upsert_user(&self, user: UpsertUserEntity) -> Result<UserEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<UserEntity> {
            let mut conn = db_pool.get()?;

            // The stored plan only changes once a subscription is activated.
            let saved = insert_into(users::table)
                .values(&user)
                .on_conflict(users::whatsapp_number)
                .do_update()
                .set((
                    users::name.eq(excluded(users::name)),
                    users::email.eq(excluded(users::email)),
                    users::preferred_time.eq(excluded(users::preferred_time)),
                    users::updated_at.eq(Utc::now()),
                ))
                .returning(UserEntity::as_returning())
                .get_result::<UserEntity>(&mut conn)?;

            Ok(saved)
        })
        .await?
    }

    async fn update_subscription(
        &self,
        user_id: Uuid,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<UserEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<UserEntity> {
            let mut conn = db_pool.get()?;

            let updated = update(users::table.filter(users::id.eq(user_id)))
                .set((
                    users::subscription_plan.eq(plan.to_string()),
                    users::subscription_status.eq(status.to_string()),
                    users::subscription_expires_at.eq(expires_at),
                    users::updated_at.eq(Utc::now()),
                ))
                .returning(UserEntity::as_returning())
                .get_result::<UserEntity>(&mut conn)?;

            Ok(updated)
        })
        .await?
    }

    async fn update_status(&self, user_id: Uuid, status: SubscriptionStatus) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            let updated = update(users::table.filter(users::id.eq(user_id)))
                .set((
                    users::subscription_status.eq(status.to_string()),
                    users::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?;

            if updated == 0 {
                anyhow::bail!("user {user_id} not found");
            }
            Ok(())
        })
        .await?
    }

    async fn list_active_users_at_hour(
        &self,
        preferred_time: PreferredTime,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<UserEntity>> {
            let mut conn = db_pool.get()?;

            let due = users::table
                .filter(users::subscription_status.eq(SubscriptionStatus::Active.to_string()))
                .filter(users::preferred_time.eq(preferred_time.as_str()))
                .filter(users::subscription_expires_at.ge(now))
                .order(users::created_at.asc())
                .select(UserEntity::as_select())
                .load::<UserEntity>(&mut conn)?;

            Ok(due)
        })
        .await?
    }

    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Vec<UserEntity>> {
            let mut conn = db_pool.get()?;

            let expiring = users::table
                .filter(users::subscription_status.eq(SubscriptionStatus::Active.to_string()))
                .filter(users::subscription_plan.ne(SubscriptionPlan::Free.to_string()))
                .filter(users::subscription_expires_at.ge(from))
                .filter(users::subscription_expires_at.lt(to))
                .select(UserEntity::as_select())
                .load::<UserEntity>(&mut conn)?;

            Ok(expiring)
        })
        .await?
    }
}
