use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{payments, users},
    },
};
use domain::{
    entities::{
        payments::{NewPaymentEntity, PaymentEntity, PaymentStatusUpdate},
        users::UserEntity,
    },
    repositories::payments::PaymentRepository,
    value_objects::enums::{
        payment_statuses::PaymentStatus, subscription_plans::SubscriptionPlan,
        subscription_statuses::SubscriptionStatus,
    },
};

pub struct PaymentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentRepository for PaymentPostgres {
    async fn create_payment(&self, payment: NewPaymentEntity) -> Result<PaymentEntity> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<PaymentEntity> {
            let mut conn = db_pool.get()?;

            let created = insert_into(payments::table)
                .values(&payment)
                .returning(PaymentEntity::as_returning())
                .get_result::<PaymentEntity>(&mut conn)?;

            Ok(created)
        })
        .await?
    }

    async fn attach_provider_refs(
        &self,
        payment_id: Uuid,
        checkout_request_id: &str,
        merchant_request_id: &str,
    ) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);
        let checkout_request_id = checkout_request_id.to_string();
        let merchant_request_id = merchant_request_id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            update(payments::table.filter(payments::id.eq(payment_id)))
                .set((
                    payments::checkout_request_id.eq(Some(checkout_request_id)),
                    payments::merchant_request_id.eq(Some(merchant_request_id)),
                    payments::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)?;

            Ok(())
        })
        .await?
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<PaymentEntity>> {
        let db_pool = Arc::clone(&self.db_pool);
        let checkout_request_id = checkout_request_id.to_string();

        task::spawn_blocking(move || -> Result<Option<PaymentEntity>> {
            let mut conn = db_pool.get()?;

            let payment = payments::table
                .filter(payments::checkout_request_id.eq(checkout_request_id))
                .select(PaymentEntity::as_select())
                .first::<PaymentEntity>(&mut conn)
                .optional()?;

            Ok(payment)
        })
        .await?
    }

    async fn update_payment_status(
        &self,
        payment_id: Uuid,
        status_update: PaymentStatusUpdate,
    ) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;

            let affected = update(
                payments::table
                    .filter(payments::id.eq(payment_id))
                    .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
            )
            .set((
                payments::status.eq(status_update.status.as_str()),
                payments::mpesa_receipt_number.eq(status_update.mpesa_receipt_number),
                payments::result_desc.eq(status_update.result_desc),
                payments::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

            Ok(affected == 1)
        })
        .await?
    }

    async fn complete_and_extend(
        &self,
        payment_id: Uuid,
        status_update: PaymentStatusUpdate,
        plan: SubscriptionPlan,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<UserEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<Option<UserEntity>> {
            let mut conn = db_pool.get()?;

            conn.transaction::<_, anyhow::Error, _>(|conn| {
                let user_id = update(
                    payments::table
                        .filter(payments::id.eq(payment_id))
                        .filter(payments::status.eq(PaymentStatus::Pending.as_str())),
                )
                .set((
                    payments::status.eq(PaymentStatus::Completed.as_str()),
                    payments::mpesa_receipt_number.eq(status_update.mpesa_receipt_number),
                    payments::result_desc.eq(status_update.result_desc),
                    payments::updated_at.eq(Utc::now()),
                ))
                .returning(payments::user_id)
                .get_result::<Uuid>(conn)
                .optional()?;

                let Some(user_id) = user_id else {
                    return Ok(None);
                };

                // Any failure here rolls the payment back to pending so a redelivery retries.
                let user = update(users::table.filter(users::id.eq(user_id)))
                    .set((
                        users::subscription_plan.eq(plan.to_string()),
                        users::subscription_status.eq(SubscriptionStatus::Active.to_string()),
                        users::subscription_expires_at.eq(Some(expires_at)),
                        users::updated_at.eq(Utc::now()),
                    ))
                    .returning(UserEntity::as_returning())
                    .get_result::<UserEntity>(conn)?;

                Ok(Some(user))
            })
        })
        .await?
    }
}
