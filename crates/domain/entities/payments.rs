use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        payment_statuses::PaymentStatus, subscription_plans::SubscriptionPlan,
    },
    infra::db::postgres::schema::payments,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i32,
    pub currency: String,
    pub plan: String,
    pub payment_method: String,
    pub phone_number: String,
    pub checkout_request_id: Option<String>,
    pub merchant_request_id: Option<String>,
    pub mpesa_receipt_number: Option<String>,
    pub status: String,
    pub result_desc: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentEntity {
    /// Unknown stored values are treated as pending so they are never skipped as terminal.
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::from_str(&self.status).unwrap_or(PaymentStatus::Pending)
    }

    pub fn plan(&self) -> Option<SubscriptionPlan> {
        SubscriptionPlan::from_str(&self.plan)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentEntity {
    pub user_id: Uuid,
    pub amount: i32,
    pub currency: String,
    pub plan: String,
    pub payment_method: String,
    pub phone_number: String,
    pub status: String,
}

/// Terminal transition applied to a pending payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentStatusUpdate {
    pub status: PaymentStatus,
    pub mpesa_receipt_number: Option<String>,
    pub result_desc: Option<String>,
}
