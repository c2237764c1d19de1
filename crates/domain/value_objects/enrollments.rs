use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::{
    payment_statuses::PaymentStatus, subscription_plans::SubscriptionPlan,
    subscription_statuses::SubscriptionStatus,
};

#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentRequest {
    pub name: String,
    pub whatsapp_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    pub plan: String,
    /// M-Pesa payer; defaults to the WhatsApp number.
    #[serde(default)]
    pub payer_phone: Option<String>,
    #[serde(default)]
    pub track_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnrollmentOutcome {
    /// Subscription active without a payment (zero-price plan).
    Activated {
        user_id: Uuid,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
        expires_at: DateTime<Utc>,
    },
    /// Push prompt delivered to the payer's handset; completion arrives via callback.
    PushSent {
        user_id: Uuid,
        payment_id: Uuid,
        checkout_request_id: String,
        customer_message: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentStatusDto {
    pub payment_id: Uuid,
    pub checkout_request_id: Option<String>,
    pub status: PaymentStatus,
    pub plan: String,
    pub amount: i32,
    pub receipt_number: Option<String>,
    pub result_desc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonAcknowledgement {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    #[serde(default)]
    pub quiz_score: Option<i32>,
}
