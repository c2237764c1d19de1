use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::{
        preferred_times::PreferredTime, subscription_plans::SubscriptionPlan,
        subscription_statuses::SubscriptionStatus,
    },
    infra::db::postgres::schema::users,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = users)]
pub struct UserEntity {
    pub id: Uuid,
    pub whatsapp_number: String,
    pub name: String,
    pub email: Option<String>,
    pub preferred_time: String,
    pub subscription_plan: String,
    pub subscription_status: String,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    pub fn plan(&self) -> Option<SubscriptionPlan> {
        SubscriptionPlan::from_str(&self.subscription_plan)
    }

    pub fn preferred_time(&self) -> PreferredTime {
        PreferredTime::from_str(&self.preferred_time).unwrap_or_default()
    }

    /// Stored status corrected for an expiry that has already passed.
    pub fn status_at(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        SubscriptionStatus::from_str(&self.subscription_status)
            .effective_at(self.subscription_expires_at, now)
    }
}

/// Insert-or-update payload keyed on `whatsapp_number`.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = users)]
pub struct UpsertUserEntity {
    pub whatsapp_number: String,
    pub name: String,
    pub email: Option<String>,
    pub preferred_time: String,
    pub subscription_plan: String,
}
