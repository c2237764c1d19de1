use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;

use crate::domain::value_objects::enums::subscription_plans::SubscriptionPlan;

pub const PLAN_CURRENCY: &str = "KES";

pub const PLAN_CATALOG: [SubscriptionPlan; 3] = [
    SubscriptionPlan::Free,
    SubscriptionPlan::Weekly,
    SubscriptionPlan::Monthly,
];

/// Subscription end for a plan purchased (or started) at `now`.
///
/// `weekly` adds 7 days, `monthly` moves to the same day of the next calendar month (clamped to
/// the last day when that month is shorter), `free` adds 3 days. Unknown labels get 7 days.
pub fn subscription_expiry(plan_label: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match SubscriptionPlan::from_str(plan_label) {
        Some(plan) => plan.expiry_from(now),
        None => now + Duration::days(7),
    }
}

impl SubscriptionPlan {
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            SubscriptionPlan::Free => now + Duration::days(3),
            SubscriptionPlan::Weekly => now + Duration::days(7),
            SubscriptionPlan::Monthly => now
                .checked_add_months(Months::new(1))
                .unwrap_or_else(|| now + Duration::days(30)),
        }
    }

    pub fn period_label(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "3 days",
            SubscriptionPlan::Weekly => "1 week",
            SubscriptionPlan::Monthly => "1 month",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlanDto {
    pub key: SubscriptionPlan,
    pub name: &'static str,
    pub amount: i32,
    pub currency: &'static str,
    pub period: &'static str,
}

impl From<SubscriptionPlan> for PlanDto {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            key: plan,
            name: plan.display_name(),
            amount: plan.price_kes(),
            currency: PLAN_CURRENCY,
            period: plan.period_label(),
        }
    }
}

pub fn plan_catalog() -> Vec<PlanDto> {
    PLAN_CATALOG.into_iter().map(PlanDto::from).collect()
}
