use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Weekly,
    Monthly,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Weekly => "weekly",
            SubscriptionPlan::Monthly => "monthly",
        }
    }

    /// Accepts both the stored key and the catalog display name, case-insensitively.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" | "free trial" => Some(SubscriptionPlan::Free),
            "weekly" | "weekly plan" => Some(SubscriptionPlan::Weekly),
            "monthly" | "monthly premium" => Some(SubscriptionPlan::Monthly),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "Free Trial",
            SubscriptionPlan::Weekly => "Weekly Plan",
            SubscriptionPlan::Monthly => "Monthly Premium",
        }
    }

    /// Price in whole Kenyan shillings.
    pub fn price_kes(&self) -> i32 {
        match self {
            SubscriptionPlan::Free => 0,
            SubscriptionPlan::Weekly => 50,
            SubscriptionPlan::Monthly => 150,
        }
    }

    pub fn is_free(&self) -> bool {
        self.price_kes() == 0
    }
}

impl Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
