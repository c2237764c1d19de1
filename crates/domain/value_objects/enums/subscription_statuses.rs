use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    #[default]
    Inactive,
    Expired,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Expired => "expired",
        };
        write!(f, "{}", status)
    }
}

impl SubscriptionStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => SubscriptionStatus::Active,
            "inactive" => SubscriptionStatus::Inactive,
            "expired" => SubscriptionStatus::Expired,
            _ => SubscriptionStatus::Inactive,
        }
    }

    /// Status as it should be read at `now`: a record whose expiry has passed is treated as
    /// expired even if the row has not been rewritten yet. Paused records lapse the same way.
    pub fn effective_at(self, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expires_at {
            Some(expires_at) if expires_at < now => SubscriptionStatus::Expired,
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn active_with_past_expiry_reads_as_expired() {
        let now = Utc::now();
        let status = SubscriptionStatus::Active.effective_at(Some(now - Duration::hours(1)), now);
        assert_eq!(status, SubscriptionStatus::Expired);
    }

    #[test]
    fn active_without_expiry_stays_active() {
        let now = Utc::now();
        assert_eq!(
            SubscriptionStatus::Active.effective_at(None, now),
            SubscriptionStatus::Active
        );
        assert_eq!(
            SubscriptionStatus::Active.effective_at(Some(now + Duration::days(2)), now),
            SubscriptionStatus::Active
        );
    }

    #[test]
    fn paused_record_past_expiry_reads_as_expired() {
        let now = Utc::now();
        assert_eq!(
            SubscriptionStatus::Inactive.effective_at(Some(now - Duration::days(1)), now),
            SubscriptionStatus::Expired
        );
        assert_eq!(
            SubscriptionStatus::Inactive.effective_at(Some(now + Duration::days(1)), now),
            SubscriptionStatus::Inactive
        );
    }
}
