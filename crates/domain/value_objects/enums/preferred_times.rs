use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Delivery hour buckets a subscriber can pick during onboarding (local time).
#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PreferredTime {
    #[default]
    #[serde(rename = "7:00 AM")]
    SevenAm,
    #[serde(rename = "9:00 AM")]
    NineAm,
    #[serde(rename = "12:00 PM")]
    Noon,
    #[serde(rename = "6:00 PM")]
    SixPm,
    #[serde(rename = "8:00 PM")]
    EightPm,
}

impl PreferredTime {
    pub const ALL: [PreferredTime; 5] = [
        PreferredTime::SevenAm,
        PreferredTime::NineAm,
        PreferredTime::Noon,
        PreferredTime::SixPm,
        PreferredTime::EightPm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredTime::SevenAm => "7:00 AM",
            PreferredTime::NineAm => "9:00 AM",
            PreferredTime::Noon => "12:00 PM",
            PreferredTime::SixPm => "6:00 PM",
            PreferredTime::EightPm => "8:00 PM",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|time| time.as_str() == normalized)
    }

    /// Hour of day (0-23) the bucket starts at.
    pub fn hour(&self) -> u32 {
        match self {
            PreferredTime::SevenAm => 7,
            PreferredTime::NineAm => 9,
            PreferredTime::Noon => 12,
            PreferredTime::SixPm => 18,
            PreferredTime::EightPm => 20,
        }
    }

    pub fn for_hour(hour: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|time| time.hour() == hour)
    }
}

impl Display for PreferredTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_without_a_bucket_select_nothing() {
        assert_eq!(PreferredTime::for_hour(9), Some(PreferredTime::NineAm));
        assert_eq!(PreferredTime::for_hour(18), Some(PreferredTime::SixPm));
        assert_eq!(PreferredTime::for_hour(8), None);
        assert_eq!(PreferredTime::for_hour(23), None);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(PreferredTime::from_str("12:00 pm"), Some(PreferredTime::Noon));
        assert_eq!(PreferredTime::from_str(" 8:00 PM "), Some(PreferredTime::EightPm));
        assert_eq!(PreferredTime::from_str("noon"), None);
    }

    #[test]
    fn serializes_as_display_label() {
        let json = serde_json::to_string(&PreferredTime::SixPm).unwrap();
        assert_eq!(json, "\"6:00 PM\"");
    }
}
