use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const COUNTRY_PREFIX: &str = "254";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneNumberError {
    #[error("phone number is required")]
    Empty,
    #[error("invalid Kenyan mobile number: {0}")]
    Invalid(String),
}

/// Canonicalizes a Kenyan number into `+254...` form.
///
/// Inputs that do not fit any known shape are returned unchanged; callers must still run
/// [`is_valid_phone_number`] before relying on the result.
pub fn normalize_phone_number(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with(COUNTRY_PREFIX) {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("+{COUNTRY_PREFIX}{rest}")
    } else if digits.len() == 9 {
        format!("+{COUNTRY_PREFIX}{digits}")
    } else {
        raw.to_string()
    }
}

/// `+254` followed by a `7` and eight more digits.
pub fn is_valid_phone_number(raw: &str) -> bool {
    let normalized = normalize_phone_number(raw);
    let Some(local) = normalized
        .strip_prefix('+')
        .and_then(|rest| rest.strip_prefix(COUNTRY_PREFIX))
    else {
        return false;
    };

    local.len() == 9 && local.starts_with('7') && local.chars().all(|c| c.is_ascii_digit())
}

/// Payment provider form: no `+`, a leading `0` replaced by the country prefix.
pub fn to_provider_format(phone: &str) -> String {
    let trimmed = phone.trim();
    let without_plus = trimmed.strip_prefix('+').unwrap_or(trimmed);
    match without_plus.strip_prefix('0') {
        Some(rest) => format!("{COUNTRY_PREFIX}{rest}"),
        None => without_plus.to_string(),
    }
}

/// Messaging channel form: the canonical number without its `+`.
pub fn to_channel_format(phone: &str) -> String {
    phone.trim().replacen('+', "", 1)
}

/// A canonical, validated `+2547XXXXXXXX` number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, PhoneNumberError> {
        if raw.trim().is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        if !is_valid_phone_number(raw) {
            return Err(PhoneNumberError::Invalid(raw.trim().to_string()));
        }
        Ok(Self(normalize_phone_number(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn provider_format(&self) -> String {
        to_provider_format(&self.0)
    }

    pub fn channel_format(&self) -> String {
        to_channel_format(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhoneNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PhoneNumber::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_shapes_normalize_to_international_form() {
        assert_eq!(normalize_phone_number("0712345678"), "+254712345678");
        assert_eq!(normalize_phone_number("712345678"), "+254712345678");
        assert_eq!(normalize_phone_number("254712345678"), "+254712345678");
        assert_eq!(normalize_phone_number("+254 712 345 678"), "+254712345678");
        assert_eq!(normalize_phone_number("(0712) 345-678"), "+254712345678");
    }

    #[test]
    fn unformattable_input_is_returned_unchanged() {
        assert_eq!(normalize_phone_number("12345"), "12345");
        assert_eq!(normalize_phone_number("not a number"), "not a number");
    }

    #[test]
    fn validity_requires_mobile_prefix_and_length() {
        for valid in ["0712345678", "712345678", "254712345678", "+254 799 000 111"] {
            assert!(is_valid_phone_number(valid), "expected valid: {valid}");
        }

        for invalid in [
            "0212345678",
            "071234567",
            "07123456789",
            "254612345678",
            "+1 202 555 0100",
            "",
        ] {
            assert!(!is_valid_phone_number(invalid), "expected invalid: {invalid}");
        }
    }

    #[test]
    fn provider_format_drops_plus_and_leading_zero() {
        assert_eq!(to_provider_format("+254712345678"), "254712345678");
        assert_eq!(to_provider_format("0712345678"), "254712345678");
        assert_eq!(to_provider_format("254712345678"), "254712345678");
    }

    #[test]
    fn channel_format_drops_plus_only() {
        assert_eq!(to_channel_format("+254712345678"), "254712345678");
    }

    #[test]
    fn parse_rejects_empty_and_invalid_numbers() {
        assert_eq!(PhoneNumber::parse("  "), Err(PhoneNumberError::Empty));
        assert!(matches!(
            PhoneNumber::parse("0212345678"),
            Err(PhoneNumberError::Invalid(_))
        ));

        let phone = PhoneNumber::parse("0712 345 678").unwrap();
        assert_eq!(phone.as_str(), "+254712345678");
        assert_eq!(phone.provider_format(), "254712345678");
    }
}
