//! Recipient identifier: a normalized international phone number

use crate::constants::MIN_NUMERIC_VALUE;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized international phone number: `+` followed by digits.
///
/// The numeric portion must fit in a `u64` and exceed 99, which rules out
/// clearly malformed short identifiers. Construction validates once; both
/// protocols then rely on the invariant, so the binary codec never has to
/// re-check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecipientIdentifier {
    text: String,
    numeric: u64,
}

impl RecipientIdentifier {
    /// Parse and validate an identifier in `+<digits>` form
    pub fn parse(text: impl Into<String>) -> crate::Result<Self> {
        let text = text.into();

        let digits = text
            .strip_prefix('+')
            .ok_or_else(|| Error::InvalidIdentifier(format!("missing '+' prefix: {text:?}")))?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidIdentifier(format!(
                "non-digit characters: {text:?}"
            )));
        }

        let numeric: u64 = digits
            .parse()
            .map_err(|_| Error::InvalidIdentifier(format!("does not fit in 64 bits: {text:?}")))?;

        if numeric <= MIN_NUMERIC_VALUE {
            return Err(Error::InvalidIdentifier(format!(
                "unexpectedly short identifier: {text:?}"
            )));
        }

        Ok(Self { text, numeric })
    }

    /// Canonical text form, including the `+` prefix
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric form used by the enclave protocol's binary encoding
    pub fn numeric(&self) -> u64 {
        self.numeric
    }
}

impl fmt::Display for RecipientIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for RecipientIdentifier {
    type Error = Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(value)
    }
}

impl From<RecipientIdentifier> for String {
    fn from(value: RecipientIdentifier) -> Self {
        value.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = RecipientIdentifier::parse("+14155550198").unwrap();
        assert_eq!(id.as_str(), "+14155550198");
        assert_eq!(id.numeric(), 14_155_550_198);
    }

    #[test]
    fn test_parse_missing_plus() {
        let err = RecipientIdentifier::parse("14155550198").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
    }

    #[test]
    fn test_parse_non_digits() {
        assert!(RecipientIdentifier::parse("+1415555abc").is_err());
        assert!(RecipientIdentifier::parse("+").is_err());
        assert!(RecipientIdentifier::parse("+1 415").is_err());
    }

    #[test]
    fn test_parse_too_short() {
        // Values at or below 99 are rejected
        assert!(RecipientIdentifier::parse("+99").is_err());
        assert!(RecipientIdentifier::parse("+7").is_err());
        assert!(RecipientIdentifier::parse("+100").is_ok());
    }

    #[test]
    fn test_parse_overflow() {
        // 2^64 does not fit
        let err = RecipientIdentifier::parse("+18446744073709551616").unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));

        // u64::MAX itself does
        assert!(RecipientIdentifier::parse("+18446744073709551615").is_ok());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = RecipientIdentifier::parse("+14155550198").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"+14155550198\"");

        let back: RecipientIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<RecipientIdentifier>("\"bogus\"").is_err());
    }
}
