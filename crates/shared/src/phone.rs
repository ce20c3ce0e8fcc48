//! Indonesian phone number normalization and validation.
//!
//! All phone numbers are stored E.164-normalized (`+62xxxxxxxxxx`). Input is
//! accepted in the common local spellings (`08...`, `628...`, `+628...`) and
//! rejected if it is not an Indonesian mobile number.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Normalized Indonesian mobile numbers: +62, mobile prefix 8, 8-11 more digits.
    static ref E164_ID_REGEX: Regex = Regex::new(r"^\+628\d{8,11}$").unwrap();
}

/// Normalizes a raw phone input to E.164.
///
/// Strips separators, rewrites the `0`/`62` prefixes to `+62`, and checks
/// the result against the Indonesian mobile format.
pub fn normalize_phone(input: &str) -> Result<String, ValidationError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let normalized = if let Some(rest) = cleaned.strip_prefix("+62") {
        format!("+62{}", rest)
    } else if let Some(rest) = cleaned.strip_prefix("62") {
        format!("+62{}", rest)
    } else if let Some(rest) = cleaned.strip_prefix('0') {
        format!("+62{}", rest)
    } else {
        return Err(invalid_phone());
    };

    if E164_ID_REGEX.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(invalid_phone())
    }
}

/// Validates that a phone number is already in normalized E.164 form.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if E164_ID_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(invalid_phone())
    }
}

fn invalid_phone() -> ValidationError {
    let mut err = ValidationError::new("phone_format");
    err.message = Some("Phone must be a valid Indonesian mobile number".into());
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_local_format() {
        assert_eq!(normalize_phone("081234567890").unwrap(), "+6281234567890");
        assert_eq!(normalize_phone("0812345678").unwrap(), "+62812345678");
    }

    #[test]
    fn test_normalize_country_code_without_plus() {
        assert_eq!(normalize_phone("6281234567890").unwrap(), "+6281234567890");
    }

    #[test]
    fn test_normalize_already_e164() {
        assert_eq!(normalize_phone("+6281234567890").unwrap(), "+6281234567890");
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize_phone("0812-3456-7890").unwrap(), "+6281234567890");
        assert_eq!(normalize_phone("0812 3456 7890").unwrap(), "+6281234567890");
        assert_eq!(normalize_phone("(0812) 3456.7890").unwrap(), "+6281234567890");
    }

    #[test]
    fn test_normalize_rejects_landline_prefix() {
        // Jakarta landline, not a mobile number
        assert!(normalize_phone("0215550123").is_err());
    }

    #[test]
    fn test_normalize_rejects_foreign_numbers() {
        assert!(normalize_phone("+14155552671").is_err());
        assert!(normalize_phone("+6581234567").is_err());
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("abc").is_err());
        assert!(normalize_phone("0812abc4567").is_err());
    }

    #[test]
    fn test_normalize_rejects_wrong_length() {
        assert!(normalize_phone("0812345").is_err()); // too short
        assert!(normalize_phone("08123456789012345").is_err()); // too long
    }

    #[test]
    fn test_validate_phone_accepts_normalized_only() {
        assert!(validate_phone("+6281234567890").is_ok());
        assert!(validate_phone("081234567890").is_err());
        assert!(validate_phone("6281234567890").is_err());
    }

    #[test]
    fn test_error_code() {
        let err = normalize_phone("nope").unwrap_err();
        assert_eq!(err.code, "phone_format");
        assert!(err.message.unwrap().contains("Indonesian"));
    }
}
