//! Server-side validation helpers. Each returns `Err` with a client-facing
//! message when invalid.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

static UK_POSTCODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z]{1,2}\d[A-Z\d]? ?\d[A-Z]{2}$").expect("postcode regex"));

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s+()-]{10,}$").expect("phone regex"));

pub fn validate_email(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required".to_string());
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

/// Postcode is optional; only a non-blank value is checked.
pub fn validate_postcode(postcode: Option<&str>) -> Result<(), String> {
    let Some(postcode) = postcode else { return Ok(()) };
    let trimmed = postcode.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if !UK_POSTCODE_REGEX.is_match(trimmed) {
        return Err("Invalid UK postcode".to_string());
    }
    Ok(())
}

/// Phone is optional; only a non-blank value is checked.
pub fn validate_phone(phone: Option<&str>) -> Result<(), String> {
    let Some(phone) = phone else { return Ok(()) };
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let digits_only: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '+' | '(' | ')' | '-'))
        .collect();
    if digits_only.len() < 10 || !PHONE_REGEX.is_match(trimmed) {
        return Err("Invalid phone number".to_string());
    }
    Ok(())
}

pub fn validate_required(value: Option<&str>, field_name: &str) -> Result<(), String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(format!("{} is required", field_name)),
    }
}

/// Normalize a UK postcode to standard format (uppercase with single space).
pub fn normalize_postcode(postcode: &str) -> String {
    let compact: String = postcode
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.len() < 5 {
        return compact;
    }
    let split = compact.len() - 3;
    format!("{} {}", &compact[..split], &compact[split..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert_eq!(validate_email("  "), Err("Email is required".to_string()));
        assert_eq!(
            validate_email("not-an-email"),
            Err("Invalid email address".to_string())
        );
        assert!(validate_email("spaces in@mail.com").is_err());
    }

    #[test]
    fn validates_postcode() {
        assert!(validate_postcode(None).is_ok());
        assert!(validate_postcode(Some("")).is_ok());
        assert!(validate_postcode(Some("SW1A 1AA")).is_ok());
        assert!(validate_postcode(Some("sw1a1aa")).is_ok());
        assert!(validate_postcode(Some("M1 1AE")).is_ok());
        assert_eq!(
            validate_postcode(Some("12345")),
            Err("Invalid UK postcode".to_string())
        );
    }

    #[test]
    fn validates_phone() {
        assert!(validate_phone(None).is_ok());
        assert!(validate_phone(Some("07700 900123")).is_ok());
        assert!(validate_phone(Some("+44 (0) 7700-900123")).is_ok());
        assert_eq!(
            validate_phone(Some("12345")),
            Err("Invalid phone number".to_string())
        );
        assert!(validate_phone(Some("phone: 0770090012")).is_err());
    }

    #[test]
    fn validates_required() {
        assert!(validate_required(Some("title"), "Title").is_ok());
        assert_eq!(
            validate_required(Some("   "), "Title"),
            Err("Title is required".to_string())
        );
        assert_eq!(
            validate_required(None, "Name"),
            Err("Name is required".to_string())
        );
    }

    #[test]
    fn normalizes_postcode() {
        assert_eq!(normalize_postcode("sw1a1aa"), "SW1A 1AA");
        assert_eq!(normalize_postcode("  m1  1ae "), "M1 1AE");
        assert_eq!(normalize_postcode("m1"), "M1");
    }
}
