//! Category-specific validation of normalized candidate values.

use std::sync::OnceLock;

use regex::Regex;

use super::EntityCategory;

/// Platform names a social handle must mention to count as one.
const SOCIAL_PLATFORMS: [&str; 4] = ["facebook", "twitter", "instagram", "linkedin"];

static EMAIL_VALID: OnceLock<Regex> = OnceLock::new();
static PHONE_INTL_VALID: OnceLock<Regex> = OnceLock::new();
static PHONE_LOCAL_VALID: OnceLock<Regex> = OnceLock::new();

fn email_valid() -> &'static Regex {
    EMAIL_VALID
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap())
}

fn phone_intl_valid() -> &'static Regex {
    // + country code then one to three separated digit groups
    PHONE_INTL_VALID.get_or_init(|| Regex::new(r"^\+\d{1,3}(?:[-. ]?\d{1,9}){1,3}$").unwrap())
}

fn phone_local_valid() -> &'static Regex {
    // 3+3+4 grouped local form with optional - or . separators
    PHONE_LOCAL_VALID.get_or_init(|| Regex::new(r"^\d{3}[-.]?\d{3}[-.]?\d{4}$").unwrap())
}

/// Check a normalized value against its category pattern.
pub fn is_valid(category: EntityCategory, value: &str) -> bool {
    match category {
        EntityCategory::Email => email_valid().is_match(value),
        EntityCategory::Phone => {
            phone_intl_valid().is_match(value) || phone_local_valid().is_match(value)
        }
        EntityCategory::SocialHandle => {
            let lower = value.to_lowercase();
            SOCIAL_PLATFORMS.iter().any(|p| lower.contains(p))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid(EntityCategory::Email, "user@example.com"));
        assert!(is_valid(EntityCategory::Email, "first.last+tag@sub.example.org"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid(EntityCategory::Email, "not-an-email"));
        assert!(!is_valid(EntityCategory::Email, "user@nodot"));
        assert!(!is_valid(EntityCategory::Email, "@example.com"));
    }

    #[test]
    fn test_valid_phones() {
        assert!(is_valid(EntityCategory::Phone, "+12025550123"));
        assert!(is_valid(EntityCategory::Phone, "+44 20 7946 0958"));
        assert!(is_valid(EntityCategory::Phone, "202-555-0123"));
        assert!(is_valid(EntityCategory::Phone, "202.555.0123"));
        assert!(is_valid(EntityCategory::Phone, "2025550123"));
    }

    #[test]
    fn test_invalid_phones() {
        assert!(!is_valid(EntityCategory::Phone, "12-34"));
        assert!(!is_valid(EntityCategory::Phone, "phone me"));
        assert!(!is_valid(EntityCategory::Phone, "+"));
    }

    #[test]
    fn test_social_handles() {
        assert!(is_valid(EntityCategory::SocialHandle, "twitter.com/alice"));
        assert!(is_valid(EntityCategory::SocialHandle, "https://LinkedIn.com/in/alice"));
        assert!(!is_valid(EntityCategory::SocialHandle, "example.com/alice"));
    }
}
