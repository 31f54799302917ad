//! Extraction patterns for contact fragments in free text.

use std::sync::OnceLock;

use regex::Regex;

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();
static PHONE_LOCAL_PATTERN: OnceLock<Regex> = OnceLock::new();
static PHONE_INTL_PATTERN: OnceLock<Regex> = OnceLock::new();
static SOCIAL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN
        .get_or_init(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap())
}

fn phone_local_pattern() -> &'static Regex {
    // Grouped 3+3+4 form with optional - or . separators
    PHONE_LOCAL_PATTERN.get_or_init(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap())
}

fn phone_intl_pattern() -> &'static Regex {
    // + country code then up to three digit groups
    PHONE_INTL_PATTERN.get_or_init(|| {
        Regex::new(r"\+\d{1,3}[-.\s]?\d{1,4}[-.\s]?\d{1,4}[-.\s]?\d{1,9}").unwrap()
    })
}

fn social_pattern() -> &'static Regex {
    SOCIAL_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:facebook|twitter|instagram|linkedin)\.com/[A-Za-z0-9_.-]+").unwrap()
    })
}

/// Collect email-shaped substrings from free text.
pub fn extract_emails(text: &str) -> Vec<String> {
    email_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Collect phone-shaped substrings, international forms first.
pub fn extract_phones(text: &str) -> Vec<String> {
    let intl = phone_intl_pattern();
    let mut phones: Vec<String> = intl
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    // Blank out international matches so the local pattern cannot re-match
    // their national-number tails.
    let remainder = intl.replace_all(text, " ");
    phones.extend(
        phone_local_pattern()
            .find_iter(&remainder)
            .map(|m| m.as_str().to_string()),
    );
    phones
}

/// Collect profile links on the recognized social platforms.
pub fn extract_social_links(text: &str) -> Vec<String> {
    social_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
