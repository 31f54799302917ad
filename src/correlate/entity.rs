use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Category of identity fragment recognized by correlation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Phone,
    Email,
    SocialHandle,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 3] = [Self::Phone, Self::Email, Self::SocialHandle];

    /// Payload key probes use for this category.
    pub fn payload_key(&self) -> &'static str {
        match self {
            Self::Phone => "phones",
            Self::Email => "emails",
            Self::SocialHandle => "social_media",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phone => "phone",
            Self::Email => "email",
            Self::SocialHandle => "social_handle",
        }
    }
}

impl std::fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityCategory {
    type Err = ScanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phone" | "phones" => Ok(Self::Phone),
            "email" | "emails" => Ok(Self::Email),
            "social" | "social_handle" | "social_media" => Ok(Self::SocialHandle),
            other => Err(ScanError::Config(format!(
                "Unknown entity category: {}",
                other
            ))),
        }
    }
}

/// A typed, normalized identity fragment.
///
/// Equality and ordering go through the normalized value, so a set of
/// entities is deduplicated by construction.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct Entity {
    pub category: EntityCategory,
    pub value: String,
}

impl Entity {
    /// Build an entity from a raw candidate, normalizing the value.
    pub fn new(category: EntityCategory, raw: &str) -> Self {
        Self {
            category,
            value: normalize(category, raw),
        }
    }
}

/// Normalize a raw candidate value for comparison.
///
/// Every category trims surrounding whitespace; emails additionally
/// lowercase the domain after the last `@`.
pub fn normalize(category: EntityCategory, raw: &str) -> String {
    let trimmed = raw.trim();
    match category {
        EntityCategory::Email => match trimmed.rsplit_once('@') {
            Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
            None => trimmed.to_string(),
        },
        _ => trimmed.to_string(),
    }
}
