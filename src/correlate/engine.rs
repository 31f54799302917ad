use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::scan::RawResultRecord;

use super::{Entity, EntityCategory, validators};

/// Correlation-stage fault: a payload carried a malformed value under a
/// category key. Degrades the owning phase to unavailable, never the scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed '{key}' value in probe '{probe}' payload: expected string or array of strings")]
pub struct MalformedPayload {
    pub probe: String,
    pub key: &'static str,
}

/// Entities of one category merged across records.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CorrelatedCategoryResult {
    pub category: EntityCategory,
    pub unique_entities: BTreeSet<Entity>,
    /// Fraction of candidates that passed validation; 0.0 with no candidates.
    pub confidence: f64,
}

impl CorrelatedCategoryResult {
    pub fn entity_count(&self) -> usize {
        self.unique_entities.len()
    }
}

/// Merge same-category fragments across the given records.
///
/// Candidates are read from the category's payload key as either a single
/// string or an array of strings, then normalized, validated and
/// deduplicated. Records without the key contribute nothing.
pub fn correlate<'a, I>(
    records: I,
    category: EntityCategory,
) -> std::result::Result<CorrelatedCategoryResult, MalformedPayload>
where
    I: IntoIterator<Item = &'a RawResultRecord>,
{
    let key = category.payload_key();
    let mut total = 0usize;
    let mut valid = 0usize;
    let mut unique_entities = BTreeSet::new();

    for record in records {
        let Some(value) = record.payload.get(key) else {
            continue;
        };
        let candidates = candidates_from(value).ok_or_else(|| MalformedPayload {
            probe: record.probe.clone(),
            key,
        })?;
        for raw in candidates {
            total += 1;
            let entity = Entity::new(category, raw);
            if validators::is_valid(category, &entity.value) {
                valid += 1;
                unique_entities.insert(entity);
            }
        }
    }

    let confidence = if total == 0 {
        0.0
    } else {
        valid as f64 / total as f64
    };
    debug!(
        category = %category,
        candidates = total,
        valid,
        unique = unique_entities.len(),
        "Category correlated"
    );

    Ok(CorrelatedCategoryResult {
        category,
        unique_entities,
        confidence,
    })
}

fn candidates_from(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}
