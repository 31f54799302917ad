//! Correlation of identity fragments across probe outputs.
//!
//! Takes the raw records a scan accumulated, merges same-category
//! fragments, removes duplicates by normalized value, validates each
//! against its category pattern and scores the category's confidence.

mod engine;
mod entity;
pub mod validators;

pub use engine::{CorrelatedCategoryResult, MalformedPayload, correlate};
pub use entity::{Entity, EntityCategory, normalize};
