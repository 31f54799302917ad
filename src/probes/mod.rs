//! Bundled probe implementations.
//!
//! `StaticProbe` serves canned payloads for plan rehearsals and tests;
//! `DocumentProbe` mines local files for contact fragments. Network-backed
//! probes plug in through the same `Probe` trait.

pub mod patterns;

mod document;
mod static_probe;

pub use document::DocumentProbe;
pub use static_probe::StaticProbe;
