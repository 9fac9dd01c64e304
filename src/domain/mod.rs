//! Domain layer types and invariants.

pub mod derived;
pub mod error;
pub mod preferences;
pub mod types;
