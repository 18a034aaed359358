//! Adapters layer: Concrete implementations of ports.
//!
//! - `mlp`: feed-forward network implementing `RiskModel`
//! - `synthetic`: labeled synthetic training corpus
//! - `sanitize`: personal-data filtering for logs

pub mod mlp;
pub mod sanitize;
pub mod synthetic;
