//! Ports layer: Trait definitions for replaceable components.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the triage lifecycle and the numeric backend.

mod classifier;

pub use classifier::{EpochMetrics, ModelError, RiskModel, TrainingReport};
