//! Application layer: Use cases and services.
//!
//! Orchestrates domain logic with the classifier port: lazy model lifecycle,
//! annotation of raw output, and background execution.

mod annotator;
mod triage;
mod worker;

pub use annotator::{Category, InferenceAnnotator, RecommendationRule, RECOMMENDATION_CATALOG};
pub use triage::TriageService;
pub use worker::{TriageProgress, TriageWorker, TriageWorkerHandle};
