//! # Cyclesense
//!
//! PCOS risk triage from a symptom questionnaire.
//!
//! A questionnaire is reduced to a 19-value feature vector, scored by a small
//! neural network trained in-process on synthetic data, and annotated with
//! rule-based symptoms and lifestyle recommendations. The output is
//! informational and carries no clinical validity.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Questionnaire, feature vector, prediction types
//! - `ports`: `RiskModel` trait for the classifier
//! - `adapters`: MLP classifier, synthetic corpus, log sanitization
//! - `application`: Triage service, annotator, background worker

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{InferenceAnnotator, TriageService, TriageWorker};
pub use domain::{FeatureVector, PredictionResult, Questionnaire, RiskLevel};
pub use ports::{ModelError, RiskModel};

/// Result type for Cyclesense operations
pub type Result<T> = std::result::Result<T, CyclesenseError>;

/// Main error type for Cyclesense
#[derive(Debug, thiserror::Error)]
pub enum CyclesenseError {
    #[error("Invalid questionnaire: {0}")]
    Validation(String),

    #[error("Classifier training failed: {0}")]
    TrainingFailed(ModelError),

    #[error("Prediction failed: {0}")]
    Prediction(ModelError),
}
