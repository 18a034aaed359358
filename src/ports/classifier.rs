//! Risk model port: Trait for the trainable tier classifier.
//!
//! This trait abstracts the numeric backend (the in-crate MLP) from the
//! triage lifecycle.

use serde::{Deserialize, Serialize};

use crate::domain::{ClassProbabilities, FeatureVector, TrainingSet};

/// Errors that can occur while training or running a risk model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training set has {features} feature rows but {labels} labels")]
    LabelCountMismatch { features: usize, labels: usize },

    #[error("Buffer allocation failed: {0}")]
    Allocation(String),

    #[error("Training diverged at epoch {epoch}: loss is not finite")]
    Diverged { epoch: usize },

    #[error("Model has not been trained")]
    NotTrained,

    #[error("Model produced invalid probabilities: {0}")]
    InvalidProbabilities(String),

    #[error("Training panicked: {0}")]
    Panicked(String),
}

/// Metrics recorded after one pass over the training rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    /// `None` when no rows were held out
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Outcome of a completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_samples: usize,
    pub validation_samples: usize,
    pub history: Vec<EpochMetrics>,

    /// SHA-256 over the final weights, hex encoded
    pub fingerprint: String,

    pub trained_at: chrono::DateTime<chrono::Utc>,
}

impl TrainingReport {
    /// Metrics of the last epoch (the weights that are kept).
    #[must_use]
    pub fn final_metrics(&self) -> Option<&EpochMetrics> {
        self.history.last()
    }
}

/// Trait for a trainable three-tier risk classifier.
///
/// Implementations must:
/// - Train at most once; later `train` calls return the stored report
/// - Disable training-only behaviour (dropout) during `infer`
/// - Return a valid probability distribution from `infer`
pub trait RiskModel: Send + Sync {
    /// Fit the model to a labeled corpus.
    ///
    /// # Errors
    /// Returns `ModelError` if the corpus is malformed or training diverges.
    fn train(&mut self, data: &TrainingSet) -> Result<TrainingReport, ModelError>;

    /// Classify one feature vector.
    ///
    /// # Errors
    /// Returns `ModelError::NotTrained` before training, or
    /// `ModelError::InvalidProbabilities` if the output breaks the simplex invariant.
    fn infer(&self, features: &FeatureVector) -> Result<ClassProbabilities, ModelError>;

    /// Whether `train` has completed successfully.
    fn is_trained(&self) -> bool;
}
