//! Synthetic training data for the risk classifier.
//!
//! Draws uniform feature rows and labels them with the fixed weighted-sum
//! rule from `domain::training`. The corpus is independent of real
//! questionnaires; it only gives the network a boundary to fit.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::domain::{synthetic_risk_score, FeatureVector, RiskLevel, TrainingSet, FEATURE_COUNT};
use crate::ports::ModelError;

/// Corpus size used when nothing else is configured.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Generator of labeled synthetic feature rows.
pub struct SyntheticDataGenerator {
    rng: ChaCha20Rng,
}

impl SyntheticDataGenerator {
    /// Create a generator seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Create a reproducible generator.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Generate `count` labeled examples.
    ///
    /// # Errors
    /// Returns `ModelError::Allocation` if the corpus buffers cannot be reserved.
    pub fn generate(&mut self, count: usize) -> Result<TrainingSet, ModelError> {
        let mut set = TrainingSet::default();
        set.features
            .try_reserve_exact(count)
            .map_err(|e| ModelError::Allocation(format!("{count} feature rows: {e}")))?;
        set.labels
            .try_reserve_exact(count)
            .map_err(|e| ModelError::Allocation(format!("{count} labels: {e}")))?;

        for _ in 0..count {
            let mut row = [0.0; FEATURE_COUNT];
            for value in &mut row {
                *value = self.rng.gen::<f64>();
            }
            let features = FeatureVector::new(row);
            let level = RiskLevel::from_synthetic_score(synthetic_risk_score(&features));

            set.features.push(features);
            set.labels.push(level.one_hot());
        }

        let [low, medium, high] = set.class_counts();
        tracing::debug!(
            "Generated {} synthetic examples (low={}, medium={}, high={})",
            count,
            low,
            medium,
            high
        );

        Ok(set)
    }
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
