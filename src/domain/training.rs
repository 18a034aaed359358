//! Labeled training corpus and the synthetic labelling rule.

use super::features::{FeatureVector, FEATURE_COUNT};
use super::prediction::{RiskLevel, RISK_CLASSES};

/// Per-feature weights of the synthetic risk score, in feature order.
///
/// Not clinically derived; they only manufacture a learnable boundary. The
/// weights sum to 1.47, so uniform draws skew heavily towards the high tier.
pub const SYNTHETIC_RISK_WEIGHTS: [f64; FEATURE_COUNT] = [
    0.05, 0.03, 0.02, 0.08, 0.15, 0.05, 0.07, 0.12, 0.08, 0.10, 0.06, 0.12, 0.08, 0.09, 0.07, 0.08,
    0.09, 0.08, 0.05,
];

/// Scores below this are labeled low.
pub const LOW_RISK_CUTOFF: f64 = 0.3;

/// Scores below this (and at or above `LOW_RISK_CUTOFF`) are labeled medium.
pub const HIGH_RISK_CUTOFF: f64 = 0.7;

/// Weighted sum used to label synthetic examples.
#[must_use]
pub fn synthetic_risk_score(features: &FeatureVector) -> f64 {
    features
        .as_slice()
        .iter()
        .zip(SYNTHETIC_RISK_WEIGHTS.iter())
        .fold(0.0, |acc, (x, w)| acc + x * w)
}

impl RiskLevel {
    /// Threshold a synthetic risk score into a tier.
    #[must_use]
    pub fn from_synthetic_score(score: f64) -> Self {
        if score < LOW_RISK_CUTOFF {
            Self::Low
        } else if score < HIGH_RISK_CUTOFF {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Feature rows with one-hot labels, kept as parallel vectors.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<[f64; RISK_CLASSES]>,
}

impl TrainingSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of rows held out for validation, taken from the tail.
    #[must_use]
    pub fn validation_len(&self, fraction: f64) -> usize {
        let n = self.len();
        if n < 2 || fraction <= 0.0 {
            return 0;
        }
        let held_out = (n as f64 * fraction).floor() as usize;
        held_out.min(n - 1)
    }

    /// Count of examples per tier, ordered [low, medium, high].
    #[must_use]
    pub fn class_counts(&self) -> [usize; RISK_CLASSES] {
        let mut counts = [0; RISK_CLASSES];
        for label in &self.labels {
            if let Some(idx) = label.iter().position(|v| *v == 1.0) {
                counts[idx] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(RiskLevel::from_synthetic_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_synthetic_score(0.2999), RiskLevel::Low);
        assert_eq!(RiskLevel::from_synthetic_score(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_synthetic_score(0.6999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_synthetic_score(0.7), RiskLevel::High);
        assert_eq!(RiskLevel::from_synthetic_score(1.4), RiskLevel::High);
    }

    #[test]
    fn test_score_of_extremes() {
        assert_eq!(synthetic_risk_score(&FeatureVector::zeros()), 0.0);

        let ones = FeatureVector::new([1.0; FEATURE_COUNT]);
        let total: f64 = SYNTHETIC_RISK_WEIGHTS.iter().sum();
        assert!((synthetic_risk_score(&ones) - total).abs() < 1e-12);
        assert!((total - 1.47).abs() < 1e-9);
    }

    #[test]
    fn test_validation_len() {
        let set = TrainingSet {
            features: vec![FeatureVector::zeros(); 1000],
            labels: vec![RiskLevel::Low.one_hot(); 1000],
        };
        assert_eq!(set.validation_len(0.2), 200);
        assert_eq!(set.validation_len(0.0), 0);
        assert_eq!(set.class_counts(), [1000, 0, 0]);

        let tiny = TrainingSet {
            features: vec![FeatureVector::zeros(); 2],
            labels: vec![RiskLevel::High.one_hot(); 2],
        };
        assert_eq!(tiny.validation_len(0.99), 1);
    }
}
