//! Feature encoding of a questionnaire for the risk classifier.
//!
//! The order of the 19 features is load-bearing: the classifier's input layer
//! and the synthetic weight vector both index into it positionally.

use serde::{Deserialize, Serialize};

use super::questionnaire::{
    ActivityLevel, BloodSugar, Cholesterol, CycleRegularity, Diet, ExerciseFrequency,
    InsulinResistance, PeriodFlow, Questionnaire, Severity, WeightGain,
};

/// Width of the classifier input.
pub const FEATURE_COUNT: usize = 19;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "weight",
    "height",
    "activity_level",
    "cycle_regularity",
    "cycle_length",
    "period_flow",
    "hair_growth",
    "hair_loss",
    "acne",
    "weight_gain",
    "insulin_resistance",
    "blood_sugar",
    "cholesterol",
    "mood_changes",
    "anxiety",
    "depression",
    "diet",
    "exercise",
];

const AGE_DIVISOR: f64 = 100.0;
const WEIGHT_DIVISOR: f64 = 200.0;
const HEIGHT_DIVISOR: f64 = 200.0;
const CYCLE_LENGTH_DIVISOR: f64 = 50.0;

/// Three-step encoding of a categorical answer onto {0, 0.5, 1}.
pub trait Ordinal {
    fn level(self) -> f64;
}

impl Ordinal for ActivityLevel {
    fn level(self) -> f64 {
        match self {
            Self::Low => 0.0,
            Self::Moderate => 0.5,
            Self::High => 1.0,
        }
    }
}

impl Ordinal for CycleRegularity {
    fn level(self) -> f64 {
        match self {
            Self::Regular => 0.0,
            Self::Sometimes => 0.5,
            Self::Irregular => 1.0,
        }
    }
}

impl Ordinal for PeriodFlow {
    fn level(self) -> f64 {
        match self {
            Self::Light => 0.0,
            Self::Normal => 0.5,
            Self::Heavy => 1.0,
        }
    }
}

impl Ordinal for Severity {
    fn level(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Mild => 0.5,
            Self::Moderate | Self::Severe => 1.0,
        }
    }
}

impl Ordinal for WeightGain {
    fn level(self) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Gradual => 0.5,
            Self::Rapid | Self::Extreme => 1.0,
        }
    }
}

impl Ordinal for InsulinResistance {
    fn level(self) -> f64 {
        match self {
            Self::No => 0.0,
            Self::Maybe => 0.5,
            Self::Yes => 1.0,
        }
    }
}

impl Ordinal for BloodSugar {
    fn level(self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::Prediabetic => 0.5,
            Self::Diabetic => 1.0,
        }
    }
}

impl Ordinal for Cholesterol {
    fn level(self) -> f64 {
        match self {
            Self::Normal => 0.0,
            Self::Borderline => 0.5,
            Self::High => 1.0,
        }
    }
}

impl Ordinal for Diet {
    fn level(self) -> f64 {
        match self {
            Self::Healthy => 0.0,
            Self::Average => 0.5,
            Self::Poor => 1.0,
        }
    }
}

impl Ordinal for ExerciseFrequency {
    fn level(self) -> f64 {
        match self {
            Self::Regular => 0.0,
            Self::Occasional => 0.5,
            Self::Rarely => 1.0,
        }
    }
}

/// Fixed-length numeric encoding consumed by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Encode a questionnaire.
    ///
    /// Numeric answers are divided by fixed constants without clamping, so
    /// out-of-range inputs yield values outside [0, 1].
    #[must_use]
    pub fn extract(q: &Questionnaire) -> Self {
        let personal = &q.personal_info;
        let menstrual = &q.menstrual_health;
        let physical = &q.physical_symptoms;
        let metabolic = &q.metabolic_health;
        let mental = &q.mental_emotional;
        let lifestyle = &q.lifestyle;

        Self([
            personal.age / AGE_DIVISOR,
            personal.weight / WEIGHT_DIVISOR,
            personal.height / HEIGHT_DIVISOR,
            personal.activity_level.level(),
            menstrual.cycle_regularity.level(),
            menstrual.cycle_length / CYCLE_LENGTH_DIVISOR,
            menstrual.period_flow.level(),
            physical.hair_growth.level(),
            physical.hair_loss.level(),
            physical.acne.level(),
            physical.weight_gain.level(),
            metabolic.insulin_resistance.level(),
            metabolic.blood_sugar.level(),
            metabolic.cholesterol.level(),
            mental.mood_changes.level(),
            mental.anxiety.level(),
            mental.depression.level(),
            lifestyle.diet.level(),
            lifestyle.exercise.level(),
        ])
    }

    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn zeros() -> Self {
        Self([0.0; FEATURE_COUNT])
    }

    /// Create features from a slice.
    ///
    /// # Errors
    /// Returns error if the slice length is not `FEATURE_COUNT`.
    pub fn from_slice(v: &[f64]) -> Result<Self, String> {
        let values: [f64; FEATURE_COUNT] = v
            .try_into()
            .map_err(|_| format!("Expected {FEATURE_COUNT} features, got {}", v.len()))?;
        Ok(Self(values))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
