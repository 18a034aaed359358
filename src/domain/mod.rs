//! Domain layer: Core triage types and logic.
//!
//! Pure Rust types with no I/O. Questionnaire answers are closed enums,
//! so every mapping over them is an exhaustive match.

mod features;
mod prediction;
mod questionnaire;
mod training;

pub use features::{FeatureVector, Ordinal, FEATURE_COUNT, FEATURE_NAMES};
pub use prediction::{
    ClassProbabilities, PredictionResult, RiskLevel, SpecificRecommendations, Symptom,
    MEDICAL_DISCLAIMER, RISK_CLASSES,
};
pub use questionnaire::{
    ActivityLevel, BloodSugar, Cholesterol, CycleRegularity, Diet, ExerciseFrequency,
    InsulinResistance, Lifestyle, MenstrualHealth, MentalEmotional, MetabolicHealth, PeriodFlow,
    PersonalInfo, PhysicalSymptoms, Questionnaire, Severity, SleepQuality, SmokingStatus,
    StressLevel, WeightGain,
};
pub use training::{
    synthetic_risk_score, TrainingSet, HIGH_RISK_CUTOFF, LOW_RISK_CUTOFF, SYNTHETIC_RISK_WEIGHTS,
};
