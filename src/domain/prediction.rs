//! Prediction result types.
//!
//! Represents the classifier output after annotation with symptoms and
//! targeted recommendations.

use serde::{Deserialize, Serialize};

/// Number of risk tiers the classifier distinguishes.
pub const RISK_CLASSES: usize = 3;

/// Tolerance for the probability-simplex check.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Shown next to every result.
pub const MEDICAL_DISCLAIMER: &str = "This assessment is for educational purposes only and does not constitute medical advice. Please consult with a qualified healthcare provider for proper diagnosis and treatment.";

/// Risk tier for PCOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tiers in classifier output order.
    pub const ALL: [RiskLevel; RISK_CLASSES] = [Self::Low, Self::Medium, Self::High];

    /// Map a classifier output index to a tier.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// One-hot training label.
    #[must_use]
    pub fn one_hot(self) -> [f64; RISK_CLASSES] {
        let mut label = [0.0; RISK_CLASSES];
        label[self.index()] = 1.0;
        label
    }

    /// Guidance text for the results screen.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Low => "Your assessment suggests a low risk for PCOS. Continue with preventive care and healthy lifestyle habits.",
            Self::Medium => "Your assessment indicates moderate risk factors for PCOS. Consider consulting with a healthcare provider for further evaluation.",
            Self::High => "Your assessment shows multiple risk factors for PCOS. We strongly recommend consulting with a healthcare provider for proper diagnosis and treatment.",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Softmax output of the classifier, ordered [low, medium, high].
///
/// Construction enforces the simplex invariant; a vector that is not a
/// probability distribution indicates a broken model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 3]", into = "[f64; 3]")]
pub struct ClassProbabilities([f64; RISK_CLASSES]);

impl ClassProbabilities {
    /// # Errors
    /// Returns a description of the violated invariant.
    pub fn new(values: [f64; RISK_CLASSES]) -> Result<Self, String> {
        if let Some(bad) = values.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(format!("probability {bad} is not a finite non-negative number"));
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(format!("probabilities sum to {sum}, expected 1"));
        }
        Ok(Self(values))
    }

    #[must_use]
    pub fn values(&self) -> [f64; RISK_CLASSES] {
        self.0
    }

    #[must_use]
    pub fn get(&self, level: RiskLevel) -> f64 {
        self.0[level.index()]
    }

    /// Most probable tier and its probability. Ties resolve to the lower tier.
    #[must_use]
    pub fn argmax(&self) -> (RiskLevel, f64) {
        let mut best = RiskLevel::Low;
        for level in RiskLevel::ALL {
            if self.get(level) > self.get(best) {
                best = level;
            }
        }
        (best, self.get(best))
    }
}

impl TryFrom<[f64; RISK_CLASSES]> for ClassProbabilities {
    type Error = String;

    fn try_from(values: [f64; RISK_CLASSES]) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<ClassProbabilities> for [f64; RISK_CLASSES] {
    fn from(p: ClassProbabilities) -> Self {
        p.0
    }
}

/// Symptom flagged directly from questionnaire answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symptom {
    #[serde(rename = "Irregular menstrual cycles")]
    IrregularCycles,
    #[serde(rename = "Excess hair growth")]
    ExcessHairGrowth,
    #[serde(rename = "Acne or skin issues")]
    Acne,
    #[serde(rename = "Weight gain")]
    WeightGain,
    #[serde(rename = "Insulin resistance")]
    InsulinResistance,
    #[serde(rename = "Anxiety symptoms")]
    Anxiety,
    #[serde(rename = "Depression symptoms")]
    Depression,
    #[serde(rename = "Poor sleep quality")]
    PoorSleep,
}

impl Symptom {
    /// Check order; flagged symptoms are always reported in this order.
    pub const ALL: [Symptom; 8] = [
        Self::IrregularCycles,
        Self::ExcessHairGrowth,
        Self::Acne,
        Self::WeightGain,
        Self::InsulinResistance,
        Self::Anxiety,
        Self::Depression,
        Self::PoorSleep,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::IrregularCycles => "Irregular menstrual cycles",
            Self::ExcessHairGrowth => "Excess hair growth",
            Self::Acne => "Acne or skin issues",
            Self::WeightGain => "Weight gain",
            Self::InsulinResistance => "Insulin resistance",
            Self::Anxiety => "Anxiety symptoms",
            Self::Depression => "Depression symptoms",
            Self::PoorSleep => "Poor sleep quality",
        }
    }
}

impl std::fmt::Display for Symptom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Free-text advice grouped by category. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificRecommendations {
    pub diet: Vec<String>,
    pub exercise: Vec<String>,
    pub lifestyle: Vec<String>,
}

impl SpecificRecommendations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diet.is_empty() && self.exercise.is_empty() && self.lifestyle.is_empty()
    }
}

/// Annotated prediction handed to the presentation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub risk_level: RiskLevel,

    /// Rounded percentage of the winning class (0-100)
    pub confidence: u8,

    pub symptoms: Vec<Symptom>,

    pub specific_recommendations: SpecificRecommendations,

    /// Raw classifier output
    pub probabilities: ClassProbabilities,

    pub assessed_at: chrono::DateTime<chrono::Utc>,
}
