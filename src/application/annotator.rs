//! Turns raw class probabilities into a user-facing prediction.
//!
//! The tier comes from the classifier; symptoms and recommendations come
//! straight from the questionnaire answers and do not depend on the tier.

use crate::domain::{
    BloodSugar, ClassProbabilities, CycleRegularity, InsulinResistance, PredictionResult,
    Questionnaire, Severity, SleepQuality, SpecificRecommendations, StressLevel, Symptom,
    WeightGain,
};

/// Recommendation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Diet,
    Exercise,
    Lifestyle,
}

/// One conditional advice rule.
pub struct RecommendationRule {
    /// Short description of the trigger
    pub trigger: &'static str,
    pub applies: fn(&Questionnaire) -> bool,
    pub advice: &'static [(Category, &'static str)],
}

/// Every advice rule, in evaluation order.
pub const RECOMMENDATION_CATALOG: &[RecommendationRule] = &[
    RecommendationRule {
        trigger: "insulin resistance or abnormal blood sugar",
        applies: |q| {
            q.metabolic_health.insulin_resistance == InsulinResistance::Yes
                || q.metabolic_health.blood_sugar != BloodSugar::Normal
        },
        advice: &[
            (Category::Diet, "Focus on low glycemic index foods"),
            (Category::Diet, "Increase fiber intake to 25-30g daily"),
            (Category::Diet, "Consider intermittent fasting (consult doctor first)"),
            (Category::Exercise, "Include HIIT training 2-3 times per week"),
            (Category::Exercise, "Add resistance training to build muscle"),
        ],
    },
    RecommendationRule {
        trigger: "excess hair growth or acne",
        applies: |q| {
            q.physical_symptoms.hair_growth != Severity::None
                || q.physical_symptoms.acne != Severity::None
        },
        advice: &[
            (Category::Diet, "Reduce dairy intake which may increase androgens"),
            (Category::Diet, "Include anti-inflammatory foods like turmeric and ginger"),
            (Category::Lifestyle, "Consider spearmint tea (2 cups daily) for androgen reduction"),
        ],
    },
    RecommendationRule {
        trigger: "high stress or anxiety",
        applies: |q| {
            q.lifestyle.stress == StressLevel::High
                || q.mental_emotional.anxiety != Severity::None
        },
        advice: &[
            (Category::Exercise, "Practice yoga or meditation daily"),
            (Category::Exercise, "Include gentle, stress-reducing activities"),
            (Category::Lifestyle, "Prioritize 7-9 hours of quality sleep"),
            (Category::Lifestyle, "Consider adaptogenic herbs like ashwagandha"),
        ],
    },
    RecommendationRule {
        trigger: "weight gain",
        applies: |q| q.physical_symptoms.weight_gain != WeightGain::None,
        advice: &[
            (Category::Diet, "Focus on protein at each meal (20-30g)"),
            (Category::Diet, "Eat smaller, frequent meals to stabilize blood sugar"),
            (Category::Exercise, "Combine cardio with strength training"),
        ],
    },
    RecommendationRule {
        trigger: "irregular cycles",
        applies: |q| q.menstrual_health.cycle_regularity != CycleRegularity::Regular,
        advice: &[
            (Category::Diet, "Include omega-3 rich foods like fatty fish"),
            (Category::Diet, "Ensure adequate vitamin D intake"),
            (Category::Lifestyle, "Track cycles and symptoms for patterns"),
        ],
    },
];

impl Symptom {
    /// Whether the questionnaire answers flag this symptom.
    #[must_use]
    pub fn is_present(self, q: &Questionnaire) -> bool {
        match self {
            Self::IrregularCycles => q.menstrual_health.cycle_regularity != CycleRegularity::Regular,
            Self::ExcessHairGrowth => q.physical_symptoms.hair_growth != Severity::None,
            Self::Acne => q.physical_symptoms.acne != Severity::None,
            Self::WeightGain => q.physical_symptoms.weight_gain != WeightGain::None,
            Self::InsulinResistance => {
                q.metabolic_health.insulin_resistance == InsulinResistance::Yes
            }
            Self::Anxiety => q.mental_emotional.anxiety != Severity::None,
            Self::Depression => q.mental_emotional.depression != Severity::None,
            Self::PoorSleep => q.mental_emotional.sleep_quality == SleepQuality::Poor,
        }
    }
}

/// Stateless annotation of classifier output.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferenceAnnotator;

impl InferenceAnnotator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build the prediction for one submission.
    #[must_use]
    pub fn annotate(&self, probabilities: &ClassProbabilities, q: &Questionnaire) -> PredictionResult {
        let (risk_level, max) = probabilities.argmax();

        PredictionResult {
            risk_level,
            confidence: confidence_percent(max),
            symptoms: Self::symptoms(q),
            specific_recommendations: Self::recommendations(q),
            probabilities: *probabilities,
            assessed_at: chrono::Utc::now(),
        }
    }

    /// Flagged symptoms in fixed check order.
    #[must_use]
    pub fn symptoms(q: &Questionnaire) -> Vec<Symptom> {
        Symptom::ALL
            .into_iter()
            .filter(|s| s.is_present(q))
            .collect()
    }

    /// Advice from every rule that fires, in catalog order. Duplicates are kept.
    #[must_use]
    pub fn recommendations(q: &Questionnaire) -> SpecificRecommendations {
        let mut out = SpecificRecommendations::default();
        for rule in RECOMMENDATION_CATALOG.iter().filter(|r| (r.applies)(q)) {
            tracing::trace!("Recommendation rule fired: {}", rule.trigger);
            for (category, text) in rule.advice {
                let bucket = match category {
                    Category::Diet => &mut out.diet,
                    Category::Exercise => &mut out.exercise,
                    Category::Lifestyle => &mut out.lifestyle,
                };
                bucket.push((*text).to_string());
            }
        }
        out
    }
}

/// Rounded percentage in 0..=100.
fn confidence_percent(p: f64) -> u8 {
    (p * 100.0).round().clamp(0.0, 100.0) as u8
}
