//! Questionnaire types for PCOS risk triage.
//!
//! Mirrors the six-section assessment produced by the form collaborator.
//! Field names serialize as camelCase and enum values as lowercase strings,
//! so a submitted form deserializes without any translation layer.

use serde::{Deserialize, Serialize};

/// Complete symptom survey for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Questionnaire {
    pub personal_info: PersonalInfo,
    pub menstrual_health: MenstrualHealth,
    pub physical_symptoms: PhysicalSymptoms,
    pub metabolic_health: MetabolicHealth,
    pub mental_emotional: MentalEmotional,
    pub lifestyle: Lifestyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    /// Age in years
    pub age: f64,
    /// Weight in kg
    pub weight: f64,
    /// Height in cm
    pub height: f64,
    pub activity_level: ActivityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenstrualHealth {
    pub cycle_regularity: CycleRegularity,
    /// Typical cycle length in days
    pub cycle_length: f64,
    pub period_flow: PeriodFlow,
    /// Free-form token from the form (e.g. "thisMonth")
    pub last_period: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalSymptoms {
    pub hair_growth: Severity,
    pub hair_loss: Severity,
    pub acne: Severity,
    pub weight_gain: WeightGain,
    pub skin_changes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicHealth {
    pub insulin_resistance: InsulinResistance,
    pub blood_sugar: BloodSugar,
    pub cholesterol: Cholesterol,
    pub blood_pressure: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentalEmotional {
    pub mood_changes: Severity,
    pub anxiety: Severity,
    pub depression: Severity,
    pub sleep_quality: SleepQuality,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifestyle {
    pub diet: Diet,
    pub exercise: ExerciseFrequency,
    pub stress: StressLevel,
    pub smoking: SmokingStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleRegularity {
    Regular,
    /// Sometimes irregular
    Sometimes,
    Irregular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodFlow {
    Light,
    Normal,
    Heavy,
}

/// Shared four-step scale for hair growth, hair loss, acne and mood symptoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightGain {
    None,
    Gradual,
    Rapid,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsulinResistance {
    No,
    /// Not sure / suspected
    Maybe,
    Yes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BloodSugar {
    Normal,
    Prediabetic,
    Diabetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cholesterol {
    Normal,
    Borderline,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    Healthy,
    Average,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseFrequency {
    Regular,
    Occasional,
    Rarely,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            age: 25.0,
            weight: 65.0,
            height: 165.0,
            activity_level: ActivityLevel::Moderate,
        }
    }
}

impl Default for MenstrualHealth {
    fn default() -> Self {
        Self {
            cycle_regularity: CycleRegularity::Regular,
            cycle_length: 28.0,
            period_flow: PeriodFlow::Normal,
            last_period: "thisMonth".to_string(),
        }
    }
}

impl Default for PhysicalSymptoms {
    fn default() -> Self {
        Self {
            hair_growth: Severity::None,
            hair_loss: Severity::None,
            acne: Severity::None,
            weight_gain: WeightGain::None,
            skin_changes: "none".to_string(),
        }
    }
}

impl Default for MetabolicHealth {
    fn default() -> Self {
        Self {
            insulin_resistance: InsulinResistance::No,
            blood_sugar: BloodSugar::Normal,
            cholesterol: Cholesterol::Normal,
            blood_pressure: "normal".to_string(),
        }
    }
}

impl Default for MentalEmotional {
    fn default() -> Self {
        Self {
            mood_changes: Severity::None,
            anxiety: Severity::None,
            depression: Severity::None,
            sleep_quality: SleepQuality::Good,
        }
    }
}

impl Default for Lifestyle {
    fn default() -> Self {
        Self {
            diet: Diet::Healthy,
            exercise: ExerciseFrequency::Regular,
            stress: StressLevel::Low,
            smoking: SmokingStatus::Never,
        }
    }
}

impl Questionnaire {
    /// Validate the numeric answers.
    ///
    /// Values are deliberately unranged (the feature encoding accepts anything),
    /// but NaN and infinities would silently poison the classifier input.
    ///
    /// # Errors
    /// Returns one message per offending field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let numeric = [
            ("personalInfo.age", self.personal_info.age),
            ("personalInfo.weight", self.personal_info.weight),
            ("personalInfo.height", self.personal_info.height),
            ("menstrualHealth.cycleLength", self.menstrual_health.cycle_length),
        ];

        let errors: Vec<String> = numeric
            .iter()
            .filter(|(_, value)| !value.is_finite())
            .map(|(field, value)| format!("{field} must be a finite number, got {value}"))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
