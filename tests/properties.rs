use std::sync::OnceLock;

use cyclesense::adapters::mlp::{MlpClassifier, TrainingConfig};
use cyclesense::adapters::synthetic::SyntheticDataGenerator;
use cyclesense::application::{InferenceAnnotator, RECOMMENDATION_CATALOG};
use cyclesense::domain::{
    ActivityLevel, BloodSugar, ClassProbabilities, Cholesterol, CycleRegularity, Diet,
    ExerciseFrequency, FeatureVector, InsulinResistance, PeriodFlow, Questionnaire, Severity,
    SleepQuality, SmokingStatus, StressLevel, Symptom, WeightGain, FEATURE_COUNT,
};
use cyclesense::RiskModel;
use proptest::prelude::*;

/// One small trained classifier shared by every case.
fn trained_model() -> &'static MlpClassifier {
    static MODEL: OnceLock<MlpClassifier> = OnceLock::new();
    MODEL.get_or_init(|| {
        let config = TrainingConfig {
            samples: 200,
            epochs: 3,
            ..TrainingConfig::default()
        };
        let data = SyntheticDataGenerator::with_seed(23)
            .generate(config.samples)
            .expect("Should generate");
        let mut model = MlpClassifier::with_seed(config, 23);
        model.train(&data).expect("Should train");
        model
    })
}

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::None),
        Just(Severity::Mild),
        Just(Severity::Moderate),
        Just(Severity::Severe),
    ]
}

fn cycle() -> impl Strategy<Value = (ActivityLevel, CycleRegularity, PeriodFlow)> {
    (
        prop_oneof![Just(ActivityLevel::Low), Just(ActivityLevel::Moderate), Just(ActivityLevel::High)],
        prop_oneof![
            Just(CycleRegularity::Regular),
            Just(CycleRegularity::Sometimes),
            Just(CycleRegularity::Irregular)
        ],
        prop_oneof![Just(PeriodFlow::Light), Just(PeriodFlow::Normal), Just(PeriodFlow::Heavy)],
    )
}

fn metabolic() -> impl Strategy<Value = (WeightGain, InsulinResistance, BloodSugar, Cholesterol)> {
    (
        prop_oneof![
            Just(WeightGain::None),
            Just(WeightGain::Gradual),
            Just(WeightGain::Rapid),
            Just(WeightGain::Extreme)
        ],
        prop_oneof![
            Just(InsulinResistance::No),
            Just(InsulinResistance::Maybe),
            Just(InsulinResistance::Yes)
        ],
        prop_oneof![Just(BloodSugar::Normal), Just(BloodSugar::Prediabetic), Just(BloodSugar::Diabetic)],
        prop_oneof![Just(Cholesterol::Normal), Just(Cholesterol::Borderline), Just(Cholesterol::High)],
    )
}

fn habits(
) -> impl Strategy<Value = (SleepQuality, Diet, ExerciseFrequency, StressLevel, SmokingStatus)> {
    (
        prop_oneof![Just(SleepQuality::Good), Just(SleepQuality::Fair), Just(SleepQuality::Poor)],
        prop_oneof![Just(Diet::Healthy), Just(Diet::Average), Just(Diet::Poor)],
        prop_oneof![
            Just(ExerciseFrequency::Regular),
            Just(ExerciseFrequency::Occasional),
            Just(ExerciseFrequency::Rarely)
        ],
        prop_oneof![Just(StressLevel::Low), Just(StressLevel::Moderate), Just(StressLevel::High)],
        prop_oneof![
            Just(SmokingStatus::Never),
            Just(SmokingStatus::Former),
            Just(SmokingStatus::Current)
        ],
    )
}

prop_compose! {
    fn questionnaire()(
        (age, weight, height, cycle_length) in (10.0..90.0f64, 30.0..200.0f64, 120.0..200.0f64, 15.0..60.0f64),
        (activity, regularity, flow) in cycle(),
        severities in proptest::collection::vec(severity(), 6),
        (weight_gain, insulin, sugar, cholesterol) in metabolic(),
        (sleep, diet, exercise, stress, smoking) in habits()
    ) -> Questionnaire {
        let mut q = Questionnaire::default();
        q.personal_info.age = age;
        q.personal_info.weight = weight;
        q.personal_info.height = height;
        q.personal_info.activity_level = activity;
        q.menstrual_health.cycle_regularity = regularity;
        q.menstrual_health.cycle_length = cycle_length;
        q.menstrual_health.period_flow = flow;
        q.physical_symptoms.hair_growth = severities[0];
        q.physical_symptoms.hair_loss = severities[1];
        q.physical_symptoms.acne = severities[2];
        q.physical_symptoms.weight_gain = weight_gain;
        q.metabolic_health.insulin_resistance = insulin;
        q.metabolic_health.blood_sugar = sugar;
        q.metabolic_health.cholesterol = cholesterol;
        q.mental_emotional.mood_changes = severities[3];
        q.mental_emotional.anxiety = severities[4];
        q.mental_emotional.depression = severities[5];
        q.mental_emotional.sleep_quality = sleep;
        q.lifestyle.diet = diet;
        q.lifestyle.exercise = exercise;
        q.lifestyle.stress = stress;
        q.lifestyle.smoking = smoking;
        q
    }
}

fn distribution() -> impl Strategy<Value = ClassProbabilities> {
    (0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64)
        .prop_filter("non-degenerate", |(a, b, c)| a + b + c > 1e-3)
        .prop_map(|(a, b, c)| {
            let sum = a + b + c;
            ClassProbabilities::new([a / sum, b / sum, c / sum]).expect("normalized")
        })
}

fn feature_vector() -> impl Strategy<Value = FeatureVector> {
    proptest::collection::vec(-1e6..1e6f64, FEATURE_COUNT)
        .prop_map(|values| FeatureVector::from_slice(&values).expect("19 values"))
}

proptest! {
    #[test]
    fn prop_inference_returns_distribution(features in feature_vector()) {
        let p = trained_model().infer(&features).expect("Should infer");
        let values = p.values();
        prop_assert!(values.iter().all(|v| v.is_finite() && *v >= 0.0), "{:?}", values);
        let sum: f64 = values.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-6, "sum = {}", sum);
    }

    #[test]
    fn prop_categorical_features_are_three_step(q in questionnaire()) {
        let v = FeatureVector::extract(&q);
        let categorical = [3, 4, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18];
        for i in categorical {
            let x = v.as_slice()[i];
            prop_assert!(x == 0.0 || x == 0.5 || x == 1.0, "feature {} = {}", i, x);
        }
    }

    #[test]
    fn prop_numeric_features_scale_without_clamping(q in questionnaire()) {
        let v = FeatureVector::extract(&q);
        prop_assert_eq!(v.as_slice()[0], q.personal_info.age / 100.0);
        prop_assert_eq!(v.as_slice()[1], q.personal_info.weight / 200.0);
        prop_assert_eq!(v.as_slice()[2], q.personal_info.height / 200.0);
        prop_assert_eq!(v.as_slice()[5], q.menstrual_health.cycle_length / 50.0);
    }

    #[test]
    fn prop_extraction_is_deterministic(q in questionnaire()) {
        prop_assert_eq!(FeatureVector::extract(&q), FeatureVector::extract(&q.clone()));
    }

    #[test]
    fn prop_ignored_answers_do_not_change_features(q in questionnaire(), note in "[a-z]{0,12}") {
        let mut other = q.clone();
        other.physical_symptoms.skin_changes = note.clone();
        other.metabolic_health.blood_pressure = note.clone();
        other.menstrual_health.last_period = note;
        other.mental_emotional.sleep_quality = SleepQuality::Poor;
        other.lifestyle.stress = StressLevel::High;
        other.lifestyle.smoking = SmokingStatus::Current;
        prop_assert_eq!(FeatureVector::extract(&q), FeatureVector::extract(&other));
    }

    #[test]
    fn prop_symptoms_keep_check_order(q in questionnaire()) {
        let symptoms = InferenceAnnotator::symptoms(&q);
        let positions: Vec<usize> = symptoms
            .iter()
            .map(|s| Symptom::ALL.iter().position(|x| x == s).expect("known symptom"))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn prop_recommendations_come_from_catalog(q in questionnaire()) {
        let recs = InferenceAnnotator::recommendations(&q);
        let catalog: Vec<&str> = RECOMMENDATION_CATALOG
            .iter()
            .flat_map(|r| r.advice.iter().map(|(_, text)| *text))
            .collect();
        for item in recs.diet.iter().chain(&recs.exercise).chain(&recs.lifestyle) {
            prop_assert!(catalog.contains(&item.as_str()));
        }

        let expected: usize = RECOMMENDATION_CATALOG
            .iter()
            .filter(|r| (r.applies)(&q))
            .map(|r| r.advice.len())
            .sum();
        prop_assert_eq!(recs.diet.len() + recs.exercise.len() + recs.lifestyle.len(), expected);
    }

    #[test]
    fn prop_annotation_picks_most_probable_tier(q in questionnaire(), p in distribution()) {
        let result = InferenceAnnotator::new().annotate(&p, &q);
        let values = p.values();
        let best = values[result.risk_level.index()];
        prop_assert!(values.iter().all(|v| *v <= best));
        prop_assert!(result.confidence <= 100);
        prop_assert_eq!(result.confidence, (best * 100.0).round() as u8);
    }
}
