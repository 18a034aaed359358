//! Triage service: Owns the classifier lifecycle and runs assessments.
//!
//! The service holds at most one trained model. The first request (or an
//! explicit `warm_up`) builds a fresh model, trains it on a synthetic corpus,
//! and stores it; every later request reuses it. Training runs with the slot
//! lock held, so concurrent first requests share one training run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapters::synthetic::SyntheticDataGenerator;
use crate::application::annotator::InferenceAnnotator;
use crate::domain::{FeatureVector, PredictionResult, Questionnaire};
use crate::ports::{ModelError, RiskModel, TrainingReport};
use crate::{CyclesenseError, Result};

type ModelFactory<M> = Box<dyn Fn() -> M + Send + Sync>;

struct ModelSlot<M> {
    model: Option<Arc<M>>,
    report: Option<TrainingReport>,
    generator: SyntheticDataGenerator,
}

/// Application service for PCOS risk triage.
pub struct TriageService<M: RiskModel> {
    factory: ModelFactory<M>,
    sample_count: usize,
    slot: Mutex<ModelSlot<M>>,
    annotator: InferenceAnnotator,
}

impl<M: RiskModel> TriageService<M> {
    /// Create a service that builds models with `factory` and trains them on
    /// `sample_count` synthetic examples.
    pub fn new<F>(factory: F, sample_count: usize) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self::with_generator(factory, sample_count, SyntheticDataGenerator::new())
    }

    /// Same as `new` with an explicit corpus generator (seeded in tests).
    pub fn with_generator<F>(factory: F, sample_count: usize, generator: SyntheticDataGenerator) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            sample_count,
            slot: Mutex::new(ModelSlot {
                model: None,
                report: None,
                generator,
            }),
            annotator: InferenceAnnotator::new(),
        }
    }

    /// Assess one questionnaire, training the classifier first if needed.
    ///
    /// # Errors
    /// - `CyclesenseError::Validation` if a numeric answer is not finite
    /// - `CyclesenseError::TrainingFailed` if the lazy training run fails
    /// - `CyclesenseError::Prediction` if inference fails
    pub fn assess(&self, questionnaire: &Questionnaire) -> Result<PredictionResult> {
        self.check(questionnaire)?;

        let model = self.ready_model()?;

        let features = FeatureVector::extract(questionnaire);
        let probabilities = model.infer(&features).map_err(|e| {
            tracing::warn!("Inference failed: {e}");
            CyclesenseError::Prediction(e)
        })?;

        let result = self.annotator.annotate(&probabilities, questionnaire);
        tracing::info!(
            "Assessment complete: risk={}, confidence={}%, symptoms={}",
            result.risk_level,
            result.confidence,
            result.symptoms.len()
        );
        Ok(result)
    }

    /// Validate a questionnaire without assessing it.
    ///
    /// # Errors
    /// Returns `CyclesenseError::Validation` if a numeric answer is not finite.
    pub fn check(&self, questionnaire: &Questionnaire) -> Result<()> {
        questionnaire
            .validate()
            .map_err(|errors| CyclesenseError::Validation(errors.join("; ")))
    }

    /// Train the classifier ahead of the first request.
    ///
    /// Returns the existing report if a model is already trained.
    ///
    /// # Errors
    /// Returns `CyclesenseError::TrainingFailed` if training fails.
    pub fn warm_up(&self) -> Result<TrainingReport> {
        let mut slot = self.lock_slot();
        self.ensure_trained(&mut slot)?;
        slot.report.clone().ok_or_else(|| {
            CyclesenseError::TrainingFailed(ModelError::NotTrained)
        })
    }

    /// Whether a trained model is installed.
    ///
    /// Blocks while a training run is in progress.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.lock_slot().model.is_some()
    }

    /// Report of the installed model's training run, if any.
    #[must_use]
    pub fn training_report(&self) -> Option<TrainingReport> {
        self.lock_slot().report.clone()
    }

    /// The slot is only written after a successful run, so a poisoned guard
    /// still holds a consistent state.
    fn lock_slot(&self) -> MutexGuard<'_, ModelSlot<M>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the installed model, training one if the slot is empty.
    ///
    /// The lock is released before the caller runs inference.
    fn ready_model(&self) -> Result<Arc<M>> {
        let mut slot = self.lock_slot();
        self.ensure_trained(&mut slot)
    }

    fn ensure_trained(&self, slot: &mut ModelSlot<M>) -> Result<Arc<M>> {
        if let Some(model) = &slot.model {
            return Ok(Arc::clone(model));
        }

        tracing::info!("No trained classifier yet, starting training run");
        let mut model = (self.factory)();

        let report = {
            let corpus = slot
                .generator
                .generate(self.sample_count)
                .map_err(CyclesenseError::TrainingFailed)?;
            panic::catch_unwind(AssertUnwindSafe(|| model.train(&corpus)))
                .unwrap_or_else(|payload| Err(ModelError::Panicked(panic_message(&*payload))))
        }
        .map_err(|e| {
            tracing::warn!("Training failed, classifier slot left empty: {e}");
            CyclesenseError::TrainingFailed(e)
        })?;

        tracing::info!(
            "Classifier ready (fingerprint {}, {} epochs)",
            report.fingerprint,
            report.history.len()
        );

        let model = Arc::new(model);
        slot.model = Some(Arc::clone(&model));
        slot.report = Some(report);
        Ok(model)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
