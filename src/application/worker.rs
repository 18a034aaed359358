//! Background worker for non-blocking assessments.
//!
//! Training the classifier takes seconds, so callers with their own event
//! loop hand the assessment to a worker thread and poll for progress.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::application::TriageService;
use crate::domain::{PredictionResult, Questionnaire};
use crate::ports::{RiskModel, TrainingReport};
use crate::Result;

/// Progress updates from the triage worker.
#[derive(Debug, Clone)]
pub enum TriageProgress {
    /// No trained classifier yet; training started
    Training,
    /// Classifier ready, running inference
    Classifying,
    /// Assessment finished
    Complete(Box<PredictionResult>),
    /// Warm-up finished
    Trained(Box<TrainingReport>),
    /// Assessment or training failed
    Error(String),
}

impl TriageProgress {
    /// Whether no further updates follow this one.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Trained(_) | Self::Error(_))
    }
}

/// Handle to a running triage worker.
pub struct TriageWorkerHandle {
    /// Receiver for progress updates
    pub progress_rx: Receiver<TriageProgress>,
    _handle: JoinHandle<()>,
}

impl TriageWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<TriageProgress> {
        self.progress_rx.try_recv().ok()
    }

    /// Block until the worker reports a final state.
    ///
    /// Intermediate updates are passed to `on_progress`. If the worker exits
    /// without a final update, an `Error` is returned.
    pub fn wait(self, mut on_progress: impl FnMut(&TriageProgress)) -> TriageProgress {
        for update in self.progress_rx.iter() {
            if update.is_final() {
                return update;
            }
            on_progress(&update);
        }
        TriageProgress::Error("Triage worker exited without a result".to_string())
    }
}

/// Runs triage work on a background thread.
pub struct TriageWorker;

impl TriageWorker {
    /// Spawn a background assessment.
    pub fn spawn<M>(service: Arc<TriageService<M>>, questionnaire: Questionnaire) -> TriageWorkerHandle
    where
        M: RiskModel + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || Self::run_assessment(&service, &questionnaire, &tx));

        TriageWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    /// Spawn a background training run.
    pub fn warm_up<M>(service: Arc<TriageService<M>>) -> TriageWorkerHandle
    where
        M: RiskModel + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            if !service.is_trained() {
                let _ = tx.send(TriageProgress::Training);
            }
            let update = match service.warm_up() {
                Ok(report) => TriageProgress::Trained(Box::new(report)),
                Err(e) => TriageProgress::Error(e.to_string()),
            };
            let _ = tx.send(update);
        });

        TriageWorkerHandle {
            progress_rx: rx,
            _handle: handle,
        }
    }

    fn run_assessment<M: RiskModel>(
        service: &TriageService<M>,
        questionnaire: &Questionnaire,
        tx: &Sender<TriageProgress>,
    ) {
        let update = Self::assess_with_progress(service, questionnaire, tx)
            .map(|result| TriageProgress::Complete(Box::new(result)))
            .unwrap_or_else(|e| {
                tracing::warn!("Background assessment failed: {e}");
                TriageProgress::Error(e.to_string())
            });
        let _ = tx.send(update);
    }

    /// `Classifying` is only sent once a trained model is installed.
    fn assess_with_progress<M: RiskModel>(
        service: &TriageService<M>,
        questionnaire: &Questionnaire,
        tx: &Sender<TriageProgress>,
    ) -> Result<PredictionResult> {
        service.check(questionnaire)?;

        if !service.is_trained() {
            let _ = tx.send(TriageProgress::Training);
            service.warm_up()?;
        }
        let _ = tx.send(TriageProgress::Classifying);

        service.assess(questionnaire)
    }
}
