//! MLP adapter: Implementation of RiskModel as a small feed-forward network.
//!
//! Topology (fixed):
//!
//! ```text
//! 19 -> Dense(64, relu) -> Dropout(0.3) -> Dense(32, relu) -> Dropout(0.2)
//!    -> Dense(16, relu) -> Dense(3, softmax)
//! ```
//!
//! Hidden layers start from a N(0, 0.05) kernel, the output layer from
//! Glorot-uniform, all biases from zero. Training minimizes categorical
//! cross-entropy with Adam. Dropout is applied only inside `train`; `infer`
//! runs the deterministic path.
//!
//! # Nondeterminism
//!
//! Weights and dropout masks come from a ChaCha20 RNG seeded from OS entropy,
//! so two processes can classify the same questionnaire differently. Within
//! one process the trained weights never change.

mod adam;
mod layers;
mod matrix;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use crate::adapters::synthetic::DEFAULT_SAMPLE_COUNT;
use crate::domain::{ClassProbabilities, FeatureVector, TrainingSet, FEATURE_COUNT, RISK_CLASSES};
use crate::ports::{EpochMetrics, ModelError, RiskModel, TrainingReport};

use adam::Adam;
use layers::{Activation, Dense, DenseGradients, Dropout, Initializer, Layer};
use matrix::Matrix;

/// Stddev of the hidden-layer kernel initializer.
const HIDDEN_INIT_STDDEV: f64 = 0.05;

/// Probability clip applied inside the cross-entropy log.
const LOSS_EPSILON: f64 = 1e-7;

/// Configuration for the training regimen.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Synthetic corpus size
    pub samples: usize,

    pub epochs: usize,

    pub batch_size: usize,

    /// Fraction of the corpus (taken from the tail) held out for validation
    pub validation_split: f64,

    pub learning_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLE_COUNT,
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 0.001,
        }
    }
}

impl TrainingConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - CYCLESENSE_TRAINING_SAMPLES
    /// - CYCLESENSE_EPOCHS
    /// - CYCLESENSE_BATCH_SIZE
    /// - CYCLESENSE_VALIDATION_SPLIT (in [0, 1))
    /// - CYCLESENSE_LEARNING_RATE
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Some(n) = env_parse::<usize>("CYCLESENSE_TRAINING_SAMPLES").filter(|n| *n > 0) {
            cfg.samples = n;
        }
        if let Some(n) = env_parse::<usize>("CYCLESENSE_EPOCHS").filter(|n| *n > 0) {
            cfg.epochs = n;
        }
        if let Some(n) = env_parse::<usize>("CYCLESENSE_BATCH_SIZE").filter(|n| *n > 0) {
            cfg.batch_size = n;
        }
        if let Some(x) = env_parse::<f64>("CYCLESENSE_VALIDATION_SPLIT")
            .filter(|x| x.is_finite() && (0.0..1.0).contains(x))
        {
            cfg.validation_split = x;
        }
        if let Some(x) =
            env_parse::<f64>("CYCLESENSE_LEARNING_RATE").filter(|x| x.is_finite() && *x > 0.0)
        {
            cfg.learning_rate = x;
        }

        cfg
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {name}={raw:?}");
            None
        }
    }
}

/// Values recorded by a training-mode forward pass, consumed by backprop.
struct ForwardTrace {
    /// `activations[i]` is the input of layer `i`; the last entry is the output.
    activations: Vec<Matrix>,
    masks: Vec<Option<Matrix>>,
}

/// Feed-forward risk classifier.
pub struct MlpClassifier {
    layers: Vec<Layer>,
    config: TrainingConfig,
    rng: ChaCha20Rng,
    report: Option<TrainingReport>,
}

impl MlpClassifier {
    /// Create an untrained classifier with weights drawn from OS entropy.
    #[must_use]
    pub fn new(config: TrainingConfig) -> Self {
        Self::from_rng(config, ChaCha20Rng::from_entropy())
    }

    /// Create a reproducible untrained classifier.
    #[must_use]
    pub fn with_seed(config: TrainingConfig, seed: u64) -> Self {
        Self::from_rng(config, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(config: TrainingConfig, mut rng: ChaCha20Rng) -> Self {
        let hidden = Initializer::RandomNormal {
            stddev: HIDDEN_INIT_STDDEV,
        };
        let layers = vec![
            Layer::Dense(Dense::new(FEATURE_COUNT, 64, Activation::Relu, hidden, &mut rng)),
            Layer::Dropout(Dropout::new(0.3)),
            Layer::Dense(Dense::new(64, 32, Activation::Relu, hidden, &mut rng)),
            Layer::Dropout(Dropout::new(0.2)),
            Layer::Dense(Dense::new(32, 16, Activation::Relu, hidden, &mut rng)),
            Layer::Dense(Dense::new(
                16,
                RISK_CLASSES,
                Activation::Softmax,
                Initializer::GlorotUniform,
                &mut rng,
            )),
        ];

        Self {
            layers,
            config,
            rng,
            report: None,
        }
    }

    #[must_use]
    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    /// Number of trainable parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        dense_layers(&self.layers)
            .map(|d| d.weights.as_slice().len() + d.bias.len())
            .sum()
    }

    /// SHA-256 over all weights and biases, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint_layers(&self.layers)
    }

    /// Run the network without dropout.
    fn predict(layers: &[Layer], input: &Matrix) -> Matrix {
        let mut x = input.clone();
        for layer in layers {
            if let Layer::Dense(dense) = layer {
                x = dense.forward(&x);
            }
        }
        x
    }

    fn forward_train(layers: &[Layer], input: Matrix, rng: &mut ChaCha20Rng) -> ForwardTrace {
        let mut activations = Vec::with_capacity(layers.len() + 1);
        let mut masks = Vec::with_capacity(layers.len());
        let mut x = input;

        for layer in layers {
            let y = match layer {
                Layer::Dense(dense) => {
                    masks.push(None);
                    dense.forward(&x)
                }
                Layer::Dropout(dropout) => {
                    let mask = dropout.mask(x.rows(), x.cols(), rng);
                    let mut y = x.clone();
                    y.hadamard_inplace(&mask);
                    masks.push(Some(mask));
                    y
                }
            };
            activations.push(std::mem::replace(&mut x, y));
        }
        activations.push(x);

        ForwardTrace { activations, masks }
    }

    /// Backpropagate softmax + cross-entropy. Returns one gradient per layer
    /// (`None` for dropout layers).
    fn backward(
        layers: &[Layer],
        trace: &ForwardTrace,
        targets: &Matrix,
    ) -> Vec<Option<DenseGradients>> {
        let output = &trace.activations[layers.len()];
        let batch = output.rows() as f64;

        let mut grad = output.clone();
        for (g, y) in grad.as_mut_slice().iter_mut().zip(targets.as_slice()) {
            *g = (*g - y) / batch;
        }

        let mut grads = vec![None; layers.len()];
        for (i, layer) in layers.iter().enumerate().rev() {
            match layer {
                Layer::Dense(dense) => {
                    let (g, grad_input) = dense.backward(
                        &trace.activations[i],
                        &trace.activations[i + 1],
                        grad,
                    );
                    grads[i] = Some(g);
                    grad = grad_input;
                }
                Layer::Dropout(_) => {
                    if let Some(mask) = &trace.masks[i] {
                        grad.hadamard_inplace(mask);
                    }
                }
            }
        }
        grads
    }

    fn apply_gradients(layers: &mut [Layer], grads: &[Option<DenseGradients>], adam: &mut Adam) {
        adam.next_step();
        for (i, (layer, grad)) in layers.iter_mut().zip(grads).enumerate() {
            if let (Layer::Dense(dense), Some(g)) = (layer, grad) {
                adam.update(2 * i, dense.weights.as_mut_slice(), g.weights.as_slice());
                adam.update(2 * i + 1, &mut dense.bias, &g.bias);
            }
        }
    }

    /// Fit `layers` in place and return the per-epoch history.
    fn fit(
        &mut self,
        layers: &mut [Layer],
        inputs: &Matrix,
        targets: &Matrix,
        train_len: usize,
    ) -> Result<Vec<EpochMetrics>, ModelError> {
        let total = inputs.rows();
        let batch_size = self.config.batch_size.max(1);
        let mut adam = Adam::new(self.config.learning_rate);
        let mut history = Vec::with_capacity(self.config.epochs);

        let val_inputs = inputs.slice_rows(train_len, total);
        let val_targets = targets.slice_rows(train_len, total);

        let mut order: Vec<usize> = (0..train_len).collect();
        for epoch in 1..=self.config.epochs {
            order.shuffle(&mut self.rng);

            let mut loss_sum = 0.0;
            let mut correct = 0;
            for batch in order.chunks(batch_size) {
                let x = inputs.select_rows(batch);
                let y = targets.select_rows(batch);

                let trace = Self::forward_train(layers, x, &mut self.rng);
                let output = &trace.activations[layers.len()];
                let (batch_loss, batch_correct) = score_batch(output, &y);
                loss_sum += batch_loss * batch.len() as f64;
                correct += batch_correct;

                let grads = Self::backward(layers, &trace, &y);
                Self::apply_gradients(layers, &grads, &mut adam);
            }

            let loss = loss_sum / train_len as f64;
            if !loss.is_finite() {
                return Err(ModelError::Diverged { epoch });
            }

            let (val_loss, val_accuracy) = if val_inputs.rows() > 0 {
                let output = Self::predict(layers, &val_inputs);
                let (l, c) = score_batch(&output, &val_targets);
                (Some(l), Some(c as f64 / val_inputs.rows() as f64))
            } else {
                (None, None)
            };

            let metrics = EpochMetrics {
                epoch,
                loss,
                accuracy: correct as f64 / train_len as f64,
                val_loss,
                val_accuracy,
            };
            tracing::debug!(
                "epoch {}/{}: loss={:.4} acc={:.3} val_loss={:?} val_acc={:?}",
                epoch,
                self.config.epochs,
                metrics.loss,
                metrics.accuracy,
                metrics.val_loss,
                metrics.val_accuracy
            );
            history.push(metrics);
        }

        Ok(history)
    }
}

impl RiskModel for MlpClassifier {
    fn train(&mut self, data: &TrainingSet) -> Result<TrainingReport, ModelError> {
        if let Some(report) = &self.report {
            tracing::debug!("Classifier already trained ({}), skipping", report.fingerprint);
            return Ok(report.clone());
        }
        if data.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if data.features.len() != data.labels.len() {
            return Err(ModelError::LabelCountMismatch {
                features: data.features.len(),
                labels: data.labels.len(),
            });
        }

        let total = data.len();
        let validation_len = data.validation_len(self.config.validation_split);
        let train_len = total - validation_len;

        // Tensors live only for the duration of this call.
        let inputs = build_matrix(total, FEATURE_COUNT, data.features.iter().map(|f| f.as_slice()))?;
        let targets = build_matrix(total, RISK_CLASSES, data.labels.iter().map(|l| l.as_slice()))?;

        tracing::info!(
            "Training classifier: {} params, {} train / {} validation rows, {} epochs, batch {}",
            self.parameter_count(),
            train_len,
            validation_len,
            self.config.epochs,
            self.config.batch_size
        );

        // Work on a copy so a failed run leaves the initial weights untouched.
        let mut layers = self.layers.clone();
        let history = self.fit(&mut layers, &inputs, &targets, train_len)?;
        self.layers = layers;

        let report = TrainingReport {
            train_samples: train_len,
            validation_samples: validation_len,
            history,
            fingerprint: self.fingerprint(),
            trained_at: chrono::Utc::now(),
        };

        if let Some(last) = report.final_metrics() {
            tracing::info!(
                "Training complete: loss={:.4}, accuracy={:.1}%, val_accuracy={}",
                last.loss,
                last.accuracy * 100.0,
                last.val_accuracy
                    .map(|a| format!("{:.1}%", a * 100.0))
                    .unwrap_or_else(|| "n/a".to_string())
            );
        }

        self.report = Some(report.clone());
        Ok(report)
    }

    fn infer(&self, features: &FeatureVector) -> Result<ClassProbabilities, ModelError> {
        if self.report.is_none() {
            return Err(ModelError::NotTrained);
        }

        let input = Matrix::from_vec(1, FEATURE_COUNT, features.as_slice().to_vec());
        let output = Self::predict(&self.layers, &input);

        let mut probabilities = [0.0; RISK_CLASSES];
        probabilities.copy_from_slice(output.row(0));
        ClassProbabilities::new(probabilities).map_err(ModelError::InvalidProbabilities)
    }

    fn is_trained(&self) -> bool {
        self.report.is_some()
    }
}

fn dense_layers(layers: &[Layer]) -> impl Iterator<Item = &Dense> {
    layers.iter().filter_map(|layer| match layer {
        Layer::Dense(dense) => Some(dense),
        Layer::Dropout(_) => None,
    })
}

fn fingerprint_layers(layers: &[Layer]) -> String {
    let mut hasher = Sha256::new();
    for dense in dense_layers(layers) {
        for v in dense.weights.as_slice().iter().chain(dense.bias.iter()) {
            hasher.update(v.to_le_bytes());
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn build_matrix<'a>(
    rows: usize,
    cols: usize,
    source: impl Iterator<Item = &'a [f64]>,
) -> Result<Matrix, ModelError> {
    let mut m = Matrix::try_zeros(rows, cols)
        .map_err(|e| ModelError::Allocation(format!("{rows}x{cols} matrix: {e}")))?;
    for (r, row) in source.enumerate() {
        m.row_mut(r).copy_from_slice(row);
    }
    Ok(m)
}

/// Mean clipped cross-entropy and number of argmax hits for a batch.
fn score_batch(output: &Matrix, targets: &Matrix) -> (f64, usize) {
    let mut loss = 0.0;
    let mut correct = 0;
    for r in 0..output.rows() {
        let p = output.row(r);
        let y = targets.row(r);
        loss -= p
            .iter()
            .zip(y)
            .map(|(p, y)| y * p.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON).ln())
            .sum::<f64>();
        if argmax(p) == argmax(y) {
            correct += 1;
        }
    }
    (loss / output.rows().max(1) as f64, correct)
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::synthetic::SyntheticDataGenerator;

    fn quick_config() -> TrainingConfig {
        TrainingConfig {
            samples: 300,
            epochs: 5,
            ..TrainingConfig::default()
        }
    }

    fn trained(seed: u64, config: TrainingConfig) -> MlpClassifier {
        let data = SyntheticDataGenerator::with_seed(seed)
            .generate(config.samples)
            .expect("Should generate");
        let mut model = MlpClassifier::with_seed(config, seed);
        model.train(&data).expect("Should train");
        model
    }

    #[test]
    fn test_default_config_matches_regimen() {
        let cfg = TrainingConfig::default();
        assert_eq!(cfg.samples, 1000);
        assert_eq!(cfg.epochs, 50);
        assert_eq!(cfg.batch_size, 32);
        assert!((cfg.validation_split - 0.2).abs() < f64::EPSILON);
        assert!((cfg.learning_rate - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_topology() {
        let model = MlpClassifier::with_seed(TrainingConfig::default(), 1);
        let units: Vec<usize> = dense_layers(&model.layers).map(Dense::units).collect();
        assert_eq!(units, vec![64, 32, 16, 3]);
        assert_eq!(model.layers.len(), 6);
        // 19*64+64 + 64*32+32 + 32*16+16 + 16*3+3
        assert_eq!(model.parameter_count(), 1280 + 2080 + 528 + 51);
    }

    #[test]
    fn test_infer_before_training_fails() {
        let model = MlpClassifier::with_seed(quick_config(), 2);
        assert!(!model.is_trained());
        assert_eq!(
            model.infer(&FeatureVector::zeros()),
            Err(ModelError::NotTrained)
        );
    }

    #[test]
    fn test_train_produces_report() {
        let model = trained(3, quick_config());
        assert!(model.is_trained());

        let report = model.training_report().expect("report");
        assert_eq!(report.history.len(), 5);
        assert_eq!(report.train_samples, 240);
        assert_eq!(report.validation_samples, 60);
        assert_eq!(report.fingerprint.len(), 64);
        assert!(report.history.iter().all(|m| m.loss.is_finite()));
        assert!(report.history.iter().all(|m| m.val_accuracy.is_some()));
    }

    #[test]
    fn test_train_is_idempotent() {
        let mut model = trained(4, quick_config());
        let before = model.fingerprint();

        let other = SyntheticDataGenerator::with_seed(99)
            .generate(50)
            .expect("Should generate");
        let report = model.train(&other).expect("Should be a no-op");

        assert_eq!(model.fingerprint(), before);
        assert_eq!(report.fingerprint, before);
    }

    #[test]
    fn test_training_changes_weights() {
        let config = quick_config();
        let untrained = MlpClassifier::with_seed(config.clone(), 5).fingerprint();
        let model = trained(5, config);
        assert_ne!(model.fingerprint(), untrained);
    }

    #[test]
    fn test_infer_returns_distribution() {
        let model = trained(6, quick_config());
        let inputs = [
            FeatureVector::zeros(),
            FeatureVector::new([1.0; FEATURE_COUNT]),
            FeatureVector::new([5.0; FEATURE_COUNT]),
            FeatureVector::new([-2.0; FEATURE_COUNT]),
        ];
        for features in inputs {
            let p = model.infer(&features).expect("Should infer").values();
            assert!(p.iter().all(|v| *v >= 0.0));
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_inference_is_deterministic() {
        let model = trained(7, quick_config());
        let features = FeatureVector::new([0.5; FEATURE_COUNT]);
        let a = model.infer(&features).expect("a");
        let b = model.infer(&features).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_malformed_training_sets() {
        let mut model = MlpClassifier::with_seed(quick_config(), 8);
        assert_eq!(
            model.train(&TrainingSet::default()),
            Err(ModelError::EmptyTrainingSet)
        );

        let mut data = SyntheticDataGenerator::with_seed(8)
            .generate(10)
            .expect("Should generate");
        data.labels.pop();
        assert_eq!(
            model.train(&data),
            Err(ModelError::LabelCountMismatch {
                features: 10,
                labels: 9
            })
        );
        assert!(!model.is_trained());
    }

    #[test]
    fn test_full_regimen_reduces_loss() {
        let model = trained(10, TrainingConfig::default());
        let report = model.training_report().expect("report");
        assert_eq!(report.history.len(), 50);
        assert_eq!(report.train_samples, 800);
        assert_eq!(report.validation_samples, 200);

        let last = report.final_metrics().expect("metrics");
        assert!(last.loss < report.history[0].loss);

        let holdout = SyntheticDataGenerator::with_seed(1234)
            .generate(500)
            .expect("Should generate");
        let correct = holdout
            .features
            .iter()
            .zip(&holdout.labels)
            .filter(|(f, y)| {
                let (level, _) = model.infer(f).expect("infer").argmax();
                y[level.index()] == 1.0
            })
            .count();
        assert!(correct > 250);
    }
}
