//! Dense and dropout layers with manual backpropagation.

use rand::Rng;
use rand_distr::StandardNormal;

use super::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Activation {
    Relu,
    /// Row-wise softmax. Only valid on the output layer, where the gradient
    /// arriving from categorical cross-entropy is already `p - y`.
    Softmax,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Initializer {
    RandomNormal { stddev: f64 },
    GlorotUniform,
}

impl Initializer {
    fn sample(self, fan_in: usize, fan_out: usize, rng: &mut impl Rng) -> f64 {
        match self {
            Self::RandomNormal { stddev } => {
                let z: f64 = rng.sample(StandardNormal);
                z * stddev
            }
            Self::GlorotUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
                rng.gen_range(-limit..limit)
            }
        }
    }
}

/// Gradients of one dense layer's parameters.
#[derive(Debug, Clone)]
pub(crate) struct DenseGradients {
    pub(crate) weights: Matrix,
    pub(crate) bias: Vec<f64>,
}

/// Fully connected layer: `activation(x · W + b)`.
#[derive(Debug, Clone)]
pub(crate) struct Dense {
    /// inputs × units
    pub(crate) weights: Matrix,
    pub(crate) bias: Vec<f64>,
    activation: Activation,
}

impl Dense {
    pub(crate) fn new(
        inputs: usize,
        units: usize,
        activation: Activation,
        init: Initializer,
        rng: &mut impl Rng,
    ) -> Self {
        let data = (0..inputs * units)
            .map(|_| init.sample(inputs, units, &mut *rng))
            .collect();
        Self {
            weights: Matrix::from_vec(inputs, units, data),
            bias: vec![0.0; units],
            activation,
        }
    }

    pub(crate) fn units(&self) -> usize {
        self.weights.cols()
    }

    pub(crate) fn forward(&self, input: &Matrix) -> Matrix {
        let mut z = input.matmul(&self.weights);
        z.add_row_vector(&self.bias);
        match self.activation {
            Activation::Relu => z.map_inplace(|v| v.max(0.0)),
            Activation::Softmax => softmax_rows(&mut z),
        }
        z
    }

    /// Backpropagate through the layer.
    ///
    /// `input` and `output` are the values seen by the matching forward pass.
    /// Returns the parameter gradients and the gradient w.r.t. `input`.
    pub(crate) fn backward(
        &self,
        input: &Matrix,
        output: &Matrix,
        mut grad_output: Matrix,
    ) -> (DenseGradients, Matrix) {
        if self.activation == Activation::Relu {
            for (g, y) in grad_output.as_mut_slice().iter_mut().zip(output.as_slice()) {
                if *y <= 0.0 {
                    *g = 0.0;
                }
            }
        }

        let grads = DenseGradients {
            weights: input.transpose_matmul(&grad_output),
            bias: grad_output.column_sums(),
        };
        let grad_input = grad_output.matmul_transpose(&self.weights);
        (grads, grad_input)
    }
}

/// Inverted dropout: kept units are scaled by `1 / (1 - rate)` so inference
/// can skip the layer entirely.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Dropout {
    rate: f64,
}

impl Dropout {
    pub(crate) fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 0.99),
        }
    }

    pub(crate) fn mask(&self, rows: usize, cols: usize, rng: &mut impl Rng) -> Matrix {
        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        let data = (0..rows * cols)
            .map(|_| if rng.gen::<f64>() < keep { scale } else { 0.0 })
            .collect();
        Matrix::from_vec(rows, cols, data)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}

fn softmax_rows(z: &mut Matrix) {
    for r in 0..z.rows() {
        let row = z.row_mut(r);
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in row.iter_mut() {
            *v /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let mut z = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 1000.0, 1000.0, -1000.0]);
        softmax_rows(&mut z);
        for r in 0..2 {
            let sum: f64 = z.row(r).iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert!((z.row(1)[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_relu_forward_and_backward() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut dense = Dense::new(2, 2, Activation::Relu, Initializer::GlorotUniform, &mut rng);
        dense.weights = Matrix::from_vec(2, 2, vec![1.0, -1.0, 1.0, -1.0]);

        let input = Matrix::from_vec(1, 2, vec![1.0, 2.0]);
        let output = dense.forward(&input);
        assert_eq!(output.as_slice(), &[3.0, 0.0]);

        let grad = Matrix::from_vec(1, 2, vec![1.0, 1.0]);
        let (grads, grad_input) = dense.backward(&input, &output, grad);
        // The negative unit is dead, so only the first column receives gradient.
        assert_eq!(grads.weights.as_slice(), &[1.0, 0.0, 2.0, 0.0]);
        assert_eq!(grads.bias, vec![1.0, 0.0]);
        assert_eq!(grad_input.as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn test_random_normal_init_is_small() {
        let mut rng = ChaCha20Rng::seed_from_u64(9);
        let dense = Dense::new(
            19,
            64,
            Activation::Relu,
            Initializer::RandomNormal { stddev: 0.05 },
            &mut rng,
        );
        let w = dense.weights.as_slice();
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / w.len() as f64;
        assert!(mean.abs() < 0.01);
        assert!((var.sqrt() - 0.05).abs() < 0.01);
        assert!(dense.bias.iter().all(|b| *b == 0.0));
    }

    #[test]
    fn test_dropout_mask_scaling() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mask = Dropout::new(0.3).mask(100, 50, &mut rng);
        let kept = mask.as_slice().iter().filter(|v| **v > 0.0).count();
        let ratio = kept as f64 / 5000.0;
        assert!((ratio - 0.7).abs() < 0.05);
        assert!(mask
            .as_slice()
            .iter()
            .all(|v| *v == 0.0 || (*v - 1.0 / 0.7).abs() < 1e-12));
    }
}
