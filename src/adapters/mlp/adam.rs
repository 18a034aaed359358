//! Adam optimizer.

#[derive(Debug, Clone)]
struct Moments {
    first: Vec<f64>,
    second: Vec<f64>,
}

/// Adaptive-moment gradient descent with bias correction.
///
/// Parameter tensors are addressed by slot index; state for a slot is
/// created on its first update.
#[derive(Debug, Clone)]
pub(crate) struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    slots: Vec<Option<Moments>>,
}

impl Adam {
    pub(crate) fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            slots: Vec::new(),
        }
    }

    /// Advance the timestep. Call once per batch, before the updates.
    pub(crate) fn next_step(&mut self) {
        self.step += 1;
    }

    pub(crate) fn update(&mut self, slot: usize, params: &mut [f64], grads: &[f64]) {
        debug_assert_eq!(params.len(), grads.len());
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        let moments = self.slots[slot].get_or_insert_with(|| Moments {
            first: vec![0.0; params.len()],
            second: vec![0.0; params.len()],
        });

        let t = self.step.max(1);
        let first_correction = 1.0 - self.beta1.powi(t);
        let second_correction = 1.0 - self.beta2.powi(t);

        for i in 0..params.len() {
            let g = grads[i];
            moments.first[i] = self.beta1 * moments.first[i] + (1.0 - self.beta1) * g;
            moments.second[i] = self.beta2 * moments.second[i] + (1.0 - self.beta2) * g * g;

            let m_hat = moments.first[i] / first_correction;
            let v_hat = moments.second[i] / second_correction;
            params[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}
