// src/optimizer/adam.rs

use crate::core::DisentangleError;

/// Adam with bias-corrected first and second moment estimates.
///
/// [`Adam::step`] moves the parameters against the gradient it is handed, so it
/// minimizes. Callers maximizing a quantity pass the negated gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    step_size: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    first_moment: Vec<f64>,
    second_moment: Vec<f64>,
    updates: i32,
}

impl Adam {
    pub fn new(dim: usize, step_size: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self {
            step_size,
            beta1,
            beta2,
            epsilon,
            first_moment: vec![0.0; dim],
            second_moment: vec![0.0; dim],
            updates: 0,
        }
    }

    /// Number of parameters tracked.
    pub fn dim(&self) -> usize {
        self.first_moment.len()
    }

    /// Number of updates applied so far.
    pub fn updates(&self) -> usize {
        self.updates as usize
    }

    /// Applies one update in place.
    ///
    /// # Errors
    /// * `DimensionMismatch` if `params` or `grad` do not have `dim()` entries.
    pub fn step(&mut self, params: &mut [f64], grad: &[f64]) -> Result<(), DisentangleError> {
        for len in [params.len(), grad.len()] {
            if len != self.dim() {
                return Err(DisentangleError::DimensionMismatch { expected: self.dim(), found: len });
            }
        }

        self.updates = self.updates.saturating_add(1);
        let bias1 = 1.0 - self.beta1.powi(self.updates);
        let bias2 = 1.0 - self.beta2.powi(self.updates);

        for (((p, &g), m), v) in params
            .iter_mut()
            .zip(grad)
            .zip(self.first_moment.iter_mut())
            .zip(self.second_moment.iter_mut())
        {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *p -= self.step_size * m_hat / (v_hat.sqrt() + self.epsilon);
        }
        Ok(())
    }
}
