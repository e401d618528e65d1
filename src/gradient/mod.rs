// src/gradient/mod.rs

//! Gradient capabilities for the trainable state.
//!
//! The optimizer works on two real parameter vectors, the real and imaginary parts of
//! the trainable amplitudes. Anything that can report the cost and its partial
//! derivatives with respect to those vectors can drive it.

use crate::core::{DisentangleError, TruncatedState};
use crate::cost::{CostEvaluation, CostFunctional};
use crate::fock::FockOperators;
use crate::linalg;
use crate::mixing::{MixedOutput, TwoModeMixer};
use std::fmt;

/// Default central-difference step for [`FiniteDifference`].
pub const DEFAULT_FD_STEP: f64 = 1e-6;

/// A scalar function of the trainable parameters.
pub trait Objective {
    /// Number of complex amplitudes (the cutoff).
    fn dim(&self) -> usize;

    /// Cost at `(re, im)`.
    fn value(&self, re: &[f64], im: &[f64]) -> Result<f64, DisentangleError>;
}

/// Cost and gradient at one parameter point.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// `∂cost/∂re_k`.
    pub grad_re: Vec<f64>,
    /// `∂cost/∂im_k`.
    pub grad_im: Vec<f64>,
    /// Fraction of the joint probability lost to truncation, when the source knows it.
    pub leakage: Option<f64>,
}

impl Evaluation {
    /// Euclidean norm of the full gradient.
    pub fn gradient_norm(&self) -> f64 {
        self.grad_re.iter().chain(&self.grad_im).map(|g| g * g).sum::<f64>().sqrt()
    }
}

/// The capability the optimizer is generic over.
pub trait GradientSource: Objective {
    fn value_and_gradient(&self, re: &[f64], im: &[f64]) -> Result<Evaluation, DisentangleError>;
}

// --- Closed-form adjoint ---

/// The mixing pipeline and cost with a hand-derived reverse pass.
///
/// Forward: `φ → J = ψ⊗φ → M = U·J → ρ = Mᵀ·conj(M) → cost`.
/// Reverse: with `W = ∂cost/∂ρ`, the sensitivity on the joint input is
/// `R = Uᵀ·(conj(M)·W)` and `g_l = Σ_k ψ_k R[k, l]`. Then `∂cost/∂re = 2·Re g` and
/// `∂cost/∂im = −2·Im g`.
#[derive(Debug, Clone)]
pub struct EntanglementObjective {
    mixer: TwoModeMixer,
    ops: FockOperators,
    cost: CostFunctional,
}

impl EntanglementObjective {
    /// Builds operators, beamsplitter and cost for a fixed input state.
    pub fn new(fixed: TruncatedState, theta: f64, penalty: f64) -> Result<Self, DisentangleError> {
        let ops = FockOperators::new(fixed.dim())?;
        let mixer = TwoModeMixer::new(fixed, theta)?;
        Ok(Self { mixer, ops, cost: CostFunctional::new(penalty) })
    }

    /// Assembles an objective from prebuilt parts sharing one cutoff.
    pub fn from_parts(mixer: TwoModeMixer, ops: FockOperators, cost: CostFunctional) -> Result<Self, DisentangleError> {
        if mixer.cutoff() != ops.cutoff() {
            return Err(DisentangleError::DimensionMismatch { expected: ops.cutoff(), found: mixer.cutoff() });
        }
        Ok(Self { mixer, ops, cost })
    }

    pub fn mixer(&self) -> &TwoModeMixer {
        &self.mixer
    }

    pub fn operators(&self) -> &FockOperators {
        &self.ops
    }

    pub fn cost(&self) -> &CostFunctional {
        &self.cost
    }

    /// Forward pass for an explicit trainable state.
    pub fn forward(&self, trainable: &TruncatedState) -> Result<(MixedOutput, CostEvaluation), DisentangleError> {
        let output = self.mixer.forward(trainable)?;
        let eval = self.cost.evaluate(&output.reduced, &self.ops)?;
        Ok((output, eval))
    }

    fn state(&self, re: &[f64], im: &[f64]) -> Result<TruncatedState, DisentangleError> {
        let state = TruncatedState::from_parts(re, im)?;
        state.ensure_dim(self.dim())?;
        Ok(state)
    }
}

impl Objective for EntanglementObjective {
    fn dim(&self) -> usize {
        self.mixer.cutoff()
    }

    fn value(&self, re: &[f64], im: &[f64]) -> Result<f64, DisentangleError> {
        let (_, eval) = self.forward(&self.state(re, im)?)?;
        Ok(eval.value)
    }
}

impl GradientSource for EntanglementObjective {
    fn value_and_gradient(&self, re: &[f64], im: &[f64]) -> Result<Evaluation, DisentangleError> {
        let (output, eval) = self.forward(&self.state(re, im)?)?;
        let w = self.cost.sensitivity(&output.reduced, &self.ops, &eval)?;

        let h = linalg::conj(&output.mixed).dot(&w);
        let pulled = self.mixer.beamsplitter().apply_transpose(&h)?;
        let g = self.mixer.fixed().vector().dot(&pulled);

        Ok(Evaluation {
            value: eval.value,
            grad_re: g.iter().map(|z| 2.0 * z.re).collect(),
            grad_im: g.iter().map(|z| -2.0 * z.im).collect(),
            leakage: Some(output.diagnostics.leaked_fraction()),
        })
    }
}

// --- Numerical fallback ---

/// Central finite differences over any [`Objective`].
///
/// Costs `4·dim + 1` objective evaluations per gradient.
#[derive(Debug, Clone)]
pub struct FiniteDifference<O: Objective> {
    objective: O,
    step: f64,
}

impl<O: Objective> FiniteDifference<O> {
    pub fn new(objective: O) -> Self {
        Self { objective, step: DEFAULT_FD_STEP }
    }

    /// Overrides the difference step.
    ///
    /// # Errors
    /// * `InvalidConfiguration` unless `step` is finite and positive.
    pub fn with_step(objective: O, step: f64) -> Result<Self, DisentangleError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(DisentangleError::InvalidConfiguration {
                message: format!("Finite-difference step must be positive and finite, got {}", step),
            });
        }
        Ok(Self { objective, step })
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    fn shifted_value(&self, re: &[f64], im: &[f64], k: usize, delta: f64, imaginary: bool) -> Result<f64, DisentangleError> {
        let mut re = re.to_vec();
        let mut im = im.to_vec();
        if imaginary {
            im[k] += delta;
        } else {
            re[k] += delta;
        }
        self.objective.value(&re, &im)
    }

    fn partials(&self, re: &[f64], im: &[f64], imaginary: bool) -> Result<Vec<f64>, DisentangleError> {
        (0..re.len())
            .map(|k| {
                let plus = self.shifted_value(re, im, k, self.step, imaginary)?;
                let minus = self.shifted_value(re, im, k, -self.step, imaginary)?;
                Ok((plus - minus) / (2.0 * self.step))
            })
            .collect()
    }
}

impl<O: Objective> Objective for FiniteDifference<O> {
    fn dim(&self) -> usize {
        self.objective.dim()
    }

    fn value(&self, re: &[f64], im: &[f64]) -> Result<f64, DisentangleError> {
        self.objective.value(re, im)
    }
}

impl<O: Objective> GradientSource for FiniteDifference<O> {
    fn value_and_gradient(&self, re: &[f64], im: &[f64]) -> Result<Evaluation, DisentangleError> {
        if re.len() != im.len() {
            return Err(DisentangleError::DimensionMismatch { expected: re.len(), found: im.len() });
        }
        Ok(Evaluation {
            value: self.objective.value(re, im)?,
            grad_re: self.partials(re, im, false)?,
            grad_im: self.partials(re, im, true)?,
            leakage: None,
        })
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cost {:.10}, |grad| {:.3e}", self.value, self.gradient_norm())?;
        if let Some(leakage) = self.leakage {
            write!(f, ", leakage {:.3e}", leakage)?;
        }
        Ok(())
    }
}
