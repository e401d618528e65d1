// src/cost/mod.rs

//! Purity-based cost on the reduced operator of the trainable mode.
//!
//! ```text
//! cost = [ Tr(ρρ) − λ·Tr(ρx)² − λ·Tr(ρp)² ] / Tr(ρ)²
//! ```
//!
//! The first term rewards a pure reduced state, i.e. no entanglement with the traced-out
//! mode. The penalty terms keep the trainable state centred in phase space. Dividing by
//! `Tr(ρ)²` makes the value independent of the scale of the trainable amplitudes.

use crate::core::{DisentangleError, MIN_TRACE, defaults};
use crate::fock::FockOperators;
use crate::linalg::{self, CMatrix};
use num_complex::Complex64;
use std::fmt;

/// The cost functional and its single tunable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostFunctional {
    /// Weight `λ` of the first-moment penalty.
    pub penalty: f64,
}

impl Default for CostFunctional {
    fn default() -> Self {
        Self { penalty: defaults::PENALTY }
    }
}

/// The cost together with the trace quantities it was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEvaluation {
    pub value: f64,
    /// `Tr(ρρ)`, unnormalized.
    pub raw_purity: f64,
    /// `Tr(ρ)`.
    pub trace: f64,
    /// `Tr(ρρ)/Tr(ρ)²`, in `[1/cutoff, 1]`.
    pub normalized_purity: f64,
    /// `Tr(ρx)/Tr(ρ)`.
    pub mean_x: f64,
    /// `Tr(ρp)/Tr(ρ)`.
    pub mean_p: f64,
}

impl CostEvaluation {
    fn numerator(&self, penalty: f64) -> f64 {
        let tx = self.mean_x * self.trace;
        let tp = self.mean_p * self.trace;
        self.raw_purity - penalty * tx * tx - penalty * tp * tp
    }
}

impl fmt::Display for CostEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cost {:.10} (purity {:.6}, trace {:.6}, <x> {:+.3e}, <p> {:+.3e})",
            self.value, self.normalized_purity, self.trace, self.mean_x, self.mean_p
        )
    }
}

impl CostFunctional {
    pub fn new(penalty: f64) -> Self {
        Self { penalty }
    }

    /// Evaluates the cost on a reduced operator.
    ///
    /// # Errors
    /// * `DimensionMismatch` if `reduced` is not `cutoff × cutoff`.
    /// * `NumericalInstability` if `Tr(ρ)` is below [`MIN_TRACE`] or any term is not finite.
    pub fn evaluate(&self, reduced: &CMatrix, ops: &FockOperators) -> Result<CostEvaluation, DisentangleError> {
        check_shape(reduced, ops)?;

        let trace = linalg::trace(reduced).re;
        if !trace.is_finite() || trace < MIN_TRACE {
            return Err(DisentangleError::NumericalInstability {
                message: format!("Reduced trace {:e} is below the minimum {:e}", trace, MIN_TRACE),
            });
        }

        let raw_purity = linalg::trace_product(reduced, reduced).re;
        let tx = linalg::trace_product(reduced, ops.position()).re;
        let tp = linalg::trace_product(reduced, ops.momentum()).re;
        let value = (raw_purity - self.penalty * tx * tx - self.penalty * tp * tp) / (trace * trace);

        if ![value, raw_purity, tx, tp].iter().all(|v| v.is_finite()) {
            return Err(DisentangleError::NumericalInstability {
                message: format!("Non-finite cost terms: Tr(ρρ) = {}, Tr(ρx) = {}, Tr(ρp) = {}", raw_purity, tx, tp),
            });
        }

        Ok(CostEvaluation {
            value,
            raw_purity,
            trace,
            normalized_purity: raw_purity / (trace * trace),
            mean_x: tx / trace,
            mean_p: tp / trace,
        })
    }

    /// Derivative of the cost with respect to the reduced operator.
    ///
    /// Returns `W` such that a perturbation `dρ` changes the cost by `Re Tr(W·dρ)`:
    ///
    /// ```text
    /// W = (2ρ − 2λ·Tr(ρx)·x − 2λ·Tr(ρp)·p) / T² − 2·num / T³ · I
    /// ```
    ///
    /// `eval` must come from [`CostFunctional::evaluate`] on the same `reduced`.
    pub fn sensitivity(
        &self,
        reduced: &CMatrix,
        ops: &FockOperators,
        eval: &CostEvaluation,
    ) -> Result<CMatrix, DisentangleError> {
        check_shape(reduced, ops)?;

        let t = eval.trace;
        let t2 = t * t;
        let tx = eval.mean_x * t;
        let tp = eval.mean_p * t;
        let diagonal = 2.0 * eval.numerator(self.penalty) / (t2 * t);

        let mut w = (reduced.mapv(|z| z * 2.0)
            - ops.position().mapv(|z| z * (2.0 * self.penalty * tx))
            - ops.momentum().mapv(|z| z * (2.0 * self.penalty * tp)))
            .mapv(|z| z / t2);
        for d in w.diag_mut() {
            *d -= Complex64::new(diagonal, 0.0);
        }
        Ok(w)
    }
}

fn check_shape(reduced: &CMatrix, ops: &FockOperators) -> Result<(), DisentangleError> {
    let cutoff = ops.cutoff();
    let (rows, cols) = reduced.dim();
    if rows != cutoff || cols != cutoff {
        return Err(DisentangleError::DimensionMismatch {
            expected: cutoff,
            found: if rows != cutoff { rows } else { cols },
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TruncatedState;
    use crate::preparation;
    use approx::assert_abs_diff_eq;
    use num_traits::Zero;

    const TEST_TOLERANCE: f64 = 1e-10;

    fn pure(state: &TruncatedState) -> CMatrix {
        linalg::density(state.vector())
    }

    #[test]
    fn test_centered_pure_state_scores_one() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(12)?;
        let cost = CostFunctional::default();
        for state in [preparation::fock_state(0, 12)?, preparation::fock_state(3, 12)?, preparation::squeezed_vacuum(0.4, 0.0, 12)?] {
            let eval = cost.evaluate(&pure(&state), &ops)?;
            assert_abs_diff_eq!(eval.value, 1.0, epsilon = TEST_TOLERANCE);
            assert_abs_diff_eq!(eval.normalized_purity, 1.0, epsilon = TEST_TOLERANCE);
            assert_abs_diff_eq!(eval.mean_x, 0.0, epsilon = TEST_TOLERANCE);
        }
        Ok(())
    }

    #[test]
    fn test_penalty_lowers_cost_of_displaced_state() -> Result<(), DisentangleError> {
        let cutoff = 20;
        let ops = FockOperators::new(cutoff)?;
        let state = preparation::coherent_state(Complex64::new(0.5, -0.25), cutoff)?;
        let rho = pure(&state);

        let unpenalized = CostFunctional::new(0.0).evaluate(&rho, &ops)?;
        let penalized = CostFunctional::new(10.0).evaluate(&rho, &ops)?;
        assert_abs_diff_eq!(unpenalized.value, 1.0, epsilon = 1e-9);
        // <x> = 2 Re(alpha), <p> = 2 Im(alpha)
        assert_abs_diff_eq!(penalized.mean_x, 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(penalized.mean_p, -0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(penalized.value, 1.0 - 10.0 * (1.0 + 0.25), epsilon = 1e-7);
        Ok(())
    }

    #[test]
    fn test_cost_is_scale_invariant() -> Result<(), DisentangleError> {
        let cutoff = 8;
        let ops = FockOperators::new(cutoff)?;
        let mut rho = CMatrix::zeros((cutoff, cutoff));
        rho[[0, 0]] = Complex64::new(0.6, 0.0);
        rho[[1, 1]] = Complex64::new(0.3, 0.0);
        rho[[0, 1]] = Complex64::new(0.1, 0.2);
        rho[[1, 0]] = Complex64::new(0.1, -0.2);
        let cost = CostFunctional::default();
        let base = cost.evaluate(&rho, &ops)?;
        let scaled = cost.evaluate(&rho.mapv(|z| z * 7.5), &ops)?;
        assert_abs_diff_eq!(base.value, scaled.value, epsilon = TEST_TOLERANCE);
        Ok(())
    }

    #[test]
    fn test_purity_bounds() -> Result<(), DisentangleError> {
        let cutoff = 6;
        let ops = FockOperators::new(cutoff)?;
        let maximally_mixed = linalg::identity(cutoff).mapv(|z| z / cutoff as f64);
        let eval = CostFunctional::default().evaluate(&maximally_mixed, &ops)?;
        assert_abs_diff_eq!(eval.normalized_purity, 1.0 / cutoff as f64, epsilon = TEST_TOLERANCE);
        assert!(eval.normalized_purity <= 1.0);
        Ok(())
    }

    #[test]
    fn test_vanishing_trace_is_rejected() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(4)?;
        let rho = CMatrix::from_elem((4, 4), Complex64::zero());
        assert!(matches!(
            CostFunctional::default().evaluate(&rho, &ops),
            Err(DisentangleError::NumericalInstability { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_shape_mismatch_is_rejected() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(4)?;
        let rho = linalg::identity(5);
        assert!(matches!(
            CostFunctional::default().evaluate(&rho, &ops),
            Err(DisentangleError::DimensionMismatch { expected: 4, found: 5 })
        ));
        Ok(())
    }

    #[test]
    fn test_sensitivity_matches_directional_derivative() -> Result<(), DisentangleError> {
        let cutoff = 6;
        let ops = FockOperators::new(cutoff)?;
        let cost = CostFunctional::new(3.0);
        let state = preparation::coherent_state(Complex64::new(0.3, 0.1), cutoff)?;
        let mut rho = pure(&state).mapv(|z| z * 0.8);
        rho[[2, 2]] += Complex64::new(0.15, 0.0);

        let mut direction = CMatrix::zeros((cutoff, cutoff));
        direction[[0, 1]] = Complex64::new(0.2, 0.1);
        direction[[1, 0]] = Complex64::new(0.2, -0.1);
        direction[[3, 3]] = Complex64::new(0.05, 0.0);

        let eval = cost.evaluate(&rho, &ops)?;
        let w = cost.sensitivity(&rho, &ops, &eval)?;
        let analytic = linalg::trace_product(&w, &direction).re;

        let h = 1e-6;
        let plus = cost.evaluate(&(&rho + &direction.mapv(|z| z * h)), &ops)?.value;
        let minus = cost.evaluate(&(&rho - &direction.mapv(|z| z * h)), &ops)?.value;
        let numeric = (plus - minus) / (2.0 * h);
        assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-6);
        Ok(())
    }
}
