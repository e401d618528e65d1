// src/analysis/mod.rs

//! Post-hoc characterization of an optimized state.
//!
//! Everything here is computed on the normalized state, so the result does not depend on
//! how far the optimizer let the parameter norm drift. Plotting is left to the caller.

use crate::core::{DisentangleError, TruncatedState};
use crate::fock::FockOperators;
use crate::linalg::{self, CMatrix, CVector};
use crate::preparation;
use std::fmt;

/// Summary statistics of a single-mode state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateAnalysis {
    /// The normalized state.
    pub state: TruncatedState,
    /// `|φ⟩⟨φ|`.
    pub density: CMatrix,
    pub fock_probabilities: Vec<f64>,
    /// `⟨φ|n|φ⟩`.
    pub mean_photon_number: f64,
    /// `asinh(sqrt(n̄))`, the squeezing of a squeezed vacuum with the same photon number.
    pub squeezing_parameter: f64,
    pub mean_x: f64,
    pub mean_p: f64,
    pub var_x: f64,
    pub var_p: f64,
    /// Probability in the last Fock level; large values mean the cutoff is too small.
    pub boundary_population: f64,
}

/// Normalizes `state` and computes its [`StateAnalysis`].
///
/// # Errors
/// * `DimensionMismatch` if the state and operators disagree on the cutoff.
/// * `InvalidState` if the state has zero norm or non-finite amplitudes.
pub fn analyze(state: &TruncatedState, ops: &FockOperators) -> Result<StateAnalysis, DisentangleError> {
    state.ensure_dim(ops.cutoff())?;
    let state = preparation::normalize(state)?;
    let v = state.vector();

    let mean_photon_number = linalg::expectation(ops.number(), v).re.max(0.0);
    let (mean_x, var_x) = moments(ops.position(), v);
    let (mean_p, var_p) = moments(ops.momentum(), v);
    let fock_probabilities = state.populations();
    let boundary_population = fock_probabilities.last().copied().unwrap_or(0.0);

    Ok(StateAnalysis {
        density: linalg::density(v),
        squeezing_parameter: mean_photon_number.sqrt().asinh(),
        mean_photon_number,
        mean_x,
        mean_p,
        var_x,
        var_p,
        fock_probabilities,
        boundary_population,
        state,
    })
}

/// Mean and variance of a Hermitian operator on a normalized vector.
fn moments(op: &CMatrix, v: &CVector) -> (f64, f64) {
    let applied = op.dot(v);
    let mean = v.iter().zip(applied.iter()).map(|(a, b)| a.conj() * b).sum::<num_complex::Complex64>().re;
    // ⟨op²⟩ = ‖op·v‖² for Hermitian op
    let second: f64 = applied.iter().map(|z| z.norm_sqr()).sum();
    (mean, (second - mean * mean).max(0.0))
}

impl fmt::Display for StateAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "State Analysis (cutoff {}):", self.state.dim())?;
        writeln!(f, "  Mean photon number: {:.6}", self.mean_photon_number)?;
        writeln!(f, "  Squeezing parameter: {:.6}", self.squeezing_parameter)?;
        writeln!(f, "  <x> = {:+.3e}, Var(x) = {:.6}", self.mean_x, self.var_x)?;
        writeln!(f, "  <p> = {:+.3e}, Var(p) = {:.6}", self.mean_p, self.var_p)?;
        writeln!(f, "  Boundary population: {:.3e}", self.boundary_population)?;
        write!(f, "  Fock probabilities:")?;
        for (n, prob) in self.fock_probabilities.iter().enumerate().filter(|(_, p)| **p > 1e-4) {
            write!(f, " |{}>:{:.4}", n, prob)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use num_complex::Complex64;

    const CUTOFF: usize = 30;

    #[test]
    fn test_squeezed_vacuum_statistics() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(CUTOFF)?;
        let r = 0.5;
        let analysis = analyze(&preparation::squeezed_vacuum(r, 0.0, CUTOFF)?, &ops)?;
        assert_abs_diff_eq!(analysis.mean_photon_number, r.sinh().powi(2), epsilon = 1e-7);
        assert_abs_diff_eq!(analysis.squeezing_parameter, r, epsilon = 1e-7);
        assert_abs_diff_eq!(analysis.var_x, (-2.0 * r).exp(), epsilon = 1e-7);
        assert_abs_diff_eq!(analysis.var_p, (2.0 * r).exp(), epsilon = 1e-7);
        assert_abs_diff_eq!(analysis.mean_x, 0.0, epsilon = 1e-12);
        assert!(analysis.boundary_population < 1e-8);
        Ok(())
    }

    #[test]
    fn test_fock_state_statistics() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(8)?;
        let analysis = analyze(&preparation::fock_state(3, 8)?, &ops)?;
        assert_abs_diff_eq!(analysis.mean_photon_number, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(analysis.var_x, 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(analysis.var_p, 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(analysis.fock_probabilities[3], 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_analysis_ignores_scale_and_flags_boundary() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(4)?;
        let scaled = TruncatedState::new(vec![
            Complex64::new(3.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, 4.0),
        ])?;
        let analysis = analyze(&scaled, &ops)?;
        assert_abs_diff_eq!(analysis.state.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(analysis.boundary_population, 0.64, epsilon = 1e-12);
        assert_abs_diff_eq!(analysis.mean_photon_number, 0.64 * 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(linalg::trace(&analysis.density).re, 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_zero_state_is_rejected() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(3)?;
        let zero = TruncatedState::new(vec![Complex64::new(0.0, 0.0); 3])?;
        assert!(matches!(analyze(&zero, &ops), Err(DisentangleError::InvalidState { .. })));
        Ok(())
    }
}
