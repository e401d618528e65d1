// src/validation/mod.rs

//! Provides functions to validate states and reduced operators.

use crate::core::{DisentangleError, TruncatedState};
use crate::linalg::{self, CMatrix};

// Default tolerance values (can be overridden by caller)
const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;
const DEFAULT_HERMITIAN_TOLERANCE: f64 = 1e-10;

// --- Public Validation Functions ---

/// Checks that every amplitude of the state is finite.
///
/// # Returns
/// * `Ok(())` if no amplitude is NaN or infinite.
/// * `Err(DisentangleError::InvalidState)` naming the first offending Fock level otherwise.
pub fn check_finite(state: &TruncatedState) -> Result<(), DisentangleError> {
    match state.vector().iter().position(|c| !c.re.is_finite() || !c.im.is_finite()) {
        Some(level) => Err(DisentangleError::InvalidState {
            message: format!("Amplitude of Fock level {} is not finite: {}", level, state.vector()[level]),
        }),
        None => Ok(()),
    }
}

/// Checks that a slice of real parameters or gradient entries is finite.
///
/// # Returns
/// * `Some(index)` of the first non-finite entry, `None` if all are finite.
pub fn first_non_finite(values: &[f64]) -> Option<usize> {
    values.iter().position(|v| !v.is_finite())
}

/// Checks if the state vector is normalized (sum of squared amplitudes ≈ 1.0).
///
/// # Arguments
/// * `state` - The `TruncatedState` to check.
/// * `tolerance` - Allowed deviation from 1.0 (e.g., 1e-9). Defaults are available.
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(DisentangleError::InvalidState)` if normalization fails.
pub fn check_normalization(state: &TruncatedState, tolerance: Option<f64>) -> Result<(), DisentangleError> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let norm_sq = state.norm_sqr();
    if (norm_sq - 1.0).abs() > effective_tolerance {
        Err(DisentangleError::InvalidState {
            message: format!("State vector normalization failed. Sum(|c_i|^2) = {} (Deviation > {})", norm_sq, effective_tolerance)
        })
    } else {
        Ok(())
    }
}

/// Checks `M ≈ M†` element-wise.
pub fn check_hermitian(matrix: &CMatrix, tolerance: Option<f64>) -> Result<(), DisentangleError> {
    let effective_tolerance = tolerance.unwrap_or(DEFAULT_HERMITIAN_TOLERANCE);
    let deviation = linalg::max_abs_diff(matrix, &linalg::dagger(matrix));
    if deviation > effective_tolerance {
        Err(DisentangleError::NumericalInstability {
            message: format!("Operator is not Hermitian: max |M - M†| = {:.3e} (> {:.1e})", deviation, effective_tolerance)
        })
    } else {
        Ok(())
    }
}

/// Performs the sanity checks a reduced operator must pass under truncation.
///
/// A reduced operator has a real, non-negative diagonal and a trace no larger than the
/// probability that entered the mixing step (`max_trace`); truncation may only lower it.
///
/// # Returns
/// * `Ok(())` if all checks pass.
/// * `Err(DisentangleError::NumericalInstability)` describing the first failed check.
pub fn check_reduced_operator(reduced: &CMatrix, max_trace: f64, tolerance: Option<f64>) -> Result<(), DisentangleError> {
    let eff_tol = tolerance.unwrap_or(DEFAULT_HERMITIAN_TOLERANCE);
    check_hermitian(reduced, Some(eff_tol))?;

    if let Some((level, value)) = reduced.diag().iter().enumerate().find(|(_, d)| d.re < -eff_tol) {
        return Err(DisentangleError::NumericalInstability {
            message: format!("Reduced operator has negative population {:.3e} at Fock level {}", value.re, level)
        });
    }

    let trace = linalg::trace(reduced).re;
    if trace > max_trace + eff_tol {
        return Err(DisentangleError::NumericalInstability {
            message: format!("Reduced trace {} exceeds the input probability {}", trace, max_trace)
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_check_normalization_detects_deviation() -> Result<(), DisentangleError> {
        let state = TruncatedState::new(vec![Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.8)])?;
        check_normalization(&state, None)?;

        let unnormalized = TruncatedState::new(vec![Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)])?;
        assert!(check_normalization(&unnormalized, None).is_err());
        assert!(check_normalization(&unnormalized, Some(1.5)).is_ok());
        Ok(())
    }

    #[test]
    fn test_check_finite_names_level() -> Result<(), DisentangleError> {
        let state = TruncatedState::new(vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, f64::INFINITY)])?;
        match check_finite(&state) {
            Err(DisentangleError::InvalidState { message }) => assert!(message.contains("level 1")),
            other => panic!("expected InvalidState, got {:?}", other),
        }
        assert_eq!(first_non_finite(&[0.0, 1.0, f64::NAN]), Some(2));
        assert_eq!(first_non_finite(&[0.0, 1.0]), None);
        Ok(())
    }

    #[test]
    fn test_check_hermitian() {
        let mut m = CMatrix::zeros((2, 2));
        m[[0, 1]] = Complex64::new(1.0, 1.0);
        m[[1, 0]] = Complex64::new(1.0, -1.0);
        assert!(check_hermitian(&m, None).is_ok());
        m[[1, 0]] = Complex64::new(1.0, 1.0);
        assert!(check_hermitian(&m, None).is_err());
    }

    #[test]
    fn test_check_reduced_operator_trace_bound() {
        let mut rho = CMatrix::zeros((2, 2));
        rho[[0, 0]] = Complex64::new(0.7, 0.0);
        rho[[1, 1]] = Complex64::new(0.2, 0.0);
        assert!(check_reduced_operator(&rho, 1.0, None).is_ok());
        assert!(check_reduced_operator(&rho, 0.5, None).is_err());
        rho[[1, 1]] = Complex64::new(-0.2, 0.0);
        assert!(check_reduced_operator(&rho, 1.0, None).is_err());
    }
}
