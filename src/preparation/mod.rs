// src/preparation/mod.rs

//! Single-mode state preparation: normalization, standard Fock-space states, and the
//! one-shot phase-space recentering applied before optimization starts.

use crate::core::constants::ZERO_NORM;
use crate::core::{DisentangleError, TruncatedState};
use crate::fock::FockOperators;
use crate::linalg::{self, CMatrix};
use crate::validation;
use ndarray::Array1;
use num_complex::Complex64;
use num_traits::Zero;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Divides a state by its Euclidean norm.
///
/// # Errors
/// * `DisentangleError::InvalidState` if any amplitude is non-finite or the norm is zero.
pub fn normalize(state: &TruncatedState) -> Result<TruncatedState, DisentangleError> {
    validation::check_finite(state)?;
    let norm = state.norm();
    if norm <= ZERO_NORM {
        return Err(DisentangleError::InvalidState {
            message: "Cannot normalize a state with zero norm".to_string(),
        });
    }
    Ok(TruncatedState::from_array(state.vector().mapv(|c| c / norm)))
}

/// First moment `alpha = <a>` of the normalized state.
///
/// `Re(alpha)` and `Im(alpha)` are half the mean `x` and `p` quadratures.
pub fn first_moment(state: &TruncatedState, ops: &FockOperators) -> Result<Complex64, DisentangleError> {
    state.ensure_dim(ops.cutoff())?;
    let norm_sqr = state.norm_sqr();
    if norm_sqr <= ZERO_NORM {
        return Err(DisentangleError::InvalidState {
            message: "First moment of a zero-norm state is undefined".to_string(),
        });
    }
    Ok(linalg::expectation(ops.annihilation(), state.vector()) / norm_sqr)
}

/// Truncated unitary `exp(conj(alpha)·a − alpha·a†)`, i.e. the displacement `D(−alpha)`.
///
/// Applying it to a state with `<a> = alpha` moves the first moment to zero, up to the
/// error introduced by exponentiating the truncated generator.
pub fn displacement_operator(alpha: Complex64, ops: &FockOperators) -> CMatrix {
    let generator = ops.annihilation().mapv(|z| z * alpha.conj()) - ops.creation().mapv(|z| z * alpha);
    linalg::expm(&generator)
}

/// Removes the first-moment displacement of a state and returns it normalized.
///
/// Run once on both the fixed input and the initial trainable guess; the optimizer keeps
/// the trainable state centered through the cost penalty afterwards.
pub fn recenter(state: &TruncatedState, ops: &FockOperators) -> Result<TruncatedState, DisentangleError> {
    let normalized = normalize(state)?;
    let alpha = first_moment(&normalized, ops)?;
    let shifted = displacement_operator(alpha, ops).dot(normalized.vector());
    let centered = normalize(&TruncatedState::from_array(shifted))?;

    let residual = first_moment(&centered, ops)?;
    tracing::debug!(
        alpha_re = alpha.re,
        alpha_im = alpha.im,
        residual = residual.norm(),
        "recentered state"
    );
    Ok(centered)
}

// --- Standard states ---

/// Fock state `|n>`.
pub fn fock_state(n: usize, cutoff: usize) -> Result<TruncatedState, DisentangleError> {
    if n >= cutoff {
        return Err(DisentangleError::InvalidState {
            message: format!("Fock level {} is outside the truncation (cutoff {})", n, cutoff),
        });
    }
    let mut amplitudes = vec![Complex64::zero(); cutoff];
    amplitudes[n] = Complex64::new(1.0, 0.0);
    TruncatedState::new(amplitudes)
}

/// Normalized superposition with the given leading Fock coefficients, zero-padded to `cutoff`.
///
/// `superposition(&[1, 1], 30)` is the reference input `(|0> + |1>)/sqrt(2)`.
pub fn superposition(coefficients: &[Complex64], cutoff: usize) -> Result<TruncatedState, DisentangleError> {
    if coefficients.len() > cutoff {
        return Err(DisentangleError::DimensionMismatch { expected: cutoff, found: coefficients.len() });
    }
    let mut amplitudes = vec![Complex64::zero(); cutoff];
    amplitudes[..coefficients.len()].copy_from_slice(coefficients);
    normalize(&TruncatedState::new(amplitudes)?)
}

/// Coherent state `|alpha>`, renormalized after truncation.
pub fn coherent_state(alpha: Complex64, cutoff: usize) -> Result<TruncatedState, DisentangleError> {
    if cutoff == 0 {
        return Err(DisentangleError::InvalidState { message: "Cutoff must be positive".to_string() });
    }
    let mut amplitudes = Array1::from_elem(cutoff, Complex64::zero());
    amplitudes[0] = Complex64::new((-0.5 * alpha.norm_sqr()).exp(), 0.0);
    for n in 1..cutoff {
        amplitudes[n] = amplitudes[n - 1] * alpha / (n as f64).sqrt();
    }
    normalize(&TruncatedState::from_array(amplitudes))
}

/// Squeezed vacuum `S(r e^{i phi})|0>`, renormalized after truncation.
///
/// Only even Fock levels are populated:
/// `c_{2m} = (−e^{i phi} tanh r)^m sqrt((2m)!) / (2^m m!) / sqrt(cosh r)`.
/// With `phi = 0` the `x` quadrature is squeezed.
pub fn squeezed_vacuum(r: f64, phi: f64, cutoff: usize) -> Result<TruncatedState, DisentangleError> {
    if !r.is_finite() || !phi.is_finite() {
        return Err(DisentangleError::InvalidState {
            message: format!("Squeezing parameters must be finite, got r = {}, phi = {}", r, phi),
        });
    }
    if cutoff == 0 {
        return Err(DisentangleError::InvalidState { message: "Cutoff must be positive".to_string() });
    }
    let ratio = -Complex64::from_polar(r.tanh(), phi);
    let mut amplitudes = Array1::from_elem(cutoff, Complex64::zero());
    amplitudes[0] = Complex64::new(1.0 / r.cosh().sqrt(), 0.0);
    let mut m = 1;
    while 2 * m < cutoff {
        let step = ((2 * m - 1) as f64 / (2 * m) as f64).sqrt();
        amplitudes[2 * m] = amplitudes[2 * m - 2] * ratio * step;
        m += 1;
    }
    normalize(&TruncatedState::from_array(amplitudes))
}

/// Random normalized state with complex Gaussian amplitudes on the first `support` levels.
///
/// # Errors
/// * `DisentangleError::InvalidConfiguration` unless `1 <= support <= cutoff`.
pub fn random_state<R: Rng + ?Sized>(
    support: usize,
    cutoff: usize,
    rng: &mut R,
) -> Result<TruncatedState, DisentangleError> {
    if support == 0 || support > cutoff {
        return Err(DisentangleError::InvalidConfiguration {
            message: format!("Random state support must be within 1..={}, got {}", cutoff, support),
        });
    }
    let mut amplitudes = vec![Complex64::zero(); cutoff];
    for amplitude in amplitudes.iter_mut().take(support) {
        let re: f64 = StandardNormal.sample(rng);
        let im: f64 = StandardNormal.sample(rng);
        *amplitude = Complex64::new(re, im);
    }
    normalize(&TruncatedState::new(amplitudes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const CUTOFF: usize = 30;

    #[test]
    fn test_normalize_yields_unit_norm() -> Result<(), DisentangleError> {
        let state = TruncatedState::new(vec![
            Complex64::new(3.0, 0.0),
            Complex64::new(0.0, -4.0),
            Complex64::new(1e-3, 2e-3),
        ])?;
        let normalized = normalize(&state)?;
        assert_abs_diff_eq!(normalized.norm(), 1.0, epsilon = 1e-14);
        validation::check_normalization(&normalized, None)?;
        Ok(())
    }

    #[test]
    fn test_normalize_zero_state_fails() -> Result<(), DisentangleError> {
        let zero = TruncatedState::new(vec![Complex64::zero(); 4])?;
        assert!(matches!(normalize(&zero), Err(DisentangleError::InvalidState { .. })));
        Ok(())
    }

    #[test]
    fn test_normalize_rejects_nan() -> Result<(), DisentangleError> {
        let bad = TruncatedState::new(vec![Complex64::new(f64::NAN, 0.0), Complex64::new(1.0, 0.0)])?;
        assert!(normalize(&bad).is_err());
        Ok(())
    }

    #[test]
    fn test_recenter_removes_first_moment() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(CUTOFF)?;
        let input = superposition(&[Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)], CUTOFF)?;
        let before = first_moment(&input, &ops)?;
        assert_abs_diff_eq!(before.re, 0.5, epsilon = 1e-12);

        let centered = recenter(&input, &ops)?;
        assert!(first_moment(&centered, &ops)?.norm() < 1e-7);
        assert_abs_diff_eq!(centered.norm(), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_recenter_is_approximately_idempotent() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(CUTOFF)?;
        let mut rng = StdRng::seed_from_u64(7);
        let guess = random_state(10, CUTOFF, &mut rng)?;

        let once = recenter(&guess, &ops)?;
        let twice = recenter(&once, &ops)?;
        let drift: f64 = once
            .vector()
            .iter()
            .zip(twice.vector().iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        assert!(drift < 1e-7, "second recentering moved the state by {:.3e}", drift);
        Ok(())
    }

    #[test]
    fn test_recenter_coherent_state_returns_vacuum() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(CUTOFF)?;
        let coherent = coherent_state(Complex64::new(0.8, -0.6), CUTOFF)?;
        let alpha = first_moment(&coherent, &ops)?;
        assert_abs_diff_eq!(alpha.re, 0.8, epsilon = 1e-9);
        assert_abs_diff_eq!(alpha.im, -0.6, epsilon = 1e-9);

        let centered = recenter(&coherent, &ops)?;
        assert_abs_diff_eq!(centered.vector()[0].norm(), 1.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_squeezed_vacuum_is_centered_and_even() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(CUTOFF)?;
        let squeezed = squeezed_vacuum(0.4, 0.0, CUTOFF)?;
        assert_abs_diff_eq!(squeezed.norm(), 1.0, epsilon = 1e-12);
        assert!(first_moment(&squeezed, &ops)?.norm() < 1e-12);
        for (k, c) in squeezed.vector().iter().enumerate() {
            if k % 2 == 1 {
                assert_eq!(*c, Complex64::zero());
            }
        }
        // <n> = sinh^2 r for the untruncated state.
        let mean_n = linalg::expectation(ops.number(), squeezed.vector()).re;
        assert_abs_diff_eq!(mean_n, 0.4f64.sinh().powi(2), epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_fock_state_bounds() -> Result<(), DisentangleError> {
        let state = fock_state(3, 5)?;
        assert_eq!(state.vector()[3], Complex64::new(1.0, 0.0));
        assert!(fock_state(5, 5).is_err());
        Ok(())
    }

    #[test]
    fn test_random_state_support_and_determinism() -> Result<(), DisentangleError> {
        let a = random_state(10, CUTOFF, &mut StdRng::seed_from_u64(42))?;
        let b = random_state(10, CUTOFF, &mut StdRng::seed_from_u64(42))?;
        assert_eq!(a, b);
        assert_abs_diff_eq!(a.norm(), 1.0, epsilon = 1e-12);
        assert!(a.vector().iter().skip(10).all(|c| c.is_zero()));
        assert!(random_state(0, CUTOFF, &mut StdRng::seed_from_u64(1)).is_err());
        assert!(random_state(CUTOFF + 1, CUTOFF, &mut StdRng::seed_from_u64(1)).is_err());
        Ok(())
    }
}
