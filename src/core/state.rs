// src/core/state.rs

use super::error::DisentangleError;
use ndarray::Array1;
use num_complex::Complex64;
use std::fmt;

/// A single-mode state vector in the truncated Fock basis `{|0>, ..., |cutoff-1>}`.
///
/// Index `k` holds the amplitude of the `k`-photon Fock state. States produced by
/// `preparation` are unit-norm; the trainable state inside the optimizer is allowed
/// to drift in norm because the cost functional divides by the reduced trace.
#[derive(Debug, Clone, PartialEq)] // Avoid Eq for floating-point complex numbers
pub struct TruncatedState {
    amplitudes: Array1<Complex64>,
}

impl TruncatedState {
    /// Creates a state from raw amplitudes without normalizing them.
    ///
    /// # Errors
    /// * `DisentangleError::InvalidState` if `amplitudes` is empty.
    pub fn new(amplitudes: Vec<Complex64>) -> Result<Self, DisentangleError> {
        if amplitudes.is_empty() {
            return Err(DisentangleError::InvalidState {
                message: "A truncated state needs at least one Fock amplitude".to_string(),
            });
        }
        Ok(Self { amplitudes: Array1::from_vec(amplitudes) })
    }

    /// Combines separate real and imaginary coefficient vectors into one state.
    ///
    /// This is how the optimizer turns its two real parameter vectors into the
    /// complex trainable state every iteration.
    pub fn from_parts(re: &[f64], im: &[f64]) -> Result<Self, DisentangleError> {
        if re.len() != im.len() {
            return Err(DisentangleError::DimensionMismatch { expected: re.len(), found: im.len() });
        }
        Self::new(re.iter().zip(im).map(|(&r, &i)| Complex64::new(r, i)).collect())
    }

    pub(crate) fn from_array(amplitudes: Array1<Complex64>) -> Self {
        Self { amplitudes }
    }

    /// Read-only view of the amplitudes.
    pub fn vector(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    /// Truncation dimension (`cutoff`) of the state.
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Squared Euclidean norm `Σ |c_k|^2`.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    /// Euclidean norm of the amplitude vector.
    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    /// Real parts of the amplitudes, in Fock order.
    pub fn real_parts(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.re).collect()
    }

    /// Imaginary parts of the amplitudes, in Fock order.
    pub fn imag_parts(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.im).collect()
    }

    /// Population `|c_k|^2` of every Fock level.
    pub fn populations(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.norm_sqr()).collect()
    }

    /// Returns an error unless the state has exactly `cutoff` amplitudes.
    pub fn ensure_dim(&self, cutoff: usize) -> Result<(), DisentangleError> {
        if self.dim() != cutoff {
            return Err(DisentangleError::DimensionMismatch { expected: cutoff, found: self.dim() });
        }
        Ok(())
    }
}

impl fmt::Display for TruncatedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TruncatedState[")?;
        for (i, c) in self.amplitudes.iter().enumerate() {
            write!(f, "{}{:.4}", if i > 0 { ", " } else { "" }, c)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_pairs_components() -> Result<(), DisentangleError> {
        let state = TruncatedState::from_parts(&[1.0, 0.0, 3.0], &[0.0, 2.0, -1.0])?;
        assert_eq!(state.dim(), 3);
        assert_eq!(state.vector()[2], Complex64::new(3.0, -1.0));
        assert_eq!(state.real_parts(), vec![1.0, 0.0, 3.0]);
        assert_eq!(state.imag_parts(), vec![0.0, 2.0, -1.0]);
        assert!((state.norm_sqr() - 15.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_from_parts_rejects_length_mismatch() {
        let err = TruncatedState::from_parts(&[1.0, 0.0], &[0.0]).unwrap_err();
        assert_eq!(err, DisentangleError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_empty_state_rejected() {
        assert!(matches!(TruncatedState::new(Vec::new()), Err(DisentangleError::InvalidState { .. })));
    }
}
