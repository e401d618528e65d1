// src/fock/mod.rs

//! Truncated single-mode bosonic operators.
//!
//! The operators live in the `cutoff`-dimensional Fock space and are therefore only
//! approximations of the true bosonic operators: raising `|cutoff-1>` would need the
//! missing `|cutoff>` level, so that coupling is silently dropped. Expect the
//! canonical commutation relation to fail at the last index.

use crate::core::DisentangleError;
use crate::linalg::{self, CMatrix};
use num_complex::Complex64;
use num_traits::Zero;

/// The read-only operator set used for centering, the cost penalty and readout.
#[derive(Debug, Clone, PartialEq)]
pub struct FockOperators {
    cutoff: usize,
    a: CMatrix,
    a_dagger: CMatrix,
    n: CMatrix,
    x: CMatrix,
    p: CMatrix,
}

impl FockOperators {
    /// Builds `a`, `a†`, `n = a†a`, `x = a + a†` and `p = -i(a - a†)`.
    ///
    /// # Arguments
    /// * `cutoff` - Fock truncation dimension, at least 2.
    ///
    /// # Errors
    /// * `DisentangleError::InvalidConfiguration` if `cutoff < 2`.
    pub fn new(cutoff: usize) -> Result<Self, DisentangleError> {
        if cutoff < 2 {
            return Err(DisentangleError::InvalidConfiguration {
                message: format!("Fock cutoff must be at least 2, got {}", cutoff),
            });
        }

        let a = annihilation(cutoff);
        let a_dagger = linalg::dagger(&a);
        let n = a_dagger.dot(&a);
        let x = &a + &a_dagger;
        let p = (&a - &a_dagger).mapv(|z| z * Complex64::new(0.0, -1.0));

        tracing::debug!(cutoff, "built truncated Fock operators");
        Ok(Self { cutoff, a, a_dagger, n, x, p })
    }

    /// Truncation dimension.
    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Annihilation operator `a`.
    pub fn annihilation(&self) -> &CMatrix {
        &self.a
    }

    /// Creation operator `a†`.
    pub fn creation(&self) -> &CMatrix {
        &self.a_dagger
    }

    /// Number operator `n`.
    pub fn number(&self) -> &CMatrix {
        &self.n
    }

    /// Position quadrature `x = a + a†`.
    pub fn position(&self) -> &CMatrix {
        &self.x
    }

    /// Momentum quadrature `p = -i(a - a†)`.
    pub fn momentum(&self) -> &CMatrix {
        &self.p
    }
}

/// `a[i, i+1] = sqrt(i+1)`, zero elsewhere.
fn annihilation(cutoff: usize) -> CMatrix {
    let mut a = CMatrix::from_elem((cutoff, cutoff), Complex64::zero());
    for i in 0..cutoff - 1 {
        a[[i, i + 1]] = Complex64::new(((i + 1) as f64).sqrt(), 0.0);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TEST_TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_cutoff_too_small_rejected() {
        assert!(matches!(FockOperators::new(1), Err(DisentangleError::InvalidConfiguration { .. })));
        assert!(matches!(FockOperators::new(0), Err(DisentangleError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_annihilation_lowers_photon_number() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(5)?;
        let a = ops.annihilation();
        for i in 0..5 {
            for j in 0..5 {
                let expected = if j == i + 1 { (j as f64).sqrt() } else { 0.0 };
                assert_abs_diff_eq!(a[[i, j]].re, expected, epsilon = TEST_TOLERANCE);
                assert_abs_diff_eq!(a[[i, j]].im, 0.0, epsilon = TEST_TOLERANCE);
            }
        }
        Ok(())
    }

    #[test]
    fn test_number_operator_is_diagonal_ladder() -> Result<(), DisentangleError> {
        for cutoff in [2, 3, 7, 30] {
            let ops = FockOperators::new(cutoff)?;
            let n = ops.number();
            for i in 0..cutoff {
                for j in 0..cutoff {
                    let expected = if i == j { i as f64 } else { 0.0 };
                    assert_abs_diff_eq!(n[[i, j]].re, expected, epsilon = TEST_TOLERANCE);
                    assert_abs_diff_eq!(n[[i, j]].im, 0.0, epsilon = TEST_TOLERANCE);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_quadrature_commutator_except_boundary() -> Result<(), DisentangleError> {
        let cutoff = 8;
        let ops = FockOperators::new(cutoff)?;
        let comm = linalg::commutator(ops.position(), ops.momentum());
        for i in 0..cutoff {
            for j in 0..cutoff {
                let expected = match (i == j, i == cutoff - 1) {
                    (true, false) => Complex64::new(0.0, 2.0),
                    // Truncation correction: [a, a†] = -(cutoff-1) on the last level.
                    (true, true) => Complex64::new(0.0, -2.0 * (cutoff - 1) as f64),
                    _ => Complex64::zero(),
                };
                assert!(
                    (comm[[i, j]] - expected).norm() < TEST_TOLERANCE,
                    "[x,p] mismatch at ({}, {}): {} vs {}", i, j, comm[[i, j]], expected
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_quadratures_are_hermitian() -> Result<(), DisentangleError> {
        let ops = FockOperators::new(6)?;
        assert!(linalg::max_abs_diff(ops.position(), &linalg::dagger(ops.position())) < TEST_TOLERANCE);
        assert!(linalg::max_abs_diff(ops.momentum(), &linalg::dagger(ops.momentum())) < TEST_TOLERANCE);
        Ok(())
    }
}
