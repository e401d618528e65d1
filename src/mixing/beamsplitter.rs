// src/mixing/beamsplitter.rs

//! Truncated two-mode beamsplitter transform.
//!
//! The phase-0 beamsplitter of angle `θ` maps creation operators as
//! `a1† → cos θ a1† + sin θ a2†` and `a2† → −sin θ a1† + cos θ a2†`. It conserves the total
//! photon number `N = k + l`, so the transform on the joint Fock basis splits into one
//! real block per `N`. Each block is restricted to the indices that fit in the
//! truncation on both the input and output side; whatever amplitude the full unitary
//! would send past `cutoff - 1` is lost.

use crate::core::DisentangleError;
use crate::linalg::CMatrix;
use ndarray::Array2;
use num_complex::Complex64;
use num_traits::Zero;

/// One fixed-total-photon-number block of the transform.
#[derive(Debug, Clone, PartialEq)]
struct PhotonBlock {
    /// Total photon number `N` shared by all states in the block.
    total: usize,
    /// Smallest first-mode photon number in the block.
    offset: usize,
    /// `matrix[[m - offset, k - offset]] = <m, N-m| U |k, N-k>`.
    matrix: Array2<f64>,
}

/// The beamsplitter unitary restricted to a `cutoff × cutoff` joint Fock basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Beamsplitter {
    theta: f64,
    cutoff: usize,
    blocks: Vec<PhotonBlock>,
}

impl Beamsplitter {
    /// Precomputes every photon-number block for the given angle and truncation.
    ///
    /// # Errors
    /// * `DisentangleError::InvalidConfiguration` for a non-finite angle or `cutoff < 1`.
    pub fn new(theta: f64, cutoff: usize) -> Result<Self, DisentangleError> {
        if !theta.is_finite() {
            return Err(DisentangleError::InvalidConfiguration {
                message: format!("Beamsplitter angle must be finite, got {}", theta),
            });
        }
        if cutoff == 0 {
            return Err(DisentangleError::InvalidConfiguration {
                message: "Beamsplitter cutoff must be positive".to_string(),
            });
        }

        let ln_fact = ln_factorials(2 * cutoff);
        let (cos_t, sin_t) = (theta.cos(), theta.sin());

        let blocks = (0..2 * cutoff - 1)
            .map(|total| {
                let offset = total.saturating_sub(cutoff - 1);
                let upper = total.min(cutoff - 1);
                let dim = upper - offset + 1;
                let matrix = Array2::from_shape_fn((dim, dim), |(mi, ki)| {
                    let (m, k) = (offset + mi, offset + ki);
                    element(m, total - m, k, total - k, cos_t, sin_t, &ln_fact)
                });
                PhotonBlock { total, offset, matrix }
            })
            .collect();

        Ok(Self { theta, cutoff, blocks })
    }

    /// Mixing angle in radians.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Single-mode truncation dimension.
    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// `<m, n| U |k, l>` for indices inside the truncation, zero otherwise.
    pub fn matrix_element(&self, m: usize, n: usize, k: usize, l: usize) -> f64 {
        let c = self.cutoff;
        if m >= c || n >= c || k >= c || l >= c || m + n != k + l {
            return 0.0;
        }
        let block = &self.blocks[m + n];
        block.matrix[[m - block.offset, k - block.offset]]
    }

    /// Applies the transform to a joint two-mode amplitude matrix `J[k, l]`.
    ///
    /// Returns `M[m, n] = Σ_{k,l} <m,n|U|k,l> J[k, l]`.
    pub fn apply(&self, joint: &CMatrix) -> Result<CMatrix, DisentangleError> {
        self.check_shape(joint)?;
        let mut mixed = CMatrix::from_elem((self.cutoff, self.cutoff), Complex64::zero());
        for block in &self.blocks {
            let (n_tot, off) = (block.total, block.offset);
            for (mi, row) in block.matrix.rows().into_iter().enumerate() {
                let m = off + mi;
                mixed[[m, n_tot - m]] = row
                    .iter()
                    .enumerate()
                    .map(|(ki, &u)| joint[[off + ki, n_tot - off - ki]] * u)
                    .sum();
            }
        }
        Ok(mixed)
    }

    /// Applies the transposed transform, `R[k, l] = Σ_{m,n} <m,n|U|k,l> H[m, n]`.
    ///
    /// The blocks are real, so this is also the adjoint used to pull a cost sensitivity
    /// on the mixed state back onto the joint input.
    pub fn apply_transpose(&self, sensitivity: &CMatrix) -> Result<CMatrix, DisentangleError> {
        self.check_shape(sensitivity)?;
        let mut pulled = CMatrix::from_elem((self.cutoff, self.cutoff), Complex64::zero());
        for block in &self.blocks {
            let (n_tot, off) = (block.total, block.offset);
            for (ki, column) in block.matrix.columns().into_iter().enumerate() {
                let k = off + ki;
                pulled[[k, n_tot - k]] = column
                    .iter()
                    .enumerate()
                    .map(|(mi, &u)| sensitivity[[off + mi, n_tot - off - mi]] * u)
                    .sum();
            }
        }
        Ok(pulled)
    }

    fn check_shape(&self, m: &CMatrix) -> Result<(), DisentangleError> {
        for dim in [m.nrows(), m.ncols()] {
            if dim != self.cutoff {
                return Err(DisentangleError::DimensionMismatch { expected: self.cutoff, found: dim });
            }
        }
        Ok(())
    }
}

/// `ln(j!)` for `j = 0..len`.
fn ln_factorials(len: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(len);
    let mut acc = 0.0;
    table.push(acc);
    for j in 1..len {
        acc += (j as f64).ln();
        table.push(acc);
    }
    table
}

/// `<m,n|U|k,l>` from expanding `(c a1† + s a2†)^k (−s a1† + c a2†)^l |0,0>`.
fn element(m: usize, n: usize, k: usize, l: usize, cos_t: f64, sin_t: f64, ln_fact: &[f64]) -> f64 {
    let ln_binom = |top: usize, bottom: usize| ln_fact[top] - ln_fact[bottom] - ln_fact[top - bottom];
    let mut sum = 0.0;
    // p photons of the output first mode come from the first input mode, q = m - p from the second.
    for p in m.saturating_sub(l)..=k.min(m) {
        let q = m - p;
        let weight = (ln_binom(k, p) + ln_binom(l, q)).exp();
        let amplitude = cos_t.powi(p as i32)
            * sin_t.powi((k - p) as i32)
            * (-sin_t).powi(q as i32)
            * cos_t.powi((l - q) as i32);
        sum += weight * amplitude;
    }
    sum * (0.5 * (ln_fact[m] + ln_fact[n] - ln_fact[k] - ln_fact[l])).exp()
}
