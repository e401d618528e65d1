// src/linalg/mod.rs

//! Dense complex linear algebra used by the operator algebra, the mixing step
//! and the cost functional.
//!
//! Everything here works on small (`cutoff × cutoff`, cutoff ≲ 30) dense matrices, so
//! plain `ndarray` products are used throughout and no decomposition library is pulled in.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

/// Dense complex matrix in the truncated Fock basis.
pub type CMatrix = Array2<Complex64>;
/// Dense complex vector in the truncated Fock basis.
pub type CVector = Array1<Complex64>;

/// Highest Taylor order used by `expm` after scaling.
const TAYLOR_TERMS: usize = 24;
/// `expm` scales its argument until its 1-norm is at most this value.
const EXPM_SCALED_NORM: f64 = 0.5;
/// Upper bound on the number of squarings, reached only for non-finite input.
const MAX_SQUARINGS: u32 = 64;

/// `n × n` identity.
pub fn identity(n: usize) -> CMatrix {
    CMatrix::eye(n)
}

/// Conjugate transpose `M†`.
pub fn dagger(m: &CMatrix) -> CMatrix {
    m.t().mapv(|z| z.conj())
}

/// Element-wise complex conjugate.
pub fn conj(m: &CMatrix) -> CMatrix {
    m.mapv(|z| z.conj())
}

/// Commutator `[A, B] = AB − BA`.
pub fn commutator(a: &CMatrix, b: &CMatrix) -> CMatrix {
    a.dot(b) - b.dot(a)
}

/// `Tr(M)`.
pub fn trace(m: &CMatrix) -> Complex64 {
    m.diag().iter().sum()
}

/// `Tr(A·B)` without forming the product.
pub fn trace_product(a: &CMatrix, b: &CMatrix) -> Complex64 {
    a.iter().zip(b.t().iter()).map(|(x, y)| x * y).sum()
}

/// Outer product without conjugation, `J[i, j] = u[i]·v[j]`.
pub fn outer(u: &CVector, v: &CVector) -> CMatrix {
    Array2::from_shape_fn((u.len(), v.len()), |(i, j)| u[i] * v[j])
}

/// Projector-style density `|v><v|`, `ρ[i, j] = v[i]·conj(v[j])`.
pub fn density(v: &CVector) -> CMatrix {
    Array2::from_shape_fn((v.len(), v.len()), |(i, j)| v[i] * v[j].conj())
}

/// Unnormalized expectation value `<v|O|v>`.
pub fn expectation(op: &CMatrix, v: &CVector) -> Complex64 {
    let ov = op.dot(v);
    v.iter().zip(ov.iter()).map(|(c, o)| c.conj() * o).sum()
}

/// Largest absolute row sum.
fn inf_norm(m: &CMatrix) -> f64 {
    m.rows()
        .into_iter()
        .map(|row| row.iter().map(|z| z.norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// Largest element-wise distance `max |A[i,j] − B[i,j]|`.
pub fn max_abs_diff(a: &CMatrix, b: &CMatrix) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).norm()).fold(0.0, f64::max)
}

/// Matrix exponential `exp(M)` by scaling and squaring with a truncated Taylor series.
///
/// The argument is halved until its norm is at most 0.5, the series is summed until
/// the next term no longer changes the result at machine precision, and the result is
/// squared back up.
pub fn expm(m: &CMatrix) -> CMatrix {
    let n = m.nrows();
    let norm = inf_norm(m);

    let mut squarings = 0u32;
    let mut scale = 1.0;
    while norm * scale > EXPM_SCALED_NORM && squarings < MAX_SQUARINGS {
        scale *= 0.5;
        squarings += 1;
    }
    let scaled = m.mapv(|z| z * scale);

    let mut result = identity(n);
    let mut term = identity(n);
    for k in 1..=TAYLOR_TERMS {
        term = term.dot(&scaled).mapv(|z| z / k as f64);
        result = result + &term;
        if inf_norm(&term) <= f64::EPSILON * inf_norm(&result) {
            break;
        }
    }

    for _ in 0..squarings {
        result = result.dot(&result);
    }
    result
}
