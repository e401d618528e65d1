// src/mixing/mod.rs

//! Two-mode mixing and reduction.
//!
//! The fixed input `ψ` and the trainable state `φ` form the joint amplitude matrix
//! `J[i, j] = ψ[i]·φ[j]`, which the truncated beamsplitter turns into `M`. Tracing out
//! the first (fixed-input) output mode leaves the reduced operator on the trainable
//! output mode.

mod beamsplitter;

pub use beamsplitter::Beamsplitter;

use crate::core::{DisentangleError, TruncatedState};
use crate::linalg::{self, CMatrix};

/// Probability bookkeeping for one pass through the truncated beamsplitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixingDiagnostics {
    /// `‖ψ‖²·‖φ‖²`, the probability that entered the transform.
    pub joint_norm_sqr: f64,
    /// `Tr(ρ)`, the probability that stayed inside the truncation.
    pub retained: f64,
    /// Probability pushed past the truncation boundary.
    pub leaked: f64,
}

impl MixingDiagnostics {
    /// Leaked probability relative to the probability that entered the transform.
    pub fn leaked_fraction(&self) -> f64 {
        if self.joint_norm_sqr > 0.0 { self.leaked / self.joint_norm_sqr } else { 0.0 }
    }
}

/// Everything produced by one forward pass of the mixing stage.
#[derive(Debug, Clone)]
pub struct MixedOutput {
    /// `M[m, n]`, amplitudes indexed by the two output photon numbers.
    pub mixed: CMatrix,
    /// `ρ_B`, reduced operator on the trainable output mode.
    pub reduced: CMatrix,
    /// Truncation bookkeeping.
    pub diagnostics: MixingDiagnostics,
}

/// `J[i, j] = ψ[i]·φ[j]`.
pub fn joint_state(fixed: &TruncatedState, trainable: &TruncatedState) -> Result<CMatrix, DisentangleError> {
    trainable.ensure_dim(fixed.dim())?;
    Ok(linalg::outer(fixed.vector(), trainable.vector()))
}

/// `ρ[i, j] = Σ_k M[k, i]·conj(M[k, j])`, tracing out the first mode.
pub fn partial_trace(mixed: &CMatrix) -> CMatrix {
    mixed.t().dot(&linalg::conj(mixed))
}

/// The fixed half of the pipeline: the input state and the beamsplitter it meets.
#[derive(Debug, Clone)]
pub struct TwoModeMixer {
    beamsplitter: Beamsplitter,
    fixed: TruncatedState,
}

impl TwoModeMixer {
    /// Pairs a fixed input state with a beamsplitter of angle `theta`.
    pub fn new(fixed: TruncatedState, theta: f64) -> Result<Self, DisentangleError> {
        let beamsplitter = Beamsplitter::new(theta, fixed.dim())?;
        Ok(Self { beamsplitter, fixed })
    }

    /// Builds a mixer from a precomputed transform.
    pub fn with_beamsplitter(fixed: TruncatedState, beamsplitter: Beamsplitter) -> Result<Self, DisentangleError> {
        fixed.ensure_dim(beamsplitter.cutoff())?;
        Ok(Self { beamsplitter, fixed })
    }

    /// The transform applied every forward pass.
    pub fn beamsplitter(&self) -> &Beamsplitter {
        &self.beamsplitter
    }

    /// The fixed input state `ψ`.
    pub fn fixed(&self) -> &TruncatedState {
        &self.fixed
    }

    /// Truncation dimension shared by both modes.
    pub fn cutoff(&self) -> usize {
        self.beamsplitter.cutoff()
    }

    /// Runs outer product, beamsplitter and partial trace for one trainable state.
    pub fn forward(&self, trainable: &TruncatedState) -> Result<MixedOutput, DisentangleError> {
        let joint = joint_state(&self.fixed, trainable)?;
        let mixed = self.beamsplitter.apply(&joint)?;
        let reduced = partial_trace(&mixed);

        let joint_norm_sqr = self.fixed.norm_sqr() * trainable.norm_sqr();
        let retained = linalg::trace(&reduced).re;
        let diagnostics = MixingDiagnostics {
            joint_norm_sqr,
            retained,
            leaked: (joint_norm_sqr - retained).max(0.0),
        };
        Ok(MixedOutput { mixed, reduced, diagnostics })
    }
}
