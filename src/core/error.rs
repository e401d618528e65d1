//! Error handling logic

use std::fmt;

/// Error types raised while preparing states, mixing them, or running the optimizer.
///
/// Truncation leakage is deliberately absent: it degrades accuracy silently and is
/// surfaced through `MixingDiagnostics` and a logged warning instead.
#[derive(Debug, Clone, PartialEq)]
pub enum DisentangleError {
    /// A configuration value is outside its admissible range.
    /// Raised before the optimization loop is entered.
    InvalidConfiguration {
        /// InvalidConfiguration failure message
        message: String
    },

    /// A state vector cannot be used (zero norm, empty, non-finite amplitudes).
    InvalidState {
        /// InvalidState failure message
        message: String
    },

    /// Two objects that must share the truncation dimension do not.
    DimensionMismatch {
        /// Dimension required by the receiving object.
        expected: usize,
        /// Dimension actually supplied.
        found: usize,
    },

    /// A cost term is not representable (near-zero trace, NaN, infinity).
    NumericalInstability {
        /// NumericalInstability failure message
        message: String
    },

    /// The optimizer produced a non-finite cost or gradient and aborted the run.
    Divergence {
        /// Iteration at which the non-finite value appeared.
        iteration: usize,
        /// Divergence failure message
        message: String
    },
}

impl fmt::Display for DisentangleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisentangleError::InvalidConfiguration { message } => write!(f, "Invalid Configuration: {}", message),
            DisentangleError::InvalidState { message } => write!(f, "Invalid State: {}", message),
            DisentangleError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension Mismatch: expected cutoff {}, found {}", expected, found)
            }
            DisentangleError::NumericalInstability { message } => write!(f, "Numerical Instability: {}", message),
            DisentangleError::Divergence { iteration, message } => {
                write!(f, "Divergence at iteration {}: {}", iteration, message)
            }
        }
    }
}

impl std::error::Error for DisentangleError {}
