// src/lib.rs

//! `disentangle` - Finding the single-mode state that stays unentangled through a beamsplitter
//!
//! A fixed single-mode input `ψ` and a trainable state `φ` meet on a truncated
//! beamsplitter. Tracing out the first output mode leaves a reduced operator whose purity
//! measures how little the two outputs are entangled. The optimizer adjusts the complex
//! amplitudes of `φ` with Adam to maximize that purity, with a penalty that keeps `φ`
//! centred in phase space.

pub mod core;
pub mod linalg;
pub mod fock;
pub mod preparation;
pub mod mixing;
pub mod cost;
pub mod gradient;
pub mod optimizer;
pub mod analysis;
pub mod validation;

// Re-export the most common types for easier top-level use
pub use core::{DisentangleError, TruncatedState};
pub use fock::FockOperators;
pub use mixing::{Beamsplitter, MixedOutput, MixingDiagnostics, TwoModeMixer};
pub use cost::{CostEvaluation, CostFunctional};
pub use gradient::{EntanglementObjective, Evaluation, FiniteDifference, GradientSource, Objective};
pub use optimizer::{
    EarlyStop,
    NormalizationPolicy,
    OptimizationResult,
    Optimizer,
    OptimizerConfig,
    ProgressLog,
    ProgressObserver,
    ProgressReport,
    TracingObserver,
};
pub use analysis::{analyze, StateAnalysis};
pub use validation::{check_finite, check_hermitian, check_normalization, check_reduced_operator};

// Example 1: Short optimization run
// Mixes the input (|0> + |1>)/sqrt(2) on a 50:50 beamsplitter and runs a few Adam steps
// from a seeded random guess, collecting the progress reports.
/// ```
/// use disentangle::{preparation, FockOperators, Optimizer, OptimizerConfig, ProgressLog, DisentangleError};
/// use num_complex::Complex64;
///
/// # fn main() -> Result<(), DisentangleError> {
/// let config = OptimizerConfig::builder()
///     .cutoff(10)
///     .initial_support(6)
///     .reps(21)
///     .report_interval(10)
///     .build()?;
/// let input = preparation::superposition(&[Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)], 10)?;
///
/// let mut log = ProgressLog::new();
/// let result = Optimizer::new(config, &input)?.run(&mut log)?;
///
/// println!("{}", result);
/// assert_eq!(result.iterations, 21);
/// assert_eq!(log.reports().len(), 3); // iterations 0, 10 and 20
/// assert!(result.final_cost.is_finite());
///
/// let analysis = disentangle::analyze(&result.final_state, &FockOperators::new(10)?)?;
/// assert!(analysis.mean_photon_number >= 0.0);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Entanglement-free fixed point
// Two identical squeezed vacua leave a 50:50 beamsplitter as the same product state,
// so the reduced operator is pure and the cost sits at its maximum of 1.
/// ```
/// use disentangle::{preparation, EntanglementObjective, GradientSource, DisentangleError};
/// use std::f64::consts::FRAC_PI_4;
///
/// # fn main() -> Result<(), DisentangleError> {
/// let squeezed = preparation::squeezed_vacuum(0.3, 0.0, 20)?;
/// let objective = EntanglementObjective::new(squeezed.clone(), FRAC_PI_4, 10.0)?;
/// let eval = objective.value_and_gradient(&squeezed.real_parts(), &squeezed.imag_parts())?;
///
/// assert!((eval.value - 1.0).abs() < 1e-6);
/// assert!(eval.gradient_norm() < 1e-6);
/// # Ok(())
/// # }
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
