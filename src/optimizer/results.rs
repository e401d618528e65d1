// src/optimizer/results.rs
use crate::core::TruncatedState;
use std::fmt;

/// Outcome of [`super::Optimizer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Trainable state after the last update, in the scale the optimizer left it.
    pub final_state: TruncatedState,
    /// Cost recorded before every update, one entry per iteration.
    pub cost_history: Vec<f64>,
    /// Cost of `final_state`.
    pub final_cost: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Largest leaked fraction seen, zero when the source does not track leakage.
    pub max_leakage: f64,
    /// Whether the early-stop criterion ended the run before `reps`.
    pub stopped_early: bool,
    /// Euclidean norm of `final_state`.
    pub final_parameter_norm: f64,
}

impl OptimizationResult {
    /// Highest cost seen, including the final state.
    pub fn best_cost(&self) -> f64 {
        self.cost_history.iter().copied().fold(self.final_cost, f64::max)
    }

    /// Mean of the recorded costs over `range`, clamped to the history.
    pub fn mean_cost(&self, range: std::ops::Range<usize>) -> Option<f64> {
        let end = range.end.min(self.cost_history.len());
        let slice = self.cost_history.get(range.start..end)?;
        if slice.is_empty() {
            return None;
        }
        Some(slice.iter().sum::<f64>() / slice.len() as f64)
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Results:")?;
        writeln!(f, "  Iterations: {}{}", self.iterations, if self.stopped_early { " (stopped early)" } else { "" })?;
        writeln!(f, "  Final cost: {:.10}", self.final_cost)?;
        writeln!(f, "  Best cost: {:.10}", self.best_cost())?;
        writeln!(f, "  Parameter norm: {:.6}", self.final_parameter_norm)?;
        writeln!(f, "  Max leakage: {:.3e}", self.max_leakage)?;
        Ok(())
    }
}
