// src/optimizer/config.rs

use crate::core::{DisentangleError, defaults};
use std::fmt;

/// What happens to the trainable amplitudes after every Adam update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationPolicy {
    /// Leave the parameters as Adam produced them. The cost is scale-invariant, so the
    /// norm is free to drift.
    #[default]
    None,
    /// Project the parameters back onto the unit sphere.
    Renormalize,
}

impl fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationPolicy::None => write!(f, "none"),
            NormalizationPolicy::Renormalize => write!(f, "renormalize"),
        }
    }
}

/// Stop once the cost moved by less than `tolerance` over the last `window` iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStop {
    pub window: usize,
    pub tolerance: f64,
}

/// Everything the optimizer needs to know before the first iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Fock truncation shared by both modes.
    pub cutoff: usize,
    /// Beamsplitter angle.
    pub theta: f64,
    /// First-moment penalty weight `λ`.
    pub penalty: f64,
    /// Number of Adam iterations.
    pub reps: usize,
    pub step_size: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    /// Iterations between progress reports. Iteration 0 is always reported.
    pub report_interval: usize,
    /// Seed of the random initial guess.
    pub seed: u64,
    /// Number of leading Fock levels populated by the random initial guess.
    pub initial_support: usize,
    pub normalization: NormalizationPolicy,
    /// Leaked fraction above which the driver warns.
    pub leakage_tolerance: f64,
    pub early_stop: Option<EarlyStop>,
    /// Remove the first moment of the input and of the initial guess before starting.
    pub recenter_inputs: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            cutoff: defaults::CUTOFF,
            theta: defaults::THETA,
            penalty: defaults::PENALTY,
            reps: defaults::REPS,
            step_size: defaults::STEP_SIZE,
            beta1: defaults::BETA1,
            beta2: defaults::BETA2,
            epsilon: defaults::EPSILON,
            report_interval: defaults::REPORT_INTERVAL,
            seed: defaults::SEED,
            initial_support: defaults::INITIAL_SUPPORT,
            normalization: NormalizationPolicy::default(),
            leakage_tolerance: defaults::LEAKAGE_TOLERANCE,
            early_stop: None,
            recenter_inputs: true,
        }
    }
}

impl OptimizerConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> OptimizerConfigBuilder {
        OptimizerConfigBuilder::new()
    }

    /// Rejects configurations the driver cannot run.
    ///
    /// # Errors
    /// * `DisentangleError::InvalidConfiguration` naming the first offending field.
    pub fn validate(&self) -> Result<(), DisentangleError> {
        if self.cutoff < 2 {
            return invalid(format!("cutoff must be at least 2, got {}", self.cutoff));
        }
        if self.reps == 0 {
            return invalid("reps must be at least 1".to_string());
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return invalid(format!("step_size must be positive and finite, got {}", self.step_size));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return invalid(format!("{} must lie in [0, 1), got {}", name, beta));
            }
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return invalid(format!("epsilon must be positive and finite, got {}", self.epsilon));
        }
        if self.report_interval == 0 {
            return invalid("report_interval must be at least 1".to_string());
        }
        if self.initial_support == 0 || self.initial_support > self.cutoff {
            return invalid(format!(
                "initial_support must lie in 1..={}, got {}",
                self.cutoff, self.initial_support
            ));
        }
        if !self.theta.is_finite() {
            return invalid(format!("theta must be finite, got {}", self.theta));
        }
        if !(self.penalty.is_finite() && self.penalty >= 0.0) {
            return invalid(format!("penalty must be finite and non-negative, got {}", self.penalty));
        }
        if !(self.leakage_tolerance.is_finite() && self.leakage_tolerance >= 0.0) {
            return invalid(format!(
                "leakage_tolerance must be finite and non-negative, got {}",
                self.leakage_tolerance
            ));
        }
        if let Some(stop) = self.early_stop {
            if stop.window == 0 {
                return invalid("early_stop window must be at least 1".to_string());
            }
            if !(stop.tolerance.is_finite() && stop.tolerance >= 0.0) {
                return invalid(format!(
                    "early_stop tolerance must be finite and non-negative, got {}",
                    stop.tolerance
                ));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> Result<(), DisentangleError> {
    Err(DisentangleError::InvalidConfiguration { message })
}

/// Chained construction of an [`OptimizerConfig`].
#[derive(Debug, Clone, Default)]
pub struct OptimizerConfigBuilder {
    config: OptimizerConfig,
}

impl OptimizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cutoff(mut self, cutoff: usize) -> Self {
        self.config.cutoff = cutoff;
        self
    }

    pub fn theta(mut self, theta: f64) -> Self {
        self.config.theta = theta;
        self
    }

    pub fn penalty(mut self, penalty: f64) -> Self {
        self.config.penalty = penalty;
        self
    }

    pub fn reps(mut self, reps: usize) -> Self {
        self.config.reps = reps;
        self
    }

    pub fn step_size(mut self, step_size: f64) -> Self {
        self.config.step_size = step_size;
        self
    }

    /// Sets both Adam decay rates.
    pub fn betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.config.beta1 = beta1;
        self.config.beta2 = beta2;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn report_interval(mut self, interval: usize) -> Self {
        self.config.report_interval = interval;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn initial_support(mut self, support: usize) -> Self {
        self.config.initial_support = support;
        self
    }

    pub fn normalization(mut self, policy: NormalizationPolicy) -> Self {
        self.config.normalization = policy;
        self
    }

    pub fn leakage_tolerance(mut self, tolerance: f64) -> Self {
        self.config.leakage_tolerance = tolerance;
        self
    }

    pub fn early_stop(mut self, window: usize, tolerance: f64) -> Self {
        self.config.early_stop = Some(EarlyStop { window, tolerance });
        self
    }

    pub fn recenter_inputs(mut self, recenter: bool) -> Self {
        self.config.recenter_inputs = recenter;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<OptimizerConfig, DisentangleError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(result: Result<OptimizerConfig, DisentangleError>, needle: &str) {
        match result {
            Err(DisentangleError::InvalidConfiguration { message }) => {
                assert!(message.contains(needle), "message '{}' does not mention '{}'", message, needle)
            }
            other => panic!("expected InvalidConfiguration mentioning '{}', got {:?}", needle, other),
        }
    }

    #[test]
    fn test_defaults_are_valid() -> Result<(), DisentangleError> {
        let config = OptimizerConfig::default();
        config.validate()?;
        assert_eq!(config.cutoff, 30);
        assert_eq!(config.reps, 1201);
        assert_eq!(config.normalization, NormalizationPolicy::None);
        assert!(config.early_stop.is_none());
        Ok(())
    }

    #[test]
    fn test_builder_sets_fields() -> Result<(), DisentangleError> {
        let config = OptimizerConfig::builder()
            .cutoff(12)
            .reps(40)
            .seed(7)
            .normalization(NormalizationPolicy::Renormalize)
            .early_stop(10, 1e-9)
            .build()?;
        assert_eq!(config.cutoff, 12);
        assert_eq!(config.reps, 40);
        assert_eq!(config.seed, 7);
        assert_eq!(config.normalization, NormalizationPolicy::Renormalize);
        assert_eq!(config.early_stop, Some(EarlyStop { window: 10, tolerance: 1e-9 }));
        Ok(())
    }

    #[test]
    fn test_malformed_configs_are_rejected() {
        assert_invalid(OptimizerConfig::builder().cutoff(1).initial_support(1).build(), "cutoff");
        assert_invalid(OptimizerConfig::builder().reps(0).build(), "reps");
        assert_invalid(OptimizerConfig::builder().step_size(0.0).build(), "step_size");
        assert_invalid(OptimizerConfig::builder().betas(1.0, 0.999).build(), "beta1");
        assert_invalid(OptimizerConfig::builder().betas(0.9, -0.1).build(), "beta2");
        assert_invalid(OptimizerConfig::builder().report_interval(0).build(), "report_interval");
        assert_invalid(OptimizerConfig::builder().cutoff(8).build(), "initial_support");
        assert_invalid(OptimizerConfig::builder().theta(f64::NAN).build(), "theta");
        assert_invalid(OptimizerConfig::builder().penalty(-1.0).build(), "penalty");
        assert_invalid(OptimizerConfig::builder().early_stop(0, 1e-6).build(), "window");
    }
}
