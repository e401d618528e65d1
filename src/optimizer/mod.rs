// src/optimizer/mod.rs

//! Gradient-based driver that searches for the trainable state minimizing entanglement.
//!
//! The [`Optimizer`] owns the whole optimization context: configuration, gradient
//! source, the real and imaginary parameter vectors, Adam moments and the cost history.
//! It maximizes the cost by handing Adam the gradient of `−cost`.

mod adam;
mod config;
mod observer;
mod results;

pub use adam::Adam;
pub use config::{EarlyStop, NormalizationPolicy, OptimizerConfig, OptimizerConfigBuilder};
pub use observer::{ProgressLog, ProgressObserver, ProgressReport, TracingObserver};
pub use results::OptimizationResult;

use crate::core::constants::ZERO_NORM;
use crate::core::{DisentangleError, TruncatedState};
use crate::cost::CostFunctional;
use crate::fock::FockOperators;
use crate::gradient::{EntanglementObjective, GradientSource};
use crate::mixing::TwoModeMixer;
use crate::preparation;
use crate::validation;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Explicit optimization context.
#[derive(Debug, Clone)]
pub struct Optimizer<G: GradientSource = EntanglementObjective> {
    config: OptimizerConfig,
    source: G,
    /// `[re_0 .. re_{d-1}, im_0 .. im_{d-1}]`.
    params: Vec<f64>,
    adam: Adam,
    iteration: usize,
    cost_history: Vec<f64>,
    last_report: Option<ProgressReport>,
    max_leakage: f64,
    leakage_warned: bool,
}

impl Optimizer<EntanglementObjective> {
    /// Sets up a run against `input` from a seeded random initial guess.
    ///
    /// The guess populates the first `initial_support` Fock levels with complex Gaussian
    /// amplitudes drawn from `StdRng::seed_from_u64(config.seed)`.
    pub fn new(config: OptimizerConfig, input: &TruncatedState) -> Result<Self, DisentangleError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let guess = preparation::random_state(config.initial_support, config.cutoff, &mut rng)?;
        Self::with_initial_state(config, input, &guess)
    }

    /// Sets up a run against `input` from an explicit initial guess.
    pub fn with_initial_state(
        config: OptimizerConfig,
        input: &TruncatedState,
        guess: &TruncatedState,
    ) -> Result<Self, DisentangleError> {
        config.validate()?;
        input.ensure_dim(config.cutoff)?;
        guess.ensure_dim(config.cutoff)?;

        let ops = FockOperators::new(config.cutoff)?;
        let (fixed, initial) = if config.recenter_inputs {
            (preparation::recenter(input, &ops)?, preparation::recenter(guess, &ops)?)
        } else {
            (preparation::normalize(input)?, preparation::normalize(guess)?)
        };

        let mixer = TwoModeMixer::new(fixed, config.theta)?;
        let source = EntanglementObjective::from_parts(mixer, ops, CostFunctional::new(config.penalty))?;
        Self::with_gradient_source(config, source, &initial)
    }
}

impl<G: GradientSource> Optimizer<G> {
    /// Sets up a run over any gradient capability, starting exactly at `initial`.
    pub fn with_gradient_source(config: OptimizerConfig, source: G, initial: &TruncatedState) -> Result<Self, DisentangleError> {
        config.validate()?;
        if source.dim() != config.cutoff {
            return Err(DisentangleError::DimensionMismatch { expected: config.cutoff, found: source.dim() });
        }
        initial.ensure_dim(config.cutoff)?;
        validation::check_finite(initial)?;

        let mut params = initial.real_parts();
        params.extend(initial.imag_parts());
        let adam = Adam::new(params.len(), config.step_size, config.beta1, config.beta2, config.epsilon);

        tracing::debug!(
            cutoff = config.cutoff,
            theta = config.theta,
            penalty = config.penalty,
            reps = config.reps,
            normalization = %config.normalization,
            "optimizer initialized"
        );

        Ok(Self {
            cost_history: Vec::with_capacity(config.reps),
            config,
            source,
            params,
            adam,
            iteration: 0,
            last_report: None,
            max_leakage: 0.0,
            leakage_warned: false,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn source(&self) -> &G {
        &self.source
    }

    /// Iterations performed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn cost_history(&self) -> &[f64] {
        &self.cost_history
    }

    /// Report describing the most recent iteration.
    pub fn last_report(&self) -> Option<&ProgressReport> {
        self.last_report.as_ref()
    }

    /// Largest leaked fraction seen so far.
    pub fn max_leakage(&self) -> f64 {
        self.max_leakage
    }

    /// Euclidean norm of the trainable amplitudes.
    pub fn parameter_norm(&self) -> f64 {
        self.params.iter().map(|p| p * p).sum::<f64>().sqrt()
    }

    /// The current trainable state.
    pub fn current_state(&self) -> Result<TruncatedState, DisentangleError> {
        let (re, im) = self.params.split_at(self.config.cutoff);
        TruncatedState::from_parts(re, im)
    }

    /// Runs one iteration and returns the cost recorded for it.
    ///
    /// The cost and gradient are evaluated at the current parameters and checked for
    /// finiteness. Adam then moves a copy of the parameters uphill in cost. The cost,
    /// the new parameters and the moment estimates are committed together, so a failed
    /// iteration leaves the optimizer exactly as it was.
    ///
    /// # Errors
    /// * `Divergence` if the cost or any gradient entry is not finite, or if the
    ///   updated parameters cannot be renormalized.
    /// * Any error the gradient source reports.
    pub fn step(&mut self) -> Result<f64, DisentangleError> {
        let iteration = self.iteration;
        let (re, im) = self.params.split_at(self.config.cutoff);
        let eval = self.source.value_and_gradient(re, im)?;

        if !eval.value.is_finite() {
            return Err(DisentangleError::Divergence {
                iteration,
                message: format!("cost evaluated to {}", eval.value),
            });
        }
        if let Some(k) = validation::first_non_finite(&eval.grad_re).or(validation::first_non_finite(&eval.grad_im)) {
            return Err(DisentangleError::Divergence {
                iteration,
                message: format!("gradient component {} is not finite", k),
            });
        }

        let loss_grad: Vec<f64> = eval.grad_re.iter().chain(&eval.grad_im).map(|g| -g).collect();
        let mut params = self.params.clone();
        let mut adam = self.adam.clone();
        adam.step(&mut params, &loss_grad)?;

        if self.config.normalization == NormalizationPolicy::Renormalize {
            let norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();
            if !norm.is_finite() || norm <= ZERO_NORM {
                return Err(DisentangleError::Divergence {
                    iteration,
                    message: format!("cannot renormalize parameters with norm {}", norm),
                });
            }
            params.iter_mut().for_each(|p| *p /= norm);
        }

        self.last_report = Some(ProgressReport {
            iteration,
            cost: eval.value,
            leakage: eval.leakage,
            parameter_norm: self.parameter_norm(),
        });
        self.cost_history.push(eval.value);
        if let Some(leakage) = eval.leakage {
            self.track_leakage(iteration, leakage);
        }
        self.params = params;
        self.adam = adam;
        self.iteration += 1;
        Ok(eval.value)
    }

    /// Iterates until `reps` iterations have run or the early-stop criterion fires.
    ///
    /// The observer sees iteration 0 and every `report_interval`-th iteration.
    pub fn run<O: ProgressObserver + ?Sized>(&mut self, observer: &mut O) -> Result<OptimizationResult, DisentangleError> {
        let mut stopped_early = false;
        while self.iteration < self.config.reps {
            let iteration = self.iteration;
            self.step()?;

            if iteration % self.config.report_interval == 0 {
                if let Some(report) = &self.last_report {
                    observer.observe(report);
                }
            }
            if self.plateaued() {
                tracing::debug!(iteration, "cost plateaued, stopping early");
                stopped_early = true;
                break;
            }
        }
        self.result(stopped_early)
    }

    fn track_leakage(&mut self, iteration: usize, leakage: f64) {
        self.max_leakage = self.max_leakage.max(leakage);
        if leakage > self.config.leakage_tolerance && !self.leakage_warned {
            tracing::warn!(
                iteration,
                leakage,
                tolerance = self.config.leakage_tolerance,
                "probability is leaking past the Fock cutoff; consider a larger cutoff"
            );
            self.leakage_warned = true;
        }
    }

    fn plateaued(&self) -> bool {
        let Some(stop) = self.config.early_stop else {
            return false;
        };
        let n = self.cost_history.len();
        n > stop.window && (self.cost_history[n - 1] - self.cost_history[n - 1 - stop.window]).abs() < stop.tolerance
    }

    fn result(&self, stopped_early: bool) -> Result<OptimizationResult, DisentangleError> {
        let (re, im) = self.params.split_at(self.config.cutoff);
        let final_cost = self.source.value(re, im)?;
        let final_state = self.current_state()?;
        Ok(OptimizationResult {
            final_parameter_norm: final_state.norm(),
            final_state,
            cost_history: self.cost_history.clone(),
            final_cost,
            iterations: self.iteration,
            max_leakage: self.max_leakage,
            stopped_early,
        })
    }
}
