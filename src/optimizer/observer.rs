// src/optimizer/observer.rs

use std::fmt;

/// Snapshot handed to observers at iteration 0 and every `report_interval` iterations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub iteration: usize,
    /// Cost of the parameters before this iteration's update.
    pub cost: f64,
    /// Leaked probability fraction, if the gradient source tracks it.
    pub leakage: Option<f64>,
    /// Euclidean norm of the trainable amplitudes.
    pub parameter_norm: f64,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cost at step {}: {:.10} (norm {:.6}", self.iteration, self.cost, self.parameter_norm)?;
        if let Some(leakage) = self.leakage {
            write!(f, ", leakage {:.2e}", leakage)?;
        }
        write!(f, ")")
    }
}

/// Receives progress reports from [`super::Optimizer::run`].
pub trait ProgressObserver {
    fn observe(&mut self, report: &ProgressReport);
}

impl<F: FnMut(&ProgressReport)> ProgressObserver for F {
    fn observe(&mut self, report: &ProgressReport) {
        self(report)
    }
}

/// Emits every report as a `tracing` info event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn observe(&mut self, report: &ProgressReport) {
        tracing::info!(
            iteration = report.iteration,
            cost = report.cost,
            parameter_norm = report.parameter_norm,
            leakage = ?report.leakage,
            "optimization progress"
        );
    }
}

/// Collects reports in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressLog {
    reports: Vec<ProgressReport>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[ProgressReport] {
        &self.reports
    }

    pub fn last(&self) -> Option<&ProgressReport> {
        self.reports.last()
    }

    pub fn into_reports(self) -> Vec<ProgressReport> {
        self.reports
    }
}

impl ProgressObserver for ProgressLog {
    fn observe(&mut self, report: &ProgressReport) {
        self.reports.push(*report);
    }
}
