// src/core/constants.rs

//! Default numeric parameters for the mixing problem and the optimizer.

/// Defaults shared by `OptimizerConfig` and the cost functional.
pub mod defaults {
    /// Fock truncation dimension of a single mode.
    pub const CUTOFF: usize = 30;
    /// Beamsplitter mixing angle (50:50).
    pub const THETA: f64 = std::f64::consts::FRAC_PI_4;
    /// Weight of the squared quadrature-mean penalty.
    pub const PENALTY: f64 = 10.0;
    /// Fixed iteration budget.
    pub const REPS: usize = 1201;
    /// Adam step size.
    pub const STEP_SIZE: f64 = 1e-2;
    /// Adam first-moment decay.
    pub const BETA1: f64 = 0.9;
    /// Adam second-moment decay.
    pub const BETA2: f64 = 0.999;
    /// Adam denominator guard.
    pub const EPSILON: f64 = 1e-8;
    /// Progress is reported at iteration 0 and every this many iterations.
    pub const REPORT_INTERVAL: usize = 50;
    /// Number of leading Fock amplitudes populated in the random initial guess.
    pub const INITIAL_SUPPORT: usize = 10;
    /// Seed for the random initial guess.
    pub const SEED: u64 = 42;
    /// Leaked probability above which a truncation warning is logged.
    pub const LEAKAGE_TOLERANCE: f64 = 1e-3;
}

/// Smallest reduced-operator trace accepted as a cost denominator.
pub const MIN_TRACE: f64 = 1e-12;

/// Tolerance below which a state norm is treated as zero.
pub const ZERO_NORM: f64 = 1e-300;
