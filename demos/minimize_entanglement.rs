//! Example: search for the state that leaves a 50:50 beamsplitter least entangled with
//! the input (|0> + |1>)/sqrt(2).
//!
//! Run with `RUST_LOG=info` to see the progress events; `RUST_LOG=debug` also shows setup.

use disentangle::{
    analyze, preparation, DisentangleError, FockOperators, NormalizationPolicy, Optimizer, OptimizerConfig,
    ProgressReport,
};
use num_complex::Complex64;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), DisentangleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("--- disentangle Example: Minimizing Beamsplitter Entanglement ---");

    let config = OptimizerConfig::builder()
        .cutoff(30)
        .penalty(10.0)
        .reps(1201)
        .normalization(NormalizationPolicy::None)
        .build()?;
    let cutoff = config.cutoff;

    // Fixed input: equal superposition of vacuum and one photon.
    let input = preparation::superposition(&[Complex64::new(1.0, 0.0), Complex64::new(1.0, 0.0)], cutoff)?;
    println!("\nInput state: {}", input);
    println!("Beamsplitter angle: {:.4} rad, penalty: {}, iterations: {}", config.theta, config.penalty, config.reps);

    let mut optimizer = Optimizer::new(config, &input)?;
    println!("\nRunning optimization...");
    let result = optimizer.run(&mut |report: &ProgressReport| println!("  {}", report))?;

    println!("\n{}", result);

    let analysis = analyze(&result.final_state, &FockOperators::new(cutoff)?)?;
    println!("{}", analysis);
    println!(
        "Equivalent squeezed vacuum: r = {:.4} (mean photon number {:.4})",
        analysis.squeezing_parameter, analysis.mean_photon_number
    );

    println!("\n--- Example Finished ---");
    Ok(())
}
