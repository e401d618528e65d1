// src/core/mod.rs

//! Core data structures and types

pub mod error;
pub mod state;
pub mod constants;

// Re-export public types for convenient access via `disentangle::core::TypeName`
pub use error::DisentangleError;
pub use state::TruncatedState;
pub use constants::{defaults, MIN_TRACE};
