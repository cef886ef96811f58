//! # sdefit
//!
//! One-dimensional stochastic differential equation models with exact
//! transition densities, fitted to observed series by maximum likelihood.
//!
//! This crate is a **façade** that re-exports the workspace crates.
//! Application code should depend on it rather than the individual
//! `sde-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use sdefit::models::{CirModel, ProcessModel};
//!
//! let cir = CirModel::new(2.0, 0.05, 0.1);
//! let p = cir.exact_density(0.04, 0.045, 0.0, 0.25).unwrap();
//! assert!(p.is_finite() && p > 0.0);
//! assert!(cir.is_positive());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, error definitions, and data ingestion.
pub use sde_core as core;

/// Special functions, optimisation, and statistics.
pub use sde_math as math;

/// The model contract, the CIR model, and calibration.
pub use sde_models as models;

/// Commonly used items.
pub mod prelude {
    pub use sde_core::{read_delimited, DataTable, Error, Real, Result, Size, Time};
    pub use sde_math::{
        Bounds, GradientMinimizer, MinimizationMethod, Minimizer, MinimizerOptions,
        OptimizationResult,
    };
    pub use sde_models::{CirModel, ExactMleCalibrator, ModelState, ProcessModel, SimulationMethod};
}
