//! # sde-models
//!
//! One-dimensional diffusion models `dX = μ(X,t) dt + σ(X,t) dW`.
//!
//! - [`ProcessModel`]: the model contract with finite-difference
//!   derivatives and the optional exact-density capability.
//! - [`CirModel`]: Cox-Ingersoll-Ross with its closed-form transition
//!   density.
//! - [`ExactMleCalibrator`]: maximum-likelihood fitting of any model with
//!   an exact density through any [`Minimizer`](sde_math::Minimizer).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// The model contract and its shared state.
pub mod process_model;

/// Cox-Ingersoll-Ross model.
pub mod cir;

/// Exact-density maximum-likelihood calibration.
pub mod calibration;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use calibration::ExactMleCalibrator;
pub use cir::CirModel;
pub use process_model::{ModelState, ProcessModel, SimulationMethod, FD_STEP};
