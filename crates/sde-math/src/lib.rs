//! # sde-math
//!
//! Mathematical utilities: the exponentially scaled modified Bessel
//! function, bounded gradient-based optimisation (inverse Hessian over
//! nalgebra), and sample statistics (moments via statrs).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Objective functions, bounds, and minimizers.
pub mod optimization;

/// Special functions.
pub mod special_functions;

/// Sample moments, error metrics, and empirical hitting times.
pub mod statistics;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use optimization::{
    Bounds, GradientMinimizer, MinimizationMethod, Minimizer, MinimizerOptions,
    ObjectiveFunction, OptimizationResult,
};
pub use special_functions::{bessel_i_scaled, ln_bessel_i_scaled};
pub use statistics::{
    first_hitting_index, fraction_at_or_above, mean_squared_error, moments, Moments,
};
