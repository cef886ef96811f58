//! Optimization framework.
//!
//! Provides the objective-function abstraction, per-parameter bounds, the
//! [`Minimizer`] contract, and the bounded quasi-Newton
//! [`GradientMinimizer`]. Calibration code only ever sees `dyn Minimizer`,
//! so any model can be fitted by any optimizer.

mod gradient;

pub use gradient::GradientMinimizer;

use sde_core::{
    errors::{Error, Result},
    Real,
};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ── Objective function trait ─────────────────────────────────────────────────

/// A scalar objective `f: ℝⁿ → ℝ`.
///
/// Implemented for every `Fn(&[Real]) -> Real`, so closures can be passed
/// directly. Non-finite values are allowed and mark points the minimizer
/// must not move to.
pub trait ObjectiveFunction {
    /// Evaluate the objective at `x`.
    fn value(&self, x: &[Real]) -> Real;
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&[Real]) -> Real,
{
    fn value(&self, x: &[Real]) -> Real {
        self(x)
    }
}

// ── Bounds ────────────────────────────────────────────────────────────────────

/// Box constraints `lower[i] ≤ x[i] ≤ upper[i]`.
///
/// An unbounded side is spelled with a signed infinity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    lower: Vec<Real>,
    upper: Vec<Real>,
}

impl Bounds {
    /// Build bounds from `(lower, upper)` pairs, one per parameter.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if a bound is NaN or `lower > upper`.
    pub fn new(pairs: Vec<(Real, Real)>) -> Result<Self> {
        let mut lower = Vec::with_capacity(pairs.len());
        let mut upper = Vec::with_capacity(pairs.len());
        for (i, (lo, hi)) in pairs.into_iter().enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(Error::InvalidArgument(format!(
                    "invalid bound at index {i}: [{lo}, {hi}]"
                )));
            }
            lower.push(lo);
            upper.push(hi);
        }
        Ok(Self { lower, upper })
    }

    /// `n` parameters without any constraint.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![Real::NEG_INFINITY; n],
            upper: vec![Real::INFINITY; n],
        }
    }

    /// Number of parameters covered.
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Return `true` if no parameters are covered.
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Lower bounds.
    pub fn lower(&self) -> &[Real] {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &[Real] {
        &self.upper
    }

    /// Return `true` if every component of `x` lies within its bounds.
    pub fn contains(&self, x: &[Real]) -> bool {
        x.len() == self.len()
            && x
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// Clamp `x` onto the box in place.
    pub fn project(&self, x: &mut [Real]) {
        for (v, (&lo, &hi)) in x.iter_mut().zip(self.lower.iter().zip(&self.upper)) {
            *v = v.clamp(lo, hi);
        }
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Stopping and reporting options for [`GradientMinimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MinimizerOptions {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Stop when the infinity norm of the projected gradient drops below this.
    pub gradient_tolerance: Real,
    /// Stop when the step (relative to `1 + ‖x‖∞`) drops below this and the
    /// function tolerance is met as well.
    pub parameter_tolerance: Real,
    /// 0: silent, 1: summary on termination, 2+: one line per iteration.
    pub verbosity: u8,
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            gradient_tolerance: 1e-6,
            parameter_tolerance: 1e-4,
            verbosity: 1,
        }
    }
}

/// Search-direction rule of [`GradientMinimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MinimizationMethod {
    /// Quasi-Newton (BFGS inverse Hessian) direction restricted to the free
    /// variables, projected line search.
    #[default]
    ProjectedBfgs,
    /// Steepest descent restricted to the free variables, projected line
    /// search.
    ProjectedGradient,
}

impl MinimizationMethod {
    /// Canonical name, accepted by `FromStr`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MinimizationMethod::ProjectedBfgs => "projected-bfgs",
            MinimizationMethod::ProjectedGradient => "projected-gradient",
        }
    }
}

impl fmt::Display for MinimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinimizationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "projected-bfgs" | "bfgs" => Ok(MinimizationMethod::ProjectedBfgs),
            "projected-gradient" | "gradient" | "steepest-descent" => {
                Ok(MinimizationMethod::ProjectedGradient)
            }
            other => Err(Error::InvalidArgument(format!(
                "unknown minimization method '{other}'"
            ))),
        }
    }
}

// ── Result ────────────────────────────────────────────────────────────────────

/// Outcome of a single `minimize` call.
///
/// `params` and `value` always hold the best point found, whether or not
/// the routine converged.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult {
    params: Vec<Real>,
    value: Real,
    success: bool,
    message: String,
    iterations: usize,
    evaluations: usize,
}

impl OptimizationResult {
    /// Create a result record.
    pub fn new(params: Vec<Real>, value: Real, success: bool, message: impl Into<String>) -> Self {
        Self {
            params,
            value,
            success,
            message: message.into(),
            iterations: 0,
            evaluations: 0,
        }
    }

    /// Attach iteration and objective-evaluation counts.
    pub fn with_counts(mut self, iterations: usize, evaluations: usize) -> Self {
        self.iterations = iterations;
        self.evaluations = evaluations;
        self
    }

    /// Optimal (best found) parameters.
    pub fn params(&self) -> &[Real] {
        &self.params
    }

    /// Consume the result and return the parameters.
    pub fn into_params(self) -> Vec<Real> {
        self.params
    }

    /// Objective value at [`params`](Self::params).
    pub fn value(&self) -> Real {
        self.value
    }

    /// `true` iff the routine reported convergence.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Human-readable termination status.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of iterations performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of objective evaluations, finite differences included.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

// ── Minimizer contract ────────────────────────────────────────────────────────

/// A parameter optimizer.
///
/// Implementations must be stateless across calls. Non-convergence is
/// reported through [`OptimizationResult::success`], never as an error.
pub trait Minimizer: fmt::Debug + Send + Sync {
    /// Minimize `objective` starting from `guess`.
    ///
    /// `bounds`, if given, must be index-aligned with `guess`.
    ///
    /// # Errors
    /// `Error::InvalidArgument` for an empty guess or misaligned bounds.
    fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        bounds: Option<&Bounds>,
        guess: &[Real],
    ) -> Result<OptimizationResult>;
}

/// Check the shared preconditions of [`Minimizer::minimize`] and return the
/// effective bounds.
pub(crate) fn resolve_bounds(bounds: Option<&Bounds>, guess: &[Real]) -> Result<Bounds> {
    if guess.is_empty() {
        return Err(Error::InvalidArgument("initial guess is empty".into()));
    }
    match bounds {
        Some(b) if b.len() != guess.len() => Err(Error::InvalidArgument(format!(
            "bounds cover {} parameters, initial guess has {}",
            b.len(),
            guess.len()
        ))),
        Some(b) => Ok(b.clone()),
        None => Ok(Bounds::unbounded(guess.len())),
    }
}
