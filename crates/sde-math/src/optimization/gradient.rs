//! Bounded gradient-based minimizer.
//!
//! A projected quasi-Newton method in the spirit of L-BFGS-B with a dense
//! inverse Hessian:
//!
//! 1. variables sitting on a bound whose gradient pushes outward are held
//!    fixed for the iteration (the active set);
//! 2. the search direction `−H⁻¹·∇f` (or `−∇f`) is restricted to the free
//!    variables;
//! 3. a backtracking Armijo line search runs along the projected path
//!    `P(x + α·d)`;
//! 4. the BFGS update of `H⁻¹` is skipped when the curvature condition
//!    `sᵀy > 0` fails.
//!
//! Gradients are central finite differences, one-sided next to a bound so
//! the objective is never evaluated outside the box.

use super::{resolve_bounds, Bounds, MinimizationMethod, Minimizer, MinimizerOptions};
use super::{ObjectiveFunction, OptimizationResult};
use nalgebra::{DMatrix, DVector};
use sde_core::{errors::Result, Real};
use tracing::{debug, info};

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C1: Real = 1e-4;

/// Maximum number of step halvings per line search.
const MAX_LINE_SEARCH_STEPS: usize = 60;

/// Relative finite-difference step, `ε^{1/3}` for central differences.
const FD_RELATIVE_STEP: Real = 6.055_454_452_393_343e-6;

/// Bounded gradient-based minimizer.
///
/// # Example
/// ```
/// use sde_math::{GradientMinimizer, Minimizer};
/// let f = |p: &[f64]| (p[0] - 3.0).powi(2) + (p[1] + 1.0).powi(2);
/// let res = GradientMinimizer::new().minimize(&f, None, &[0.0, 0.0]).unwrap();
/// assert!(res.success());
/// assert!((res.params()[0] - 3.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GradientMinimizer {
    method: MinimizationMethod,
    tolerance: Real,
    options: MinimizerOptions,
}

impl GradientMinimizer {
    /// Create a minimizer with the default method, a function tolerance of
    /// `5e-3`, and default options.
    pub fn new() -> Self {
        Self {
            method: MinimizationMethod::default(),
            tolerance: 5e-3,
            options: MinimizerOptions::default(),
        }
    }

    /// Set the search-direction rule.
    pub fn with_method(mut self, method: MinimizationMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the function tolerance.
    pub fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the stopping/reporting options.
    pub fn with_options(mut self, options: MinimizerOptions) -> Self {
        self.options = options;
        self
    }

    /// Search-direction rule.
    pub fn method(&self) -> MinimizationMethod {
        self.method
    }

    /// Function tolerance.
    pub fn tolerance(&self) -> Real {
        self.tolerance
    }

    /// Stopping/reporting options.
    pub fn options(&self) -> &MinimizerOptions {
        &self.options
    }

    fn finish(
        &self,
        x: DVector<Real>,
        value: Real,
        success: bool,
        message: String,
        iterations: usize,
        evaluations: usize,
    ) -> OptimizationResult {
        if self.options.verbosity >= 1 {
            info!(
                method = %self.method,
                success,
                iterations,
                evaluations,
                value,
                status = %message,
                "minimization finished"
            );
        }
        OptimizationResult::new(x.as_slice().to_vec(), value, success, message)
            .with_counts(iterations, evaluations)
    }
}

impl Default for GradientMinimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Minimizer for GradientMinimizer {
    fn minimize(
        &self,
        objective: &dyn ObjectiveFunction,
        bounds: Option<&Bounds>,
        guess: &[Real],
    ) -> Result<OptimizationResult> {
        let bounds = resolve_bounds(bounds, guess)?;
        let n = guess.len();
        let opts = &self.options;
        let mut evaluations = 0usize;

        let mut x = DVector::from_column_slice(guess);
        bounds.project(x.as_mut_slice());

        let mut f = objective.value(x.as_slice());
        evaluations += 1;
        if !f.is_finite() {
            return Ok(self.finish(
                x,
                f,
                false,
                "objective is not finite at the initial guess".into(),
                0,
                evaluations,
            ));
        }

        let mut g = numerical_gradient(objective, &x, f, &bounds, &mut evaluations);
        let mut h_inv = DMatrix::<Real>::identity(n, n);

        for iteration in 1..=opts.max_iterations {
            if g.iter().any(|v| !v.is_finite()) {
                return Ok(self.finish(
                    x,
                    f,
                    false,
                    "finite-difference gradient is not finite".into(),
                    iteration - 1,
                    evaluations,
                ));
            }

            let pg_norm = projected_gradient_norm(&x, &g, &bounds);
            if pg_norm <= opts.gradient_tolerance {
                return Ok(self.finish(
                    x,
                    f,
                    true,
                    "projected gradient below tolerance".into(),
                    iteration - 1,
                    evaluations,
                ));
            }

            let free = free_variables(&x, &g, &bounds);

            let mut d = match self.method {
                MinimizationMethod::ProjectedBfgs => -(&h_inv * &g),
                MinimizationMethod::ProjectedGradient => -g.clone(),
            };
            restrict(&mut d, &free);
            let mut slope = g.dot(&d);
            if !(slope < 0.0) {
                // H⁻¹ restricted to the free set lost positive definiteness
                h_inv = DMatrix::identity(n, n);
                d = -g.clone();
                restrict(&mut d, &free);
                slope = g.dot(&d);
            }
            if !(slope < 0.0) {
                return Ok(self.finish(
                    x,
                    f,
                    true,
                    "no descent direction within the bounds".into(),
                    iteration - 1,
                    evaluations,
                ));
            }

            // Backtracking line search along the projected path
            let mut alpha: Real = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_LINE_SEARCH_STEPS {
                let mut trial = &x + &d * alpha;
                bounds.project(trial.as_mut_slice());
                let f_trial = objective.value(trial.as_slice());
                evaluations += 1;
                let decrease = g.dot(&(&trial - &x));
                if f_trial.is_finite() && f_trial <= f + ARMIJO_C1 * decrease {
                    accepted = Some((trial, f_trial));
                    break;
                }
                alpha *= 0.5;
            }

            let Some((x_new, f_new)) = accepted else {
                return Ok(self.finish(
                    x,
                    f,
                    false,
                    "line search failed to reduce the objective".into(),
                    iteration,
                    evaluations,
                ));
            };

            let g_new = numerical_gradient(objective, &x_new, f_new, &bounds, &mut evaluations);
            let s = &x_new - &x;
            let y = &g_new - &g;

            if self.method == MinimizationMethod::ProjectedBfgs {
                let sy = s.dot(&y);
                if sy > Real::EPSILON * s.norm() * y.norm() {
                    update_inverse_hessian(&mut h_inv, &s, &y, 1.0 / sy);
                }
            }

            let step = s.amax();
            let df = (f - f_new).abs();
            x = x_new;
            f = f_new;
            g = g_new;

            if opts.verbosity >= 2 {
                debug!(
                    iteration,
                    value = f,
                    step,
                    alpha,
                    projected_gradient = pg_norm,
                    "minimizer iteration"
                );
            }

            if step <= opts.parameter_tolerance * (1.0 + x.amax())
                && df <= self.tolerance * (1.0 + f.abs())
            {
                return Ok(self.finish(
                    x,
                    f,
                    true,
                    "parameter and function tolerance satisfied".into(),
                    iteration,
                    evaluations,
                ));
            }
        }

        Ok(self.finish(
            x,
            f,
            false,
            format!(
                "maximum number of iterations ({}) exceeded",
                opts.max_iterations
            ),
            opts.max_iterations,
            evaluations,
        ))
    }
}

/// Central finite-difference gradient, one-sided where a bound is within
/// one step. `fx` is the objective at `x`.
fn numerical_gradient(
    objective: &dyn ObjectiveFunction,
    x: &DVector<Real>,
    fx: Real,
    bounds: &Bounds,
    evaluations: &mut usize,
) -> DVector<Real> {
    let n = x.len();
    let (lower, upper) = (bounds.lower(), bounds.upper());
    let mut grad = DVector::zeros(n);
    let mut point = x.clone();

    for i in 0..n {
        let xi = x[i];
        let h = FD_RELATIVE_STEP * xi.abs().max(1.0);
        let up_ok = xi + h <= upper[i];
        let down_ok = xi - h >= lower[i];

        let mut eval = |v: Real| {
            point[i] = v;
            *evaluations += 1;
            let fv = objective.value(point.as_slice());
            point[i] = xi;
            fv
        };

        grad[i] = if up_ok && down_ok {
            (eval(xi + h) - eval(xi - h)) / (2.0 * h)
        } else if up_ok {
            (eval(xi + h) - fx) / h
        } else if down_ok {
            (fx - eval(xi - h)) / h
        } else {
            // bounds tighter than one step: the variable is pinned
            0.0
        };
    }
    grad
}

/// `‖x − P(x − ∇f)‖∞`, zero exactly at a first-order critical point of the
/// bounded problem.
fn projected_gradient_norm(x: &DVector<Real>, g: &DVector<Real>, bounds: &Bounds) -> Real {
    x.iter()
        .zip(g.iter())
        .zip(bounds.lower().iter().zip(bounds.upper()))
        .map(|((&xi, &gi), (&lo, &hi))| (xi - (xi - gi).clamp(lo, hi)).abs())
        .fold(0.0, Real::max)
}

/// Variables not held at a bound by an outward-pointing gradient.
fn free_variables(x: &DVector<Real>, g: &DVector<Real>, bounds: &Bounds) -> Vec<bool> {
    x.iter()
        .zip(g.iter())
        .zip(bounds.lower().iter().zip(bounds.upper()))
        .map(|((&xi, &gi), (&lo, &hi))| !((xi <= lo && gi > 0.0) || (xi >= hi && gi < 0.0)))
        .collect()
}

fn restrict(d: &mut DVector<Real>, free: &[bool]) {
    for (di, &is_free) in d.iter_mut().zip(free) {
        if !is_free {
            *di = 0.0;
        }
    }
}

/// `H⁻¹ ← (I − ρ·s·yᵀ) · H⁻¹ · (I − ρ·y·sᵀ) + ρ·s·sᵀ`
fn update_inverse_hessian(h: &mut DMatrix<Real>, s: &DVector<Real>, y: &DVector<Real>, rho: Real) {
    let n = s.len();
    let eye = DMatrix::<Real>::identity(n, n);
    let left = &eye - s * y.transpose() * rho;
    let right = &eye - y * s.transpose() * rho;
    *h = &left * &*h * &right + s * s.transpose() * rho;
}
