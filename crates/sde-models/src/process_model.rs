//! `ProcessModel`: the contract every one-dimensional SDE model implements.
//!
//! ```text
//! dX(t) = μ(X,t) dt + σ(X,t) dW(t)
//! ```
//!
//! A model supplies the drift `μ` and diffusion `σ`; everything else has a
//! default. Spatial and time derivatives fall back to finite differences
//! with step [`FD_STEP`], the exact transition density and exact simulation
//! step are optional capabilities, and the parameter vector lives in a
//! [`ModelState`] the model embeds.

use sde_core::{
    ensure,
    errors::{Error, Result},
    not_implemented, Real, Time,
};
use std::any::type_name;
use std::fmt;
use std::str::FromStr;

/// Step of the finite-difference derivatives.
pub const FD_STEP: Real = 1e-5;

// ── Simulation method ─────────────────────────────────────────────────────────

/// Discretization a simulator should prefer for a model.
///
/// Advisory only: nothing in this crate simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SimulationMethod {
    /// Euler-Maruyama.
    Euler,
    /// Milstein.
    #[default]
    Milstein,
    /// Exact sampling through [`ProcessModel::exact_step`].
    Exact,
}

impl SimulationMethod {
    /// Stable name: `"Euler"`, `"Milstein"` or `"Exact"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMethod::Euler => "Euler",
            SimulationMethod::Milstein => "Milstein",
            SimulationMethod::Exact => "Exact",
        }
    }
}

impl fmt::Display for SimulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(SimulationMethod::Euler),
            "milstein" => Ok(SimulationMethod::Milstein),
            "exact" => Ok(SimulationMethod::Exact),
            other => Err(Error::InvalidArgument(format!(
                "unknown simulation method '{other}'"
            ))),
        }
    }
}

// ── Model state ───────────────────────────────────────────────────────────────

/// Parameter vector and derived flags shared by every model.
///
/// The positivity flag is only ever written together with the parameter
/// vector it was computed from. Until the first [`update`](Self::update) it
/// is unset, and [`ProcessModel::is_positive`] evaluates the predicate on
/// the current parameters instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    params: Vec<Real>,
    positive: Option<bool>,
    has_exact_density: bool,
    default_sim_method: SimulationMethod,
}

impl ModelState {
    /// State holding `params`, with the positivity flag not yet evaluated.
    pub fn new(params: Vec<Real>, has_exact_density: bool) -> Self {
        Self {
            params,
            positive: None,
            has_exact_density,
            default_sim_method: SimulationMethod::default(),
        }
    }

    /// Override the advisory simulation method.
    pub fn with_default_sim_method(mut self, method: SimulationMethod) -> Self {
        self.default_sim_method = method;
        self
    }

    /// Current parameter vector.
    pub fn params(&self) -> &[Real] {
        &self.params
    }

    /// Positivity flag of the current parameter vector, if evaluated.
    pub fn is_positive(&self) -> Option<bool> {
        self.positive
    }

    /// Whether the owning model implements an exact density.
    pub fn has_exact_density(&self) -> bool {
        self.has_exact_density
    }

    /// Advisory simulation method.
    pub fn default_sim_method(&self) -> SimulationMethod {
        self.default_sim_method
    }

    /// Replace the parameter vector and its positivity flag together.
    pub fn update(&mut self, params: Vec<Real>, positive: bool) {
        self.params = params;
        self.positive = Some(positive);
    }
}

// ── Model contract ────────────────────────────────────────────────────────────

/// A one-dimensional SDE model `dX = μ(X,t) dt + σ(X,t) dW`.
///
/// Implementors provide [`drift`](Self::drift), [`diffusion`](Self::diffusion)
/// and access to their embedded [`ModelState`]. Concurrent reads through
/// `&self` are safe; parameter updates need `&mut self`.
pub trait ProcessModel: fmt::Debug + Send + Sync {
    /// Drift `μ(x, t)`.
    fn drift(&self, x: Real, t: Time) -> Real;

    /// Diffusion `σ(x, t)`, non-negative by convention.
    fn diffusion(&self, x: Real, t: Time) -> Real;

    /// Shared state.
    fn state(&self) -> &ModelState;

    /// Shared state, mutably.
    fn state_mut(&mut self) -> &mut ModelState;

    // ── Parameters ────────────────────────────────────────────────────────

    /// Current parameter vector.
    fn params(&self) -> &[Real] {
        self.state().params()
    }

    /// Replace the parameter vector and recompute the positivity flag.
    ///
    /// # Errors
    /// `Error::InvalidArgument` if `params` does not have the model's
    /// parameter count; the model is left unchanged.
    fn set_params(&mut self, params: Vec<Real>) -> Result<()> {
        let expected = self.state().params().len();
        if params.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "expected {expected} parameters, got {}",
                params.len()
            )));
        }
        let positive = self.positivity(&params);
        self.state_mut().update(params, positive);
        Ok(())
    }

    /// Whether `params` guarantee non-negative paths.
    ///
    /// Default: `false`, i.e. no positivity guarantee.
    fn positivity(&self, _params: &[Real]) -> bool {
        false
    }

    /// Positivity flag of the current parameters.
    fn is_positive(&self) -> bool {
        self.state()
            .is_positive()
            .unwrap_or_else(|| self.positivity(self.params()))
    }

    /// Advisory simulation method.
    fn default_sim_method(&self) -> SimulationMethod {
        self.state().default_sim_method()
    }

    // ── Exact transition density and step ────────────────────────────────

    /// Whether [`exact_density`](Self::exact_density) is implemented.
    fn has_exact_density(&self) -> bool {
        self.state().has_exact_density()
    }

    /// Transition density `p(xt, t0 + dt | x0, t0)`.
    ///
    /// # Errors
    /// `Error::NotImplemented` unless the model overrides it.
    fn exact_density(&self, _x0: Real, _xt: Real, _t0: Time, _dt: Time) -> Result<Real> {
        not_implemented!("exact transition density for {}", type_name::<Self>())
    }

    /// Natural log of [`exact_density`](Self::exact_density).
    ///
    /// Models whose density is computed in log space override this so that
    /// densities below the smallest `f64` keep a finite logarithm.
    ///
    /// # Errors
    /// As [`exact_density`](Self::exact_density).
    fn ln_exact_density(&self, x0: Real, xt: Real, t0: Time, dt: Time) -> Result<Real> {
        Ok(self.exact_density(x0, xt, t0, dt)?.ln())
    }

    /// Exact simulation step from `x` at `t` over `dt` with normal draw `dz`.
    ///
    /// # Errors
    /// `Error::NotImplemented` unless the model overrides it.
    fn exact_step(&self, _t: Time, _dt: Time, _x: Real, _dz: Real) -> Result<Real> {
        not_implemented!("exact simulation step for {}", type_name::<Self>())
    }

    /// Log-likelihood of an evenly spaced path under the exact density.
    ///
    /// Observation `i` is taken at time `i·dt`; the sum runs over
    /// [`ln_exact_density`](Self::ln_exact_density).
    ///
    /// # Errors
    /// `Error::NotImplemented` without an exact density;
    /// `Error::Precondition` for fewer than two observations or `dt ≤ 0`.
    fn log_likelihood(&self, path: &[Real], dt: Time) -> Result<Real> {
        if !self.has_exact_density() {
            not_implemented!(
                "log-likelihood needs an exact density, {} has none",
                type_name::<Self>()
            );
        }
        ensure!(
            path.len() >= 2,
            "log-likelihood needs at least two observations, got {}",
            path.len()
        );
        ensure!(dt > 0.0, "time step must be positive, got {dt}");

        let mut total = 0.0;
        for (i, pair) in path.windows(2).enumerate() {
            total += self.ln_exact_density(pair[0], pair[1], i as Real * dt, dt)?;
        }
        Ok(total)
    }

    // ── Derivatives ───────────────────────────────────────────────────────

    /// `∂μ/∂x` by central difference.
    fn drift_x(&self, x: Real, t: Time) -> Real {
        (self.drift(x + FD_STEP, t) - self.drift(x - FD_STEP, t)) / (2.0 * FD_STEP)
    }

    /// `∂μ/∂t` by forward difference.
    fn drift_t(&self, x: Real, t: Time) -> Real {
        (self.drift(x, t + FD_STEP) - self.drift(x, t)) / FD_STEP
    }

    /// `∂²μ/∂x²` by central difference.
    fn drift_xx(&self, x: Real, t: Time) -> Real {
        (self.drift(x + FD_STEP, t) - 2.0 * self.drift(x, t) + self.drift(x - FD_STEP, t))
            / (FD_STEP * FD_STEP)
    }

    /// `∂σ/∂x` by central difference.
    fn diffusion_x(&self, x: Real, t: Time) -> Real {
        (self.diffusion(x + FD_STEP, t) - self.diffusion(x - FD_STEP, t)) / (2.0 * FD_STEP)
    }

    /// `∂²σ/∂x²` by central difference.
    fn diffusion_xx(&self, x: Real, t: Time) -> Real {
        (self.diffusion(x + FD_STEP, t) - 2.0 * self.diffusion(x, t)
            + self.diffusion(x - FD_STEP, t))
            / (FD_STEP * FD_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    /// `μ = a·x² + b·t`, `σ = c·x`; relies on every default.
    #[derive(Debug, Clone)]
    struct PolynomialModel {
        state: ModelState,
    }

    impl PolynomialModel {
        fn new(a: Real, b: Real, c: Real) -> Self {
            Self {
                state: ModelState::new(vec![a, b, c], false),
            }
        }
    }

    impl ProcessModel for PolynomialModel {
        fn drift(&self, x: Real, t: Time) -> Real {
            let p = self.params();
            p[0] * x * x + p[1] * t
        }

        fn diffusion(&self, x: Real, _t: Time) -> Real {
            self.params()[2] * x
        }

        fn state(&self) -> &ModelState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut ModelState {
            &mut self.state
        }
    }

    /// Same dynamics, but always reports positive paths.
    #[derive(Debug, Clone)]
    struct PositiveModel(PolynomialModel);

    impl ProcessModel for PositiveModel {
        fn drift(&self, x: Real, t: Time) -> Real {
            self.0.drift(x, t)
        }

        fn diffusion(&self, x: Real, t: Time) -> Real {
            self.0.diffusion(x, t)
        }

        fn state(&self) -> &ModelState {
            self.0.state()
        }

        fn state_mut(&mut self) -> &mut ModelState {
            self.0.state_mut()
        }

        fn positivity(&self, params: &[Real]) -> bool {
            params[2] > 0.0
        }
    }

    #[test]
    fn default_model_has_no_exact_density() {
        let m = PolynomialModel::new(1.0, 2.0, 0.5);
        assert!(!m.has_exact_density());
        assert!(matches!(
            m.exact_density(1.0, 1.1, 0.0, 0.1),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            m.exact_step(0.0, 0.1, 1.0, 0.3),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            m.log_likelihood(&[1.0, 1.1, 1.2], 0.1),
            Err(Error::NotImplemented(_))
        ));
        assert!(matches!(
            m.ln_exact_density(1.0, 1.1, 0.0, 0.1),
            Err(Error::NotImplemented(_))
        ));
    }

    /// Density far below the smallest `f64`, known only in log form.
    #[derive(Debug, Clone)]
    struct TinyDensityModel {
        state: ModelState,
    }

    impl ProcessModel for TinyDensityModel {
        fn drift(&self, _x: Real, _t: Time) -> Real {
            0.0
        }

        fn diffusion(&self, _x: Real, _t: Time) -> Real {
            1.0
        }

        fn state(&self) -> &ModelState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut ModelState {
            &mut self.state
        }

        fn exact_density(&self, x0: Real, xt: Real, t0: Time, dt: Time) -> Result<Real> {
            Ok(self.ln_exact_density(x0, xt, t0, dt)?.exp())
        }

        fn ln_exact_density(&self, _x0: Real, _xt: Real, _t0: Time, _dt: Time) -> Result<Real> {
            Ok(-1_000.0)
        }
    }

    #[test]
    fn log_likelihood_sums_log_densities_without_underflow() {
        let m = TinyDensityModel {
            state: ModelState::new(vec![], true),
        };
        assert_eq!(m.exact_density(0.0, 1.0, 0.0, 0.1).unwrap(), 0.0);
        let ll = m.log_likelihood(&[0.0, 1.0, 2.0, 3.0], 0.1).unwrap();
        assert_abs_diff_eq!(ll, -3_000.0);
    }

    #[test]
    fn default_positivity_is_false() {
        let mut m = PolynomialModel::new(1.0, 2.0, 0.5);
        assert!(!m.is_positive());
        m.set_params(vec![0.0, 0.0, 1.0]).unwrap();
        assert!(!m.is_positive());
        assert_eq!(m.params(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn set_params_recomputes_positivity() {
        let mut m = PositiveModel(PolynomialModel::new(1.0, 2.0, 0.5));
        assert!(m.is_positive());
        m.set_params(vec![1.0, 2.0, -0.5]).unwrap();
        assert!(!m.is_positive());
        m.set_params(vec![1.0, 2.0, 0.5]).unwrap();
        assert!(m.is_positive());
    }

    #[test]
    fn fresh_state_reports_the_predicate() {
        let m = PositiveModel(PolynomialModel::new(1.0, 2.0, 0.5));
        assert_eq!(m.state().is_positive(), None);
        assert_eq!(m.is_positive(), m.positivity(m.params()));
        let m = PositiveModel(PolynomialModel::new(1.0, 2.0, -0.5));
        assert!(!m.is_positive());

        let mut m = PolynomialModel::new(1.0, 2.0, 0.5);
        m.set_params(vec![1.0, 2.0, 0.5]).unwrap();
        assert_eq!(m.state().is_positive(), Some(false));
    }

    #[test]
    fn set_params_rejects_wrong_length() {
        let mut m = PositiveModel(PolynomialModel::new(1.0, 2.0, 0.5));
        m.set_params(vec![1.0, 2.0, 0.5]).unwrap();
        let err = m.set_params(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(m.params(), &[1.0, 2.0, 0.5]);
        assert!(m.is_positive());
    }

    #[test]
    fn finite_difference_derivatives() {
        let m = PolynomialModel::new(1.5, -0.7, 0.3);
        let (x, t) = (0.8, 2.0);
        assert_abs_diff_eq!(m.drift_x(x, t), 2.0 * 1.5 * x, epsilon = 1e-8);
        assert_abs_diff_eq!(m.drift_t(x, t), -0.7, epsilon = 1e-8);
        assert_abs_diff_eq!(m.drift_xx(x, t), 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(m.diffusion_x(x, t), 0.3, epsilon = 1e-8);
        assert_abs_diff_eq!(m.diffusion_xx(x, t), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn default_simulation_method_is_milstein() {
        let m = PolynomialModel::new(1.0, 0.0, 1.0);
        assert_eq!(m.default_sim_method(), SimulationMethod::Milstein);
        let state = ModelState::new(vec![], false).with_default_sim_method(SimulationMethod::Exact);
        assert_eq!(state.default_sim_method().to_string(), "Exact");
    }

    #[test]
    fn simulation_method_names() {
        for m in [
            SimulationMethod::Euler,
            SimulationMethod::Milstein,
            SimulationMethod::Exact,
        ] {
            assert_eq!(m.as_str().parse::<SimulationMethod>().unwrap(), m);
        }
        assert!("Runge-Kutta".parse::<SimulationMethod>().is_err());
    }

    proptest! {
        #[test]
        fn central_difference_matches_linear_diffusion_slope(
            c in -5.0f64..5.0,
            x in -10.0f64..10.0,
        ) {
            let m = PolynomialModel::new(0.0, 0.0, c);
            prop_assert!((m.diffusion_x(x, 0.0) - c).abs() < 1e-6);
        }
    }
}
