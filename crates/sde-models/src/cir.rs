//! Cox-Ingersoll-Ross model.
//!
//! ```text
//! dX = κ(μ − X) dt + σ √X dW
//! ```
//!
//! Parameters are ordered `[κ, μ, σ]`: mean-reversion speed, long-run mean,
//! and volatility scale. Paths are non-negative for every parameter vector.
//!
//! The transition density is a scaled noncentral chi-square:
//!
//! ```text
//! c = 2κ / (σ²(1 − e^{−κΔt})),  u = c·x0·e^{−κΔt},  v = c·xt
//! q = 2κμ/σ² − 1,               z = 2√(uv)
//!
//! p(xt | x0) = c · e^{−(u+v)} · (v/u)^{q/2} · I_q(z)
//!            = c · e^{−(u+v) + z} · (v/u)^{q/2} · Ive(q, z)
//! ```
//!
//! It is evaluated in log space on the exponentially scaled Bessel function,
//! since `I_q(z)` and `e^{−(u+v)}` overflow and underflow separately for
//! short steps or small volatility.

use crate::process_model::{ModelState, ProcessModel};
use sde_core::{errors::Result, Real, Time};
use sde_math::ln_bessel_i_scaled;

/// Cox-Ingersoll-Ross square-root diffusion with exact density.
#[derive(Debug, Clone, PartialEq)]
pub struct CirModel {
    state: ModelState,
}

impl CirModel {
    /// Create a CIR model.
    ///
    /// # Arguments
    /// * `kappa`: mean-reversion speed `κ`
    /// * `mu`: long-run mean `μ`
    /// * `sigma`: volatility scale `σ`
    pub fn new(kappa: Real, mu: Real, sigma: Real) -> Self {
        Self {
            state: ModelState::new(vec![kappa, mu, sigma], true),
        }
    }

    /// Mean-reversion speed `κ`.
    pub fn kappa(&self) -> Real {
        self.params()[0]
    }

    /// Long-run mean `μ`.
    pub fn mu(&self) -> Real {
        self.params()[1]
    }

    /// Volatility scale `σ`.
    pub fn sigma(&self) -> Real {
        self.params()[2]
    }

    /// Feller condition `2κμ ≥ σ²`: the origin is unattainable.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa() * self.mu() >= self.sigma() * self.sigma()
    }

    /// `ln|p(xt | x0)|` and the sign of the Bessel factor.
    fn ln_density(&self, x0: Real, xt: Real, dt: Time) -> (Real, Real) {
        if !(x0 > 0.0 && xt > 0.0) {
            return (Real::NAN, Real::NAN);
        }
        let (kappa, mu, sigma) = (self.kappa(), self.mu(), self.sigma());
        let sigma2 = sigma * sigma;

        let et = (-kappa * dt).exp();
        let c = 2.0 * kappa / (sigma2 * (1.0 - et));
        let u = c * x0 * et;
        let v = c * xt;
        let q = 2.0 * kappa * mu / sigma2 - 1.0;
        let z = 2.0 * (u * v).sqrt();

        let (ln_ive, sign) = ln_bessel_i_scaled(q, z);
        (c.ln() - (u + v) + z + 0.5 * q * (v.ln() - u.ln()) + ln_ive, sign)
    }
}

impl ProcessModel for CirModel {
    fn drift(&self, x: Real, _t: Time) -> Real {
        self.kappa() * (self.mu() - x)
    }

    /// `σ√x`; NaN for negative `x`.
    fn diffusion(&self, x: Real, _t: Time) -> Real {
        self.sigma() * x.sqrt()
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }

    fn positivity(&self, _params: &[Real]) -> bool {
        true
    }

    /// The drift is time-homogeneous.
    fn drift_t(&self, _x: Real, _t: Time) -> Real {
        0.0
    }

    /// Transition density of `xt` after `dt`, given `x0`.
    ///
    /// Both states must be strictly positive; otherwise the result is NaN.
    fn exact_density(&self, x0: Real, xt: Real, _t0: Time, dt: Time) -> Result<Real> {
        let (ln_abs, sign) = self.ln_density(x0, xt, dt);
        Ok(sign * ln_abs.exp())
    }

    /// Log of the transition density, finite even where the density itself
    /// underflows. NaN for non-positive states or a negative Bessel factor.
    fn ln_exact_density(&self, x0: Real, xt: Real, _t0: Time, dt: Time) -> Result<Real> {
        match self.ln_density(x0, xt, dt) {
            (ln_abs, sign) if sign > 0.0 => Ok(ln_abs),
            _ => Ok(Real::NAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    /// Trapezoid integral of `f·p(·|x0)` over `(0, upper]`.
    fn integrate(model: &CirModel, x0: Real, dt: Time, upper: Real, f: impl Fn(Real) -> Real) -> Real {
        let n = 4_000;
        let a = 1e-6;
        let h = (upper - a) / n as Real;
        (0..=n)
            .map(|i| {
                let x = a + i as Real * h;
                let w = if i == 0 || i == n { 0.5 } else { 1.0 };
                w * f(x) * model.exact_density(x0, x, 0.0, dt).unwrap()
            })
            .sum::<Real>()
            * h
    }

    #[test]
    fn drift_and_diffusion() {
        let m = CirModel::new(2.0, 0.05, 0.1);
        assert_abs_diff_eq!(m.drift(0.05, 0.0), 0.0);
        assert_abs_diff_eq!(m.drift(0.01, 3.0), 0.08, epsilon = 1e-15);
        assert!(m.drift(0.10, 0.0) < 0.0);
        assert_abs_diff_eq!(m.diffusion(0.04, 0.0), 0.02, epsilon = 1e-15);
        assert_eq!(m.diffusion(0.0, 0.0), 0.0);
        assert!(m.diffusion(-0.01, 0.0).is_nan());
    }

    #[test]
    fn accessors_follow_params() {
        let mut m = CirModel::new(2.0, 0.05, 0.1);
        assert_eq!((m.kappa(), m.mu(), m.sigma()), (2.0, 0.05, 0.1));
        m.set_params(vec![1.0, 0.03, 0.2]).unwrap();
        assert_eq!(m.params(), &[1.0, 0.03, 0.2]);
        assert_eq!(m.sigma(), 0.2);
        assert!(m.set_params(vec![1.0, 0.03]).is_err());
        assert_eq!(m.kappa(), 1.0);
    }

    #[test]
    fn capabilities() {
        let m = CirModel::new(2.0, 0.05, 0.1);
        assert!(m.has_exact_density());
        assert_eq!(m.default_sim_method(), crate::SimulationMethod::Milstein);
        assert!(m.exact_step(0.0, 0.1, 0.05, 0.0).is_err());
    }

    #[test]
    fn always_positive_even_without_mean_reversion() {
        let mut m = CirModel::new(0.0, 0.05, 0.1);
        assert!(m.is_positive());
        m.set_params(vec![0.0, -1.0, 3.0]).unwrap();
        assert!(m.is_positive());
    }

    #[test]
    fn feller_condition() {
        assert!(CirModel::new(2.0, 0.05, 0.1).feller_satisfied());
        assert!(!CirModel::new(0.5, 0.03, 0.2).feller_satisfied());
    }

    #[test]
    fn drift_time_derivative_is_exactly_zero() {
        let m = CirModel::new(3.0, 0.05, 0.1);
        assert_eq!(m.drift_t(0.07, 1.5), 0.0);
    }

    #[test]
    fn density_reference_values() {
        let m = CirModel::new(2.0, 0.05, 0.1);
        assert_relative_eq!(
            m.exact_density(0.04, 0.045, 0.0, 0.25).unwrap(),
            47.135_558_397_539_61,
            max_relative = 1e-10
        );
        // q = −0.25: negative fractional Bessel order
        let m = CirModel::new(0.5, 0.03, 0.2);
        assert_relative_eq!(
            m.exact_density(0.02, 0.01, 0.0, 1.0).unwrap(),
            24.907_722_719_964_68,
            max_relative = 1e-10
        );
    }

    #[test]
    fn stiff_density_stays_finite() {
        let m = CirModel::new(5.0, 0.05, 0.1);
        let p = m.exact_density(0.01, 0.05, 0.0, 0.01).unwrap();
        assert!(p.is_finite() && p >= 0.0);
        assert_relative_eq!(p, 9.272_236_902_298_304e-123, max_relative = 1e-8);
    }

    #[test]
    fn large_order_density_reference_value() {
        // q = 311.5
        let m = CirModel::new(5.0, 0.2, 0.08);
        assert_relative_eq!(
            m.ln_exact_density(0.05, 0.06, 0.0, 1.0 / 52.0).unwrap(),
            3.974_652_888_452_256_5,
            max_relative = 1e-10
        );
    }

    #[test]
    fn small_volatility_density_approaches_gaussian_limit() {
        // q ≈ 8·10⁴: the transition law is close to normal
        let (kappa, mu, sigma, x0, dt) = (5.0, 0.2, 0.005, 0.05, 1.0 / 52.0);
        let m = CirModel::new(kappa, mu, sigma);
        let e: Real = (-kappa * dt).exp();
        let mean = x0 * e + mu * (1.0 - e);
        let var = x0 * sigma * sigma / kappa * (e - e * e)
            + mu * sigma * sigma / (2.0 * kappa) * (1.0 - e).powi(2);
        for j in [-2.0, -1.0, 0.0, 1.0, 2.0] {
            let xt = mean + j * var.sqrt();
            let gaussian = -0.5 * j * j - 0.5 * (2.0 * std::f64::consts::PI * var).ln();
            let ln_p = m.ln_exact_density(x0, xt, 0.0, dt).unwrap();
            assert_abs_diff_eq!(ln_p, gaussian, epsilon = 5e-3);
        }
    }

    #[test]
    fn log_density_stays_finite_where_density_underflows() {
        // 0.051 lies about 80 standard deviations below the conditional mean
        let m = CirModel::new(5.0, 0.2, 0.005);
        let dt = 1.0 / 52.0;
        assert_eq!(m.exact_density(0.05, 0.051, 0.0, dt).unwrap(), 0.0);
        let ln_p = m.ln_exact_density(0.05, 0.051, 0.0, dt).unwrap();
        assert!(ln_p.is_finite() && ln_p < -1_000.0, "ln p = {ln_p}");
        let ll = m.log_likelihood(&[0.05, 0.051, 0.052], dt).unwrap();
        assert!(ll.is_finite(), "ll = {ll}");
    }

    #[test]
    fn density_at_non_positive_state_is_nan() {
        let m = CirModel::new(2.0, 0.05, 0.1);
        assert!(m.exact_density(0.0, 0.05, 0.0, 0.1).unwrap().is_nan());
        assert!(m.exact_density(0.04, -0.01, 0.0, 0.1).unwrap().is_nan());
        assert!(m.ln_exact_density(0.0, 0.05, 0.0, 0.1).unwrap().is_nan());
    }

    #[test]
    fn density_integrates_to_one() {
        let m = CirModel::new(2.0, 0.05, 0.1);
        let mass = integrate(&m, 0.04, 0.25, 0.4, |_| 1.0);
        assert_abs_diff_eq!(mass, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn density_mean_matches_conditional_expectation() {
        let (kappa, mu, x0, dt) = (2.0, 0.05, 0.04, 0.25);
        let m = CirModel::new(kappa, mu, 0.1);
        let mean = integrate(&m, x0, dt, 0.4, |x| x);
        let expected = x0 * (-kappa * dt).exp() + mu * (1.0 - (-kappa * dt).exp());
        assert_abs_diff_eq!(mean, expected, epsilon = 1e-7);
    }

    #[test]
    fn log_likelihood_sums_log_densities() {
        let m = CirModel::new(2.0, 0.05, 0.1);
        let path = [0.04, 0.045, 0.043, 0.05];
        let dt = 0.25;
        let expected: Real = path
            .windows(2)
            .map(|w| m.exact_density(w[0], w[1], 0.0, dt).unwrap().ln())
            .sum();
        assert_relative_eq!(m.log_likelihood(&path, dt).unwrap(), expected, max_relative = 1e-14);
        assert!(m.log_likelihood(&path[..1], dt).is_err());
        assert!(m.log_likelihood(&path, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn density_is_finite_and_non_negative(
            kappa in 0.1f64..5.0,
            mu in 0.01f64..1.0,
            sigma in 1e-3f64..0.5,
            x0 in 1e-3f64..0.5,
            xt in 1e-3f64..0.5,
            dt in 0.01f64..1.0,
        ) {
            let m = CirModel::new(kappa, mu, sigma);
            let p = m.exact_density(x0, xt, 0.0, dt).unwrap();
            prop_assert!(p.is_finite(), "p = {}", p);
            prop_assert!(p >= 0.0, "p = {}", p);
            let ln_p = m.ln_exact_density(x0, xt, 0.0, dt).unwrap();
            prop_assert!(ln_p.is_finite(), "ln p = {}", ln_p);
        }

        #[test]
        fn positivity_holds_for_any_params(
            kappa in -10.0f64..10.0,
            mu in -1.0f64..1.0,
            sigma in -2.0f64..2.0,
        ) {
            let mut m = CirModel::new(1.0, 0.05, 0.1);
            m.set_params(vec![kappa, mu, sigma]).unwrap();
            prop_assert!(m.is_positive());
        }

        #[test]
        fn finite_difference_drift_slope_is_minus_kappa(
            kappa in 0.0f64..10.0,
            x in 0.0f64..1.0,
        ) {
            let m = CirModel::new(kappa, 0.05, 0.1);
            prop_assert!((m.drift_x(x, 0.0) + kappa).abs() < 1e-4);
        }
    }
}
