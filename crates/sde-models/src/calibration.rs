//! Maximum-likelihood calibration on the exact transition density.
//!
//! For an evenly spaced path `x_0, …, x_n` the objective is the negative
//! log-likelihood
//!
//! ```text
//! −ℓ(θ) = −Σ ln p_θ(x_{i+1} | x_i, Δt)
//! ```
//!
//! minimized over the model parameters `θ` with any [`Minimizer`].

use crate::process_model::ProcessModel;
use sde_core::{
    ensure,
    errors::{Error, Result},
    not_implemented, Real, Time,
};
use sde_math::{Bounds, GradientMinimizer, Minimizer, OptimizationResult};
use tracing::{info, warn};

/// Fits a [`ProcessModel`] with an exact density to an observed path.
#[derive(Debug, Clone, Default)]
pub struct ExactMleCalibrator<M: Minimizer = GradientMinimizer> {
    minimizer: M,
}

impl<M: Minimizer> ExactMleCalibrator<M> {
    /// Calibrator driving `minimizer`.
    pub fn new(minimizer: M) -> Self {
        Self { minimizer }
    }

    /// The underlying minimizer.
    pub fn minimizer(&self) -> &M {
        &self.minimizer
    }

    /// Fit `model` to `path`, sampled every `dt`.
    ///
    /// The optimum is written back into `model` whether or not the
    /// minimizer converged; check [`OptimizationResult::success`].
    /// Parameter vectors at which the likelihood is not finite are treated
    /// as infinitely bad.
    ///
    /// # Errors
    /// * `Error::NotImplemented` if the model has no exact density.
    /// * `Error::InvalidArgument` if `guess` does not match the model's
    ///   parameter count, or from the minimizer.
    /// * `Error::Precondition` for fewer than two observations or `dt ≤ 0`.
    pub fn calibrate<P>(
        &self,
        model: &mut P,
        path: &[Real],
        dt: Time,
        bounds: Option<&Bounds>,
        guess: &[Real],
    ) -> Result<OptimizationResult>
    where
        P: ProcessModel + Clone,
    {
        if !model.has_exact_density() {
            not_implemented!("exact-density calibration of a model without an exact density");
        }
        if guess.len() != model.params().len() {
            return Err(Error::InvalidArgument(format!(
                "initial guess has {} parameters, model has {}",
                guess.len(),
                model.params().len()
            )));
        }
        ensure!(
            path.len() >= 2,
            "calibration needs at least two observations, got {}",
            path.len()
        );
        ensure!(dt > 0.0, "time step must be positive, got {dt}");

        info!(
            observations = path.len(),
            dt,
            ?guess,
            "starting exact-density calibration"
        );

        let template: &P = model;
        let objective = |params: &[Real]| -> Real {
            let mut scratch = template.clone();
            match scratch
                .set_params(params.to_vec())
                .and_then(|()| scratch.log_likelihood(path, dt))
            {
                Ok(ll) if ll.is_finite() => -ll,
                _ => Real::INFINITY,
            }
        };

        let result = self.minimizer.minimize(&objective, bounds, guess)?;
        model.set_params(result.params().to_vec())?;

        if result.success() {
            info!(
                params = ?result.params(),
                neg_log_likelihood = result.value(),
                iterations = result.iterations(),
                "calibration converged"
            );
        } else {
            warn!(
                params = ?result.params(),
                neg_log_likelihood = result.value(),
                status = result.message(),
                "calibration did not converge"
            );
        }
        Ok(result)
    }
}
