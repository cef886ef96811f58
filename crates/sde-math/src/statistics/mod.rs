//! Sample statistics.
//!
//! Descriptive moments of an observed series, the mean-squared error
//! between an observed and a fitted series, and empirical hitting-time
//! estimators over a model path.

mod hitting;

pub use hitting::{first_hitting_index, fraction_at_or_above};

use sde_core::{
    errors::{Error, Result},
    Real,
};
use statrs::statistics::Statistics;
use std::fmt;
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The first four moments of a sample.
///
/// Population conventions: `variance` divides by `n`, `skewness` is
/// `m₃ / m₂^{3/2}`, and `kurtosis` is the excess kurtosis `m₄ / m₂² − 3`
/// (zero for a normal distribution).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Moments {
    /// Sample mean.
    pub mean: Real,
    /// Population variance.
    pub variance: Real,
    /// Skewness.
    pub skewness: Real,
    /// Excess kurtosis.
    pub kurtosis: Real,
}

impl Moments {
    /// Compute the moments of `data`, or `None` if it is empty.
    ///
    /// A constant sample has zero variance and NaN skewness and kurtosis.
    pub fn from_sample(data: &[Real]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }
        let mean = data.iter().mean();
        let variance = data.iter().population_variance();

        let n = data.len() as Real;
        let (m3, m4) = data.iter().fold((0.0, 0.0), |(s3, s4), &x| {
            let d = x - mean;
            let d2 = d * d;
            (s3 + d2 * d, s4 + d2 * d2)
        });
        let (m3, m4) = (m3 / n, m4 / n);

        Some(Self {
            mean,
            variance,
            skewness: m3 / variance.powf(1.5),
            kurtosis: m4 / (variance * variance) - 3.0,
        })
    }

    /// The moments as a `(mean, variance, skewness, kurtosis)` tuple.
    pub fn as_tuple(&self) -> (Real, Real, Real, Real) {
        (self.mean, self.variance, self.skewness, self.kurtosis)
    }
}

impl fmt::Display for Moments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mean: {:.6}, Variance: {:.6}, Skewness: {:.6}, Kurtosis: {:.6}",
            self.mean, self.variance, self.skewness, self.kurtosis
        )
    }
}

/// Compute and log the moments of `data`.
///
/// Returns `None` for an empty sample.
pub fn moments(data: &[Real]) -> Option<Moments> {
    let m = Moments::from_sample(data)?;
    info!(
        samples = data.len(),
        mean = m.mean,
        variance = m.variance,
        skewness = m.skewness,
        kurtosis = m.kurtosis,
        "sample moments"
    );
    Some(m)
}

/// Mean squared error `Σ (a_i − b_i)² / n` between two aligned series.
///
/// # Errors
/// `Error::ShapeMismatch` if the lengths differ, `Error::InvalidArgument`
/// if both are empty.
pub fn mean_squared_error(observed: &[Real], predicted: &[Real]) -> Result<Real> {
    if observed.len() != predicted.len() {
        return Err(Error::ShapeMismatch {
            left: observed.len(),
            right: predicted.len(),
        });
    }
    if observed.is_empty() {
        return Err(Error::InvalidArgument(
            "mean squared error of empty series".into(),
        ));
    }
    let sum: Real = observed
        .iter()
        .zip(predicted)
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    Ok(sum / observed.len() as Real)
}
