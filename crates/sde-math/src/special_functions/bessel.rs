//! Exponentially scaled modified Bessel function of the first kind.
//!
//! ```text
//! Ive(ν, x) = I_ν(x) · e^{−x},   x ≥ 0
//! ```
//!
//! `I_ν` overflows for moderate `x` while `e^{−x}` underflows; the product
//! is of order `1/√(2πx)`. Every evaluation path therefore works on the
//! scaled quantity directly and never forms `I_ν(x)`:
//!
//! * for `|ν| ≥ 50`, the uniform asymptotic (Debye) expansion
//!   `e^{νη} / (√(2πν)(1+z²)^{1/4}) Σ U_k(p)/ν^k` with `z = x/ν`, valid for
//!   every `x` and evaluated at constant cost;
//! * ascending series `Σ (x/2)^{2k+ν} / (k! Γ(k+ν+1))`, summed with a
//!   running log-scale, for `x ≤ max(50, ν²)`;
//! * Hankel asymptotic expansion `(2πx)^{−1/2} Σ (−1)^k a_k(ν) / x^k`
//!   otherwise.
//!
//! Real orders of either sign are supported. For negative non-integer `ν`
//! the series uses the signed reciprocal gamma function and the Debye
//! branch uses `I_{−ν} = I_ν + (2/π) sin(νπ) K_ν`; for negative integer `ν`
//! the identity `I_{−n} = I_n` applies. In the Hankel regime the `K_ν`
//! correction that separates `I_{−ν}` from `I_ν` is of relative size
//! `e^{−2x}` and is dropped.

use sde_core::Real;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::PI;

/// Below this argument (or below `ν²`) the ascending series is used.
const ASYMPTOTIC_THRESHOLD: Real = 50.0;

/// Orders at or above this magnitude use the Debye expansion.
const DEBYE_ORDER: Real = 50.0;

/// Rescale the running series term once it exceeds this magnitude.
const SERIES_RESCALE: Real = 1e100;

/// With `|ν| < 50` and `x ≤ 2500` the series needs under two thousand terms.
const MAX_SERIES_TERMS: usize = 10_000;
const MAX_ASYMPTOTIC_TERMS: usize = 64;

/// Debye polynomials `U_k(p) = p^k · N_k(p²) / D_k` for `k = 1..=6`, as the
/// coefficients of `N_k` in ascending powers of `p²` and the denominator.
const DEBYE_POLYNOMIALS: [(&[Real], Real); 6] = [
    (&[3.0, -5.0], 24.0),
    (&[81.0, -462.0, 385.0], 1_152.0),
    (&[30_375.0, -369_603.0, 765_765.0, -425_425.0], 414_720.0),
    (
        &[4_465_125.0, -94_121_676.0, 349_922_430.0, -446_185_740.0, 185_910_725.0],
        39_813_120.0,
    ),
    (
        &[
            1_519_035_525.0,
            -49_286_948_607.0,
            284_499_769_554.0,
            -614_135_872_350.0,
            566_098_157_625.0,
            -188_699_385_875.0,
        ],
        6_688_604_160.0,
    ),
    (
        &[
            2_757_049_477_875.0,
            -127_577_298_354_750.0,
            1_050_760_774_457_901.0,
            -3_369_032_068_261_860.0,
            5_104_696_716_244_125.0,
            -3_685_299_006_138_750.0,
            1_023_694_168_371_875.0,
        ],
        4_815_794_995_200.0,
    ),
];

/// Exponentially scaled modified Bessel function `I_ν(x)·e^{−x}`.
///
/// Returns NaN for NaN inputs or `x < 0`. At `x = 0` the value is `1` for
/// `ν = 0`, `0` for `ν > 0` or negative integer `ν`, and `+∞` for negative
/// non-integer `ν`.
///
/// # Example
/// ```
/// use sde_math::bessel_i_scaled;
/// // I_0(1)·e^{-1}
/// assert!((bessel_i_scaled(0.0, 1.0) - 0.465_759_607_593_640_4).abs() < 1e-14);
/// ```
pub fn bessel_i_scaled(nu: Real, x: Real) -> Real {
    let (ln_abs, sign) = ln_bessel_i_scaled(nu, x);
    sign * ln_abs.exp()
}

/// Natural log of `|I_ν(x)·e^{−x}|` together with the sign of the value.
///
/// Useful when the scaled function is itself below the smallest normal
/// `f64` (large order, small argument) but its product with other factors
/// is not. A zero value is reported as `(−∞, 1)`.
pub fn ln_bessel_i_scaled(nu: Real, x: Real) -> (Real, Real) {
    if nu.is_nan() || x.is_nan() || x < 0.0 {
        return (Real::NAN, Real::NAN);
    }
    if nu < 0.0 && nu == nu.round() {
        return ln_bessel_i_scaled(-nu, x);
    }
    if x == 0.0 {
        return if nu == 0.0 {
            (0.0, 1.0)
        } else if nu > 0.0 {
            (Real::NEG_INFINITY, 1.0)
        } else {
            (Real::INFINITY, ln_gamma_signed(nu + 1.0).1)
        };
    }
    if x.is_infinite() {
        return (Real::NEG_INFINITY, 1.0);
    }

    if nu >= DEBYE_ORDER {
        (debye_ln_i(nu, x), 1.0)
    } else if nu <= -DEBYE_ORDER {
        debye_negative_order(-nu, x)
    } else if x > ASYMPTOTIC_THRESHOLD.max(nu * nu) {
        hankel_asymptotic(nu, x)
    } else {
        ascending_series(nu, x)
    }
}

/// `ln|Γ(a)|` and the sign of `Γ(a)`, for non-integer `a ≤ 0` as well.
fn ln_gamma_signed(a: Real) -> (Real, Real) {
    if a > 0.0 {
        (ln_gamma(a), 1.0)
    } else {
        // Γ(a)·Γ(1−a) = π / sin(πa), with Γ(1−a) > 0
        let s = (PI * a).sin();
        (PI.ln() - s.abs().ln() - ln_gamma(1.0 - a), s.signum())
    }
}

fn ascending_series(nu: Real, x: Real) -> (Real, Real) {
    let (ln_gamma0, sign0) = ln_gamma_signed(nu + 1.0);

    // sum = acc · e^{ln_scale}; the first term carries the e^{-x} scaling
    let mut ln_scale = nu * (0.5 * x).ln() - ln_gamma0 - x;
    let mut term = sign0;
    let mut acc = sign0;

    let quarter_x2 = 0.25 * x * x;

    for k in 0..MAX_SERIES_TERMS {
        let k1 = k as Real + 1.0;
        let denom = k1 + nu;
        term *= quarter_x2 / (k1 * denom);
        acc += term;

        if term.abs() > SERIES_RESCALE {
            let scale = term.abs();
            term /= scale;
            acc /= scale;
            ln_scale += scale.ln();
        }

        let decreasing = denom > 0.0 && k1 * denom > quarter_x2;
        if decreasing && term.abs() <= Real::EPSILON * acc.abs() {
            break;
        }
    }

    if acc == 0.0 {
        return (Real::NEG_INFINITY, 1.0);
    }
    (acc.abs().ln() + ln_scale, acc.signum())
}

fn hankel_asymptotic(nu: Real, x: Real) -> (Real, Real) {
    let mu = 4.0 * nu * nu;
    let mut term: Real = 1.0;
    let mut sum: Real = 1.0;

    for k in 1..=MAX_ASYMPTOTIC_TERMS {
        let kf = k as Real;
        let odd = 2.0 * kf - 1.0;
        let next = -term * (mu - odd * odd) / (8.0 * kf * x);
        // the series is asymptotic: stop at the smallest term
        if next.abs() >= term.abs() {
            break;
        }
        term = next;
        sum += term;
        if term.abs() <= Real::EPSILON * sum.abs() {
            break;
        }
    }

    (sum.abs().ln() - 0.5 * (2.0 * PI * x).ln(), sum.signum())
}

/// `1 + Σ (±1)^k U_k(p) / ν^k`; `alternate` selects the `K_ν` signs.
fn debye_sum(nu: Real, p: Real, alternate: bool) -> Real {
    let p2 = p * p;
    let step = if alternate { -p / nu } else { p / nu };
    let mut factor: Real = 1.0;
    let mut sum: Real = 1.0;
    for (numerator, denominator) in DEBYE_POLYNOMIALS.iter() {
        factor *= step;
        let poly = numerator.iter().rev().fold(0.0, |acc: Real, &c| acc * p2 + c);
        sum += factor * poly / denominator;
    }
    sum
}

/// `ln(I_ν(x)·e^{−x})` for `ν ≥ 50`.
fn debye_ln_i(nu: Real, x: Real) -> Real {
    let z = x / nu;
    let s = z.hypot(1.0);
    // ν(η − z) with η = s + ln(z/(1+s)) and s − z = 1/(s + z)
    let exponent = nu * (1.0 / (s + z) + z.ln() - s.ln_1p());
    exponent - 0.5 * (2.0 * PI * nu).ln() - 0.5 * s.ln() + debye_sum(nu, 1.0 / s, false).ln()
}

/// `ln(K_ν(x)·e^{−x})` for `ν ≥ 50`.
fn debye_ln_k(nu: Real, x: Real) -> Real {
    let z = x / nu;
    let s = z.hypot(1.0);
    let eta = s + z.ln() - s.ln_1p();
    0.5 * (PI / (2.0 * nu)).ln() - nu * eta - x - 0.5 * s.ln()
        + debye_sum(nu, 1.0 / s, true).ln()
}

/// `I_{−ν}(x)·e^{−x}` for non-integer `ν ≥ 50`, in log form.
fn debye_negative_order(nu: Real, x: Real) -> (Real, Real) {
    // sin(νπ) from the fractional part of ν
    let n = nu.round();
    let parity = if n % 2.0 == 0.0 { 1.0 } else { -1.0 };
    let weight = 2.0 / PI * parity * (PI * (nu - n)).sin();

    let ln_i = debye_ln_i(nu, x);
    let ln_k = debye_ln_k(nu, x);
    let top = ln_i.max(ln_k);
    let value = (ln_i - top).exp() + weight * (ln_k - top).exp();
    if value == 0.0 {
        return (Real::NEG_INFINITY, 1.0);
    }
    (value.abs().ln() + top, value.signum())
}
