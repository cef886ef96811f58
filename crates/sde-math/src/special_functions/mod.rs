//! Special functions.

mod bessel;

pub use bessel::{bessel_i_scaled, ln_bessel_i_scaled};
