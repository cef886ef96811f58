//! Error types for sdefit.
//!
//! A single `thiserror`-derived enum covers the whole workspace. Numeric
//! domain problems (a negative CIR state, say) are not errors: they surface
//! as NaN and propagate to the caller. Optimizer non-convergence is not an
//! error either; it is reported on the optimization result.

use thiserror::Error;

/// The top-level error type used throughout sdefit.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error.
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An optional capability (exact density, exact step) is not provided
    /// by the model it was requested from.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Two sequences that must be index-aligned have different lengths.
    #[error("shape mismatch: left has {left} elements, right has {right}")]
    ShapeMismatch {
        /// Length of the first sequence.
        left: usize,
        /// Length of the second sequence.
        right: usize,
    },

    /// A column or cell could not be converted to numbers.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// File access failed.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Shorthand `Result` type used throughout sdefit.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Return `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use sde_core::{ensure, errors::Error};
/// fn positive(x: f64) -> sde_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Return `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use sde_core::{fail, errors::Error};
/// fn always_err() -> sde_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

/// Return `Err(Error::NotImplemented(...))` immediately.
///
/// # Example
/// ```
/// use sde_core::{not_implemented, errors::Error};
/// fn exact_step() -> sde_core::errors::Result<f64> {
///     not_implemented!("exact step for {}", "GBM");
/// }
/// assert!(matches!(exact_step(), Err(Error::NotImplemented(_))));
/// ```
#[macro_export]
macro_rules! not_implemented {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::NotImplemented(format!($($msg)*)))
    };
}
