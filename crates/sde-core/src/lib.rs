//! # sde-core
//!
//! Core types and error definitions for sdefit.
//!
//! This crate provides the building blocks shared across the workspace –
//! type aliases, the error hierarchy with its `ensure!` / `fail!` /
//! `not_implemented!` macros, and tabular data ingestion.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `fail!` / `not_implemented!` macros.
pub mod errors;

/// Miscellaneous utilities (data ingestion).
pub mod utilities;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A time measurement (in the units of the observed data, usually years).
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use utilities::data_table::{read_delimited, DataTable};
#[cfg(feature = "xlsx")]
pub use utilities::data_table::read_spreadsheet;
