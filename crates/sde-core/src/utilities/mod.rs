//! Miscellaneous utilities.

pub mod data_table;
