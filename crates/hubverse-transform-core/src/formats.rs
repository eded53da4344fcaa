//! Format-specific readers and writers.
//!
//! Model-output files arrive as delimited text or Parquet and always leave as
//! Parquet. Each submodule turns storage handles into a [`crate::table::ModelOutputTable`]
//! (or back) without knowing anything about model-output naming rules.

pub mod csv;
pub mod parquet;
