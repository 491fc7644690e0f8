//! Core types and utilities for Optifolio.

pub mod error;
pub mod types;

pub use error::{OptifolioError, Result};
pub use types::*;
