//! Closed-form Markowitz mean-variance optimization.

pub mod solver;

pub use solver::{MarkowitzSolution, MarkowitzSolver};
