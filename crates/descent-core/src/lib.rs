//! Core traits and types for unconstrained numerical optimization.
//!
//! This crate provides the foundations shared by the univariate searches
//! and the quasi-Newton engines: the scalar abstraction, error and status
//! types, convergence and budget bookkeeping, objective function traits,
//! and progress reporting.
//!
//! # Modules
//!
//! - [`types`]: scalar trait, vector/matrix aliases, numerical constants
//! - [`error`]: error types
//! - [`status`]: termination status codes
//! - [`convergence`]: tolerance checks and computational budgets
//! - [`objective`]: objective function traits
//! - [`reporting`]: per-iteration progress reporting

pub mod convergence;
pub mod error;
pub mod objective;
pub mod reporting;
pub mod status;
pub mod types;

pub use error::{DescentError, Result};
pub use status::Status;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use descent_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::convergence::{
        Budget, BudgetSettings, ConvergenceChecker, Tolerance, ToleranceSettings,
    };
    pub use crate::error::{DescentError, Result};
    pub use crate::objective::{CostFunction, ScalarFunction, ScalarGradFunction};
    pub use crate::reporting::{Field, NoReporter, PrintReporter, Record, Reporter};
    pub use crate::status::Status;
    pub use crate::types::{constants, within_abs_or_rel, DMatrix, DVector, Scalar};
}
