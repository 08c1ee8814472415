//! Unconstrained numerical optimization.
//!
//! This crate re-exports the full workspace:
//!
//! - [`core`](descent_core): scalar abstraction, status and error types,
//!   convergence and budget bookkeeping, objective traits, reporting
//! - [`univariate`](descent_univariate): bisection-on-derivative and
//!   golden-section searches along a ray
//! - [`optim`](descent_optim): BFGS and L-BFGS over a strong-Wolfe line
//!   search with pluggable step finders
//!
//! # Example
//! ```
//! use descent::prelude::*;
//!
//! struct Sphere;
//!
//! impl CostFunction<f64> for Sphere {
//!     fn cost(&self, x: &DVector<f64>) -> Result<f64> {
//!         Ok(x.dot(x))
//!     }
//!
//!     fn cost_and_gradient(&self, x: &DVector<f64>, grad: &mut DVector<f64>) -> Result<f64> {
//!         grad.copy_from(x);
//!         *grad *= 2.0;
//!         Ok(x.dot(x))
//!     }
//! }
//!
//! let init = DVector::from_vec(vec![1.5, -0.5]);
//! let result = minimize(&Sphere, &init, &Settings::default(), &mut Lbfgs::new()).unwrap();
//! assert!(result.converged());
//! ```

pub use descent_core as core;
pub use descent_optim as optim;
pub use descent_univariate as univariate;

// Re-export the linear algebra crate the public API is expressed in.
pub use nalgebra;

pub use descent_core::{DescentError, Result, Status};
pub use descent_optim::{minimize, minimize_with, Bfgs, InterpolationStep, Lbfgs, Settings};
pub use descent_univariate::{
    minimize_scalar, minimize_scalar_grad, Bisection, GoldenSection, ScalarSettings,
};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use descent::prelude::*;
/// ```
pub mod prelude {
    pub use descent_optim::prelude::*;
}
