//! Quasi-Newton optimizers for unconstrained minimization.
//!
//! Two direction engines over a shared strong-Wolfe line search:
//!
//! - [`Bfgs`]: dense inverse-Hessian BFGS, quadratic memory in the
//!   dimension
//! - [`Lbfgs`]: limited-memory BFGS with the two-loop recursion, linear
//!   memory
//!
//! The line search drives a pluggable univariate [`StepFinder`]; the
//! safeguarded-interpolation stepper [`InterpolationStep`] is the
//! default, with the bracketing searches from `descent-univariate` as
//! alternatives.
//!
//! # Example
//! ```
//! use descent_optim::prelude::*;
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
//! let mut solver = Bfgs::new();
//! let init = DVector::from_vec(vec![1.5, -0.5]);
//! let result = minimize(&Sphere, &init, &Settings::default(), &mut solver).unwrap();
//! assert!(result.converged());
//! assert!(result.loc.norm() < 1e-5);
//! ```

pub mod bfgs;
pub mod lbfgs;
pub mod line_search;
pub mod solver;

pub use bfgs::Bfgs;
pub use lbfgs::Lbfgs;
pub use line_search::{
    line_search, InterpolationStep, LineSearchResult, LineSearchSettings, StepFinder,
    WolfeConditions, WolfeParams,
};
pub use solver::{minimize, minimize_with, GradSolver, OptimizationResult, Settings};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use descent_optim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bfgs::Bfgs;
    pub use crate::lbfgs::Lbfgs;
    pub use crate::line_search::{
        line_search, InterpolationStep, LineSearchResult, LineSearchSettings, StepFinder,
        WolfeConditions, WolfeParams,
    };
    pub use crate::solver::{
        minimize, minimize_with, GradSolver, OptimizationResult, Progress, Settings,
    };
    pub use descent_univariate::prelude::*;
}
