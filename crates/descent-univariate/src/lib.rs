//! Univariate bracketing minimizers.
//!
//! Two searches along a ray from a starting location:
//!
//! - [`Bisection`]: brackets a sign change in the derivative and bisects
//!   on it. Requires derivatives; never terminates on its own, so pair it
//!   with a gradient tolerance or budget.
//! - [`GoldenSection`]: derivative-free three-point bracketing with
//!   golden-ratio shrinking; terminates when its bracket collapses.
//!
//! Both are driven through the loop functions in [`solver`], which own
//! convergence checking, budgets, and reporting.
//!
//! # Example
//! ```
//! use descent_univariate::prelude::*;
//!
//! let mut f = |x: f64| ((x - 3.0) * (x - 3.0), 2.0 * (x - 3.0));
//! let mut solver = Bisection::new();
//! let settings = ScalarSettings::default();
//! let result = minimize_scalar_grad(&mut f, 0.0, &settings, &mut solver).unwrap();
//! assert!((result.loc - 3.0).abs() < 1e-5);
//! ```

pub mod bisection;
pub mod golden;
pub mod solver;

pub use bisection::Bisection;
pub use golden::GoldenSection;
pub use solver::{
    minimize_scalar, minimize_scalar_grad, minimize_scalar_grad_with, minimize_scalar_with,
    ScalarEval, ScalarGradEval, ScalarGradSolver, ScalarResult, ScalarSettings, ScalarSolver,
};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use descent_univariate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bisection::Bisection;
    pub use crate::golden::GoldenSection;
    pub use crate::solver::{
        minimize_scalar, minimize_scalar_grad, minimize_scalar_grad_with, minimize_scalar_with,
        ScalarEval, ScalarGradEval, ScalarGradSolver, ScalarProgress, ScalarResult,
        ScalarSettings, ScalarSolver,
    };
    pub use descent_core::prelude::*;
}
