//! Objective function traits.
//!
//! The engines never call a user function concurrently and never retry a
//! failed evaluation; an error from any of these traits aborts the run with
//! the best point found so far.

use crate::error::Result;
use crate::types::{DVector, Scalar};

/// A differentiable objective over a vector domain.
///
/// The gradient is written into a caller-supplied buffer of matching
/// length, so a single scratch vector can be reused across evaluations.
pub trait CostFunction<T: Scalar> {
    /// Evaluates the objective at `x`.
    fn cost(&self, x: &DVector<T>) -> Result<T>;

    /// Evaluates the objective at `x` and writes the gradient into `grad`.
    fn cost_and_gradient(&self, x: &DVector<T>, grad: &mut DVector<T>) -> Result<T>;
}

/// A scalar objective without derivative information.
///
/// Takes `&mut self` so projections and other evaluation wrappers can
/// record state from each call.
pub trait ScalarFunction<T: Scalar> {
    /// Evaluates the objective at `x`.
    fn eval(&mut self, x: T) -> Result<T>;
}

/// A scalar objective that also produces its derivative.
pub trait ScalarGradFunction<T: Scalar> {
    /// Evaluates the objective and its derivative at `x`.
    fn eval_with_deriv(&mut self, x: T) -> Result<(T, T)>;
}

impl<T: Scalar, F> ScalarFunction<T> for F
where
    F: FnMut(T) -> T,
{
    fn eval(&mut self, x: T) -> Result<T> {
        Ok(self(x))
    }
}

impl<T: Scalar, F> ScalarGradFunction<T> for F
where
    F: FnMut(T) -> (T, T),
{
    fn eval_with_deriv(&mut self, x: T) -> Result<(T, T)> {
        Ok(self(x))
    }
}
