//! Bisection on the derivative sign.

use crate::solver::{ScalarGradEval, ScalarGradSolver};
use descent_core::objective::ScalarGradFunction;
use descent_core::types::{within_abs_or_rel, Scalar};
use descent_core::{DescentError, Result, Status};
use num_traits::Float;

/// Minimizes along a ray by bracketing a sign change in the derivative and
/// bisecting on it.
///
/// Phase one doubles the step until the derivative changes sign or the
/// objective stops decreasing; phase two bisects the resulting interval,
/// moving whichever bound has the matching derivative sign. If the
/// derivative at the start points uphill the search direction is flipped.
///
/// The solver never reports a terminal status of its own; termination is
/// driven by the caller's tolerances or budget.
#[derive(Debug, Clone)]
pub struct Bisection<T: Scalar> {
    initial_step: T,

    init_loc: T,
    curr_step: T,
    pos_init_deriv: bool,

    min_step: T,
    min_obj: T,
    min_deriv: T,

    max_step: T,
    max_obj: T,
    max_deriv: T,
}

impl<T: Scalar> Bisection<T> {
    /// Creates a bisection search with unit initial step.
    pub fn new() -> Self {
        Self {
            initial_step: T::one(),
            init_loc: T::zero(),
            curr_step: T::zero(),
            pos_init_deriv: false,
            min_step: T::zero(),
            min_obj: T::zero(),
            min_deriv: T::zero(),
            max_step: T::zero(),
            max_obj: T::zero(),
            max_deriv: T::zero(),
        }
    }

    /// Sets the magnitude of the first trial step.
    pub fn set_initial_step(&mut self, step: T) {
        self.initial_step = step;
    }
}

impl<T: Scalar> Default for Bisection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> ScalarGradSolver<T> for Bisection<T> {
    fn init(&mut self, init_loc: T, init_obj: T, init_deriv: T) -> Result<()> {
        if self.initial_step == T::zero() {
            return Err(DescentError::ZeroInitialStep);
        }

        self.init_loc = init_loc;

        self.min_step = T::zero();
        self.min_obj = init_obj;
        self.min_deriv = init_deriv;

        self.max_step = <T as Float>::infinity();
        self.max_obj = <T as Float>::infinity();
        self.max_deriv = <T as Float>::infinity();

        // Search in the downhill direction; flip the sign convention when
        // the derivative at the start is positive.
        self.curr_step = self.initial_step;
        self.pos_init_deriv = false;
        if init_deriv > T::zero() {
            self.pos_init_deriv = true;
            self.curr_step = -self.curr_step;
            self.min_deriv = -self.min_deriv;
        }
        Ok(())
    }

    fn status(&self) -> Status {
        Status::Continue
    }

    fn iterate<F: ScalarGradFunction<T>>(&mut self, f: &mut F) -> Result<ScalarGradEval<T>> {
        let loc = self.init_loc + self.curr_step;
        let (obj, real_deriv) = f.eval_with_deriv(loc)?;

        let deriv = if self.pos_init_deriv {
            -real_deriv
        } else {
            real_deriv
        };
        let eval = ScalarGradEval {
            loc,
            obj,
            deriv: real_deriv,
            n_fun_evals: 1,
        };

        // Objectives within machine epsilon are treated as equal when
        // deciding whether a doubling step made progress
        let tie = T::EPSILON;
        if <T as Float>::is_infinite(self.max_step) || self.max_deriv < T::zero() {
            // Still looking for an upper bound on the minimizer
            if deriv > T::zero() {
                // Sign change: the minimizer is bracketed
                self.max_step = self.curr_step;
                self.max_obj = obj;
                self.max_deriv = deriv;
                self.curr_step = (self.min_step + self.max_step) / (T::one() + T::one());
            } else if within_abs_or_rel(self.min_obj, obj, tie, tie) || obj < self.min_obj {
                // Decrease (or too close to call, in which case trust the
                // negative derivative): keep moving in this direction
                self.min_step = self.curr_step;
                self.min_obj = obj;
                self.min_deriv = deriv;
                if <T as Float>::is_infinite(self.max_step) {
                    self.curr_step = self.curr_step * (T::one() + T::one());
                } else {
                    self.curr_step = (self.min_step + self.max_step) / (T::one() + T::one());
                }
            } else {
                // Objective increased while the derivative stayed negative:
                // a local minimum was skipped over, so bound it here
                self.max_step = self.curr_step;
                self.max_obj = obj;
                self.max_deriv = deriv;
                self.curr_step = (self.min_step + self.max_step) / (T::one() + T::one());
            }
            return Ok(eval);
        }

        // Bracketed: bisect, moving the bound with the matching sign
        if deriv < T::zero() {
            self.min_step = self.curr_step;
            self.min_obj = obj;
            self.min_deriv = deriv;
        } else {
            self.max_step = self.curr_step;
            self.max_obj = obj;
            self.max_deriv = deriv;
        }
        self.curr_step = (self.min_step + self.max_step) / (T::one() + T::one());
        Ok(eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{minimize_scalar_grad, ScalarSettings};
    use approx::assert_relative_eq;
    use descent_core::convergence::ToleranceSettings;

    fn quadratic(x: f64) -> (f64, f64) {
        ((x - 3.0) * (x - 3.0) + 5.0, 2.0 * (x - 3.0))
    }

    #[test]
    fn test_zero_initial_step_rejected() {
        let mut b = Bisection::<f64>::new();
        b.set_initial_step(0.0);
        let err = b.init(0.0, 1.0, -1.0).unwrap_err();
        assert!(matches!(err, DescentError::ZeroInitialStep));
    }

    #[test]
    fn test_converges_on_quadratic() {
        let mut f = quadratic;
        let settings = ScalarSettings {
            tolerance: ToleranceSettings::default().with_grad_abs_tol(1e-8),
            ..ScalarSettings::default()
        };
        let mut solver = Bisection::new();
        let result = minimize_scalar_grad(&mut f, -7.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::GradAbsTol);
        assert_relative_eq!(result.loc, 3.0, epsilon = 1e-7);
        assert!(result.deriv.abs() < 1e-8);
    }

    #[test]
    fn test_positive_initial_derivative_searches_backwards() {
        // Start to the right of the minimum, so the derivative is positive
        let mut f = quadratic;
        let settings = ScalarSettings {
            tolerance: ToleranceSettings::default().with_grad_abs_tol(1e-8),
            ..ScalarSettings::default()
        };
        let mut solver = Bisection::new();
        let result = minimize_scalar_grad(&mut f, 11.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::GradAbsTol);
        assert_relative_eq!(result.loc, 3.0, epsilon = 1e-7);
    }

    #[test]
    fn test_step_stays_finite() {
        // Steep valley: doubling must stop once the objective rises
        let mut f = |x: f64| (x * x * x * x, 4.0 * x * x * x);
        let settings = ScalarSettings {
            tolerance: ToleranceSettings::default().with_grad_abs_tol(1e-10),
            ..ScalarSettings::default()
        };
        let mut solver = Bisection::new();
        let result = minimize_scalar_grad(&mut f, -2.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::GradAbsTol);
        assert!(result.loc.is_finite());
        assert!(result.loc.abs() < 1.0);
    }

    #[test]
    fn test_reuse_is_deterministic() {
        let mut f = quadratic;
        let settings = ScalarSettings {
            tolerance: ToleranceSettings::default().with_grad_abs_tol(1e-8),
            ..ScalarSettings::default()
        };
        let mut solver = Bisection::new();
        let first = minimize_scalar_grad(&mut f, -7.0, &settings, &mut solver).unwrap();
        let second = minimize_scalar_grad(&mut f, -7.0, &settings, &mut solver).unwrap();
        assert_eq!(first.iterations, second.iterations);
        assert_eq!(first.fun_evals, second.fun_evals);
        assert_eq!(first.loc, second.loc);
    }

    proptest::proptest! {
        #[test]
        fn prop_finds_quadratic_minimum_on_either_side(c in -20.0f64..20.0) {
            let mut f = move |x: f64| ((x - c) * (x - c), 2.0 * (x - c));
            let settings = ScalarSettings {
                tolerance: ToleranceSettings::default().with_grad_abs_tol(1e-8),
                ..ScalarSettings::default()
            };
            let mut solver = Bisection::new();
            let result = minimize_scalar_grad(&mut f, 0.0, &settings, &mut solver).unwrap();
            proptest::prop_assert!(result.status.converged());
            proptest::prop_assert!((result.loc - c).abs() < 1e-6);
        }
    }
}
