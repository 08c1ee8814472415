//! Derivative-free golden-section search.

use crate::solver::{ScalarEval, ScalarGradEval, ScalarGradSolver, ScalarSolver};
use descent_core::objective::{ScalarFunction, ScalarGradFunction};
use descent_core::types::{constants, within_abs_or_rel, Scalar};
use descent_core::{DescentError, Result, Status};
use num_traits::Float;

/// Golden-section search along a ray from the starting location.
///
/// Assumes a minimum exists in the direction of the initial step and finds
/// the one nearest the start (not guaranteed for multimodal objectives).
/// Works in three phases: double the step until the objective stops
/// improving, place an interior point with the golden ratio, then shrink
/// the three-point bracket. A trial worse than both bracket ends means a
/// second minimum was skipped; the far bound is reset and bracket
/// formation restarts from the near side.
///
/// Terminal when the bracket ends agree within `tol` relative to the start
/// location, or when the interior point has collapsed onto an endpoint.
#[derive(Debug, Clone)]
pub struct GoldenSection<T: Scalar> {
    initial_step: T,
    tol: T,

    init_loc: T,
    current_step: T,
    closer_to_min: bool,

    min_step: T,
    min_obj: T,

    max_step: T,
    max_obj: T,

    middle_step: T,
    middle_obj: T,
}

impl<T: Scalar> GoldenSection<T> {
    /// Creates a search with the given initial step (its sign selects the
    /// search direction) and bracket tolerance.
    pub fn new(initial_step: T, tol: T) -> Self {
        Self {
            initial_step,
            tol,
            init_loc: T::zero(),
            current_step: T::zero(),
            closer_to_min: false,
            min_step: T::zero(),
            min_obj: T::zero(),
            max_step: T::zero(),
            max_obj: T::zero(),
            middle_step: T::zero(),
            middle_obj: T::zero(),
        }
    }

    /// Sets the magnitude and direction of the first trial step.
    pub fn set_initial_step(&mut self, step: T) {
        self.initial_step = step;
    }

    fn reset_max(&mut self, new_obj: T) {
        // The new point is higher than both ends, so there is more than one
        // local minimum in the bracket. Restart toward the initial point.
        self.max_step = self.current_step;
        self.max_obj = new_obj;
        let (step, closer) = golden_no_middle_step(self.min_step, self.max_step);
        self.current_step = step;
        self.closer_to_min = closer;
        self.middle_step = <T as Float>::infinity();
    }
}

/// Places an interior point in a bracket with no middle yet.
///
/// Returns the new step and whether it lies closer to the near bound.
fn golden_no_middle_step<T: Scalar>(min: T, max: T) -> (T, bool) {
    let resphi = constants::golden_shrink::<T>();
    (min + resphi * (max - min), true)
}

/// Places the next trial point in a full three-point bracket.
///
/// Returns the new step and whether it lies closer to the near bound than
/// the middle point does.
fn golden_new_step<T: Scalar>(min: T, max: T, middle: T) -> (T, bool) {
    let resphi = constants::golden_shrink::<T>();
    let new_loc;
    if max > T::zero() {
        if (max - middle) > (middle - min) {
            new_loc = middle + resphi * (max - middle);
        } else {
            new_loc = middle - resphi * (middle - min);
        }
        return (new_loc, (middle - min) > (new_loc - min));
    }
    if (max - middle) < (middle - min) {
        new_loc = middle + resphi * (max - middle);
    } else {
        new_loc = middle - resphi * (middle - min);
    }
    (new_loc, (middle - min) < (new_loc - min))
}

impl<T: Scalar> ScalarSolver<T> for GoldenSection<T> {
    fn init(&mut self, init_loc: T, init_obj: T) -> Result<()> {
        if self.initial_step == T::zero() {
            return Err(DescentError::ZeroInitialStep);
        }
        self.init_loc = init_loc;

        if self.initial_step > T::zero() {
            self.max_step = <T as Float>::infinity();
        } else {
            self.max_step = <T as Float>::neg_infinity();
        }
        self.max_obj = <T as Float>::infinity();

        self.current_step = self.initial_step;
        self.closer_to_min = false;

        self.min_step = T::zero();
        self.min_obj = init_obj;

        self.middle_step = <T as Float>::infinity();
        self.middle_obj = <T as Float>::infinity();

        Ok(())
    }

    fn status(&self) -> Status {
        if within_abs_or_rel(
            self.max_step + self.init_loc,
            self.min_step + self.init_loc,
            self.tol,
            self.tol,
        ) {
            return Status::BoundsConverged;
        }
        // Floating-point exhaustion: the interior point has collapsed onto
        // an endpoint
        if <T as Float>::is_finite(self.middle_step)
            && (self.middle_step == self.max_step || self.middle_step == self.min_step)
        {
            return Status::BoundsConverged;
        }
        Status::Continue
    }

    fn iterate<F: ScalarFunction<T>>(&mut self, f: &mut F) -> Result<ScalarEval<T>> {
        let loc = self.init_loc + self.current_step;
        let new_obj = f.eval(loc)?;
        let eval = ScalarEval {
            loc,
            obj: new_obj,
            n_fun_evals: 1,
        };

        if <T as Float>::is_infinite(self.max_step) {
            // Still looking for a bound on the minimizer
            if new_obj >= self.min_obj {
                self.max_step = self.current_step;
                self.max_obj = new_obj;
                let (step, closer) = if <T as Float>::is_infinite(self.middle_step) {
                    golden_no_middle_step(self.min_step, self.max_step)
                } else {
                    golden_new_step(self.min_step, self.max_step, self.middle_step)
                };
                self.current_step = step;
                self.closer_to_min = closer;
            } else {
                // No bound yet; remember the best interior point and keep
                // doubling
                if new_obj < self.middle_obj {
                    self.middle_obj = new_obj;
                    self.middle_step = self.current_step;
                }
                self.current_step = self.current_step * (T::one() + T::one());
            }
            return Ok(eval);
        }

        if <T as Float>::is_infinite(self.middle_step) {
            // Bounded, but no interior point yet
            if new_obj < self.min_obj && new_obj < self.max_obj {
                self.middle_step = self.current_step;
                self.middle_obj = new_obj;
                let (step, closer) =
                    golden_new_step(self.min_step, self.max_step, self.middle_step);
                self.current_step = step;
                self.closer_to_min = closer;
            } else {
                self.reset_max(new_obj);
            }
            return Ok(eval);
        }

        if new_obj > self.min_obj && new_obj > self.max_obj {
            self.reset_max(new_obj);
            return Ok(eval);
        }

        if new_obj < self.middle_obj {
            // The trial replaces the middle; the old middle becomes the
            // bound on its own side
            if self.closer_to_min {
                self.max_step = self.middle_step;
                self.max_obj = self.middle_obj;
            } else {
                self.min_step = self.middle_step;
                self.min_obj = self.middle_obj;
            }
            self.middle_step = self.current_step;
            self.middle_obj = new_obj;
        } else if self.closer_to_min {
            self.min_step = self.current_step;
            self.min_obj = new_obj;
        } else {
            self.max_step = self.current_step;
            self.max_obj = new_obj;
        }

        let (step, closer) = golden_new_step(self.min_step, self.max_step, self.middle_step);
        self.current_step = step;
        self.closer_to_min = closer;
        Ok(eval)
    }
}

/// Golden-section as a derivative-based solver.
///
/// Evaluates the objective together with its derivative so evaluation
/// wrappers see gradient information, but ignores the derivative in its
/// own bracketing logic. This lets the search stand in wherever a
/// derivative-based step finder is expected.
impl<T: Scalar> ScalarGradSolver<T> for GoldenSection<T> {
    fn init(&mut self, init_loc: T, init_obj: T, _init_deriv: T) -> Result<()> {
        <Self as ScalarSolver<T>>::init(self, init_loc, init_obj)
    }

    fn status(&self) -> Status {
        <Self as ScalarSolver<T>>::status(self)
    }

    fn iterate<F: ScalarGradFunction<T>>(&mut self, f: &mut F) -> Result<ScalarGradEval<T>> {
        struct WithDeriv<'a, T, F> {
            inner: &'a mut F,
            last_deriv: T,
        }

        impl<T: Scalar, F: ScalarGradFunction<T>> ScalarFunction<T> for WithDeriv<'_, T, F> {
            fn eval(&mut self, x: T) -> Result<T> {
                let (obj, deriv) = self.inner.eval_with_deriv(x)?;
                self.last_deriv = deriv;
                Ok(obj)
            }
        }

        let mut wrapped = WithDeriv {
            inner: f,
            last_deriv: <T as Float>::nan(),
        };
        let eval = <Self as ScalarSolver<T>>::iterate(self, &mut wrapped)?;
        Ok(ScalarGradEval {
            loc: eval.loc,
            obj: eval.obj,
            deriv: wrapped.last_deriv,
            n_fun_evals: eval.n_fun_evals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{minimize_scalar, minimize_scalar_grad, ScalarSettings};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn quadratic(x: f64) -> f64 {
        (x - 3.0) * (x - 3.0) + 5.0
    }

    #[test]
    fn test_converges_on_quadratic() {
        let tol = 1e-7;
        let mut f = quadratic;
        let mut solver = GoldenSection::new(1.0, tol);
        let settings = ScalarSettings::default();

        let result = minimize_scalar(&mut f, -7.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::BoundsConverged);
        assert!((result.loc - 3.0).abs() < tol);

        // Reuse must reproduce the run exactly
        let again = minimize_scalar(&mut f, -7.0, &settings, &mut solver).unwrap();
        assert_eq!(again.iterations, result.iterations);
        assert_eq!(again.loc, result.loc);
    }

    #[test]
    fn test_start_past_minimum_returns_start() {
        let tol = 1e-7;
        let mut f = quadratic;
        let mut solver = GoldenSection::new(1.0, tol);
        let settings = ScalarSettings::default();

        let large_init = 13.0;
        let result = minimize_scalar(&mut f, large_init, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::BoundsConverged);
        assert!(within_abs_or_rel(result.loc, large_init, tol, tol));
    }

    #[test]
    fn test_negative_initial_step() {
        let tol = 1e-7;
        let mut f = quadratic;
        let mut solver = GoldenSection::new(-1.0, tol);
        let settings = ScalarSettings::default();

        let result = minimize_scalar(&mut f, 14.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::BoundsConverged);
        assert!(within_abs_or_rel(result.loc, 3.0, tol, tol));
    }

    #[test]
    fn test_zero_initial_step_rejected() {
        let mut solver = GoldenSection::<f64>::new(0.0, 1e-7);
        let err = ScalarSolver::init(&mut solver, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, DescentError::ZeroInitialStep));
    }

    #[test]
    fn test_derivative_based_interface() {
        // Same search through the derivative-carrying interface
        let tol = 1e-7;
        let mut f = |x: f64| (quadratic(x), 2.0 * (x - 3.0));
        let mut solver = GoldenSection::new(1.0, tol);
        let settings = ScalarSettings::default();

        let result = minimize_scalar_grad(&mut f, -7.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::BoundsConverged);
        assert_relative_eq!(result.loc, 3.0, epsilon = 1e-6);
        // Derivative is reported from the last evaluation
        assert_relative_eq!(result.deriv, 2.0 * (result.loc - 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_golden_step_placement() {
        let resphi = 2.0 - 1.618033988749895;
        let (step, closer) = golden_no_middle_step(0.0_f64, 1.0);
        assert_relative_eq!(step, resphi, epsilon = 1e-12);
        assert!(closer);

        // Larger right-hand interval: the new point goes right of middle
        let (step, _) = golden_new_step(0.0_f64, 1.0, 0.3);
        assert_relative_eq!(step, 0.3 + resphi * 0.7, epsilon = 1e-12);
    }
}
