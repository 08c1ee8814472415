//! Dense BFGS quasi-Newton solver.

use descent_core::objective::CostFunction;
use descent_core::types::{DMatrix, DVector, Scalar};
use descent_core::{DescentError, Result, Status};

use crate::line_search::{line_search, InterpolationStep, LineSearchSettings, StepFinder};
use crate::solver::GradSolver;

/// BFGS with an explicit dense inverse Hessian approximation.
///
/// Each iteration runs a strong-Wolfe line search along `-H g`, then
/// applies the standard rank-two update to `H`. Memory and per-iteration
/// cost are quadratic in the dimension; use [`Lbfgs`](crate::Lbfgs) for
/// large problems.
///
/// The update divides by the curvature `s . y` without a positivity
/// guard; the line search is responsible for producing steps with
/// positive curvature.
#[derive(Debug, Clone)]
pub struct Bfgs<T: Scalar, S: StepFinder<T> = InterpolationStep<T>> {
    line_settings: LineSearchSettings<T>,
    finder: S,

    n_dim: usize,
    status: Status,
    inv_hessian: DMatrix<T>,

    curr_loc: DVector<T>,
    curr_obj: T,
    prev_obj: T,
    curr_grad: DVector<T>,
    pub(crate) direction: DVector<T>,

    s: DVector<T>,
    y: DVector<T>,
    hy: DVector<T>,
    yh: DVector<T>,
}

impl<T: Scalar> Bfgs<T> {
    /// Creates a BFGS solver with the interpolation step finder.
    pub fn new() -> Self {
        Self::with_step_finder(InterpolationStep::new())
    }
}

impl<T: Scalar> Default for Bfgs<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, S: StepFinder<T>> Bfgs<T, S> {
    /// Creates a BFGS solver driving the given step finder.
    pub fn with_step_finder(finder: S) -> Self {
        Self {
            line_settings: LineSearchSettings::default(),
            finder,
            n_dim: 0,
            status: Status::Continue,
            inv_hessian: DMatrix::zeros(0, 0),
            curr_loc: DVector::zeros(0),
            curr_obj: T::zero(),
            prev_obj: T::zero(),
            curr_grad: DVector::zeros(0),
            direction: DVector::zeros(0),
            s: DVector::zeros(0),
            y: DVector::zeros(0),
            hy: DVector::zeros(0),
            yh: DVector::zeros(0),
        }
    }

    /// Sets the line search settings.
    pub fn with_line_search(mut self, settings: LineSearchSettings<T>) -> Self {
        self.line_settings = settings;
        self
    }
}

impl<T: Scalar, S: StepFinder<T>> GradSolver<T> for Bfgs<T, S> {
    fn init(&mut self, init_loc: &DVector<T>, init_obj: T, init_grad: &DVector<T>) -> Result<()> {
        if init_loc.is_empty() {
            return Err(DescentError::invalid_parameter(
                "initial location is empty",
            ));
        }
        if init_grad.len() != init_loc.len() {
            return Err(DescentError::dimension_mismatch(
                init_loc.len(),
                init_grad.len(),
            ));
        }
        let n = init_loc.len();
        self.n_dim = n;
        self.status = Status::Continue;

        self.curr_loc = init_loc.clone();
        self.curr_grad = init_grad.clone();
        self.curr_obj = init_obj;
        // Seed the previous objective well above the current one so the
        // first trial step comes out as one
        self.prev_obj = init_obj + <T as Scalar>::from_f64(5000.0);

        self.inv_hessian = DMatrix::identity(n, n);
        self.s = DVector::zeros(n);
        self.y = DVector::zeros(n);
        self.hy = DVector::zeros(n);
        self.yh = DVector::zeros(n);

        // With an identity Hessian the first direction is steepest descent
        self.direction = -init_grad.clone();
        Ok(())
    }

    fn status(&self) -> Status {
        self.status
    }

    fn iterate<C: CostFunction<T>>(
        &mut self,
        f: &C,
        loc: &mut DVector<T>,
        grad: &mut DVector<T>,
    ) -> Result<(T, usize)> {
        if loc.len() != self.n_dim || grad.len() != self.n_dim {
            return Err(DescentError::dimension_mismatch(self.n_dim, loc.len()));
        }

        let result = line_search(
            &self.line_settings,
            &mut self.finder,
            f,
            &self.direction,
            &self.curr_loc,
            self.curr_obj,
            &self.curr_grad,
            self.prev_obj,
        )?;

        if result.status != Status::WolfeConditionsMet {
            // No Wolfe step: skip the curvature update and surface the
            // failure through `status`, keeping the best point evaluated
            self.status = Status::LineSearchFailure;
            loc.copy_from(&result.loc);
            grad.copy_from(&result.grad);
            return Ok((result.obj, result.n_fun_evals));
        }

        // y = g_{k+1} - g_k, s = x_{k+1} - x_k
        self.y.copy_from(&result.grad);
        self.y -= &self.curr_grad;
        self.s.copy_from(&result.loc);
        self.s -= &self.curr_loc;

        let sy = self.s.dot(&self.y);

        // H y and y' H from the current approximation, before updating it
        self.hy.gemv(T::one(), &self.inv_hessian, &self.y, T::zero());
        self.yh.gemv_tr(T::one(), &self.inv_hessian, &self.y, T::zero());
        let yhy = self.y.dot(&self.hy);

        // H += (s.y + y'Hy)/(s.y)^2 s s' - (Hy s' + s y'H)/(s.y)
        let val = (sy + yhy) / (sy * sy);
        let neg_inv_sy = -T::one() / sy;
        self.inv_hessian.ger(val, &self.s, &self.s, T::one());
        self.inv_hessian.ger(neg_inv_sy, &self.hy, &self.s, T::one());
        self.inv_hessian.ger(neg_inv_sy, &self.s, &self.yh, T::one());

        self.curr_grad.copy_from(&result.grad);
        self.curr_loc.copy_from(&result.loc);
        self.prev_obj = self.curr_obj;
        self.curr_obj = result.obj;

        // d = -H g
        self.direction
            .gemv(-T::one(), &self.inv_hessian, &self.curr_grad, T::zero());

        loc.copy_from(&result.loc);
        grad.copy_from(&result.grad);
        Ok((result.obj, result.n_fun_evals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Sphere;

    impl CostFunction<f64> for Sphere {
        fn cost(&self, x: &DVector<f64>) -> Result<f64> {
            Ok(x.dot(x))
        }

        fn cost_and_gradient(&self, x: &DVector<f64>, grad: &mut DVector<f64>) -> Result<f64> {
            grad.copy_from(x);
            *grad *= 2.0;
            Ok(x.dot(x))
        }
    }

    #[test]
    fn test_empty_initial_location_rejected() {
        let mut solver = Bfgs::<f64>::new();
        let empty = DVector::zeros(0);
        let err = solver.init(&empty, 0.0, &empty).unwrap_err();
        assert!(matches!(err, DescentError::InvalidParameter { .. }));
    }

    #[test]
    fn test_gradient_length_mismatch_rejected() {
        let mut solver = Bfgs::<f64>::new();
        let loc = DVector::from_vec(vec![1.0, 2.0]);
        let grad = DVector::from_vec(vec![2.0]);
        let err = solver.init(&loc, 5.0, &grad).unwrap_err();
        assert!(matches!(
            err,
            DescentError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_first_direction_is_steepest_descent() {
        let mut solver = Bfgs::<f64>::new();
        let loc = DVector::from_vec(vec![1.0, 2.0]);
        let grad = DVector::from_vec(vec![2.0, 4.0]);
        solver.init(&loc, 5.0, &grad).unwrap();
        assert_relative_eq!(solver.direction[0], -2.0);
        assert_relative_eq!(solver.direction[1], -4.0);
    }

    #[test]
    fn test_single_iteration_reaches_quadratic_minimum() {
        // On the sphere the first line search lands on the origin and the
        // returned location and gradient reflect it
        let mut solver = Bfgs::<f64>::new();
        let init_loc = DVector::from_vec(vec![2.0, 0.0]);
        let init_grad = DVector::from_vec(vec![4.0, 0.0]);
        solver.init(&init_loc, 4.0, &init_grad).unwrap();

        let mut loc = init_loc.clone();
        let mut grad = init_grad.clone();
        let (obj, n) = solver.iterate(&Sphere, &mut loc, &mut grad).unwrap();
        assert!(n > 0);
        assert_relative_eq!(obj, 0.0, epsilon = 1e-12);
        assert_relative_eq!(loc[0], 0.0, epsilon = 1e-8);
        assert_relative_eq!(grad[0], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_inverse_hessian_update_on_quadratic() {
        // For f(x) = x.x the true inverse Hessian is I/2; after one update
        // the approximation maps y = 2s onto s
        let mut solver = Bfgs::<f64>::new();
        let init_loc = DVector::from_vec(vec![2.0, 0.0]);
        let init_grad = DVector::from_vec(vec![4.0, 0.0]);
        solver.init(&init_loc, 4.0, &init_grad).unwrap();

        let mut loc = init_loc.clone();
        let mut grad = init_grad.clone();
        solver.iterate(&Sphere, &mut loc, &mut grad).unwrap();

        let s = &loc - &init_loc;
        let y = 2.0 * &s;
        let mapped = &solver.inv_hessian * &y;
        assert_relative_eq!(mapped[0], s[0], epsilon = 1e-10);
        assert_relative_eq!(mapped[1], s[1], epsilon = 1e-10);
    }
}
