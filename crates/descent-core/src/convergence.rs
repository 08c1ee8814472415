//! Convergence checking and computational budgets.
//!
//! Optimizers in this workspace never decide for themselves when to stop;
//! they report [`Status::Continue`] and leave termination to a
//! [`ConvergenceChecker`] and a [`Budget`] polled once per outer iteration.

use crate::status::Status;
use crate::types::Scalar;
use num_traits::Float;
use std::time::{Duration, Instant};

/// Absolute and windowed-relative convergence test on one scalar series.
///
/// The absolute test fires when the most recent value drops below
/// `abs_tol`; a NaN tolerance disables it. The relative test fires when the
/// most recent value differs by less than `rel_tol` from the value added
/// `window` updates ago; a negative tolerance disables it.
#[derive(Debug, Clone)]
pub struct Tolerance<T: Scalar> {
    hist: Vec<T>,
    last: usize,
    filled: bool,

    abs_tol: T,
    rel_tol: T,

    recent: T,
}

impl<T: Scalar> Tolerance<T> {
    /// Creates a tolerance seeded with the value at the starting point.
    pub fn new(abs_tol: T, rel_tol: T, window: usize, init_val: T) -> Self {
        let hist = if rel_tol > T::zero() {
            let mut h = vec![T::zero(); window.max(1)];
            h[0] = init_val;
            h
        } else {
            Vec::new()
        };
        Self {
            hist,
            last: 0,
            filled: false,
            abs_tol,
            rel_tol,
            recent: init_val,
        }
    }

    /// Records the value observed at the end of an iteration.
    pub fn add(&mut self, v: T) {
        self.recent = v;
        if self.rel_tol > T::zero() {
            self.last += 1;
            if self.last == self.hist.len() {
                self.last = 0;
                self.filled = true;
            }
            self.hist[self.last] = v;
        }
    }

    /// True if the most recent value is below the absolute tolerance.
    pub fn abs_converged(&self) -> bool {
        if Float::is_nan(self.abs_tol) {
            return false;
        }
        self.recent < self.abs_tol
    }

    /// True if the most recent value is within the relative tolerance of the
    /// value added `window` updates ago.
    ///
    /// Always false until the history window has filled once, so a short run
    /// cannot converge against the zero-initialized history.
    pub fn rel_converged(&self) -> bool {
        if self.rel_tol <= T::zero() || !self.filled {
            return false;
        }
        let recent = self.hist[self.last];
        let prev_ind = (self.last + 1) % self.hist.len();
        let previous = self.hist[prev_ind];
        <T as Float>::abs(previous - recent) < self.rel_tol
    }
}

/// Tolerances on the gradient norm and objective value series.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToleranceSettings<T: Scalar> {
    /// Absolute tolerance on the gradient norm.
    pub grad_abs_tol: T,
    /// Relative tolerance on the gradient norm. Negative disables.
    pub grad_rel_tol: T,
    /// Window length for the relative gradient comparison.
    pub grad_rel_window: usize,
    /// Absolute tolerance on the objective value. NaN disables.
    pub obj_abs_tol: T,
    /// Relative tolerance on the objective value. Negative disables.
    pub obj_rel_tol: T,
    /// Window length for the relative objective comparison.
    pub obj_rel_window: usize,
}

impl<T: Scalar> Default for ToleranceSettings<T> {
    fn default() -> Self {
        Self {
            grad_abs_tol: T::DEFAULT_GRADIENT_TOLERANCE,
            grad_rel_tol: -T::one(),
            grad_rel_window: 5,
            obj_abs_tol: <T as Float>::nan(),
            obj_rel_tol: -T::one(),
            obj_rel_window: 5,
        }
    }
}

impl<T: Scalar> ToleranceSettings<T> {
    /// Creates the default tolerance settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute tolerance on the gradient norm.
    pub fn with_grad_abs_tol(mut self, tol: T) -> Self {
        self.grad_abs_tol = tol;
        self
    }

    /// Sets the relative tolerance on the gradient norm.
    pub fn with_grad_rel_tol(mut self, tol: T) -> Self {
        self.grad_rel_tol = tol;
        self
    }

    /// Sets the absolute tolerance on the objective value.
    pub fn with_obj_abs_tol(mut self, tol: T) -> Self {
        self.obj_abs_tol = tol;
        self
    }

    /// Sets the relative tolerance on the objective value.
    pub fn with_obj_rel_tol(mut self, tol: T) -> Self {
        self.obj_rel_tol = tol;
        self
    }
}

/// Per-run convergence state for an optimizer with a single scalar output.
///
/// Feed it the gradient norm and objective value once per outer iteration;
/// `status` reports the first matching tolerance.
#[derive(Debug, Clone)]
pub struct ConvergenceChecker<T: Scalar> {
    grad: Tolerance<T>,
    obj: Tolerance<T>,
}

impl<T: Scalar> ConvergenceChecker<T> {
    /// Creates a checker seeded with the objective and gradient norm at the
    /// starting point.
    pub fn new(settings: &ToleranceSettings<T>, init_obj: T, init_grad_norm: T) -> Self {
        Self {
            grad: Tolerance::new(
                settings.grad_abs_tol,
                settings.grad_rel_tol,
                settings.grad_rel_window,
                init_grad_norm,
            ),
            obj: Tolerance::new(
                settings.obj_abs_tol,
                settings.obj_rel_tol,
                settings.obj_rel_window,
                init_obj,
            ),
        }
    }

    /// Records the values observed at the end of an iteration.
    pub fn update(&mut self, grad_norm: T, obj: T) {
        self.grad.add(grad_norm);
        self.obj.add(obj);
    }

    /// Reports the first matching tolerance, or [`Status::Continue`].
    pub fn status(&self) -> Status {
        if self.grad.abs_converged() {
            return Status::GradAbsTol;
        }
        if self.grad.rel_converged() {
            return Status::GradRelTol;
        }
        if self.obj.abs_converged() {
            return Status::ObjAbsTol;
        }
        if self.obj.rel_converged() {
            return Status::ObjRelTol;
        }
        Status::Continue
    }
}

/// Iteration, evaluation, and runtime limits for a single run.
///
/// `None` means unlimited. The limits are polled once per outer iteration,
/// so a single line search may overshoot a budget before the next poll.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BudgetSettings {
    /// Maximum number of major iterations.
    pub max_iterations: Option<usize>,
    /// Maximum number of objective evaluations.
    pub max_fun_evals: Option<usize>,
    /// Maximum wall-clock runtime.
    pub max_runtime: Option<Duration>,
}

impl BudgetSettings {
    /// Creates an unlimited budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Sets the function evaluation limit.
    pub fn with_max_fun_evals(mut self, max: usize) -> Self {
        self.max_fun_evals = Some(max);
        self
    }

    /// Sets the runtime limit.
    pub fn with_max_runtime(mut self, max: Duration) -> Self {
        self.max_runtime = Some(max);
        self
    }
}

/// Running iteration and evaluation counters checked against a
/// [`BudgetSettings`].
#[derive(Debug, Clone)]
pub struct Budget {
    settings: BudgetSettings,
    iterations: usize,
    fun_evals: usize,
    start: Instant,
}

impl Budget {
    /// Starts the budget clock.
    pub fn new(settings: BudgetSettings) -> Self {
        Self {
            settings,
            iterations: 0,
            fun_evals: 0,
            start: Instant::now(),
        }
    }

    /// Records one completed iteration and its evaluation count.
    pub fn record(&mut self, n_fun_evals: usize) {
        self.iterations += 1;
        self.fun_evals += n_fun_evals;
    }

    /// Number of completed iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of objective evaluations consumed so far.
    pub fn fun_evals(&self) -> usize {
        self.fun_evals
    }

    /// Wall-clock time elapsed since the budget started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Reports the first exhausted limit, or [`Status::Continue`].
    pub fn status(&self) -> Status {
        if let Some(max) = self.settings.max_iterations {
            if self.iterations > max {
                return Status::MaxIterations;
            }
        }
        if let Some(max) = self.settings.max_fun_evals {
            if self.fun_evals > max {
                return Status::MaxFunctionEvaluations;
            }
        }
        if let Some(max) = self.settings.max_runtime {
            if self.start.elapsed() > max {
                return Status::MaxRuntime;
            }
        }
        Status::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_tolerance() {
        let mut tol = Tolerance::new(1e-6_f64, -1.0, 5, 1.0);
        assert!(!tol.abs_converged());
        tol.add(1e-3);
        assert!(!tol.abs_converged());
        tol.add(1e-7);
        assert!(tol.abs_converged());
    }

    #[test]
    fn test_nan_abs_tolerance_disabled() {
        let mut tol = Tolerance::new(f64::NAN, -1.0, 5, 1.0);
        tol.add(0.0);
        assert!(!tol.abs_converged());
    }

    #[test]
    fn test_rel_tolerance_requires_full_window() {
        let mut tol = Tolerance::new(f64::NAN, 1e-8, 3, 5.0);
        // Adding identical values: the window has not filled yet
        tol.add(5.0);
        assert!(!tol.rel_converged());
        tol.add(5.0);
        tol.add(5.0);
        assert!(tol.rel_converged());
    }

    #[test]
    fn test_rel_tolerance_window_comparison() {
        let mut tol = Tolerance::new(f64::NAN, 0.5, 2, 10.0);
        tol.add(9.0);
        tol.add(8.0); // window filled; compares against 9.0
        assert!(!tol.rel_converged());
        tol.add(7.9); // compares against 8.0
        assert!(tol.rel_converged());
    }

    #[test]
    fn test_checker_precedence() {
        let settings = ToleranceSettings::<f64>::default()
            .with_grad_abs_tol(1e-6)
            .with_obj_abs_tol(1e-6);
        let mut checker = ConvergenceChecker::new(&settings, 1.0, 1.0);
        assert_eq!(checker.status(), Status::Continue);

        // Both below tolerance: the gradient test takes precedence
        checker.update(1e-8, 1e-8);
        assert_eq!(checker.status(), Status::GradAbsTol);
    }

    #[test]
    fn test_budget_iterations() {
        let mut budget = Budget::new(BudgetSettings::new().with_max_iterations(2));
        assert_eq!(budget.status(), Status::Continue);
        budget.record(1);
        budget.record(1);
        assert_eq!(budget.status(), Status::Continue);
        budget.record(1);
        assert_eq!(budget.status(), Status::MaxIterations);
        assert_eq!(budget.iterations(), 3);
    }

    #[test]
    fn test_budget_fun_evals() {
        let mut budget = Budget::new(BudgetSettings::new().with_max_fun_evals(10));
        budget.record(10);
        assert_eq!(budget.status(), Status::Continue);
        budget.record(1);
        assert_eq!(budget.status(), Status::MaxFunctionEvaluations);
        assert_eq!(budget.fun_evals(), 11);
    }

    #[test]
    fn test_unlimited_budget() {
        let mut budget = Budget::new(BudgetSettings::new());
        for _ in 0..10_000 {
            budget.record(3);
        }
        assert_eq!(budget.status(), Status::Continue);
    }
}
