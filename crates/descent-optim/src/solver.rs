//! Multivariate solver trait and driver loop.

use descent_core::convergence::{Budget, BudgetSettings, ConvergenceChecker, ToleranceSettings};
use descent_core::objective::CostFunction;
use descent_core::reporting::{Field, NoReporter, Record, Reporter};
use descent_core::types::{DVector, Scalar};
use descent_core::{DescentError, Result, Status};
use std::time::Duration;

/// A gradient-based multivariate optimizer.
///
/// One call to `iterate` performs one outer iteration (for the
/// quasi-Newton solvers, one line search plus one direction update) and
/// writes the new location and gradient in place. The driver owns
/// convergence checking, budgets, and reporting.
pub trait GradSolver<T: Scalar> {
    /// Seeds the solver with the starting point, objective, and gradient.
    fn init(&mut self, init_loc: &DVector<T>, init_obj: T, init_grad: &DVector<T>) -> Result<()>;

    /// Reports a terminal condition internal to the solver, if any.
    fn status(&self) -> Status;

    /// Performs one outer iteration. Returns the new objective value and
    /// the number of objective evaluations consumed.
    fn iterate<C: CostFunction<T>>(
        &mut self,
        f: &C,
        loc: &mut DVector<T>,
        grad: &mut DVector<T>,
    ) -> Result<(T, usize)>;
}

/// Settings for the multivariate driver.
///
/// The default behavior is to run until convergence; bound the run with
/// the budget settings if an earlier stop is wanted.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Settings<T: Scalar> {
    /// Convergence tolerances.
    pub tolerance: ToleranceSettings<T>,
    /// Iteration, evaluation, and runtime limits.
    pub budget: BudgetSettings,
    /// Objective at the starting point, if already known.
    pub initial_objective: Option<T>,
    /// Gradient at the starting point, if already known. Used only
    /// together with `initial_objective`.
    pub initial_gradient: Option<DVector<T>>,
}

impl<T: Scalar> Settings<T> {
    /// Creates the default settings: run until convergence.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome of a multivariate minimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult<T: Scalar> {
    /// Lowest objective value seen. May not be a minimum if the run
    /// stopped early.
    pub obj: T,
    /// Location where `obj` was observed.
    pub loc: DVector<T>,
    /// Gradient where `obj` was observed.
    pub grad: DVector<T>,
    /// Outer iterations taken.
    pub iterations: usize,
    /// Objective evaluations consumed.
    pub fun_evals: usize,
    /// Wall-clock time elapsed.
    pub runtime: Duration,
    /// Terminal status of the run.
    pub status: Status,
}

impl<T: Scalar> OptimizationResult<T> {
    /// True if the run ended in a convergence status.
    pub fn converged(&self) -> bool {
        self.status.converged()
    }
}

/// Bookkeeping helper for multivariate optimizers.
///
/// Tracks the best point seen, the convergence state, and the budget.
/// Not intended for callers of [`minimize`], but exported for crates
/// that build their own iteration loops.
#[derive(Debug, Clone)]
pub struct Progress<T: Scalar> {
    budget: Budget,
    checker: ConvergenceChecker<T>,

    obj_best: T,
    loc_best: DVector<T>,
    grad_best: DVector<T>,
    grad_norm_best: T,
}

impl<T: Scalar> Progress<T> {
    /// Starts bookkeeping from the initial point, which seeds the best
    /// point seen so far.
    pub fn new(
        tolerance: &ToleranceSettings<T>,
        budget: BudgetSettings,
        init_loc: &DVector<T>,
        init_obj: T,
        init_grad: &DVector<T>,
    ) -> Self {
        let grad_norm = init_grad.norm();
        Self {
            budget: Budget::new(budget),
            checker: ConvergenceChecker::new(tolerance, init_obj, grad_norm),
            obj_best: init_obj,
            loc_best: init_loc.clone(),
            grad_best: init_grad.clone(),
            grad_norm_best: grad_norm,
        }
    }

    /// Records one completed outer iteration.
    pub fn update(&mut self, loc: &DVector<T>, obj: T, grad: &DVector<T>, n_fun_evals: usize) {
        self.budget.record(n_fun_evals);
        let grad_norm = grad.norm();
        self.checker.update(grad_norm, obj);

        if obj <= self.obj_best {
            self.obj_best = obj;
            self.loc_best.copy_from(loc);
            self.grad_best.copy_from(grad);
            self.grad_norm_best = grad_norm;
        }
    }

    /// First terminal condition from the tolerances or the budget.
    pub fn status(&self) -> Status {
        Status::first_terminal([self.checker.status(), self.budget.status()])
    }

    /// The current progress row for a reporter.
    pub fn records(&self) -> [Record; 4] {
        [
            Record::new("Iter", Field::Int(self.budget.iterations())),
            Record::new("FnEval", Field::Int(self.budget.fun_evals())),
            Record::new("Obj", Field::Float(self.obj_best.to_f64())),
            Record::new("Grad", Field::Float(self.grad_norm_best.to_f64())),
        ]
    }

    /// Finalizes the run into a result at the best point seen.
    pub fn result(&self, status: Status) -> OptimizationResult<T> {
        OptimizationResult {
            obj: self.obj_best,
            loc: self.loc_best.clone(),
            grad: self.grad_best.clone(),
            iterations: self.budget.iterations(),
            fun_evals: self.budget.fun_evals(),
            runtime: self.budget.elapsed(),
            status,
        }
    }
}

/// Minimizes a differentiable multivariate objective.
pub fn minimize<T, C, S>(
    f: &C,
    init_loc: &DVector<T>,
    settings: &Settings<T>,
    solver: &mut S,
) -> Result<OptimizationResult<T>>
where
    T: Scalar,
    C: CostFunction<T>,
    S: GradSolver<T>,
{
    minimize_with(f, init_loc, settings, solver, &mut NoReporter)
}

/// Minimizes a differentiable multivariate objective, reporting progress.
///
/// A line-search failure surfaces through the solver's status and an
/// error from the user's objective function through
/// [`Status::UserFunctionError`]; either terminates the run with the best
/// point seen so far, the failed search's evaluations included. All
/// other errors propagate.
pub fn minimize_with<T, C, S, R>(
    f: &C,
    init_loc: &DVector<T>,
    settings: &Settings<T>,
    solver: &mut S,
    reporter: &mut R,
) -> Result<OptimizationResult<T>>
where
    T: Scalar,
    C: CostFunction<T>,
    S: GradSolver<T>,
    R: Reporter,
{
    if init_loc.is_empty() {
        return Err(DescentError::invalid_parameter(
            "initial location is empty",
        ));
    }

    let (init_obj, init_grad) = match (&settings.initial_objective, &settings.initial_gradient) {
        (Some(obj), Some(grad)) => {
            if grad.len() != init_loc.len() {
                return Err(DescentError::dimension_mismatch(init_loc.len(), grad.len()));
            }
            (*obj, grad.clone())
        }
        _ => {
            let mut grad = DVector::zeros(init_loc.len());
            let obj = f.cost_and_gradient(init_loc, &mut grad)?;
            (obj, grad)
        }
    };

    let mut progress = Progress::new(
        &settings.tolerance,
        settings.budget.clone(),
        init_loc,
        init_obj,
        &init_grad,
    );
    solver.init(init_loc, init_obj, &init_grad)?;

    let mut loc = init_loc.clone();
    let mut grad = init_grad;

    reporter.start();
    let status = loop {
        let status = Status::first_terminal([progress.status(), solver.status()]);
        if status.is_terminal() {
            break status;
        }

        match solver.iterate(f, &mut loc, &mut grad) {
            Ok((obj, n_fun_evals)) => {
                progress.update(&loc, obj, &grad, n_fun_evals);
                reporter.iteration(&progress.records());
            }
            Err(DescentError::UserFunction { .. }) => {
                break Status::UserFunctionError;
            }
            Err(e) => return Err(e),
        }
    };
    reporter.finish(&progress.records());

    Ok(progress.result(status))
}
