//! Solver traits and driver loops for scalar minimization.
//!
//! A solver advances one trial evaluation per call and reports
//! [`Status::Continue`] unless it has a terminal condition of its own;
//! the driver owns convergence checking, budgets, and reporting.

use descent_core::convergence::{Budget, BudgetSettings, ConvergenceChecker, ToleranceSettings};
use descent_core::objective::{ScalarFunction, ScalarGradFunction};
use descent_core::reporting::{Field, NoReporter, Record, Reporter};
use descent_core::types::Scalar;
use descent_core::{Result, Status};
use num_traits::Float;
use std::time::Duration;

/// One trial evaluation from a derivative-free solver.
#[derive(Debug, Clone, Copy)]
pub struct ScalarEval<T: Scalar> {
    /// Location that was evaluated.
    pub loc: T,
    /// Objective value at `loc`.
    pub obj: T,
    /// Objective evaluations consumed by this call.
    pub n_fun_evals: usize,
}

/// One trial evaluation from a derivative-based solver.
#[derive(Debug, Clone, Copy)]
pub struct ScalarGradEval<T: Scalar> {
    /// Location that was evaluated.
    pub loc: T,
    /// Objective value at `loc`.
    pub obj: T,
    /// Derivative at `loc`.
    pub deriv: T,
    /// Objective evaluations consumed by this call.
    pub n_fun_evals: usize,
}

/// A derivative-free scalar minimizer.
pub trait ScalarSolver<T: Scalar> {
    /// Seeds the solver with the starting point and its objective value.
    fn init(&mut self, init_loc: T, init_obj: T) -> Result<()>;

    /// Reports a terminal condition internal to the solver, if any.
    fn status(&self) -> Status;

    /// Evaluates one trial point and updates the solver's bracket.
    fn iterate<F: ScalarFunction<T>>(&mut self, f: &mut F) -> Result<ScalarEval<T>>;
}

/// A derivative-based scalar minimizer.
pub trait ScalarGradSolver<T: Scalar> {
    /// Seeds the solver with the starting point, objective, and derivative.
    fn init(&mut self, init_loc: T, init_obj: T, init_deriv: T) -> Result<()>;

    /// Reports a terminal condition internal to the solver, if any.
    fn status(&self) -> Status;

    /// Evaluates one trial point and updates the solver's bracket.
    fn iterate<F: ScalarGradFunction<T>>(&mut self, f: &mut F) -> Result<ScalarGradEval<T>>;
}

/// Settings for the scalar driver loops.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarSettings<T: Scalar> {
    /// Convergence tolerances.
    pub tolerance: ToleranceSettings<T>,
    /// Iteration, evaluation, and runtime limits.
    pub budget: BudgetSettings,
    /// Objective at the starting point, if already known.
    pub initial_objective: Option<T>,
    /// Derivative at the starting point, if already known. Used only
    /// together with `initial_objective`.
    pub initial_derivative: Option<T>,
}

impl<T: Scalar> ScalarSettings<T> {
    /// Creates the default settings: run until convergence.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome of a scalar minimization run.
#[derive(Debug, Clone, Copy)]
pub struct ScalarResult<T: Scalar> {
    /// Final location.
    pub loc: T,
    /// Objective value at `loc`.
    pub obj: T,
    /// Derivative at `loc`; infinite for derivative-free runs.
    pub deriv: T,
    /// Iterations taken.
    pub iterations: usize,
    /// Objective evaluations consumed.
    pub fun_evals: usize,
    /// Wall-clock time elapsed.
    pub runtime: Duration,
    /// Terminal status of the run.
    pub status: Status,
}

impl<T: Scalar> ScalarResult<T> {
    /// True if the run ended in a convergence status.
    pub fn converged(&self) -> bool {
        self.status.converged()
    }
}

/// Bookkeeping helper for scalar solvers: convergence, budget, and the
/// current point.
///
/// Not intended for callers of the driver functions, but exported for
/// other crates that build their own iteration loops.
#[derive(Debug, Clone)]
pub struct ScalarProgress<T: Scalar> {
    budget: Budget,
    checker: ConvergenceChecker<T>,

    loc: T,
    obj: T,
    deriv: T,
}

impl<T: Scalar> ScalarProgress<T> {
    /// Starts bookkeeping from the initial point.
    pub fn new(
        tolerance: &ToleranceSettings<T>,
        budget: BudgetSettings,
        init_loc: T,
        init_obj: T,
        init_deriv: T,
    ) -> Self {
        Self {
            budget: Budget::new(budget),
            checker: ConvergenceChecker::new(tolerance, init_obj, <T as Float>::abs(init_deriv)),
            loc: init_loc,
            obj: init_obj,
            deriv: init_deriv,
        }
    }

    /// Records one completed iteration.
    pub fn update(&mut self, loc: T, obj: T, deriv: T, n_fun_evals: usize) {
        self.budget.record(n_fun_evals);
        self.checker.update(<T as Float>::abs(deriv), obj);
        self.loc = loc;
        self.obj = obj;
        self.deriv = deriv;
    }

    /// First terminal condition from the tolerances or the budget.
    pub fn status(&self) -> Status {
        Status::first_terminal([self.checker.status(), self.budget.status()])
    }

    /// Objective evaluations consumed so far.
    pub fn fun_evals(&self) -> usize {
        self.budget.fun_evals()
    }

    /// The current progress row for a reporter.
    pub fn records(&self) -> [Record; 4] {
        [
            Record::new("Iter", Field::Int(self.budget.iterations())),
            Record::new("FnEval", Field::Int(self.budget.fun_evals())),
            Record::new("Obj", Field::Float(self.obj.to_f64())),
            Record::new("Deriv", Field::Float(self.deriv.to_f64())),
        ]
    }

    /// Finalizes the run into a result.
    pub fn result(&self, status: Status) -> ScalarResult<T> {
        ScalarResult {
            loc: self.loc,
            obj: self.obj,
            deriv: self.deriv,
            iterations: self.budget.iterations(),
            fun_evals: self.budget.fun_evals(),
            runtime: self.budget.elapsed(),
            status,
        }
    }
}

/// Minimizes a derivative-free scalar objective.
pub fn minimize_scalar<T, F, S>(
    f: &mut F,
    init_loc: T,
    settings: &ScalarSettings<T>,
    solver: &mut S,
) -> Result<ScalarResult<T>>
where
    T: Scalar,
    F: ScalarFunction<T>,
    S: ScalarSolver<T>,
{
    minimize_scalar_with(f, init_loc, settings, solver, &mut NoReporter)
}

/// Minimizes a derivative-free scalar objective, reporting progress.
pub fn minimize_scalar_with<T, F, S, R>(
    f: &mut F,
    init_loc: T,
    settings: &ScalarSettings<T>,
    solver: &mut S,
    reporter: &mut R,
) -> Result<ScalarResult<T>>
where
    T: Scalar,
    F: ScalarFunction<T>,
    S: ScalarSolver<T>,
    R: Reporter,
{
    let init_obj = match settings.initial_objective {
        Some(obj) => obj,
        None => f.eval(init_loc)?,
    };

    let mut progress = ScalarProgress::new(
        &settings.tolerance,
        settings.budget.clone(),
        init_loc,
        init_obj,
        <T as Float>::infinity(),
    );
    solver.init(init_loc, init_obj)?;

    reporter.start();
    let status = loop {
        let status = Status::first_terminal([progress.status(), solver.status()]);
        if status.is_terminal() {
            break status;
        }
        let eval = solver.iterate(f)?;
        progress.update(eval.loc, eval.obj, <T as Float>::infinity(), eval.n_fun_evals);
        reporter.iteration(&progress.records());
    };
    reporter.finish(&progress.records());

    Ok(progress.result(status))
}

/// Minimizes a differentiable scalar objective.
pub fn minimize_scalar_grad<T, F, S>(
    f: &mut F,
    init_loc: T,
    settings: &ScalarSettings<T>,
    solver: &mut S,
) -> Result<ScalarResult<T>>
where
    T: Scalar,
    F: ScalarGradFunction<T>,
    S: ScalarGradSolver<T>,
{
    minimize_scalar_grad_with(f, init_loc, settings, solver, &mut NoReporter)
}

/// Minimizes a differentiable scalar objective, reporting progress.
pub fn minimize_scalar_grad_with<T, F, S, R>(
    f: &mut F,
    init_loc: T,
    settings: &ScalarSettings<T>,
    solver: &mut S,
    reporter: &mut R,
) -> Result<ScalarResult<T>>
where
    T: Scalar,
    F: ScalarGradFunction<T>,
    S: ScalarGradSolver<T>,
    R: Reporter,
{
    let (init_obj, init_deriv) = match (settings.initial_objective, settings.initial_derivative) {
        (Some(obj), Some(deriv)) => (obj, deriv),
        _ => f.eval_with_deriv(init_loc)?,
    };

    let mut progress = ScalarProgress::new(
        &settings.tolerance,
        settings.budget.clone(),
        init_loc,
        init_obj,
        init_deriv,
    );
    solver.init(init_loc, init_obj, init_deriv)?;

    reporter.start();
    let status = loop {
        let status = Status::first_terminal([progress.status(), solver.status()]);
        if status.is_terminal() {
            break status;
        }
        let eval = solver.iterate(f)?;
        progress.update(eval.loc, eval.obj, eval.deriv, eval.n_fun_evals);
        reporter.iteration(&progress.records());
    };
    reporter.finish(&progress.records());

    Ok(progress.result(status))
}
