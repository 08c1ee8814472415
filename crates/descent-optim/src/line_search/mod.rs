//! Strong-Wolfe line search along a descent direction.
//!
//! The search projects the multivariate objective onto a line, drives a
//! univariate [`StepFinder`] over it, and checks the Wolfe conditions
//! after every trial step. Any step finder can be plugged in; the
//! [`InterpolationStep`] stepper is the usual choice.

use descent_core::convergence::{BudgetSettings, ToleranceSettings};
use descent_core::objective::{CostFunction, ScalarGradFunction};
use descent_core::types::{DVector, Scalar};
use descent_core::{DescentError, Result, Status};
use descent_univariate::solver::{ScalarGradSolver, ScalarProgress};
use descent_univariate::{Bisection, GoldenSection};
use num_traits::Float;

mod interpolation;

pub use interpolation::InterpolationStep;

/// Wolfe condition constants.
///
/// `fun_const` is the sufficient-decrease constant (often written c1) and
/// `grad_const` the curvature constant (c2). With `strong` set, the
/// curvature test bounds the magnitude of the directional derivative
/// rather than its value.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WolfeParams<T: Scalar> {
    /// Sufficient-decrease constant. Must be non-negative.
    pub fun_const: T,
    /// Curvature constant. Must lie strictly between `fun_const` and one.
    pub grad_const: T,
    /// Use the strong form of the curvature condition.
    pub strong: bool,
}

impl<T: Scalar> Default for WolfeParams<T> {
    fn default() -> Self {
        Self {
            fun_const: T::zero(),
            grad_const: <T as Scalar>::from_f64(0.9),
            strong: true,
        }
    }
}

impl<T: Scalar> WolfeParams<T> {
    // 0 <= c1 < c2 < 1
    fn validate(&self) -> Result<()> {
        if self.fun_const < T::zero() {
            return Err(DescentError::invalid_parameter(
                "Wolfe sufficient-decrease constant is negative",
            ));
        }
        if self.grad_const <= self.fun_const {
            return Err(DescentError::invalid_parameter(
                "Wolfe curvature constant does not exceed the sufficient-decrease constant",
            ));
        }
        if self.grad_const >= T::one() {
            return Err(DescentError::invalid_parameter(
                "Wolfe curvature constant is not below one",
            ));
        }
        Ok(())
    }
}

/// Per-search Wolfe condition state.
///
/// Seed it with the objective and directional derivative at step zero,
/// feed it every trial step, and poll [`WolfeConditions::status`].
#[derive(Debug, Clone)]
pub struct WolfeConditions<T: Scalar> {
    fun_const: T,
    grad_const: T,
    strong: bool,

    init_obj: T,
    init_deriv: T,
    curr_obj: T,
    curr_deriv: T,
    step: T,
}

impl<T: Scalar> WolfeConditions<T> {
    /// Starts a check from the objective and directional derivative at the
    /// beginning of the line.
    pub fn new(params: &WolfeParams<T>, init_obj: T, init_deriv: T) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            fun_const: params.fun_const,
            grad_const: params.grad_const,
            strong: params.strong,
            init_obj,
            init_deriv,
            curr_obj: init_obj,
            curr_deriv: init_deriv,
            step: T::zero(),
        })
    }

    /// Records the most recent trial step.
    pub fn update(&mut self, step: T, obj: T, deriv: T) {
        self.curr_obj = obj;
        self.curr_deriv = deriv;
        self.step = step;
    }

    /// [`Status::WolfeConditionsMet`] once both conditions hold at the most
    /// recent step.
    pub fn status(&self) -> Status {
        if self.strong {
            if self.curr_obj > self.init_obj + self.fun_const * self.step * self.init_deriv {
                return Status::Continue;
            }
            if <T as Float>::abs(self.curr_deriv)
                >= self.grad_const * <T as Float>::abs(self.init_deriv)
            {
                return Status::Continue;
            }
            return Status::WolfeConditionsMet;
        }
        if self.curr_obj >= self.init_obj + self.fun_const * self.step * self.curr_deriv {
            return Status::Continue;
        }
        if self.curr_deriv <= self.grad_const * self.init_deriv {
            return Status::Continue;
        }
        Status::WolfeConditionsMet
    }
}

/// A univariate solver usable inside the line search.
///
/// Implementors receive the initial step size computed from the previous
/// iteration and, if they care, the Wolfe constants in force. A finder
/// that only supports some condition types rejects the rest from
/// `configure_wolfe`.
pub trait StepFinder<T: Scalar>: ScalarGradSolver<T> {
    /// Sets the magnitude of the first trial step.
    fn set_initial_step(&mut self, step: T);

    /// Passes the Wolfe constants in force to the finder.
    fn configure_wolfe(&mut self, params: &WolfeParams<T>) -> Result<()> {
        let _ = params;
        Ok(())
    }
}

impl<T: Scalar> StepFinder<T> for Bisection<T> {
    fn set_initial_step(&mut self, step: T) {
        Bisection::set_initial_step(self, step);
    }
}

impl<T: Scalar> StepFinder<T> for GoldenSection<T> {
    fn set_initial_step(&mut self, step: T) {
        GoldenSection::set_initial_step(self, step);
    }
}

/// Settings for one line search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSearchSettings<T: Scalar> {
    /// Wolfe condition constants.
    pub wolfe: WolfeParams<T>,
    /// Tolerances for the inner univariate run. The gradient tolerance is
    /// disabled by default so the Wolfe conditions decide termination.
    pub tolerance: ToleranceSettings<T>,
    /// Budget for the inner univariate run.
    pub budget: BudgetSettings,
}

impl<T: Scalar> Default for LineSearchSettings<T> {
    fn default() -> Self {
        Self {
            wolfe: WolfeParams::default(),
            tolerance: ToleranceSettings::default().with_grad_abs_tol(T::zero()),
            budget: BudgetSettings::default().with_max_iterations(100),
        }
    }
}

impl<T: Scalar> LineSearchSettings<T> {
    /// Creates the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Wolfe constants.
    pub fn with_wolfe(mut self, wolfe: WolfeParams<T>) -> Self {
        self.wolfe = wolfe;
        self
    }
}

/// The multivariate objective projected onto a line.
struct LineFunction<'a, T: Scalar, C: CostFunction<T>> {
    f: &'a C,
    direction: &'a DVector<T>,
    init_loc: &'a DVector<T>,

    loc: DVector<T>,
    grad: DVector<T>,
    obj: T,
    step: T,
}

impl<T: Scalar, C: CostFunction<T>> ScalarGradFunction<T> for LineFunction<'_, T, C> {
    fn eval_with_deriv(&mut self, step: T) -> Result<(T, T)> {
        self.step = step;
        self.loc.copy_from(self.init_loc);
        self.loc.axpy(step, self.direction, T::one());

        let obj = self.f.cost_and_gradient(&self.loc, &mut self.grad)?;
        self.obj = obj;
        Ok((obj, self.direction.dot(&self.grad)))
    }
}

/// Outcome of a line search.
///
/// On [`Status::WolfeConditionsMet`] the fields describe the accepted
/// step. Any other status means the inner run hit a terminal condition
/// before the Wolfe conditions held; the fields then describe the lowest
/// point evaluated, so no progress is discarded.
#[derive(Debug, Clone)]
pub struct LineSearchResult<T: Scalar> {
    /// Location of the accepted (or best evaluated) step.
    pub loc: DVector<T>,
    /// Objective value at `loc`.
    pub obj: T,
    /// Full gradient at `loc`.
    pub grad: DVector<T>,
    /// Step length along the direction at `loc`.
    pub step: T,
    /// Objective evaluations consumed.
    pub n_fun_evals: usize,
    /// How the search ended: [`Status::WolfeConditionsMet`] on success,
    /// otherwise the terminal status of the inner run.
    pub status: Status,
}

/// Searches along `direction` from `init_loc` for a step satisfying the
/// Wolfe conditions.
///
/// `prev_obj` is the objective at the start of the previous outer
/// iteration; it scales the first trial step the way SciPy does. The
/// direction must be a descent direction. A search that terminates before
/// the Wolfe conditions hold is not an error: the result then carries the
/// terminal status and the best point evaluated.
#[allow(clippy::too_many_arguments)]
pub fn line_search<T, C, S>(
    settings: &LineSearchSettings<T>,
    finder: &mut S,
    f: &C,
    direction: &DVector<T>,
    init_loc: &DVector<T>,
    init_obj: T,
    init_grad: &DVector<T>,
    prev_obj: T,
) -> Result<LineSearchResult<T>>
where
    T: Scalar,
    C: CostFunction<T>,
    S: StepFinder<T>,
{
    if direction.len() != init_loc.len() {
        return Err(DescentError::dimension_mismatch(
            init_loc.len(),
            direction.len(),
        ));
    }

    let dir_deriv = direction.dot(init_grad);
    if dir_deriv >= T::zero() {
        return Err(DescentError::not_descent_direction(dir_deriv.to_f64()));
    }

    let mut wolfe = WolfeConditions::new(&settings.wolfe, init_obj, dir_deriv)?;

    // First trial step scaled by the objective drop of the previous outer
    // iteration, capped at one
    let two = T::one() + T::one();
    let mut init_step =
        <T as Scalar>::from_f64(1.01) * two * (init_obj - prev_obj) / dir_deriv;
    init_step = <T as Float>::min(T::one(), init_step);
    if init_step <= T::zero() || !<T as Float>::is_finite(init_step) {
        init_step = T::one();
    }
    finder.set_initial_step(init_step);
    finder.configure_wolfe(&settings.wolfe)?;

    let mut line = LineFunction {
        f,
        direction,
        init_loc,
        loc: DVector::zeros(init_loc.len()),
        grad: DVector::zeros(init_loc.len()),
        obj: init_obj,
        step: T::zero(),
    };

    let mut progress = ScalarProgress::new(
        &settings.tolerance,
        settings.budget.clone(),
        T::zero(),
        init_obj,
        dir_deriv,
    );
    finder.init(T::zero(), init_obj, dir_deriv)?;

    // Lowest point evaluated, seeded with the start of the line
    let mut best = LineSearchResult {
        loc: init_loc.clone(),
        obj: init_obj,
        grad: init_grad.clone(),
        step: T::zero(),
        n_fun_evals: 0,
        status: Status::Continue,
    };

    let status = loop {
        let status = wolfe.status();
        if status.is_terminal() {
            break status;
        }
        let status = Status::first_terminal([progress.status(), finder.status()]);
        if status.is_terminal() {
            break status;
        }

        let eval = finder.iterate(&mut line)?;
        progress.update(eval.loc, eval.obj, eval.deriv, eval.n_fun_evals);
        wolfe.update(eval.loc, eval.obj, eval.deriv);

        if eval.obj <= best.obj {
            best.loc.copy_from(&line.loc);
            best.obj = eval.obj;
            best.grad.copy_from(&line.grad);
            best.step = line.step;
        }
    };

    if status != Status::WolfeConditionsMet {
        best.n_fun_evals = progress.fun_evals();
        best.status = status;
        return Ok(best);
    }

    Ok(LineSearchResult {
        loc: line.loc,
        obj: line.obj,
        grad: line.grad,
        step: line.step,
        n_fun_evals: progress.fun_evals(),
        status,
    })
}
