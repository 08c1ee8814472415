//! Limited-memory BFGS solver.

use descent_core::objective::CostFunction;
use descent_core::types::{DVector, Scalar};
use descent_core::{DescentError, Result, Status};

use crate::line_search::{line_search, InterpolationStep, LineSearchSettings, StepFinder};
use crate::solver::GradSolver;

const DEFAULT_MEMORY: usize = 30;

/// L-BFGS: BFGS directions from a bounded history of curvature pairs.
///
/// Stores the last `memory` (s, y) pairs in a ring and reconstructs the
/// search direction with the two-loop recursion, so memory and
/// per-iteration cost are linear in the dimension.
///
/// The initial Hessian scaling `gamma = (s.y)/(y.y)` is off by default
/// to keep the first trial step of each line search at its computed
/// value; enable it with [`with_scaled_direction`](Lbfgs::with_scaled_direction).
#[derive(Debug, Clone)]
pub struct Lbfgs<T: Scalar, S: StepFinder<T> = InterpolationStep<T>> {
    line_settings: LineSearchSettings<T>,
    finder: S,
    memory: usize,
    scale_direction: bool,

    n_dim: usize,
    status: Status,
    counter: usize,
    looped: bool,

    direction: DVector<T>,
    alpha: Vec<T>,
    inv_rho: Vec<T>,
    s_hist: Vec<DVector<T>>,
    y_hist: Vec<DVector<T>>,

    curr_loc: DVector<T>,
    curr_obj: T,
    prev_obj: T,
    curr_grad: DVector<T>,
}

impl<T: Scalar> Lbfgs<T> {
    /// Creates an L-BFGS solver with the interpolation step finder and the
    /// default history length.
    pub fn new() -> Self {
        Self::with_step_finder(InterpolationStep::new())
    }
}

impl<T: Scalar> Default for Lbfgs<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, S: StepFinder<T>> Lbfgs<T, S> {
    /// Creates an L-BFGS solver driving the given step finder.
    pub fn with_step_finder(finder: S) -> Self {
        Self {
            line_settings: LineSearchSettings::default(),
            finder,
            memory: DEFAULT_MEMORY,
            scale_direction: false,
            n_dim: 0,
            status: Status::Continue,
            counter: 0,
            looped: false,
            direction: DVector::zeros(0),
            alpha: Vec::new(),
            inv_rho: Vec::new(),
            s_hist: Vec::new(),
            y_hist: Vec::new(),
            curr_loc: DVector::zeros(0),
            curr_obj: T::zero(),
            prev_obj: T::zero(),
            curr_grad: DVector::zeros(0),
        }
    }

    /// Sets how many curvature pairs are kept.
    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory;
        self
    }

    /// Scales the direction by `gamma = (s.y)/(y.y)` between the two
    /// recursion loops.
    pub fn with_scaled_direction(mut self) -> Self {
        self.scale_direction = true;
        self
    }

    /// Sets the line search settings.
    pub fn with_line_search(mut self, settings: LineSearchSettings<T>) -> Self {
        self.line_settings = settings;
        self
    }
}

impl<T: Scalar, S: StepFinder<T>> GradSolver<T> for Lbfgs<T, S> {
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
        if self.memory == 0 {
            return Err(DescentError::invalid_parameter(
                "history length must be at least one",
            ));
        }
        let n = init_loc.len();
        self.n_dim = n;
        self.status = Status::Continue;

        self.counter = 0;
        self.looped = false;

        self.alpha = vec![T::zero(); self.memory];
        self.inv_rho = vec![T::zero(); self.memory];
        self.s_hist = vec![DVector::zeros(n); self.memory];
        self.y_hist = vec![DVector::zeros(n); self.memory];

        self.curr_loc = init_loc.clone();
        self.curr_grad = init_grad.clone();
        self.curr_obj = init_obj;
        // Seed the previous objective well above the current one so the
        // first trial step comes out as one
        self.prev_obj = init_obj + <T as Scalar>::from_f64(5000.0);

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
        let counter = self.counter;
        let m = self.memory;

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
            // No Wolfe step: leave the history alone and surface the
            // failure through `status`, keeping the best point evaluated
            self.status = Status::LineSearchFailure;
            loc.copy_from(&result.loc);
            grad.copy_from(&result.grad);
            return Ok((result.obj, result.n_fun_evals));
        }

        // Store the newest curvature pair over the oldest slot
        self.y_hist[counter].copy_from(&result.grad);
        self.y_hist[counter] -= &self.curr_grad;
        self.s_hist[counter].copy_from(&result.loc);
        self.s_hist[counter] -= &self.curr_loc;
        self.inv_rho[counter] = self.y_hist[counter].dot(&self.s_hist[counter]);

        // Two-loop recursion, most recent pair first
        self.direction.copy_from(&result.grad);
        self.direction.neg_mut();

        let depth = if self.looped { m } else { counter + 1 };
        for i in 0..depth {
            let ind = (counter + m - i) % m;
            self.alpha[ind] = self.s_hist[ind].dot(&self.direction) / self.inv_rho[ind];
            self.direction
                .axpy(-self.alpha[ind], &self.y_hist[ind], T::one());
        }

        if self.scale_direction {
            let gamma = self.inv_rho[counter] / self.y_hist[counter].dot(&self.y_hist[counter]);
            self.direction *= gamma;
        }

        for i in (0..depth).rev() {
            let ind = (counter + m - i) % m;
            let beta = self.y_hist[ind].dot(&self.direction) / self.inv_rho[ind];
            self.direction
                .axpy(self.alpha[ind] - beta, &self.s_hist[ind], T::one());
        }

        self.counter += 1;
        if self.counter == m {
            self.counter = 0;
            self.looped = true;
        }

        self.prev_obj = self.curr_obj;
        self.curr_obj = result.obj;
        self.curr_loc.copy_from(&result.loc);
        self.curr_grad.copy_from(&result.grad);

        loc.copy_from(&result.loc);
        grad.copy_from(&result.grad);
        Ok((result.obj, result.n_fun_evals))
    }
}
