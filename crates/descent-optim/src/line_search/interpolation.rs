//! Safeguarded cubic/quadratic interpolation stepper.
//!
//! Port of the MINPACK-2 `dcsrch`/`dcstep` routines (More and Thuente) as
//! popularized by SciPy. Each call evaluates one trial step and updates an
//! interval known to contain a step satisfying sufficient decrease and a
//! curvature condition.

use descent_core::objective::ScalarGradFunction;
use descent_core::types::Scalar;
use descent_core::{DescentError, Result, Status};
use descent_univariate::solver::{ScalarGradEval, ScalarGradSolver};
use num_traits::Float;

use super::{StepFinder, WolfeParams};

/// One endpoint of the interpolation interval.
#[derive(Debug, Clone, Copy)]
struct Endpoint<T> {
    step: T,
    obj: T,
    deriv: T,
}

/// The interval maintained by the stepper.
///
/// `best` holds the step with the least function value. Once `bracketed`
/// is set, a minimizer lies between `best.step` and `other.step` and the
/// derivative at `best` is negative in the direction of the step.
#[derive(Debug, Clone, Copy)]
struct Interval<T> {
    best: Endpoint<T>,
    other: Endpoint<T>,
    bracketed: bool,
}

/// Line-search stepper using safeguarded polynomial interpolation.
///
/// Proposes trial steps by fitting cubic and quadratic models to the
/// objective and its directional derivative, falling back to bisection
/// when the bracket shrinks too slowly. Only valid under strong Wolfe
/// termination; it has no terminal condition of its own.
#[derive(Debug, Clone)]
pub struct InterpolationStep<T: Scalar> {
    initial_step: T,
    min_step: T,
    max_step: T,
    sufficient_decrease: T,

    init_loc: T,
    init_obj: T,
    gtest: T,
    stage_one: bool,

    trial: T,
    interval: Interval<T>,
    width: T,
    width1: T,
}

impl<T: Scalar> InterpolationStep<T> {
    /// Creates a stepper with unit initial step and default step bounds.
    pub fn new() -> Self {
        let zero_end = Endpoint {
            step: T::zero(),
            obj: T::zero(),
            deriv: T::zero(),
        };
        Self {
            initial_step: T::one(),
            min_step: T::MIN_STEP,
            max_step: T::MAX_STEP,
            sufficient_decrease: T::zero(),
            init_loc: T::zero(),
            init_obj: T::zero(),
            gtest: T::zero(),
            stage_one: true,
            trial: T::zero(),
            interval: Interval {
                best: zero_end,
                other: zero_end,
                bracketed: false,
            },
            width: T::zero(),
            width1: T::zero(),
        }
    }

    /// Sets the smallest and largest step the stepper may propose.
    pub fn with_step_bounds(mut self, min_step: T, max_step: T) -> Self {
        self.min_step = min_step;
        self.max_step = max_step;
        self
    }

    /// Sets the magnitude of the first trial step. Must be positive.
    pub fn set_initial_step(&mut self, step: T) {
        self.initial_step = step;
    }
}

impl<T: Scalar> Default for InterpolationStep<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> ScalarGradSolver<T> for InterpolationStep<T> {
    fn init(&mut self, init_loc: T, init_obj: T, init_deriv: T) -> Result<()> {
        if self.initial_step == T::zero() {
            return Err(DescentError::ZeroInitialStep);
        }
        if self.initial_step < T::zero() {
            return Err(DescentError::invalid_parameter(
                "interpolation stepper requires a positive initial step",
            ));
        }

        self.init_loc = init_loc;
        self.init_obj = init_obj;
        self.gtest = self.sufficient_decrease * init_deriv;
        self.stage_one = true;

        let half = <T as Scalar>::from_f64(0.5);
        self.width = self.max_step - self.min_step;
        self.width1 = self.width / half;

        let start = Endpoint {
            step: T::zero(),
            obj: init_obj,
            deriv: init_deriv,
        };
        self.interval = Interval {
            best: start,
            other: start,
            bracketed: false,
        };
        self.trial = self.initial_step;
        Ok(())
    }

    fn status(&self) -> Status {
        Status::Continue
    }

    fn iterate<F: ScalarGradFunction<T>>(&mut self, f: &mut F) -> Result<ScalarGradEval<T>> {
        let loc = self.init_loc + self.trial;
        let (obj, deriv) = f.eval_with_deriv(loc)?;

        let ftest = self.init_obj + self.trial * self.gtest;
        if self.stage_one && obj <= ftest && deriv >= T::zero() {
            self.stage_one = false;
        }

        if self.stage_one && obj < self.interval.best.obj && obj > ftest {
            // Work on the modified function psi(a) = f(a) - f(0) - c1 a f'(0)
            // until a step satisfying sufficient decrease is found
            let gtest = self.gtest;
            let shift = |e: Endpoint<T>| Endpoint {
                step: e.step,
                obj: e.obj - e.step * gtest,
                deriv: e.deriv - gtest,
            };
            let unshift = |e: Endpoint<T>| Endpoint {
                step: e.step,
                obj: e.obj + e.step * gtest,
                deriv: e.deriv + gtest,
            };

            let mut shifted = Interval {
                best: shift(self.interval.best),
                other: shift(self.interval.other),
                bracketed: self.interval.bracketed,
            };
            self.trial = safeguarded_step(
                &mut shifted,
                self.trial,
                obj - self.trial * gtest,
                deriv - gtest,
                self.min_step,
                self.max_step,
            );
            self.interval = Interval {
                best: unshift(shifted.best),
                other: unshift(shifted.other),
                bracketed: shifted.bracketed,
            };
        } else {
            self.trial = safeguarded_step(
                &mut self.interval,
                self.trial,
                obj,
                deriv,
                self.min_step,
                self.max_step,
            );
        }

        // Force a bisection if the bracket is not shrinking fast enough
        if self.interval.bracketed {
            let half = <T as Scalar>::from_f64(0.5);
            let spread = self.interval.other.step - self.interval.best.step;
            if <T as Float>::abs(spread) >= <T as Scalar>::from_f64(0.66) * self.width1 {
                self.trial = self.interval.best.step + half * spread;
            }
            self.width1 = self.width;
            self.width = <T as Float>::abs(spread);
        }

        self.trial = <T as Float>::max(self.trial, self.min_step);
        self.trial = <T as Float>::min(self.trial, self.max_step);

        Ok(ScalarGradEval {
            loc,
            obj,
            deriv,
            n_fun_evals: 1,
        })
    }
}

impl<T: Scalar> StepFinder<T> for InterpolationStep<T> {
    fn set_initial_step(&mut self, step: T) {
        InterpolationStep::set_initial_step(self, step);
    }

    fn configure_wolfe(&mut self, params: &WolfeParams<T>) -> Result<()> {
        if !params.strong {
            return Err(DescentError::invalid_parameter(
                "interpolation stepper requires strong Wolfe conditions",
            ));
        }
        self.sufficient_decrease = params.fun_const;
        Ok(())
    }
}

/// Computes a safeguarded trial step and updates the interval containing a
/// minimizer.
///
/// `trial` is the current step with objective `fp` and derivative `dp`.
/// Returns the next trial step; the interval endpoints and bracket flag
/// are updated in place. Variable names follow the MINPACK-2 `dcstep`
/// routine.
fn safeguarded_step<T: Scalar>(
    iv: &mut Interval<T>,
    trial: T,
    fp: T,
    dp: T,
    step_min: T,
    step_max: T,
) -> T {
    let (stx, fx, dx) = (iv.best.step, iv.best.obj, iv.best.deriv);
    let (sty, fy, dy) = (iv.other.step, iv.other.obj, iv.other.deriv);
    let stp = trial;

    let two = T::one() + T::one();
    let three = two + T::one();
    let p66 = <T as Scalar>::from_f64(0.66);

    let sgnd = dp * (dx / <T as Float>::abs(dx));
    let stpf;

    if fp > fx {
        // First case: a higher function value. The minimum is bracketed.
        // If the cubic step is closer to stx than the quadratic step, the
        // cubic step is taken, otherwise the average of the two.
        let theta = three * (fx - fp) / (stp - stx) + dx + dp;
        let s = <T as Float>::max(
            <T as Float>::max(<T as Float>::abs(theta), <T as Float>::abs(dx)),
            <T as Float>::abs(dp),
        );
        let tmp = (theta / s) * (theta / s) - (dx / s) * (dp / s);
        let mut gamma = s * <T as Float>::sqrt(tmp);
        if stp < stx {
            gamma = -gamma;
        }
        let p = (gamma - dx) + theta;
        let q = ((gamma - dx) + gamma) + dp;
        let r = p / q;
        let stpc = stx + r * (stp - stx);
        let stpq = stx + ((dx / ((fx - fp) / (stp - stx) + dx)) / two) * (stp - stx);
        if <T as Float>::abs(stpc - stx) < <T as Float>::abs(stpq - stx) {
            stpf = stpc;
        } else {
            stpf = stpc + (stpq - stpc) / two;
        }
        iv.bracketed = true;
    } else if sgnd < T::zero() {
        // Second case: a lower function value and derivatives of opposite
        // sign. The minimum is bracketed. If the cubic step is farther from
        // stp than the secant step, the cubic step is taken.
        let theta = three * (fx - fp) / (stp - stx) + dx + dp;
        let s = <T as Float>::max(
            <T as Float>::max(<T as Float>::abs(theta), <T as Float>::abs(dx)),
            <T as Float>::abs(dp),
        );
        let tmp = (theta / s) * (theta / s) - (dx / s) * (dp / s);
        let mut gamma = s * <T as Float>::sqrt(tmp);
        if stp > stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = ((gamma - dp) + gamma) + dx;
        let r = p / q;
        let stpc = stp + r * (stx - stp);
        let stpq = stp + (dp / (dp - dx)) * (stx - stp);
        if <T as Float>::abs(stpc - stp) > <T as Float>::abs(stpq - stp) {
            stpf = stpc;
        } else {
            stpf = stpq;
        }
        iv.bracketed = true;
    } else if <T as Float>::abs(dp) < <T as Float>::abs(dx) {
        // Third case: a lower function value, derivatives of the same sign,
        // and the magnitude of the derivative decreases. The cubic step is
        // used only if it tends to infinity in the direction of the step or
        // its minimum is beyond stp; otherwise the secant step is used.
        let theta = three * (fx - fp) / (stp - stx) + dx + dp;
        let s = <T as Float>::max(
            <T as Float>::max(<T as Float>::abs(theta), <T as Float>::abs(dx)),
            <T as Float>::abs(dp),
        );
        // gamma = 0 only arises if the cubic does not tend to infinity in
        // the direction of the step
        let tmp = <T as Float>::max(
            T::zero(),
            (theta / s) * (theta / s) - (dx / s) * (dp / s),
        );
        let mut gamma = s * <T as Float>::sqrt(tmp);
        if stp > stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = (gamma + (dx - dp)) + gamma;
        let r = p / q;

        let stpc = if r < T::zero() && gamma != T::zero() {
            stp + r * (stx - stp)
        } else if stp > stx {
            step_max
        } else {
            step_min
        };
        let stpq = stp + (dp / (dp - dx)) * (stx - stp);

        if iv.bracketed {
            // Bracketed: take whichever of the cubic and secant steps is
            // closer to stp, then keep the step inside the bracket
            let mut f = if <T as Float>::abs(stpc - stp) < <T as Float>::abs(stpq - stp) {
                stpc
            } else {
                stpq
            };
            if stp > stx {
                f = <T as Float>::min(f, stp + p66 * (sty - stp));
            } else {
                f = <T as Float>::max(f, stp + p66 * (sty - stp));
            }
            stpf = f;
        } else {
            // Not bracketed: take whichever is farther from stp, clipped to
            // the step bounds
            let f = if <T as Float>::abs(stpc - stp) > <T as Float>::abs(stpq - stp) {
                stpc
            } else {
                stpq
            };
            stpf = <T as Float>::max(step_min, <T as Float>::min(step_max, f));
        }
    } else {
        // Fourth case: a lower function value, derivatives of the same sign,
        // and the magnitude of the derivative does not decrease
        if iv.bracketed {
            let theta = three * (fp - fy) / (sty - stp) + dy + dp;
            let s = <T as Float>::max(
                <T as Float>::max(<T as Float>::abs(theta), <T as Float>::abs(dx)),
                <T as Float>::abs(dp),
            );
            let tmp = (theta / s) * (theta / s) - (dy / s) * (dp / s);
            let mut gamma = s * <T as Float>::sqrt(tmp);
            if stp < sty {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = ((gamma - dp) + gamma) + dy;
            let r = p / q;
            stpf = stp + r * (sty - stp);
        } else if stp > stx {
            stpf = step_max;
        } else {
            stpf = step_min;
        }
    }

    // Update the interval containing the minimizer
    if fp > fx {
        iv.other = Endpoint {
            step: stp,
            obj: fp,
            deriv: dp,
        };
    } else {
        if sgnd < T::zero() {
            iv.other = iv.best;
        }
        iv.best = Endpoint {
            step: stp,
            obj: fp,
            deriv: dp,
        };
    }

    stpf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_search::WolfeParams;
    use approx::assert_relative_eq;
    use descent_univariate::solver::{minimize_scalar_grad, ScalarSettings};
    use pretty_assertions::assert_eq;

    fn interval(best: (f64, f64, f64), other: (f64, f64, f64), bracketed: bool) -> Interval<f64> {
        Interval {
            best: Endpoint {
                step: best.0,
                obj: best.1,
                deriv: best.2,
            },
            other: Endpoint {
                step: other.0,
                obj: other.1,
                deriv: other.2,
            },
            bracketed,
        }
    }

    #[test]
    fn test_higher_value_brackets() {
        // Objective rose at the trial: the minimizer lies between the
        // endpoints and the next trial is interior
        let mut iv = interval((0.0, 1.0, -2.0), (0.0, 1.0, -2.0), false);
        let next = safeguarded_step(&mut iv, 1.0, 2.0, 4.0, 1e-8, 50.0);
        assert!(iv.bracketed);
        assert_eq!(iv.other.step, 1.0);
        assert_eq!(iv.best.step, 0.0);
        assert!(next > 0.0 && next < 1.0);
    }

    #[test]
    fn test_opposite_derivative_brackets() {
        // Lower value but positive derivative: the step overshot the
        // minimizer, which is now bracketed behind it
        let mut iv = interval((0.0, 1.0, -2.0), (0.0, 1.0, -2.0), false);
        let next = safeguarded_step(&mut iv, 1.0, 0.5, 1.0, 1e-8, 50.0);
        assert!(iv.bracketed);
        assert_eq!(iv.best.step, 1.0);
        assert_eq!(iv.other.step, 0.0);
        assert!(next > 0.0 && next < 1.0);
    }

    #[test]
    fn test_shrinking_derivative_extrapolates() {
        // Lower value, same sign, smaller magnitude: no bracket yet, the
        // step moves forward
        let mut iv = interval((0.0, 1.0, -2.0), (0.0, 1.0, -2.0), false);
        let next = safeguarded_step(&mut iv, 0.5, 0.25, -1.0, 1e-8, 50.0);
        assert!(!iv.bracketed);
        assert_eq!(iv.best.step, 0.5);
        assert!(next > 0.5);
    }

    #[test]
    fn test_finds_quadratic_minimum() {
        // (x - 1)^2 from 0 with a half step: interpolation lands on the
        // exact minimizer in the second trial
        let mut f = |x: f64| ((x - 1.0) * (x - 1.0), 2.0 * (x - 1.0));
        let mut solver = InterpolationStep::new();
        solver.set_initial_step(0.5);
        let settings = ScalarSettings {
            tolerance: descent_core::convergence::ToleranceSettings::default()
                .with_grad_abs_tol(1e-10),
            ..ScalarSettings::default()
        };
        let result = minimize_scalar_grad(&mut f, 0.0, &settings, &mut solver).unwrap();
        assert_eq!(result.status, Status::GradAbsTol);
        assert_relative_eq!(result.loc, 1.0, epsilon = 1e-12);
        assert!(result.iterations <= 3);
    }

    #[test]
    fn test_trial_stays_inside_bracket() {
        // Once a bracket exists, every proposed trial lies strictly inside
        // it and the bracket width never grows
        let mut f = |x: f64| {
            let e = (0.1 * x).exp();
            ((x - 1.0) * (x - 1.0) + e, 2.0 * (x - 1.0) + 0.1 * e)
        };
        let mut solver = InterpolationStep::new();
        solver.set_initial_step(3.0);
        solver.init(0.0, f(0.0).0, f(0.0).1).unwrap();

        let mut prev_width = f64::INFINITY;
        for _ in 0..10 {
            solver.iterate(&mut f).unwrap();
            if solver.interval.bracketed {
                let lo = solver.interval.best.step.min(solver.interval.other.step);
                let hi = solver.interval.best.step.max(solver.interval.other.step);
                assert!(solver.trial >= lo && solver.trial <= hi);

                let width = hi - lo;
                assert!(width <= prev_width);
                prev_width = width;
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_trial_within_step_bounds(c in 0.1f64..10.0, step in 0.1f64..5.0) {
            // Trials stay inside the configured step bounds no matter where
            // the quadratic minimizer sits relative to the first trial
            let mut f = |x: f64| ((x - c) * (x - c), 2.0 * (x - c));
            let mut solver = InterpolationStep::new();
            solver.set_initial_step(step);
            solver.init(0.0, f(0.0).0, f(0.0).1).unwrap();
            for _ in 0..8 {
                solver.iterate(&mut f).unwrap();
                proptest::prop_assert!(solver.trial >= solver.min_step);
                proptest::prop_assert!(solver.trial <= solver.max_step);
            }
        }
    }

    #[test]
    fn test_zero_initial_step_rejected() {
        let mut solver = InterpolationStep::<f64>::new();
        InterpolationStep::set_initial_step(&mut solver, 0.0);
        let err = solver.init(0.0, 1.0, -1.0).unwrap_err();
        assert!(matches!(err, DescentError::ZeroInitialStep));
    }

    #[test]
    fn test_negative_initial_step_rejected() {
        let mut solver = InterpolationStep::<f64>::new();
        InterpolationStep::set_initial_step(&mut solver, -1.0);
        let err = solver.init(0.0, 1.0, -1.0).unwrap_err();
        assert!(matches!(err, DescentError::InvalidParameter { .. }));
    }

    #[test]
    fn test_weak_wolfe_rejected() {
        let mut solver = InterpolationStep::<f64>::new();
        let params = WolfeParams {
            strong: false,
            ..WolfeParams::default()
        };
        let err = StepFinder::configure_wolfe(&mut solver, &params).unwrap_err();
        assert!(matches!(err, DescentError::InvalidParameter { .. }));
    }
}
