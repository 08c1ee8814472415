//! Termination status codes shared by all optimizers.

use std::fmt;

/// Why an optimizer is running, has converged, or has failed.
///
/// `Continue` means no terminal condition has been observed and the caller
/// should keep iterating. The remaining variants are terminal: the
/// convergence variants indicate a successful stop, the failure variants an
/// exhausted budget or an error condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// No terminal condition observed; keep iterating.
    Continue,
    /// The gradient norm fell below the absolute tolerance.
    GradAbsTol,
    /// The gradient norm stopped changing relative to the configured window.
    GradRelTol,
    /// The objective value fell below the absolute tolerance.
    ObjAbsTol,
    /// The objective value stopped changing relative to the configured window.
    ObjRelTol,
    /// A line search step satisfied the Wolfe conditions.
    WolfeConditionsMet,
    /// A univariate search narrowed its bracket below its tolerance.
    BoundsConverged,
    /// The iteration budget was exhausted.
    MaxIterations,
    /// The function evaluation budget was exhausted.
    MaxFunctionEvaluations,
    /// The runtime budget was exhausted.
    MaxRuntime,
    /// The user-supplied objective reported a failure.
    UserFunctionError,
    /// The problem has no feasible point.
    Infeasible,
    /// A line search terminated before the Wolfe conditions were met.
    LineSearchFailure,
}

impl Status {
    /// Returns true for any status other than [`Status::Continue`].
    pub fn is_terminal(self) -> bool {
        self != Self::Continue
    }

    /// Returns true if this status represents successful convergence.
    pub fn converged(self) -> bool {
        matches!(
            self,
            Self::GradAbsTol
                | Self::GradRelTol
                | Self::ObjAbsTol
                | Self::ObjRelTol
                | Self::WolfeConditionsMet
                | Self::BoundsConverged
        )
    }

    /// Returns true if this status represents a failure or exhausted budget.
    pub fn failed(self) -> bool {
        self.is_terminal() && !self.converged()
    }

    /// Returns the first terminal status in `statuses`, or
    /// [`Status::Continue`] if every entry allows iteration to proceed.
    ///
    /// The order of the arguments establishes precedence: convergence
    /// sources should be polled before budget sources so a run that
    /// converges on its final permitted iteration reports convergence.
    pub fn first_terminal<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        statuses
            .into_iter()
            .find(|s| s.is_terminal())
            .unwrap_or(Self::Continue)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Continue => "Continue",
            Self::GradAbsTol => "GradAbsTol",
            Self::GradRelTol => "GradRelTol",
            Self::ObjAbsTol => "ObjAbsTol",
            Self::ObjRelTol => "ObjRelTol",
            Self::WolfeConditionsMet => "WolfeConditionsMet",
            Self::BoundsConverged => "BoundsConverged",
            Self::MaxIterations => "MaximumIterations",
            Self::MaxFunctionEvaluations => "MaximumFunctionEvaluations",
            Self::MaxRuntime => "MaximumRuntimeElapsed",
            Self::UserFunctionError => "ErrorInUserFunction",
            Self::Infeasible => "ProblemInfeasible",
            Self::LineSearchFailure => "LinesearchFailedToConverge",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_terminal_partition() {
        assert!(!Status::Continue.is_terminal());
        assert!(!Status::Continue.converged());
        assert!(!Status::Continue.failed());

        for s in [
            Status::GradAbsTol,
            Status::GradRelTol,
            Status::ObjAbsTol,
            Status::ObjRelTol,
            Status::WolfeConditionsMet,
            Status::BoundsConverged,
        ] {
            assert!(s.is_terminal());
            assert!(s.converged());
            assert!(!s.failed());
        }

        for s in [
            Status::MaxIterations,
            Status::MaxFunctionEvaluations,
            Status::MaxRuntime,
            Status::UserFunctionError,
            Status::Infeasible,
            Status::LineSearchFailure,
        ] {
            assert!(s.is_terminal());
            assert!(s.failed());
        }
    }

    #[test]
    fn test_first_terminal() {
        assert_eq!(
            Status::first_terminal([Status::Continue, Status::Continue]),
            Status::Continue
        );
        assert_eq!(
            Status::first_terminal([Status::Continue, Status::GradAbsTol, Status::MaxIterations]),
            Status::GradAbsTol
        );
        assert_eq!(Status::first_terminal([]), Status::Continue);
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::GradAbsTol.to_string(), "GradAbsTol");
        assert_eq!(Status::MaxRuntime.to_string(), "MaximumRuntimeElapsed");
        assert_eq!(
            Status::LineSearchFailure.to_string(),
            "LinesearchFailedToConverge"
        );
    }
}
