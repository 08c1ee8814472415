//! Type definitions and aliases shared by the optimization crates.
//!
//! This module provides the scalar abstraction over `f32`/`f64`, the
//! dynamically-sized vector and matrix aliases, and a handful of
//! floating-point comparison helpers.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the necessary numeric traits required by the
/// direction engines, line searches, and convergence checks.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default absolute tolerance on the gradient norm.
    const DEFAULT_GRADIENT_TOLERANCE: Self;

    /// Smallest step length a line search will attempt.
    const MIN_STEP: Self;

    /// Largest step length a line search will attempt.
    const MAX_STEP: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_f64` for a non-panicking version.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Try to convert from f64.
    ///
    /// Returns None if the conversion fails.
    fn try_from_f64(v: f64) -> Option<Self> {
        <Self as FromPrimitive>::from_f64(v)
    }

    /// Convert to f64 (for reporting/display).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_to_f64` for a non-panicking version.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }

    /// Try to convert to f64.
    ///
    /// Returns None if the conversion fails.
    fn try_to_f64(self) -> Option<f64> {
        num_traits::cast(self)
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-4;
    const MIN_STEP: Self = 1e-6;
    const MAX_STEP: Self = 50.0;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_GRADIENT_TOLERANCE: Self = 1e-6;
    const MIN_STEP: Self = 1e-8;
    const MAX_STEP: Self = 50.0;
}

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Returns true if `a` and `b` agree to within either the absolute or the
/// relative tolerance.
///
/// The relative comparison is scaled by the larger magnitude of the two
/// values, so it remains meaningful far from zero where an absolute
/// tolerance alone would be too strict.
pub fn within_abs_or_rel<T: Scalar>(a: T, b: T, abs_tol: T, rel_tol: T) -> bool {
    let diff = <T as Float>::abs(a - b);
    if diff <= abs_tol {
        return true;
    }
    let scale = <T as Float>::max(<T as Float>::abs(a), <T as Float>::abs(b));
    diff <= rel_tol * scale
}

/// Numerical constants used by the univariate searches.
pub mod constants {
    use super::Scalar;

    /// Golden ratio shrink factor, `2 - φ ≈ 0.382`.
    pub fn golden_shrink<T: Scalar>() -> T {
        <T as Scalar>::from_f64(2.0 - 1.618033988749895)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_trait_bounds() {
        assert!(f32::DEFAULT_GRADIENT_TOLERANCE > 0.0);
        assert!(f64::DEFAULT_GRADIENT_TOLERANCE > 0.0);
        assert!(f32::MIN_STEP < f32::MAX_STEP);
        assert!(f64::MIN_STEP < f64::MAX_STEP);
        assert_eq!(<f32 as Scalar>::EPSILON, f32::EPSILON);
        assert_eq!(<f64 as Scalar>::EPSILON, f64::EPSILON);
    }

    #[test]
    fn test_scalar_conversions() {
        let val_f64 = 3.14159;
        let val_f32 = <f32 as Scalar>::from_f64(val_f64);
        assert_relative_eq!(val_f32 as f64, val_f64, epsilon = 1e-6);

        let back_f64 = val_f32.to_f64();
        assert_relative_eq!(back_f64, val_f32 as f64);
    }

    #[test]
    fn test_within_abs_or_rel() {
        // Absolute agreement near zero
        assert!(within_abs_or_rel(1e-16_f64, -1e-16, 1e-15, 1e-15));
        // Relative agreement far from zero
        assert!(within_abs_or_rel(1e10_f64, 1e10 * (1.0 + 1e-16), 1e-15, 1e-12));
        // Disagreement
        assert!(!within_abs_or_rel(1.0_f64, 2.0, 1e-15, 1e-15));
    }

    #[test]
    fn test_constants() {
        assert_relative_eq!(
            constants::golden_shrink::<f64>(),
            0.3819660112501051,
            epsilon = 1e-12
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_within_abs_or_rel_is_symmetric(
            a in -1e12f64..1e12,
            b in -1e12f64..1e12,
            abs_tol in 0.0f64..1.0,
            rel_tol in 0.0f64..1.0,
        ) {
            proptest::prop_assert_eq!(
                within_abs_or_rel(a, b, abs_tol, rel_tol),
                within_abs_or_rel(b, a, abs_tol, rel_tol)
            );
            // A value always agrees with itself
            proptest::prop_assert!(within_abs_or_rel(a, a, abs_tol, rel_tol));
        }
    }
}
