//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp `value` into `[min, max]`.
///
/// Returns the clamped value and whether clamping was needed.
pub fn clamp<T>(value: T, min: T, max: T) -> (T, bool)
where
    T: Float,
{
    if value > max {
        (max, true)
    } else if value < min {
        (min, true)
    } else {
        (value, false)
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it. Due to round off the result
/// can equal `rhs.abs()` when `lhs` is a tiny negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle into `[-pi, pi)`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau = pi + pi;

    let mut r = rem_euclid(angle + pi, tau);
    if r >= tau {
        r = T::zero();
    }

    r - pi
}

/// `sin(x)/x`, continuous through zero.
pub fn sinc<T>(x: T) -> T
where
    T: Float,
{
    let small = T::from(1e-4).unwrap_or_else(T::epsilon);

    if x.abs() < small {
        // Next term is x^4/120, below f64 precision in this range
        T::one() - x * x / T::from(6.0).unwrap_or_else(T::one)
    } else {
        x.sin() / x
    }
}
