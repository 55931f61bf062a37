//! Scalar trait for tangent element types.

use faer_traits::ComplexField;
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

pub use faer::c64;

/// Trait for scalar types that can appear as tangent elements.
///
/// This trait wraps faer's `ComplexField` with the arithmetic bounds
/// required by the tangent algebra, plus the conjugation hooks used by
/// Hermitian projection and real-narrowing.
pub trait Scalar:
    ComplexField
    + Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// The real type associated with this scalar.
    type Real: Scalar;

    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Complex conjugate (identity for real scalars).
    fn conjugate(self) -> Self;

    /// Drops the imaginary part (identity for real scalars).
    ///
    /// Projectors whose primal is real use this to narrow a complex
    /// candidate back onto the real axis.
    fn real_part(self) -> Self;

    /// Scales by a real factor.
    fn mul_real(self, r: f64) -> Self;
}

impl Scalar for f64 {
    type Real = f64;

    fn one() -> Self {
        1.0
    }

    fn conjugate(self) -> Self {
        self
    }

    fn real_part(self) -> Self {
        self
    }

    fn mul_real(self, r: f64) -> Self {
        self * r
    }
}

impl Scalar for c64 {
    type Real = f64;

    fn one() -> Self {
        c64::new(1.0, 0.0)
    }

    fn conjugate(self) -> Self {
        c64::new(self.re, -self.im)
    }

    fn real_part(self) -> Self {
        c64::new(self.re, 0.0)
    }

    fn mul_real(self, r: f64) -> Self {
        c64::new(self.re * r, self.im * r)
    }
}
