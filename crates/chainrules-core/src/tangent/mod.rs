//! The closed set of tangent kinds.
//!
//! Mirrors ChainRulesCore.jl's tangent hierarchy, flattened into one
//! explicit tagged union so that the combination lattice in
//! [`crate::algebra`] stays total and auditable in one place:
//!
//! ```text
//! Tangent<T>
//! ├── Zero             - additive identity: the derivative is exactly zero
//! ├── NoTangent        - no tangent space exists (discrete primal)
//! ├── NotImplemented   - derivative deliberately not written yet
//! ├── Thunk            - deferred computation
//! ├── InplaceableThunk - deferred computation + in-place accumulation
//! ├── Structural       - field-name → tangent mapping for an aggregate
//! ├── Scalar           - a concrete number acting as its own tangent
//! └── Array            - a concrete array acting as its own tangent
//! ```
//!
//! `Zero` and `NoTangent` are both zero-like but differ in intent: `Zero`
//! says the true derivative is numerically zero, `NoTangent` says there is
//! no tangent space at all (an index, a boolean, a discrete choice).

pub mod not_implemented;
pub mod structural;
pub mod thunk;

pub use not_implemented::NotImplementedInfo;
pub use structural::{MutableStructuralTangent, StructuralTangent, TangentFields};
pub use thunk::{InplaceableThunk, Thunk};

use crate::array::ArrayValue;
use crate::error::TangentError;
use crate::scalar::Scalar;

/// A derivative value, in any of the closed set of kinds.
#[derive(Debug, Clone)]
pub enum Tangent<T: Scalar> {
    /// The additive identity: the derivative is numerically zero.
    Zero,
    /// The tangent space does not exist at all.
    NoTangent,
    /// A derivative deliberately not written yet.
    NotImplemented(NotImplementedInfo),
    /// A deferred computation, opaque until forced.
    Thunk(Thunk<T>),
    /// A deferred computation with an in-place accumulation variant.
    InplaceableThunk(InplaceableThunk<T>),
    /// The tangent of an aggregate value, field by field.
    Structural(StructuralTangent<T>),
    /// A concrete number acting as its own tangent.
    Scalar(T),
    /// A concrete array acting as its own tangent.
    Array(ArrayValue<T>),
}

impl<T: Scalar> Tangent<T> {
    /// Build a [`Tangent::NotImplemented`]; prefer the
    /// [`crate::not_implemented!`] macro, which captures the call site.
    pub fn not_implemented(module: &'static str, source: &'static str, info: String) -> Self {
        Tangent::NotImplemented(NotImplementedInfo::new(module, source, info))
    }

    /// Wrap a deferred computation.
    pub fn thunk(f: impl Fn() -> Result<Tangent<T>, TangentError> + 'static) -> Self {
        Tangent::Thunk(Thunk::new(f))
    }

    /// Human-readable kind, for error payloads.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Tangent::Zero => "zero tangent",
            Tangent::NoTangent => "no-tangent",
            Tangent::NotImplemented(_) => "not-implemented tangent",
            Tangent::Thunk(_) => "thunk",
            Tangent::InplaceableThunk(_) => "inplaceable thunk",
            Tangent::Structural(_) => "structural tangent",
            Tangent::Scalar(_) => "scalar",
            Tangent::Array(a) => a.kind_name(),
        }
    }

    /// Whether this is one of the two zero-like kinds.
    #[inline]
    pub fn is_zero_like(&self) -> bool {
        matches!(self, Tangent::Zero | Tangent::NoTangent)
    }

    /// Force deferred computation, recursively for nested thunks.
    /// Identity on every non-thunk kind.
    pub fn unthunk(self) -> Result<Tangent<T>, TangentError> {
        match self {
            Tangent::Thunk(t) => t.force()?.unthunk(),
            Tangent::InplaceableThunk(it) => it.force()?.unthunk(),
            other => Ok(other),
        }
    }

    /// Mutable access to a concrete array tangent.
    ///
    /// # Errors
    ///
    /// `MutateBeforeForcing` on a deferred value (writes before forcing are
    /// illegal); `UndefinedOperation` on kinds with no buffer to mutate.
    pub fn as_array_mut(&mut self) -> Result<&mut ArrayValue<T>, TangentError> {
        match self {
            Tangent::Array(a) => Ok(a),
            Tangent::Thunk(_) | Tangent::InplaceableThunk(_) => {
                Err(TangentError::MutateBeforeForcing)
            }
            other => Err(TangentError::UndefinedOperation {
                op: "mutate",
                lhs: other.kind_name(),
                rhs: "-",
            }),
        }
    }

    /// Convert to a concrete scalar.
    ///
    /// Zero-likes convert to `T::zero()`; a `NotImplemented` raises
    /// `NotImplementedEvaluated` (conversion counts as evaluation).
    pub fn try_into_scalar(self) -> Result<T, TangentError> {
        match self {
            Tangent::Zero | Tangent::NoTangent => Ok(T::zero()),
            Tangent::Scalar(x) => Ok(x),
            Tangent::Thunk(_) | Tangent::InplaceableThunk(_) => self.unthunk()?.try_into_scalar(),
            Tangent::NotImplemented(info) => Err(TangentError::NotImplementedEvaluated {
                module: info.module(),
                source: info.source(),
                info: info.info().to_string(),
            }),
            Tangent::Array(a) => {
                let d = a.to_dense();
                if d.len() == 1 {
                    Ok(d.data()[0])
                } else {
                    Err(TangentError::DimensionMismatch {
                        expected: vec![],
                        actual: d.shape().to_vec(),
                    })
                }
            }
            Tangent::Structural(_) => Err(TangentError::UndefinedOperation {
                op: "convert",
                lhs: "structural tangent",
                rhs: "scalar",
            }),
        }
    }

    /// Convert to a concrete array value.
    ///
    /// Zero-likes carry no shape information and cannot convert; a
    /// `NotImplemented` raises `NotImplementedEvaluated`.
    pub fn try_into_array(self) -> Result<ArrayValue<T>, TangentError> {
        match self {
            Tangent::Array(a) => Ok(a),
            Tangent::Thunk(_) | Tangent::InplaceableThunk(_) => self.unthunk()?.try_into_array(),
            Tangent::NotImplemented(info) => Err(TangentError::NotImplementedEvaluated {
                module: info.module(),
                source: info.source(),
                info: info.info().to_string(),
            }),
            other => Err(TangentError::UndefinedOperation {
                op: "convert",
                lhs: other.kind_name(),
                rhs: "array",
            }),
        }
    }
}

// Thunks never compare equal: the closure is opaque and forcing inside
// `==` would defeat laziness. Force explicitly before comparing.
impl<T: Scalar> PartialEq for Tangent<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Tangent::Zero, Tangent::Zero) => true,
            (Tangent::NoTangent, Tangent::NoTangent) => true,
            (Tangent::NotImplemented(a), Tangent::NotImplemented(b)) => a == b,
            (Tangent::Structural(a), Tangent::Structural(b)) => a == b,
            (Tangent::Scalar(a), Tangent::Scalar(b)) => a == b,
            (Tangent::Array(a), Tangent::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Scalar> From<T> for Tangent<T> {
    fn from(x: T) -> Self {
        Tangent::Scalar(x)
    }
}

impl<T: Scalar> From<ArrayValue<T>> for Tangent<T> {
    fn from(a: ArrayValue<T>) -> Self {
        Tangent::Array(a)
    }
}

impl<T: Scalar> From<crate::array::DenseArray<T>> for Tangent<T> {
    fn from(a: crate::array::DenseArray<T>) -> Self {
        Tangent::Array(ArrayValue::Dense(a))
    }
}

impl<T: Scalar> From<crate::array::Diagonal<T>> for Tangent<T> {
    fn from(d: crate::array::Diagonal<T>) -> Self {
        Tangent::Array(ArrayValue::Diagonal(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DenseArray;

    #[test]
    fn test_unthunk_identity_on_non_thunks() {
        let t: Tangent<f64> = Tangent::Scalar(2.0);
        assert_eq!(t.unthunk().unwrap(), Tangent::Scalar(2.0));
        let z: Tangent<f64> = Tangent::Zero;
        assert_eq!(z.unthunk().unwrap(), Tangent::Zero);
    }

    #[test]
    fn test_unthunk_nested() {
        let t: Tangent<f64> =
            Tangent::thunk(|| Ok(Tangent::thunk(|| Ok(Tangent::Scalar(5.0)))));
        assert_eq!(t.unthunk().unwrap(), Tangent::Scalar(5.0));
    }

    #[test]
    fn test_thunks_never_compare_equal() {
        let a: Tangent<f64> = Tangent::thunk(|| Ok(Tangent::Scalar(1.0)));
        let b = a.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_mutate_before_forcing() {
        let mut t: Tangent<f64> = Tangent::thunk(|| Ok(Tangent::Zero));
        assert_eq!(
            t.as_array_mut().unwrap_err(),
            TangentError::MutateBeforeForcing
        );
    }

    #[test]
    fn test_zero_likes_convert_to_scalar_zero() {
        assert_eq!(Tangent::<f64>::Zero.try_into_scalar().unwrap(), 0.0);
        assert_eq!(Tangent::<f64>::NoTangent.try_into_scalar().unwrap(), 0.0);
    }

    #[test]
    fn test_not_implemented_conversion_raises() {
        let t: Tangent<f64> = crate::not_implemented!("missing");
        assert!(matches!(
            t.try_into_scalar(),
            Err(TangentError::NotImplementedEvaluated { .. })
        ));
    }

    #[test]
    fn test_single_element_array_converts() {
        let t: Tangent<f64> = DenseArray::from_vec(vec![3.0], &[1, 1]).unwrap().into();
        assert_eq!(t.try_into_scalar().unwrap(), 3.0);
    }
}
