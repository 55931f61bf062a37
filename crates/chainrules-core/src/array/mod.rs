//! Concrete array values acting as their own tangents.
//!
//! The storage hierarchy, in one place:
//!
//! ```text
//! ArrayValue<T>
//! ├── Dense        - contiguous column-major storage
//! ├── Diagonal     - diagonal entries only
//! ├── Symmetric    - square parent + uplo, mirrored
//! ├── Hermitian    - square parent + uplo, conjugate-mirrored
//! ├── Triangular   - square parent + uplo, other triangle zero
//! ├── SparseVector - sorted stored-index set
//! └── SparseCsc    - compressed sparse column pattern
//! ```
//!
//! Same-kind addition stays structured; mixed-kind addition densifies.

pub mod dense;
pub mod sparse;
pub mod structured;

pub use dense::{BoolArray, DenseArray};
pub use sparse::{SparseMatrixCsc, SparseVector};
pub use structured::{Adjoint, Diagonal, Hermitian, Symmetric, Transpose, Triangular, Uplo};

use crate::error::TangentError;
use crate::scalar::Scalar;

/// A concrete array tangent, in any of the supported storage forms.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue<T: Scalar> {
    Dense(DenseArray<T>),
    Diagonal(Diagonal<T>),
    Symmetric(Symmetric<T>),
    Hermitian(Hermitian<T>),
    Triangular(Triangular<T>),
    SparseVector(SparseVector<T>),
    SparseCsc(SparseMatrixCsc<T>),
}

impl<T: Scalar> ArrayValue<T> {
    /// Human-readable storage kind, for error payloads.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArrayValue::Dense(_) => "dense array",
            ArrayValue::Diagonal(_) => "diagonal matrix",
            ArrayValue::Symmetric(_) => "symmetric matrix",
            ArrayValue::Hermitian(_) => "hermitian matrix",
            ArrayValue::Triangular(_) => "triangular matrix",
            ArrayValue::SparseVector(_) => "sparse vector",
            ArrayValue::SparseCsc(_) => "sparse matrix",
        }
    }

    /// Logical shape of the value.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            ArrayValue::Dense(a) => a.shape().to_vec(),
            ArrayValue::Diagonal(d) => vec![d.n(), d.n()],
            ArrayValue::Symmetric(s) => vec![s.n(), s.n()],
            ArrayValue::Hermitian(h) => vec![h.n(), h.n()],
            ArrayValue::Triangular(t) => vec![t.n(), t.n()],
            ArrayValue::SparseVector(v) => vec![v.len()],
            ArrayValue::SparseCsc(m) => vec![m.nrows(), m.ncols()],
        }
    }

    /// Materialize as a dense array.
    pub fn to_dense(&self) -> DenseArray<T> {
        match self {
            ArrayValue::Dense(a) => a.clone(),
            ArrayValue::Diagonal(d) => d.to_dense(),
            ArrayValue::Symmetric(s) => s.to_dense(),
            ArrayValue::Hermitian(h) => h.to_dense(),
            ArrayValue::Triangular(t) => t.to_dense(),
            ArrayValue::SparseVector(v) => v.to_dense(),
            ArrayValue::SparseCsc(m) => m.to_dense(),
        }
    }

    /// Structure-aware sum. Same-kind pairs stay in their storage form
    /// where the result provably has that structure; mixed pairs densify.
    pub fn add(self, other: Self) -> Result<Self, TangentError> {
        use ArrayValue::*;
        match (self, other) {
            (Dense(a), Dense(b)) => Ok(Dense(a.add(&b)?)),
            (Diagonal(a), Diagonal(b)) => Ok(Diagonal(a.add(&b)?)),
            (SparseVector(a), SparseVector(b)) => Ok(SparseVector(a.add(&b)?)),
            (SparseCsc(a), SparseCsc(b)) if a.same_pattern(&b) => {
                Ok(SparseCsc(a.add_same_pattern(&b)?))
            }
            (Symmetric(a), Symmetric(b)) if a.uplo() == b.uplo() => Ok(Symmetric(
                structured::Symmetric::new(a.parent().add(b.parent())?, a.uplo())?,
            )),
            (Hermitian(a), Hermitian(b)) if a.uplo() == b.uplo() => Ok(Hermitian(
                structured::Hermitian::new(a.parent().add(b.parent())?, a.uplo())?,
            )),
            (Triangular(a), Triangular(b)) if a.uplo() == b.uplo() => Ok(Triangular(a.add(&b)?)),
            (a, b) => Ok(Dense(a.to_dense().add(&b.to_dense())?)),
        }
    }

    /// Scale every element.
    pub fn scale(&self, s: T) -> Self {
        match self {
            ArrayValue::Dense(a) => ArrayValue::Dense(a.scale(s)),
            ArrayValue::Diagonal(d) => ArrayValue::Diagonal(d.scale(s)),
            // Scaling by a complex factor can break (conjugate) symmetry of
            // the implied full matrix, so these go through dense.
            ArrayValue::Symmetric(x) => ArrayValue::Dense(x.to_dense().scale(s)),
            ArrayValue::Hermitian(x) => ArrayValue::Dense(x.to_dense().scale(s)),
            ArrayValue::Triangular(x) => ArrayValue::Dense(x.to_dense().scale(s)),
            ArrayValue::SparseVector(v) => ArrayValue::SparseVector(v.scale(s)),
            ArrayValue::SparseCsc(m) => ArrayValue::SparseCsc(m.scale(s)),
        }
    }

    /// Conjugating inner product over the full (densified) values.
    pub fn dot(&self, other: &Self) -> Result<T, TangentError> {
        match (self, other) {
            (ArrayValue::Dense(a), ArrayValue::Dense(b)) => a.dot(b),
            (ArrayValue::Diagonal(a), ArrayValue::Diagonal(b)) => {
                if a.n() != b.n() {
                    return Err(TangentError::DimensionMismatch {
                        expected: vec![a.n(), a.n()],
                        actual: vec![b.n(), b.n()],
                    });
                }
                let mut acc = T::zero();
                for (&x, &y) in a.diag().iter().zip(b.diag().iter()) {
                    acc = acc + x.conjugate() * y;
                }
                Ok(acc)
            }
            (a, b) => a.to_dense().dot(&b.to_dense()),
        }
    }
}

impl<T: Scalar> From<DenseArray<T>> for ArrayValue<T> {
    fn from(a: DenseArray<T>) -> Self {
        ArrayValue::Dense(a)
    }
}

impl<T: Scalar> From<Diagonal<T>> for ArrayValue<T> {
    fn from(d: Diagonal<T>) -> Self {
        ArrayValue::Diagonal(d)
    }
}

impl<T: Scalar> From<Symmetric<T>> for ArrayValue<T> {
    fn from(s: Symmetric<T>) -> Self {
        ArrayValue::Symmetric(s)
    }
}

impl<T: Scalar> From<Hermitian<T>> for ArrayValue<T> {
    fn from(h: Hermitian<T>) -> Self {
        ArrayValue::Hermitian(h)
    }
}

impl<T: Scalar> From<Triangular<T>> for ArrayValue<T> {
    fn from(t: Triangular<T>) -> Self {
        ArrayValue::Triangular(t)
    }
}

impl<T: Scalar> From<SparseVector<T>> for ArrayValue<T> {
    fn from(v: SparseVector<T>) -> Self {
        ArrayValue::SparseVector(v)
    }
}

impl<T: Scalar> From<SparseMatrixCsc<T>> for ArrayValue<T> {
    fn from(m: SparseMatrixCsc<T>) -> Self {
        ArrayValue::SparseCsc(m)
    }
}
