//! [`Projectable`] implementations for the primal container types.
//!
//! Each implementation records exactly the structure a dense gradient
//! candidate cannot recover on its own: shapes, stored triangles, sparsity
//! patterns, realness. Discrete primals collapse to the no-tangent
//! projector outright.

use faer_traits::ComplexField;

use crate::array::{
    Adjoint, ArrayValue, BoolArray, DenseArray, Diagonal, Hermitian, SparseMatrixCsc,
    SparseVector, Symmetric, Transpose, Triangular,
};
use crate::scalar::{c64, Scalar};

use super::{Projector, ProjectorKind};

/// Types that can describe their own tangent subspace.
///
/// Implemented for every primal container; aggregates get it by delegating
/// to [`Projector::for_struct`].
pub trait Projectable<T: Scalar> {
    /// Build a projector capturing this primal instance's structure.
    fn projector(&self) -> Projector<T>;
}

impl Projectable<f64> for f64 {
    fn projector(&self) -> Projector<f64> {
        Projector::scalar(true)
    }
}

// A real primal participating in a complex computation: candidates are
// complex, but only their real part is a legal tangent.
impl Projectable<c64> for f64 {
    fn projector(&self) -> Projector<c64> {
        Projector::scalar(true)
    }
}

impl Projectable<c64> for c64 {
    fn projector(&self) -> Projector<c64> {
        Projector::scalar(false)
    }
}

impl<T: Scalar> Projectable<T> for bool {
    fn projector(&self) -> Projector<T> {
        Projector::no_tangent()
    }
}

impl<T: Scalar> Projectable<T> for i64 {
    fn projector(&self) -> Projector<T> {
        Projector::no_tangent()
    }
}

impl<T: Scalar> Projectable<T> for BoolArray {
    fn projector(&self) -> Projector<T> {
        Projector::no_tangent()
    }
}

impl<T: Scalar> Projectable<T> for DenseArray<T> {
    fn projector(&self) -> Projector<T> {
        Projector::dense(self.shape().to_vec(), <T as ComplexField>::IS_REAL)
    }
}

impl<T: Scalar> Projectable<T> for Diagonal<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::Diagonal { n: self.n() })
    }
}

impl<T: Scalar> Projectable<T> for Symmetric<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::Symmetric {
            n: self.n(),
            uplo: self.uplo(),
            hermitian: false,
        })
    }
}

impl<T: Scalar> Projectable<T> for Hermitian<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::Symmetric {
            n: self.n(),
            uplo: self.uplo(),
            hermitian: true,
        })
    }
}

impl<T: Scalar> Projectable<T> for Triangular<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::Triangular {
            n: self.n(),
            uplo: self.uplo(),
        })
    }
}

impl<T: Scalar> Projectable<T> for SparseVector<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::SparseVector {
            len: self.len(),
            indices: self.indices().to_vec(),
        })
    }
}

impl<T: Scalar> Projectable<T> for SparseMatrixCsc<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::SparseCsc {
            nrows: self.nrows(),
            ncols: self.ncols(),
            colptr: self.colptr().to_vec(),
            rowval: self.rowval().to_vec(),
        })
    }
}

impl<T: Scalar> Projectable<T> for Transpose<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::Transpose {
            inner: Box::new(self.parent().projector()),
            conjugate: false,
        })
    }
}

impl<T: Scalar> Projectable<T> for Adjoint<T> {
    fn projector(&self) -> Projector<T> {
        Projector::from_kind(ProjectorKind::Transpose {
            inner: Box::new(self.parent().projector()),
            conjugate: true,
        })
    }
}

impl<T: Scalar> Projectable<T> for ArrayValue<T> {
    fn projector(&self) -> Projector<T> {
        match self {
            ArrayValue::Dense(a) => a.projector(),
            ArrayValue::Diagonal(d) => d.projector(),
            ArrayValue::Symmetric(s) => s.projector(),
            ArrayValue::Hermitian(h) => h.projector(),
            ArrayValue::Triangular(t) => t.projector(),
            ArrayValue::SparseVector(v) => v.projector(),
            ArrayValue::SparseCsc(m) => m.projector(),
        }
    }
}
