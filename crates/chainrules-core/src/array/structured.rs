//! Structured matrix wrappers.
//!
//! These mirror the LinearAlgebra wrapper types a Julia primal can carry:
//! `Diagonal`, `Symmetric`/`Hermitian`, upper/lower `Triangular`, and the
//! lazy `Transpose`/`Adjoint` views. Each stores only what is legally
//! addressable; densifying materializes the implied full matrix.
//!
//! A tangent for one of these primals must stay inside the same structural
//! subspace. The projector in [`crate::project`] is what enforces that.

use crate::array::dense::DenseArray;
use crate::error::TangentError;
use crate::scalar::Scalar;

/// Which triangle of a wrapped parent matrix is the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uplo {
    Upper,
    Lower,
}

/// A square diagonal matrix storing only its diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagonal<T: Scalar> {
    diag: Vec<T>,
}

impl<T: Scalar> Diagonal<T> {
    /// Create an `n`x`n` diagonal matrix from its diagonal entries.
    pub fn new(diag: Vec<T>) -> Self {
        Self { diag }
    }

    /// Side length of the matrix.
    #[inline]
    pub fn n(&self) -> usize {
        self.diag.len()
    }

    /// The stored diagonal.
    #[inline]
    pub fn diag(&self) -> &[T] {
        &self.diag
    }

    /// Materialize the full `n`x`n` matrix.
    pub fn to_dense(&self) -> DenseArray<T> {
        let n = self.n();
        let mut out = DenseArray::zeros(&[n, n]);
        for (i, &d) in self.diag.iter().enumerate() {
            out.data_mut()[i + n * i] = d;
        }
        out
    }

    /// Elementwise sum of two diagonals of the same size.
    pub fn add(&self, other: &Self) -> Result<Self, TangentError> {
        if self.n() != other.n() {
            return Err(TangentError::DimensionMismatch {
                expected: vec![self.n(), self.n()],
                actual: vec![other.n(), other.n()],
            });
        }
        Ok(Self {
            diag: self
                .diag
                .iter()
                .zip(other.diag.iter())
                .map(|(&a, &b)| a + b)
                .collect(),
        })
    }

    /// Scale every diagonal entry.
    pub fn scale(&self, s: T) -> Self {
        Self {
            diag: self.diag.iter().map(|&x| x * s).collect(),
        }
    }
}

fn check_square<T: Scalar>(parent: &DenseArray<T>) -> Result<usize, TangentError> {
    if parent.ndim() != 2 {
        return Err(TangentError::RankMismatch {
            expected: 2,
            actual: parent.ndim(),
        });
    }
    let (r, c) = (parent.shape()[0], parent.shape()[1]);
    if r != c {
        return Err(TangentError::NotSquare { rows: r, cols: c });
    }
    Ok(r)
}

/// Mirror the `uplo` triangle of `parent` across the diagonal.
///
/// With `conjugate` set, the reflected entries are conjugated and the
/// diagonal is forced real (the Hermitian case).
fn mirror_triangle<T: Scalar>(parent: &DenseArray<T>, uplo: Uplo, conjugate: bool) -> DenseArray<T> {
    let n = parent.shape()[0];
    let mut out = DenseArray::zeros(&[n, n]);
    for j in 0..n {
        for i in 0..n {
            let stored = match uplo {
                Uplo::Upper => i <= j,
                Uplo::Lower => i >= j,
            };
            let v = if stored {
                let v = parent.at2(i, j);
                if conjugate && i == j {
                    v.real_part()
                } else {
                    v
                }
            } else {
                let v = parent.at2(j, i);
                if conjugate {
                    v.conjugate()
                } else {
                    v
                }
            };
            out.data_mut()[i + n * j] = v;
        }
    }
    out
}

/// A symmetric view of a square parent matrix.
///
/// Only the `uplo` triangle of the parent is meaningful; the other is
/// implied by symmetry.
#[derive(Debug, Clone, PartialEq)]
pub struct Symmetric<T: Scalar> {
    parent: DenseArray<T>,
    uplo: Uplo,
}

impl<T: Scalar> Symmetric<T> {
    /// Wrap a square parent matrix.
    pub fn new(parent: DenseArray<T>, uplo: Uplo) -> Result<Self, TangentError> {
        check_square(&parent)?;
        Ok(Self { parent, uplo })
    }

    /// Side length of the matrix.
    #[inline]
    pub fn n(&self) -> usize {
        self.parent.shape()[0]
    }

    /// The stored triangle marker.
    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    /// The wrapped parent matrix.
    #[inline]
    pub fn parent(&self) -> &DenseArray<T> {
        &self.parent
    }

    /// Materialize the full symmetric matrix from the stored triangle.
    pub fn to_dense(&self) -> DenseArray<T> {
        mirror_triangle(&self.parent, self.uplo, false)
    }
}

/// A Hermitian view of a square parent matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Hermitian<T: Scalar> {
    parent: DenseArray<T>,
    uplo: Uplo,
}

impl<T: Scalar> Hermitian<T> {
    /// Wrap a square parent matrix.
    pub fn new(parent: DenseArray<T>, uplo: Uplo) -> Result<Self, TangentError> {
        check_square(&parent)?;
        Ok(Self { parent, uplo })
    }

    /// Side length of the matrix.
    #[inline]
    pub fn n(&self) -> usize {
        self.parent.shape()[0]
    }

    /// The stored triangle marker.
    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    /// The wrapped parent matrix.
    #[inline]
    pub fn parent(&self) -> &DenseArray<T> {
        &self.parent
    }

    /// Materialize the full Hermitian matrix from the stored triangle.
    pub fn to_dense(&self) -> DenseArray<T> {
        mirror_triangle(&self.parent, self.uplo, true)
    }
}

/// A triangular view of a square parent matrix.
///
/// Entries outside the `uplo` triangle are structurally zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangular<T: Scalar> {
    parent: DenseArray<T>,
    uplo: Uplo,
}

impl<T: Scalar> Triangular<T> {
    /// Wrap a square parent matrix.
    pub fn new(parent: DenseArray<T>, uplo: Uplo) -> Result<Self, TangentError> {
        check_square(&parent)?;
        Ok(Self { parent, uplo })
    }

    /// Side length of the matrix.
    #[inline]
    pub fn n(&self) -> usize {
        self.parent.shape()[0]
    }

    /// The stored triangle marker.
    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    /// The wrapped parent matrix.
    #[inline]
    pub fn parent(&self) -> &DenseArray<T> {
        &self.parent
    }

    /// Materialize the full matrix, zeroing the opposite triangle.
    pub fn to_dense(&self) -> DenseArray<T> {
        let n = self.n();
        let mut out = DenseArray::zeros(&[n, n]);
        for j in 0..n {
            for i in 0..n {
                let stored = match self.uplo {
                    Uplo::Upper => i <= j,
                    Uplo::Lower => i >= j,
                };
                if stored {
                    out.data_mut()[i + n * j] = self.parent.at2(i, j);
                }
            }
        }
        out
    }

    /// Elementwise sum of two triangulars with the same shape and uplo.
    pub fn add(&self, other: &Self) -> Result<Self, TangentError> {
        if self.uplo != other.uplo {
            return Err(TangentError::UndefinedOperation {
                op: "+",
                lhs: "upper triangular",
                rhs: "lower triangular",
            });
        }
        Ok(Self {
            parent: self.parent.add(&other.parent)?,
            uplo: self.uplo,
        })
    }
}

/// A lazy transpose of a dense parent matrix, used as a primal.
#[derive(Debug, Clone, PartialEq)]
pub struct Transpose<T: Scalar> {
    parent: DenseArray<T>,
}

impl<T: Scalar> Transpose<T> {
    /// Wrap a parent matrix.
    pub fn new(parent: DenseArray<T>) -> Result<Self, TangentError> {
        if parent.ndim() != 2 {
            return Err(TangentError::RankMismatch {
                expected: 2,
                actual: parent.ndim(),
            });
        }
        Ok(Self { parent })
    }

    /// The wrapped parent matrix.
    #[inline]
    pub fn parent(&self) -> &DenseArray<T> {
        &self.parent
    }
}

/// A lazy conjugate transpose of a dense parent matrix, used as a primal.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjoint<T: Scalar> {
    parent: DenseArray<T>,
}

impl<T: Scalar> Adjoint<T> {
    /// Wrap a parent matrix.
    pub fn new(parent: DenseArray<T>) -> Result<Self, TangentError> {
        if parent.ndim() != 2 {
            return Err(TangentError::RankMismatch {
                expected: 2,
                actual: parent.ndim(),
            });
        }
        Ok(Self { parent })
    }

    /// The wrapped parent matrix.
    #[inline]
    pub fn parent(&self) -> &DenseArray<T> {
        &self.parent
    }
}
