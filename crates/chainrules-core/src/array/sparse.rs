//! Sparse storage for concrete tangents.
//!
//! A sparse primal's tangent may only live on the stored (structurally
//! nonzero) index set; the projector reads exactly those entries and
//! nothing else. Same-pattern addition stays sparse, anything else
//! falls back to a dense result.

use crate::array::dense::DenseArray;
use crate::error::TangentError;
use crate::scalar::Scalar;

/// A sparse vector with a sorted stored-index set.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector<T: Scalar> {
    len: usize,
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> SparseVector<T> {
    /// Create a sparse vector. `indices` must be strictly increasing and
    /// in bounds for `len`.
    pub fn new(len: usize, indices: Vec<usize>, values: Vec<T>) -> Result<Self, TangentError> {
        if indices.len() != values.len() {
            return Err(TangentError::ShapeMismatch {
                expected: indices.len(),
                actual: values.len(),
            });
        }
        if let Some(&last) = indices.last() {
            if last >= len {
                return Err(TangentError::ShapeMismatch {
                    expected: len,
                    actual: last + 1,
                });
            }
        }
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Ok(Self {
            len,
            indices,
            values,
        })
    }

    /// Logical length of the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has logical length zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The stored index set.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The stored values, aligned with [`Self::indices`].
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Value at a logical index (zero off the stored set).
    pub fn get(&self, i: usize) -> T {
        match self.indices.binary_search(&i) {
            Ok(p) => self.values[p],
            Err(_) => T::zero(),
        }
    }

    /// Materialize as a dense vector.
    pub fn to_dense(&self) -> DenseArray<T> {
        let mut out = DenseArray::zeros(&[self.len]);
        for (&i, &v) in self.indices.iter().zip(self.values.iter()) {
            out.data_mut()[i] = v;
        }
        out
    }

    /// Sum of two sparse vectors of the same length; the result's stored
    /// set is the union of both index sets.
    pub fn add(&self, other: &Self) -> Result<Self, TangentError> {
        if self.len != other.len {
            return Err(TangentError::DimensionMismatch {
                expected: vec![self.len],
                actual: vec![other.len],
            });
        }
        let mut indices = Vec::with_capacity(self.indices.len() + other.indices.len());
        let mut values = Vec::with_capacity(indices.capacity());
        let (mut a, mut b) = (0, 0);
        while a < self.indices.len() || b < other.indices.len() {
            let ia = self.indices.get(a).copied();
            let ib = other.indices.get(b).copied();
            match (ia, ib) {
                (Some(i), Some(j)) if i == j => {
                    indices.push(i);
                    values.push(self.values[a] + other.values[b]);
                    a += 1;
                    b += 1;
                }
                (Some(i), Some(j)) if i < j => {
                    indices.push(i);
                    values.push(self.values[a]);
                    a += 1;
                }
                (Some(_), Some(j)) => {
                    indices.push(j);
                    values.push(other.values[b]);
                    b += 1;
                }
                (Some(i), None) => {
                    indices.push(i);
                    values.push(self.values[a]);
                    a += 1;
                }
                (None, Some(j)) => {
                    indices.push(j);
                    values.push(other.values[b]);
                    b += 1;
                }
                (None, None) => unreachable!(),
            }
        }
        Self::new(self.len, indices, values)
    }

    /// Scale every stored value.
    pub fn scale(&self, s: T) -> Self {
        Self {
            len: self.len,
            indices: self.indices.clone(),
            values: self.values.iter().map(|&v| v * s).collect(),
        }
    }
}

/// A sparse matrix in compressed sparse column format.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrixCsc<T: Scalar> {
    nrows: usize,
    ncols: usize,
    colptr: Vec<usize>,
    rowval: Vec<usize>,
    nzval: Vec<T>,
}

impl<T: Scalar> SparseMatrixCsc<T> {
    /// Create a CSC matrix from its raw pattern and values.
    pub fn new(
        nrows: usize,
        ncols: usize,
        colptr: Vec<usize>,
        rowval: Vec<usize>,
        nzval: Vec<T>,
    ) -> Result<Self, TangentError> {
        if colptr.len() != ncols + 1 {
            return Err(TangentError::ShapeMismatch {
                expected: ncols + 1,
                actual: colptr.len(),
            });
        }
        let nnz = *colptr.last().unwrap_or(&0);
        if rowval.len() != nnz || nzval.len() != nnz {
            return Err(TangentError::ShapeMismatch {
                expected: nnz,
                actual: rowval.len().max(nzval.len()),
            });
        }
        Ok(Self {
            nrows,
            ncols,
            colptr,
            rowval,
            nzval,
        })
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Column pointers (`ncols + 1` entries).
    #[inline]
    pub fn colptr(&self) -> &[usize] {
        &self.colptr
    }

    /// Row indices of the stored entries, column by column.
    #[inline]
    pub fn rowval(&self) -> &[usize] {
        &self.rowval
    }

    /// Stored values, aligned with [`Self::rowval`].
    #[inline]
    pub fn nzval(&self) -> &[T] {
        &self.nzval
    }

    /// Whether two matrices share the same sparsity pattern.
    pub fn same_pattern(&self, other: &Self) -> bool {
        self.nrows == other.nrows
            && self.ncols == other.ncols
            && self.colptr == other.colptr
            && self.rowval == other.rowval
    }

    /// Materialize as a dense matrix.
    pub fn to_dense(&self) -> DenseArray<T> {
        let mut out = DenseArray::zeros(&[self.nrows, self.ncols]);
        for j in 0..self.ncols {
            for p in self.colptr[j]..self.colptr[j + 1] {
                out.data_mut()[self.rowval[p] + self.nrows * j] = self.nzval[p];
            }
        }
        out
    }

    /// Same-pattern sum; callers fall back to dense addition otherwise.
    pub fn add_same_pattern(&self, other: &Self) -> Result<Self, TangentError> {
        if !self.same_pattern(other) {
            return Err(TangentError::UndefinedOperation {
                op: "+",
                lhs: "sparse matrix",
                rhs: "sparse matrix with different pattern",
            });
        }
        Ok(Self {
            nrows: self.nrows,
            ncols: self.ncols,
            colptr: self.colptr.clone(),
            rowval: self.rowval.clone(),
            nzval: self
                .nzval
                .iter()
                .zip(other.nzval.iter())
                .map(|(&a, &b)| a + b)
                .collect(),
        })
    }

    /// Scale every stored value.
    pub fn scale(&self, s: T) -> Self {
        Self {
            nrows: self.nrows,
            ncols: self.ncols,
            colptr: self.colptr.clone(),
            rowval: self.rowval.clone(),
            nzval: self.nzval.iter().map(|&v| v * s).collect(),
        }
    }
}
