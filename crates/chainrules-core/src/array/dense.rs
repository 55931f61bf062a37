//! Dense column-major array storage for concrete tangents.
//!
//! Flat storage: a contiguous `Vec<T>` plus a shape, indexed in
//! column-major order. This is the "plain unconstrained array" that
//! generic propagators produce as gradient candidates.

use crate::error::TangentError;
use crate::scalar::Scalar;

/// A dense n-dimensional array with column-major layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseArray<T: Scalar> {
    data: Vec<T>,
    shape: Vec<usize>,
}

/// Strips trailing axes of length 1.
///
/// Two shapes are reshape-compatible for projection iff they are equal
/// after this: `(4, 1)` collapses to `(4,)`, but `(1, 4)` stays `(1, 4)`.
pub fn squeeze_trailing(shape: &[usize]) -> &[usize] {
    let mut end = shape.len();
    while end > 0 && shape[end - 1] == 1 {
        end -= 1;
    }
    &shape[..end]
}

impl<T: Scalar> DenseArray<T> {
    /// Create a zero-initialized array with the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product::<usize>().max(1);
        Self {
            data: vec![T::zero(); len],
            shape: shape.to_vec(),
        }
    }

    /// Create an array from data and shape (column-major order).
    ///
    /// # Errors
    ///
    /// Returns `TangentError::ShapeMismatch` if the data length does not
    /// match the shape.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self, TangentError> {
        let expected: usize = shape.iter().product::<usize>().max(1);
        if data.len() != expected {
            return Err(TangentError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    /// Shape of the array.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array holds zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat data slice (column-major).
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat data slice (column-major).
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Element at a cartesian index, if in bounds.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut linear = 0;
        let mut stride = 1;
        for (i, (&idx, &dim)) in index.iter().zip(self.shape.iter()).enumerate() {
            if idx >= dim {
                return None;
            }
            let _ = i;
            linear += idx * stride;
            stride *= dim;
        }
        self.data.get(linear)
    }

    /// Element `(i, j)` of a 2-D array. Callers must have checked the rank.
    #[inline]
    pub fn at2(&self, i: usize, j: usize) -> T {
        debug_assert_eq!(self.ndim(), 2);
        self.data[i + self.shape[0] * j]
    }

    /// Apply a function elementwise.
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Elementwise sum of two arrays of identical shape.
    ///
    /// # Errors
    ///
    /// Returns `TangentError::DimensionMismatch` if the shapes differ.
    pub fn add(&self, other: &Self) -> Result<Self, TangentError> {
        if self.shape != other.shape {
            return Err(TangentError::DimensionMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        Ok(Self {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| a + b)
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Add another array into this one, in place.
    pub fn add_assign(&mut self, other: &Self) -> Result<(), TangentError> {
        if self.shape != other.shape {
            return Err(TangentError::DimensionMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = *a + b;
        }
        Ok(())
    }

    /// Scale every element by a scalar.
    pub fn scale(&self, s: T) -> Self {
        self.map(|x| x * s)
    }

    /// Reinterpret the data under a new shape of the same length.
    ///
    /// # Errors
    ///
    /// Returns `TangentError::ShapeMismatch` if the element counts differ.
    pub fn reshape(self, shape: &[usize]) -> Result<Self, TangentError> {
        let expected: usize = shape.iter().product::<usize>().max(1);
        if self.data.len() != expected {
            return Err(TangentError::ShapeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(Self {
            data: self.data,
            shape: shape.to_vec(),
        })
    }

    /// Transpose of a 2-D array.
    ///
    /// # Errors
    ///
    /// Returns `TangentError::RankMismatch` for non-matrix input.
    pub fn transpose(&self) -> Result<Self, TangentError> {
        if self.ndim() != 2 {
            return Err(TangentError::RankMismatch {
                expected: 2,
                actual: self.ndim(),
            });
        }
        let (r, c) = (self.shape[0], self.shape[1]);
        let mut data = vec![T::zero(); self.data.len()];
        for j in 0..c {
            for i in 0..r {
                data[j + c * i] = self.data[i + r * j];
            }
        }
        Ok(Self {
            data,
            shape: vec![c, r],
        })
    }

    /// Conjugate transpose of a 2-D array.
    pub fn adjoint(&self) -> Result<Self, TangentError> {
        Ok(self.transpose()?.map(|x| x.conjugate()))
    }

    /// Diagonal of a square matrix.
    ///
    /// # Errors
    ///
    /// Returns `TangentError::RankMismatch` or `TangentError::NotSquare`.
    pub fn diag(&self) -> Result<Vec<T>, TangentError> {
        if self.ndim() != 2 {
            return Err(TangentError::RankMismatch {
                expected: 2,
                actual: self.ndim(),
            });
        }
        let (r, c) = (self.shape[0], self.shape[1]);
        if r != c {
            return Err(TangentError::NotSquare { rows: r, cols: c });
        }
        Ok((0..r).map(|i| self.data[i + r * i]).collect())
    }

    /// Conjugating inner product `sum(conj(a) * b)`.
    pub fn dot(&self, other: &Self) -> Result<T, TangentError> {
        if self.shape != other.shape {
            return Err(TangentError::DimensionMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        let mut acc = T::zero();
        for (&a, &b) in self.data.iter().zip(other.data.iter()) {
            acc = acc + a.conjugate() * b;
        }
        Ok(acc)
    }
}

/// A dense array of booleans, used as a discrete primal.
///
/// Boolean values have no tangent space; a projector built from one
/// collapses to the no-tangent case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolArray {
    data: Vec<bool>,
    shape: Vec<usize>,
}

impl BoolArray {
    /// Create a boolean array from data and shape (column-major order).
    pub fn from_vec(data: Vec<bool>, shape: &[usize]) -> Result<Self, TangentError> {
        let expected: usize = shape.iter().product::<usize>().max(1);
        if data.len() != expected {
            return Err(TangentError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    /// Shape of the array.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat data slice.
    #[inline]
    pub fn data(&self) -> &[bool] {
        &self.data
    }
}
