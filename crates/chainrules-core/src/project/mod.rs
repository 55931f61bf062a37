//! Projection of tangent candidates onto a primal's tangent subspace.
//!
//! Mirrors ChainRulesCore.jl's `ProjectTo`. Generic propagators produce
//! dense, unconstrained gradient candidates, because the linear-algebra
//! identity used to derive them knows nothing about the caller's storage
//! optimization. Naively adding such a candidate to a structured primal
//! silently escapes its subspace (nonzero off-diagonal entries on a
//! diagonal, asymmetry on a symmetric). A [`Projector`] is built once per
//! primal instance, captures whatever structure the tangent alone cannot
//! recover, and forces any acceptable candidate back into the legal
//! subspace. It lives for one gradient computation and is then discarded.

mod containers;

pub use containers::Projectable;

use crate::array::dense::squeeze_trailing;
use crate::array::{ArrayValue, DenseArray, Uplo};
use crate::error::TangentError;
use crate::scalar::Scalar;
use crate::tangent::structural::{StructuralTangent, TangentFields};
use crate::tangent::thunk::Thunk;
use crate::tangent::Tangent;

/// The captured structure of one primal instance.
///
/// Kept as data rather than an opaque closure so the full set of
/// structured-container special cases is auditable in one place.
#[derive(Debug, Clone)]
pub enum ProjectorKind<T: Scalar> {
    /// The primal has no tangent space (boolean, integer, discrete).
    NoTangent,
    /// A plain number; `real` narrows complex candidates onto the real axis.
    Scalar { real: bool },
    /// A dense array of numbers.
    Dense { shape: Vec<usize>, real: bool },
    /// A diagonal matrix: off-diagonal contributions are discarded.
    Diagonal { n: usize },
    /// A symmetric or Hermitian matrix: candidates are averaged with their
    /// own transpose or adjoint.
    Symmetric { n: usize, uplo: Uplo, hermitian: bool },
    /// A triangular matrix: the opposite triangle is masked off.
    Triangular { n: usize, uplo: Uplo },
    /// A sparse vector: only the stored index set is read.
    SparseVector { len: usize, indices: Vec<usize> },
    /// A CSC sparse matrix: only the stored pattern is read.
    SparseCsc {
        nrows: usize,
        ncols: usize,
        colptr: Vec<usize>,
        rowval: Vec<usize>,
    },
    /// A lazy transpose/adjoint: candidates are flipped, projected through
    /// the parent's projector, and flipped back.
    Transpose {
        inner: Box<Projector<T>>,
        conjugate: bool,
    },
    /// An aggregate primal: one sub-projector per field.
    Struct {
        type_name: &'static str,
        field_order: &'static [&'static str],
        fields: Vec<(&'static str, Projector<T>)>,
    },
}

impl<T: Scalar> ProjectorKind<T> {
    fn name(&self) -> &'static str {
        match self {
            ProjectorKind::NoTangent => "no-tangent projector",
            ProjectorKind::Scalar { .. } => "scalar projector",
            ProjectorKind::Dense { .. } => "dense projector",
            ProjectorKind::Diagonal { .. } => "diagonal projector",
            ProjectorKind::Symmetric { .. } => "symmetric projector",
            ProjectorKind::Triangular { .. } => "triangular projector",
            ProjectorKind::SparseVector { .. } => "sparse vector projector",
            ProjectorKind::SparseCsc { .. } => "sparse matrix projector",
            ProjectorKind::Transpose { .. } => "transpose projector",
            ProjectorKind::Struct { .. } => "structural projector",
        }
    }

    fn expected_shape(&self) -> Vec<usize> {
        match self {
            ProjectorKind::NoTangent
            | ProjectorKind::Scalar { .. }
            | ProjectorKind::Struct { .. } => vec![],
            ProjectorKind::Dense { shape, .. } => shape.clone(),
            ProjectorKind::Diagonal { n }
            | ProjectorKind::Symmetric { n, .. }
            | ProjectorKind::Triangular { n, .. } => vec![*n, *n],
            ProjectorKind::SparseVector { len, .. } => vec![*len],
            ProjectorKind::SparseCsc { nrows, ncols, .. } => vec![*nrows, *ncols],
            ProjectorKind::Transpose { inner, .. } => {
                let mut s = inner.kind.expected_shape();
                s.reverse();
                s
            }
        }
    }
}

/// A reusable map from tangent candidates into one primal's tangent
/// subspace.
///
/// Built once per primal instance by [`Projectable::projector`] (or
/// [`Projector::for_struct`] for aggregates), applied possibly many times
/// within a single gradient computation.
///
/// # Example
///
/// ```
/// use chainrules_core::{DenseArray, Diagonal, Projectable, Tangent};
///
/// let primal = Diagonal::new(vec![1.0, 2.0, 3.0]);
/// let p = primal.projector();
///
/// // A dense candidate gradient loses its off-diagonal entries.
/// let g = DenseArray::from_vec(
///     vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
///     &[3, 3],
/// )
/// .unwrap();
/// let projected = p.project(g.into()).unwrap();
/// let expected: Tangent<f64> = Diagonal::new(vec![1.0, 5.0, 9.0]).into();
/// assert_eq!(projected, expected);
/// ```
#[derive(Debug, Clone)]
pub struct Projector<T: Scalar> {
    kind: ProjectorKind<T>,
    // `T` otherwise only appears in the Projector ↔ ProjectorKind cycle,
    // which leaves its variance unconstrained (rejected by the compiler).
    _marker: core::marker::PhantomData<T>,
}

impl<T: Scalar> Projector<T> {
    /// A projector that collapses every candidate to [`Tangent::NoTangent`].
    pub fn no_tangent() -> Self {
        Self::from_kind(ProjectorKind::NoTangent)
    }

    /// A projector for a plain number.
    pub fn scalar(real: bool) -> Self {
        Self::from_kind(ProjectorKind::Scalar { real })
    }

    /// A projector for a dense array of numbers.
    pub fn dense(shape: Vec<usize>, real: bool) -> Self {
        Self::from_kind(ProjectorKind::Dense { shape, real })
    }

    pub(crate) fn from_kind(kind: ProjectorKind<T>) -> Self {
        Self {
            kind,
            _marker: core::marker::PhantomData,
        }
    }

    /// A projector for an aggregate primal, one sub-projector per field.
    ///
    /// If every sub-projector independently collapses to the no-tangent
    /// case, the whole projector short-circuits to it here, at
    /// construction time, and application never visits any substructure.
    pub fn for_struct<P: TangentFields<T>>(primal: &P) -> Self {
        let fields = primal.field_projectors();
        if fields.iter().all(|(_, p)| p.is_no_tangent()) {
            return Self::no_tangent();
        }
        Self::from_kind(ProjectorKind::Struct {
            type_name: P::TYPE_NAME,
            field_order: P::field_names(),
            fields,
        })
    }

    /// The captured structure, for inspection.
    #[inline]
    pub fn kind(&self) -> &ProjectorKind<T> {
        &self.kind
    }

    /// Whether this projector collapses every candidate to no-tangent.
    #[inline]
    pub fn is_no_tangent(&self) -> bool {
        matches!(self.kind, ProjectorKind::NoTangent)
    }

    /// Force a candidate tangent into the captured subspace.
    ///
    /// Zero-like and not-implemented candidates always pass through;
    /// deferred candidates get the projection inserted *inside* the thunk
    /// without forcing it; everything else is reshaped, narrowed, masked,
    /// symmetrized or gathered per the captured kind.
    pub fn project(&self, dx: Tangent<T>) -> Result<Tangent<T>, TangentError> {
        let dx = match dx {
            ni @ Tangent::NotImplemented(_) => return Ok(ni),
            dx => dx,
        };
        if self.is_no_tangent() {
            return Ok(Tangent::NoTangent);
        }
        match dx {
            Tangent::Zero => Ok(Tangent::Zero),
            Tangent::NoTangent => Ok(Tangent::NoTangent),
            Tangent::Thunk(t) => {
                let p = self.clone();
                Ok(Tangent::Thunk(Thunk::new(move || p.project(t.force()?))))
            }
            Tangent::InplaceableThunk(it) => {
                let p = self.clone();
                let t = it.val().clone();
                Ok(Tangent::Thunk(Thunk::new(move || p.project(t.force()?))))
            }
            Tangent::Scalar(x) => self.project_scalar(x),
            Tangent::Array(a) => self.project_array(a),
            Tangent::Structural(st) => self.project_struct(st),
            Tangent::NotImplemented(_) => unreachable!("handled above"),
        }
    }

    fn project_scalar(&self, x: T) -> Result<Tangent<T>, TangentError> {
        match &self.kind {
            ProjectorKind::Scalar { real } => Ok(Tangent::Scalar(if *real {
                x.real_part()
            } else {
                x
            })),
            ProjectorKind::Struct { type_name, .. } => Err(TangentError::UndefinedOperation {
                op: "project",
                lhs: "scalar",
                rhs: type_name,
            }),
            kind => Err(TangentError::DimensionMismatch {
                expected: kind.expected_shape(),
                actual: vec![],
            }),
        }
    }

    fn project_array(&self, a: ArrayValue<T>) -> Result<Tangent<T>, TangentError> {
        match &self.kind {
            ProjectorKind::NoTangent => Ok(Tangent::NoTangent),
            ProjectorKind::Scalar { real } => {
                let d = a.to_dense();
                if d.len() == 1 {
                    let x = d.data()[0];
                    Ok(Tangent::Scalar(if *real { x.real_part() } else { x }))
                } else {
                    Err(TangentError::DimensionMismatch {
                        expected: vec![],
                        actual: d.shape().to_vec(),
                    })
                }
            }
            ProjectorKind::Dense { shape, real } => {
                let d = reshape_compat(a.to_dense(), shape)?;
                let d = if *real { d.map(|x| x.real_part()) } else { d };
                Ok(Tangent::Array(ArrayValue::Dense(d)))
            }
            ProjectorKind::Diagonal { n } => {
                if let ArrayValue::Diagonal(dg) = &a {
                    if dg.n() == *n {
                        return Ok(Tangent::Array(a));
                    }
                }
                let d = a.to_dense();
                check_shape(&d, &[*n, *n])?;
                Ok(Tangent::Array(ArrayValue::Diagonal(
                    crate::array::Diagonal::new(d.diag()?),
                )))
            }
            ProjectorKind::Symmetric { n, uplo, hermitian } => {
                let d = a.to_dense();
                check_shape(&d, &[*n, *n])?;
                let flipped = if *hermitian {
                    d.adjoint()?
                } else {
                    d.transpose()?
                };
                let avg = d.add(&flipped)?.map(|x| x.mul_real(0.5));
                if *hermitian {
                    Ok(Tangent::Array(ArrayValue::Hermitian(
                        crate::array::Hermitian::new(avg, *uplo)?,
                    )))
                } else {
                    Ok(Tangent::Array(ArrayValue::Symmetric(
                        crate::array::Symmetric::new(avg, *uplo)?,
                    )))
                }
            }
            ProjectorKind::Triangular { n, uplo } => {
                let d = a.to_dense();
                check_shape(&d, &[*n, *n])?;
                let masked = crate::array::Triangular::new(d, *uplo)?.to_dense();
                Ok(Tangent::Array(ArrayValue::Triangular(
                    crate::array::Triangular::new(masked, *uplo)?,
                )))
            }
            ProjectorKind::SparseVector { len, indices } => {
                let values = match &a {
                    ArrayValue::SparseVector(v) if v.len() == *len => {
                        indices.iter().map(|&i| v.get(i)).collect::<Vec<_>>()
                    }
                    other => {
                        let d = reshape_compat(other.to_dense(), &[*len])?;
                        indices.iter().map(|&i| d.data()[i]).collect()
                    }
                };
                Ok(Tangent::Array(ArrayValue::SparseVector(
                    crate::array::SparseVector::new(*len, indices.clone(), values)?,
                )))
            }
            ProjectorKind::SparseCsc {
                nrows,
                ncols,
                colptr,
                rowval,
            } => {
                let d = a.to_dense();
                check_shape(&d, &[*nrows, *ncols])?;
                let mut nzval = Vec::with_capacity(rowval.len());
                for j in 0..*ncols {
                    for p in colptr[j]..colptr[j + 1] {
                        nzval.push(d.at2(rowval[p], j));
                    }
                }
                Ok(Tangent::Array(ArrayValue::SparseCsc(
                    crate::array::SparseMatrixCsc::new(
                        *nrows,
                        *ncols,
                        colptr.clone(),
                        rowval.clone(),
                        nzval,
                    )?,
                )))
            }
            ProjectorKind::Transpose { inner, conjugate } => {
                let d = a.to_dense();
                let flipped = if *conjugate {
                    d.adjoint()?
                } else {
                    d.transpose()?
                };
                let projected = inner.project(Tangent::Array(ArrayValue::Dense(flipped)))?;
                match projected {
                    Tangent::Array(pa) => {
                        let pd = pa.to_dense();
                        let back = if *conjugate {
                            pd.adjoint()?
                        } else {
                            pd.transpose()?
                        };
                        Ok(Tangent::Array(ArrayValue::Dense(back)))
                    }
                    other => Ok(other),
                }
            }
            ProjectorKind::Struct { type_name, .. } => Err(TangentError::UndefinedOperation {
                op: "project",
                lhs: a.kind_name(),
                rhs: type_name,
            }),
        }
    }

    fn project_struct(&self, st: StructuralTangent<T>) -> Result<Tangent<T>, TangentError> {
        match &self.kind {
            ProjectorKind::Struct {
                type_name,
                field_order,
                fields,
            } => {
                if st.type_name() != *type_name {
                    return Err(TangentError::UndefinedOperation {
                        op: "project",
                        lhs: st.type_name(),
                        rhs: type_name,
                    });
                }
                let mut entries = Vec::with_capacity(fields.len());
                for (name, sub) in fields {
                    let projected = sub.project(st.field(name))?;
                    if !matches!(projected, Tangent::Zero) {
                        entries.push((*name, projected));
                    }
                }
                Ok(Tangent::Structural(StructuralTangent::from_parts(
                    type_name,
                    field_order,
                    entries,
                )))
            }
            kind => Err(TangentError::UndefinedOperation {
                op: "project",
                lhs: "structural tangent",
                rhs: kind.name(),
            }),
        }
    }
}

/// Reshape `d` to `shape` if the shapes differ only by trailing axes of
/// length 1 (fixing an accidental extra dimension); otherwise raise a
/// dimension mismatch naming both shapes.
fn reshape_compat<T: Scalar>(
    d: DenseArray<T>,
    shape: &[usize],
) -> Result<DenseArray<T>, TangentError> {
    if d.shape() == shape {
        return Ok(d);
    }
    if squeeze_trailing(d.shape()) == squeeze_trailing(shape) {
        return d.reshape(shape);
    }
    Err(TangentError::DimensionMismatch {
        expected: shape.to_vec(),
        actual: d.shape().to_vec(),
    })
}

fn check_shape<T: Scalar>(d: &DenseArray<T>, shape: &[usize]) -> Result<(), TangentError> {
    if d.shape() != shape {
        return Err(TangentError::DimensionMismatch {
            expected: shape.to_vec(),
            actual: d.shape().to_vec(),
        });
    }
    Ok(())
}
