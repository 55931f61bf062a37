//! chainrules-core - Rust port of ChainRulesCore.jl's tangent algebra
//!
//! This crate provides the tangent (derivative) value types shared by
//! automatic-differentiation engines and the rules written for them: the
//! closed set of tangent kinds, the total combination lattice over them,
//! deferred (thunked) tangents, structural tangents for aggregate primals,
//! in-place accumulation, and projection of gradient candidates back onto
//! a primal's tangent subspace.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Tangent kinds (tangent module)
//!     → Tangent, Thunk, InplaceableThunk, StructuralTangent
//!
//! Level 2: Combination lattice (algebra, accumulate modules)
//!     → add, mul, dot, scale, muladd, add_accumulate
//!
//! Level 3: Concrete storage and projection (array, project modules)
//!     → DenseArray, structured/sparse wrappers
//!     → Projector built per primal via Projectable
//! ```
//!
//! # Example
//!
//! ```
//! use chainrules_core::{algebra, DenseArray, Projectable, Tangent};
//!
//! // Zero-like tangents are free to combine with.
//! let g: Tangent<f64> = DenseArray::from_vec(vec![1.0, 2.0], &[2]).unwrap().into();
//! let sum = algebra::add(Tangent::Zero, g.clone()).unwrap();
//! assert_eq!(sum, g);
//!
//! // A projector forces candidates back into a primal's subspace.
//! let primal: DenseArray<f64> = DenseArray::zeros(&[2]);
//! let p = primal.projector();
//! assert_eq!(p.project(Tangent::Zero).unwrap(), Tangent::Zero);
//! ```

pub mod accumulate;
pub mod algebra;
pub mod array;
pub mod error;
pub mod project;
pub mod scalar;
pub mod tangent;

pub use accumulate::{add_accumulate, is_inplaceable_destination, InplaceDestination};
pub use algebra::CombineOp;
pub use array::{
    Adjoint, ArrayValue, BoolArray, DenseArray, Diagonal, Hermitian, SparseMatrixCsc,
    SparseVector, Symmetric, Transpose, Triangular, Uplo,
};
pub use error::TangentError;
pub use project::{Projectable, Projector, ProjectorKind};
pub use scalar::{c64, Scalar};
pub use tangent::structural::add_to_primal;
pub use tangent::{
    InplaceableThunk, MutableStructuralTangent, NotImplementedInfo, StructuralTangent, Tangent,
    TangentFields, Thunk,
};
