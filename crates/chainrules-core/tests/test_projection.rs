//! Tests for projecting gradient candidates onto primal subspaces.
//!
//! Mirrors concepts from ChainRulesCore.jl's test/projection.jl.
//!
//! # Coverage
//!
//! - Dense projection: exact shapes, trailing-singleton tolerance, realness
//! - Structure restoration: diagonal, symmetric, Hermitian, triangular
//! - Sparse projection reads only the stored pattern
//! - Transpose/adjoint primals: flip, project, flip back
//! - Idempotence, zero-like and deferred candidates

use approx::assert_relative_eq;
use chainrules_core::{
    c64, not_implemented, ArrayValue, BoolArray, DenseArray, Diagonal, Hermitian, Projectable,
    Projector, SparseMatrixCsc, SparseVector, Symmetric, Tangent, TangentError, Transpose,
    Triangular, Uplo,
};
use std::cell::Cell;
use std::rc::Rc;

fn matrix(data: Vec<f64>, n: usize) -> DenseArray<f64> {
    DenseArray::from_vec(data, &[n, n]).unwrap()
}

#[test]
fn test_dense_exact_shape_passes() {
    let primal: DenseArray<f64> = DenseArray::zeros(&[2, 3]);
    let p = primal.projector();
    let g: Tangent<f64> = DenseArray::from_vec(vec![1.0; 6], &[2, 3]).unwrap().into();
    assert_eq!(p.project(g.clone()).unwrap(), g);
}

#[test]
fn test_trailing_singleton_axis_is_tolerated() {
    let primal: DenseArray<f64> = DenseArray::zeros(&[4]);
    let p = primal.projector();

    // A column vector (4, 1) is the same data with a trailing axis.
    let col: Tangent<f64> =
        DenseArray::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[4, 1]).unwrap().into();
    let out = p.project(col).unwrap().try_into_array().unwrap();
    assert_eq!(out.shape(), vec![4]);

    // A row vector (1, 4) transposes the data and is rejected.
    let row: Tangent<f64> =
        DenseArray::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 4]).unwrap().into();
    match p.project(row) {
        Err(TangentError::DimensionMismatch { expected, actual }) => {
            assert_eq!(expected, vec![4]);
            assert_eq!(actual, vec![1, 4]);
        }
        other => panic!("expected a dimension mismatch, got {:?}", other),
    }
}

#[test]
fn test_diagonal_restores_from_dense_candidate() {
    let primal = Diagonal::new(vec![0.0; 3]);
    let p = primal.projector();
    // Columns [1,2,3], [4,5,6], [7,8,9]; the diagonal is 1, 5, 9.
    let g: Tangent<f64> = matrix(
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
        3,
    )
    .into();
    let out = p.project(g).unwrap();
    let expected: Tangent<f64> = Diagonal::new(vec![1.0, 5.0, 9.0]).into();
    assert_eq!(out, expected);
}

#[test]
fn test_symmetric_restores_from_dense_candidate() {
    let primal = Symmetric::new(DenseArray::zeros(&[2, 2]), Uplo::Upper).unwrap();
    let p = primal.projector();
    // Columns [1,3] and [2,4]: matrix [[1,2],[3,4]].
    let g: Tangent<f64> = matrix(vec![1.0, 3.0, 2.0, 4.0], 2).into();
    let out = p.project(g).unwrap().try_into_array().unwrap();
    let d = out.to_dense();
    assert_relative_eq!(d.at2(0, 0), 1.0);
    assert_relative_eq!(d.at2(0, 1), 2.5);
    assert_relative_eq!(d.at2(1, 0), 2.5);
    assert_relative_eq!(d.at2(1, 1), 4.0);
}

#[test]
fn test_hermitian_restores_conjugate_symmetry() {
    let primal = Hermitian::new(DenseArray::<c64>::zeros(&[2, 2]), Uplo::Upper).unwrap();
    let p = primal.projector();
    let g: Tangent<c64> = DenseArray::from_vec(
        vec![
            c64::new(1.0, 5.0),
            c64::new(2.0, 2.0),
            c64::new(4.0, 0.0),
            c64::new(3.0, -5.0),
        ],
        &[2, 2],
    )
    .unwrap()
    .into();
    let d = p.project(g).unwrap().try_into_array().unwrap().to_dense();
    assert_eq!(d.at2(0, 0).im, 0.0);
    assert_eq!(d.at2(1, 1).im, 0.0);
    assert_eq!(d.at2(1, 0), chainrules_core::Scalar::conjugate(d.at2(0, 1)));
}

#[test]
fn test_triangular_masks_opposite_triangle() {
    let primal = Triangular::new(DenseArray::zeros(&[2, 2]), Uplo::Upper).unwrap();
    let p = primal.projector();
    let g: Tangent<f64> = matrix(vec![1.0, 2.0, 3.0, 4.0], 2).into();
    let d = p.project(g).unwrap().try_into_array().unwrap().to_dense();
    assert_eq!(d.at2(1, 0), 0.0);
    assert_eq!(d.at2(0, 1), 3.0);
    assert_eq!(d.at2(1, 1), 4.0);
}

#[test]
fn test_sparse_vector_projection_reads_stored_indices_only() {
    let primal = SparseVector::new(5, vec![0, 2, 4], vec![0.0; 3]).unwrap();
    let p = primal.projector();
    let g: Tangent<f64> = DenseArray::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0], &[5])
        .unwrap()
        .into();
    match p.project(g).unwrap().try_into_array().unwrap() {
        ArrayValue::SparseVector(v) => {
            assert_eq!(v.indices(), &[0, 2, 4]);
            assert_eq!(v.values(), &[1.0, 3.0, 5.0]);
        }
        other => panic!("expected sparse vector, got {}", other.kind_name()),
    }
}

#[test]
fn test_sparse_matrix_projection_keeps_pattern() {
    // 2x2 with stored entries (1,0) and (0,1).
    let primal = SparseMatrixCsc::new(2, 2, vec![0, 1, 2], vec![1, 0], vec![0.0, 0.0]).unwrap();
    let p = primal.projector();
    let g: Tangent<f64> = matrix(vec![1.0, 2.0, 3.0, 4.0], 2).into();
    match p.project(g).unwrap().try_into_array().unwrap() {
        ArrayValue::SparseCsc(m) => {
            assert_eq!(m.rowval(), &[1, 0]);
            assert_eq!(m.nzval(), &[2.0, 3.0]);
        }
        other => panic!("expected sparse matrix, got {}", other.kind_name()),
    }
}

#[test]
fn test_transpose_primal_round_trips_candidates() {
    let primal = Transpose::new(DenseArray::<f64>::zeros(&[2, 3])).unwrap();
    let p = primal.projector();
    let g: Tangent<f64> =
        DenseArray::from_vec((1..=6).map(f64::from).collect(), &[3, 2]).unwrap().into();
    let d = p.project(g.clone()).unwrap().try_into_array().unwrap().to_dense();
    // Projecting through a dense parent changes nothing but validates.
    assert_eq!(Tangent::from(d), g);
}

#[test]
fn test_bool_primals_have_no_tangent_space() {
    let flags = BoolArray::from_vec(vec![true, false], &[2]).unwrap();
    let p: Projector<f64> = flags.projector();
    let g: Tangent<f64> = DenseArray::from_vec(vec![1.0, 2.0], &[2]).unwrap().into();
    assert_eq!(p.project(g).unwrap(), Tangent::NoTangent);
    assert_eq!(p.project(Tangent::Zero).unwrap(), Tangent::NoTangent);

    let p: Projector<f64> = 7i64.projector();
    assert_eq!(p.project(Tangent::Scalar(1.0)).unwrap(), Tangent::NoTangent);
}

#[test]
fn test_real_scalar_narrows_complex_candidate() {
    let p: Projector<c64> = 2.0f64.projector();
    assert_eq!(
        p.project(Tangent::Scalar(c64::new(3.0, 4.0))).unwrap(),
        Tangent::Scalar(c64::new(3.0, 0.0))
    );
}

#[test]
fn test_zero_likes_pass_through() {
    let p = Diagonal::new(vec![0.0; 2]).projector();
    assert_eq!(p.project(Tangent::Zero).unwrap(), Tangent::Zero);
    assert_eq!(p.project(Tangent::NoTangent).unwrap(), Tangent::NoTangent);
}

#[test]
fn test_not_implemented_passes_through() {
    let p = Diagonal::new(vec![0.0; 2]).projector();
    let out = p.project(not_implemented!("missing")).unwrap();
    assert!(matches!(out, Tangent::NotImplemented(_)));
}

#[test]
fn test_projection_stays_deferred() {
    let primal = Diagonal::new(vec![0.0; 2]);
    let p = primal.projector();
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    let g: Tangent<f64> = Tangent::thunk(move || {
        c.set(c.get() + 1);
        Ok(matrix(vec![1.0, 2.0, 3.0, 4.0], 2).into())
    });
    let projected = p.project(g).unwrap();
    assert_eq!(count.get(), 0);
    let expected: Tangent<f64> = Diagonal::new(vec![1.0, 4.0]).into();
    assert_eq!(projected.unthunk().unwrap(), expected);
    assert_eq!(count.get(), 1);
}

#[test]
fn test_errors_inside_deferred_projection_surface_on_forcing() {
    let primal: DenseArray<f64> = DenseArray::zeros(&[3]);
    let p = primal.projector();
    let g: Tangent<f64> = Tangent::thunk(|| {
        Ok(DenseArray::from_vec(vec![1.0, 2.0], &[2]).unwrap().into())
    });
    let projected = p.project(g).unwrap();
    assert!(matches!(
        projected.unthunk(),
        Err(TangentError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_projection_is_idempotent_across_kinds() {
    let candidates: Vec<(Projector<f64>, Tangent<f64>)> = vec![
        (
            Diagonal::new(vec![0.0; 2]).projector(),
            matrix(vec![1.0, 2.0, 3.0, 4.0], 2).into(),
        ),
        (
            Symmetric::new(DenseArray::zeros(&[2, 2]), Uplo::Lower)
                .unwrap()
                .projector(),
            matrix(vec![1.0, 2.0, 3.0, 4.0], 2).into(),
        ),
        (
            Triangular::new(DenseArray::zeros(&[2, 2]), Uplo::Lower)
                .unwrap()
                .projector(),
            matrix(vec![1.0, 2.0, 3.0, 4.0], 2).into(),
        ),
        (
            SparseVector::new(3, vec![1], vec![0.0]).unwrap().projector(),
            DenseArray::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap().into(),
        ),
    ];
    for (p, g) in candidates {
        let once = p.project(g).unwrap();
        let twice = p.project(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_scalar_projector_extracts_single_element_arrays() {
    let p: Projector<f64> = 0.0f64.projector();
    let g: Tangent<f64> = DenseArray::from_vec(vec![6.0], &[1, 1]).unwrap().into();
    assert_eq!(p.project(g).unwrap(), Tangent::Scalar(6.0));

    let g: Tangent<f64> = DenseArray::from_vec(vec![1.0, 2.0], &[2]).unwrap().into();
    assert!(matches!(
        p.project(g),
        Err(TangentError::DimensionMismatch { .. })
    ));
}
