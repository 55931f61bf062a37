//! Tests for in-place accumulation.
//!
//! Mirrors concepts from ChainRulesCore.jl's test/accumulation.jl.
//!
//! # Coverage
//!
//! - Destination eligibility per storage kind
//! - In-place dense addition and the InplaceableThunk fast path
//! - Fallback to out-of-place addition for ineligible destinations
//! - Zero-like and not-implemented gradients

use chainrules_core::{
    add_accumulate, is_inplaceable_destination, not_implemented, ArrayValue, DenseArray,
    Diagonal, InplaceableThunk, Tangent, Thunk,
};

fn dense(v: Vec<f64>) -> Tangent<f64> {
    DenseArray::from_vec(v.clone(), &[v.len()]).unwrap().into()
}

#[test]
fn test_eligibility() {
    assert!(is_inplaceable_destination(&dense(vec![1.0])));
    let diag: Tangent<f64> = Diagonal::new(vec![1.0]).into();
    assert!(!is_inplaceable_destination(&diag));
    assert!(!is_inplaceable_destination(&Tangent::<f64>::Scalar(1.0)));
    assert!(!is_inplaceable_destination(&Tangent::<f64>::Zero));
    let t: Tangent<f64> = Tangent::thunk(|| Ok(Tangent::Zero));
    assert!(!is_inplaceable_destination(&t));
}

#[test]
fn test_dense_plus_dense_accumulates() {
    let out = add_accumulate(dense(vec![1.0, 2.0, 3.0]), dense(vec![1.0, 1.0, 1.0])).unwrap();
    assert_eq!(out, dense(vec![2.0, 3.0, 4.0]));
}

#[test]
fn test_inplaceable_thunk_uses_in_place_function() {
    let it: Tangent<f64> = Tangent::InplaceableThunk(InplaceableThunk::new(
        Thunk::new(|| panic!("plain value must not be forced on the in-place path")),
        |dest| {
            if let ArrayValue::Dense(d) = dest {
                for x in d.data_mut() {
                    *x *= 2.0;
                }
            }
            Ok(())
        },
    ));
    let out = add_accumulate(dense(vec![1.0, 3.0]), it).unwrap();
    assert_eq!(out, dense(vec![2.0, 6.0]));
}

#[test]
fn test_inplaceable_thunk_falls_back_out_of_place() {
    let it: Tangent<f64> = Tangent::InplaceableThunk(InplaceableThunk::new(
        Thunk::new(|| Ok(Tangent::Scalar(2.0))),
        |_| panic!("in-place path must not run for an ineligible destination"),
    ));
    let out = add_accumulate(Tangent::Scalar(1.0), it).unwrap();
    assert_eq!(out, Tangent::Scalar(3.0));
}

#[test]
fn test_plain_thunk_gradient_is_forced() {
    let t: Tangent<f64> = Tangent::thunk(|| Ok(dense(vec![10.0, 20.0])));
    let out = add_accumulate(dense(vec![1.0, 2.0]), t).unwrap();
    assert_eq!(out, dense(vec![11.0, 22.0]));
}

#[test]
fn test_zero_like_gradients_leave_destination_unchanged() {
    let out = add_accumulate(dense(vec![1.0]), Tangent::Zero).unwrap();
    assert_eq!(out, dense(vec![1.0]));
    let out = add_accumulate(dense(vec![1.0]), Tangent::NoTangent).unwrap();
    assert_eq!(out, dense(vec![1.0]));
}

#[test]
fn test_not_implemented_gradient_wins() {
    let out = add_accumulate(dense(vec![1.0]), not_implemented!("missing")).unwrap();
    assert!(matches!(out, Tangent::NotImplemented(_)));
}

#[test]
fn test_structured_destination_stays_structured() {
    let d: Tangent<f64> = Diagonal::new(vec![1.0, 2.0]).into();
    let g: Tangent<f64> = Diagonal::new(vec![1.0, 1.0]).into();
    let expected: Tangent<f64> = Diagonal::new(vec![2.0, 3.0]).into();
    assert_eq!(add_accumulate(d, g).unwrap(), expected);
}
