//! The tangent combination lattice.
//!
//! Every binary operation over the tangent kinds lives here, as one
//! exhaustive match per operation, so the precedence lattice
//!
//! ```text
//! NotImplemented > NoTangent > Zero > Thunk > Structural > concrete
//! ```
//!
//! is total and auditable in one place. For each adjacent pair the
//! higher-precedence kind's arm handles the combination (a thunk meeting a
//! structural tangent forces then adds; a zero meeting a thunk passes the
//! thunk through unforced).

use crate::error::TangentError;
use crate::scalar::Scalar;
use crate::tangent::not_implemented::NotImplementedInfo;
use crate::tangent::thunk::Thunk;
use crate::tangent::Tangent;

/// Which binary combination to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineOp {
    Add,
    Mul,
    Dot,
}

/// Combine two tangents under `op`. Total over every ordered kind pair.
pub fn combine<T: Scalar>(
    op: CombineOp,
    a: Tangent<T>,
    b: Tangent<T>,
) -> Result<Tangent<T>, TangentError> {
    match op {
        CombineOp::Add => add(a, b),
        CombineOp::Mul => mul(a, b),
        CombineOp::Dot => dot(a, b),
    }
}

fn undefined<T: Scalar>(op: &'static str, a: &Tangent<T>, b: &Tangent<T>) -> TangentError {
    TangentError::UndefinedOperation {
        op,
        lhs: a.kind_name(),
        rhs: b.kind_name(),
    }
}

fn evaluated(info: NotImplementedInfo) -> TangentError {
    TangentError::NotImplementedEvaluated {
        module: info.module(),
        source: info.source(),
        info: info.info().to_string(),
    }
}

/// Tangent addition.
pub fn add<T: Scalar>(a: Tangent<T>, b: Tangent<T>) -> Result<Tangent<T>, TangentError> {
    use Tangent::*;
    match (a, b) {
        // NotImplemented wins addition against everything, zero-likes
        // included: an unimplemented-but-unused term must not poison a
        // result that never needed it.
        (NotImplemented(i), _) | (_, NotImplemented(i)) => Ok(NotImplemented(i)),
        // NoTangent wins against the numeric zero.
        (NoTangent, NoTangent) | (NoTangent, Zero) | (Zero, NoTangent) => Ok(NoTangent),
        // Zero-likes are additive identities; a thunk passes through
        // unforced here, which is the whole point of deferring.
        (Zero, x) | (x, Zero) => Ok(x),
        (NoTangent, x) | (x, NoTangent) => Ok(x),
        (Thunk(t), y) => add(t.force()?, y),
        (x, Thunk(t)) => add(x, t.force()?),
        (InplaceableThunk(t), y) => add(t.force()?, y),
        (x, InplaceableThunk(t)) => add(x, t.force()?),
        (Structural(x), Structural(y)) => Ok(Structural(x.add(y)?)),
        (Scalar(x), Scalar(y)) => Ok(Scalar(x + y)),
        (Array(x), Array(y)) => Ok(Array(x.add(y)?)),
        (a, b) => Err(undefined("+", &a, &b)),
    }
}

/// Tangent multiplication.
///
/// Only scalar factors multiply natively; tangent × tangent over arrays or
/// structural tangents is not generally meaningful and errors.
pub fn mul<T: Scalar>(a: Tangent<T>, b: Tangent<T>) -> Result<Tangent<T>, TangentError> {
    use Tangent::*;
    match (a, b) {
        // The numeric zero wins multiplication against everything,
        // NoTangent and NotImplemented included: `*` is what lets a rule
        // select whether a term contributes at all.
        (Zero, _) | (_, Zero) => Ok(Zero),
        (NotImplemented(i), _) | (_, NotImplemented(i)) => Ok(NotImplemented(i)),
        (NoTangent, _) | (_, NoTangent) => Ok(NoTangent),
        (Thunk(t), y) => mul(t.force()?, y),
        (x, Thunk(t)) => mul(x, t.force()?),
        (InplaceableThunk(t), y) => mul(t.force()?, y),
        (x, InplaceableThunk(t)) => mul(x, t.force()?),
        (Scalar(s), y) | (y, Scalar(s)) => scale(y, s),
        (a, b) => Err(undefined("*", &a, &b)),
    }
}

/// Scale a tangent by a scalar factor.
///
/// Distributes lazily over thunks (the result is a new thunk) and maps
/// over structural fields.
pub fn scale<T: Scalar>(t: Tangent<T>, s: T) -> Result<Tangent<T>, TangentError> {
    match t {
        Tangent::Zero => Ok(Tangent::Zero),
        Tangent::NoTangent => Ok(Tangent::NoTangent),
        // Scaling passes a not-implemented term through unevaluated.
        Tangent::NotImplemented(i) => Ok(Tangent::NotImplemented(i)),
        Tangent::Thunk(t) => Ok(Tangent::Thunk(Thunk::new(move || scale(t.force()?, s)))),
        Tangent::InplaceableThunk(it) => {
            let t = it.val().clone();
            Ok(Tangent::Thunk(Thunk::new(move || scale(t.force()?, s))))
        }
        Tangent::Structural(st) => Ok(Tangent::Structural(st.scale(s)?)),
        Tangent::Scalar(x) => Ok(Tangent::Scalar(x * s)),
        Tangent::Array(a) => Ok(Tangent::Array(a.scale(s))),
    }
}

/// Conjugating inner product of two tangents.
///
/// Zero-likes short-circuit to zero; a surviving `NotImplemented` raises,
/// because an inner product genuinely evaluates its operands.
pub fn dot<T: Scalar>(a: Tangent<T>, b: Tangent<T>) -> Result<Tangent<T>, TangentError> {
    use Tangent::*;
    match (a, b) {
        (Zero, _) | (_, Zero) => Ok(Zero),
        (NoTangent, _) | (_, NoTangent) => Ok(Zero),
        (NotImplemented(i), _) | (_, NotImplemented(i)) => Err(evaluated(i)),
        (Thunk(t), y) => dot(t.force()?, y),
        (x, Thunk(t)) => dot(x, t.force()?),
        (InplaceableThunk(t), y) => dot(t.force()?, y),
        (x, InplaceableThunk(t)) => dot(x, t.force()?),
        (Scalar(x), Scalar(y)) => Ok(Scalar(x.conjugate() * y)),
        (Array(x), Array(y)) => Ok(Scalar(x.dot(&y)?)),
        (a, b) => Err(undefined("dot", &a, &b)),
    }
}

/// Negate a tangent.
///
/// Negation is a form of subtraction, so a `NotImplemented` raises here.
pub fn neg<T: Scalar>(t: Tangent<T>) -> Result<Tangent<T>, TangentError> {
    match t {
        Tangent::NotImplemented(i) => Err(evaluated(i)),
        Tangent::Thunk(t) => Ok(Tangent::Thunk(Thunk::new(move || neg(t.force()?)))),
        Tangent::InplaceableThunk(it) => {
            let t = it.val().clone();
            Ok(Tangent::Thunk(Thunk::new(move || neg(t.force()?))))
        }
        other => scale(other, -T::one()),
    }
}

/// Tangent subtraction.
///
/// Subtracting genuinely evaluates both sides; a `NotImplemented` on
/// either side raises rather than passing through.
pub fn sub<T: Scalar>(a: Tangent<T>, b: Tangent<T>) -> Result<Tangent<T>, TangentError> {
    match (a, b) {
        (Tangent::NotImplemented(i), _) | (_, Tangent::NotImplemented(i)) => Err(evaluated(i)),
        (a, b) => add(a, neg(b)?),
    }
}

/// Fused multiply-add `a * b + c`.
///
/// Zero-like factor combinations skip the product entirely, so no
/// intermediate value is allocated (and no thunk is forced) when the
/// product cannot contribute.
pub fn muladd<T: Scalar>(
    a: Tangent<T>,
    b: Tangent<T>,
    c: Tangent<T>,
) -> Result<Tangent<T>, TangentError> {
    match (&a, &b) {
        (Tangent::Zero, _) | (_, Tangent::Zero) => Ok(c),
        _ => {
            let p = mul(a, b)?;
            add(p, c)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{ArrayValue, DenseArray};
    use std::cell::Cell;
    use std::rc::Rc;

    fn ni() -> Tangent<f64> {
        crate::not_implemented!("test rule")
    }

    #[test]
    fn test_zero_is_additive_identity() {
        for x in [
            Tangent::Scalar(2.0),
            Tangent::NoTangent,
            Tangent::Zero,
            Tangent::Array(ArrayValue::Dense(
                DenseArray::from_vec(vec![1.0], &[1]).unwrap(),
            )),
        ] {
            assert_eq!(add(Tangent::Zero, x.clone()).unwrap(), {
                // NoTangent wins against Zero.
                if x == Tangent::NoTangent {
                    Tangent::NoTangent
                } else {
                    x.clone()
                }
            });
            assert_eq!(add(x.clone(), Tangent::Zero).unwrap(), {
                if x == Tangent::NoTangent {
                    Tangent::NoTangent
                } else {
                    x
                }
            });
        }
    }

    #[test]
    fn test_absorption() {
        // ZeroTangent * x == ZeroTangent
        assert_eq!(
            mul(Tangent::Zero, Tangent::<f64>::Scalar(3.0)).unwrap(),
            Tangent::Zero
        );
        // NoTangent + ZeroTangent == NoTangent
        assert_eq!(
            add(Tangent::<f64>::NoTangent, Tangent::Zero).unwrap(),
            Tangent::NoTangent
        );
        // NoTangent * ZeroTangent == ZeroTangent
        assert_eq!(
            mul(Tangent::<f64>::NoTangent, Tangent::Zero).unwrap(),
            Tangent::Zero
        );
    }

    #[test]
    fn test_not_implemented_wins_addition() {
        assert!(matches!(
            add(ni(), Tangent::Scalar(1.0)).unwrap(),
            Tangent::NotImplemented(_)
        ));
        assert!(matches!(
            add(Tangent::Zero, ni()).unwrap(),
            Tangent::NotImplemented(_)
        ));
        // but Zero wins multiplication against it
        assert_eq!(mul(ni(), Tangent::Zero).unwrap(), Tangent::Zero);
    }

    #[test]
    fn test_not_implemented_raises_on_sub_and_dot() {
        assert!(matches!(
            sub(ni(), Tangent::Scalar(1.0)),
            Err(TangentError::NotImplementedEvaluated { .. })
        ));
        assert!(matches!(
            dot(ni(), Tangent::Scalar(1.0)),
            Err(TangentError::NotImplementedEvaluated { .. })
        ));
        // zero-likes still short-circuit dot before evaluation
        assert_eq!(dot(Tangent::Zero, ni()).unwrap(), Tangent::Zero);
    }

    #[test]
    fn test_zero_plus_thunk_stays_unforced() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let t: Tangent<f64> = Tangent::thunk(move || {
            c.set(c.get() + 1);
            Ok(Tangent::Scalar(5.0))
        });
        let out = add(Tangent::Zero, t).unwrap();
        assert_eq!(count.get(), 0);
        assert_eq!(out.unthunk().unwrap(), Tangent::Scalar(5.0));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_thunk_plus_thunk_forces_both() {
        let a: Tangent<f64> = Tangent::thunk(|| Ok(Tangent::Scalar(2.0)));
        let b: Tangent<f64> = Tangent::thunk(|| Ok(Tangent::Scalar(3.0)));
        assert_eq!(add(a, b).unwrap(), Tangent::Scalar(5.0));
    }

    #[test]
    fn test_scale_is_lazy_over_thunks() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let t: Tangent<f64> = Tangent::thunk(move || {
            c.set(c.get() + 1);
            Ok(Tangent::Scalar(2.0))
        });
        let scaled = scale(t, 3.0).unwrap();
        assert_eq!(count.get(), 0);
        assert_eq!(scaled.unthunk().unwrap(), Tangent::Scalar(6.0));
    }

    #[test]
    fn test_array_times_array_is_undefined() {
        let a: Tangent<f64> = DenseArray::from_vec(vec![1.0], &[1]).unwrap().into();
        let b: Tangent<f64> = DenseArray::from_vec(vec![2.0], &[1]).unwrap().into();
        assert!(matches!(
            mul(a, b),
            Err(TangentError::UndefinedOperation { op: "*", .. })
        ));
    }

    #[test]
    fn test_scalar_times_array_scales() {
        let a: Tangent<f64> = DenseArray::from_vec(vec![1.0, 2.0], &[2]).unwrap().into();
        let out = mul(Tangent::Scalar(3.0), a).unwrap();
        let expected: Tangent<f64> = DenseArray::from_vec(vec![3.0, 6.0], &[2]).unwrap().into();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_muladd_skips_product_on_zero_factor() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let expensive: Tangent<f64> = Tangent::thunk(move || {
            c.set(c.get() + 1);
            Ok(Tangent::Scalar(99.0))
        });
        let out = muladd(Tangent::Zero, expensive, Tangent::Scalar(7.0)).unwrap();
        assert_eq!(out, Tangent::Scalar(7.0));
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_muladd_general() {
        let out = muladd(
            Tangent::Scalar(2.0),
            Tangent::Scalar(3.0),
            Tangent::Scalar(4.0),
        )
        .unwrap();
        assert_eq!(out, Tangent::Scalar(10.0));
        // NoTangent factor kills the product, the addend survives.
        let out = muladd(
            Tangent::<f64>::NoTangent,
            Tangent::Scalar(3.0),
            Tangent::Scalar(4.0),
        )
        .unwrap();
        assert_eq!(out, Tangent::Scalar(4.0));
    }

    #[test]
    fn test_combine_dispatch() {
        assert_eq!(
            combine(CombineOp::Add, Tangent::Scalar(1.0), Tangent::Scalar(2.0)).unwrap(),
            Tangent::Scalar(3.0)
        );
        assert_eq!(
            combine(CombineOp::Mul, Tangent::Scalar(2.0), Tangent::Scalar(3.0)).unwrap(),
            Tangent::Scalar(6.0)
        );
        assert_eq!(
            combine(CombineOp::Dot, Tangent::Scalar(2.0), Tangent::Scalar(3.0)).unwrap(),
            Tangent::Scalar(6.0)
        );
    }

    #[test]
    fn test_dot_conjugates() {
        use crate::scalar::c64;
        let i = Tangent::Scalar(c64::new(0.0, 1.0));
        assert_eq!(
            dot(i.clone(), i).unwrap(),
            Tangent::Scalar(c64::new(1.0, 0.0))
        );
    }

    #[test]
    fn test_sub() {
        assert_eq!(
            sub(Tangent::Scalar(5.0), Tangent::Scalar(3.0)).unwrap(),
            Tangent::Scalar(2.0)
        );
        assert_eq!(
            sub(Tangent::<f64>::Scalar(5.0), Tangent::Zero).unwrap(),
            Tangent::Scalar(5.0)
        );
    }
}
