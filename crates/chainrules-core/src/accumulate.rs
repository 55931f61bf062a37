//! In-place tangent accumulation.
//!
//! Mirrors ChainRulesCore.jl's `add!!` / `is_inplaceable_destination`. The
//! aliasing contract is ownership: [`add_accumulate`] takes the destination
//! by value, so the caller's exclusive, uncontended write access for the
//! duration of the call is established statically rather than checked at
//! runtime. Anything that is not a verified plain mutable buffer takes the
//! safe out-of-place path.

use crate::algebra;
use crate::array::{ArrayValue, DenseArray};
use crate::error::TangentError;
use crate::scalar::Scalar;
use crate::tangent::Tangent;

/// Whether a value is a genuinely owned, mutation-safe accumulation buffer.
///
/// Implemented per concrete storage type so the surrounding ecosystem can
/// opt new container types into the in-place path. The default answer is
/// no: when in doubt, accumulation falls back to out-of-place addition.
pub trait InplaceDestination {
    /// `true` only for plain contiguous mutable buffers.
    fn is_inplaceable_destination(&self) -> bool {
        false
    }
}

impl<T: Scalar> InplaceDestination for DenseArray<T> {
    fn is_inplaceable_destination(&self) -> bool {
        true
    }
}

impl<T: Scalar> InplaceDestination for ArrayValue<T> {
    fn is_inplaceable_destination(&self) -> bool {
        // Structured and sparse wrappers expose only part of their logical
        // entries; writing a general tangent into them in place could
        // escape their subspace.
        matches!(self, ArrayValue::Dense(_))
    }
}

impl<T: Scalar> InplaceDestination for Tangent<T> {
    fn is_inplaceable_destination(&self) -> bool {
        match self {
            Tangent::Array(a) => a.is_inplaceable_destination(),
            _ => false,
        }
    }
}

/// Whether `x` may be accumulated into in place.
pub fn is_inplaceable_destination<D: InplaceDestination>(x: &D) -> bool {
    x.is_inplaceable_destination()
}

/// Accumulate `x` into `dest`, in place when `dest` is a verified mutable
/// buffer, out of place otherwise. Returns the updated destination.
///
/// An [`crate::InplaceableThunk`] is only given the in-place path when the
/// destination qualifies; otherwise its plain deferred value is forced and
/// added like any other tangent.
pub fn add_accumulate<T: Scalar>(
    dest: Tangent<T>,
    x: Tangent<T>,
) -> Result<Tangent<T>, TangentError> {
    match dest {
        Tangent::Array(arr) if arr.is_inplaceable_destination() => accumulate_into(arr, x),
        dest => algebra::add(dest, x),
    }
}

fn accumulate_into<T: Scalar>(
    mut arr: ArrayValue<T>,
    x: Tangent<T>,
) -> Result<Tangent<T>, TangentError> {
    match x {
        Tangent::Zero | Tangent::NoTangent => Ok(Tangent::Array(arr)),
        Tangent::NotImplemented(i) => Ok(Tangent::NotImplemented(i)),
        Tangent::InplaceableThunk(it) => {
            it.add_into(&mut arr)?;
            Ok(Tangent::Array(arr))
        }
        Tangent::Thunk(t) => accumulate_into(arr, t.force()?),
        Tangent::Array(b) => {
            if let (ArrayValue::Dense(da), ArrayValue::Dense(db)) = (&mut arr, &b) {
                if da.shape() == db.shape() {
                    da.add_assign(db)?;
                    return Ok(Tangent::Array(arr));
                }
            }
            Ok(Tangent::Array(arr.add(b)?))
        }
        other => algebra::add(Tangent::Array(arr), other),
    }
}
