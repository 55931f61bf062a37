//! Deferred tangent computations.
//!
//! Mirrors ChainRulesCore.jl's `Thunk` and `InplaceableThunk`. A propagator
//! frequently returns several candidate derivatives of which only one will
//! ever be read; wrapping the expensive ones in a thunk lets addition or
//! multiplication against a zero short-circuit before the computation runs.
//!
//! Thunks are **not memoized**: every [`Thunk::force`] call re-invokes the
//! closure, so callers who need the value more than once must cache it
//! themselves. Closures may legitimately observe external state between
//! calls; repeatedly forcing a closure with side effects is unsupported.

use std::fmt;
use std::rc::Rc;

use crate::array::ArrayValue;
use crate::error::TangentError;
use crate::scalar::Scalar;
use crate::tangent::Tangent;

type ThunkFn<T> = dyn Fn() -> Result<Tangent<T>, TangentError>;
type InplaceFn<T> = dyn Fn(&mut ArrayValue<T>) -> Result<(), TangentError>;

/// A wrapped, not-yet-evaluated tangent computation.
pub struct Thunk<T: Scalar> {
    f: Rc<ThunkFn<T>>,
}

impl<T: Scalar> Thunk<T> {
    /// Wrap a zero-argument computation. The closure does not run here.
    ///
    /// # Example
    ///
    /// ```
    /// use chainrules_core::{Tangent, Thunk};
    ///
    /// // Constructing never runs the closure, even a failing one.
    /// let t: Thunk<f64> = Thunk::new(|| {
    ///     Err(chainrules_core::TangentError::MutateBeforeForcing)
    /// });
    /// assert!(t.force().is_err());
    /// ```
    pub fn new(f: impl Fn() -> Result<Tangent<T>, TangentError> + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    /// Run the deferred computation. Re-invokes the closure on every call.
    pub fn force(&self) -> Result<Tangent<T>, TangentError> {
        (self.f)()
    }
}

impl<T: Scalar> Clone for Thunk<T> {
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<T: Scalar> fmt::Debug for Thunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").finish_non_exhaustive()
    }
}

/// A thunk carrying an alternate in-place accumulation function.
///
/// The accumulator prefers the in-place path only when the destination is
/// a verified mutable buffer (see [`crate::accumulate`]); everything else
/// falls back to forcing the plain value.
pub struct InplaceableThunk<T: Scalar> {
    val: Thunk<T>,
    add_into: Rc<InplaceFn<T>>,
}

impl<T: Scalar> InplaceableThunk<T> {
    /// Pair a deferred value with its in-place accumulation function.
    ///
    /// `add_into` must add the same tangent that forcing `val` would
    /// produce into the destination buffer.
    pub fn new(
        val: Thunk<T>,
        add_into: impl Fn(&mut ArrayValue<T>) -> Result<(), TangentError> + 'static,
    ) -> Self {
        Self {
            val,
            add_into: Rc::new(add_into),
        }
    }

    /// The deferred value, usable wherever a plain thunk is.
    #[inline]
    pub fn val(&self) -> &Thunk<T> {
        &self.val
    }

    /// Force the deferred value (out-of-place path).
    pub fn force(&self) -> Result<Tangent<T>, TangentError> {
        self.val.force()
    }

    /// Accumulate into `dest` in place.
    ///
    /// Callers must hold exclusive write access to `dest` for the duration
    /// of the call; taking it `&mut` is that contract.
    pub fn add_into(&self, dest: &mut ArrayValue<T>) -> Result<(), TangentError> {
        (self.add_into)(dest)
    }
}

impl<T: Scalar> Clone for InplaceableThunk<T> {
    fn clone(&self) -> Self {
        Self {
            val: self.val.clone(),
            add_into: Rc::clone(&self.add_into),
        }
    }
}

impl<T: Scalar> fmt::Debug for InplaceableThunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InplaceableThunk").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DenseArray;
    use std::cell::Cell;

    #[test]
    fn test_construction_is_lazy() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let t: Thunk<f64> = Thunk::new(move || {
            flag.set(true);
            Ok(Tangent::Scalar(1.0))
        });
        assert!(!ran.get());
        assert_eq!(t.force().unwrap(), Tangent::Scalar(1.0));
        assert!(ran.get());
    }

    #[test]
    fn test_force_recomputes_every_call() {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let t: Thunk<f64> = Thunk::new(move || {
            c.set(c.get() + 1);
            Ok(Tangent::Scalar(c.get() as f64))
        });
        assert_eq!(t.force().unwrap(), Tangent::Scalar(1.0));
        assert_eq!(t.force().unwrap(), Tangent::Scalar(2.0));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_inplaceable_add_into() {
        let it: InplaceableThunk<f64> = InplaceableThunk::new(
            Thunk::new(|| {
                Ok(Tangent::Array(ArrayValue::Dense(
                    DenseArray::from_vec(vec![1.0, 1.0], &[2]).unwrap(),
                )))
            }),
            |dest| {
                if let ArrayValue::Dense(d) = dest {
                    for x in d.data_mut() {
                        *x += 1.0;
                    }
                }
                Ok(())
            },
        );
        let mut buf = ArrayValue::Dense(DenseArray::from_vec(vec![10.0, 20.0], &[2]).unwrap());
        it.add_into(&mut buf).unwrap();
        match buf {
            ArrayValue::Dense(d) => assert_eq!(d.data(), &[11.0, 21.0]),
            _ => unreachable!(),
        }
    }
}
