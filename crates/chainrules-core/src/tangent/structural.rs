//! Structural tangents for aggregate primals.
//!
//! Mirrors ChainRulesCore.jl's `Tangent{P}`: the tangent of a record-like
//! value is a sparse field-name → tangent mapping. Fields absent from the
//! mapping are implicit zeros. Reflection over a primal's fields is an
//! explicit per-type trait implementation ([`TangentFields`]) rather than
//! runtime reflection.

use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

use crate::algebra;
use crate::error::TangentError;
use crate::project::Projector;
use crate::scalar::Scalar;
use crate::tangent::Tangent;

// `Vec` rather than `SmallVec`: inline storage would embed `Tangent<T>`
// directly inside `StructuralTangent<T>`, which `Tangent<T>` itself
// contains, so the heap indirection is required for the types to be sized.
type Entries<T> = Vec<(&'static str, Tangent<T>)>;

/// Per-type structural reflection for aggregate primals.
///
/// One implementation per primal type lists the field names in canonical
/// order, builds one sub-projector per field, and optionally provides the
/// reconstruction hook used when a structural tangent is added back onto
/// a primal instance.
pub trait TangentFields<T: Scalar>: Sized {
    /// Name of the primal type, used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Field names in the primal's canonical order.
    fn field_names() -> &'static [&'static str];

    /// One sub-projector per field, built from this primal instance.
    fn field_projectors(&self) -> Vec<(&'static str, Projector<T>)>;

    /// Rebuild a primal instance from this one plus a structural tangent.
    ///
    /// The default fails with [`TangentError::PrimalReconstructionFailed`],
    /// naming this hook, so that a missing implementation is loud rather
    /// than an opaque type error.
    fn rebuild(&self, _tangent: &StructuralTangent<T>) -> Result<Self, TangentError> {
        Err(TangentError::PrimalReconstructionFailed {
            type_name: Self::TYPE_NAME,
            hook: "TangentFields::rebuild",
        })
    }
}

/// The tangent of an aggregate value, as a sparse field → tangent mapping.
///
/// Fields not present are implicit [`Tangent::Zero`]; the field set is
/// always a subset of the primal's fields.
#[derive(Debug, Clone)]
pub struct StructuralTangent<T: Scalar> {
    type_name: &'static str,
    field_order: &'static [&'static str],
    entries: Entries<T>,
}

impl<T: Scalar> StructuralTangent<T> {
    /// Start an empty structural tangent for primal type `P`.
    pub fn new<P: TangentFields<T>>() -> Self {
        Self {
            type_name: P::TYPE_NAME,
            field_order: P::field_names(),
            entries: Entries::new(),
        }
    }

    pub(crate) fn from_parts(
        type_name: &'static str,
        field_order: &'static [&'static str],
        entries: Vec<(&'static str, Tangent<T>)>,
    ) -> Self {
        Self {
            type_name,
            field_order,
            entries: entries.into_iter().collect(),
        }
    }

    /// Set a field's tangent, builder-style.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a field of the primal type; that is a bug
    /// in the calling rule, not a recoverable condition.
    pub fn with_field(mut self, name: &'static str, tangent: Tangent<T>) -> Self {
        assert!(
            self.field_order.contains(&name),
            "`{}` has no field named `{}`",
            self.type_name,
            name
        );
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = tangent;
        } else {
            self.entries.push((name, tangent));
        }
        self
    }

    /// Name of the primal type this tangent belongs to.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The primal's canonical field order.
    #[inline]
    pub fn field_order(&self) -> &'static [&'static str] {
        self.field_order
    }

    /// The explicitly stored entry for a field, if any.
    pub fn get(&self, name: &str) -> Option<&Tangent<T>> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| t)
    }

    /// The tangent for a field; absent fields are implicit zeros.
    pub fn field(&self, name: &str) -> Tangent<T> {
        self.get(name).cloned().unwrap_or(Tangent::Zero)
    }

    /// Iterate over the explicitly stored entries.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Tangent<T>)> {
        self.entries.iter().map(|(n, t)| (*n, t))
    }

    /// Number of explicitly stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is explicitly stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A copy containing *every* primal field in canonical order, with
    /// absent fields filled by explicit zeros.
    ///
    /// Required before any algorithm that iterates fields positionally
    /// aligned with the primal's own field order, notably projection.
    pub fn canonicalize(&self) -> Self {
        Self {
            type_name: self.type_name,
            field_order: self.field_order,
            entries: self
                .field_order
                .iter()
                .map(|&name| (name, self.field(name)))
                .collect(),
        }
    }

    /// Field-wise merge of two structural tangents of the same primal.
    ///
    /// The result's key set is the union; one-sided fields pass through
    /// unchanged, fields present on both sides add.
    pub fn add(self, other: Self) -> Result<Self, TangentError> {
        if self.type_name != other.type_name {
            return Err(TangentError::UndefinedOperation {
                op: "+",
                lhs: self.type_name,
                rhs: other.type_name,
            });
        }
        let mut entries: Entries<T> = Entries::new();
        for (name, t) in self.entries {
            entries.push((name, t));
        }
        for (name, t) in other.entries {
            if let Some(entry) = entries.iter_mut().find(|(n, _)| *n == name) {
                let existing = std::mem::replace(&mut entry.1, Tangent::Zero);
                entry.1 = algebra::add(existing, t)?;
            } else {
                entries.push((name, t));
            }
        }
        Ok(Self {
            type_name: self.type_name,
            field_order: self.field_order,
            entries,
        })
    }

    /// Scale every stored field.
    pub fn scale(self, s: T) -> Result<Self, TangentError> {
        let mut entries: Entries<T> = Entries::new();
        for (name, t) in self.entries {
            entries.push((name, algebra::scale(t, s)?));
        }
        Ok(Self {
            type_name: self.type_name,
            field_order: self.field_order,
            entries,
        })
    }
}

// Absent fields are implicit zeros, so equality compares field-by-field
// over the union of keys, not entry lists.
impl<T: Scalar> PartialEq for StructuralTangent<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.type_name != other.type_name {
            return false;
        }
        self.field_order
            .iter()
            .all(|&name| self.field(name) == other.field(name))
    }
}

/// Add a structural tangent onto an actual primal instance, rebuilding a
/// new primal field-by-field via [`TangentFields::rebuild`].
pub fn add_to_primal<T: Scalar, P: TangentFields<T>>(
    primal: &P,
    tangent: &StructuralTangent<T>,
) -> Result<P, TangentError> {
    if tangent.type_name() != P::TYPE_NAME {
        return Err(TangentError::UndefinedOperation {
            op: "+",
            lhs: P::TYPE_NAME,
            rhs: tangent.type_name(),
        });
    }
    primal.rebuild(tangent)
}

/// A structural tangent holding mutable cells instead of values.
///
/// For engines that track tangents by mutation. The cells handed out by
/// [`MutableStructuralTangent::cell`] are genuinely aliased (`Rc`-shared),
/// not copied: a write through one handle is visible through every other.
/// The field contracts are the same as the immutable variant's.
#[derive(Debug, Clone)]
pub struct MutableStructuralTangent<T: Scalar> {
    type_name: &'static str,
    field_order: &'static [&'static str],
    cells: SmallVec<[(&'static str, Rc<RefCell<Tangent<T>>>); 4]>,
}

impl<T: Scalar> MutableStructuralTangent<T> {
    /// Start an empty mutable structural tangent for primal type `P`.
    pub fn new<P: TangentFields<T>>() -> Self {
        Self {
            type_name: P::TYPE_NAME,
            field_order: P::field_names(),
            cells: SmallVec::new(),
        }
    }

    /// Name of the primal type this tangent belongs to.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The shared cell for a field, created as zero on first access.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a field of the primal type.
    pub fn cell(&mut self, name: &'static str) -> Rc<RefCell<Tangent<T>>> {
        assert!(
            self.field_order.contains(&name),
            "`{}` has no field named `{}`",
            self.type_name,
            name
        );
        if let Some((_, cell)) = self.cells.iter().find(|(n, _)| *n == name) {
            return Rc::clone(cell);
        }
        let cell = Rc::new(RefCell::new(Tangent::Zero));
        self.cells.push((name, Rc::clone(&cell)));
        cell
    }

    /// Accumulate a tangent into a field, in place.
    pub fn add_into(&mut self, name: &'static str, tangent: Tangent<T>) -> Result<(), TangentError> {
        let cell = self.cell(name);
        let mut slot = cell.borrow_mut();
        let existing = std::mem::replace(&mut *slot, Tangent::Zero);
        *slot = algebra::add(existing, tangent)?;
        Ok(())
    }

    /// Snapshot the current cell values into an immutable structural
    /// tangent.
    pub fn freeze(&self) -> StructuralTangent<T> {
        StructuralTangent {
            type_name: self.type_name,
            field_order: self.field_order,
            entries: self
                .cells
                .iter()
                .map(|(n, c)| (*n, c.borrow().clone()))
                .collect(),
        }
    }
}
