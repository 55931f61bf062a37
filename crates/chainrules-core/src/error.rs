//! Error types for the tangent algebra.
//!
//! Every contract violation surfaces immediately as a [`TangentError`];
//! nothing is retried or silently downgraded to a default value. Silently
//! substituting a wrong-shaped or wrong-structure tangent would corrupt
//! downstream gradients, so the failure mode here is loud and precise.

use std::fmt;

/// Errors that can occur in tangent operations.
///
/// `Display` and `Error` are implemented by hand rather than derived via
/// `thiserror`: the derive unconditionally treats the field named `source`
/// (mandated by the spec for `NotImplementedEvaluated`) as an error source,
/// which a `&'static str` cannot be.
#[derive(Debug, Clone, PartialEq)]
pub enum TangentError {
    /// Two shapes cannot be combined or projected onto each other.
    DimensionMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Shape mismatch between data length and expected size.
    ShapeMismatch { expected: usize, actual: usize },

    /// Operation requires a specific array rank.
    RankMismatch { expected: usize, actual: usize },

    /// Matrix must be square.
    NotSquare { rows: usize, cols: usize },

    /// A structural tangent could not be added back onto its primal.
    ///
    /// Always names the exact hook an implementer must define.
    PrimalReconstructionFailed {
        type_name: &'static str,
        hook: &'static str,
    },

    /// A deliberately-missing derivative was actually evaluated.
    NotImplementedEvaluated {
        module: &'static str,
        source: &'static str,
        info: String,
    },

    /// Attempted in-place write to an unforced deferred value.
    MutateBeforeForcing,

    /// An algebra pair with no defined meaning.
    UndefinedOperation {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
}

impl fmt::Display for TangentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TangentError::DimensionMismatch { expected, actual } => write!(
                f,
                "dimension mismatch: expected shape {expected:?}, got shape {actual:?}"
            ),
            TangentError::ShapeMismatch { expected, actual } => write!(
                f,
                "shape mismatch: expected {expected} elements, got {actual}"
            ),
            TangentError::RankMismatch { expected, actual } => {
                write!(f, "expected array of rank {expected}, got rank {actual}")
            }
            TangentError::NotSquare { rows, cols } => {
                write!(f, "matrix must be square: got {rows}x{cols}")
            }
            TangentError::PrimalReconstructionFailed { type_name, hook } => write!(
                f,
                "cannot reconstruct primal of type `{type_name}`: define `{hook}` for this type"
            ),
            TangentError::NotImplementedEvaluated {
                module,
                source,
                info,
            } => write!(
                f,
                "derivative not implemented (declared at {source} in {module}): {info}"
            ),
            TangentError::MutateBeforeForcing => write!(
                f,
                "cannot mutate a deferred tangent before forcing it; call unthunk first"
            ),
            TangentError::UndefinedOperation { op, lhs, rhs } => {
                write!(f, "operation `{op}` is not defined between {lhs} and {rhs}")
            }
        }
    }
}

impl std::error::Error for TangentError {}
