//! Metadata for deliberately-missing derivatives.
//!
//! Mirrors ChainRulesCore.jl's `@not_implemented`: a rule author can mark a
//! derivative as intentionally unwritten, and the marker records where it
//! came from so a failure is traceable to the missing rule.

/// Origin and diagnostic text of a deliberately-missing derivative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotImplementedInfo {
    module: &'static str,
    source: &'static str,
    info: String,
}

impl NotImplementedInfo {
    /// Record a missing derivative declared at `source` in `module`.
    pub fn new(module: &'static str, source: &'static str, info: String) -> Self {
        Self {
            module,
            source,
            info,
        }
    }

    /// Module path of the declaring rule.
    #[inline]
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// `file:line` of the declaration.
    #[inline]
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Free-text diagnostic supplied by the rule author.
    #[inline]
    pub fn info(&self) -> &str {
        &self.info
    }
}

/// Build a [`crate::Tangent::NotImplemented`] capturing the call site.
///
/// # Example
///
/// ```
/// use chainrules_core::{not_implemented, Tangent};
///
/// let t: Tangent<f64> = not_implemented!("derivative of lgamma not written");
/// assert!(matches!(t, Tangent::NotImplemented(_)));
/// ```
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)*) => {
        $crate::Tangent::not_implemented(
            ::std::module_path!(),
            ::std::concat!(::std::file!(), ":", ::std::line!()),
            ::std::format!($($arg)*),
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::Tangent;

    #[test]
    fn test_macro_captures_origin() {
        let t: Tangent<f64> = not_implemented!("no rule for {}", "foo");
        match t {
            Tangent::NotImplemented(info) => {
                assert!(info.module().contains("not_implemented"));
                assert!(info.source().contains("not_implemented.rs:"));
                assert_eq!(info.info(), "no rule for foo");
            }
            other => panic!("expected NotImplemented, got {:?}", other),
        }
    }
}
