//! Non-fatal diagnostics accumulated during evaluation.
//!
//! The reference scraper interpreter prints warnings to stdout and keeps
//! going; we keep going too, but give the caller a structured list instead
//! of parsing our own log output back out.

use core::fmt;

/// A single non-fatal condition encountered while evaluating a function or
/// resolving a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An `Expression`'s `regex` failed to compile, or failed during
    /// matching. The node that owned it contributed nothing.
    Pattern {
        /// The offending pattern source.
        pattern: String,
        /// The underlying engine's error message.
        message: String,
    },
    /// A `conditional` attribute referenced a settings key that was not
    /// present. The node (and its children) was skipped.
    MissingSetting {
        /// The settings key that was missing.
        key: String,
    },
    /// A `<chain function="...">` invocation produced no usable result.
    ChainMiss {
        /// The name of the function that was invoked.
        function: String,
    },
    /// An attribute is recognized by the parser but intentionally
    /// unimplemented (`compare`, `utf8`).
    UnimplementedAttribute {
        /// The attribute name.
        attribute: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern { pattern, message } => {
                write!(f, "invalid pattern `{pattern}`: {message}")
            }
            Self::MissingSetting { key } => {
                write!(f, "conditional setting not found: {key}")
            }
            Self::ChainMiss { function } => {
                write!(f, "no result from {function}")
            }
            Self::UnimplementedAttribute { attribute } => {
                write!(f, "attribute `{attribute}` is parsed but not implemented")
            }
        }
    }
}

/// Records `diagnostic` both into `sink` and to the `log` facade, at the
/// severity the reference tool's own printed warnings imply.
pub(crate) fn warn(sink: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    log::warn!("{diagnostic}");
    sink.push(diagnostic);
}
