//! The error taxonomy for the scraper language interpreter.
//!
//! [`DefinitionError`] is the only fatal error: it aborts loading a scraper
//! definition. Everything else the evaluator encounters is recorded as a
//! [`crate::diagnostics::Diagnostic`] and evaluation continues, per the
//! "no exceptions across invocation boundaries" rule.

use thiserror::Error;

/// A scraper definition could not be turned into an AST.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The scraper XML itself did not parse.
    #[error("malformed scraper XML: {0}")]
    Xml(#[from] minidom::Error),

    /// A `<RegExp>` or function element is missing its required `dest`
    /// attribute.
    #[error("`{element}` element is missing a required `dest` attribute")]
    MissingDest {
        /// The tag name of the offending element.
        element: String,
    },

    /// A `dest` attribute was present but not `[0-9]+\+?`.
    #[error("`dest=\"{value}\"` on `{element}` is not a valid buffer index")]
    InvalidDest {
        /// The tag name of the offending element.
        element: String,
        /// The raw attribute value.
        value: String,
    },

    /// A `<RegExp>` element is missing its required `input` attribute.
    #[error("`RegExp` element is missing a required `input` attribute")]
    MissingInput,

    /// An `input` attribute was present but not `$$[0-9]+` or `$INFO[...]`.
    #[error("`input=\"{0}\"` is not a valid buffer reference or settings key")]
    InvalidInput(String),

    /// A `dest` or buffer-reference index fell outside `1..=20`.
    #[error("buffer index {0} is outside the valid range 1..=20")]
    BufferIndexOutOfRange(u8),

    /// A `noclean`/`trim`/`encode`/`fixchars` list contained something other
    /// than a comma-separated list of integers.
    #[error("`{attribute}=\"{value}\"` is not a comma-separated list of integers")]
    InvalidIndexList {
        /// The attribute name (`noclean`, `trim`, `encode`, or `fixchars`).
        attribute: String,
        /// The raw attribute value.
        value: String,
    },
}

/// A named function was looked up but does not exist in the function table.
#[derive(Debug, Error)]
#[error("function `{0}` is not defined")]
pub struct UnknownFunction(pub String);

/// A function's (or a chain's) output text was not well-formed XML.
#[derive(Debug, Error)]
pub enum OutputParseError {
    /// The text failed to parse as an XML element.
    #[error("output is not well-formed XML: {0}")]
    Xml(#[from] minidom::Error),
}
