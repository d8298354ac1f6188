//! An interpreter for the XML-encoded scraping language used by Kodi-family
//! media-metadata scrapers.
//!
//! A scraper definition supplies named *functions*; each function is a tree
//! of RegExp/Expression nodes that transform HTML (or other text) into a
//! structured XML result against a fixed bank of text buffers. This crate
//! is the evaluator only: loading a function table from parsed XML,
//! evaluating one named function against caller-supplied buffers and
//! settings, and expanding `<chain>` links in the result. Addon discovery,
//! settings-file parsing, network fetching, and CLI argument handling live
//! outside this crate's scope — see `src/bin/scraper-rs.rs` for a minimal
//! driver that supplies them.

pub mod ast;
pub mod buffers;
pub mod chain;
pub mod clean;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod regex_adapter;
pub mod settings;
pub mod url;
pub mod xml;

pub use ast::{Function, FunctionTable, load_function_table};
pub use buffers::Buffers;
pub use chain::expand_chains;
pub use diagnostics::Diagnostic;
pub use error::{DefinitionError, OutputParseError, UnknownFunction};
pub use eval::evaluate_function;
pub use settings::Settings;
