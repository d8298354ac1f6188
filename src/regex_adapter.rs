//! A thin wrapper around a PCRE-compatible regex engine.
//!
//! The scraper language assumes PCRE features (lookaround, non-greedy
//! quantifiers, backreferences in patterns), which the `regex` crate's
//! finite-automaton engine cannot provide. `fancy_regex` is used instead,
//! the same way `wiki-rs` reaches for it for the one pattern in its own
//! parser configuration that needs a lookahead
//! (`src/wikitext/config.rs::link_trail_regex`).

use fancy_regex::{Regex, RegexBuilder};
use thiserror::Error;

/// A pattern failed to compile, or failed while matching (for example by
/// exceeding the engine's backtracking budget).
///
/// This is non-fatal: the caller turns it into a
/// [`crate::diagnostics::Diagnostic::Pattern`] and the node contributes
/// nothing.
#[derive(Debug, Error)]
#[error("{pattern}: {source}")]
pub struct PatternError {
    /// The pattern source that failed.
    pub pattern: String,
    #[source]
    source: fancy_regex::Error,
}

/// A compiled `Expression` pattern, ready to search or find-all over text.
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compiles `pattern` with multiline + dotall semantics always on (so
    /// that patterns written for "dot matches newline" behave identically to
    /// the reference implementation), and case-insensitivity unless
    /// `case_sensitive` is set.
    pub fn compile(pattern: &str, case_sensitive: bool) -> Result<Self, PatternError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .dot_matches_new_line(true)
            .multi_line(true)
            .build()
            .map_err(|source| PatternError {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The leftmost match in `text`, or `None` if there is no match.
    ///
    /// Returns `Err` if the engine itself failed while searching (distinct
    /// from "no match").
    pub fn search<'t>(&self, text: &'t str) -> Result<Option<fancy_regex::Captures<'t>>, PatternError> {
        self.regex.captures(text).map_err(|source| PatternError {
            pattern: self.pattern.clone(),
            source,
        })
    }

    /// All non-overlapping matches in `text`, left to right.
    ///
    /// The iterator yields `Err` in place of stopping silently if the engine
    /// fails partway through; callers should treat that as aborting the
    /// whole node.
    pub fn find_all<'r, 't>(
        &'r self,
        text: &'t str,
    ) -> impl Iterator<Item = Result<fancy_regex::Captures<'t>, PatternError>> + 'r
    where
        't: 'r,
    {
        let pattern = self.pattern.clone();
        self.regex.captures_iter(text).map(move |result| {
            result.map_err(|source| PatternError {
                pattern: pattern.clone(),
                source,
            })
        })
    }
}
