//! The settings map consumed by `$INFO[...]` input sources and `conditional`
//! guards.
//!
//! Addon discovery and `settings.xml` parsing are out of scope for this
//! crate; callers populate a [`Settings`] however they like and
//! hand it to [`crate::eval::evaluate_function`].

use indexmap::IndexMap;

/// A key→string mapping external to the evaluator.
///
/// Backed by an [`IndexMap`] rather than a [`std::collections::HashMap`] so
/// that iteration order matches the order settings were inserted, the same
/// way a real addon's `settings.xml` would be read off disk top to bottom.
#[derive(Debug, Clone, Default)]
pub struct Settings(IndexMap<String, String>);

impl Settings {
    /// Creates an empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Looks up `key`, returning `None` if it is not present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Looks up `key`, returning `""` if it is not present.
    ///
    /// This is the lookup `$INFO[key]` input sources use,
    /// which is deliberately more lenient than [`Settings::get`]: a missing
    /// settings key is treated as an empty string, not as an absent buffer.
    #[must_use]
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Inserts or overwrites `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Settings {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}
