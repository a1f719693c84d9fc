//! The set of digests a sweep has proven must survive

use serde::Serialize;
use std::collections::BTreeSet;

/// Grow-only set of retained digests
///
/// There is intentionally no removal API: once a digest is known to be
/// referenced it stays protected for the rest of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RetentionSet {
    digests: BTreeSet<String>,
}

impl RetentionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a digest; returns `true` if it was not yet retained
    pub fn insert(&mut self, digest: impl Into<String>) -> bool {
        self.digests.insert(digest.into())
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.digests.contains(digest)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.digests.iter().map(String::as_str)
    }
}

impl<S: Into<String>> Extend<S> for RetentionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.digests.extend(iter.into_iter().map(Into::into));
    }
}

impl<S: Into<String>> FromIterator<S> for RetentionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}
