//! Search query descriptor.

/// A single search query dispatched to every configured provider.
///
/// Immutable once built; the runner wraps it in an `Arc` and shares one
/// instance read-only across all provider tasks spawned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    limit: usize,
}

impl Query {
    /// Creates a query with the given provider search text and result limit.
    #[must_use]
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            limit,
        }
    }

    /// Provider search text (passed through verbatim).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Maximum number of results a provider should stream for this query.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}
