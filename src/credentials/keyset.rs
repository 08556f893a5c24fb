//! Credential and key set types.

use std::collections::BTreeMap;
use std::fmt;

/// A single provider credential.
///
/// Providers with paired credentials (Censys API ID + secret, Fofa email +
/// key) use `id`; single-token providers leave it `None`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account identifier, when the provider needs one.
    pub id: Option<String>,
    /// API key or secret.
    pub secret: String,
}

impl Credential {
    /// Creates a single-token credential.
    #[must_use]
    pub fn token(secret: impl Into<String>) -> Self {
        Self {
            id: None,
            secret: secret.into(),
        }
    }

    /// Creates an id/secret credential.
    #[must_use]
    pub fn pair(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            secret: secret.into(),
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Credentials bound to one task, keyed by provider name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    entries: BTreeMap<String, Credential>,
}

impl KeySet {
    /// Creates an empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the credential for a provider.
    #[must_use]
    pub fn with(mut self, provider: impl Into<String>, credential: Credential) -> Self {
        self.entries.insert(provider.into(), credential);
        self
    }

    /// Returns the credential for a provider.
    #[must_use]
    pub fn get(&self, provider: &str) -> Option<&Credential> {
        self.entries.get(provider)
    }

    /// Returns `true` if no provider has a credential.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of providers with a credential.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
