//! Provider credentials.
//!
//! A [`CredentialPool`] hands each task a fresh [`KeySet`] holding at most
//! one credential per provider. The runner only observes whether a key set
//! is empty; agents look up their own entry by provider name.

pub mod keyset;
pub mod store;

pub use keyset::{Credential, KeySet};
pub use store::KeyStore;

/// Source of per-task credential bundles.
pub trait CredentialPool: Send + Sync {
    /// Returns a key set for one task.
    ///
    /// Implementations may rotate between credentials across calls.
    fn get_keys(&self) -> KeySet;

    /// Returns `true` if any provider has at least one credential.
    fn has_keys(&self) -> bool;
}
