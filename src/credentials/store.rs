//! In-memory credential pool loaded from a provider-config file and the
//! environment.
//!
//! # File Format
//!
//! ```toml
//! shodan = ["SHODAN_KEY"]
//! censys = ["API_ID:API_SECRET"]
//! fofa = ["EMAIL:KEY"]
//! ```
//!
//! Each provider may list several credentials; [`KeyStore::get_keys`] picks
//! one per provider at random for every task.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::CredentialPool;
use super::keyset::{Credential, KeySet};
use crate::error::ConfigError;

/// Providers whose entries are `id:secret` pairs.
const PAIRED_PROVIDERS: &[&str] = &["censys", "fofa"];

/// Environment variables read by [`KeyStore::load_env`]:
/// `(provider, id variable, secret variable)`.
const ENV_KEYS: &[(&str, Option<&str>, &str)] = &[
    ("shodan", None, "SHODAN_API_KEY"),
    ("censys", Some("CENSYS_API_ID"), "CENSYS_API_SECRET"),
    ("fofa", Some("FOFA_EMAIL"), "FOFA_KEY"),
];

/// Credential pool with per-provider rotation.
///
/// The random source is passed in explicitly so runs can be reproduced
/// with a fixed seed.
#[derive(Debug)]
pub struct KeyStore {
    entries: BTreeMap<String, Vec<Credential>>,
    rng: Mutex<StdRng>,
}

impl KeyStore {
    /// Creates an empty store using the given random source.
    #[must_use]
    pub fn new(rng: StdRng) -> Self {
        Self {
            entries: BTreeMap::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Creates an empty store with a deterministic seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Default provider-config location (`<config dir>/fanscan/provider-config.toml`).
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fanscan").join("provider-config.toml"))
    }

    /// Adds a credential for a provider.
    pub fn add(&mut self, provider: impl Into<String>, credential: Credential) {
        self.entries
            .entry(provider.into())
            .or_default()
            .push(credential);
    }

    /// Number of credentials held for a provider.
    #[must_use]
    pub fn count(&self, provider: &str) -> usize {
        self.entries.get(provider).map_or(0, Vec::len)
    }

    /// Loads credentials from a provider-config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or a parse
    /// error if its contents are malformed.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_toml(&text, path)
    }

    /// Loads credentials from provider-config TOML text.
    ///
    /// `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML and
    /// [`ConfigError::InvalidCredential`] for a paired provider entry
    /// without a `:` separator.
    pub fn load_toml(&mut self, text: &str, origin: &Path) -> Result<(), ConfigError> {
        let table: BTreeMap<String, Vec<String>> =
            toml::from_str(text).map_err(|e| ConfigError::Parse {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;

        for (provider, raw_entries) in table {
            for raw in raw_entries {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                let credential = parse_entry(&provider, raw)?;
                self.add(provider.clone(), credential);
            }
        }
        Ok(())
    }

    /// Appends credentials from the process environment.
    pub fn load_env(&mut self) {
        self.load_env_from(|name| std::env::var(name).ok());
    }

    /// Appends credentials using a custom variable lookup.
    ///
    /// Paired providers are only added when both variables are set and
    /// non-empty.
    pub fn load_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for &(provider, id_var, secret_var) in ENV_KEYS {
            let Some(secret) = non_empty(secret_var) else {
                continue;
            };
            match id_var {
                None => self.add(provider, Credential::token(secret)),
                Some(id_var) => {
                    if let Some(id) = non_empty(id_var) {
                        self.add(provider, Credential::pair(id, secret));
                    }
                }
            }
        }
    }
}

impl CredentialPool for KeyStore {
    fn get_keys(&self) -> KeySet {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.entries
            .iter()
            .filter(|(_, creds)| !creds.is_empty())
            .fold(KeySet::new(), |keys, (provider, creds)| {
                let pick = rng.gen_range(0..creds.len());
                keys.with(provider.clone(), creds[pick].clone())
            })
    }

    fn has_keys(&self) -> bool {
        self.entries.values().any(|creds| !creds.is_empty())
    }
}

fn parse_entry(provider: &str, raw: &str) -> Result<Credential, ConfigError> {
    if !PAIRED_PROVIDERS.contains(&provider) {
        return Ok(Credential::token(raw));
    }
    match raw.split_once(':') {
        Some((id, secret)) if !id.is_empty() && !secret.is_empty() => {
            Ok(Credential::pair(id, secret))
        }
        _ => Err(ConfigError::InvalidCredential {
            provider: provider.to_string(),
            expected: "ID:SECRET",
        }),
    }
}
