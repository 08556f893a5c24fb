//! Provider registry and factory.
//!
//! Maps configured provider names to agent constructors. Unknown names are
//! rejected when the run is configured, before any task is spawned.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::provider::Agent;
use super::providers::{CensysAgent, FofaAgent, ShodanAgent};
use crate::error::RunError;

/// Constructor for an agent instance.
pub type AgentConstructor = Arc<dyn Fn() -> Arc<dyn Agent> + Send + Sync>;

/// Name → constructor mapping for provider agents.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    constructors: BTreeMap<String, AgentConstructor>,
}

impl AgentRegistry {
    /// Creates a registry with no providers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in providers.
    ///
    /// # Supported Providers
    ///
    /// - `"shodan"`: Shodan host search
    /// - `"censys"`: Censys hosts search (v2)
    /// - `"fofa"`: Fofa search-all API
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .register("shodan", || Arc::new(ShodanAgent::new()) as Arc<dyn Agent>)
            .register("censys", || Arc::new(CensysAgent::new()) as Arc<dyn Agent>)
            .register("fofa", || Arc::new(FofaAgent::new()) as Arc<dyn Agent>)
    }

    /// Registers (or replaces) a provider constructor.
    #[must_use]
    pub fn register<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn Agent> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.into(), Arc::new(constructor));
        self
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Builds one agent per configured name, in order.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::UnknownProvider`] for the first unregistered name.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<dyn Agent>>, RunError> {
        names
            .iter()
            .map(|name| {
                self.constructors
                    .get(name)
                    .map(|construct| construct())
                    .ok_or_else(|| RunError::UnknownProvider { name: name.clone() })
            })
            .collect()
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(
            AgentRegistry::builtin().names(),
            vec!["censys", "fofa", "shodan"]
        );
    }

    #[test]
    fn test_resolve_preserves_order() {
        let names = vec!["fofa".to_string(), "shodan".to_string()];
        let agents = AgentRegistry::builtin()
            .resolve(&names)
            .unwrap_or_else(|e| unreachable!("{e}"));
        let resolved: Vec<&str> = agents.iter().map(|a| a.name()).collect();
        assert_eq!(resolved, vec!["fofa", "shodan"]);
    }

    #[test]
    fn test_resolve_unknown_provider() {
        let names = vec!["shodan".to_string(), "zoomeye".to_string()];
        let err = AgentRegistry::builtin().resolve(&names).err();
        assert_eq!(
            err,
            Some(RunError::UnknownProvider {
                name: "zoomeye".to_string()
            })
        );
    }
}
