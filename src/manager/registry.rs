//! Scenario registry - name to scenario mapping.
//!
//! Populated once when the manager is built and read-mostly afterwards.
//! The registry itself is not synchronized; the manager's lock guards it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::scenarios::Scenario;

/// Name-keyed collection of scenarios.
#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: HashMap<String, Arc<dyn Scenario>>,
}

impl ScenarioRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scenario under its own name, replacing any previous entry.
    pub fn register(&mut self, scenario: Arc<dyn Scenario>) {
        let name = scenario.name().to_string();
        if self.scenarios.insert(name.clone(), scenario).is_some() {
            warn!(scenario = %name, "Replaced existing scenario registration");
        } else {
            debug!(scenario = %name, "Registered scenario");
        }
    }

    /// Look up a scenario by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Scenario>> {
        self.scenarios.get(name).cloned()
    }

    /// Check if a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.scenarios.contains_key(name)
    }

    /// Iterate over all registered scenarios.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Scenario>> {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}
