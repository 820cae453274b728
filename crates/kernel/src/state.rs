//! Application state shared across all handlers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::controller::ResourceController;
use crate::directive::DirectiveHooks;
use crate::error::{AppError, AppResult};
use crate::memory::{MemoryCollection, MemoryStore};
use crate::policy::PolicyRegistry;
use crate::record::Record;

/// Controller over the in-memory store, as served by the binary.
pub type MemoryController = ResourceController<MemoryStore>;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Controllers keyed by resource type name.
    resources: HashMap<String, MemoryController>,
}

/// One resource type declared in the seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedResource {
    /// Resolve members by slug as well as id.
    #[serde(default)]
    pub friendly_lookup: bool,

    /// Attributes that must be non-blank on create.
    #[serde(default)]
    pub required_attributes: Vec<String>,

    /// When set, `filter=<value>` keeps records whose attribute equals value.
    /// Without it, filter directives are rejected.
    pub filter_attribute: Option<String>,

    #[serde(default)]
    pub records: Vec<Record>,
}

impl AppState {
    /// Build state from the configured policy and seed files.
    pub fn new(config: &Config) -> Result<Self> {
        let policies = match &config.policy_file {
            Some(path) => PolicyRegistry::load(path)?,
            None => PolicyRegistry::new(),
        };

        let seeds = match &config.seed_file {
            Some(path) => load_seeds(path)?,
            None => HashMap::new(),
        };

        info!(
            policies = policies.len(),
            resource_types = seeds.len(),
            "loaded resource definitions"
        );

        Ok(Self::from_seeds(&policies, seeds))
    }

    /// Build state from already-parsed definitions.
    pub fn from_seeds(policies: &PolicyRegistry, seeds: HashMap<String, SeedResource>) -> Self {
        let controllers = seeds
            .into_iter()
            .map(|(name, seed)| build_controller(&name, seed, policies));
        Self::from_controllers(controllers)
    }

    pub fn from_controllers(controllers: impl IntoIterator<Item = MemoryController>) -> Self {
        let resources = controllers
            .into_iter()
            .map(|c| (c.name().to_string(), c))
            .collect();
        Self {
            inner: Arc::new(AppStateInner { resources }),
        }
    }

    /// Controller for a resource type name.
    pub fn resource(&self, name: &str) -> AppResult<&MemoryController> {
        self.inner.resources.get(name).ok_or(AppError::NotFound)
    }

    pub fn resource_count(&self) -> usize {
        self.inner.resources.len()
    }
}

fn load_seeds(path: &Path) -> Result<HashMap<String, SeedResource>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).context("invalid seed document")
}

fn build_controller(name: &str, seed: SeedResource, policies: &PolicyRegistry) -> MemoryController {
    let mut store = MemoryStore::new(name)
        .with_required_attributes(seed.required_attributes)
        .with_records(seed.records);
    if seed.friendly_lookup {
        store = store.with_friendly_lookup();
    }

    let mut hooks = DirectiveHooks::new();
    if let Some(attribute) = seed.filter_attribute {
        hooks = hooks.with_filter(
            move |collection: MemoryCollection, raw: &str| -> AppResult<MemoryCollection> {
                let wanted = Value::String(raw.to_string());
                Ok(collection.retain(|r| r.attributes.get(&attribute) == Some(&wanted)))
            },
        );
    }

    ResourceController::new(name, store, policies.policy_for(name)).with_hooks(hooks)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeds_declare_resource_types() {
        let seeds: HashMap<String, SeedResource> = serde_json::from_value(json!({
            "articles": {
                "friendly_lookup": true,
                "required_attributes": ["title"],
                "records": [{"type": "articles", "id": "1", "attributes": {"title": "A"}}]
            }
        }))
        .unwrap();

        let state = AppState::from_seeds(&PolicyRegistry::new(), seeds);
        assert_eq!(state.resource_count(), 1);
        assert_eq!(state.resource("articles").unwrap().store().len(), 1);
        assert!(matches!(state.resource("people"), Err(AppError::NotFound)));
    }
}
