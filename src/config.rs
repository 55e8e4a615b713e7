use crate::consts::{DEFAULT_SUGGESTION_TIMEOUT_MS, FALLBACK_QUERY, KNOWN_COMPARATORS};

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info};

use std::path::Path;
use std::time::Duration;

/// Settings of the filter box. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// The tables show data imported from a dump rather than a live collector.
    pub loaded_from_dump: bool,
    /// Substituted for empty input when `loaded_from_dump` is set.
    pub fallback_query: String,
    /// Comparators accepted on submission.
    pub comparators: Vec<String>,
    pub suggestion_timeout_ms: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            loaded_from_dump: false,
            fallback_query: FALLBACK_QUERY.to_string(),
            comparators: KNOWN_COMPARATORS.iter().map(|c| c.to_string()).collect(),
            suggestion_timeout_ms: DEFAULT_SUGGESTION_TIMEOUT_MS,
        }
    }
}

impl FilterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read filter config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse filter config {}", path.display()))?;
        if config.comparators.is_empty() {
            bail!("filter config {} accepts no comparators", path.display());
        }
        info!(?path, loaded_from_dump = config.loaded_from_dump, "filter config loaded");
        Ok(config)
    }

    pub fn suggestion_timeout(&self) -> Duration {
        Duration::from_millis(self.suggestion_timeout_ms)
    }
}

/// Which list of a [`ServiceCatalog`] a field completes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    PodNames,
    ServiceNames,
    Namespaces,
}

/// Names known to the collector, in the shape its inventory endpoint returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogLists {
    pub pod_names: Vec<String>,
    pub service_names: Vec<String>,
    pub namespaces: Vec<String>,
}

impl CatalogLists {
    fn list(&self, kind: CatalogKind) -> &[String] {
        match kind {
            CatalogKind::PodNames => &self.pod_names,
            CatalogKind::ServiceNames => &self.service_names,
            CatalogKind::Namespaces => &self.namespaces,
        }
    }
}

/// Shared catalog read by every suggestion pass. The lists can be swapped
/// while sessions are reading them.
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    lists: RwLock<CatalogLists>,
}

impl ServiceCatalog {
    pub fn new(lists: CatalogLists) -> Self {
        Self {
            lists: RwLock::new(lists),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read service catalog {}", path.display()))?;
        let lists: CatalogLists = serde_json::from_str(&text)
            .with_context(|| format!("parse service catalog {}", path.display()))?;
        info!(
            pods = lists.pod_names.len(),
            services = lists.service_names.len(),
            namespaces = lists.namespaces.len(),
            "service catalog loaded"
        );
        Ok(Self::new(lists))
    }

    pub fn replace(&self, lists: CatalogLists) {
        *self.lists.write() = lists;
        debug!("service catalog replaced");
    }

    /// Entries of `kind` containing `typed`, ignoring case, in catalog order.
    pub fn lookup(&self, kind: CatalogKind, typed: &str) -> Vec<String> {
        let needle = typed.to_lowercase();
        self.lists
            .read()
            .list(kind)
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}
