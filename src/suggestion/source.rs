use crate::config::{CatalogKind, ServiceCatalog};
use crate::consts::{DATE, DC_INFO, NAMESPACE, POD_INFO, POD_NAME, RC_INFO, SERVICE_NAME};
use crate::runtime::runtime;
use crate::suggestion::date::DateSource;

use tracing::{debug, warn};

use std::sync::Arc;

/// Continuation receiving the candidates of one request.
pub type SuggestionsReady = Box<dyn FnOnce(Vec<String>) + Send>;

/// Completion policy of one field.
pub trait SuggestionSource: Send + Sync {
    /// Candidates for the text typed so far, computed on the caller's thread.
    fn candidates(&self, typed: &str) -> Vec<String>;

    /// Delivers the candidates for `typed` through `ready`, exactly once.
    /// Sources whose answer arrives later override this.
    fn advise(&self, typed: &str, ready: SuggestionsReady) {
        ready(self.candidates(typed));
    }
}

/// Completes from one list of the shared [`ServiceCatalog`].
pub struct CatalogSource {
    catalog: Arc<ServiceCatalog>,
    kind: CatalogKind,
}

impl CatalogSource {
    pub fn new(catalog: Arc<ServiceCatalog>, kind: CatalogKind) -> Self {
        Self { catalog, kind }
    }
}

impl SuggestionSource for CatalogSource {
    fn candidates(&self, typed: &str) -> Vec<String> {
        self.catalog.lookup(self.kind, typed)
    }
}

/// Runs the wrapped source on the shared runtime and answers from there.
pub struct Deferred<S> {
    inner: Arc<S>,
}

impl<S> Deferred<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl<S: SuggestionSource + 'static> SuggestionSource for Deferred<S> {
    fn candidates(&self, typed: &str) -> Vec<String> {
        self.inner.candidates(typed)
    }

    fn advise(&self, typed: &str, ready: SuggestionsReady) {
        let runtime = match runtime() {
            Ok(runtime) => runtime,
            Err(error) => {
                warn!(?error, "answering suggestions inline");
                ready(self.inner.candidates(typed));
                return;
            }
        };
        let inner = Arc::clone(&self.inner);
        let typed = typed.to_string();
        runtime.spawn_blocking(move || {
            let candidates = inner.candidates(&typed);
            debug!(%typed, count = candidates.len(), "deferred suggestions ready");
            ready(candidates);
        });
    }
}

/// Fields the filter understands, in the order they are suggested.
#[derive(Default)]
pub struct FieldRegistry {
    fields: Vec<(String, Arc<dyn SuggestionSource>)>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, replacing the source of an existing entry in place.
    pub fn with(mut self, name: impl Into<String>, source: Arc<dyn SuggestionSource>) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(entry) => entry.1 = source,
            None => self.fields.push((name, source)),
        }
        self
    }

    /// The fields of the call and pod tables. Catalog lists answer right away,
    /// date functions answer from the shared runtime.
    pub fn standard(catalog: Arc<ServiceCatalog>) -> Self {
        let catalog_source = |kind| -> Arc<dyn SuggestionSource> {
            Arc::new(CatalogSource::new(Arc::clone(&catalog), kind))
        };
        Self::new()
            .with(POD_NAME, catalog_source(CatalogKind::PodNames))
            .with(SERVICE_NAME, catalog_source(CatalogKind::ServiceNames))
            .with(NAMESPACE, catalog_source(CatalogKind::Namespaces))
            .with(POD_INFO, catalog_source(CatalogKind::ServiceNames))
            .with(RC_INFO, catalog_source(CatalogKind::ServiceNames))
            .with(DC_INFO, catalog_source(CatalogKind::ServiceNames))
            .with(DATE, Arc::new(Deferred::new(DateSource)))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    pub fn source(&self, name: &str) -> Option<&Arc<dyn SuggestionSource>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, source)| source)
    }

    /// Field names containing `typed`.
    pub fn matching_fields(&self, typed: &str) -> Vec<String> {
        self.field_names()
            .filter(|name| name.contains(typed))
            .map(str::to_string)
            .collect()
    }
}
