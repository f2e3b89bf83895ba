//! Holds registered sources and the cached, priority-sorted enabled view.

use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::Source;

struct Entry {
    source: Arc<dyn Source>,
    /// Registration sequence number; the tie key for equal priorities.
    seq: u64,
}

/// Registry of candidate sources.
///
/// Mutations bump a monotonic version counter; the sorted enabled view is
/// recomputed only when the counter has moved since it was last built, so
/// per-keystroke reads never resort.
pub struct SourceRegistry {
    entries: HashMap<String, Entry>,
    next_seq: u64,
    version: u64,
    cache: Option<(u64, Vec<Arc<dyn Source>>)>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
            version: 0,
            cache: None,
        }
    }

    /// Insert or replace a source keyed by its id.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(id = source.id(), name = source.name(), "register source");
        self.entries
            .insert(source.id().to_string(), Entry { source, seq });
        self.bump_version();
    }

    /// Remove a source by id. Returns true if it was present.
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            debug!(id, "unregister source");
            self.bump_version();
        }
        removed
    }

    /// Look up a source by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Source>> {
        self.entries.get(id).map(|e| e.source.clone())
    }

    /// Current version counter. Strictly increases on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Invalidate the cached view without changing the source set.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    /// Enabled sources sorted descending by priority, ties in registration
    /// order. Cached until the version counter moves.
    pub fn sorted(&mut self, config: &config::Config) -> Vec<Arc<dyn Source>> {
        if let Some((cached_version, view)) = &self.cache
            && *cached_version == self.version
        {
            return view.clone();
        }
        let mut live: Vec<&Entry> = self
            .entries
            .values()
            .filter(|e| config.is_source_enabled(e.source.name()))
            .collect();
        live.sort_by(|a, b| {
            b.source
                .metadata()
                .priority
                .cmp(&a.source.metadata().priority)
                .then(a.seq.cmp(&b.seq))
        });
        let view: Vec<Arc<dyn Source>> = live.into_iter().map(|e| e.source.clone()).collect();
        self.cache = Some((self.version, view.clone()));
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockSource;

    fn ids(view: &[Arc<dyn Source>]) -> Vec<String> {
        view.iter().map(|s| s.id().to_string()).collect()
    }

    #[test]
    fn register_unregister_restores_view() {
        let cfg = config::Config::default();
        let mut reg = SourceRegistry::new();
        reg.register(Arc::new(MockSource::new("buffer", 10)));
        let before = ids(&reg.sorted(&cfg));
        let v0 = reg.version();

        reg.register(Arc::new(MockSource::new("lsp", 20)));
        let v1 = reg.version();
        assert!(v1 > v0, "register must bump the version");
        assert_eq!(ids(&reg.sorted(&cfg)), vec!["lsp", "buffer"]);

        assert!(reg.unregister("lsp"));
        assert!(reg.version() > v1, "unregister must bump the version");
        assert_eq!(ids(&reg.sorted(&cfg)), before);
    }

    #[test]
    fn sorted_filters_disabled_and_orders_by_priority() {
        let cfg = config::Config {
            enabled_sources: Some(vec!["buffer".into(), "lsp".into()]),
            ..config::Config::default()
        };
        let mut reg = SourceRegistry::new();
        reg.register(Arc::new(MockSource::new("buffer", 1)));
        reg.register(Arc::new(MockSource::new("snippets", 99)));
        reg.register(Arc::new(MockSource::new("lsp", 5)));
        assert_eq!(ids(&reg.sorted(&cfg)), vec!["lsp", "buffer"]);
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let cfg = config::Config::default();
        let mut reg = SourceRegistry::new();
        reg.register(Arc::new(MockSource::new("b", 3)));
        reg.register(Arc::new(MockSource::new("a", 3)));
        reg.register(Arc::new(MockSource::new("c", 3)));
        assert_eq!(ids(&reg.sorted(&cfg)), vec!["b", "a", "c"]);
    }

    #[test]
    fn cached_view_is_reused_until_version_changes() {
        let cfg = config::Config::default();
        let mut reg = SourceRegistry::new();
        reg.register(Arc::new(MockSource::new("buffer", 1)));
        let first = reg.sorted(&cfg);
        let second = reg.sorted(&cfg);
        assert!(Arc::ptr_eq(&first[0], &second[0]));

        reg.bump_version();
        let third = reg.sorted(&cfg);
        assert_eq!(ids(&third), ids(&first));
    }
}
