//! Named link-graph registries.
//!
//! Every independently rendered container owns one registry mapping element
//! identifiers to their [`LinkGraphEntry`]. Registries live in a single
//! process-wide [`RegistryIndex`] and are addressed by name; nothing is
//! resolved by synthesizing identifiers at runtime.
//!
//! The store is append/overwrite-only. Entries are never pruned, so an
//! entry can outlive its element; resolution against such an entry must end
//! in a safe no-op, which is why lookups hand out clones instead of
//! references into the shared map.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use pagewire_types::LinkGraphEntry;
use tracing::debug;

type Registry = IndexMap<String, LinkGraphEntry>;

/// Process-wide index of named link-graph registries.
///
/// Cheap to clone; all clones share the same underlying registries.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    registries: Arc<Mutex<IndexMap<String, Registry>>>,
}

impl RegistryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `entry` for `element` in the named registry, creating the
    /// registry on first use. Last write wins.
    pub fn register(&self, registry: &str, element: &str, entry: LinkGraphEntry) {
        let mut registries = self.registries.lock().expect("registry lock");
        let slot = registries.entry(registry.to_string()).or_default();
        if slot.insert(element.to_string(), entry).is_some() {
            debug!(registry, element, "replaced existing link graph entry");
        }
    }

    /// Clone out the entry for `element`, or `None` when either the registry
    /// or the element is unknown. Both misses are expected non-error cases.
    pub fn lookup(&self, registry: &str, element: &str) -> Option<LinkGraphEntry> {
        self.registries
            .lock()
            .expect("registry lock")
            .get(registry)?
            .get(element)
            .cloned()
    }

    /// Registry names in creation order.
    pub fn registry_names(&self) -> Vec<String> {
        self.registries
            .lock()
            .expect("registry lock")
            .keys()
            .cloned()
            .collect()
    }

    /// Element identifiers registered in `registry`, in registration order.
    pub fn element_ids(&self, registry: &str) -> Vec<String> {
        self.registries
            .lock()
            .expect("registry lock")
            .get(registry)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}
