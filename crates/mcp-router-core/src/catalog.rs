//! Per-backend tool catalog with atomic snapshot publication.
//!
//! A [`Catalog`] is immutable once built. The [`CatalogHandle`] holds the
//! current snapshot behind an [`ArcSwap`]; readers take a cheap `Arc` to a
//! fully formed snapshot and writers publish a new one wholesale, so no
//! reader ever observes one backend's new entries next to the other's old
//! ones.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::models::{BackendId, ToolMap};

/// Immutable snapshot of both backends' tool listings
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    official: Arc<ToolMap>,
    custom: Arc<ToolMap>,
}

impl Catalog {
    /// Build a snapshot from both listings
    pub fn new(official: ToolMap, custom: ToolMap) -> Self {
        Self {
            official: Arc::new(official),
            custom: Arc::new(custom),
        }
    }

    /// Tools advertised by `backend`
    pub fn tools(&self, backend: BackendId) -> &ToolMap {
        match backend {
            BackendId::Official => &self.official,
            BackendId::Custom => &self.custom,
        }
    }

    /// Whether `backend` advertises `tool_name`
    pub fn contains(&self, backend: BackendId, tool_name: &str) -> bool {
        self.tools(backend).contains_key(tool_name)
    }

    /// Sorted tool names for `backend`
    pub fn tool_names(&self, backend: BackendId) -> Vec<String> {
        let mut names: Vec<String> = self.tools(backend).keys().cloned().collect();
        names.sort();
        names
    }
}

/// Shared, atomically swappable reference to the current [`Catalog`]
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    current: Arc<ArcSwap<Catalog>>,
}

impl CatalogHandle {
    /// Create a handle publishing `initial`
    pub fn new(initial: Catalog) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// The current snapshot. Stays valid even if a newer one is published.
    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current.load_full()
    }

    /// Replace the whole snapshot
    pub fn publish(&self, catalog: Catalog) {
        self.current.store(Arc::new(catalog));
    }

    /// Publish a snapshot in which each `Some` listing replaces that backend's
    /// half and each `None` keeps the previous half.
    ///
    /// The merge runs under [`ArcSwap::rcu`], so concurrent writers never
    /// drop each other's halves. Returns the snapshot that was published.
    pub fn apply(&self, official: Option<ToolMap>, custom: Option<ToolMap>) -> Arc<Catalog> {
        let official = official.map(Arc::new);
        let custom = custom.map(Arc::new);
        let mut published = None;
        self.current.rcu(|current| {
            let next = Arc::new(Catalog {
                official: official
                    .clone()
                    .unwrap_or_else(|| Arc::clone(&current.official)),
                custom: custom.clone().unwrap_or_else(|| Arc::clone(&current.custom)),
            });
            published = Some(Arc::clone(&next));
            next
        });
        published.unwrap_or_else(|| self.snapshot())
    }
}
