use std::collections::HashMap;
use std::sync::Arc;

use crate::exact::ExactComparator;
use crate::levenshtein::LevenshteinComparator;
use crate::numeric::NumericComparator;
use crate::Comparator;

/// Registry name of the default exact comparator.
pub const EXACT: &str = "exact";
/// Registry name of the default edit-distance comparator.
pub const LEVENSHTEIN: &str = "levenshtein";
/// Registry name of the default numeric comparator.
pub const NUMERIC: &str = "numeric";

/// Name-keyed table of similarity functions.
///
/// The registry is owned by the caller and passed to the engine by shared
/// reference; entries are `Arc<dyn Comparator>` so a comparison can run
/// across threads. Schemas reference comparators by name, and the engine
/// rejects a schema whose names the registry cannot resolve.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use comparators::{ComparatorRegistry, NumericComparator};
///
/// let mut registry = ComparatorRegistry::with_defaults();
/// registry.register(
///     "price_tolerance",
///     Arc::new(NumericComparator::with_relative_tolerance(0.01)),
/// );
/// assert!(registry.contains("price_tolerance"));
/// assert!(registry.contains("levenshtein"));
/// ```
#[derive(Clone, Default)]
pub struct ComparatorRegistry {
    entries: HashMap<String, Arc<dyn Comparator>>,
}

impl ComparatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in comparators registered under their
    /// canonical names (`exact`, `levenshtein`, `numeric`) — the names the
    /// schema layer resolves per-type defaults to.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(EXACT, Arc::new(ExactComparator::new()));
        registry.register(LEVENSHTEIN, Arc::new(LevenshteinComparator::new()));
        registry.register(NUMERIC, Arc::new(NumericComparator::new()));
        registry
    }

    /// Register a comparator under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, comparator: Arc<dyn Comparator>) {
        self.entries.insert(name.into(), comparator);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Comparator>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order, for diagnostics.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ComparatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparatorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
