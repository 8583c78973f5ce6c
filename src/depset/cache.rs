//! Dependency string parse cache - ahash + parking_lot

use crate::config::ParseOptions;
use crate::depset::ast::DepSet;
use crate::error::{LeafError, ParseError};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Parse-once cache keyed by the raw dependency string
///
/// Metadata values repeat heavily across a repository, so callers parsing
/// many packages share one cache per metadata key. Failed parses are not
/// cached.
///
/// Entries are never evicted; a cache shared across a whole repository
/// grows with the number of distinct strings until [`DepSetCache::clear`].
pub struct DepSetCache<T> {
    options: ParseOptions,
    entries: RwLock<AHashMap<String, Arc<DepSet<T>>>>,
}

impl<T> DepSetCache<T> {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            entries: RwLock::new(AHashMap::with_capacity(256)),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Get or parse a dependency string, using the cache for repeated input
    #[inline]
    pub fn get_or_parse<F, E>(
        &self,
        dep_str: &str,
        leaf_factory: F,
    ) -> Result<Arc<DepSet<T>>, ParseError>
    where
        F: FnMut(&str) -> Result<T, E>,
        E: Into<LeafError>,
    {
        // Fast path: check read lock first
        if let Some(depset) = self.get(dep_str) {
            return Ok(depset);
        }

        // Slow path: parse outside the lock, first writer wins
        let parsed = Arc::new(DepSet::parse_with(dep_str, &self.options, leaf_factory)?);
        let mut entries = self.entries.write();
        let depset = entries
            .entry(dep_str.to_string())
            .or_insert(parsed)
            .clone();
        Ok(depset)
    }

    pub fn get(&self, dep_str: &str) -> Option<Arc<DepSet<T>>> {
        self.entries.read().get(dep_str).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T> Default for DepSetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
