//! Substring search over the catalog.

use crate::catalog::{CatalogStore, Track};
use crate::normalize::normalize;
use log::trace;

/// Normalized queries shorter than this match nothing.
pub const MIN_QUERY_LEN: usize = 2;

/// Read-only search view over a [`CatalogStore`].
#[derive(Debug, Clone, Copy)]
pub struct SearchIndex<'a> {
    catalog: &'a CatalogStore,
}

impl<'a> SearchIndex<'a> {
    #[must_use]
    pub fn new(catalog: &'a CatalogStore) -> Self {
        Self { catalog }
    }

    /// Tracks whose normalized name or artist contains the normalized
    /// `query`, in catalog order, at most `limit` of them.
    ///
    /// Queries that normalize to fewer than two characters return nothing.
    ///
    /// ```
    /// use cadence::catalog::{CatalogStore, RawTrack};
    /// use cadence::cluster::FixedLabels;
    /// use cadence::search::SearchIndex;
    ///
    /// let catalog = CatalogStore::build(
    ///     vec![RawTrack::new("Don't Stop Me Now", "Queen", "rock", [1.0; 6])],
    ///     &FixedLabels(vec![0]),
    /// )?;
    /// let index = SearchIndex::new(&catalog);
    /// assert_eq!(index.search("dont stop", 6).len(), 1);
    /// assert!(index.search("q", 6).is_empty());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<&'a Track> {
        let needle = normalize(query);
        if needle.chars().count() < MIN_QUERY_LEN {
            trace!("Query {query:?} too short, skipping search");
            return Vec::new();
        }

        let results: Vec<&Track> = self
            .catalog
            .tracks()
            .iter()
            .filter(|t| {
                t.normalized_name.contains(&needle) || t.normalized_artist.contains(&needle)
            })
            .take(limit)
            .collect();
        trace!("Query {needle:?} matched {} tracks", results.len());
        results
    }
}
