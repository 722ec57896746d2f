//! Cluster-based recommendations from the user's favorites.
//!
//! ## Algorithm
//!
//! 1. Resolve favorites to catalog tracks, silently dropping unknown pairs
//! 2. Pick the majority cluster among them (ties to the lowest id)
//! 3. Score every track in that cluster by its correlation distance to the
//!    closest favorite
//! 4. Sort ascending (stable, so catalog order breaks ties)
//! 5. Skip as many entries as there are resolved favorites, take `top_k`
//! 6. Drop anything that is itself a favorite
//!
//! The skip in step 5 removes the candidates that sit closest to the
//! favorites, which are usually the favorites or near-duplicates of them.
//! Step 6 catches whatever the skip misses.
//!
//! Cost is `O(cluster_size × favorites)`; candidate scoring runs on the
//! rayon pool and collects in order, so output stays deterministic.

use crate::catalog::{CatalogStore, FeatureVector, Track, FEATURE_COUNT};
use crate::cluster::ClusterId;
use crate::favorites::{FavoritesSet, SharedFavorites};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Default number of recommendations callers ask for.
pub const DEFAULT_TOP_K: usize = 10;

/// Distance used when correlation is undefined (a constant vector).
pub const MAX_DISTANCE: f64 = 2.0;

/// A recommended track and its distance to the nearest favorite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredTrack<'a> {
    pub track: &'a Track,
    pub distance: f64,
}

/// Result of a recommendation request.
///
/// The two empty variants carry the reason so callers can word their
/// message; the algorithm treats them the same.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation<'a> {
    /// The favorites set is empty.
    NoFavorites,
    /// No favorite resolved to the catalog, or nothing was left to suggest.
    NoMatch,
    /// Ranked suggestions, most similar first.
    Ranked(Vec<ScoredTrack<'a>>),
}

impl<'a> Recommendation<'a> {
    /// Ordered tracks; empty for the two reason variants.
    #[must_use]
    pub fn tracks(&self) -> Vec<&'a Track> {
        match self {
            Self::Ranked(scored) => scored.iter().map(|s| s.track).collect(),
            Self::NoFavorites | Self::NoMatch => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !matches!(self, Self::Ranked(scored) if !scored.is_empty())
    }
}

/// Recommender over an immutable catalog.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationEngine<'a> {
    catalog: &'a CatalogStore,
}

impl<'a> RecommendationEngine<'a> {
    #[must_use]
    pub fn new(catalog: &'a CatalogStore) -> Self {
        Self { catalog }
    }

    /// Recommend up to `top_k` tracks for `favorites`.
    #[must_use]
    pub fn recommend(&self, favorites: &FavoritesSet, top_k: usize) -> Recommendation<'a> {
        if favorites.is_empty() {
            return Recommendation::NoFavorites;
        }

        let resolved: Vec<&'a Track> = favorites
            .iter()
            .filter_map(|f| self.catalog.find(&f.name, &f.artist))
            .collect();
        debug!("Resolved {} of {} favorites", resolved.len(), favorites.len());

        let Some(cluster) = majority_cluster(resolved.iter().map(|t| t.cluster_id)) else {
            return Recommendation::NoMatch;
        };

        let candidates: Vec<&'a Track> = self.catalog.in_cluster(cluster).collect();
        info!(
            "Majority cluster {cluster} with {} candidates",
            candidates.len()
        );

        let ranked = rank_candidates(&candidates, &resolved);
        let picked: Vec<ScoredTrack<'a>> = ranked
            .into_iter()
            .skip(resolved.len())
            .take(top_k)
            .filter(|s| !favorites.contains(&s.track.name, &s.track.artist))
            .take(top_k)
            .collect();

        if picked.is_empty() {
            Recommendation::NoMatch
        } else {
            Recommendation::Ranked(picked)
        }
    }

    /// Recommend from a consistent snapshot of shared favorites.
    #[must_use]
    pub fn recommend_shared(
        &self,
        favorites: &SharedFavorites,
        top_k: usize,
    ) -> Recommendation<'a> {
        self.recommend(&favorites.snapshot(), top_k)
    }
}

/// Most frequent label; ties resolve to the lowest id. `None` when empty.
pub fn majority_cluster(labels: impl IntoIterator<Item = ClusterId>) -> Option<ClusterId> {
    let counts = labels.into_iter().fold(BTreeMap::new(), |mut acc, id| {
        *acc.entry(id).or_insert(0usize) += 1;
        acc
    });

    // ascending id order, strict `>` keeps the first (lowest) of a tie
    counts
        .into_iter()
        .fold(None, |best: Option<(ClusterId, usize)>, (id, count)| match best {
            Some((_, top)) if count <= top => best,
            _ => Some((id, count)),
        })
        .map(|(id, _)| id)
}

/// Score `candidates` against `favorites` and sort ascending by distance.
///
/// Ties keep the order of `candidates`.
#[must_use]
pub fn rank_candidates<'a>(
    candidates: &[&'a Track],
    favorites: &[&Track],
) -> Vec<ScoredTrack<'a>> {
    let mut scored: Vec<ScoredTrack<'a>> = candidates
        .par_iter()
        .map(|&track| ScoredTrack {
            track,
            distance: favorites
                .iter()
                .map(|f| correlation_distance(&track.standardized, &f.standardized))
                .fold(MAX_DISTANCE, f64::min),
        })
        .collect();

    scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    scored
}

/// `1 - pearson(a, b)`, in `[0, 2]`.
///
/// Falls back to [`MAX_DISTANCE`] when either vector is constant, including
/// vectors whose entries are equal but leave rounding noise in the variance.
#[must_use]
pub fn correlation_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = FEATURE_COUNT as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if is_flat(var_a, a) || is_flat(var_b, b) {
        return MAX_DISTANCE;
    }
    let distance = 1.0 - cov / (var_a * var_b).sqrt();
    if distance.is_finite() {
        distance
    } else {
        MAX_DISTANCE
    }
}

/// Variance negligible relative to the vector's magnitude.
fn is_flat(variance: f64, vector: &FeatureVector) -> bool {
    let magnitude: f64 = vector.iter().map(|x| x * x).sum();
    variance <= f64::EPSILON * magnitude
}
