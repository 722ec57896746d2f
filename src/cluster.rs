//! Clustering capability consumed by the catalog.
//!
//! The catalog never fits or validates clusters itself. It hands the whole
//! prepared feature matrix to a [`ClusterModel`] once at startup and stores
//! whatever labels come back.

use crate::catalog::{FeatureVector, FEATURE_COUNT};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Discrete cluster label assigned to a track.
pub type ClusterId = u32;

/// A frozen, pre-fit clustering model.
///
/// Implementations must be deterministic: the same matrix always yields the
/// same labels, one per row, in row order.
pub trait ClusterModel: Send + Sync {
    /// Assign a cluster id to every row of `matrix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot label the input.
    fn predict(&self, matrix: &[FeatureVector]) -> Result<Vec<ClusterId>>;
}

/// Nearest-centroid model loaded from a k-means artifact.
///
/// The artifact is JSON of the form `{"centroids": [[f64; 6], ...]}`. A row
/// belongs to the centroid with the smallest squared Euclidean distance;
/// ties go to the lowest centroid index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidModel {
    centroids: Vec<Vec<f64>>,
}

impl CentroidModel {
    /// Build a model from in-memory centroids.
    ///
    /// # Errors
    ///
    /// Fails when there are no centroids or any centroid does not have
    /// exactly six coordinates.
    pub fn new(centroids: Vec<Vec<f64>>) -> Result<Self> {
        if centroids.is_empty() {
            bail!("Clustering artifact contains no centroids");
        }
        if let Some((idx, bad)) = centroids
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != FEATURE_COUNT)
        {
            bail!(
                "Centroid {idx} has {} coordinates, expected {FEATURE_COUNT}",
                bad.len()
            );
        }
        Ok(Self { centroids })
    }

    /// Load the frozen artifact from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, is not valid JSON, or holds malformed
    /// centroids. Callers treat this as fatal at startup.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read clustering artifact at {}", path.display()))?;
        let parsed: CentroidModel = serde_json::from_str(&raw)
            .with_context(|| {
                format!("Clustering artifact at {} is not valid JSON", path.display())
            })?;
        let model = Self::new(parsed.centroids)
            .with_context(|| format!("Clustering artifact at {} is malformed", path.display()))?;
        info!("Loaded clustering artifact with {} centroids", model.len());
        Ok(model)
    }

    /// Number of clusters in the model.
    #[must_use]
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    fn nearest(&self, row: &FeatureVector) -> ClusterId {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (idx, centroid) in self.centroids.iter().enumerate() {
            let dist: f64 = row
                .iter()
                .zip(centroid)
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            // strict `<` keeps the lowest index on ties
            if dist < best_dist {
                best = idx;
                best_dist = dist;
            }
        }
        best as ClusterId
    }
}

impl ClusterModel for CentroidModel {
    fn predict(&self, matrix: &[FeatureVector]) -> Result<Vec<ClusterId>> {
        debug!("Predicting clusters for {} rows", matrix.len());
        Ok(matrix.iter().map(|row| self.nearest(row)).collect())
    }
}

/// A model that returns preset labels, for wiring known cluster layouts.
#[derive(Debug, Clone)]
pub struct FixedLabels(pub Vec<ClusterId>);

impl ClusterModel for FixedLabels {
    fn predict(&self, matrix: &[FeatureVector]) -> Result<Vec<ClusterId>> {
        if matrix.len() != self.0.len() {
            bail!(
                "Fixed label model has {} labels for {} rows",
                self.0.len(),
                matrix.len()
            );
        }
        Ok(self.0.clone())
    }
}
