//! Track catalog: loading, feature preparation and cluster assignment.
//!
//! The catalog is built once at startup and is read-only afterwards, so it
//! can be shared by reference between any number of concurrent searches and
//! recommendation calls.
//!
//! ## Preparation pipeline
//!
//! 1. Read raw records (CSV) in file order
//! 2. Drop duplicate `(name, artist)` pairs, first occurrence wins
//! 3. Normalize name and artist for matching
//! 4. Z-score each of the six feature columns over the whole catalog
//! 5. Scale every standardized row to unit length
//! 6. Ask the [`ClusterModel`] for one label per row

use crate::cluster::{ClusterId, ClusterModel};
use crate::normalize::normalize_opt;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

/// Number of numeric features per track.
pub const FEATURE_COUNT: usize = 6;

/// Fixed-order feature vector: popularity, danceability, loudness,
/// acousticness, valence, tempo.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Catalog column names of the features, in vector order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "popularity",
    "danceability",
    "loudness",
    "acousticness",
    "valence",
    "tempo",
];

/// One row of the catalog file before any preparation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTrack {
    #[serde(rename = "track_name", default)]
    pub name: Option<String>,
    #[serde(rename = "artists", default)]
    pub artist: Option<String>,
    #[serde(rename = "track_genre", default)]
    pub genre: Option<String>,
    pub popularity: f64,
    pub danceability: f64,
    pub loudness: f64,
    pub acousticness: f64,
    pub valence: f64,
    pub tempo: f64,
}

impl RawTrack {
    /// Convenience constructor used by tests and benchmarks.
    #[must_use]
    pub fn new(name: &str, artist: &str, genre: &str, features: FeatureVector) -> Self {
        let [popularity, danceability, loudness, acousticness, valence, tempo] = features;
        Self {
            name: Some(name.to_string()),
            artist: Some(artist.to_string()),
            genre: Some(genre.to_string()),
            popularity,
            danceability,
            loudness,
            acousticness,
            valence,
            tempo,
        }
    }

    #[must_use]
    pub fn features(&self) -> FeatureVector {
        [
            self.popularity,
            self.danceability,
            self.loudness,
            self.acousticness,
            self.valence,
            self.tempo,
        ]
    }

    fn key(&self) -> (String, String) {
        (
            self.name.clone().unwrap_or_default(),
            self.artist.clone().unwrap_or_default(),
        )
    }
}

/// A prepared, immutable catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub artist: String,
    pub genre: String,
    pub raw_features: FeatureVector,
    pub normalized_name: String,
    pub normalized_artist: String,
    /// Z-scored against the catalog, then scaled to unit length.
    pub standardized: FeatureVector,
    pub cluster_id: ClusterId,
    /// Position in catalog order; the tie-break for search and ranking.
    pub position: usize,
}

/// Deduplicated, prepared track catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    tracks: Vec<Track>,
    index: HashMap<(String, String), usize>,
}

impl CatalogStore {
    /// Read the catalog CSV at `path` and prepare it with `model`.
    ///
    /// # Errors
    ///
    /// Any failure here is a startup failure: missing file, missing
    /// required column, unparsable feature value, or a model that cannot
    /// label the catalog.
    pub fn load(path: &Path, model: &dyn ClusterModel) -> Result<Self> {
        info!("Loading catalog from {}", path.display());
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open catalog file at {}", path.display()))?;
        let records = read_records(file)
            .with_context(|| format!("Failed to parse catalog file at {}", path.display()))?;
        Self::build(records, model)
    }

    /// Prepare raw records into a catalog.
    ///
    /// # Errors
    ///
    /// Fails when the clustering model errors or returns a label count
    /// that does not match the number of tracks.
    pub fn build(records: Vec<RawTrack>, model: &dyn ClusterModel) -> Result<Self> {
        let total = records.len();
        let records = dedup_records(records);
        if records.len() < total {
            debug!("Dropped {} duplicate catalog rows", total - records.len());
        }

        let raw: Vec<FeatureVector> = records.iter().map(RawTrack::features).collect();
        let mut prepared = standardize(&raw);
        prepared.par_iter_mut().for_each(l2_normalize);

        let labels = model
            .predict(&prepared)
            .context("Clustering model failed to label the catalog")?;
        if labels.len() != records.len() {
            bail!(
                "Clustering model returned {} labels for {} tracks",
                labels.len(),
                records.len()
            );
        }

        let tracks: Vec<Track> = records
            .into_par_iter()
            .zip(raw)
            .zip(prepared)
            .zip(labels)
            .enumerate()
            .map(|(position, (((record, raw_features), standardized), cluster_id))| Track {
                normalized_name: normalize_opt(record.name.as_deref()),
                normalized_artist: normalize_opt(record.artist.as_deref()),
                name: record.name.unwrap_or_default(),
                artist: record.artist.unwrap_or_default(),
                genre: record.genre.unwrap_or_default(),
                raw_features,
                standardized,
                cluster_id,
                position,
            })
            .collect();

        let index = tracks
            .iter()
            .map(|t| ((t.name.clone(), t.artist.clone()), t.position))
            .collect();

        let store = Self { tracks, index };
        info!(
            "Catalog ready: {} tracks in {} clusters",
            store.len(),
            store.cluster_sizes().len()
        );
        Ok(store)
    }

    /// All tracks in catalog order.
    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Exact lookup by `(name, artist)`.
    #[must_use]
    pub fn find(&self, name: &str, artist: &str) -> Option<&Track> {
        self.index
            .get(&(name.to_string(), artist.to_string()))
            .map(|&idx| &self.tracks[idx])
    }

    /// Tracks whose cluster is `cluster`, in catalog order.
    pub fn in_cluster(&self, cluster: ClusterId) -> impl Iterator<Item = &Track> + '_ {
        self.tracks.iter().filter(move |t| t.cluster_id == cluster)
    }

    /// Track count per cluster id, ascending by id.
    #[must_use]
    pub fn cluster_sizes(&self) -> BTreeMap<ClusterId, usize> {
        self.tracks.iter().fold(BTreeMap::new(), |mut sizes, t| {
            *sizes.entry(t.cluster_id).or_insert(0) += 1;
            sizes
        })
    }
}

/// Parse catalog records from CSV with a header row.
///
/// # Errors
///
/// Fails on the first malformed row, naming its 1-based data row number.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<RawTrack>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<RawTrack>()
        .enumerate()
        .map(|(idx, row)| row.with_context(|| format!("Invalid catalog row {}", idx + 1)))
        .collect()
}

/// Keep the first record of every `(name, artist)` pair, preserving order.
#[must_use]
pub fn dedup_records(records: Vec<RawTrack>) -> Vec<RawTrack> {
    let mut seen = HashSet::with_capacity(records.len());
    records.into_iter().filter(|r| seen.insert(r.key())).collect()
}

/// Z-score every column against the population mean and standard deviation.
///
/// A column with zero variance standardizes to 0 for every row.
#[must_use]
pub fn standardize(matrix: &[FeatureVector]) -> Vec<FeatureVector> {
    if matrix.is_empty() {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let n = matrix.len() as f64;
    let mut mean = [0.0; FEATURE_COUNT];
    let mut std = [0.0; FEATURE_COUNT];

    for col in 0..FEATURE_COUNT {
        let first = matrix[0][col];
        if matrix.iter().all(|row| row[col] == first) {
            warn!("Feature column `{}' has zero variance", FEATURE_COLUMNS[col]);
            continue;
        }
        mean[col] = matrix.iter().map(|row| row[col]).sum::<f64>() / n;
        let variance = matrix
            .iter()
            .map(|row| (row[col] - mean[col]).powi(2))
            .sum::<f64>()
            / n;
        std[col] = variance.sqrt();
    }

    matrix
        .iter()
        .map(|row| {
            let mut out = [0.0; FEATURE_COUNT];
            for col in 0..FEATURE_COUNT {
                if std[col] > 0.0 {
                    out[col] = (row[col] - mean[col]) / std[col];
                }
            }
            out
        })
        .collect()
}

/// Scale `vector` to unit Euclidean length. The zero vector is left alone.
pub fn l2_normalize(vector: &mut FeatureVector) {
    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}
