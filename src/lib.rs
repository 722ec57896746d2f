//! Catalog search and cluster-based track recommendations.
//!
//! Core modules:
//! - [`normalize`] - Text normalization for matching
//! - [`catalog`] - Track loading, feature preparation, cluster assignment
//! - [`cluster`] - Frozen clustering capability
//! - [`search`] - Substring search over the catalog
//! - [`favorites`] - Favorites set, shared store and CSV persistence
//! - [`recommend`] - Recommendation engine
//!
//! ### Supporting Modules
//!
//! - [`config`] - Data directory and runtime configuration
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use cadence::catalog::CatalogStore;
//! use cadence::cluster::CentroidModel;
//! use cadence::favorites::{FavoriteEntry, SharedFavorites};
//! use cadence::recommend::RecommendationEngine;
//! use cadence::search::SearchIndex;
//! use std::path::Path;
//!
//! let model = CentroidModel::from_path(Path::new("clusters.json"))?;
//! let catalog = CatalogStore::load(Path::new("dataset.csv"), &model)?;
//!
//! for track in SearchIndex::new(&catalog).search("queen", 6) {
//!     println!("{} - {}", track.name, track.artist);
//! }
//!
//! let favorites = SharedFavorites::open("favorites.csv".into())?;
//! favorites.add(FavoriteEntry::new("Don't Stop Me Now", "Queen")?)?;
//!
//! let engine = RecommendationEngine::new(&catalog);
//! for track in engine.recommend_shared(&favorites, 10).tracks() {
//!     println!("{} - {} ({})", track.name, track.artist, track.genre);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! [`catalog::CatalogStore`] is immutable after construction and can be
//! shared freely across threads. Favorites go through
//! [`favorites::SharedFavorites`], whose mutations are exclusive and whose
//! snapshots are consistent.
//!
//! ## Error Handling
//!
//! Fallible functions return `anyhow::Result`. A missing or corrupt catalog
//! or clustering artifact fails at startup. Unknown queries and unresolvable
//! favorites are not errors; they produce empty results.

pub mod catalog;
pub mod cli;
pub mod cluster;
pub mod completion;
pub mod config;
pub mod favorites;
pub mod normalize;
pub mod recommend;
pub mod search;
