//! # Cadence
//!
//! Search a track catalog and get recommendations from your favorites.
//!
//! ## Usage
//!
//! ```bash
//! cadence search "queen"
//! cadence favorites add "Don't Stop Me Now" "Queen"
//! cadence recommend
//! ```

use anyhow::Result;
use cadence::catalog::{CatalogStore, Track};
use cadence::cli::{self, FavoritesAction};
use cadence::cluster::CentroidModel;
use cadence::completion;
use cadence::config::RuntimeConfig;
use cadence::favorites::{AddOutcome, FavoriteEntry, SharedFavorites};
use cadence::recommend::{Recommendation, RecommendationEngine};
use cadence::search::SearchIndex;
use clap::{CommandFactory, Parser};
use log::{debug, info};

/// Load the clustering artifact and the catalog. Both are fatal if missing.
fn load_catalog(config: &RuntimeConfig) -> Result<CatalogStore> {
    let model = CentroidModel::from_path(&config.model_path).map_err(|e| {
        eprintln!("Could not load the clustering artifact.");
        eprintln!("  Expected it at {}", config.model_path.display());
        eprintln!("  Use --model or CADENCE_MODEL to point at another file.");
        e
    })?;
    CatalogStore::load(&config.catalog_path, &model).map_err(|e| {
        eprintln!("Could not load the track catalog.");
        eprintln!("  Expected it at {}", config.catalog_path.display());
        eprintln!("  Use --catalog or CADENCE_CATALOG to point at another file.");
        e
    })
}

fn print_track(index: usize, track: &Track) {
    println!("  {}. {} - {} ({})", index + 1, track.name, track.artist, track.genre);
}

/// Main entry point.
///
/// Logging is controlled through `RUST_LOG`, e.g.
/// `RUST_LOG=cadence=debug cadence recommend`.
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    let config = RuntimeConfig::load(args.config.as_deref())?.with_overrides(
        args.catalog,
        args.model,
        args.favorites,
    )?;
    debug!("Effective configuration: {config:?}");

    match args.command {
        cli::Command::Search { query, limit } => {
            let catalog = load_catalog(&config)?;
            let limit = limit.unwrap_or(config.search_limit);
            let results = SearchIndex::new(&catalog).search(&query, limit);
            if results.is_empty() {
                println!("No matches");
            }
            for (i, track) in results.iter().enumerate() {
                print_track(i, track);
            }
        }
        cli::Command::Recommend { top_k, verbose } => {
            let catalog = load_catalog(&config)?;
            let favorites = SharedFavorites::open(config.favorites_path.clone())?;
            let engine = RecommendationEngine::new(&catalog);

            match engine.recommend_shared(&favorites, top_k.unwrap_or(config.top_k)) {
                Recommendation::NoFavorites => {
                    println!(
                        "No favorites yet. Add some with `cadence favorites add <TRACK> <ARTIST>`."
                    );
                }
                Recommendation::NoMatch => {
                    println!("Could not find your songs in the catalog");
                }
                Recommendation::Ranked(scored) => {
                    info!("Recommending {} tracks", scored.len());
                    for (i, s) in scored.iter().enumerate() {
                        print_track(i, s.track);
                        if verbose {
                            println!(
                                "     distance: {:.4}, cluster: {}",
                                s.distance, s.track.cluster_id
                            );
                        }
                    }
                }
            }
        }
        cli::Command::Favorites { action } => {
            let favorites = SharedFavorites::open(config.favorites_path.clone())?;
            match action {
                FavoritesAction::Add { track, artist } => {
                    let entry = FavoriteEntry::new(track, artist)?;
                    match favorites.add(entry.clone())? {
                        AddOutcome::Added => println!("Added {} - {}", entry.name, entry.artist),
                        AddOutcome::AlreadyPresent => {
                            println!("{} - {} is already in favorites", entry.name, entry.artist);
                        }
                    }
                }
                FavoritesAction::Remove { track, artist } => {
                    if favorites.remove(&track, &artist)? == 0 {
                        println!("{track} - {artist} was not in favorites");
                    } else {
                        println!("Removed {track} - {artist}");
                    }
                }
                FavoritesAction::Clear => {
                    favorites.clear()?;
                    println!("Favorites cleared");
                }
                FavoritesAction::List => {
                    let snapshot = favorites.snapshot();
                    if snapshot.is_empty() {
                        println!("No favorites yet");
                    }
                    for (i, entry) in snapshot.iter().enumerate() {
                        println!("  {}. {} - {}", i + 1, entry.name, entry.artist);
                    }
                }
            }
        }
        cli::Command::Clusters => {
            let catalog = load_catalog(&config)?;
            for (cluster, size) in catalog.cluster_sizes() {
                println!("  cluster {cluster}: {size} tracks");
            }
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(shell);
            completion::generate_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
