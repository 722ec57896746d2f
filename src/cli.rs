//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `cadence` binary.
//!
//! ## Commands
//!
//! - `search`: Find tracks by name or artist
//! - `recommend`: Suggest tracks similar to your favorites
//! - `favorites`: Add, remove, clear or list favorites
//! - `clusters`: Show how the catalog is partitioned
//! - `completion`: Generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! cadence search "don't stop"
//! cadence favorites add "Don't Stop Me Now" "Queen"
//! cadence recommend --top-k 5 --verbose
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Global path options override `config.json`; each can also be set
/// through its `CADENCE_*` environment variable.
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Catalog search and cluster-based track recommendations from your favorites")]
#[command(version)]
pub struct Args {
    /// JSON configuration file
    #[arg(long, global = true, env = "CADENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Track catalog CSV
    #[arg(long, global = true, env = "CADENCE_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Frozen clustering artifact (JSON centroids)
    #[arg(long, global = true, env = "CADENCE_MODEL")]
    pub model: Option<PathBuf>,

    /// Favorites CSV
    #[arg(long, global = true, env = "CADENCE_FAVORITES")]
    pub favorites: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the catalog by track name or artist
    ///
    /// Matching ignores case and punctuation. Queries shorter than two
    /// characters after normalization return nothing.
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Recommend tracks based on your favorites
    ///
    /// Candidates come from the cluster most of your favorites belong to,
    /// ranked by how closely their features correlate with a favorite.
    Recommend {
        /// Number of recommendations (defaults to the configured value)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Show the correlation distance of each recommendation
        #[arg(short, long)]
        verbose: bool,
    },

    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Show the number of tracks in each cluster
    Clusters,

    /// Generate shell completions
    ///
    /// Usage: cadence completion bash > ~/.local/share/bash-completion/completions/cadence
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Favorites management actions
#[derive(Subcommand, Debug)]
pub enum FavoritesAction {
    /// Add a track to favorites
    Add {
        /// Exact track name as it appears in the catalog
        track: String,
        /// Exact artist as it appears in the catalog
        artist: String,
    },

    /// Remove a track from favorites
    Remove {
        track: String,
        artist: String,
    },

    /// Remove every favorite
    Clear,

    /// List favorites in the order they were added
    List,
}
