//! The user's favorites: an ordered set of `(track, artist)` pairs.
//!
//! [`FavoritesSet`] is the plain collection. [`SharedFavorites`] puts it
//! behind a lock so mutations are exclusive and readers get a consistent
//! snapshot, optionally persisting every mutation through [`FavoritesFile`].

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Rejected input when building a favorite.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing track name")]
    MissingTrack,

    #[error("Missing artist")]
    MissingArtist,
}

/// A favorited track, identified by exact name and artist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(rename = "track")]
    pub name: String,
    pub artist: String,
}

impl FavoriteEntry {
    /// Build an entry from user input.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when either field is empty or only
    /// whitespace.
    pub fn new(
        name: impl Into<String>,
        artist: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let (name, artist) = (name.into(), artist.into());
        if name.trim().is_empty() {
            return Err(ValidationError::MissingTrack);
        }
        if artist.trim().is_empty() {
            return Err(ValidationError::MissingArtist);
        }
        Ok(Self { name, artist })
    }

    #[must_use]
    pub fn matches(&self, name: &str, artist: &str) -> bool {
        self.name == name && self.artist == artist
    }
}

/// What [`FavoritesSet::add`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// Insertion-ordered favorites without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoritesSet {
    entries: Vec<FavoriteEntry>,
}

impl FavoritesSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` unless the same pair is already present.
    pub fn add(&mut self, entry: FavoriteEntry) -> AddOutcome {
        if self.contains(&entry.name, &entry.artist) {
            return AddOutcome::AlreadyPresent;
        }
        self.entries.push(entry);
        AddOutcome::Added
    }

    /// Remove every entry matching the pair. Returns how many were removed.
    pub fn remove(&mut self, name: &str, artist: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.matches(name, artist));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn contains(&self, name: &str, artist: &str) -> bool {
        self.entries.iter().any(|e| e.matches(name, artist))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteEntry> {
        self.entries.iter()
    }
}

impl FromIterator<FavoriteEntry> for FavoritesSet {
    fn from_iter<I: IntoIterator<Item = FavoriteEntry>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.add(entry);
        }
        set
    }
}

/// CSV persistence with a `track,artist` header and full-overwrite writes.
pub struct FavoritesFile;

impl FavoritesFile {
    /// Read favorites from `path`. A missing file is an empty set.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<FavoritesSet> {
        if !path.exists() {
            debug!("No favorites file at {}, starting empty", path.display());
            return Ok(FavoritesSet::new());
        }

        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open favorites file at {}", path.display()))?;
        let entries = reader
            .deserialize::<FavoriteEntry>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to parse favorites file at {}", path.display()))?;

        let set: FavoritesSet = entries.into_iter().collect();
        info!("Loaded {} favorites from {}", set.len(), path.display());
        Ok(set)
    }

    /// Overwrite `path` with the whole set.
    ///
    /// Writes go to a temporary file in the same directory which then
    /// replaces the target, so a crash never leaves a half-written file.
    ///
    /// # Errors
    ///
    /// Fails if the directory is not writable or the rename fails.
    pub fn save(path: &Path, favorites: &FavoritesSet) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create favorites directory {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(["track", "artist"])?;
            for entry in favorites.iter() {
                writer.write_record([&entry.name, &entry.artist])?;
            }
            writer.flush()?;
        }
        tmp.as_file_mut().flush()?;
        tmp.persist(path)
            .with_context(|| format!("Failed to write favorites file at {}", path.display()))?;

        debug!("Saved {} favorites to {}", favorites.len(), path.display());
        Ok(())
    }
}

/// Favorites shared between mutating callers and the recommendation engine.
///
/// Mutations hold the write lock for their whole duration, including the
/// file write when a path is attached.
#[derive(Debug, Default)]
pub struct SharedFavorites {
    inner: RwLock<FavoritesSet>,
    path: Option<PathBuf>,
}

impl SharedFavorites {
    /// In-memory only.
    #[must_use]
    pub fn new(favorites: FavoritesSet) -> Self {
        Self {
            inner: RwLock::new(favorites),
            path: None,
        }
    }

    /// Load from `path` and persist every later mutation back to it.
    ///
    /// # Errors
    ///
    /// Fails if an existing favorites file cannot be parsed.
    pub fn open(path: PathBuf) -> Result<Self> {
        let favorites = FavoritesFile::load(&path)?;
        Ok(Self {
            inner: RwLock::new(favorites),
            path: Some(path),
        })
    }

    /// Add a favorite.
    ///
    /// # Errors
    ///
    /// Fails only when persisting the new state fails.
    pub fn add(&self, entry: FavoriteEntry) -> Result<AddOutcome> {
        self.mutate(|set| set.add(entry))
    }

    /// Remove a favorite; absent pairs are a no-op.
    ///
    /// # Errors
    ///
    /// Fails only when persisting the new state fails.
    pub fn remove(&self, name: &str, artist: &str) -> Result<usize> {
        self.mutate(|set| set.remove(name, artist))
    }

    /// # Errors
    ///
    /// Fails only when persisting the new state fails.
    pub fn clear(&self) -> Result<()> {
        self.mutate(FavoritesSet::clear)
    }

    /// A consistent copy of the current favorites.
    #[must_use]
    pub fn snapshot(&self) -> FavoritesSet {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Apply `f` to a copy, persist it, then publish it. A failed save
    /// leaves the in-memory set untouched.
    fn mutate<T>(&self, f: impl FnOnce(&mut FavoritesSet) -> T) -> Result<T> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        let result = f(&mut next);
        if let Some(path) = &self.path {
            FavoritesFile::save(path, &next)?;
        }
        *guard = next;
        Ok(result)
    }
}
