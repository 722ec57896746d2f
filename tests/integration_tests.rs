//! # Integration Tests for Cadence
//!
//! End-to-end tests over the public API: catalog files on disk, the
//! clustering artifact, favorites persistence, search and recommendations.

use anyhow::Result;
use cadence::catalog::{CatalogStore, RawTrack, FEATURE_COUNT};
use cadence::cluster::{CentroidModel, FixedLabels};
use cadence::favorites::{FavoriteEntry, FavoritesFile, FavoritesSet, SharedFavorites};
use cadence::normalize::normalize;
use cadence::recommend::{Recommendation, RecommendationEngine, MAX_DISTANCE};
use cadence::search::SearchIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = concat!(
    "track_id,artists,album_name,track_name,popularity,",
    "danceability,loudness,acousticness,valence,tempo,track_genre"
);

/// Writes a small catalog and a two-centroid artifact into a temp dir.
fn create_test_files() -> Result<(TempDir, PathBuf, PathBuf)> {
    let dir = TempDir::new()?;
    let catalog_path = dir.path().join("dataset.csv");
    let model_path = dir.path().join("clusters.json");

    let rows = [
        "1,Queen,Jazz,Don't Stop Me Now,80,0.56,-5.3,0.05,0.61,156.3,rock",
        "2,Queen,A Night at the Opera,Bohemian Rhapsody,91,0.39,-9.9,0.29,0.23,71.1,rock",
        "3,Spice Girls,Spice,Stop,62,0.71,-6.2,0.17,0.92,132.4,pop",
        "4,Queen,Jazz,Don't Stop Me Now,12,0.10,-20.0,0.90,0.10,60.0,rock",
        "5,Juice Newton,Juice,Queen of Hearts,48,0.63,-8.1,0.41,0.83,108.9,country",
        "6,\"Crosby, Stills & Nash\",CSN,Helplessly Hoping,55,0.44,-14.2,0.88,0.35,96.0,folk",
    ];
    fs::write(&catalog_path, format!("{HEADER}\n{}\n", rows.join("\n")))?;
    fs::write(
        &model_path,
        r#"{"centroids": [[0.5, 0.0, 0.5, -0.5, 0.0, 0.5], [-0.5, 0.0, -0.5, 0.5, 0.0, -0.5]]}"#,
    )?;

    Ok((dir, catalog_path, model_path))
}

/// Five tracks, clusters A=0 (tracks 0, 1, 3) and B=1 (tracks 2, 4).
fn five_track_catalog() -> Result<CatalogStore> {
    let records = vec![
        RawTrack::new("Alpha", "Ann", "pop", [70.0, 0.8, -5.0, 0.1, 0.7, 120.0]),
        RawTrack::new("Bravo", "Bob", "pop", [65.0, 0.7, -6.0, 0.2, 0.6, 118.0]),
        RawTrack::new("Charlie", "Cat", "metal", [30.0, 0.3, -3.0, 0.0, 0.2, 180.0]),
        RawTrack::new("Delta", "Dan", "pop", [55.0, 0.6, -8.0, 0.4, 0.9, 100.0]),
        RawTrack::new("Echo", "Eve", "metal", [25.0, 0.2, -2.0, 0.05, 0.1, 190.0]),
    ];
    CatalogStore::build(records, &FixedLabels(vec![0, 0, 1, 0, 1]))
}

/// Deterministic synthetic catalog with `clusters` labels assigned round-robin.
fn synthetic_catalog(size: usize, clusters: u32, seed: u64) -> Result<CatalogStore> {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..size)
        .map(|i| {
            let features: [f64; FEATURE_COUNT] = [
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(-30.0..0.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(60.0..200.0),
            ];
            RawTrack::new(&format!("Song {i}"), &format!("Artist {}", i % 7), "genre", features)
        })
        .collect();
    let labels = (0..size as u32).map(|i| i % clusters).collect();
    CatalogStore::build(records, &FixedLabels(labels))
}

fn favorites_of(pairs: &[(&str, &str)]) -> FavoritesSet {
    pairs
        .iter()
        .map(|(name, artist)| FavoriteEntry::new(*name, *artist).unwrap())
        .collect()
}

#[cfg(test)]
mod catalog_tests {
    use super::*;

    #[test]
    fn test_load_from_files_dedups_and_clusters() -> Result<()> {
        let (_dir, catalog_path, model_path) = create_test_files()?;
        let model = CentroidModel::from_path(&model_path)?;
        let catalog = CatalogStore::load(&catalog_path, &model)?;

        assert_eq!(catalog.len(), 5, "duplicate (name, artist) row must be dropped");
        let kept = catalog.find("Don't Stop Me Now", "Queen").expect("first occurrence kept");
        assert_eq!(kept.raw_features[0], 80.0);
        assert!(catalog.find("Helplessly Hoping", "Crosby, Stills & Nash").is_some());
        assert!(catalog.tracks().iter().all(|t| t.cluster_id < 2));
        Ok(())
    }

    #[test]
    fn test_missing_catalog_is_fatal() -> Result<()> {
        let (dir, _catalog_path, model_path) = create_test_files()?;
        let model = CentroidModel::from_path(&model_path)?;
        assert!(CatalogStore::load(&dir.path().join("missing.csv"), &model).is_err());
        Ok(())
    }

    #[test]
    fn test_corrupt_model_is_fatal() -> Result<()> {
        let (_dir, _catalog_path, model_path) = create_test_files()?;
        fs::write(&model_path, r#"{"centroids": [[1.0, 2.0]]}"#)?;
        assert!(CentroidModel::from_path(&model_path).is_err());
        Ok(())
    }

    #[test]
    fn test_zero_variance_column_standardizes_to_zero() -> Result<()> {
        let records = (0..4)
            .map(|i| {
                let x = f64::from(i);
                let features = [50.0, x, x * x, 1.0 - x, x / 3.0, 100.0 + x];
                RawTrack::new(&format!("T{i}"), "A", "g", features)
            })
            .collect();
        let catalog = CatalogStore::build(records, &FixedLabels(vec![0; 4]))?;
        for track in catalog.tracks() {
            assert_eq!(track.standardized[0], 0.0, "constant popularity must standardize to 0");
            assert!(track.standardized.iter().all(|x| x.is_finite()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;

    #[test]
    fn test_search_over_loaded_catalog() -> Result<()> {
        let (_dir, catalog_path, model_path) = create_test_files()?;
        let catalog = CatalogStore::load(&catalog_path, &CentroidModel::from_path(&model_path)?)?;
        let index = SearchIndex::new(&catalog);

        let names: Vec<&str> = index.search("Queen", 6).iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Don't Stop Me Now", "Bohemian Rhapsody", "Queen of Hearts"]);

        assert_eq!(index.search("crosby stills", 6).len(), 1);
        assert!(index.search("s", 6).is_empty());
        assert!(index.search("no such thing", 6).is_empty());
        Ok(())
    }

    #[test]
    fn test_search_properties_on_synthetic_catalog() -> Result<()> {
        let catalog = synthetic_catalog(300, 5, 7)?;
        let index = SearchIndex::new(&catalog);
        for query in ["song 1", "artist 3", "SONG", "12", "x"] {
            let needle = normalize(query);
            let results = index.search(query, 10);
            assert!(results.len() <= 10);
            for t in &results {
                assert!(
                    t.normalized_name.contains(&needle) || t.normalized_artist.contains(&needle)
                );
            }
            assert!(results.windows(2).all(|w| w[0].position < w[1].position), "catalog order");
        }
        Ok(())
    }
}

#[cfg(test)]
mod recommendation_tests {
    use super::*;

    #[test]
    fn test_single_favorite_restricts_to_its_cluster() -> Result<()> {
        let catalog = five_track_catalog()?;
        let engine = RecommendationEngine::new(&catalog);
        let favorites = favorites_of(&[("Alpha", "Ann")]);

        let tracks = engine.recommend(&favorites, 10).tracks();
        let mut names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();

        assert_eq!(names, vec!["Bravo", "Delta"]);
        assert!(tracks.iter().all(|t| t.cluster_id == 0));
        Ok(())
    }

    #[test]
    fn test_empty_favorites_reports_no_favorites() -> Result<()> {
        let catalog = five_track_catalog()?;
        let engine = RecommendationEngine::new(&catalog);
        assert_eq!(engine.recommend(&FavoritesSet::new(), 10), Recommendation::NoFavorites);
        Ok(())
    }

    #[test]
    fn test_unresolved_favorites_report_no_match() -> Result<()> {
        let catalog = five_track_catalog()?;
        let engine = RecommendationEngine::new(&catalog);
        // right name, wrong artist
        let favorites = favorites_of(&[("Alpha", "Bob"), ("Nowhere", "Nobody")]);
        assert_eq!(engine.recommend(&favorites, 10), Recommendation::NoMatch);
        Ok(())
    }

    #[test]
    fn test_majority_tie_picks_lowest_cluster() -> Result<()> {
        let records = (0..8)
            .map(|i| {
                let x = f64::from(i);
                let features = [
                    x * 10.0,
                    (x * 1.3).sin(),
                    -x,
                    (x * 0.7).cos(),
                    x % 3.0,
                    90.0 + x * x,
                ];
                RawTrack::new(&format!("T{i}"), "A", "g", features)
            })
            .collect();
        // clusters: 3 3 1 1 1 1 3 3
        let catalog = CatalogStore::build(records, &FixedLabels(vec![3, 3, 1, 1, 1, 1, 3, 3]))?;
        let engine = RecommendationEngine::new(&catalog);
        let favorites = favorites_of(&[("T0", "A"), ("T2", "A")]);

        let first = engine.recommend(&favorites, 10).tracks();
        assert!(!first.is_empty());
        assert!(first.iter().all(|t| t.cluster_id == 1), "tie between 1 and 3 must pick 1");

        for _ in 0..5 {
            assert_eq!(engine.recommend(&favorites, 10).tracks(), first, "must be deterministic");
        }
        Ok(())
    }

    #[test]
    fn test_skip_window_drops_as_many_as_resolved_favorites() -> Result<()> {
        let catalog = synthetic_catalog(12, 2, 11)?;
        let engine = RecommendationEngine::new(&catalog);
        // both in cluster 0, which holds six tracks
        let favorites = favorites_of(&[("Song 0", "Artist 0"), ("Song 2", "Artist 2")]);

        let tracks = engine.recommend(&favorites, 10).tracks();
        assert_eq!(tracks.len(), 4);
        assert!(tracks.iter().all(|t| !favorites.contains(&t.name, &t.artist)));
        Ok(())
    }

    #[test]
    fn test_skip_window_drops_closest_non_favorite() -> Result<()> {
        // "Mean" sits on every column mean, so it standardizes to the zero
        // vector and every candidate scores MAX_DISTANCE. Ranking then falls
        // back to catalog order and the skip drops "Lead", not the favorite.
        let base = [50.0, 10.0, -10.0, 20.0, 30.0, 120.0];
        let offsets = [
            ("Lead", [1.0, 2.0, -1.0, 4.0, 3.0, -2.0]),
            ("Mean", [0.0; FEATURE_COUNT]),
            ("Second", [-2.0, -1.0, 3.0, 1.0, -1.0, 4.0]),
            ("Third", [1.0, -1.0, -2.0, -5.0, -2.0, -2.0]),
        ];
        let records = offsets
            .iter()
            .map(|(name, offset)| {
                let mut features = base;
                for (f, o) in features.iter_mut().zip(offset) {
                    *f += o;
                }
                RawTrack::new(name, "A", "g", features)
            })
            .collect();
        let catalog = CatalogStore::build(records, &FixedLabels(vec![0; 4]))?;
        let engine = RecommendationEngine::new(&catalog);
        let favorites = favorites_of(&[("Mean", "A")]);

        let Recommendation::Ranked(scored) = engine.recommend(&favorites, 10) else {
            panic!("expected ranked recommendations");
        };
        let names: Vec<&str> = scored.iter().map(|s| s.track.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "Third"]);
        assert!(scored.iter().all(|s| s.distance == MAX_DISTANCE));
        Ok(())
    }

    #[test]
    fn test_never_returns_favorites_and_respects_top_k() -> Result<()> {
        let catalog = synthetic_catalog(500, 4, 42)?;
        let engine = RecommendationEngine::new(&catalog);
        let favorites = favorites_of(&[
            ("Song 0", "Artist 0"),
            ("Song 4", "Artist 4"),
            ("Song 8", "Artist 1"),
            ("Song 13", "Artist 6"),
            ("Song 999", "Artist 5"),
        ]);

        for top_k in [1, 5, 10, 50] {
            let result = engine.recommend(&favorites, top_k);
            let tracks = result.tracks();
            assert!(!tracks.is_empty());
            assert!(tracks.len() <= top_k);
            assert!(tracks.iter().all(|t| !favorites.contains(&t.name, &t.artist)));
            assert!(tracks.iter().all(|t| t.cluster_id == 0));

            if let Recommendation::Ranked(scored) = result {
                assert!(
                    scored.windows(2).all(|w| w[0].distance <= w[1].distance),
                    "ascending distance"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_recommendations_track_favorites_mutations() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("favorites.csv");
        let catalog = five_track_catalog()?;
        let engine = RecommendationEngine::new(&catalog);

        let shared = SharedFavorites::open(path.clone())?;
        assert_eq!(engine.recommend_shared(&shared, 10), Recommendation::NoFavorites);

        shared.add(FavoriteEntry::new("Charlie", "Cat")?)?;
        let tracks = engine.recommend_shared(&shared, 10).tracks();
        assert!(tracks.iter().all(|t| t.cluster_id == 1));

        // persisted state reloads to the same recommendations
        let reloaded = FavoritesFile::load(&path)?;
        assert_eq!(engine.recommend(&reloaded, 10).tracks(), tracks);

        shared.clear()?;
        assert_eq!(engine.recommend_shared(&shared, 10), Recommendation::NoFavorites);
        Ok(())
    }

    #[test]
    fn test_concurrent_reads_and_mutations() -> Result<()> {
        let catalog = synthetic_catalog(200, 3, 5)?;
        let engine = RecommendationEngine::new(&catalog);
        let shared = SharedFavorites::new(FavoritesSet::new());

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..50 {
                    let name = format!("Song {i}");
                    let artist = format!("Artist {}", i % 7);
                    shared.add(FavoriteEntry::new(name.clone(), artist.clone()).unwrap()).unwrap();
                    if i % 3 == 0 {
                        shared.remove(&name, &artist).unwrap();
                    }
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        let snapshot = shared.snapshot();
                        let tracks = engine.recommend(&snapshot, 10).tracks();
                        assert!(tracks.iter().all(|t| !snapshot.contains(&t.name, &t.artist)));
                    }
                });
            }
        });

        Ok(())
    }
}
