//! Memory-bounded spatial-attribute matching
//!
//! A blocking join: both sides carry a normalized address key, the join is
//! restricted to rows sharing a key, and each joined pair is validated by
//! geometric distance. Ubiquitous keys ("hauptstrasse1" exists in hundreds
//! of towns) never materialize a cross product because the map side is
//! indexed by key and probed per authoritative chunk.

use std::collections::HashMap;

use geo::{EuclideanDistance, Point};
use tracing::debug;

/// Maximum distance between an authoritative centroid and a map node for
/// the same address, in units of the (metric) working CRS. Accounts for the
/// systematic offset between building centroids and mapped entrance nodes.
pub const DEFAULT_MAX_DISTANCE: f64 = 150.0;

/// Default authoritative chunk size. A resource knob, not a correctness
/// parameter.
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub chunk_size: usize,
    pub max_distance: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// One record prepared for matching: normalized key plus a point in a
/// metric CRS. Both sides must share the same CRS.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub key: String,
    pub point: Point<f64>,
}

impl MatchCandidate {
    pub fn new(key: impl Into<String>, point: Point<f64>) -> Self {
        Self {
            key: key.into(),
            point,
        }
    }

    fn has_valid_point(&self) -> bool {
        self.point.x().is_finite() && self.point.y().is_finite()
    }
}

/// Computes, for every authoritative candidate, whether at least one map
/// candidate shares its key within the distance tolerance.
///
/// At-least-one semantics: one map record may cover several authoritative
/// records and vice versa; each authoritative record is still counted once.
/// Candidates with non-finite coordinates never match.
pub fn match_found(
    alkis: &[MatchCandidate],
    osm: &[MatchCandidate],
    config: &MatchConfig,
) -> Vec<bool> {
    // Inverted index over the map side, built once
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, candidate) in osm.iter().enumerate() {
        if candidate.has_valid_point() {
            index.entry(candidate.key.as_str()).or_default().push(i);
        }
    }
    debug!(
        alkis = alkis.len(),
        osm = osm.len(),
        keys = index.len(),
        "matching"
    );

    let chunk_size = config.chunk_size.max(1);
    let mut found = vec![false; alkis.len()];

    for (chunk_no, chunk) in alkis.chunks(chunk_size).enumerate() {
        let base = chunk_no * chunk_size;
        let mut chunk_found = 0usize;
        for (offset, record) in chunk.iter().enumerate() {
            if !record.has_valid_point() {
                continue;
            }
            let Some(candidates) = index.get(record.key.as_str()) else {
                continue;
            };
            for &j in candidates {
                if record.point.euclidean_distance(&osm[j].point) < config.max_distance {
                    found[base + offset] = true;
                    chunk_found += 1;
                    break;
                }
            }
        }
        debug!(chunk = chunk_no, records = chunk.len(), found = chunk_found, "chunk matched");
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(key: &str, x: f64, y: f64) -> MatchCandidate {
        MatchCandidate::new(key, Point::new(x, y))
    }

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn test_match_within_tolerance() {
        let alkis = vec![cand("hauptstrasse1", 500_000.0, 5_800_000.0)];
        let osm = vec![cand("hauptstrasse1", 500_010.0, 5_800_000.0)];
        assert_eq!(match_found(&alkis, &osm, &config()), [true]);
    }

    #[test]
    fn test_same_key_too_far() {
        // Same address string in a different village, 500 m away
        let alkis = vec![cand("hauptstrasse1", 500_000.0, 5_800_000.0)];
        let osm = vec![cand("hauptstrasse1", 500_500.0, 5_800_000.0)];
        assert_eq!(match_found(&alkis, &osm, &config()), [false]);
    }

    #[test]
    fn test_key_mismatch_never_matches() {
        let alkis = vec![cand("hauptstrasse1", 500_000.0, 5_800_000.0)];
        let osm = vec![cand("hauptstrasse2", 500_000.0, 5_800_000.0)];
        assert_eq!(match_found(&alkis, &osm, &config()), [false]);
    }

    #[test]
    fn test_at_least_one_semantics() {
        // One map node covers two authoritative records, and one record
        // with several map candidates is still a single match
        let alkis = vec![
            cand("ring7", 500_000.0, 5_800_000.0),
            cand("ring7", 500_020.0, 5_800_000.0),
        ];
        let osm = vec![
            cand("ring7", 500_010.0, 5_800_000.0),
            cand("ring7", 500_011.0, 5_800_000.0),
        ];
        assert_eq!(match_found(&alkis, &osm, &config()), [true, true]);
    }

    #[test]
    fn test_chunking_does_not_change_results() {
        let alkis: Vec<MatchCandidate> = (0..100)
            .map(|i| cand(&format!("weg{}", i % 10), 500_000.0 + i as f64, 5_800_000.0))
            .collect();
        let osm: Vec<MatchCandidate> = (0..10)
            .map(|i| cand(&format!("weg{i}"), 500_000.0 + i as f64, 5_800_000.0))
            .collect();

        let whole = match_found(&alkis, &osm, &config());
        let chunked = match_found(
            &alkis,
            &osm,
            &MatchConfig {
                chunk_size: 7,
                max_distance: DEFAULT_MAX_DISTANCE,
            },
        );
        assert_eq!(whole, chunked);
    }

    #[test]
    fn test_invalid_points_filtered() {
        let alkis = vec![cand("weg1", f64::NAN, 5_800_000.0)];
        let osm = vec![cand("weg1", 500_000.0, 5_800_000.0)];
        assert_eq!(match_found(&alkis, &osm, &config()), [false]);

        let alkis = vec![cand("weg1", 500_000.0, 5_800_000.0)];
        let osm = vec![cand("weg1", f64::NAN, f64::NAN)];
        assert_eq!(match_found(&alkis, &osm, &config()), [false]);
    }

    #[test]
    fn test_empty_sides() {
        assert!(match_found(&[], &[], &config()).is_empty());
        let alkis = vec![cand("weg1", 500_000.0, 5_800_000.0)];
        assert_eq!(match_found(&alkis, &[], &config()), [false]);
    }
}
