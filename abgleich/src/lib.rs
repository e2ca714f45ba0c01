//! # abgleich
//!
//! Reconciliation engine for German address datasets: compares the
//! authoritative ALKIS cadastre against OSM, per state.
//!
//! ## Features
//!
//! - Deterministic address key normalization (abbreviations, ß, separators)
//! - Composite and range house-number expansion
//! - Provenance-tracked manual corrections with four match strategies
//! - Memory-bounded blocking join with geometric distance validation
//! - Per-district coverage statistics and retroactively adjusted history
//!
//! ## Usage
//!
//! ```rust,ignore
//! use abgleich::{apply_corrections, match_found, CrsKind, Normalizer};
//!
//! apply_corrections(&mut alkis, &rules, CrsKind::Geographic);
//! let normalizer = Normalizer::new();
//! let found = match_found(&alkis_candidates, &osm_candidates, &config);
//! ```

pub mod correction;
pub mod error;
pub mod expand;
pub mod history;
pub mod matcher;
pub mod normalize;
pub mod record;
pub mod stats;

pub use correction::{apply_corrections, load_corrections_lenient, CorrectionRule, CrsKind};
pub use error::AbgleichError;
pub use expand::Expander;
pub use history::{HistoryEntry, HistoryStore};
pub use matcher::{match_found, MatchCandidate, MatchConfig};
pub use normalize::Normalizer;
pub use record::{AddressRecord, IGNORED_TAG};
pub use stats::{aggregate, DistrictStats, GlobalStats};

/// Makes a district name safe for use as a file name.
///
/// Path separators and whitespace are replaced, everything else is kept so
/// the frontend can still derive the display name.
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '-',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    if slug.is_empty() {
        "unbekannt".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hannover"), "Hannover");
        assert_eq!(slugify("Region Hannover"), "Region_Hannover");
        assert_eq!(slugify("Alt/Neu"), "Alt-Neu");
        assert_eq!(slugify("  "), "unbekannt");
        assert_eq!(slugify("Bad Münder a.D."), "Bad_Münder_a.D.");
    }
}
