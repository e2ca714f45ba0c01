//! Manual correction rules applied to the authoritative dataset
//!
//! Corrections are collected through the submission frontend as a JSON
//! array per state. Each raw object is decided into a closed rule variant
//! at load time; matching is never re-interpreted per record.

use std::path::Path;

use geo::EuclideanDistance;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AbgleichError;
use crate::record::{AddressRecord, IGNORED_TAG};

/// Default provenance tag for rules without an explicit one
pub const DEFAULT_TAG: &str = "corrected";

/// Which kind of CRS the record coordinates are in when rules are applied;
/// picks the radius tolerance for reference-point disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsKind {
    /// Degrees (WGS84 inputs, applied before reprojection)
    Geographic,
    /// Metric units (UTM)
    Projected,
}

impl CrsKind {
    /// Maximum distance from the reference record for a candidate to count
    pub fn radius_tolerance(self) -> f64 {
        match self {
            // ~500 m at German latitudes
            CrsKind::Geographic => 0.005,
            CrsKind::Projected => 500.0,
        }
    }
}

/// One correction object as stored in `<state>_alkis_corrections.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCorrection {
    pub alkis_id: Option<String>,
    pub from_street: Option<String>,
    pub from_housenumber: Option<String>,
    pub replace_in_street: Option<String>,
    pub replace_with: Option<String>,
    pub city: Option<String>,
    pub to_street: Option<String>,
    pub to_housenumber: Option<String>,
    pub reference_alkis_id: Option<String>,
    pub tag: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub ignore: bool,
}

/// What a matched rule does to its records
#[derive(Debug, Clone)]
pub struct CorrectionAction {
    pub to_street: Option<String>,
    pub to_housenumber: Option<String>,
    pub ignore: bool,
    pub tag: String,
    pub comment: Option<String>,
}

/// Match strategy, decided once when the corrections file is loaded
#[derive(Debug, Clone)]
pub enum CorrectionRule {
    /// Exact match on the stable identifier; other filters are ignored
    ById {
        alkis_id: String,
        action: CorrectionAction,
    },
    /// Exact street (+ optional house number, city), optionally narrowed to
    /// candidates near a known-correct reference record
    ByAddress {
        street: String,
        housenumber: Option<String>,
        city: Option<String>,
        reference_alkis_id: Option<String>,
        action: CorrectionAction,
    },
    /// Substring replacement inside the street name
    ReplaceInStreet {
        pattern: String,
        replace_with: String,
        city: Option<String>,
        action: CorrectionAction,
    },
}

impl CorrectionRule {
    /// Decides the match strategy for a raw correction object. Returns
    /// `None` (with a warning) when no usable selector is present.
    pub fn from_raw(raw: RawCorrection) -> Option<Self> {
        let action = CorrectionAction {
            to_street: raw.to_street,
            to_housenumber: raw.to_housenumber,
            ignore: raw.ignore,
            tag: raw.tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
            comment: raw.comment,
        };

        if let Some(alkis_id) = raw.alkis_id {
            return Some(Self::ById { alkis_id, action });
        }
        if let Some(pattern) = raw.replace_in_street {
            let Some(replace_with) = raw.replace_with else {
                warn!(%pattern, "correction with replace_in_street but no replace_with, skipping");
                return None;
            };
            return Some(Self::ReplaceInStreet {
                pattern,
                replace_with,
                city: raw.city,
                action,
            });
        }
        if let Some(street) = raw.from_street {
            return Some(Self::ByAddress {
                street,
                housenumber: raw.from_housenumber,
                city: raw.city,
                reference_alkis_id: raw.reference_alkis_id,
                action,
            });
        }
        warn!("correction without alkis_id, from_street or replace_in_street, skipping");
        None
    }
}

/// Loads a corrections file, strict variant
pub fn load_corrections(path: &Path) -> Result<Vec<CorrectionRule>, AbgleichError> {
    let content = std::fs::read_to_string(path)?;
    let raw: Vec<RawCorrection> = serde_json::from_str(&content).map_err(|e| {
        AbgleichError::invalid_corrections(path.display().to_string(), e.to_string())
    })?;
    Ok(raw.into_iter().filter_map(CorrectionRule::from_raw).collect())
}

/// Loads a corrections file, treating a missing or malformed file as an
/// empty rule set. A malformed file is logged, a missing one is normal.
pub fn load_corrections_lenient(path: &Path) -> Vec<CorrectionRule> {
    if !path.exists() {
        debug!(path = %path.display(), "no corrections file");
        return Vec::new();
    }
    match load_corrections(path) {
        Ok(rules) => {
            debug!(path = %path.display(), rules = rules.len(), "loaded corrections");
            rules
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable corrections file, applying none");
            Vec::new()
        }
    }
}

/// Applies all rules in file order. Later rules can match records already
/// touched by earlier rules; a rule matching zero records is a silent
/// no-op.
pub fn apply_corrections(records: &mut [AddressRecord], rules: &[CorrectionRule], crs: CrsKind) {
    for rule in rules {
        let matched = matching_indices(records, rule, crs);
        if matched.is_empty() {
            debug!(?rule, "correction rule matched no records");
            continue;
        }
        for idx in matched {
            apply_to_record(&mut records[idx], rule);
        }
    }
}

fn matching_indices(records: &[AddressRecord], rule: &CorrectionRule, crs: CrsKind) -> Vec<usize> {
    match rule {
        CorrectionRule::ById { alkis_id, .. } => records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.alkis_id.as_deref() == Some(alkis_id))
            .map(|(i, _)| i)
            .collect(),
        CorrectionRule::ByAddress {
            street,
            housenumber,
            city,
            reference_alkis_id,
            ..
        } => {
            let mut indices: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| {
                    r.street == *street
                        && housenumber.as_ref().map_or(true, |h| r.housenumber == *h)
                        && city_matches(r, city)
                })
                .map(|(i, _)| i)
                .collect();
            if let Some(reference_id) = reference_alkis_id {
                indices = filter_by_reference(records, indices, reference_id, crs);
            }
            indices
        }
        CorrectionRule::ReplaceInStreet { pattern, city, .. } => records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.street.contains(pattern.as_str()) && city_matches(r, city))
            .map(|(i, _)| i)
            .collect(),
    }
}

fn city_matches(record: &AddressRecord, city: &Option<String>) -> bool {
    match city {
        Some(city) => record.city.as_deref() == Some(city.as_str()),
        None => true,
    }
}

/// Keeps only candidates within the radius tolerance of the reference
/// record's geometry. A missing reference record disables the rule.
fn filter_by_reference(
    records: &[AddressRecord],
    indices: Vec<usize>,
    reference_id: &str,
    crs: CrsKind,
) -> Vec<usize> {
    let Some(reference) = records
        .iter()
        .find(|r| r.alkis_id.as_deref() == Some(reference_id))
    else {
        warn!(reference_id, "reference record for radius correction not found");
        return Vec::new();
    };
    let reference_point = reference.point;
    let tolerance = crs.radius_tolerance();
    indices
        .into_iter()
        .filter(|&i| {
            records[i].has_valid_point()
                && records[i].point.euclidean_distance(&reference_point) <= tolerance
        })
        .collect()
}

fn apply_to_record(record: &mut AddressRecord, rule: &CorrectionRule) {
    let action = match rule {
        CorrectionRule::ById { action, .. }
        | CorrectionRule::ByAddress { action, .. }
        | CorrectionRule::ReplaceInStreet { action, .. } => action,
    };

    if action.ignore {
        record.correction_type = Some(IGNORED_TAG.to_string());
        if action.comment.is_some() {
            record.correction_comment = action.comment.clone();
        }
        return;
    }

    let new_street = match rule {
        CorrectionRule::ReplaceInStreet {
            pattern,
            replace_with,
            ..
        } => Some(record.street.replace(pattern.as_str(), replace_with)),
        _ => action.to_street.clone(),
    };
    let new_housenumber = action.to_housenumber.clone();

    let street_changes = new_street.as_ref().is_some_and(|s| *s != record.street);
    let housenumber_changes = new_housenumber
        .as_ref()
        .is_some_and(|h| *h != record.housenumber);

    // First actual mutation snapshots the pre-correction values, once
    if (street_changes || housenumber_changes)
        && record.original_street.is_none()
        && record.original_housenumber.is_none()
    {
        record.original_street = Some(record.street.clone());
        record.original_housenumber = Some(record.housenumber.clone());
    }

    if let Some(street) = new_street {
        record.street = street;
    }
    if let Some(housenumber) = new_housenumber {
        record.housenumber = housenumber;
    }
    record.correction_type = Some(action.tag.clone());
    if action.comment.is_some() {
        record.correction_comment = action.comment.clone();
    }
}
