//! Longitudinal coverage history with retroactive adjustment
//!
//! One store per state, persisted as a single JSON document and written
//! back in full after every run. Entries are keyed by the snapshot date
//! label; insertion order is assumed monotonic, entries are only appended
//! or amended, never deleted.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AbgleichError;
use crate::stats::{coverage, round_to, DistrictStats, GlobalStats};

/// One stored snapshot for a scope (global or one district)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    /// Authoritative record count ("alkis" in the legacy format)
    #[serde(alias = "alkis")]
    pub total: u64,
    /// Map-dataset record count, carried for the global scope only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub osm: Option<u64>,
    pub missing: u64,
    pub coverage: f64,
    /// Legacy entries predate correction tracking and default to zero
    #[serde(default)]
    pub corrections: u64,
    /// Pre-adjustment corrections value, preserved the first time an entry
    /// is restated retroactively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_corrections: Option<u64>,
}

impl HistoryEntry {
    pub fn from_global(date: &str, stats: &GlobalStats, osm_total: u64) -> Self {
        Self {
            date: date.to_string(),
            total: stats.total,
            osm: Some(osm_total),
            missing: stats.missing,
            coverage: stats.coverage,
            corrections: stats.corrections,
            original_corrections: None,
        }
    }

    pub fn from_district(date: &str, stats: &DistrictStats) -> Self {
        Self {
            date: date.to_string(),
            total: stats.total,
            osm: None,
            missing: stats.missing,
            coverage: stats.coverage,
            corrections: stats.corrections,
            original_corrections: None,
        }
    }
}

/// Persisted time series per scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStore {
    #[serde(default)]
    pub global: Vec<HistoryEntry>,
    #[serde(default)]
    pub districts: BTreeMap<String, Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Loads a store, falling back to an empty one when the file is absent
    /// or corrupted. The data-loss risk of a corrupted file is accepted.
    pub fn load_lenient(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no history file, starting empty");
            return Self::default();
        }
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupted history, starting empty");
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, AbgleichError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AbgleichError::invalid_history(path.display().to_string(), e.to_string()))
    }

    /// Writes the full store atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<(), AbgleichError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Merges one run's snapshots into the store.
    ///
    /// Idempotent per snapshot label: a latest entry with the same date is
    /// overwritten, otherwise the entry is appended. Correction deltas are
    /// always propagated to the entire scope history; total/missing
    /// baseline shifts only when `full_delta` is set.
    pub fn update(
        &mut self,
        global: HistoryEntry,
        districts: Vec<(String, HistoryEntry)>,
        full_delta: bool,
    ) {
        update_scope(&mut self.global, global, full_delta, 2);
        for (name, entry) in districts {
            update_scope(self.districts.entry(name).or_default(), entry, full_delta, 1);
        }
    }
}

/// Applies retroactive adjustment against the latest stored entry, then
/// inserts the new entry (overwriting a same-label latest entry).
fn update_scope(entries: &mut Vec<HistoryEntry>, new: HistoryEntry, full_delta: bool, decimals: u32) {
    if let Some(prev) = entries.last() {
        let correction_delta = new.corrections as i64 - prev.corrections as i64;
        let total_delta = new.total as i64 - prev.total as i64;
        let missing_delta = new.missing as i64 - prev.missing as i64;

        // A correction rule, once introduced, is understood to have always
        // logically applied: restate the whole series.
        if correction_delta != 0 {
            for entry in entries.iter_mut() {
                entry.original_corrections.get_or_insert(entry.corrections);
                entry.corrections = add_signed(entry.corrections, correction_delta);
                entry.missing = add_signed(entry.missing, -correction_delta);
                entry.coverage = round_to(coverage(entry.total, entry.missing), decimals);
            }
        }

        // Residual baseline shift from address-processing logic changes,
        // after removing the correction-attributable part of the missing
        // delta
        if full_delta {
            let residual_missing = missing_delta + correction_delta;
            if total_delta != 0 || residual_missing != 0 {
                for entry in entries.iter_mut() {
                    entry.total = add_signed(entry.total, total_delta);
                    entry.missing = add_signed(entry.missing, residual_missing);
                    entry.coverage = round_to(coverage(entry.total, entry.missing), decimals);
                }
            }
        }
    }

    match entries.last_mut() {
        Some(last) if last.date == new.date => *last = new,
        _ => entries.push(new),
    }
}

fn add_signed(value: u64, delta: i64) -> u64 {
    (value as i64 + delta).max(0) as u64
}
