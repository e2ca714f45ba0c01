//! Per-state reconciliation pipeline
//!
//! One call of [`process_state`] runs the full chain for a single state:
//! load → corrections → expansion → normalization → reprojection →
//! matching → stats/history → exports. States are independent; a failure
//! here is isolated by the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use abgleich::correction::{apply_corrections, load_corrections_lenient, CrsKind};
use abgleich::matcher::{match_found, MatchCandidate, MatchConfig};
use abgleich::{aggregate, stats, AddressRecord, Expander, HistoryEntry, HistoryStore, Normalizer};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::export::{export_district_geojson, write_districts_summary, DistrictSummary};
use crate::load::load_records;
use crate::reproject::{utm_epsg_for_state, Reprojector};

/// City whose ALKIS dumps additionally use '/' as a composite house number
/// separator
const SLASH_SEPARATOR_CITY: &str = "Hannover";

/// Run parameters shared by all states
#[derive(Debug, Clone)]
pub struct StateConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Snapshot label for the history (YYYY-MM-DD)
    pub date: String,
    /// Propagate total/missing baseline shifts to historical entries
    pub full_delta: bool,
    pub chunk_size: usize,
    pub max_distance: f64,
}

/// Per-state result line for the run report
#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub state: String,
    pub total: u64,
    pub osm_total: u64,
    pub missing: u64,
    pub coverage: f64,
    pub corrections: u64,
    pub districts: usize,
    pub duration_secs: f64,
}

/// Runs the full pipeline for one state and writes its outputs
pub fn process_state(state: &str, config: &StateConfig) -> Result<StateSummary> {
    let started = Instant::now();
    let state_dir = config.data_dir.join("states").join(state);

    // 1. Load canonical datasets (WGS84)
    let mut alkis = load_records(&state_dir.join(format!("{state}_alkis.geojson")), state)?;
    let osm = load_records(&state_dir.join(format!("{state}_osm.geojson")), state)?;
    info!(state, alkis = alkis.len(), osm = osm.len(), "loaded datasets");

    // 2. Manual corrections on the authoritative set, coordinates still
    // geographic at this point
    let rules = load_corrections_lenient(&state_dir.join(format!("{state}_alkis_corrections.json")));
    apply_corrections(&mut alkis, &rules, CrsKind::Geographic);

    // 3. Composite/range expansion on both sides
    let expander = Expander::new().with_slash_city(SLASH_SEPARATOR_CITY);
    let alkis = expander.expand_all(alkis);
    let osm = expander.expand_all(osm);

    // 4. Normalized keys + one up-front reprojection to a metric CRS
    let epsg = utm_epsg_for_state(state);
    let reprojector = Reprojector::for_epsg(epsg)?;
    let normalizer = Normalizer::new();
    let alkis_candidates = candidates(&alkis, &normalizer, &reprojector);
    let osm_candidates = candidates(&osm, &normalizer, &reprojector);

    // 5. Blocking join with distance validation
    let match_config = MatchConfig {
        chunk_size: config.chunk_size,
        max_distance: config.max_distance,
    };
    let found = match_found(&alkis_candidates, &osm_candidates, &match_config);

    // 6. Stats, exports, history
    let (global, district_stats) = aggregate(&alkis, &found);
    info!(
        state,
        total = global.total,
        missing = global.missing,
        coverage = global.coverage,
        corrections = global.corrections,
        "matched"
    );

    let out_dir = config.out_dir.join(state);
    let districts_dir = out_dir.join("districts");
    std::fs::create_dir_all(&districts_dir)
        .with_context(|| format!("Failed to create {}", districts_dir.display()))?;

    write_district_exports(&districts_dir, &alkis, &found, &district_stats, state)
        .and_then(|summaries| write_districts_summary(&out_dir.join("districts.json"), &summaries))?;

    let history_path = out_dir.join("detailed_history.json");
    let mut history = HistoryStore::load_lenient(&history_path);
    let district_entries = district_stats
        .iter()
        .map(|d| (d.name.clone(), HistoryEntry::from_district(&config.date, d)))
        .collect();
    history.update(
        HistoryEntry::from_global(&config.date, &global, osm.len() as u64),
        district_entries,
        config.full_delta,
    );
    history
        .save(&history_path)
        .with_context(|| format!("Failed to write {}", history_path.display()))?;

    Ok(StateSummary {
        state: state.to_string(),
        total: global.total,
        osm_total: osm.len() as u64,
        missing: global.missing,
        coverage: global.coverage,
        corrections: global.corrections,
        districts: district_stats.len(),
        duration_secs: started.elapsed().as_secs_f64(),
    })
}

fn candidates(
    records: &[AddressRecord],
    normalizer: &Normalizer,
    reprojector: &Reprojector,
) -> Vec<MatchCandidate> {
    records
        .iter()
        .map(|r| {
            MatchCandidate::new(
                normalizer.key(&r.street, &r.housenumber),
                reprojector.project(r.point),
            )
        })
        .collect()
}

/// Writes one GeoJSON per district (missing plus matched-but-corrected
/// records) and returns the summary lines, sorted by district name.
fn write_district_exports(
    districts_dir: &Path,
    records: &[AddressRecord],
    found: &[bool],
    district_stats: &[abgleich::DistrictStats],
    state: &str,
) -> Result<Vec<DistrictSummary>> {
    let mut per_district: BTreeMap<&str, Vec<(&AddressRecord, bool)>> = BTreeMap::new();
    for (record, &found) in records.iter().zip(found) {
        if stats::is_missing(record, found) {
            per_district
                .entry(record.district.as_str())
                .or_default()
                .push((record, false));
        } else if record.correction_type.is_some() {
            // Ignored or corrected records that ended up covered are still
            // exported, flagged as matched, so reviewers can audit them
            per_district
                .entry(record.district.as_str())
                .or_default()
                .push((record, true));
        }
    }

    let mut summaries = Vec::with_capacity(district_stats.len());
    for district in district_stats {
        let summary = DistrictSummary::new(district, state);
        let records = per_district
            .get(district.name.as_str())
            .map_or(&[][..], |v| v.as_slice());
        export_district_geojson(&districts_dir.join(&summary.filename), records)?;
        summaries.push(summary);
    }
    Ok(summaries)
}
