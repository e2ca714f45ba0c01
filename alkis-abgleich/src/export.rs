//! Per-district GeoJSON exports and the districts summary
//!
//! Exports are streamed feature by feature; a district with nothing to
//! report still gets an empty FeatureCollection so the frontend can fetch
//! it unconditionally.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use abgleich::{AddressRecord, DistrictStats};
use anyhow::{Context, Result};
use serde::Serialize;

/// One line of the `districts.json` summary consumed by the frontend
#[derive(Debug, Clone, Serialize)]
pub struct DistrictSummary {
    pub name: String,
    pub state: String,
    pub district: String,
    pub total: u64,
    pub missing: u64,
    pub coverage: f64,
    pub corrections: u64,
    /// Relative path of the district export below the state output dir
    pub path: String,
    pub filename: String,
}

impl DistrictSummary {
    pub fn new(stats: &DistrictStats, state: &str) -> Self {
        let filename = format!("{}.geojson", abgleich::slugify(&stats.name));
        Self {
            name: stats.name.clone(),
            state: state.to_string(),
            district: stats.name.clone(),
            total: stats.total,
            missing: stats.missing,
            coverage: stats.coverage,
            corrections: stats.corrections,
            path: format!("districts/{filename}"),
            filename,
        }
    }
}

/// Writes the sorted districts summary
pub fn write_districts_summary(path: &Path, summaries: &[DistrictSummary]) -> Result<()> {
    let json = serde_json::to_string_pretty(summaries)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Exports a district's reportable records: missing addresses plus
/// matched-but-corrected ones, with coordinates in WGS84.
pub fn export_district_geojson(
    path: &Path,
    records: &[(&AddressRecord, bool)],
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;
    for (i, (record, matched)) in records.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, record, *matched)?;
    }
    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

/// Writes one record as a GeoJSON feature
fn write_feature<W: Write>(writer: &mut W, record: &AddressRecord, matched: bool) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{},{}]}},"properties":{{"street":"{}","housenumber":"{}","matched":{}"#,
        record.point.x(),
        record.point.y(),
        escape_json(&record.street),
        escape_json(&record.housenumber),
        matched
    )?;
    write_optional(writer, "correction_type", record.correction_type.as_deref())?;
    write_optional(writer, "correction_comment", record.correction_comment.as_deref())?;
    write_optional(writer, "original_street", record.original_street.as_deref())?;
    write_optional(
        writer,
        "original_housenumber",
        record.original_housenumber.as_deref(),
    )?;
    write_optional(writer, "alkis_id", record.alkis_id.as_deref())?;
    write!(writer, "}}}}")?;

    Ok(())
}

fn write_optional<W: Write>(writer: &mut W, key: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        write!(writer, r#","{}":"{}""#, key, escape_json(value))?;
    }
    Ok(())
}

/// Escapes a string for JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}
