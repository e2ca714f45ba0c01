//! Per-district and global coverage statistics

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::AddressRecord;

/// Coverage figures for one district (percentage rounded to one decimal)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictStats {
    pub name: String,
    pub total: u64,
    pub missing: u64,
    pub coverage: f64,
    pub corrections: u64,
}

/// Coverage figures for the whole state (percentage rounded to two
/// decimals)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total: u64,
    pub missing: u64,
    pub coverage: f64,
    pub corrections: u64,
}

/// Coverage percentage; an empty scope counts as fully covered
pub fn coverage(total: u64, missing: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (total - missing) as f64 / total as f64 * 100.0
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// A record is missing when it has no valid match and was not excluded by
/// an ignore rule.
pub fn is_missing(record: &AddressRecord, found: bool) -> bool {
    !found && !record.is_ignored()
}

/// A record counts as a correction when a rule touched it and it either
/// ended up matching or was ignored.
pub fn is_correction(record: &AddressRecord, found: bool) -> bool {
    record.is_ignored() || (record.correction_type.is_some() && found)
}

/// Computes global and per-district statistics in one pass.
///
/// `found` must be parallel to `records` (the matcher's output).
pub fn aggregate(
    records: &[AddressRecord],
    found: &[bool],
) -> (GlobalStats, Vec<DistrictStats>) {
    debug_assert_eq!(records.len(), found.len());

    struct Counts {
        total: u64,
        missing: u64,
        corrections: u64,
    }
    let mut districts: BTreeMap<&str, Counts> = BTreeMap::new();
    let mut global = Counts {
        total: 0,
        missing: 0,
        corrections: 0,
    };

    for (record, &found) in records.iter().zip(found) {
        let missing = is_missing(record, found) as u64;
        let correction = is_correction(record, found) as u64;
        global.total += 1;
        global.missing += missing;
        global.corrections += correction;

        let entry = districts.entry(record.district.as_str()).or_insert(Counts {
            total: 0,
            missing: 0,
            corrections: 0,
        });
        entry.total += 1;
        entry.missing += missing;
        entry.corrections += correction;
    }

    let global_stats = GlobalStats {
        total: global.total,
        missing: global.missing,
        coverage: round_to(coverage(global.total, global.missing), 2),
        corrections: global.corrections,
    };
    let district_stats = districts
        .into_iter()
        .map(|(name, c)| DistrictStats {
            name: name.to_string(),
            total: c.total,
            missing: c.missing,
            coverage: round_to(coverage(c.total, c.missing), 1),
            corrections: c.corrections,
        })
        .collect();

    (global_stats, district_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IGNORED_TAG;
    use geo::Point;

    fn rec(district: &str) -> AddressRecord {
        AddressRecord::new("Weg", "1", district, "nds", Point::new(9.7, 52.4))
    }

    #[test]
    fn test_coverage_empty_scope() {
        assert_eq!(coverage(0, 0), 100.0);
    }

    #[test]
    fn test_ignored_not_missing_but_counted_as_correction() {
        let mut r = rec("A");
        r.correction_type = Some(IGNORED_TAG.to_string());
        assert!(!is_missing(&r, false));
        assert!(is_correction(&r, false));
    }

    #[test]
    fn test_corrected_and_found_counts() {
        let mut r = rec("A");
        r.correction_type = Some("corrected".to_string());
        assert!(is_correction(&r, true));
        // corrected but still unmatched: not a successful correction
        assert!(!is_correction(&r, false));
        assert!(is_missing(&r, false));
    }

    #[test]
    fn test_aggregate_rounding_per_scope() {
        // 3 records, 1 missing -> 66.666..%; district rounds to 1 decimal,
        // global to 2
        let records = vec![rec("A"), rec("A"), rec("A")];
        let found = vec![true, true, false];
        let (global, districts) = aggregate(&records, &found);
        assert_eq!(global.coverage, 66.67);
        assert_eq!(districts[0].coverage, 66.7);
        assert_eq!(global.total, 3);
        assert_eq!(global.missing, 1);
    }

    #[test]
    fn test_aggregate_by_district() {
        let mut records = vec![rec("B"), rec("A"), rec("B")];
        records[2].correction_type = Some(IGNORED_TAG.to_string());
        let found = vec![true, false, false];
        let (global, districts) = aggregate(&records, &found);

        assert_eq!(global.total, 3);
        assert_eq!(global.missing, 1);
        assert_eq!(global.corrections, 1);

        // sorted by name
        assert_eq!(districts[0].name, "A");
        assert_eq!(districts[0].missing, 1);
        assert_eq!(districts[1].name, "B");
        assert_eq!(districts[1].total, 2);
        assert_eq!(districts[1].missing, 0);
        assert_eq!(districts[1].corrections, 1);
        assert_eq!(districts[1].coverage, 100.0);
    }
}
