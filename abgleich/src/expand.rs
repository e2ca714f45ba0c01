//! Composite and range house-number expansion
//!
//! ALKIS dumps carry composite house number fields ("1, 2, Nebenweg 3") and
//! range notations ("7-13"). Both are expanded into one record per atomic
//! address before key normalization, so each address can match
//! independently.

use regex::Regex;
use tracing::debug;

use crate::record::AddressRecord;

/// Ranges longer than this are left untouched; legitimate house number
/// ranges in German addressing stay far below it.
const MAX_RANGE_SPAN: u32 = 1000;

pub struct Expander {
    range: Regex,
    street_number: Regex,
    /// City whose dumps additionally use '/' as a composite separator
    slash_city: Option<String>,
}

impl Expander {
    pub fn new() -> Self {
        Self {
            // Constant patterns, compilation cannot fail
            range: Regex::new(r"^(\d+)-(\d+)$").expect("valid range regex"),
            // "optional new street name, whitespace, then a number"
            street_number: Regex::new(r"^([^\d].*?)\s+(\d.*)$").expect("valid segment regex"),
            slash_city: None,
        }
    }

    /// Also split house numbers on '/' for records of the named city
    pub fn with_slash_city(mut self, city: impl Into<String>) -> Self {
        self.slash_city = Some(city.into());
        self
    }

    /// Expands a whole record set; rows without composite or range notation
    /// pass through unchanged.
    pub fn expand_all(&self, records: Vec<AddressRecord>) -> Vec<AddressRecord> {
        let before = records.len();
        let expanded: Vec<AddressRecord> = records
            .into_iter()
            .flat_map(|rec| self.expand_composite(rec))
            .flat_map(|rec| self.expand_range(rec))
            .collect();
        if expanded.len() != before {
            debug!(before, after = expanded.len(), "expanded composite/range addresses");
        }
        expanded
    }

    /// Splits comma/semicolon (and per-city slash) separated house number
    /// fields into one record per segment. A segment of the form
    /// "Street 12" switches the active street for itself and all following
    /// segments; other segments are bare numbers under the active street.
    fn expand_composite(&self, rec: AddressRecord) -> Vec<AddressRecord> {
        if !self.has_separator(&rec) {
            return vec![rec];
        }

        let use_slash = self.slash_applies(&rec);
        let raw = rec.housenumber.clone();
        let segments = raw
            .split(|c: char| c == ',' || c == ';' || (use_slash && c == '/'))
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut street = rec.street.clone();
        let mut out = Vec::new();
        for (i, segment) in segments.enumerate() {
            // The first segment always belongs to the record's own street
            if i > 0 {
                if let Some(caps) = self.street_number.captures(segment) {
                    street = caps[1].trim().to_string();
                    out.push(with_address(&rec, &street, caps[2].trim()));
                    continue;
                }
            }
            out.push(with_address(&rec, &street, segment));
        }

        if out.is_empty() {
            // House number was nothing but separators; keep the row as-is
            return vec![rec];
        }
        out
    }

    /// Expands "<int>-<int>" into the inclusive range, stepping by 2 when
    /// start and end share parity (odd or even side of the street).
    fn expand_range(&self, rec: AddressRecord) -> Vec<AddressRecord> {
        let Some(caps) = self.range.captures(&rec.housenumber) else {
            return vec![rec];
        };
        let (Ok(start), Ok(end)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            return vec![rec];
        };
        if start > end || end - start > MAX_RANGE_SPAN {
            return vec![rec];
        }

        let step = if start % 2 == end % 2 { 2 } else { 1 };
        (start..=end)
            .step_by(step)
            .map(|n| with_address(&rec, &rec.street, &n.to_string()))
            .collect()
    }

    fn has_separator(&self, rec: &AddressRecord) -> bool {
        rec.housenumber.contains([',', ';']) || (self.slash_applies(rec) && rec.housenumber.contains('/'))
    }

    fn slash_applies(&self, rec: &AddressRecord) -> bool {
        match (&self.slash_city, &rec.city) {
            (Some(slash_city), Some(city)) => slash_city.eq_ignore_ascii_case(city),
            _ => false,
        }
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}

/// Clone of `rec` with a new street / house number; every other field,
/// including geometry and provenance, is preserved.
fn with_address(rec: &AddressRecord, street: &str, housenumber: &str) -> AddressRecord {
    let mut out = rec.clone();
    out.street = street.to_string();
    out.housenumber = housenumber.to_string();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn rec(street: &str, housenumber: &str) -> AddressRecord {
        AddressRecord::new(street, housenumber, "Hannover", "nds", Point::new(9.7, 52.4))
    }

    fn numbers(records: &[AddressRecord]) -> Vec<&str> {
        records.iter().map(|r| r.housenumber.as_str()).collect()
    }

    #[test]
    fn test_range_same_parity_steps_by_two() {
        let e = Expander::new();
        let out = e.expand_range(rec("Ring", "7-13"));
        assert_eq!(numbers(&out), ["7", "9", "11", "13"]);
    }

    #[test]
    fn test_range_mixed_parity_steps_by_one() {
        let e = Expander::new();
        let out = e.expand_range(rec("Ring", "4-5"));
        assert_eq!(numbers(&out), ["4", "5"]);
    }

    #[test]
    fn test_range_non_conforming_untouched() {
        let e = Expander::new();
        for hnr in ["7-13a", "a-13", "7 - 13", "13-7", "7--13", "7-13-15"] {
            let out = e.expand_range(rec("Ring", hnr));
            assert_eq!(numbers(&out), [hnr], "case {hnr}");
        }
    }

    #[test]
    fn test_composite_street_carry_forward() {
        let e = Expander::new();
        let out: Vec<_> = e.expand_composite(rec("Hauptstrasse", "1, 2, Nebenweg 3"));
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|r| (r.street.as_str(), r.housenumber.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [("Hauptstrasse", "1"), ("Hauptstrasse", "2"), ("Nebenweg", "3")]
        );
    }

    #[test]
    fn test_composite_new_street_stays_active() {
        let e = Expander::new();
        let out = e.expand_composite(rec("Hauptstrasse", "1, Nebenweg 3, 5"));
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|r| (r.street.as_str(), r.housenumber.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [("Hauptstrasse", "1"), ("Nebenweg", "3"), ("Nebenweg", "5")]
        );
    }

    #[test]
    fn test_composite_first_segment_keeps_street() {
        // Even if the first segment looks like "Street 1" it belongs to the
        // record street
        let e = Expander::new();
        let out = e.expand_composite(rec("Hauptstrasse", "Haus 1, 2"));
        assert_eq!(out[0].street, "Hauptstrasse");
        assert_eq!(out[0].housenumber, "Haus 1");
        assert_eq!(out[1].housenumber, "2");
    }

    #[test]
    fn test_slash_only_for_configured_city() {
        let e = Expander::new().with_slash_city("Emden");
        let mut r = rec("Ring", "1/3");
        assert_eq!(numbers(&e.expand_composite(r.clone())), ["1/3"]);
        r.city = Some("Emden".to_string());
        assert_eq!(numbers(&e.expand_composite(r)), ["1", "3"]);
    }

    #[test]
    fn test_expansion_preserves_other_fields() {
        let e = Expander::new();
        let mut r = rec("Hauptstrasse", "7-9");
        r.alkis_id = Some("abc".to_string());
        r.correction_type = Some("corrected".to_string());
        let out = e.expand_all(vec![r.clone()]);
        assert_eq!(out.len(), 2);
        for o in &out {
            assert_eq!(o.point, r.point);
            assert_eq!(o.alkis_id, r.alkis_id);
            assert_eq!(o.district, r.district);
            assert_eq!(o.correction_type, r.correction_type);
        }
    }

    #[test]
    fn test_composite_then_range() {
        let e = Expander::new();
        let out = e.expand_all(vec![rec("Ring", "1-3, Nebenweg 2-4")]);
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|r| (r.street.as_str(), r.housenumber.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [("Ring", "1"), ("Ring", "3"), ("Nebenweg", "2"), ("Nebenweg", "4")]
        );
    }
}
