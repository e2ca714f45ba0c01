//! Canonical address record shared by both datasets

use geo::Point;

/// Correction tag for records excluded from the missing count without
/// altering their data.
pub const IGNORED_TAG: &str = "ignored";

/// One atomic address, as produced by the extraction collaborators.
///
/// Coordinates stay in the CRS the record was loaded with (WGS84 for
/// GeoJSON inputs). The matcher works on separately projected copies, so
/// exports can always re-emit the original coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    pub street: String,
    pub housenumber: String,
    pub postcode: Option<String>,
    pub city: Option<String>,
    /// Administrative unit used for stats grouping and export partitioning
    pub district: String,
    /// Region code (e.g. "nds", "nrw")
    pub state: String,
    pub point: Point<f64>,
    /// Content-derived identifier used for ID-based corrections
    pub alkis_id: Option<String>,

    /// Correction provenance: tag of the last rule that touched the record,
    /// or [`IGNORED_TAG`]
    pub correction_type: Option<String>,
    pub correction_comment: Option<String>,
    /// Pre-correction street, set once on first mutation and never
    /// overwritten by later rules
    pub original_street: Option<String>,
    /// Pre-correction house number, same set-once semantics
    pub original_housenumber: Option<String>,
}

impl AddressRecord {
    /// Creates a plain record without provenance
    pub fn new(
        street: impl Into<String>,
        housenumber: impl Into<String>,
        district: impl Into<String>,
        state: impl Into<String>,
        point: Point<f64>,
    ) -> Self {
        Self {
            street: street.into(),
            housenumber: housenumber.into(),
            postcode: None,
            city: None,
            district: district.into(),
            state: state.into(),
            point,
            alkis_id: None,
            correction_type: None,
            correction_comment: None,
            original_street: None,
            original_housenumber: None,
        }
    }

    /// True if an ignore rule excluded this record from the missing count
    pub fn is_ignored(&self) -> bool {
        self.correction_type.as_deref() == Some(IGNORED_TAG)
    }

    /// True if the record geometry is usable for distance computations
    pub fn has_valid_point(&self) -> bool {
        self.point.x().is_finite() && self.point.y().is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ignored() {
        let mut rec = AddressRecord::new("Hauptstraße", "1", "Hannover", "nds", Point::new(9.7, 52.4));
        assert!(!rec.is_ignored());
        rec.correction_type = Some(IGNORED_TAG.to_string());
        assert!(rec.is_ignored());
        rec.correction_type = Some("corrected".to_string());
        assert!(!rec.is_ignored());
    }

    #[test]
    fn test_has_valid_point() {
        let rec = AddressRecord::new("A", "1", "D", "s", Point::new(9.7, 52.4));
        assert!(rec.has_valid_point());
        let bad = AddressRecord::new("A", "1", "D", "s", Point::new(f64::NAN, 52.4));
        assert!(!bad.has_valid_point());
    }
}
