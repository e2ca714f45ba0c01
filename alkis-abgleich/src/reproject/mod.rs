//! Pure-Rust reprojection of WGS84 inputs to a metric UTM CRS
//!
//! GeoJSON inputs are WGS84 (RFC 7946); distance validation needs metric
//! coordinates. Supported targets:
//! - ETRS89 / UTM zone 32N (EPSG:25832) - western and central states
//! - ETRS89 / UTM zone 33N (EPSG:25833) - eastern states

mod ellipsoid;
mod utm;

use anyhow::{bail, Result};
use geo::Point;

/// Projects WGS84 points into one UTM zone
pub struct Reprojector {
    zone: u32,
    target_epsg: u32,
}

impl Reprojector {
    /// Creates a reprojector for a supported metric target CRS
    pub fn for_epsg(target_epsg: u32) -> Result<Self> {
        let zone = match target_epsg {
            25832 => 32,
            25833 => 33,
            _ => bail!(
                "EPSG:{} not supported. Supported targets: 25832 (UTM 32N), 25833 (UTM 33N)",
                target_epsg
            ),
        };
        Ok(Self { zone, target_epsg })
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Projects a WGS84 point (lon, lat in degrees) to easting/northing
    pub fn project(&self, point: Point<f64>) -> Point<f64> {
        let (x, y) = utm::geographic_to_utm(point.x(), point.y(), self.zone);
        Point::new(x, y)
    }
}

/// Metric CRS for a state code. Eastern states sit in UTM zone 33, the
/// rest in zone 32; internal consistency matters more than the exact zone
/// since only distances between the two datasets are used.
pub fn utm_epsg_for_state(state: &str) -> u32 {
    match state.to_ascii_lowercase().as_str() {
        "mv" | "bb" | "be" | "sn" | "st" => 25833,
        _ => 25832,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_epsg() {
        assert!(Reprojector::for_epsg(4326).is_err());
        assert!(Reprojector::for_epsg(2154).is_err());
    }

    #[test]
    fn test_project_point() {
        let reproj = Reprojector::for_epsg(25832).unwrap();
        let p = reproj.project(Point::new(9.7380, 52.3740));
        assert!((p.x() - 550240.45).abs() < 1.0);
        assert!((p.y() - 5802893.16).abs() < 1.0);
    }

    #[test]
    fn test_zone_per_state() {
        assert_eq!(utm_epsg_for_state("nds"), 25832);
        assert_eq!(utm_epsg_for_state("nrw"), 25832);
        assert_eq!(utm_epsg_for_state("MV"), 25833);
        assert_eq!(utm_epsg_for_state("st"), 25833);
    }
}
