//! Ellipsoid definitions

/// GRS80 ellipsoid (ETRS89, used by the German UTM CRS family)
///
/// Indistinguishable from WGS84 at address-matching precision (< 0.1 mm),
/// so WGS84 coordinates are projected directly.
pub struct GRS80;

impl GRS80 {
    /// Semi-major axis (equatorial radius) in meters
    pub const A: f64 = 6378137.0;

    /// Flattening
    pub const F: f64 = 1.0 / 298.257222101;

    /// First eccentricity squared
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;

    /// Second eccentricity squared
    pub const EP2: f64 = Self::E2 / (1.0 - Self::E2);
}
