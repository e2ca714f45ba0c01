//! Forward UTM projection (Universal Transverse Mercator)
//!
//! Zones used by German address data:
//! - Zone 32N (EPSG:25832) - western and central states
//! - Zone 33N (EPSG:25833) - eastern states

use super::ellipsoid::GRS80;

/// Converts geographic coordinates (degrees) to UTM easting/northing in
/// meters for the given zone.
pub fn geographic_to_utm(lon_deg: f64, lat_deg: f64, zone: u32) -> (f64, f64) {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    // UTM parameters
    let k0 = 0.9996; // Scale factor
    let x0 = 500000.0; // False easting

    // Central meridian of the zone
    let lon0 = (zone as f64 * 6.0 - 183.0).to_radians();

    let phi = lat_deg.to_radians();
    let lam = lon_deg.to_radians();

    let sin_phi = phi.sin();
    let cos_phi = phi.cos();
    let tan_phi = phi.tan();

    let n = a / (1.0 - e2 * sin_phi.powi(2)).sqrt();
    let t = tan_phi.powi(2);
    let c = ep2 * cos_phi.powi(2);
    let a_ = (lam - lon0) * cos_phi;

    // Meridian arc length
    let m = a
        * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin());

    let x = k0
        * n
        * (a_
            + (1.0 - t + c) * a_.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * a_.powi(5) / 120.0)
        + x0;

    let y = k0
        * (m + n
            * tan_phi
            * (a_.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a_.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * a_.powi(6) / 720.0));

    (x, y)
}
