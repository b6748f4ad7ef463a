//! Geodetic → ECEF → local ENU conversion on the WGS84 ellipsoid.
//!
//! Angles are radians, distances metres.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Semi-major axis [m].
pub const WGS84_A: f64 = 6_378_137.0;
/// Semi-minor axis [m].
pub const WGS84_B: f64 = 6_356_752.3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// Latitude [rad].
    pub lat: f64,
    /// Longitude [rad].
    pub lon: f64,
    /// Ellipsoidal height [m].
    pub height: f64,
}

impl Geodetic {
    pub fn new(lat: f64, lon: f64, height: f64) -> Self {
        Self { lat, lon, height }
    }

    pub fn from_degrees(lat_deg: f64, lon_deg: f64, height: f64) -> Self {
        Self::new(lat_deg.to_radians(), lon_deg.to_radians(), height)
    }

    pub fn to_ecef(&self) -> Vector3<f64> {
        geodetic_to_ecef(self)
    }
}

pub fn geodetic_to_ecef(g: &Geodetic) -> Vector3<f64> {
    let ratio2 = (WGS84_B / WGS84_A).powi(2);
    let e2 = 1.0 - ratio2;
    let (sin_lat, cos_lat) = g.lat.sin_cos();
    let (sin_lon, cos_lon) = g.lon.sin_cos();
    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + g.height) * cos_lat * cos_lon,
        (n + g.height) * cos_lat * sin_lon,
        (ratio2 * n + g.height) * sin_lat,
    )
}

/// Rotation taking ECEF offsets into the east/north/up axes at `origin`.
pub fn enu_rotation(origin: &Geodetic) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = origin.lat.sin_cos();
    let (sin_lon, cos_lon) = origin.lon.sin_cos();
    Matrix3::new(
        -sin_lon, cos_lon, 0.0, //
        -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat, //
        cos_lat * cos_lon, cos_lat * sin_lon, sin_lat,
    )
}

pub fn ecef_to_enu(
    point: &Vector3<f64>,
    origin_ecef: &Vector3<f64>,
    origin: &Geodetic,
) -> Vector3<f64> {
    enu_rotation(origin) * (point - origin_ecef)
}

/// Local tangent-plane frame anchored at a geodetic origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnuFrame {
    pub origin: Geodetic,
    pub origin_ecef: Vector3<f64>,
    rotation: Matrix3<f64>,
}

impl EnuFrame {
    pub fn new(origin: Geodetic) -> Self {
        Self {
            origin,
            origin_ecef: origin.to_ecef(),
            rotation: enu_rotation(&origin),
        }
    }

    pub fn ecef_to_enu(&self, ecef: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * (ecef - self.origin_ecef)
    }

    pub fn to_enu(&self, g: &Geodetic) -> Vector3<f64> {
        self.ecef_to_enu(&g.to_ecef())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equator_prime_meridian_lies_on_x_axis() {
        let p = geodetic_to_ecef(&Geodetic::new(0.0, 0.0, 100.0));
        assert_abs_diff_eq!(p.x, WGS84_A + 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn north_pole_sits_at_semi_minor_axis() {
        let p = geodetic_to_ecef(&Geodetic::from_degrees(90.0, 0.0, 0.0));
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.z, WGS84_B, epsilon = 1e-6);
    }

    #[test]
    fn enu_axes_follow_local_directions() {
        let origin = Geodetic::from_degrees(60.17, 24.94, 20.0);
        let frame = EnuFrame::new(origin);

        let same = frame.to_enu(&origin);
        assert_abs_diff_eq!(same.norm(), 0.0, epsilon = 1e-6);

        let up = frame.to_enu(&Geodetic { height: 30.0, ..origin });
        assert_abs_diff_eq!(up.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(up.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(up.z, 10.0, epsilon = 1e-6);

        let east = frame.to_enu(&Geodetic { lon: origin.lon + 1e-6, ..origin });
        assert!(east.x > 0.0 && east.y.abs() < 1e-3);

        let north = frame.to_enu(&Geodetic { lat: origin.lat + 1e-6, ..origin });
        assert!(north.y > 0.0 && north.x.abs() < 1e-3);
    }

    #[test]
    fn frame_matches_free_function() {
        let origin = Geodetic::new(0.7, -1.3, 5.0);
        let frame = EnuFrame::new(origin);
        let p = Geodetic::new(0.70001, -1.29998, 7.5);
        let a = frame.to_enu(&p);
        let b = ecef_to_enu(&p.to_ecef(), &origin.to_ecef(), &origin);
        assert_abs_diff_eq!((a - b).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn rotation_is_orthonormal() {
        let r = enu_rotation(&Geodetic::new(0.4, 2.1, 0.0));
        let id = r * r.transpose();
        assert_abs_diff_eq!((id - Matrix3::identity()).norm(), 0.0, epsilon = 1e-12);
    }
}
