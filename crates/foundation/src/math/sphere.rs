//! Sphere coordinate conventions.
//!
//! The globe uses +Y as its polar axis. Geographic coordinates map onto the
//! sphere exactly like the vertices of a UV sphere whose texture is an
//! equirectangular image with column 0 at longitude -180° and row 0 at the
//! north pole, so a point's 3D position and its texel always agree.

use std::f64::consts::{PI, TAU};

use super::Vec3;

/// Latitude/longitude pair in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLon {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl LatLon {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Coerces out-of-range input into the documented domain.
    ///
    /// Latitude is clamped to `[-90, 90]`, longitude is wrapped into
    /// `[-180, 180]` (a value of exactly 180 is kept), and non-finite values
    /// become 0.
    pub fn sanitized(self) -> Self {
        let lat = if self.lat_deg.is_finite() {
            self.lat_deg.clamp(-90.0, 90.0)
        } else {
            0.0
        };
        let lon = if !self.lon_deg.is_finite() {
            0.0
        } else if (-180.0..=180.0).contains(&self.lon_deg) {
            self.lon_deg
        } else {
            let r = (self.lon_deg + 180.0).rem_euclid(360.0);
            r - 180.0
        };
        Self::new(lat, lon)
    }

    pub fn to_cartesian(self, radius: f64) -> Vec3 {
        to_cartesian(self.lat_deg, self.lon_deg, radius)
    }
}

/// Maps latitude/longitude (degrees) to a point on a sphere of `radius`.
pub fn to_cartesian(lat_deg: f64, lon_deg: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = (lon_deg + 180.0).to_radians();
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Vertex of a UV sphere at texture coordinate `(u, v)`, `v = 0` at the north pole.
pub fn sphere_vertex(u: f64, v: f64, radius: f64) -> Vec3 {
    let around = u * TAU;
    let down = v * PI;
    Vec3::new(
        -radius * around.cos() * down.sin(),
        radius * down.cos(),
        radius * around.sin() * down.sin(),
    )
}

/// Orbit angles: `polar` measured from +Y, `azimuth` around +Y from +Z toward +X.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphericalAngles {
    pub azimuth: f64,
    pub polar: f64,
}

impl SphericalAngles {
    pub fn new(azimuth: f64, polar: f64) -> Self {
        Self { azimuth, polar }
    }
}

/// Converts a direction to orbit angles. `None` for a zero/non-finite vector.
pub fn to_spherical(v: Vec3) -> Option<SphericalAngles> {
    let n = v.normalized()?;
    let polar = n.y.clamp(-1.0, 1.0).acos();
    let azimuth = n.x.atan2(n.z);
    Some(SphericalAngles::new(azimuth, polar))
}

pub fn from_spherical(radius: f64, angles: SphericalAngles) -> Vec3 {
    let s = angles.polar.sin();
    Vec3::new(
        radius * s * angles.azimuth.sin(),
        radius * angles.polar.cos(),
        radius * s * angles.azimuth.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::{LatLon, from_spherical, sphere_vertex, to_cartesian, to_spherical};
    use crate::math::{Equirectangular, shortest_angular_delta};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn cartesian_stays_on_sphere() {
        for lat in (-90..=90).step_by(15) {
            for lon in (-180..=180).step_by(20) {
                let p = to_cartesian(lat as f64, lon as f64, 2.5);
                assert_close(p.length(), 2.5, 1e-12);
            }
        }
    }

    #[test]
    fn poles_sit_on_polar_axis() {
        let north = to_cartesian(90.0, 37.0, 1.0);
        assert_close(north.y, 1.0, 1e-12);
        let south = to_cartesian(-90.0, -12.0, 1.0);
        assert_close(south.y, -1.0, 1e-12);
    }

    #[test]
    fn equator_prime_meridian_faces_positive_x() {
        let p = to_cartesian(0.0, 0.0, 1.0);
        assert_close(p.x, 1.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn texel_and_position_agree() {
        let proj = Equirectangular::new(2048, 1024);
        for &(lat, lon) in &[(0.0, 0.0), (45.0, 90.0), (-45.0, -90.0), (51.5, -0.12), (-33.9, 151.2)] {
            let (x, y) = proj.project(lon, lat);
            let (u, v) = (x / 2048.0, y / 1024.0);
            let from_texel = sphere_vertex(u, v, 1.0);
            let direct = to_cartesian(lat, lon, 1.0);
            // Well under a texel (2π / 2048 ≈ 3e-3 rad).
            assert!((from_texel - direct).length() < 1e-9);
        }
    }

    #[test]
    fn spherical_round_trip() {
        let p = to_cartesian(45.0, 90.0, 1.0);
        let angles = to_spherical(p).expect("direction");
        assert_close(angles.polar, 45f64.to_radians(), 1e-12);
        let back = from_spherical(1.0, angles);
        assert!((back - p).length() < 1e-12);
        assert!(to_spherical(crate::math::Vec3::ZERO).is_none());
        assert_close(shortest_angular_delta(angles.azimuth, std::f64::consts::PI), 0.0, 1e-12);
    }

    #[test]
    fn sanitize_clamps_and_wraps() {
        let s = LatLon::new(95.0, 190.0).sanitized();
        assert_eq!(s.lat_deg, 90.0);
        assert_close(s.lon_deg, -170.0, 1e-12);
        let s = LatLon::new(f64::NAN, f64::INFINITY).sanitized();
        assert_eq!(s, LatLon::new(0.0, 0.0));
        let s = LatLon::new(-12.0, 180.0).sanitized();
        assert_eq!(s, LatLon::new(-12.0, 180.0));
    }
}
