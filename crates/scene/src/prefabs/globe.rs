//! Static globe geometry: reference graticule, atmosphere shell, accent ring.

use std::f64::consts::TAU;

use foundation::math::{Vec3, to_cartesian};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub radius: f64,
    /// Atmosphere shell radius relative to the globe.
    pub atmosphere_scale: f64,
    pub graticule_step_deg: f64,
    /// Vertices per graticule line.
    pub graticule_segments: u32,
    pub ring_scale: f64,
    pub ring_tilt_deg: f64,
    /// Ring spin (rad/s).
    pub ring_speed: f64,
    /// Label height above the surface as a fraction of the radius.
    pub label_lift: f64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            atmosphere_scale: 1.12,
            graticule_step_deg: 30.0,
            graticule_segments: 96,
            ring_scale: 1.35,
            ring_tilt_deg: 18.0,
            ring_speed: 0.05,
            label_lift: 0.08,
        }
    }
}

const GRATICULE_LIFT: f64 = 1.002;

#[derive(Debug, Clone, PartialEq)]
pub struct GlobePrefab {
    config: GlobeConfig,
    graticule: Vec<Vec<Vec3>>,
}

impl GlobePrefab {
    pub fn new(config: GlobeConfig) -> Self {
        let graticule = graticule_lines(&config);
        Self { config, graticule }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn radius(&self) -> f64 {
        self.config.radius
    }

    pub fn atmosphere_radius(&self) -> f64 {
        self.config.radius * self.config.atmosphere_scale
    }

    pub fn ring_radius(&self) -> f64 {
        self.config.radius * self.config.ring_scale
    }

    pub fn ring_tilt(&self) -> f64 {
        self.config.ring_tilt_deg.to_radians()
    }

    /// Ring spin angle at `t` seconds, wrapped to `[0, 2π)`.
    pub fn ring_rotation(&self, t: f64) -> f64 {
        (t * self.config.ring_speed).rem_euclid(TAU)
    }

    /// Polylines for parallels then meridians, lifted just above the surface.
    pub fn graticule(&self) -> &[Vec<Vec3>] {
        &self.graticule
    }

    /// Where the label for a surface point with outward `normal` sits.
    pub fn label_anchor(&self, normal: Vec3) -> Vec3 {
        normal * (self.config.radius * (1.0 + self.config.label_lift))
    }
}

fn graticule_lines(config: &GlobeConfig) -> Vec<Vec<Vec3>> {
    let step = config.graticule_step_deg;
    let segments = config.graticule_segments.max(4);
    if !(step.is_finite() && step > 0.0) {
        return Vec::new();
    }
    let r = config.radius * GRATICULE_LIFT;
    let mut lines = Vec::new();

    // Parallels strictly between the poles.
    let mut lat = -90.0 + step;
    while lat < 90.0 - 1e-9 {
        let line = (0..=segments)
            .map(|i| to_cartesian(lat, -180.0 + 360.0 * i as f64 / segments as f64, r))
            .collect();
        lines.push(line);
        lat += step;
    }

    let mut lon = -180.0;
    while lon < 180.0 - 1e-9 {
        let half = segments / 2;
        let line = (0..=half)
            .map(|i| to_cartesian(90.0 - 180.0 * i as f64 / half as f64, lon, r))
            .collect();
        lines.push(line);
        lon += step;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::{GlobeConfig, GlobePrefab};
    use foundation::math::Vec3;
    use std::f64::consts::TAU;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn default_graticule_has_five_parallels_and_twelve_meridians() {
        let globe = GlobePrefab::new(GlobeConfig::default());
        assert_eq!(globe.graticule().len(), 5 + 12);
        for line in globe.graticule() {
            for p in line {
                assert_close(p.length(), 1.002, 1e-9);
            }
        }
    }

    #[test]
    fn ring_rotation_wraps() {
        let globe = GlobePrefab::new(GlobeConfig::default());
        assert_close(globe.ring_rotation(10.0), 0.5, 1e-12);
        let r = globe.ring_rotation(1.0e4);
        assert!((0.0..TAU).contains(&r));
    }

    #[test]
    fn label_anchor_sits_above_surface() {
        let globe = GlobePrefab::new(GlobeConfig::default());
        let anchor = globe.label_anchor(Vec3::Y);
        assert_close(anchor.y, 1.08, 1e-12);
        assert!(globe.atmosphere_radius() > globe.radius());
    }

    #[test]
    fn invalid_step_yields_no_lines() {
        let globe = GlobePrefab::new(GlobeConfig {
            graticule_step_deg: 0.0,
            ..GlobeConfig::default()
        });
        assert!(globe.graticule().is_empty());
    }
}
