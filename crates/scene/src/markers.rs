use std::f64::consts::TAU;

use foundation::math::Vec3;
use foundation::time::Time;
use runtime::theme::{Color, Palette};
use serde::{Deserialize, Serialize};

use crate::points::PointCatalog;
use crate::selection::{Emphasis, Selection};

/// Stable per-id animation phase in `[0, 2π)`.
///
/// 32-bit string hash (`h = h * 31 + unit`, wrapping) over the UTF-16 code
/// units of `id`, folded into one of 1000 buckets. The same id always lands on
/// the same phase, in every process.
pub fn phase_for(id: &str) -> f64 {
    let mut h: i32 = 0;
    for unit in id.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    let bucket = i64::from(h).unsigned_abs() % 1000;
    bucket as f64 / 1000.0 * TAU
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Marker radius at scale 1, in globe units.
    pub size: f64,
    /// Height above the surface as a fraction of the globe radius.
    pub lift: f64,
    pub idle_scale: f64,
    pub hovered_scale: f64,
    pub selected_scale: f64,
    pub pulse_amplitude: f64,
    /// Pulse angular frequency (rad/s).
    pub pulse_frequency: f64,
    pub idle_halo_opacity: f32,
    pub hovered_halo_opacity: f32,
    pub selected_halo_opacity: f32,
    /// Halo radius relative to the marker.
    pub halo_scale: f64,
    /// Pick sphere radius relative to the marker size.
    pub pick_scale: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            size: 0.018,
            lift: 0.01,
            idle_scale: 1.0,
            hovered_scale: 1.35,
            selected_scale: 1.7,
            pulse_amplitude: 0.12,
            pulse_frequency: 2.4,
            idle_halo_opacity: 0.18,
            hovered_halo_opacity: 0.4,
            selected_halo_opacity: 0.6,
            halo_scale: 2.6,
            pick_scale: 2.0,
        }
    }
}

impl MarkerConfig {
    pub fn base_scale(&self, emphasis: Emphasis) -> f64 {
        match emphasis {
            Emphasis::Idle => self.idle_scale,
            Emphasis::Hovered => self.hovered_scale,
            Emphasis::Selected => self.selected_scale,
        }
    }

    pub fn halo_opacity(&self, emphasis: Emphasis) -> f32 {
        match emphasis {
            Emphasis::Idle => self.idle_halo_opacity,
            Emphasis::Hovered => self.hovered_halo_opacity,
            Emphasis::Selected => self.selected_halo_opacity,
        }
    }
}

/// Static placement of one point's marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub index: usize,
    pub position: Vec3,
    /// Outward unit normal at the point.
    pub normal: Vec3,
    pub phase: f64,
}

/// Per-frame marker appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerInstance {
    pub index: usize,
    pub position: Vec3,
    pub emphasis: Emphasis,
    pub radius: f64,
    pub halo_radius: f64,
    pub halo_opacity: f32,
    pub color: Color,
    pub halo_color: Color,
}

/// One marker per catalog point, in catalog order.
#[derive(Debug, Clone)]
pub struct MarkerField {
    config: MarkerConfig,
    markers: Vec<Marker>,
}

impl MarkerField {
    pub fn new(catalog: &PointCatalog, globe_radius: f64, config: MarkerConfig) -> Self {
        let lifted = globe_radius * (1.0 + config.lift);
        let markers = catalog
            .points()
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let normal = point.position.to_cartesian(1.0);
                Marker {
                    index,
                    position: normal * lifted,
                    normal,
                    phase: phase_for(point.id.as_str()),
                }
            })
            .collect();
        Self { config, markers }
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn pick_radius(&self) -> f64 {
        self.config.size * self.config.pick_scale
    }

    /// Pulse multiplier `1 + amplitude * sin(t * frequency + phase)`.
    pub fn pulse(&self, marker: &Marker, time: Time) -> f64 {
        1.0 + self.config.pulse_amplitude
            * (time.seconds() * self.config.pulse_frequency + marker.phase).sin()
    }

    pub fn instances(&self, time: Time, selection: &Selection, palette: &Palette) -> Vec<MarkerInstance> {
        self.markers
            .iter()
            .map(|marker| {
                let emphasis = selection.visual_state(marker.index).emphasis();
                let scale = self.config.base_scale(emphasis) * self.pulse(marker, time);
                let radius = self.config.size * scale;
                let color = match emphasis {
                    Emphasis::Idle => palette.marker,
                    Emphasis::Hovered | Emphasis::Selected => palette.marker_active,
                };
                let halo_color = match emphasis {
                    Emphasis::Idle => palette.halo,
                    Emphasis::Hovered | Emphasis::Selected => palette.marker_active,
                };
                MarkerInstance {
                    index: marker.index,
                    position: marker.position,
                    emphasis,
                    radius,
                    halo_radius: radius * self.config.halo_scale,
                    halo_opacity: self.config.halo_opacity(emphasis),
                    color,
                    halo_color,
                }
            })
            .collect()
    }
}
