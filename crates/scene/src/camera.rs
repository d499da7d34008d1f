//! Orbit camera with focus easing.
//!
//! The rig has two modes: `Free`, where only user input (and optional idle
//! auto-rotation) moves the camera, and `Focusing`, where azimuth and polar
//! ease toward a target every frame until the combined angular error drops
//! below `focus_epsilon`. Dragging cancels focusing outright; after a drag is
//! released, autonomous motion waits out a short grace period so the globe
//! does not move under the user's hand.
//!
//! Input is queued and applied on the next [`CameraRig::update`]. A frame that
//! applies user input never also advances focus easing.

use std::f64::consts::PI;

use foundation::math::{
    SphericalAngles, Vec3, from_spherical, shortest_angular_delta, to_spherical, wrap_angle,
};
use foundation::time::Time;
use runtime::frame::Frame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial orbit distance from the globe center, in globe units.
    pub distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_polar: f64,
    pub max_polar: f64,
    /// Easing gain (1/s): each frame covers `min(1, dt * gain)` of the remaining error.
    pub focus_gain: f64,
    /// Combined `|Δazimuth| + |Δpolar|` (rad) under which focusing ends.
    pub focus_epsilon: f64,
    /// Delay after a drag is released before autonomous motion resumes (s).
    pub drag_grace_s: f64,
    /// Idle rotation speed in `Free` mode (rad/s); 0 disables it.
    pub auto_rotate_speed: f64,
    /// Orbit radians per dragged pixel.
    pub orbit_sensitivity: f64,
    /// Zoom factor exponent per wheel unit.
    pub zoom_sensitivity: f64,
    pub fov_y_deg: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 2.8,
            min_distance: 1.6,
            max_distance: 6.0,
            min_polar: 0.2,
            max_polar: PI - 0.2,
            focus_gain: 3.5,
            focus_epsilon: 0.0022,
            drag_grace_s: 0.12,
            auto_rotate_speed: 0.0,
            orbit_sensitivity: 0.005,
            zoom_sensitivity: 0.001,
            fov_y_deg: 45.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraMode {
    Free,
    Focusing { target: SphericalAngles },
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging,
    Released { at: Time },
}

/// What moved the camera during one update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CameraStep {
    Idle,
    UserInput,
    Focus,
    /// Focusing reached its target this frame and the rig is back to `Free`.
    Settled,
    AutoRotate,
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    config: CameraConfig,
    azimuth: f64,
    polar: f64,
    distance: f64,
    mode: CameraMode,
    drag: DragState,
    pending_orbit: (f64, f64),
    pending_zoom: f64,
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        let mut rig = Self {
            azimuth: 0.0,
            polar: PI / 2.0,
            distance: config.distance,
            mode: CameraMode::Free,
            drag: DragState::Idle,
            pending_orbit: (0.0, 0.0),
            pending_zoom: 0.0,
            config,
        };
        rig.clamp();
        rig
    }

    /// Rig that already faces `point` (no easing).
    pub fn facing(config: CameraConfig, point: Vec3) -> Self {
        let mut rig = Self::new(config);
        if let Some(target) = rig.target_for(point) {
            rig.azimuth = target.azimuth;
            rig.polar = target.polar;
        }
        rig
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    pub fn polar(&self) -> f64 {
        self.polar
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn angles(&self) -> SphericalAngles {
        SphericalAngles::new(self.azimuth, self.polar)
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_focusing(&self) -> bool {
        matches!(self.mode, CameraMode::Focusing { .. })
    }

    pub fn user_driving(&self) -> bool {
        self.drag == DragState::Dragging
    }

    pub fn eye(&self) -> Vec3 {
        from_spherical(self.distance, self.angles())
    }

    /// Orbit angles that put `point` in the middle of the view, polar clamped.
    pub fn target_for(&self, point: Vec3) -> Option<SphericalAngles> {
        let direction = point.normalized()?;
        let angles = to_spherical(direction * self.distance)?;
        Some(SphericalAngles::new(
            wrap_angle(angles.azimuth),
            angles.polar.clamp(self.config.min_polar, self.config.max_polar),
        ))
    }

    /// Starts (or retargets) focus easing toward `point`.
    ///
    /// Retargeting mid-focus keeps the current angles, so motion stays
    /// continuous. Returns `false` for a degenerate point.
    pub fn focus_on(&mut self, point: Vec3) -> bool {
        let Some(target) = self.target_for(point) else {
            return false;
        };
        self.mode = CameraMode::Focusing { target };
        true
    }

    /// Remaining combined angular error, if focusing.
    pub fn focus_error(&self) -> Option<f64> {
        match self.mode {
            CameraMode::Focusing { target } => Some(self.error_to(target)),
            CameraMode::Free => None,
        }
    }

    pub fn begin_drag(&mut self) {
        self.drag = DragState::Dragging;
        self.mode = CameraMode::Free;
    }

    pub fn end_drag(&mut self, now: Time) {
        if self.drag == DragState::Dragging {
            self.drag = DragState::Released { at: now };
        }
    }

    /// Queues an orbit by a pointer delta in pixels.
    pub fn orbit_by_pixels(&mut self, dx_px: f64, dy_px: f64) {
        if !dx_px.is_finite() || !dy_px.is_finite() {
            return;
        }
        self.pending_orbit.0 += dx_px;
        self.pending_orbit.1 += dy_px;
    }

    /// Queues a zoom step; positive `delta` moves away from the globe.
    pub fn zoom_by(&mut self, delta: f64) {
        if delta.is_finite() {
            self.pending_zoom += delta;
        }
    }

    pub fn update(&mut self, frame: &Frame) -> CameraStep {
        if self.apply_pending_input() {
            return CameraStep::UserInput;
        }

        match self.drag {
            DragState::Dragging => return CameraStep::Idle,
            DragState::Released { at } => {
                if frame.time.since(at) < self.config.drag_grace_s {
                    return CameraStep::Idle;
                }
                self.drag = DragState::Idle;
            }
            DragState::Idle => {}
        }

        match self.mode {
            CameraMode::Focusing { target } => {
                let k = (frame.dt_s * self.config.focus_gain).clamp(0.0, 1.0);
                let d_az = shortest_angular_delta(self.azimuth, target.azimuth);
                let d_polar = shortest_angular_delta(self.polar, target.polar);
                self.azimuth = wrap_angle(self.azimuth + d_az * k);
                self.polar += d_polar * k;
                self.clamp();

                if self.error_to(target) < self.config.focus_epsilon {
                    self.mode = CameraMode::Free;
                    return CameraStep::Settled;
                }
                CameraStep::Focus
            }
            CameraMode::Free => {
                if self.config.auto_rotate_speed == 0.0 || frame.dt_s <= 0.0 {
                    return CameraStep::Idle;
                }
                self.azimuth = wrap_angle(self.azimuth + self.config.auto_rotate_speed * frame.dt_s);
                CameraStep::AutoRotate
            }
        }
    }

    fn apply_pending_input(&mut self) -> bool {
        let (dx, dy) = std::mem::take(&mut self.pending_orbit);
        let zoom = std::mem::take(&mut self.pending_zoom);
        if dx == 0.0 && dy == 0.0 && zoom == 0.0 {
            return false;
        }
        let s = self.config.orbit_sensitivity;
        self.azimuth = wrap_angle(self.azimuth - dx * s);
        self.polar -= dy * s;
        self.distance *= (zoom * self.config.zoom_sensitivity).exp();
        self.clamp();
        true
    }

    fn error_to(&self, target: SphericalAngles) -> f64 {
        shortest_angular_delta(self.azimuth, target.azimuth).abs()
            + shortest_angular_delta(self.polar, target.polar).abs()
    }

    fn clamp(&mut self) {
        self.polar = self.polar.clamp(self.config.min_polar, self.config.max_polar);
        self.distance = self
            .distance
            .clamp(self.config.min_distance, self.config.max_distance);
    }
}
