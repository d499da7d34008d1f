use std::f64::consts::PI;

use layers::atlas::AtlasConfig;
use layers::labels::LabelsConfig;
use runtime::frame::DEFAULT_MAX_DT_S;
use runtime::theme::Theme;
use scene::camera::CameraConfig;
use scene::markers::MarkerConfig;
use scene::prefabs::GlobeConfig;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Every tunable of the engine. Missing JSON fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub theme: Theme,
    pub viewport: [u32; 2],
    /// Point selected at startup; the first catalog point when absent.
    pub initial_selection: Option<String>,
    /// Pointer travel (px) beyond which a press becomes a drag instead of a click.
    pub click_threshold_px: f64,
    pub max_dt_s: f64,
    pub event_capacity: usize,
    pub camera: CameraConfig,
    pub markers: MarkerConfig,
    pub atlas: AtlasConfig,
    pub globe: GlobeConfig,
    pub labels: LabelsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            viewport: [1280, 720],
            initial_selection: None,
            click_threshold_px: 4.0,
            max_dt_s: DEFAULT_MAX_DT_S,
            event_capacity: runtime::event_bus::DEFAULT_EVENT_CAPACITY,
            camera: CameraConfig::default(),
            markers: MarkerConfig::default(),
            atlas: AtlasConfig::default(),
            globe: GlobeConfig::default(),
            labels: LabelsConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(payload).map_err(EngineError::Config)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would panic in clamping or keep focusing from ending.
    pub fn validate(&self) -> Result<(), EngineError> {
        let camera = &self.camera;
        positive("camera.focus_gain", camera.focus_gain)?;
        positive("camera.focus_epsilon", camera.focus_epsilon)?;
        positive("camera.min_distance", camera.min_distance)?;
        finite("camera.distance", camera.distance)?;
        finite("camera.max_distance", camera.max_distance)?;
        if camera.min_distance > camera.max_distance {
            return Err(invalid(format!(
                "camera.min_distance ({}) exceeds camera.max_distance ({})",
                camera.min_distance, camera.max_distance
            )));
        }
        finite("camera.min_polar", camera.min_polar)?;
        finite("camera.max_polar", camera.max_polar)?;
        if camera.min_polar < 0.0 || camera.max_polar > PI || camera.min_polar > camera.max_polar {
            return Err(invalid(format!(
                "camera polar bounds [{}, {}] must be ordered within [0, pi]",
                camera.min_polar, camera.max_polar
            )));
        }
        non_negative("camera.drag_grace_s", camera.drag_grace_s)?;
        finite("camera.auto_rotate_speed", camera.auto_rotate_speed)?;
        finite("camera.orbit_sensitivity", camera.orbit_sensitivity)?;
        finite("camera.zoom_sensitivity", camera.zoom_sensitivity)?;
        if !(camera.fov_y_deg > 0.0 && camera.fov_y_deg < 180.0) {
            return Err(invalid(format!("camera.fov_y_deg must be in (0, 180), got {}", camera.fov_y_deg)));
        }

        positive("max_dt_s", self.max_dt_s)?;
        non_negative("click_threshold_px", self.click_threshold_px)?;
        positive("globe.radius", self.globe.radius)?;
        positive("markers.size", self.markers.size)?;
        non_negative("markers.lift", self.markers.lift)?;
        Ok(())
    }
}

fn invalid(reason: String) -> EngineError {
    EngineError::InvalidConfig(reason)
}

fn finite(field: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be finite, got {value}")))
    }
}

fn positive(field: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be a positive number, got {value}")))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{field} must be zero or more, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;
    use crate::error::EngineError;
    use pretty_assertions::assert_eq;
    use runtime::theme::Theme;

    #[test]
    fn empty_json_is_the_default() {
        assert_eq!(EngineConfig::from_json_str("{}").expect("config"), EngineConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = EngineConfig::from_json_str(
            r#"{ "theme": "light", "camera": { "auto_rotate_speed": 0.2 }, "atlas": { "width": 512 } }"#,
        )
        .expect("config");
        assert_eq!(cfg.theme, Theme::Light);
        assert_eq!(cfg.camera.auto_rotate_speed, 0.2);
        assert_eq!(cfg.camera.focus_epsilon, 0.0022);
        assert_eq!((cfg.atlas.width, cfg.atlas.height), (512, 1024));
        assert_eq!(cfg.globe.ring_speed, 0.05);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_bounds() {
        for payload in [
            r#"{ "camera": { "min_polar": 2.0, "max_polar": 1.0 } }"#,
            r#"{ "camera": { "min_distance": 8.0, "max_distance": 2.0 } }"#,
            r#"{ "camera": { "max_polar": 4.0 } }"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json_str(payload), Err(EngineError::InvalidConfig(_))),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn rejects_values_that_stall_focusing() {
        for payload in [
            r#"{ "camera": { "focus_epsilon": 0.0 } }"#,
            r#"{ "camera": { "focus_epsilon": -0.1 } }"#,
            r#"{ "camera": { "focus_gain": 0.0 } }"#,
            r#"{ "max_dt_s": 0.0 }"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json_str(payload), Err(EngineError::InvalidConfig(_))),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn rejects_non_finite_values_set_in_code() {
        let mut cfg = EngineConfig::default();
        cfg.camera.focus_gain = f64::NAN;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));

        let mut cfg = EngineConfig::default();
        cfg.camera.fov_y_deg = 180.0;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_bad_types() {
        assert!(EngineConfig::from_json_str(r#"{ "theme": "sepia" }"#).is_err());
    }
}
