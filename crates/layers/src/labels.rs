use foundation::math::Vec3;
use runtime::theme::Palette;
use scene::points::PointCatalog;
use scene::prefabs::GlobePrefab;
use scene::selection::Selection;
use scene::view::ViewCamera;
use serde::{Deserialize, Serialize};

use crate::layer::{Layer, LayerId};

#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub color: [f32; 4],
    pub background: [f32; 4],
    pub padding_px: f32,
}

impl LabelStyle {
    pub fn new(palette: &Palette, config: &LabelsConfig) -> Self {
        Self {
            font_size_px: config.font_size_px,
            color: palette.label_text.to_f32(),
            background: palette.label_background.to_f32(),
            padding_px: config.padding_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub font_size_px: f32,
    pub padding_px: f32,
    /// Longer names are cut at this many characters and end in an ellipsis.
    pub max_text_len: usize,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            font_size_px: 14.0,
            padding_px: 6.0,
            max_text_len: 64,
        }
    }
}

pub trait LabelProjector {
    fn project(&self, world: Vec3) -> Option<[f64; 2]>;

    /// Whether a surface point with outward `normal` can be seen at all.
    fn faces(&self, point: Vec3, normal: Vec3) -> bool;
}

impl LabelProjector for ViewCamera {
    fn project(&self, world: Vec3) -> Option<[f64; 2]> {
        ViewCamera::project(self, world)
    }

    fn faces(&self, point: Vec3, normal: Vec3) -> bool {
        self.faces_camera(point, normal)
    }
}

/// Label of the active point.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLabel {
    /// Catalog index of the labelled point.
    pub index: usize,
    pub text: String,
    /// World position along the outward normal, above the surface.
    pub anchor: Vec3,
    /// Pixel position; `None` when the anchor is off screen or on the far side.
    pub screen_pos_px: Option<[f32; 2]>,
    pub size_px: [f32; 2],
    pub style: LabelStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelsLayer {
    id: LayerId,
    pub config: LabelsConfig,
}

impl LabelsLayer {
    pub fn new(id: u64, config: LabelsConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
        }
    }

    /// Label for the hovered point, else the selected one. `None` when
    /// neither resolves to a catalog point with a non-blank name.
    pub fn active_label<P: LabelProjector>(
        &self,
        catalog: &PointCatalog,
        selection: &Selection,
        globe: &GlobePrefab,
        projector: &P,
        palette: &Palette,
    ) -> Option<ActiveLabel> {
        let index = selection.active()?;
        let point = catalog.get(index)?;
        let text = clip_text(point.name.trim(), self.config.max_text_len)?;

        let normal = point.position.to_cartesian(1.0);
        let anchor = globe.label_anchor(normal);
        let screen_pos_px = if projector.faces(normal * globe.radius(), normal) {
            projector
                .project(anchor)
                .filter(|p| p[0].is_finite() && p[1].is_finite())
                .map(|p| [p[0] as f32, p[1] as f32])
        } else {
            None
        };

        let style = LabelStyle::new(palette, &self.config);
        Some(ActiveLabel {
            index,
            size_px: estimate_text_size(&text, &style),
            text,
            anchor,
            screen_pos_px,
            style,
        })
    }
}

impl Layer for LabelsLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

fn clip_text(text: &str, max_chars: usize) -> Option<String> {
    if text.is_empty() || max_chars == 0 {
        return None;
    }
    if text.chars().count() <= max_chars {
        return Some(text.to_string());
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    Some(out)
}

fn estimate_text_size(text: &str, style: &LabelStyle) -> [f32; 2] {
    let count = text.chars().count().max(1) as f32;
    let width = style.font_size_px * 0.6 * count + style.padding_px * 2.0;
    [width, style.font_size_px + style.padding_px * 2.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::math::to_cartesian;
    use runtime::theme::Theme;
    use scene::points::GeoPoint;
    use scene::prefabs::GlobeConfig;

    fn catalog() -> PointCatalog {
        PointCatalog::new(vec![
            GeoPoint::new("a", "Alpha", 0.0, 0.0),
            GeoPoint::new("b", "Bravo", 45.0, 90.0),
            GeoPoint::new("c", "   ", -45.0, -90.0),
        ])
        .expect("catalog")
    }

    fn view_over(lat: f64, lon: f64) -> ViewCamera {
        ViewCamera::new(to_cartesian(lat, lon, 3.0), 800, 600, 45f64.to_radians())
    }

    #[test]
    fn layer_reports_its_id() {
        use crate::layer::{Layer, LayerId};
        let layer = LabelsLayer::new(7, LabelsConfig::default());
        assert_eq!(layer.id(), LayerId(7));
        assert_eq!(layer.id().to_string(), "layer#7");
    }

    #[test]
    fn hover_wins_over_selection() {
        let layer = LabelsLayer::new(1, LabelsConfig::default());
        let globe = GlobePrefab::new(GlobeConfig::default());
        let mut selection = Selection::with_selected(1);
        let palette = Theme::Dark.palette();
        let view = view_over(0.0, 0.0);

        let label = layer
            .active_label(&catalog(), &selection, &globe, &view, palette)
            .expect("label");
        assert_eq!(label.text, "Bravo");

        selection.hover(Some(0));
        let label = layer
            .active_label(&catalog(), &selection, &globe, &view, palette)
            .expect("label");
        assert_eq!(label.text, "Alpha");
        let screen = label.screen_pos_px.expect("visible");
        assert!((screen[0] - 400.0).abs() < 1e-3);
        assert!(screen[1] < 300.0 + 1e-3);
    }

    #[test]
    fn anchor_sits_on_the_outward_normal() {
        let layer = LabelsLayer::new(1, LabelsConfig::default());
        let globe = GlobePrefab::new(GlobeConfig::default());
        let label = layer
            .active_label(
                &catalog(),
                &Selection::with_selected(1),
                &globe,
                &view_over(45.0, 90.0),
                Theme::Light.palette(),
            )
            .expect("label");
        let expected = to_cartesian(45.0, 90.0, 1.08);
        assert!((label.anchor - expected).length() < 1e-12);
        assert!(label.screen_pos_px.is_some());
    }

    #[test]
    fn far_side_label_has_no_screen_position() {
        let layer = LabelsLayer::new(1, LabelsConfig::default());
        let globe = GlobePrefab::new(GlobeConfig::default());
        let label = layer
            .active_label(
                &catalog(),
                &Selection::with_selected(0),
                &globe,
                &view_over(0.0, 180.0),
                Theme::Dark.palette(),
            )
            .expect("label");
        assert_eq!(label.screen_pos_px, None);
    }

    #[test]
    fn blank_or_missing_point_has_no_label() {
        let layer = LabelsLayer::new(1, LabelsConfig::default());
        let globe = GlobePrefab::new(GlobeConfig::default());
        let view = view_over(0.0, 0.0);
        let palette = Theme::Dark.palette();
        assert!(layer.active_label(&catalog(), &Selection::new(), &globe, &view, palette).is_none());
        assert!(layer.active_label(&catalog(), &Selection::with_selected(2), &globe, &view, palette).is_none());
        assert!(layer.active_label(&catalog(), &Selection::with_selected(9), &globe, &view, palette).is_none());
    }

    #[test]
    fn long_names_are_clipped() {
        assert_eq!(clip_text("Lisbon", 10).as_deref(), Some("Lisbon"));
        assert_eq!(clip_text("Ouagadougou", 5).as_deref(), Some("Ouag…"));
        assert_eq!(clip_text("", 5), None);
    }
}
