//! Texture lifecycle and per-frame draw list assembly.
//!
//! The composer owns every texture the globe draws with. Land is rebuilt per
//! theme, the highlight per (theme, region set). A replaced texture is
//! released before its successor is built, so at most one of each is live.

use foundation::handles::Handle;
use foundation::ids::PointId;
use gpu::renderer::{BlendMode, Camera3D, MarkerDraw, RenderCommand, RenderFrame, SurfaceLayer};
use layers::atlas::TextureAtlasBuilder;
use layers::boundaries::BoundaryDataset;
use layers::labels::LabelsLayer;
use layers::layer::Layer;
use layers::region_map::{RegionMap, RegionSet};
use layers::textures::{TextureAsset, TextureStore, TextureTag};
use runtime::theme::Theme;
use scene::markers::MarkerField;
use scene::points::PointCatalog;
use scene::prefabs::GlobePrefab;
use scene::selection::Selection;
use scene::view::ViewCamera;

use crate::config::EngineConfig;

// Surface shells sit just above the ocean sphere so they never z-fight.
const LAND_SHELL: f64 = 1.001;
const GLOW_SHELL: f64 = 1.003;
const HIGHLIGHT_SHELL: f64 = 1.005;
const FAR_PLANE: f64 = 100.0;
pub const LABELS_LAYER: u64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum TextureEvent {
    Built {
        tag: TextureTag,
        handle: Handle,
        fallback: bool,
    },
    Released {
        tag: TextureTag,
        handle: Handle,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct HighlightSlot {
    regions: RegionSet,
    handle: Handle,
}

/// Everything one `compose` call reads besides the composer itself.
pub struct FrameInputs<'a> {
    pub catalog: &'a PointCatalog,
    pub markers: &'a MarkerField,
    pub selection: &'a Selection,
    pub view: &'a ViewCamera,
}

pub struct SceneComposer {
    atlas: TextureAtlasBuilder,
    store: TextureStore,
    region_map: RegionMap,
    globe: GlobePrefab,
    labels: LabelsLayer,
    theme: Theme,
    land: Option<Handle>,
    highlight: Option<HighlightSlot>,
    /// Point whose regions the highlight was last resolved for.
    highlight_point: Option<PointId>,
}

impl SceneComposer {
    /// Composer with the land texture for `config.theme` already built.
    pub fn new(
        boundaries: BoundaryDataset,
        region_map: RegionMap,
        config: &EngineConfig,
    ) -> (Self, Vec<TextureEvent>) {
        let mut composer = Self {
            atlas: TextureAtlasBuilder::new(boundaries, config.atlas.clone()),
            store: TextureStore::new(),
            region_map,
            globe: GlobePrefab::new(config.globe.clone()),
            labels: LabelsLayer::new(LABELS_LAYER, config.labels.clone()),
            theme: config.theme,
            land: None,
            highlight: None,
            highlight_point: None,
        };
        let mut events = Vec::new();
        composer.rebuild_land(&mut events);
        (composer, events)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn globe(&self) -> &GlobePrefab {
        &self.globe
    }

    pub fn textures(&self) -> &TextureStore {
        &self.store
    }

    pub fn land_texture(&self) -> Option<Handle> {
        self.land
    }

    pub fn highlight_texture(&self) -> Option<Handle> {
        self.highlight.as_ref().map(|slot| slot.handle)
    }

    /// Live texture built for `tag`, if one is currently held.
    pub fn texture_for(&self, tag: &TextureTag) -> Option<&TextureAsset> {
        self.store.find_by_tag(tag).and_then(|h| self.store.get(h))
    }

    pub fn highlighted_regions(&self) -> Option<&RegionSet> {
        self.highlight.as_ref().map(|slot| &slot.regions)
    }

    /// Switches palettes, rebuilding land and the current highlight.
    /// A no-op when `theme` is already applied.
    pub fn set_theme(&mut self, theme: Theme) -> Vec<TextureEvent> {
        let mut events = Vec::new();
        if theme == self.theme {
            return events;
        }
        self.theme = theme;
        self.rebuild_land(&mut events);
        if let Some(slot) = self.highlight.take() {
            self.release(slot.handle, &mut events);
            self.build_highlight(slot.regions, &mut events);
        }
        tracing::info!(theme = %theme, "theme applied");
        events
    }

    /// Points the highlight at the regions of `active`. Region ids missing
    /// from the boundary dataset are skipped; an empty result clears it.
    pub fn sync_highlight(&mut self, active: Option<&PointId>) -> Vec<TextureEvent> {
        let mut events = Vec::new();
        if self.highlight_point.as_ref() == active {
            return events;
        }
        self.highlight_point = active.cloned();

        let wanted = active
            .and_then(|id| self.region_map.regions_for(id.as_str()))
            .map(|regions| {
                let (known, unknown) = regions.partition_known(self.atlas.dataset());
                if !unknown.is_empty() {
                    let ids: Vec<u32> = unknown.iter().map(|id| id.0).collect();
                    tracing::warn!(point = ?active.map(PointId::as_str), ?ids, "region ids missing from boundaries");
                }
                known
            })
            .filter(|known| !known.is_empty());

        if self.highlighted_regions() == wanted.as_ref() {
            return events;
        }
        if let Some(slot) = self.highlight.take() {
            self.release(slot.handle, &mut events);
        }
        if let Some(regions) = wanted {
            self.build_highlight(regions, &mut events);
        }
        events
    }

    /// Writes this frame's draw list into `frame`, replacing its commands.
    pub fn compose(&self, frame: &mut RenderFrame, inputs: &FrameInputs<'_>) {
        let palette = self.theme.palette();
        let radius = self.globe.radius();
        let time_s = frame.time_s;

        frame.clear();
        frame.clear_color = palette.background.to_f32();
        frame.camera = Camera3D::look_at(
            inputs.view.eye,
            foundation::math::Vec3::ZERO,
            inputs.view.fov_y_rad,
            inputs.view.near,
            FAR_PLANE,
        );

        frame.push(RenderCommand::Sphere {
            radius: radius as f32,
            color: palette.ocean.to_f32(),
        });
        if let Some(texture) = self.land {
            frame.push(RenderCommand::TexturedSphere {
                layer: SurfaceLayer::Land,
                radius: (radius * LAND_SHELL) as f32,
                texture,
                blend: BlendMode::Normal,
                opacity: 1.0,
            });
            frame.push(RenderCommand::TexturedSphere {
                layer: SurfaceLayer::LandGlow,
                radius: (radius * GLOW_SHELL) as f32,
                texture,
                blend: BlendMode::Additive,
                opacity: palette.land_glow_layer_opacity,
            });
        }
        if let Some(slot) = &self.highlight {
            frame.push(RenderCommand::TexturedSphere {
                layer: SurfaceLayer::Highlight,
                radius: (radius * HIGHLIGHT_SHELL) as f32,
                texture: slot.handle,
                blend: BlendMode::Normal,
                opacity: 1.0,
            });
        }
        frame.push(RenderCommand::Atmosphere {
            radius: self.globe.atmosphere_radius() as f32,
            color: palette.atmosphere.to_f32(),
        });
        frame.push(RenderCommand::Lines {
            lines: self
                .globe
                .graticule()
                .iter()
                .map(|line| line.iter().map(|v| v.to_f32()).collect())
                .collect(),
            color: palette.graticule.to_f32(),
        });
        frame.push(RenderCommand::Ring {
            radius: self.globe.ring_radius() as f32,
            tilt_rad: self.globe.ring_tilt() as f32,
            rotation_rad: self.globe.ring_rotation(time_s) as f32,
            color: palette.ring.to_f32(),
        });

        let instances = inputs
            .markers
            .instances(foundation::time::Time(time_s), inputs.selection, palette)
            .into_iter()
            .map(|m| MarkerDraw {
                position: m.position.to_f32(),
                radius: m.radius as f32,
                color: m.color.to_f32(),
                halo_radius: m.halo_radius as f32,
                halo_color: m.halo_color.with_alpha(scale_alpha(m.halo_color.a, m.halo_opacity)).to_f32(),
            })
            .collect();
        frame.push(RenderCommand::Markers { instances });

        if let Some(label) = self.labels.active_label(
            inputs.catalog,
            inputs.selection,
            &self.globe,
            inputs.view,
            palette,
        ) {
            frame.push(RenderCommand::Label {
                layer: self.labels.id().0,
                text: label.text,
                anchor: label.anchor.to_f32(),
                screen_pos_px: label.screen_pos_px,
                size_px: label.size_px,
                color: label.style.color,
                background: label.style.background,
            });
        }
    }

    /// Releases every texture. Returns how many were live.
    pub fn shutdown(&mut self) -> usize {
        self.land = None;
        self.highlight = None;
        self.highlight_point = None;
        let released = self.store.release_all();
        tracing::debug!(released, "textures released on shutdown");
        released
    }

    fn rebuild_land(&mut self, events: &mut Vec<TextureEvent>) {
        if let Some(handle) = self.land.take() {
            self.release(handle, events);
        }
        let asset = self.atlas.build_land_texture(self.theme);
        let (tag, fallback) = (asset.tag.clone(), asset.fallback);
        let handle = self.store.insert(asset);
        events.push(TextureEvent::Built { tag, handle, fallback });
        self.land = Some(handle);
    }

    fn build_highlight(&mut self, regions: RegionSet, events: &mut Vec<TextureEvent>) {
        let asset = self.atlas.build_region_highlight(self.theme, &regions);
        let (tag, fallback) = (asset.tag.clone(), asset.fallback);
        let handle = self.store.insert(asset);
        events.push(TextureEvent::Built { tag, handle, fallback });
        self.highlight = Some(HighlightSlot { regions, handle });
    }

    fn release(&mut self, handle: Handle, events: &mut Vec<TextureEvent>) {
        if let Some(asset) = self.store.release(handle) {
            events.push(TextureEvent::Released { tag: asset.tag, handle });
        }
    }
}

fn scale_alpha(alpha: u8, opacity: f32) -> u8 {
    (alpha as f32 * opacity.clamp(0.0, 1.0)).round() as u8
}

#[cfg(test)]
mod tests {
    use super::{FrameInputs, LABELS_LAYER, SceneComposer, TextureEvent};
    use crate::config::EngineConfig;
    use foundation::ids::{PointId, RegionId};
    use gpu::renderer::{RenderCommand, RenderFrame};
    use layers::boundaries::{BoundaryDataset, Polygon, Region};
    use layers::region_map::{RegionMap, RegionSet};
    use layers::textures::TextureTag;
    use runtime::theme::Theme;
    use scene::camera::CameraRig;
    use scene::markers::MarkerField;
    use scene::points::{GeoPoint, PointCatalog};
    use scene::selection::Selection;
    use scene::view::ViewCamera;

    fn square(lon0: f64, lat0: f64, size: f64) -> Polygon {
        Polygon::new(vec![vec![
            [lon0, lat0],
            [lon0 + size, lat0],
            [lon0 + size, lat0 + size],
            [lon0, lat0 + size],
            [lon0, lat0],
        ]])
    }

    fn dataset() -> BoundaryDataset {
        BoundaryDataset::new(vec![
            Region {
                id: Some(RegionId(4)),
                name: Some("Four".into()),
                polygons: vec![square(0.0, 0.0, 20.0)],
            },
            Region {
                id: Some(RegionId(76)),
                name: Some("Seventy-six".into()),
                polygons: vec![square(-60.0, -30.0, 40.0)],
            },
        ])
    }

    fn config() -> EngineConfig {
        let mut cfg = EngineConfig::default();
        cfg.atlas.width = 180;
        cfg.atlas.height = 90;
        cfg
    }

    fn region_map() -> RegionMap {
        let mut map = RegionMap::new();
        map.insert("a", RegionSet::new([RegionId(4)]));
        map.insert("b", RegionSet::new([RegionId(76), RegionId(999)]));
        map.insert("ghost", RegionSet::new([RegionId(999)]));
        map
    }

    fn built_count(events: &[TextureEvent]) -> usize {
        events.iter().filter(|e| matches!(e, TextureEvent::Built { .. })).count()
    }

    #[test]
    fn starts_with_one_land_texture() {
        let (composer, events) = SceneComposer::new(dataset(), region_map(), &config());
        assert_eq!(built_count(&events), 1);
        assert_eq!(composer.textures().live_count(), 1);
        assert!(composer.land_texture().is_some());
        assert!(composer.highlight_texture().is_none());
    }

    #[test]
    fn highlight_follows_active_point_and_skips_unknown_regions() {
        let (mut composer, _) = SceneComposer::new(dataset(), region_map(), &config());

        let events = composer.sync_highlight(Some(&PointId::from("b")));
        assert_eq!(built_count(&events), 1);
        assert_eq!(
            composer.highlighted_regions(),
            Some(&RegionSet::new([RegionId(76)]))
        );
        assert_eq!(composer.textures().live_count(), 2);

        // Same point again: nothing rebuilt.
        assert!(composer.sync_highlight(Some(&PointId::from("b"))).is_empty());

        let events = composer.sync_highlight(Some(&PointId::from("a")));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TextureEvent::Released { .. }));
        assert_eq!(composer.textures().live_count(), 2);

        // Only unknown ids: highlight cleared, nothing built.
        let events = composer.sync_highlight(Some(&PointId::from("ghost")));
        assert_eq!(built_count(&events), 0);
        assert!(composer.highlight_texture().is_none());
        assert_eq!(composer.textures().live_count(), 1);
    }

    #[test]
    fn theme_switch_replaces_textures_in_place() {
        let (mut composer, _) = SceneComposer::new(dataset(), region_map(), &config());
        composer.sync_highlight(Some(&PointId::from("a")));
        let before = composer.land_texture();

        let events = composer.set_theme(Theme::Light);
        assert_eq!(built_count(&events), 2);
        assert_eq!(events.len(), 4);
        assert_ne!(composer.land_texture(), before);
        assert_eq!(composer.textures().live_count(), 2);
        assert!(composer.set_theme(Theme::Light).is_empty());
    }

    #[test]
    fn texture_lookup_by_tag_tracks_the_current_theme() {
        let (mut composer, _) = SceneComposer::new(dataset(), region_map(), &config());
        let dark = TextureTag::land(Theme::Dark);
        assert_eq!(composer.texture_for(&dark).map(|t| &t.tag), Some(&dark));

        composer.sync_highlight(Some(&PointId::from("a")));
        let highlight = TextureTag::highlight(Theme::Dark, RegionSet::new([RegionId(4)]));
        assert!(composer.texture_for(&highlight).is_some_and(|t| t.tag.is_highlight()));

        composer.set_theme(Theme::Light);
        assert!(composer.texture_for(&dark).is_none());
        assert!(composer.texture_for(&TextureTag::land(Theme::Light)).is_some());
    }

    #[test]
    fn compose_orders_layers_and_references_live_textures() {
        let (mut composer, _) = SceneComposer::new(dataset(), region_map(), &config());
        let catalog = PointCatalog::new(vec![
            GeoPoint::new("a", "Alpha", 10.0, 10.0),
            GeoPoint::new("b", "Bravo", -10.0, -40.0),
        ])
        .expect("catalog");
        let markers = MarkerField::new(&catalog, 1.0, Default::default());
        let selection = Selection::with_selected(0);
        composer.sync_highlight(Some(&PointId::from("a")));

        let rig = CameraRig::facing(Default::default(), catalog.points()[0].position.to_cartesian(1.0));
        let view = ViewCamera::from_rig(&rig, 800, 600);
        let mut frame = RenderFrame::default();
        composer.compose(
            &mut frame,
            &FrameInputs {
                catalog: &catalog,
                markers: &markers,
                selection: &selection,
                view: &view,
            },
        );

        assert_eq!(
            frame.kinds(),
            vec![
                "sphere",
                "land",
                "land_glow",
                "highlight",
                "atmosphere",
                "graticule",
                "ring",
                "markers",
                "label"
            ]
        );
        assert_eq!(frame.label(), Some("Alpha"));
        assert!(matches!(
            frame.commands.last(),
            Some(RenderCommand::Label { layer: LABELS_LAYER, .. })
        ));
        assert_eq!(frame.marker_count(), 2);
        for handle in frame.textures() {
            assert!(composer.textures().contains(handle));
        }
    }

    #[test]
    fn shutdown_releases_everything() {
        let (mut composer, _) = SceneComposer::new(dataset(), region_map(), &config());
        composer.sync_highlight(Some(&PointId::from("a")));
        assert_eq!(composer.shutdown(), 2);
        assert_eq!(composer.textures().live_count(), 0);
        assert!(composer.land_texture().is_none());
    }
}
