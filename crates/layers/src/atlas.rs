//! Procedural equirectangular textures for the globe surface.
//!
//! Land is painted in three passes onto a transparent raster (the ocean is
//! the bare sphere underneath): a blurred glow of the land coverage, the land
//! fill, then boundary strokes. Region highlights use the same projection,
//! restricted to the requested regions: fill, a wide soft bleed stroke, and a
//! bright stroke.

use foundation::math::Equirectangular;
use runtime::theme::{Color, Theme};
use serde::{Deserialize, Serialize};

use crate::boundaries::{BoundaryDataset, Polygon, Region, Ring};
use crate::raster::{Mask, Raster, SurfaceError};
use crate::region_map::RegionSet;
use crate::symbology::{HighlightStyle, LandStyle};
use crate::textures::{TextureAsset, TextureTag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 1024,
        }
    }
}

/// Painter for land and region-highlight textures.
#[derive(Debug, Clone)]
pub struct TextureAtlasBuilder {
    dataset: BoundaryDataset,
    config: AtlasConfig,
}

/// One ring in pixel space, unwrapped across the antimeridian.
#[derive(Debug, Clone, PartialEq)]
struct PixelRing {
    /// Boundary polyline; closed unless the ring circles a pole.
    line: Vec<[f64; 2]>,
    closed: bool,
    /// Fill outline. For a polar ring this runs along the raster edge at the pole.
    outline: Vec<[f64; 2]>,
}

impl TextureAtlasBuilder {
    pub fn new(dataset: BoundaryDataset, config: AtlasConfig) -> Self {
        Self { dataset, config }
    }

    pub fn dataset(&self) -> &BoundaryDataset {
        &self.dataset
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn build_land_texture(&self, theme: Theme) -> TextureAsset {
        let tag = TextureTag::land(theme);
        let style = LandStyle::new(theme.palette(), self.config.width);
        match self.paint_land(&style) {
            Ok(raster) => self.finish(tag, raster),
            Err(err) => fallback(tag, style.fill, &err),
        }
    }

    /// Highlight texture for `regions`. Ids missing from the dataset are
    /// ignored here; callers filter them beforehand to decide whether a
    /// highlight is wanted at all.
    pub fn build_region_highlight(&self, theme: Theme, regions: &RegionSet) -> TextureAsset {
        let tag = TextureTag::highlight(theme, regions.clone());
        let style = HighlightStyle::new(theme.palette(), self.config.width);
        match self.paint_highlight(&style, regions) {
            Ok(raster) => self.finish(tag, raster),
            Err(err) => fallback(tag, style.fill, &err),
        }
    }

    fn finish(&self, tag: TextureTag, raster: Raster) -> TextureAsset {
        let (width, height) = (raster.width(), raster.height());
        let asset = TextureAsset::new(tag, width, height, raster.into_pixels(), false);
        tracing::info!(
            tag = %asset.tag,
            size = %format_args!("{width}x{height}"),
            digest = %asset.digest,
            "texture built"
        );
        asset
    }

    fn paint_land(&self, style: &LandStyle) -> Result<Raster, SurfaceError> {
        let (w, h) = (self.config.width, self.config.height);
        let mut raster = Raster::try_new(w, h, Color::TRANSPARENT)?;
        let mut fill = Mask::try_new(w, h)?;
        let mut stroke = Mask::try_new(w, h)?;

        let regions = self.dataset.regions().iter();
        self.paint_regions(regions, &mut fill, &mut stroke, style.stroke_width_px as f64);

        raster.composite(&fill.blurred(style.glow_radius_px), style.glow, 1.0);
        raster.composite(&fill, style.fill, 1.0);
        raster.composite(&stroke, style.stroke, 1.0);
        Ok(raster)
    }

    fn paint_highlight(&self, style: &HighlightStyle, ids: &RegionSet) -> Result<Raster, SurfaceError> {
        let (w, h) = (self.config.width, self.config.height);
        let mut raster = Raster::try_new(w, h, Color::TRANSPARENT)?;
        let mut fill = Mask::try_new(w, h)?;
        let mut bleed = Mask::try_new(w, h)?;
        let mut stroke = Mask::try_new(w, h)?;

        let selected: Vec<&Region> = ids.iter().filter_map(|id| self.dataset.region(id)).collect();
        self.paint_regions(selected.iter().copied(), &mut fill, &mut bleed, style.bleed_width_px as f64);
        for region in &selected {
            for polygon in &region.polygons {
                for ring in self.project_polygon(polygon) {
                    stroke_ring(&mut stroke, &ring, style.stroke_width_px as f64, self.projection().wrap_width());
                }
            }
        }

        raster.composite(&fill, style.fill, 1.0);
        raster.composite(&bleed, style.bleed, 1.0);
        raster.composite(&stroke, style.stroke, 1.0);
        Ok(raster)
    }

    fn paint_regions<'r>(
        &self,
        regions: impl Iterator<Item = &'r Region>,
        fill: &mut Mask,
        stroke: &mut Mask,
        stroke_width_px: f64,
    ) {
        let wrap = self.projection().wrap_width();
        for region in regions {
            for polygon in &region.polygons {
                let rings = self.project_polygon(polygon);
                if rings.is_empty() {
                    continue;
                }
                fill_rings(fill, &rings, wrap);
                for ring in &rings {
                    stroke_ring(stroke, ring, stroke_width_px, wrap);
                }
            }
        }
    }

    fn projection(&self) -> Equirectangular {
        Equirectangular::new(self.config.width, self.config.height)
    }

    fn project_polygon(&self, polygon: &Polygon) -> Vec<PixelRing> {
        let projection = self.projection();
        let to_px = |p: &[f64; 2]| {
            let (x, y) = projection.project(p[0], p[1]);
            [x, y]
        };
        let mut out: Vec<PixelRing> = Vec::with_capacity(polygon.rings.len());
        let mut anchor_lon: Option<f64> = None;
        for ring in &polygon.rings {
            let Some(unwrapped) = unwrap_ring(ring, anchor_lon) else {
                continue;
            };
            anchor_lon.get_or_insert(unwrapped.lonlat[0][0]);
            let mut line: Vec<[f64; 2]> = unwrapped.lonlat.iter().map(to_px).collect();
            let mut outline = line.clone();
            let closed = unwrapped.polar.is_none();
            if let Some(polar) = unwrapped.polar {
                let first = unwrapped.lonlat[0];
                let end = [first[0] + polar.turn, first[1]];
                line.push(to_px(&end));
                outline.push(to_px(&end));
                outline.push(to_px(&[end[0], polar.pole_lat]));
                outline.push(to_px(&[first[0], polar.pole_lat]));
            }
            out.push(PixelRing {
                line,
                closed,
                outline,
            });
        }
        out
    }
}

fn fallback(tag: TextureTag, color: Color, err: &SurfaceError) -> TextureAsset {
    tracing::warn!(tag = %tag, error = %err, "raster surface unavailable, using 1x1 fallback");
    TextureAsset::new(tag, 1, 1, vec![color.r, color.g, color.b, color.a], true)
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct PolarClosure {
    /// Net longitude travelled around the ring (±360).
    turn: f64,
    pole_lat: f64,
}

struct UnwrappedRing {
    lonlat: Vec<[f64; 2]>,
    polar: Option<PolarClosure>,
}

/// Makes longitudes continuous (no step larger than 180°) and shifts the ring
/// by whole turns so it starts within half a turn of `anchor_lon`.
///
/// A ring whose steps (closing step included) add up to a full turn circles a
/// pole: the one on the side of the ring's mean latitude.
fn unwrap_ring(ring: &Ring, anchor_lon: Option<f64>) -> Option<UnwrappedRing> {
    let mut pts: Vec<[f64; 2]> = ring
        .iter()
        .copied()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .collect();
    if pts.len() >= 2 && pts.first() == pts.last() {
        pts.pop();
    }
    if pts.len() < 3 {
        return None;
    }

    let base = match anchor_lon {
        Some(anchor) => ((anchor - pts[0][0]) / 360.0).round() * 360.0,
        None => 0.0,
    };
    let mut turns = 0.0;
    let mut prev = pts[0][0];
    let mut lonlat = Vec::with_capacity(pts.len());
    for p in &pts {
        turns += wrap_step(p[0] - prev);
        prev = p[0];
        lonlat.push([p[0] + base + turns, p[1].clamp(-90.0, 90.0)]);
    }

    let turn = turns + wrap_step(pts[0][0] - prev);
    let polar = (turn != 0.0).then(|| {
        let mean = lonlat.iter().map(|p| p[1]).sum::<f64>() / lonlat.len() as f64;
        PolarClosure {
            turn,
            pole_lat: if mean < 0.0 { -90.0 } else { 90.0 },
        }
    });

    Some(UnwrappedRing { lonlat, polar })
}

fn wrap_step(d: f64) -> f64 {
    if d > 180.0 {
        -360.0
    } else if d < -180.0 {
        360.0
    } else {
        0.0
    }
}

fn horizontal_range(points: &[[f64; 2]]) -> (f64, f64) {
    points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])))
}

/// Horizontal copies (in multiples of `wrap`) that overlap `[0, wrap]`.
fn wrap_offsets(min_x: f64, max_x: f64, wrap: f64) -> Vec<f64> {
    let mut offsets = Vec::new();
    let mut k = (-(max_x / wrap)).floor() as i64;
    let last = ((wrap - min_x) / wrap).ceil() as i64;
    while k <= last {
        let off = k as f64 * wrap;
        if max_x + off >= 0.0 && min_x + off <= wrap {
            offsets.push(off);
        }
        k += 1;
    }
    offsets
}

fn fill_rings(mask: &mut Mask, rings: &[PixelRing], wrap: f64) {
    let Some(outer) = rings.first() else {
        return;
    };
    let (min_x, max_x) = horizontal_range(&outer.outline);
    for off in wrap_offsets(min_x, max_x, wrap) {
        let shifted: Vec<Vec<[f64; 2]>> = rings
            .iter()
            .map(|ring| ring.outline.iter().map(|p| [p[0] + off, p[1]]).collect())
            .collect();
        mask.fill_polygon(&shifted);
    }
}

fn stroke_ring(mask: &mut Mask, ring: &PixelRing, width_px: f64, wrap: f64) {
    let (min_x, max_x) = horizontal_range(&ring.line);
    for off in wrap_offsets(min_x - width_px, max_x + width_px, wrap) {
        let shifted: Vec<[f64; 2]> = ring.line.iter().map(|p| [p[0] + off, p[1]]).collect();
        mask.stroke_polyline(&shifted, width_px, ring.closed);
    }
}

#[cfg(test)]
mod tests {
    use super::{AtlasConfig, TextureAtlasBuilder, unwrap_ring, wrap_offsets};
    use crate::boundaries::fixtures::{region, small_world};
    use crate::boundaries::{BoundaryDataset, Polygon};
    use crate::region_map::RegionSet;
    use foundation::ids::RegionId;
    use foundation::math::Equirectangular;
    use runtime::theme::Theme;

    fn builder(dataset: BoundaryDataset) -> TextureAtlasBuilder {
        TextureAtlasBuilder::new(dataset, AtlasConfig { width: 360, height: 180 })
    }

    fn alpha_at(asset: &crate::textures::TextureAsset, lon: f64, lat: f64) -> u8 {
        let proj = Equirectangular::new(asset.width, asset.height);
        let (x, y) = proj.project(lon, lat);
        let i = ((y as usize) * asset.width as usize + x as usize) * 4;
        asset.pixels[i + 3]
    }

    #[test]
    fn land_texture_paints_land_and_leaves_ocean_clear() {
        let atlas = builder(small_world());
        let tex = atlas.build_land_texture(Theme::Dark);
        assert!(!tex.fallback);
        assert_eq!((tex.width, tex.height), (360, 180));
        assert_eq!(tex.pixels.len(), 360 * 180 * 4);
        assert_eq!(alpha_at(&tex, 10.0, 10.0), 255);
        assert_eq!(alpha_at(&tex, -170.0, -60.0), 0);
    }

    #[test]
    fn builds_are_deterministic() {
        let atlas = builder(small_world());
        let ids = RegionSet::new([RegionId(76)]);
        let a = atlas.build_region_highlight(Theme::Light, &ids);
        let b = atlas.build_region_highlight(Theme::Light, &ids);
        assert_eq!(a.digest, b.digest);
        assert!(a.pixels == b.pixels);
        assert_ne!(a.digest, atlas.build_region_highlight(Theme::Dark, &ids).digest);
    }

    #[test]
    fn highlight_covers_only_requested_regions() {
        let atlas = builder(small_world());
        let tex = atlas.build_region_highlight(Theme::Dark, &RegionSet::new([RegionId(4), RegionId(76)]));
        assert!(alpha_at(&tex, 10.0, 10.0) > 0);
        assert!(alpha_at(&tex, -55.0, -25.0) > 0);
        assert_eq!(alpha_at(&tex, 112.0, 42.0), 0);
        // Inside the hole of region 76.
        assert_eq!(alpha_at(&tex, -40.0, -10.0), 0);
    }

    #[test]
    fn antimeridian_polygon_paints_both_edges() {
        let ds = BoundaryDataset::new(vec![region(
            1,
            vec![Polygon::new(vec![vec![
                [170.0, -10.0],
                [-170.0, -10.0],
                [-170.0, 10.0],
                [170.0, 10.0],
            ]])],
        )]);
        let tex = builder(ds).build_land_texture(Theme::Dark);
        assert_eq!(alpha_at(&tex, 175.0, 0.0), 255);
        assert_eq!(alpha_at(&tex, -175.0, 0.0), 255);
        // Not the long way round.
        assert_eq!(alpha_at(&tex, 0.0, 0.0), 0);
    }

    #[test]
    fn polar_ring_closes_along_the_pole() {
        let plain = vec![[-10.0, -70.0], [10.0, -70.0], [10.0, -60.0]];
        assert!(unwrap_ring(&plain, None).expect("ring").polar.is_none());

        let around = vec![[-120.0, -70.0], [0.0, -75.0], [120.0, -72.0]];
        let polar = unwrap_ring(&around, None).expect("ring").polar.expect("polar");
        assert_eq!(polar.pole_lat, -90.0);
        assert_eq!(polar.turn.abs(), 360.0);

        let ds = BoundaryDataset::new(vec![region(10, vec![Polygon::new(vec![around])])]);
        let tex = builder(ds).build_land_texture(Theme::Dark);
        assert_eq!(alpha_at(&tex, 0.0, -85.0), 255);
        assert_eq!(alpha_at(&tex, 179.0, -85.0), 255);
        assert_eq!(alpha_at(&tex, 0.0, -40.0), 0);
    }

    #[test]
    fn oversized_surface_falls_back() {
        let atlas = TextureAtlasBuilder::new(
            small_world(),
            AtlasConfig {
                width: 100_000,
                height: 50_000,
            },
        );
        let tex = atlas.build_land_texture(Theme::Light);
        assert!(tex.fallback);
        assert_eq!((tex.width, tex.height), (1, 1));
        let fill = Theme::Light.palette().land_fill;
        assert_eq!(tex.pixels, vec![fill.r, fill.g, fill.b, fill.a]);

        let zero = TextureAtlasBuilder::new(small_world(), AtlasConfig { width: 0, height: 0 });
        assert!(zero.build_region_highlight(Theme::Dark, &RegionSet::new([RegionId(4)])).fallback);
    }

    #[test]
    fn wrap_offsets_cover_overlap_only() {
        assert_eq!(wrap_offsets(10.0, 20.0, 360.0), vec![0.0]);
        assert_eq!(wrap_offsets(350.0, 370.0, 360.0), vec![-360.0, 0.0]);
        assert_eq!(wrap_offsets(-10.0, 5.0, 360.0), vec![0.0, 360.0]);
    }
}
