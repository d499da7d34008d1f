use runtime::theme::{Color, Palette};

/// Reference texture width the palette's pixel widths are tuned for.
pub const REFERENCE_WIDTH_PX: u32 = 2048;

const GLOW_RADIUS_PX: f32 = 6.0;
const BLEED_WIDTH_FACTOR: f32 = 5.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LandStyle {
    pub fill: Color,
    pub glow: Color,
    pub glow_radius_px: u32,
    pub stroke: Color,
    pub stroke_width_px: f32,
}

impl LandStyle {
    /// Pixel sizes scale with the texture width so a smaller atlas keeps the
    /// same look on the sphere.
    pub fn new(palette: &Palette, width_px: u32) -> Self {
        let scale = resolution_scale(width_px);
        Self {
            fill: palette.land_fill,
            glow: palette.land_glow,
            glow_radius_px: (GLOW_RADIUS_PX * scale).round().max(1.0) as u32,
            stroke: palette.land_stroke,
            stroke_width_px: palette.land_stroke_width_px * scale,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HighlightStyle {
    pub fill: Color,
    pub bleed: Color,
    pub bleed_width_px: f32,
    pub stroke: Color,
    pub stroke_width_px: f32,
}

impl HighlightStyle {
    pub fn new(palette: &Palette, width_px: u32) -> Self {
        let stroke = palette.highlight_stroke_width_px * resolution_scale(width_px);
        Self {
            fill: palette.highlight_fill,
            bleed: palette.highlight_bleed,
            bleed_width_px: stroke * BLEED_WIDTH_FACTOR,
            stroke: palette.highlight_stroke,
            stroke_width_px: stroke,
        }
    }
}

fn resolution_scale(width_px: u32) -> f32 {
    (width_px as f32 / REFERENCE_WIDTH_PX as f32).max(0.25)
}
