//! CPU raster surfaces for texture painting.
//!
//! Painting is two-stage: geometry accumulates coverage in a [`Mask`] (fills
//! via earcut triangles, strokes via anti-aliased capsules), then the mask is
//! composited source-over onto an RGBA8 [`Raster`] in one colour. Everything
//! is plain `f32` arithmetic in a fixed iteration order, so the same input
//! always produces the same bytes.

use std::fmt;

use earcutr::earcut;
use runtime::theme::Color;

/// Largest accepted raster side, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    ZeroSize,
    TooLarge { width: u32, height: u32 },
    Alloc { bytes: usize },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::ZeroSize => write!(f, "raster has a zero dimension"),
            SurfaceError::TooLarge { width, height } => {
                write!(f, "raster {width}x{height} exceeds {MAX_DIMENSION} per side")
            }
            SurfaceError::Alloc { bytes } => write!(f, "failed to allocate {bytes} bytes"),
        }
    }
}

impl std::error::Error for SurfaceError {}

fn allocate<T: Copy>(width: u32, height: u32, per_pixel: usize, fill: T) -> Result<Vec<T>, SurfaceError> {
    if width == 0 || height == 0 {
        return Err(SurfaceError::ZeroSize);
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(SurfaceError::TooLarge { width, height });
    }
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(per_pixel))
        .ok_or(SurfaceError::TooLarge { width, height })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| SurfaceError::Alloc {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    data.resize(len, fill);
    Ok(data)
}

/// Row-major RGBA8 image, row 0 at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn try_new(width: u32, height: u32, background: Color) -> Result<Self, SurfaceError> {
        let mut pixels = allocate(width, height, 4, 0u8)?;
        for px in pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[background.r, background.g, background.b, background.a]);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Source-over composite of `color` weighted by mask coverage and `opacity`.
    pub fn composite(&mut self, mask: &Mask, color: Color, opacity: f32) {
        if mask.width != self.width || mask.height != self.height {
            tracing::warn!(
                raster = %format_args!("{}x{}", self.width, self.height),
                mask = %format_args!("{}x{}", mask.width, mask.height),
                "mask size mismatch, skipping composite"
            );
            return;
        }
        let [sr, sg, sb, sa] = color.to_f32();
        let opacity = opacity.clamp(0.0, 1.0);
        for (px, &cov) in self.pixels.chunks_exact_mut(4).zip(mask.data.iter()) {
            let a = cov * opacity * sa;
            if a <= 0.0 {
                continue;
            }
            let inv = 1.0 - a;
            let blend = |src: f32, dst: u8| to_u8(src * a + dst as f32 / 255.0 * inv);
            px[0] = blend(sr, px[0]);
            px[1] = blend(sg, px[1]);
            px[2] = blend(sb, px[2]);
            px[3] = to_u8(a + px[3] as f32 / 255.0 * inv);
        }
    }
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Per-pixel coverage in `[0, 1]`, same layout as [`Raster`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl Mask {
    pub fn try_new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        Ok(Self {
            width,
            height,
            data: allocate(width, height, 1, 0.0f32)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Number of pixels with any coverage.
    pub fn covered(&self) -> usize {
        self.data.iter().filter(|&&c| c > 0.0).count()
    }

    fn raise(&mut self, x: i64, y: i64, cov: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = y as usize * self.width as usize + x as usize;
        if cov > self.data[i] {
            self.data[i] = cov.min(1.0);
        }
    }

    /// Fills a polygon given in pixel space (outer ring first, then holes).
    ///
    /// Returns the number of triangles painted; 0 when triangulation fails.
    pub fn fill_polygon(&mut self, rings: &[Vec<[f64; 2]>]) -> usize {
        let mut coords: Vec<f64> = Vec::new();
        let mut holes: Vec<usize> = Vec::new();
        let mut vertices = 0usize;

        for (ring_i, ring) in rings.iter().enumerate() {
            let ring = open_ring(ring);
            if ring.len() < 3 {
                if ring_i == 0 {
                    return 0;
                }
                continue;
            }
            if ring_i > 0 {
                holes.push(vertices);
            }
            for p in ring {
                coords.push(p[0]);
                coords.push(p[1]);
            }
            vertices += ring.len();
        }
        if vertices < 3 {
            return 0;
        }

        let indices = match earcut(&coords, &holes, 2) {
            Ok(ix) => ix,
            Err(_) => return 0,
        };

        let vertex = |i: usize| [coords[2 * i], coords[2 * i + 1]];
        let mut painted = 0;
        for tri in indices.chunks_exact(3) {
            self.fill_triangle(vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
            painted += 1;
        }
        painted
    }

    /// Rasterizes one triangle at pixel centers with a top-left fill rule, so
    /// pixels on an edge shared by two triangles are painted exactly once.
    pub fn fill_triangle(&mut self, a: [f64; 2], b: [f64; 2], c: [f64; 2]) {
        let (a, b, c) = if edge(a, b, c) < 0.0 { (a, c, b) } else { (a, b, c) };
        if edge(a, b, c) == 0.0 {
            return;
        }

        let min_x = a[0].min(b[0]).min(c[0]).floor().max(0.0) as i64;
        let min_y = a[1].min(b[1]).min(c[1]).floor().max(0.0) as i64;
        let max_x = (a[0].max(b[0]).max(c[0]).ceil() as i64).min(self.width as i64 - 1);
        let max_y = (a[1].max(b[1]).max(c[1]).ceil() as i64).min(self.height as i64 - 1);

        let tl_ab = is_top_left(a, b);
        let tl_bc = is_top_left(b, c);
        let tl_ca = is_top_left(c, a);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = [x as f64 + 0.5, y as f64 + 0.5];
                if inside(edge(a, b, p), tl_ab)
                    && inside(edge(b, c, p), tl_bc)
                    && inside(edge(c, a, p), tl_ca)
                {
                    self.raise(x, y, 1.0);
                }
            }
        }
    }

    /// Anti-aliased stroke of a polyline: each segment is a capsule of
    /// `width_px`, with coverage `clamp(width/2 + 0.5 - distance, 0, 1)`.
    pub fn stroke_polyline(&mut self, points: &[[f64; 2]], width_px: f64, closed: bool) {
        if points.len() < 2 || !(width_px > 0.0) {
            return;
        }
        for pair in points.windows(2) {
            self.stroke_segment(pair[0], pair[1], width_px);
        }
        if closed && let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if first != last {
                self.stroke_segment(last, first, width_px);
            }
        }
    }

    fn stroke_segment(&mut self, a: [f64; 2], b: [f64; 2], width_px: f64) {
        let half = width_px * 0.5;
        let reach = half + 1.0;
        let min_x = (a[0].min(b[0]) - reach).floor().max(0.0) as i64;
        let min_y = (a[1].min(b[1]) - reach).floor().max(0.0) as i64;
        let max_x = ((a[0].max(b[0]) + reach).ceil() as i64).min(self.width as i64 - 1);
        let max_y = ((a[1].max(b[1]) + reach).ceil() as i64).min(self.height as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let d = distance_to_segment([x as f64 + 0.5, y as f64 + 0.5], a, b);
                let cov = (half + 0.5 - d).clamp(0.0, 1.0) as f32;
                if cov > 0.0 {
                    self.raise(x, y, cov);
                }
            }
        }
    }

    /// Separable box blur. Columns wrap horizontally (the raster is a
    /// longitude band) and clamp vertically.
    pub fn blurred(&self, radius: u32) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let r = radius as i64;
        let norm = 1.0 / (2 * radius + 1) as f32;

        let mut horizontal = vec![0.0f32; self.data.len()];
        for y in 0..h {
            let row = &self.data[y * w..(y + 1) * w];
            for x in 0..w {
                let mut sum = 0.0f32;
                for k in -r..=r {
                    let sx = (x as i64 + k).rem_euclid(w as i64) as usize;
                    sum += row[sx];
                }
                horizontal[y * w + x] = sum * norm;
            }
        }

        let mut data = vec![0.0f32; self.data.len()];
        for y in 0..h {
            for x in 0..w {
                let mut sum = 0.0f32;
                for k in -r..=r {
                    let sy = (y as i64 + k).clamp(0, h as i64 - 1) as usize;
                    sum += horizontal[sy * w + x];
                }
                data[y * w + x] = sum * norm;
            }
        }

        Mask {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

fn open_ring(ring: &[[f64; 2]]) -> &[[f64; 2]] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() >= 2 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn edge(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

// Rows grow downward: with positive winding, a top edge runs +x on a
// horizontal line and a left edge runs upward.
fn is_top_left(a: [f64; 2], b: [f64; 2]) -> bool {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    (dy == 0.0 && dx > 0.0) || dy < 0.0
}

fn inside(w: f64, top_left: bool) -> bool {
    w > 0.0 || (w == 0.0 && top_left)
}

fn distance_to_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let abx = b[0] - a[0];
    let aby = b[1] - a[1];
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        (((p[0] - a[0]) * abx + (p[1] - a[1]) * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = p[0] - (a[0] + abx * t);
    let dy = p[1] - (a[1] + aby * t);
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{MAX_DIMENSION, Mask, Raster, SurfaceError};
    use runtime::theme::Color;

    fn pixel(raster: &Raster, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * raster.width() as usize + x as usize) * 4;
        [
            raster.pixels[i],
            raster.pixels[i + 1],
            raster.pixels[i + 2],
            raster.pixels[i + 3],
        ]
    }

    #[test]
    fn rejects_unusable_sizes() {
        assert_eq!(Raster::try_new(0, 4, Color::TRANSPARENT), Err(SurfaceError::ZeroSize));
        assert!(matches!(
            Raster::try_new(MAX_DIMENSION + 1, 1, Color::TRANSPARENT),
            Err(SurfaceError::TooLarge { .. })
        ));
    }

    #[test]
    fn square_fill_covers_exact_pixels() {
        let mut mask = Mask::try_new(10, 10).expect("mask");
        let tris = mask.fill_polygon(&[vec![[2.0, 2.0], [6.0, 2.0], [6.0, 6.0], [2.0, 6.0], [2.0, 2.0]]]);
        assert_eq!(tris, 2);
        // Pixel centers 2.5..5.5 in both axes.
        assert_eq!(mask.covered(), 16);
        assert_eq!(mask.coverage(2, 2), 1.0);
        assert_eq!(mask.coverage(6, 6), 0.0);
    }

    #[test]
    fn holes_are_left_empty() {
        let mut mask = Mask::try_new(12, 12).expect("mask");
        mask.fill_polygon(&[
            vec![[0.0, 0.0], [12.0, 0.0], [12.0, 12.0], [0.0, 12.0]],
            vec![[4.0, 4.0], [8.0, 4.0], [8.0, 8.0], [4.0, 8.0]],
        ]);
        assert_eq!(mask.covered(), 144 - 16);
        assert_eq!(mask.coverage(5, 5), 0.0);
    }

    #[test]
    fn shared_edge_paints_each_pixel_once() {
        // Two triangles sharing a diagonal that passes through pixel centers.
        let mut a = Mask::try_new(8, 8).expect("mask");
        a.fill_triangle([0.5, 0.5], [7.5, 0.5], [7.5, 7.5]);
        let mut b = Mask::try_new(8, 8).expect("mask");
        b.fill_triangle([0.5, 0.5], [7.5, 7.5], [0.5, 7.5]);
        for y in 0..8 {
            for x in 0..8 {
                assert!(
                    a.coverage(x, y) + b.coverage(x, y) <= 1.0,
                    "pixel ({x},{y}) painted twice"
                );
            }
        }
    }

    #[test]
    fn stroke_is_antialiased_and_bounded() {
        let mut mask = Mask::try_new(20, 9).expect("mask");
        mask.stroke_polyline(&[[2.0, 4.5], [18.0, 4.5]], 2.0, false);
        assert_eq!(mask.coverage(10, 4), 1.0);
        // Center 1 px away: 1 + 0.5 - 1 = 0.5.
        assert!((mask.coverage(10, 3) - 0.5).abs() < 1e-6);
        assert_eq!(mask.coverage(10, 1), 0.0);
    }

    #[test]
    fn blur_spreads_and_wraps_horizontally() {
        let mut mask = Mask::try_new(8, 3).expect("mask");
        mask.fill_triangle([0.0, 0.0], [1.0, 0.0], [0.0, 3.0]);
        mask.fill_triangle([1.0, 0.0], [1.0, 3.0], [0.0, 3.0]);
        let blurred = mask.blurred(1);
        assert!(blurred.coverage(7, 1) > 0.0);
        assert!(blurred.coverage(1, 1) > 0.0);
        assert_eq!(blurred.coverage(4, 1), 0.0);
    }

    #[test]
    fn composite_blends_source_over() {
        let mut raster = Raster::try_new(2, 1, Color::rgb(0, 0, 0)).expect("raster");
        let mut mask = Mask::try_new(2, 1).expect("mask");
        mask.fill_triangle([0.0, -1.0], [1.0, -1.0], [0.0, 3.0]);
        mask.fill_triangle([1.0, -1.0], [1.0, 3.0], [0.0, 3.0]);
        raster.composite(&mask, Color::rgb(255, 255, 255), 0.5);
        assert_eq!(pixel(&raster, 0, 0), [128, 128, 128, 255]);
        assert_eq!(pixel(&raster, 1, 0), [0, 0, 0, 255]);
    }
}
