/// Equirectangular (plate carrée) mapping between geographic degrees and raster pixels.
///
/// Pixel `x` grows eastward from longitude -180°, pixel `y` grows southward
/// from latitude +90°. Coordinates are continuous; pixel `(c, r)` covers
/// `[c, c + 1) × [r, r + 1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Equirectangular {
    pub width: u32,
    pub height: u32,
}

impl Equirectangular {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let x = (lon_deg + 180.0) / 360.0 * self.width as f64;
        let y = (90.0 - lat_deg) / 180.0 * self.height as f64;
        (x, y)
    }

    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = x / self.width as f64 * 360.0 - 180.0;
        let lat = 90.0 - y / self.height as f64 * 180.0;
        (lon, lat)
    }

    /// Geographic coordinate of the center of pixel `(col, row)` as `(lon, lat)`.
    pub fn texel_center(&self, col: u32, row: u32) -> (f64, f64) {
        self.unproject(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Horizontal pixel span of one full turn of longitude.
    pub fn wrap_width(&self) -> f64 {
        self.width as f64
    }
}
