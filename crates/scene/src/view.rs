use foundation::math::Vec3;

use crate::camera::CameraRig;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub dir: Vec3,
}

impl Ray {
    /// `None` when `dir` cannot be normalized.
    pub fn new(origin: Vec3, dir: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            dir: dir.normalized()?,
        })
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Nearest non-negative hit distance against a sphere.
    ///
    /// A ray starting inside the sphere reports its exit point.
    pub fn intersect_sphere(&self, center: Vec3, radius: f64) -> Option<f64> {
        let oc = self.origin - center;
        let b = oc.dot(self.dir);
        let c = oc.dot(oc) - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 || !disc.is_finite() {
            return None;
        }
        let sq = disc.sqrt();
        let t0 = -b - sq;
        let t1 = -b + sq;
        if t0 >= 0.0 {
            Some(t0)
        } else if t1 >= 0.0 {
            Some(t1)
        } else {
            None
        }
    }
}

/// Perspective camera looking at the globe center with +Y up.
///
/// Screen space is in pixels with the origin at the top-left corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewCamera {
    pub eye: Vec3,
    pub width: u32,
    pub height: u32,
    pub fov_y_rad: f64,
    pub near: f64,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl ViewCamera {
    pub const DEFAULT_NEAR: f64 = 0.01;

    pub fn new(eye: Vec3, width: u32, height: u32, fov_y_rad: f64) -> Self {
        let forward = (-eye).normalized().unwrap_or(Vec3::new(0.0, 0.0, -1.0));
        let right = forward
            .cross(Vec3::Y)
            .normalized()
            .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
        let up = right.cross(forward);
        Self {
            eye,
            width: width.max(1),
            height: height.max(1),
            fov_y_rad,
            near: Self::DEFAULT_NEAR,
            forward,
            right,
            up,
        }
    }

    pub fn from_rig(rig: &CameraRig, width: u32, height: u32) -> Self {
        Self::new(
            rig.eye(),
            width,
            height,
            rig.config().fov_y_deg.to_radians(),
        )
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    fn half_extents(&self) -> (f64, f64) {
        let ty = (self.fov_y_rad * 0.5).tan();
        (ty * self.aspect(), ty)
    }

    /// Pixel position of `world`, or `None` when it is behind the near plane.
    pub fn project(&self, world: Vec3) -> Option<[f64; 2]> {
        let rel = world - self.eye;
        let depth = rel.dot(self.forward);
        if depth <= self.near || !depth.is_finite() {
            return None;
        }
        let (tx, ty) = self.half_extents();
        let x_ndc = rel.dot(self.right) / (depth * tx);
        let y_ndc = rel.dot(self.up) / (depth * ty);
        Some([
            (x_ndc + 1.0) * 0.5 * self.width as f64,
            (1.0 - y_ndc) * 0.5 * self.height as f64,
        ])
    }

    /// Ray from the eye through a pixel position.
    pub fn ray_through(&self, x_px: f64, y_px: f64) -> Option<Ray> {
        if !x_px.is_finite() || !y_px.is_finite() {
            return None;
        }
        let (tx, ty) = self.half_extents();
        let x_ndc = 2.0 * x_px / self.width as f64 - 1.0;
        let y_ndc = 1.0 - 2.0 * y_px / self.height as f64;
        let dir = self.forward + self.right * (x_ndc * tx) + self.up * (y_ndc * ty);
        Ray::new(self.eye, dir)
    }

    /// Whether a surface point with outward `normal` faces the eye.
    pub fn faces_camera(&self, point: Vec3, normal: Vec3) -> bool {
        normal.dot(self.eye - point) > 0.0
    }
}
