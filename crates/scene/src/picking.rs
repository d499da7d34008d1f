use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::markers::MarkerField;
use crate::view::{Ray, ViewCamera};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    /// Catalog index of the marker.
    pub index: usize,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub globe_radius: f64,
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            globe_radius: 1.0,
            max_distance: 1.0e30,
        }
    }
}

/// Deterministic ray picking for markers.
///
/// Ordering contract:
/// - The closest marker hit along the ray wins.
/// - Equal distances resolve to the lower catalog index.
///
/// Markers hidden behind the globe are skipped: a hit only counts when it is
/// no farther than the globe surface hit plus one pick radius, so markers
/// right on the horizon stay pickable.
pub fn pick_ray(field: &MarkerField, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    let pick_radius = field.pick_radius();
    let occluder = ray
        .intersect_sphere(Vec3::ZERO, opts.globe_radius)
        .map(|t| t + pick_radius)
        .unwrap_or(f64::INFINITY);
    let limit = occluder.min(opts.max_distance);

    let mut best: Option<(f64, usize)> = None;
    for marker in field.markers() {
        let Some(t) = ray.intersect_sphere(marker.position, pick_radius) else {
            continue;
        };
        if t > limit {
            continue;
        }
        best = match best {
            None => Some((t, marker.index)),
            Some((bt, bi)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| marker.index.cmp(&bi));
                if ord.is_lt() {
                    Some((t, marker.index))
                } else {
                    Some((bt, bi))
                }
            }
        };
    }

    let (t, index) = best?;
    Some(PickHit {
        index,
        distance: t,
        point: ray.at(t),
    })
}

/// Screen picking wrapper.
pub fn pick_screen(
    field: &MarkerField,
    view: &ViewCamera,
    x_px: f64,
    y_px: f64,
    opts: PickOptions,
) -> Option<PickHit> {
    let ray = view.ray_through(x_px, y_px)?;
    pick_ray(field, ray, opts)
}
