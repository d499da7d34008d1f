use std::f64::consts::{PI, TAU};

/// Wraps an angle (radians) into `(-π, π]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let r = angle.rem_euclid(TAU);
    if r > PI { r - TAU } else { r }
}

/// Signed rotation that takes `from` to `to` the short way around.
///
/// The result lies in `(-π, π]` and `from + delta` is congruent to `to`
/// modulo `2π`. Exactly opposite angles resolve to `+π`.
pub fn shortest_angular_delta(from: f64, to: f64) -> f64 {
    wrap_angle(to - from)
}

#[cfg(test)]
mod tests {
    use super::{shortest_angular_delta, wrap_angle};
    use std::f64::consts::{PI, TAU};

    fn congruent(a: f64, b: f64) -> bool {
        let d = (a - b).rem_euclid(TAU);
        d < 1e-9 || TAU - d < 1e-9
    }

    #[test]
    fn wrap_keeps_range_half_open() {
        assert_eq!(wrap_angle(PI), PI);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn never_rotates_the_long_way_around() {
        // 170° -> -170° is a 20° step east, not 340° west.
        let d = shortest_angular_delta(170f64.to_radians(), (-170f64).to_radians());
        assert!((d - 20f64.to_radians()).abs() < 1e-12);

        let d = shortest_angular_delta((-170f64).to_radians(), 170f64.to_radians());
        assert!((d + 20f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn delta_is_bounded_and_congruent_over_a_sweep() {
        let samples: Vec<f64> = (-40..=40).map(|i| i as f64 * 0.37).collect();
        for &from in &samples {
            for &to in &samples {
                let d = shortest_angular_delta(from, to);
                assert!(d > -PI && d <= PI, "delta {d} out of range for {from} -> {to}");
                assert!(congruent(from + d, to), "{from} + {d} !~ {to}");
            }
        }
    }
}
