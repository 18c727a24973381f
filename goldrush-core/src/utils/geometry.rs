/*!
Provide geometry tools.
*/

extern crate nalgebra as na;
use std::f32::consts::PI;

use libm::atan2f;
use na::{Vector2, Vector3};

pub fn mod2pi(f: f32) -> f32 {
    let mut f = f;
    while f > PI {
        f -= 2. * PI;
    }
    while f <= -PI {
        f += 2. * PI;
    }
    f
}

/// Computes the smallest difference between two angles,
/// i.e. the difference between `a` and `b` in the range `]-PI, PI]` (a-b).
pub fn smallest_theta_diff(a: f32, b: f32) -> f32 {
    mod2pi(mod2pi(a) - mod2pi(b))
}

/// Distance and bearing of `point` as seen from `pose` (`[x, y, theta]`).
///
/// The bearing is in degrees, positive when the point is on the right of the
/// heading (clockwise), like the `rot_y` of a camera looking forward.
pub fn distance_and_bearing(pose: &Vector3<f32>, point: &Vector2<f32>) -> (f32, f32) {
    let delta = Vector2::new(point.x - pose.x, point.y - pose.y);
    let distance = delta.norm();
    if distance == 0. {
        return (0., 0.);
    }
    let absolute_angle = atan2f(delta.y, delta.x);
    let bearing = -smallest_theta_diff(absolute_angle, pose.z);
    (distance, bearing.to_degrees())
}

/// Point at `distance` in front of `pose`.
pub fn point_ahead(pose: &Vector3<f32>, distance: f32) -> Vector2<f32> {
    Vector2::new(
        pose.x + distance * pose.z.cos(),
        pose.y + distance * pose.z.sin(),
    )
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use nalgebra::{Vector2, Vector3};

    #[test]
    pub fn test_smallest_theta_diff() {
        let a = 0.1;
        let b = 0.2;
        let diff = super::smallest_theta_diff(a, b);
        assert!((diff - (-0.1)).abs() < 1e-6);
        let a = PI - 0.1;
        let b = -PI + 0.2;
        let diff = super::smallest_theta_diff(a, b);
        assert!((diff - (-0.3)).abs() < 1e-5, "Diff = {diff}");
        let a = -PI + 0.1;
        let b = PI - 0.2;
        let diff = super::smallest_theta_diff(a, b);
        assert!((diff - 0.3).abs() < 1e-5, "Diff = {diff}");

        let a = -PI;
        let b = PI;
        let diff = super::smallest_theta_diff(a, b);
        assert!(diff.abs() < 1e-6, "Diff = {diff}");

        let diff = super::smallest_theta_diff(3. * PI + 0.1, 0.);
        assert!((diff - (-PI + 0.1)).abs() < 1e-4, "Diff = {diff}");
    }

    #[test]
    pub fn bearing_is_clockwise_positive() {
        let pose = Vector3::new(0., 0., PI / 2.);
        // Straight ahead
        let (d, b) = super::distance_and_bearing(&pose, &Vector2::new(0., 2.));
        assert!((d - 2.).abs() < 1e-6);
        assert!(b.abs() < 1e-4, "Bearing = {b}");
        // On the right of a robot looking toward +y
        let (d, b) = super::distance_and_bearing(&pose, &Vector2::new(1., 1.));
        assert!((d - 2f32.sqrt()).abs() < 1e-6);
        assert!((b - 45.).abs() < 1e-3, "Bearing = {b}");
        // On the left
        let (_, b) = super::distance_and_bearing(&pose, &Vector2::new(-1., 0.));
        assert!((b + 90.).abs() < 1e-3, "Bearing = {b}");
        // Same position
        let (d, b) = super::distance_and_bearing(&pose, &Vector2::new(0., 0.));
        assert_eq!((d, b), (0., 0.));
    }

    #[test]
    pub fn point_ahead() {
        let p = super::point_ahead(&Vector3::new(1., 1., PI), 0.5);
        assert!((p - Vector2::new(0.5, 1.)).norm() < 1e-6, "p = {p:?}");
    }
}
