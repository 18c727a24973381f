use libm::atan2f;
use nalgebra::{SMatrix, Vector3};

use goldrush_macros::config_derives;

#[config_derives]
pub struct UnicycleConfig {
    /// Distance between the two wheels, to compute the angular velocity from the wheel speeds.
    pub wheel_distance: f32,
    /// Wheel speed (m/s) produced by one unit of motor power.
    pub power_to_speed: f32,
}

impl Default for UnicycleConfig {
    fn default() -> Self {
        Self {
            wheel_distance: 0.5,
            power_to_speed: 0.01,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Unicycle {
    wheel_distance: f32,
    power_to_speed: f32,
}

impl Unicycle {
    pub fn from_config(config: &UnicycleConfig) -> Self {
        Self {
            wheel_distance: config.wheel_distance,
            power_to_speed: config.power_to_speed,
        }
    }

    /// Move `pose` (`[x, y, theta]`) for `dt` seconds with the motor `powers`
    /// (`[left, right]`).
    pub fn update_pose(&self, pose: &mut Vector3<f32>, powers: &[f32; 2], dt: f32) {
        let theta = pose.z;

        let displacement_wheel_left = powers[0] * self.power_to_speed * dt;
        let displacement_wheel_right = powers[1] * self.power_to_speed * dt;
        if displacement_wheel_left == 0. && displacement_wheel_right == 0. {
            return;
        }

        let translation = (displacement_wheel_left + displacement_wheel_right) / 2.;
        let rotation = (displacement_wheel_right - displacement_wheel_left) / self.wheel_distance;

        // Using Lie theory
        // Reference: Sola, J., Deray, J., & Atchuthan, D. (2018). A micro lie theory for state estimation in robotics. arXiv preprint arXiv:1812.01537.

        let lie_action =
            SMatrix::<f32, 3, 3>::new(0., -rotation, translation, rotation, 0., 0., 0., 0., 0.);

        let rot_mat = *nalgebra::Rotation2::new(theta).matrix();

        let mut se2_mat = SMatrix::<f32, 3, 3>::new(
            rot_mat[(0, 0)],
            rot_mat[(0, 1)],
            pose.x,
            rot_mat[(1, 0)],
            rot_mat[(1, 1)],
            pose.y,
            0.,
            0.,
            1.,
        );

        se2_mat *= lie_action.exp();

        pose.z = atan2f(se2_mat[(1, 0)], se2_mat[(0, 0)]);
        pose.x = se2_mat[(0, 2)];
        pose.y = se2_mat[(1, 2)];
    }
}
