/*!
Marker observation from a robot camera.

The camera looks forward, sees every free token inside its field of view and
detection distance, and reports a [`Marker`] with the distance and the
bearing (`rot_y`, in degrees, positive on the right).
*/

use goldrush_macros::{EnumToString, config_derives};
use log::debug;
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    arena::Token,
    logger::{InternalLog, is_enabled},
    utils::geometry::distance_and_bearing,
};

/// Configuration of the robot camera.
#[config_derives]
pub struct VisionConfig {
    /// Max distance of detection.
    pub detection_distance: f32,
    /// Horizontal field of view, in degrees, centred on the heading. 360 sees all around.
    pub field_of_view: f32,
    /// Half width of the uniform noise added to the distances.
    pub distance_noise: f32,
    /// Half width of the uniform noise added to the bearings, in degrees.
    pub bearing_noise: f32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            detection_distance: 10.,
            field_of_view: 90.,
            distance_noise: 0.,
            bearing_noise: 0.,
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumToString,
)]
pub enum MarkerType {
    #[default]
    GoldToken,
    SilverToken,
    /// Marker fixed on the arena walls.
    Arena,
}

/// Identity of a marker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MarkerInfo {
    pub code: i32,
    pub marker_type: MarkerType,
}

/// One sighting of a marker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub info: MarkerInfo,
    /// Distance to the marker, in metres.
    pub dist: f32,
    /// Bearing of the marker, in degrees, positive on the right.
    pub rot_y: f32,
}

impl VisionConfig {
    fn in_field_of_view(&self, rot_y: f32) -> bool {
        self.field_of_view >= 360. || rot_y.abs() <= self.field_of_view / 2.
    }

    /// Markers seen from `pose`, in the order of `tokens`. Carried tokens are hidden.
    pub fn observe<R: Rng>(&self, pose: &Vector3<f32>, tokens: &[Token], rng: &mut R) -> Vec<Marker> {
        let mut markers = Vec::new();
        for token in tokens.iter().filter(|t| t.carried_by.is_none()) {
            let (dist, rot_y) = distance_and_bearing(pose, &token.position);
            if dist > self.detection_distance || !self.in_field_of_view(rot_y) {
                continue;
            }
            let mut marker = Marker {
                info: token.info,
                dist,
                rot_y,
            };
            if self.distance_noise > 0. {
                marker.dist =
                    (marker.dist + rng.gen_range(-self.distance_noise..=self.distance_noise)).max(0.);
            }
            if self.bearing_noise > 0. {
                marker.rot_y += rng.gen_range(-self.bearing_noise..=self.bearing_noise);
            }
            markers.push(marker);
        }
        if is_enabled(InternalLog::Vision) {
            debug!("Markers seen: {:?}", markers);
        }
        markers
    }
}
