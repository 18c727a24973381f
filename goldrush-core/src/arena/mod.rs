/*!
The arena: a square area with walls, gold and silver tokens, and the robot bodies.

The [`Arena`] is shared by every robot thread behind a single mutex, the
physics lock. Robots are created inside the arena by
[`SimRobot::new`](crate::robot::SimRobot::new), then only modified through
their motors, [`Arena::grab`] and [`Arena::release`], and through the
simulator integration step [`Arena::step`].

## Example in yaml:
```ignore
arena:
    size: 8.
    zones:
        - {x: -3.5, y: -3.5, heading: 45.}
    tokens:
        - {code: 0, kind: GoldToken, x: -2., y: -2.}
        - {code: 1, kind: SilverToken, x: 1., y: 0.5}
    random_tokens:
        gold: 3
        silver: 2
    wall_markers: 7
```
*/

pub mod vision;

use std::collections::{BTreeMap, BTreeSet};

use goldrush_macros::config_derives;
use log::debug;
use nalgebra::{Vector2, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    constants::MAX_MOTOR_POWER,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::{InternalLog, is_enabled},
    physics::unicycle::{Unicycle, UnicycleConfig},
    recordable::Recordable,
    robot::MotorChannel,
    utils::geometry::{distance_and_bearing, point_ahead},
};
use vision::{Marker, MarkerInfo, MarkerType, VisionConfig};

/// Starting region of a robot.
#[config_derives]
#[derive(Default)]
pub struct ZoneConfig {
    pub x: f32,
    pub y: f32,
    /// Heading in degrees, counter-clockwise from the x axis.
    pub heading: f32,
}

#[config_derives]
#[derive(Default)]
pub struct TokenConfig {
    pub code: i32,
    pub kind: MarkerType,
    pub x: f32,
    pub y: f32,
}

/// Tokens placed uniformly in the arena, after the explicit ones.
#[config_derives]
pub struct RandomTokensConfig {
    pub gold: usize,
    pub silver: usize,
    /// Minimal distance between a random token and the walls.
    pub margin: f32,
}

impl Default for RandomTokensConfig {
    fn default() -> Self {
        Self {
            gold: 0,
            silver: 0,
            margin: 0.5,
        }
    }
}

/// Geometry of the gripper.
#[config_derives]
pub struct GrabConfig {
    /// Max distance of a token to be grabbed.
    pub grab_distance: f32,
    /// Max absolute bearing of a token to be grabbed, in degrees.
    pub grab_half_angle: f32,
    /// Distance in front of the robot where a released token is put.
    pub release_offset: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            grab_distance: 0.5,
            grab_half_angle: 45.,
            release_offset: 0.3,
        }
    }
}

#[config_derives]
pub struct ArenaConfig {
    /// Side of the square arena, centred on the origin.
    pub size: f32,
    /// Starting zones, indexed by robot zone.
    pub zones: Vec<ZoneConfig>,
    pub tokens: Vec<TokenConfig>,
    pub random_tokens: Option<RandomTokensConfig>,
    /// Number of [`MarkerType::Arena`] markers evenly spread on each wall.
    pub wall_markers: usize,
    pub robot: UnicycleConfig,
    pub vision: VisionConfig,
    pub grab: GrabConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            size: 8.,
            zones: vec![
                ZoneConfig {
                    x: -3.5,
                    y: -3.5,
                    heading: 45.,
                },
                ZoneConfig {
                    x: 3.5,
                    y: -3.5,
                    heading: 135.,
                },
                ZoneConfig {
                    x: 3.5,
                    y: 3.5,
                    heading: -135.,
                },
                ZoneConfig {
                    x: -3.5,
                    y: 3.5,
                    heading: -45.,
                },
            ],
            tokens: Vec::new(),
            random_tokens: None,
            wall_markers: 0,
            robot: UnicycleConfig::default(),
            vision: VisionConfig::default(),
            grab: GrabConfig::default(),
        }
    }
}

fn config_error(what: String) -> GoldrushError {
    GoldrushError::new(GoldrushErrorTypes::ConfigError, what)
}

impl ArenaConfig {
    pub fn check(&self) -> GoldrushResult<()> {
        if self.size <= 0. {
            return Err(config_error(format!(
                "arena size should be positive, got {}",
                self.size
            )));
        }
        if self.zones.is_empty() {
            return Err(config_error("arena needs at least one zone".to_string()));
        }
        let half = self.size / 2.;
        for (i, zone) in self.zones.iter().enumerate() {
            if zone.x.abs() > half || zone.y.abs() > half {
                return Err(config_error(format!("zone {i} is outside the arena")));
            }
        }
        let mut codes = BTreeSet::new();
        for token in &self.tokens {
            if token.x.abs() > half || token.y.abs() > half {
                return Err(config_error(format!(
                    "token {} is outside the arena",
                    token.code
                )));
            }
            if token.kind == MarkerType::Arena {
                return Err(config_error(format!(
                    "token {} cannot be an Arena marker, use wall_markers",
                    token.code
                )));
            }
            if !codes.insert(token.code) {
                return Err(config_error(format!(
                    "token code {} is used more than once",
                    token.code
                )));
            }
        }
        if let Some(random) = &self.random_tokens {
            if random.margin < 0. || 2. * random.margin >= self.size {
                return Err(config_error(format!(
                    "random token margin {} does not fit in the arena",
                    random.margin
                )));
            }
        }
        if self.robot.wheel_distance <= 0. || self.robot.power_to_speed < 0. {
            return Err(config_error(
                "robot wheel_distance should be positive and power_to_speed non negative"
                    .to_string(),
            ));
        }
        if self.vision.detection_distance < 0.
            || self.vision.field_of_view <= 0.
            || self.vision.field_of_view > 360.
            || self.vision.distance_noise < 0.
            || self.vision.bearing_noise < 0.
        {
            return Err(config_error(
                "vision: distances and noises should be non negative, field_of_view in ]0, 360]"
                    .to_string(),
            ));
        }
        if self.grab.grab_distance < 0.
            || self.grab.grab_half_angle < 0.
            || self.grab.release_offset < 0.
        {
            return Err(config_error(
                "grab distances and angle should be non negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Markers on the walls, counter-clockwise from the bottom left corner, codes from 0.
fn wall_markers(size: f32, per_wall: usize) -> Vec<Token> {
    let half = size / 2.;
    let spacing = size / (per_wall as f32 + 1.);
    let mut markers = Vec::with_capacity(4 * per_wall);
    for wall in 0..4 {
        for i in 0..per_wall {
            let along = -half + spacing * (i as f32 + 1.);
            let position = match wall {
                0 => Vector2::new(along, -half),
                1 => Vector2::new(half, along),
                2 => Vector2::new(-along, half),
                _ => Vector2::new(-half, -along),
            };
            markers.push(Token {
                info: MarkerInfo {
                    code: (wall * per_wall + i) as i32,
                    marker_type: MarkerType::Arena,
                },
                position,
                carried_by: None,
            });
        }
    }
    markers
}

/// A token lying in the arena, or carried by a robot.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Token {
    pub info: MarkerInfo,
    pub position: Vector2<f32>,
    /// Zone of the robot carrying the token.
    pub carried_by: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RobotBody {
    pub name: String,
    pub zone: usize,
    /// `[x, y, theta]`, theta in radians.
    pub pose: Vector3<f32>,
    /// Power of the `M0` (left) and `M1` (right) channels.
    pub motors: [f32; 2],
    /// Index of the carried token.
    pub carried: Option<usize>,
    rng: ChaCha8Rng,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RobotBodyRecord {
    pub name: String,
    pub zone: usize,
    pub pose: [f32; 3],
    pub carried: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArenaRecord {
    pub tokens: Vec<Token>,
    pub robots: Vec<RobotBodyRecord>,
}

#[derive(Debug)]
pub struct Arena {
    config: ArenaConfig,
    model: Unicycle,
    tokens: Vec<Token>,
    robots: BTreeMap<usize, RobotBody>,
    seed: u64,
}

impl Arena {
    pub fn from_config(config: &ArenaConfig, seed: u64) -> GoldrushResult<Self> {
        config.check()?;
        let mut tokens: Vec<Token> = config
            .tokens
            .iter()
            .map(|t| Token {
                info: MarkerInfo {
                    code: t.code,
                    marker_type: t.kind,
                },
                position: Vector2::new(t.x, t.y),
                carried_by: None,
            })
            .collect();
        if let Some(random) = &config.random_tokens {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut next_code = tokens.iter().map(|t| t.info.code + 1).max().unwrap_or(0);
            let bound = config.size / 2. - random.margin;
            let kinds = std::iter::repeat(MarkerType::GoldToken)
                .take(random.gold)
                .chain(std::iter::repeat(MarkerType::SilverToken).take(random.silver));
            for kind in kinds {
                tokens.push(Token {
                    info: MarkerInfo {
                        code: next_code,
                        marker_type: kind,
                    },
                    position: Vector2::new(
                        rng.gen_range(-bound..=bound),
                        rng.gen_range(-bound..=bound),
                    ),
                    carried_by: None,
                });
                next_code += 1;
            }
        }
        tokens.extend(wall_markers(config.size, config.wall_markers));
        Ok(Self {
            config: config.clone(),
            model: Unicycle::from_config(&config.robot),
            tokens,
            robots: BTreeMap::new(),
            seed,
        })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn robot(&self, zone: usize) -> Option<&RobotBody> {
        self.robots.get(&zone)
    }

    fn robot_mut(&mut self, zone: usize) -> GoldrushResult<&mut RobotBody> {
        self.robots.get_mut(&zone).ok_or_else(|| {
            GoldrushError::new(
                GoldrushErrorTypes::ImplementationError,
                format!("No robot in zone {zone}"),
            )
        })
    }

    /// Put a new robot at the start location of `zone`. Returns its name.
    pub fn add_robot(&mut self, zone: usize) -> GoldrushResult<String> {
        let zone_config = self.config.zones.get(zone).ok_or_else(|| {
            config_error(format!(
                "No start location for zone {zone}: the arena has {} zone(s)",
                self.config.zones.len()
            ))
        })?;
        if self.robots.contains_key(&zone) {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::InitializationError,
                format!("A robot already occupies zone {zone}"),
            ));
        }
        let name = format!("robot-{zone}");
        let body = RobotBody {
            name: name.clone(),
            zone,
            pose: Vector3::new(
                zone_config.x,
                zone_config.y,
                zone_config.heading.to_radians(),
            ),
            motors: [0., 0.],
            carried: None,
            rng: ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(zone as u64 + 1)),
        };
        if is_enabled(InternalLog::SetupSteps) {
            debug!("Add {name} at {:?}", body.pose);
        }
        self.robots.insert(zone, body);
        Ok(name)
    }

    /// Set the power of a motor channel, clamped to ±[`MAX_MOTOR_POWER`]. Returns the applied power.
    pub fn set_motor_power(
        &mut self,
        zone: usize,
        channel: MotorChannel,
        power: f32,
    ) -> GoldrushResult<f32> {
        let power = power.clamp(-MAX_MOTOR_POWER, MAX_MOTOR_POWER);
        let robot = self.robot_mut(zone)?;
        robot.motors[channel.index()] = power;
        if is_enabled(InternalLog::Motors) {
            debug!("{}: {channel} power set to {power}", robot.name);
        }
        Ok(power)
    }

    pub fn see(&mut self, zone: usize) -> GoldrushResult<Vec<Marker>> {
        let robot = self.robots.get_mut(&zone).ok_or_else(|| {
            GoldrushError::new(
                GoldrushErrorTypes::ImplementationError,
                format!("No robot in zone {zone}"),
            )
        })?;
        Ok(self
            .config
            .vision
            .observe(&robot.pose, &self.tokens, &mut robot.rng))
    }

    /// Grab the nearest free token in front of the robot, if any is in reach.
    pub fn grab(&mut self, zone: usize) -> GoldrushResult<Option<MarkerInfo>> {
        let grab = self.config.grab.clone();
        let robot = self.robots.get_mut(&zone).ok_or_else(|| {
            GoldrushError::new(
                GoldrushErrorTypes::ImplementationError,
                format!("No robot in zone {zone}"),
            )
        })?;
        if robot.carried.is_some() {
            debug!("{} already carries a token", robot.name);
            return Ok(None);
        }
        let mut closest: Option<(usize, f32)> = None;
        for (i, token) in self.tokens.iter().enumerate() {
            if token.carried_by.is_some() || token.info.marker_type == MarkerType::Arena {
                continue;
            }
            let (dist, rot_y) = distance_and_bearing(&robot.pose, &token.position);
            if dist > grab.grab_distance || rot_y.abs() > grab.grab_half_angle {
                continue;
            }
            match closest {
                Some((_, closest_dist)) if closest_dist <= dist => {}
                _ => closest = Some((i, dist)),
            }
        }
        let Some((index, _)) = closest else {
            return Ok(None);
        };
        let token = &mut self.tokens[index];
        token.carried_by = Some(zone);
        token.position = Vector2::new(robot.pose.x, robot.pose.y);
        robot.carried = Some(index);
        Ok(Some(token.info))
    }

    /// Put the carried token in front of the robot.
    pub fn release(&mut self, zone: usize) -> GoldrushResult<Option<MarkerInfo>> {
        let offset = self.config.grab.release_offset;
        let half = self.config.size / 2.;
        let robot = self.robots.get_mut(&zone).ok_or_else(|| {
            GoldrushError::new(
                GoldrushErrorTypes::ImplementationError,
                format!("No robot in zone {zone}"),
            )
        })?;
        let Some(index) = robot.carried.take() else {
            return Ok(None);
        };
        let position = point_ahead(&robot.pose, offset);
        let token = &mut self.tokens[index];
        token.carried_by = None;
        token.position = Vector2::new(
            position.x.clamp(-half, half),
            position.y.clamp(-half, half),
        );
        Ok(Some(token.info))
    }

    /// Integrate the motion of every robot during `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let half = self.config.size / 2.;
        for robot in self.robots.values_mut() {
            self.model.update_pose(&mut robot.pose, &robot.motors, dt);
            robot.pose.x = robot.pose.x.clamp(-half, half);
            robot.pose.y = robot.pose.y.clamp(-half, half);
            if let Some(index) = robot.carried {
                self.tokens[index].position = Vector2::new(robot.pose.x, robot.pose.y);
            }
        }
    }
}

impl Recordable<ArenaRecord> for Arena {
    fn record(&self) -> ArenaRecord {
        ArenaRecord {
            tokens: self.tokens.clone(),
            robots: self
                .robots
                .values()
                .map(|r| RobotBodyRecord {
                    name: r.name.clone(),
                    zone: r.zone,
                    pose: [r.pose.x, r.pose.y, r.pose.z],
                    carried: r.carried.map(|i| self.tokens[i].info.code),
                })
                .collect(),
        }
    }
}
