/*!
Gold token collector.

The collector repeats a pick-and-place cycle until `quota` gold tokens were
gathered:
1. look for a gold token not collected yet, rotating while none is visible;
2. approach it: turn toward it until its bearing is within
   `orientation_threshold`, then drive forward, until its distance is at or
   below `grab_distance_threshold`;
3. grab it;
4. bring it to the drop location. For the first token, the location is a fixed
   offset from the grab position (`first_drop_turn` then `first_drop_drive`).
   Later tokens are brought next to the nearest token already collected,
   stopping strictly under `release_distance_threshold`;
5. release it, back up (`retreat_drive`) and rotate (`retreat_turn`);
6. append its code to the collected list.

Each call to [`Controller::step`] does one of these actions.

```ignore
type: GoldCollector
quota: 6
orientation_threshold: 2.
grab_distance_threshold: 0.4
release_distance_threshold: 0.6
search_turn: {speed: 5., duration: 2.}
```
*/

use goldrush_macros::{EnumToString, config_derives};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    actuation::{Actuation, ActuationConfig, MotionCommand, make_actuation_from_config},
    arena::vision::{Marker, MarkerType},
    constants::SEARCH_RADIUS,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::{InternalLog, is_enabled},
    recordable::Recordable,
    robot::RobotApi,
};

use super::{Controller, ControllerRecord, ControllerStatus};

/// Speed and duration of one motion.
#[config_derives]
#[derive(Default, Copy)]
pub struct MoveConfig {
    pub speed: f32,
    pub duration: f32,
}

impl MoveConfig {
    pub fn drive(&self) -> MotionCommand {
        MotionCommand::drive(self.speed, self.duration)
    }

    pub fn turn(&self) -> MotionCommand {
        MotionCommand::turn(self.speed, self.duration)
    }

    fn check(&self, name: &str) -> GoldrushResult<()> {
        if self.duration <= 0. {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!("{name} duration should be positive, got {}", self.duration),
            ));
        }
        Ok(())
    }
}

/// Configuration of the [`GoldCollector`].
#[config_derives]
pub struct GoldCollectorConfig {
    /// Number of tokens to collect before stopping.
    pub quota: usize,
    /// Max absolute bearing (degrees) to drive forward.
    pub orientation_threshold: f32,
    /// The robot grabs when the token distance is at or below this threshold.
    pub grab_distance_threshold: f32,
    /// The robot releases when the drop location distance is strictly below this threshold.
    pub release_distance_threshold: f32,
    /// Rotation when no target is visible.
    pub search_turn: MoveConfig,
    /// Rotation to correct the bearing. The sign is chosen from the bearing.
    pub orient_turn: MoveConfig,
    pub approach_drive: MoveConfig,
    pub first_drop_turn: MoveConfig,
    pub first_drop_drive: MoveConfig,
    pub retreat_drive: MoveConfig,
    pub retreat_turn: MoveConfig,
    pub actuation: ActuationConfig,
}

impl Default for GoldCollectorConfig {
    fn default() -> Self {
        Self {
            quota: 6,
            orientation_threshold: 2.,
            grab_distance_threshold: 0.4,
            release_distance_threshold: 0.6,
            search_turn: MoveConfig {
                speed: 5.,
                duration: 2.,
            },
            orient_turn: MoveConfig {
                speed: 2.,
                duration: 0.5,
            },
            approach_drive: MoveConfig {
                speed: 10.,
                duration: 0.5,
            },
            first_drop_turn: MoveConfig {
                speed: -10.,
                duration: 1.1,
            },
            first_drop_drive: MoveConfig {
                speed: 10.,
                duration: 19.,
            },
            retreat_drive: MoveConfig {
                speed: -10.,
                duration: 2.,
            },
            retreat_turn: MoveConfig {
                speed: 30.,
                duration: 2.,
            },
            actuation: ActuationConfig::default(),
        }
    }
}

impl GoldCollectorConfig {
    /// Motion durations must be positive.
    pub fn check(&self) -> GoldrushResult<()> {
        for (name, motion) in [
            ("search_turn", &self.search_turn),
            ("orient_turn", &self.orient_turn),
            ("approach_drive", &self.approach_drive),
            ("first_drop_turn", &self.first_drop_turn),
            ("first_drop_drive", &self.first_drop_drive),
            ("retreat_drive", &self.retreat_drive),
            ("retreat_turn", &self.retreat_turn),
        ] {
            motion.check(name)?;
        }
        if self.orientation_threshold < 0. || self.grab_distance_threshold < 0. {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                "orientation_threshold and grab_distance_threshold should be non negative"
                    .to_string(),
            ));
        }
        self.actuation
            .check()
            .map_err(|e| e.chain("in actuation configuration".to_string()))
    }
}

/// Nearest qualifying token seen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TokenSighting {
    pub dist: f32,
    pub rot_y: f32,
    pub code: i32,
}

fn nearest_gold<F: Fn(i32) -> bool>(markers: &[Marker], accept: F) -> Option<TokenSighting> {
    let mut nearest: Option<TokenSighting> = None;
    for marker in markers {
        if marker.info.marker_type != MarkerType::GoldToken
            || !accept(marker.info.code)
            || marker.dist >= SEARCH_RADIUS
        {
            continue;
        }
        let closer = match &nearest {
            Some(sighting) => marker.dist < sighting.dist,
            None => true,
        };
        if closer {
            nearest = Some(TokenSighting {
                dist: marker.dist,
                rot_y: marker.rot_y,
                code: marker.info.code,
            });
        }
    }
    nearest
}

/// Nearest gold token which was not collected yet.
pub fn find_gold_token(markers: &[Marker], grabbed: &[i32]) -> Option<TokenSighting> {
    nearest_gold(markers, |code| !grabbed.contains(&code))
}

/// Nearest gold token already collected: the place where to drop the next one.
pub fn find_release_location(markers: &[Marker], grabbed: &[i32]) -> Option<TokenSighting> {
    nearest_gold(markers, |code| grabbed.contains(&code))
}

/// When the approach ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopRule {
    /// Stop when the distance is lower or equal.
    AtOrBelow(f32),
    /// Stop when the distance is strictly lower.
    Below(f32),
}

impl StopRule {
    pub fn reached(&self, dist: f32) -> bool {
        match self {
            StopRule::AtOrBelow(threshold) => dist <= *threshold,
            StopRule::Below(threshold) => dist < *threshold,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, EnumToString)]
pub enum ApproachAction {
    Search,
    Arrived,
    Forward,
    TurnLeft,
    TurnRight,
}

/// Next action to reach the `sighting`.
pub fn approach_action(
    sighting: Option<&TokenSighting>,
    orientation_threshold: f32,
    stop: StopRule,
) -> ApproachAction {
    let Some(sighting) = sighting else {
        return ApproachAction::Search;
    };
    if stop.reached(sighting.dist) {
        ApproachAction::Arrived
    } else if -orientation_threshold <= sighting.rot_y && sighting.rot_y <= orientation_threshold {
        ApproachAction::Forward
    } else if sighting.rot_y < -orientation_threshold {
        ApproachAction::TurnLeft
    } else {
        ApproachAction::TurnRight
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, EnumToString)]
pub enum CollectorPhase {
    SeekToken,
    ApproachToken,
    Grab,
    FirstDropTurn,
    FirstDropDrive,
    SeekDropLocation,
    ApproachDropLocation,
    Release,
    RetreatDrive,
    RetreatTurn,
    Done,
}

impl CollectorPhase {
    /// What the robot looks for during this phase.
    pub fn target(&self) -> Option<&'static str> {
        match self {
            CollectorPhase::SeekToken | CollectorPhase::ApproachToken => Some("gold token"),
            CollectorPhase::SeekDropLocation | CollectorPhase::ApproachDropLocation => {
                Some("drop location")
            }
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GoldCollectorRecord {
    pub phase: CollectorPhase,
    pub grabbed_codes: Vec<i32>,
    pub carrying: Option<i32>,
    pub steps: usize,
}

#[derive(Debug)]
pub struct GoldCollector {
    config: GoldCollectorConfig,
    actuation: Box<dyn Actuation>,
    phase: CollectorPhase,
    grabbed_codes: Vec<i32>,
    /// Code of the token being carried, appended once the cycle completes.
    carrying: Option<i32>,
    steps: usize,
}

impl GoldCollector {
    pub fn from_config(config: &GoldCollectorConfig) -> Self {
        Self {
            config: config.clone(),
            actuation: make_actuation_from_config(&config.actuation),
            phase: CollectorPhase::SeekToken,
            grabbed_codes: Vec::with_capacity(config.quota),
            carrying: None,
            steps: 0,
        }
    }

    pub fn phase(&self) -> CollectorPhase {
        self.phase
    }

    pub fn grabbed_codes(&self) -> &[i32] {
        &self.grabbed_codes
    }

    fn execute(&self, robot: &mut dyn RobotApi, command: MotionCommand) -> GoldrushResult<()> {
        self.actuation.execute(robot, &command)
    }

    /// One approach action toward `sighting`. Returns true once arrived.
    fn approach(
        &self,
        robot: &mut dyn RobotApi,
        sighting: Option<&TokenSighting>,
        stop: StopRule,
    ) -> GoldrushResult<bool> {
        let action = approach_action(sighting, self.config.orientation_threshold, stop);
        if is_enabled(InternalLog::Collection) {
            debug!("Approach {:?}: {action}", sighting);
        }
        match action {
            ApproachAction::Search => {
                debug!(
                    "No {} found, searching...",
                    self.phase.target().unwrap_or("target")
                );
                self.execute(robot, self.config.search_turn.turn())?;
            }
            ApproachAction::Arrived => return Ok(true),
            ApproachAction::Forward => {
                debug!("Moving forward...");
                self.execute(robot, self.config.approach_drive.drive())?;
            }
            ApproachAction::TurnLeft => {
                debug!("Turning left...");
                let orient = self.config.orient_turn;
                self.execute(robot, MotionCommand::turn(-orient.speed, orient.duration))?;
            }
            ApproachAction::TurnRight => {
                debug!("Turning right...");
                self.execute(robot, self.config.orient_turn.turn())?;
            }
        }
        Ok(false)
    }

    fn grab(&mut self, robot: &mut dyn RobotApi) -> GoldrushResult<CollectorPhase> {
        let Some(info) = robot.grab()? else {
            debug!("Nothing in reach of the gripper");
            return Ok(CollectorPhase::RetreatDrive);
        };
        if info.marker_type != MarkerType::GoldToken || self.grabbed_codes.contains(&info.code) {
            warn!(
                "Wrong token grabbed ({} {}), put it back",
                info.marker_type, info.code
            );
            robot.release()?;
            return Ok(CollectorPhase::RetreatDrive);
        }
        info!("Gold token grabbed!");
        self.carrying = Some(info.code);
        if self.grabbed_codes.is_empty() {
            Ok(CollectorPhase::FirstDropTurn)
        } else {
            Ok(CollectorPhase::SeekDropLocation)
        }
    }

    fn end_of_cycle(&mut self) -> CollectorPhase {
        if let Some(code) = self.carrying.take() {
            self.grabbed_codes.push(code);
            if is_enabled(InternalLog::Collection) {
                debug!("Collected codes: {:?}", self.grabbed_codes);
            }
        }
        if self.grabbed_codes.len() >= self.config.quota {
            info!("{} gold tokens collected", self.grabbed_codes.len());
            CollectorPhase::Done
        } else {
            CollectorPhase::SeekToken
        }
    }
}

impl Controller for GoldCollector {
    fn step(&mut self, robot: &mut dyn RobotApi) -> GoldrushResult<ControllerStatus> {
        if self.phase == CollectorPhase::Done {
            return Ok(ControllerStatus::Finished);
        }
        self.steps += 1;
        let next_phase = match self.phase {
            CollectorPhase::SeekToken => {
                let markers = robot.see()?;
                if find_gold_token(&markers, &self.grabbed_codes).is_some() {
                    info!("Found a gold token!");
                    CollectorPhase::ApproachToken
                } else {
                    debug!("No gold token found, searching...");
                    self.execute(robot, self.config.search_turn.turn())?;
                    CollectorPhase::SeekToken
                }
            }
            CollectorPhase::ApproachToken => {
                let markers = robot.see()?;
                let sighting = find_gold_token(&markers, &self.grabbed_codes);
                let stop = StopRule::AtOrBelow(self.config.grab_distance_threshold);
                if self.approach(robot, sighting.as_ref(), stop)? {
                    CollectorPhase::Grab
                } else {
                    CollectorPhase::ApproachToken
                }
            }
            CollectorPhase::Grab => self.grab(robot)?,
            CollectorPhase::FirstDropTurn => {
                self.execute(robot, self.config.first_drop_turn.turn())?;
                CollectorPhase::FirstDropDrive
            }
            CollectorPhase::FirstDropDrive => {
                self.execute(robot, self.config.first_drop_drive.drive())?;
                CollectorPhase::Release
            }
            CollectorPhase::SeekDropLocation => {
                let markers = robot.see()?;
                if find_release_location(&markers, &self.grabbed_codes).is_some() {
                    CollectorPhase::ApproachDropLocation
                } else {
                    debug!("No drop location found, searching...");
                    self.execute(robot, self.config.search_turn.turn())?;
                    CollectorPhase::SeekDropLocation
                }
            }
            CollectorPhase::ApproachDropLocation => {
                let markers = robot.see()?;
                let sighting = find_release_location(&markers, &self.grabbed_codes);
                let stop = StopRule::Below(self.config.release_distance_threshold);
                if self.approach(robot, sighting.as_ref(), stop)? {
                    CollectorPhase::Release
                } else {
                    CollectorPhase::ApproachDropLocation
                }
            }
            CollectorPhase::Release => {
                if robot.release()?.is_some() {
                    info!("Gold token released!");
                } else {
                    warn!("No token to release");
                    self.carrying = None;
                }
                CollectorPhase::RetreatDrive
            }
            CollectorPhase::RetreatDrive => {
                self.execute(robot, self.config.retreat_drive.drive())?;
                CollectorPhase::RetreatTurn
            }
            CollectorPhase::RetreatTurn => {
                self.execute(robot, self.config.retreat_turn.turn())?;
                self.end_of_cycle()
            }
            CollectorPhase::Done => CollectorPhase::Done,
        };
        if is_enabled(InternalLog::Collection) && next_phase != self.phase {
            debug!("{}: {} -> {}", robot.name(), self.phase, next_phase);
        }
        self.phase = next_phase;
        Ok(if self.phase == CollectorPhase::Done {
            ControllerStatus::Finished
        } else {
            ControllerStatus::Running
        })
    }
}

impl Recordable<ControllerRecord> for GoldCollector {
    fn record(&self) -> ControllerRecord {
        ControllerRecord::GoldCollector(GoldCollectorRecord {
            phase: self.phase,
            grabbed_codes: self.grabbed_codes.clone(),
            carrying: self.carrying,
            steps: self.steps,
        })
    }
}
