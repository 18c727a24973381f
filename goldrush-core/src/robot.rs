/*!
Robot API used by the controllers.

The [`RobotApi`] trait is the only way a controller acts on the world. The
simulated implementation, [`SimRobot`], forwards every call to the shared
[`Arena`] and blocks on the [`SimClock`] when sleeping.
*/

use std::sync::Arc;

use goldrush_macros::EnumToString;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    arena::{
        Arena,
        vision::{Marker, MarkerInfo},
    },
    errors::GoldrushResult,
    logger::{InternalLog, is_enabled},
    simulator::clock::SimClock,
    utils::SharedMutex,
};

/// Motor channel of the differential drive.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, EnumToString)]
pub enum MotorChannel {
    /// Left wheel.
    M0,
    /// Right wheel.
    M1,
}

impl MotorChannel {
    pub fn index(&self) -> usize {
        match self {
            MotorChannel::M0 => 0,
            MotorChannel::M1 => 1,
        }
    }
}

/// Services offered to a controller by its robot.
pub trait RobotApi: Send {
    fn name(&self) -> &str;
    fn zone(&self) -> usize;
    /// Markers currently in sight.
    fn see(&mut self) -> GoldrushResult<Vec<Marker>>;
    /// Power in [-100, 100], clamped.
    fn set_motor_power(&mut self, channel: MotorChannel, power: f32) -> GoldrushResult<()>;
    /// Block for `duration` seconds of simulated time.
    fn sleep(&mut self, duration: f32) -> GoldrushResult<()>;
    /// Pick up the nearest token in front of the robot. `None` if nothing was in reach.
    fn grab(&mut self) -> GoldrushResult<Option<MarkerInfo>>;
    /// Drop the carried token in front of the robot. `None` if nothing was carried.
    fn release(&mut self) -> GoldrushResult<Option<MarkerInfo>>;
}

/// Robot living in the shared arena.
#[derive(Debug)]
pub struct SimRobot {
    zone: usize,
    name: String,
    arena: SharedMutex<Arena>,
    clock: Arc<SimClock>,
}

impl SimRobot {
    /// Create the robot body in `zone`. Takes the physics lock.
    pub fn new(arena: &SharedMutex<Arena>, clock: &Arc<SimClock>, zone: usize) -> GoldrushResult<Self> {
        let name = arena.lock().unwrap().add_robot(zone)?;
        Ok(Self {
            zone,
            name,
            arena: arena.clone(),
            clock: clock.clone(),
        })
    }
}

impl RobotApi for SimRobot {
    fn name(&self) -> &str {
        &self.name
    }

    fn zone(&self) -> usize {
        self.zone
    }

    fn see(&mut self) -> GoldrushResult<Vec<Marker>> {
        self.arena.lock().unwrap().see(self.zone)
    }

    fn set_motor_power(&mut self, channel: MotorChannel, power: f32) -> GoldrushResult<()> {
        self.arena
            .lock()
            .unwrap()
            .set_motor_power(self.zone, channel, power)?;
        Ok(())
    }

    fn sleep(&mut self, duration: f32) -> GoldrushResult<()> {
        if is_enabled(InternalLog::ClockSync) {
            debug!("{} sleeps {duration}s", self.name);
        }
        self.clock.sleep(self.zone, duration)
    }

    fn grab(&mut self) -> GoldrushResult<Option<MarkerInfo>> {
        self.arena.lock().unwrap().grab(self.zone)
    }

    fn release(&mut self) -> GoldrushResult<Option<MarkerInfo>> {
        self.arena.lock().unwrap().release(self.zone)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        arena::{ArenaConfig, TokenConfig, ZoneConfig, vision::MarkerType},
        errors::GoldrushErrorTypes,
    };

    fn shared_arena() -> SharedMutex<Arena> {
        let config = ArenaConfig {
            zones: vec![ZoneConfig {
                x: 0.,
                y: 0.,
                heading: 0.,
            }],
            tokens: vec![TokenConfig {
                code: 3,
                kind: MarkerType::GoldToken,
                x: 0.3,
                y: 0.,
            }],
            ..Default::default()
        };
        Arc::new(Mutex::new(Arena::from_config(&config, 0).unwrap()))
    }

    #[test]
    fn robot_forwards_to_the_arena() {
        let arena = shared_arena();
        let clock = Arc::new(SimClock::new(0.05));
        let mut robot = SimRobot::new(&arena, &clock, 0).unwrap();
        assert_eq!(robot.name(), "robot-0");
        assert_eq!(robot.see().unwrap()[0].info.code, 3);
        robot.set_motor_power(MotorChannel::M1, -300.).unwrap();
        assert_eq!(arena.lock().unwrap().robot(0).unwrap().motors, [0., -100.]);
        assert_eq!(robot.grab().unwrap().unwrap().code, 3);
        assert!(robot.see().unwrap().is_empty());
        assert_eq!(robot.release().unwrap().unwrap().code, 3);
        // Zero duration does not wait for the simulator
        robot.sleep(0.).unwrap();
    }

    #[test]
    fn zone_cannot_be_used_twice() {
        let arena = shared_arena();
        let clock = Arc::new(SimClock::new(0.05));
        let _robot = SimRobot::new(&arena, &clock, 0).unwrap();
        let error = SimRobot::new(&arena, &clock, 0).unwrap_err();
        assert_eq!(error.error_type(), GoldrushErrorTypes::InitializationError);
    }

    #[test]
    fn sleep_after_the_end_fails() {
        let arena = shared_arena();
        let clock = Arc::new(SimClock::new(0.05));
        let mut robot = SimRobot::new(&arena, &clock, 0).unwrap();
        clock.finish();
        let error = robot.sleep(1.).unwrap_err();
        assert_eq!(error.error_type(), GoldrushErrorTypes::SimulationOver);
    }
}
