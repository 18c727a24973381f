/*!
Actuation policies: how a motion command is turned into motor powers.

A [`MotionCommand`] gives a power for each wheel and a duration. The
[`OpenLoop`] policy applies the powers, waits for the duration, then stops the
motors.
*/

use std::fmt::Debug;

use goldrush_macros::config_derives;

use crate::{
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    robot::{MotorChannel, RobotApi},
};

/// Power for each wheel during `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    pub left: f32,
    pub right: f32,
    pub duration: f32,
}

impl MotionCommand {
    /// Both wheels at `speed`: forward if positive, backward if negative.
    pub fn drive(speed: f32, duration: f32) -> Self {
        Self {
            left: speed,
            right: speed,
            duration,
        }
    }

    /// Wheels in opposite directions: clockwise if `speed` is positive.
    pub fn turn(speed: f32, duration: f32) -> Self {
        Self {
            left: speed,
            right: -speed,
            duration,
        }
    }
}

pub trait Actuation: Debug + Send {
    fn execute(&self, robot: &mut dyn RobotApi, command: &MotionCommand) -> GoldrushResult<()>;
}

#[config_derives]
pub struct OpenLoopConfig {
    /// Factor applied on the commanded powers.
    pub power_scale: f32,
    /// Factor applied on the commanded durations.
    pub duration_scale: f32,
}

impl Default for OpenLoopConfig {
    fn default() -> Self {
        Self {
            power_scale: 1.,
            duration_scale: 1.,
        }
    }
}

impl OpenLoopConfig {
    pub fn check(&self) -> GoldrushResult<()> {
        if self.duration_scale <= 0. {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!(
                    "duration_scale should be positive, got {}",
                    self.duration_scale
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OpenLoop {
    config: OpenLoopConfig,
}

impl OpenLoop {
    pub fn from_config(config: &OpenLoopConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Actuation for OpenLoop {
    fn execute(&self, robot: &mut dyn RobotApi, command: &MotionCommand) -> GoldrushResult<()> {
        robot.set_motor_power(MotorChannel::M0, command.left * self.config.power_scale)?;
        robot.set_motor_power(MotorChannel::M1, command.right * self.config.power_scale)?;
        let slept = robot.sleep(command.duration * self.config.duration_scale);
        robot.set_motor_power(MotorChannel::M0, 0.)?;
        robot.set_motor_power(MotorChannel::M1, 0.)?;
        slept
    }
}

/// Actuation policy of a controller.
#[config_derives]
pub enum ActuationConfig {
    OpenLoop(OpenLoopConfig),
}

impl Default for ActuationConfig {
    fn default() -> Self {
        Self::OpenLoop(OpenLoopConfig::default())
    }
}

impl ActuationConfig {
    pub fn check(&self) -> GoldrushResult<()> {
        match self {
            ActuationConfig::OpenLoop(c) => c.check(),
        }
    }
}

pub fn make_actuation_from_config(config: &ActuationConfig) -> Box<dyn Actuation> {
    match config {
        ActuationConfig::OpenLoop(c) => Box::new(OpenLoop::from_config(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arena::vision::{Marker, MarkerInfo},
        errors::{GoldrushError, GoldrushErrorTypes},
    };

    #[derive(Debug, Default)]
    struct MotorLog {
        powers: Vec<(MotorChannel, f32)>,
        sleeps: Vec<f32>,
        fail_sleep: bool,
    }

    impl RobotApi for MotorLog {
        fn name(&self) -> &str {
            "log"
        }
        fn zone(&self) -> usize {
            0
        }
        fn see(&mut self) -> GoldrushResult<Vec<Marker>> {
            Ok(Vec::new())
        }
        fn set_motor_power(&mut self, channel: MotorChannel, power: f32) -> GoldrushResult<()> {
            self.powers.push((channel, power));
            Ok(())
        }
        fn sleep(&mut self, duration: f32) -> GoldrushResult<()> {
            self.sleeps.push(duration);
            if self.fail_sleep {
                return Err(GoldrushError::new(
                    GoldrushErrorTypes::SimulationOver,
                    "over".to_string(),
                ));
            }
            Ok(())
        }
        fn grab(&mut self) -> GoldrushResult<Option<MarkerInfo>> {
            Ok(None)
        }
        fn release(&mut self) -> GoldrushResult<Option<MarkerInfo>> {
            Ok(None)
        }
    }

    #[test]
    fn turn_is_clockwise_for_positive_speed() {
        let command = MotionCommand::turn(30., 2.);
        assert_eq!(command.left, 30.);
        assert_eq!(command.right, -30.);
        assert_eq!(MotionCommand::drive(-10., 2.).right, -10.);
    }

    #[test]
    fn open_loop_drives_then_stops() {
        let actuation = make_actuation_from_config(&ActuationConfig::OpenLoop(OpenLoopConfig {
            power_scale: 2.,
            duration_scale: 0.5,
        }));
        let mut robot = MotorLog::default();
        actuation
            .execute(&mut robot, &MotionCommand::turn(5., 2.))
            .unwrap();
        assert_eq!(
            robot.powers,
            vec![
                (MotorChannel::M0, 10.),
                (MotorChannel::M1, -10.),
                (MotorChannel::M0, 0.),
                (MotorChannel::M1, 0.)
            ]
        );
        assert_eq!(robot.sleeps, vec![1.]);
    }

    #[test]
    fn motors_stop_when_the_sleep_fails() {
        let actuation = OpenLoop::from_config(&OpenLoopConfig::default());
        let mut robot = MotorLog {
            fail_sleep: true,
            ..Default::default()
        };
        let error = actuation
            .execute(&mut robot, &MotionCommand::drive(10., 0.5))
            .unwrap_err();
        assert_eq!(error.error_type(), GoldrushErrorTypes::SimulationOver);
        assert_eq!(robot.powers.len(), 4);
    }

    #[test]
    fn config_from_yaml() {
        let config: ActuationConfig =
            serde_yaml::from_str("type: OpenLoop\nduration_scale: 2.\n").unwrap();
        assert_eq!(
            config,
            ActuationConfig::OpenLoop(OpenLoopConfig {
                power_scale: 1.,
                duration_scale: 2.,
            })
        );
    }

    #[test]
    fn null_duration_scale_is_rejected() {
        ActuationConfig::default().check().unwrap();
        for duration_scale in [0., -1.] {
            let config = ActuationConfig::OpenLoop(OpenLoopConfig {
                duration_scale,
                ..Default::default()
            });
            assert_eq!(
                config.check().unwrap_err().error_type(),
                GoldrushErrorTypes::ConfigError
            );
        }
    }
}
