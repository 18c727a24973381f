use std::{collections::BTreeSet, path::Path};

use crate::{
    arena::{
        Arena,
        vision::{Marker, MarkerInfo, MarkerType},
    },
    controllers::{
        Controller, ControllerStatus,
        gold_collector::{GoldCollector, GoldCollectorConfig},
    },
    errors::GoldrushResult,
    robot::{MotorChannel, RobotApi},
    simulator::SimulatorConfig,
};

/// Robot driving the arena itself, without thread nor clock.
struct SteppedRobot {
    arena: Arena,
    time_step: f32,
    time: f32,
}

impl RobotApi for SteppedRobot {
    fn name(&self) -> &str {
        "robot-0"
    }

    fn zone(&self) -> usize {
        0
    }

    fn see(&mut self) -> GoldrushResult<Vec<Marker>> {
        self.arena.see(0)
    }

    fn set_motor_power(&mut self, channel: MotorChannel, power: f32) -> GoldrushResult<()> {
        self.arena.set_motor_power(0, channel, power)?;
        Ok(())
    }

    fn sleep(&mut self, duration: f32) -> GoldrushResult<()> {
        let ticks = (duration / self.time_step).round() as u64;
        for _ in 0..ticks {
            self.arena.step(self.time_step);
            self.time += self.time_step;
        }
        Ok(())
    }

    fn grab(&mut self) -> GoldrushResult<Option<MarkerInfo>> {
        self.arena.grab(0)
    }

    fn release(&mut self) -> GoldrushResult<Option<MarkerInfo>> {
        self.arena.release(0)
    }
}

fn stepped_robot() -> SteppedRobot {
    let config =
        SimulatorConfig::load_from_path(Path::new("test_config/single_robot.yaml")).unwrap();
    let mut arena = Arena::from_config(&config.arena, 7).unwrap();
    arena.add_robot(0).unwrap();
    SteppedRobot {
        arena,
        time_step: config.time_step,
        time: 0.,
    }
}

#[test]
fn collects_every_gold_token() {
    let mut robot = stepped_robot();
    let mut collector = GoldCollector::from_config(&GoldCollectorConfig::default());
    let mut steps = 0;
    while collector.step(&mut robot).unwrap() == ControllerStatus::Running {
        steps += 1;
        assert!(
            robot.time < 2000.,
            "Collection too long: {:?}",
            collector.grabbed_codes()
        );
    }
    println!("Collected in {steps} steps, {}s", robot.time);

    let codes: BTreeSet<i32> = collector.grabbed_codes().iter().copied().collect();
    assert_eq!(collector.grabbed_codes().len(), 6);
    assert_eq!(codes, (0..6).collect());

    // Every gold token lies in the drop area, around the first one
    let tokens = robot.arena.tokens();
    let first = tokens
        .iter()
        .find(|t| t.info.code == collector.grabbed_codes()[0])
        .unwrap()
        .position;
    for token in tokens
        .iter()
        .filter(|t| t.info.marker_type == MarkerType::GoldToken)
    {
        assert!(token.carried_by.is_none());
        assert!(
            (token.position - first).norm() < 2.,
            "Token {} too far from the drop area: {:?}",
            token.info.code,
            token.position
        );
    }
    // Silver tokens were never moved
    let silver: Vec<(i32, f32, f32)> = tokens
        .iter()
        .filter(|t| t.info.marker_type == MarkerType::SilverToken)
        .map(|t| (t.info.code, t.position.x, t.position.y))
        .collect();
    assert_eq!(silver, vec![(6, -3., 3.), (7, 3.2, -3.2)]);
}
