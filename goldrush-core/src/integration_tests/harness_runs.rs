use std::{path::Path, sync::Arc};

use serde_json::{Value, json};

use crate::{
    controllers::{
        Controller, ControllerConfig, ControllerRecord, ControllerStatus,
        external_controller::{ExternalControllerConfig, ExternalControllerRecord},
    },
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    harness::Harness,
    plugin_api::PluginAPI,
    recordable::Recordable,
    robot::{MotorChannel, RobotApi},
    simulator::{ResultConfig, Simulator, SimulatorConfig},
};

fn load_simulator(config: &str) -> Simulator {
    Simulator::from_config_path(Path::new(format!("test_config/{config}.yaml").as_str()))
        .map_err(|e| {
            println!("Error while loading config: {}", e.detailed_error());
            e
        })
        .unwrap()
}

fn quota_one() -> ControllerConfig {
    ControllerConfig::load_from_path(Path::new("test_config/quota_one.yaml")).unwrap()
}

#[test]
fn single_controller_finishes() {
    let mut harness = Harness::new(load_simulator("single_robot"), None);
    let summary = harness.run(&[quota_one()]).unwrap();

    assert!(summary.stragglers.is_empty());
    assert_eq!(summary.controllers.len(), 1);
    let report = &summary.controllers[0];
    assert_eq!(report.name, "robot-0");
    assert!(report.finished, "{:?}", report.error);
    assert!(summary.time > 0. && summary.time < 3000.);
    let Some(ControllerRecord::GoldCollector(record)) = &report.record else {
        panic!("Wrong record: {:?}", report.record);
    };
    assert_eq!(record.grabbed_codes.len(), 1);
    let collected = summary
        .arena
        .tokens
        .iter()
        .find(|t| t.info.code == record.grabbed_codes[0])
        .unwrap();
    assert!(collected.carried_by.is_none());
    assert_eq!(summary.arena.robots.len(), 1);
    assert_eq!(summary.arena.robots[0].carried, None);
}

#[test]
fn too_many_controllers() {
    let mut harness = Harness::new(load_simulator("single_robot"), None);
    let error = harness
        .run(&[ControllerConfig::default(), ControllerConfig::default()])
        .unwrap_err();
    assert_eq!(error.error_type(), GoldrushErrorTypes::ConfigError);
    assert_eq!(harness.simulator().clock().tick(), 0);
}

#[test]
fn unfinished_controllers_are_reported() {
    let mut harness = Harness::new(load_simulator("two_robots"), None);
    let summary = harness
        .run(&[ControllerConfig::default(), ControllerConfig::default()])
        .unwrap();
    assert_eq!(
        summary.stragglers,
        vec!["robot-0".to_string(), "robot-1".to_string()]
    );
    assert!(summary.controllers.is_empty());
    assert!((summary.time - 30.).abs() < 1e-3);
}

#[test]
fn failing_controller_does_not_block_the_run() {
    let mut harness = Harness::new(load_simulator("two_robots"), None);
    let summary = harness
        .run(&[ControllerConfig::External(
            ExternalControllerConfig::default(),
        )])
        .unwrap();
    assert!(summary.stragglers.is_empty());
    let report = &summary.controllers[0];
    assert!(!report.finished);
    assert!(report.error.as_ref().unwrap().contains("ExternalAPIError"));
    // The loop ends as soon as the only controller is gone
    assert!(summary.time < 30.);
}

/// Drives forward during `duration` seconds, then stops.
#[derive(Debug)]
struct Sprinter {
    power: f32,
    duration: f32,
    done: bool,
}

impl Controller for Sprinter {
    fn step(&mut self, robot: &mut dyn RobotApi) -> GoldrushResult<ControllerStatus> {
        robot.set_motor_power(MotorChannel::M0, self.power)?;
        robot.set_motor_power(MotorChannel::M1, self.power)?;
        robot.sleep(self.duration)?;
        robot.set_motor_power(MotorChannel::M0, 0.)?;
        robot.set_motor_power(MotorChannel::M1, 0.)?;
        self.done = true;
        Ok(ControllerStatus::Finished)
    }
}

impl Recordable<ControllerRecord> for Sprinter {
    fn record(&self) -> ControllerRecord {
        ControllerRecord::External(ExternalControllerRecord {
            record: json!({"done": self.done}),
        })
    }
}

/// Looks around without ever waiting for a motion.
#[derive(Debug)]
struct Spinner {
    steps: usize,
}

impl Controller for Spinner {
    fn step(&mut self, robot: &mut dyn RobotApi) -> GoldrushResult<ControllerStatus> {
        robot.see()?;
        // Fails once the simulation is over
        robot.sleep(0.)?;
        self.steps += 1;
        Ok(ControllerStatus::Running)
    }
}

impl Recordable<ControllerRecord> for Spinner {
    fn record(&self) -> ControllerRecord {
        ControllerRecord::External(ExternalControllerRecord {
            record: json!({"steps": self.steps}),
        })
    }
}

struct TestPlugin;

impl PluginAPI for TestPlugin {
    fn get_controller(
        &self,
        config: &Value,
        _global_config: &SimulatorConfig,
    ) -> GoldrushResult<Box<dyn Controller>> {
        if config["mode"] == "spin" {
            return Ok(Box::new(Spinner { steps: 0 }));
        }
        let power = config["power"].as_f64().ok_or_else(|| {
            GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                "Sprinter needs a power".to_string(),
            )
        })? as f32;
        Ok(Box::new(Sprinter {
            power,
            duration: 2.,
            done: false,
        }))
    }
}

#[test]
fn external_controller_from_plugin() {
    let config: ControllerConfig = serde_yaml::from_str("type: External\npower: 50\n").unwrap();
    let mut harness = Harness::new(load_simulator("two_robots"), Some(Arc::new(TestPlugin)));
    let summary = harness.run(&[config]).unwrap();

    let report = &summary.controllers[0];
    assert!(report.finished, "{:?}", report.error);
    let Some(ControllerRecord::External(record)) = &report.record else {
        panic!("Wrong record: {:?}", report.record);
    };
    assert_eq!(record.record, json!({"done": true}));
    assert!((summary.time - 2.).abs() < 1e-3);
    // 0.5 m/s during 2 s along the diagonal
    let pose = summary.arena.robots[0].pose;
    assert!((pose[0] - (-3. + 1. / 2f32.sqrt())).abs() < 1e-3, "{pose:?}");
    assert!((pose[1] - (-3. + 1. / 2f32.sqrt())).abs() < 1e-3, "{pose:?}");
}

#[test]
fn results_are_saved() {
    let result_path = std::env::temp_dir().join("goldrush_results_are_saved.json");
    let mut config =
        SimulatorConfig::load_from_path(Path::new("test_config/two_robots.yaml")).unwrap();
    config.max_time = 1.;
    config.results = Some(ResultConfig {
        result_path: Some(result_path.to_string_lossy().to_string()),
    });
    let mut harness = Harness::new(Simulator::from_config(&config).unwrap(), None);
    harness.run(&[]).unwrap();

    let content = std::fs::read_to_string(&result_path).unwrap();
    let results: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(results["config"]["random_seed"], 7);
    assert_eq!(results["summary"]["stragglers"], json!([]));
    assert_eq!(results["summary"]["arena"]["tokens"].as_array().unwrap().len(), 8);
    std::fs::remove_file(result_path).unwrap();
}

#[test]
fn controller_which_never_sleeps_is_left_behind() {
    let mut config =
        SimulatorConfig::load_from_path(Path::new("test_config/two_robots.yaml")).unwrap();
    config.max_time = 5.;
    config.controller_timeout = 0.2;
    let controller: ControllerConfig =
        serde_yaml::from_str("type: External\nmode: spin\n").unwrap();
    let mut harness = Harness::new(
        Simulator::from_config(&config).unwrap(),
        Some(Arc::new(TestPlugin)),
    );
    let summary = harness.run(&[controller]).unwrap();

    assert_eq!(summary.stragglers, vec!["robot-0".to_string()]);
    assert!(summary.controllers.is_empty());
    assert!((summary.time - 5.).abs() < 1e-3);
}

#[test]
fn motions_shorter_than_a_tick_still_take_a_tick() {
    let mut config =
        SimulatorConfig::load_from_path(Path::new("test_config/single_robot.yaml")).unwrap();
    // Longer than twice the approach and orientation motions
    config.time_step = 1.2;
    config.max_time = 12.;
    let mut harness = Harness::new(Simulator::from_config(&config).unwrap(), None);
    let summary = harness.run(&[ControllerConfig::default()]).unwrap();

    assert_eq!(summary.stragglers, vec!["robot-0".to_string()]);
    assert!((summary.time - 12.).abs() < 1e-3);
}

#[test]
fn controller_without_motion_duration_is_rejected() {
    let controller: ControllerConfig = serde_yaml::from_str(
        "type: GoldCollector\nactuation:\n  type: OpenLoop\n  duration_scale: 0.\n",
    )
    .unwrap();
    let mut harness = Harness::new(load_simulator("single_robot"), None);
    let error = harness.run(&[controller]).unwrap_err();
    assert_eq!(error.error_type(), GoldrushErrorTypes::ConfigError);
    assert_eq!(harness.simulator().clock().tick(), 0);
}
