/*!
Token collection robots in a shared, lock-stepped arena.

This crate runs one controller per robot, each in its own thread, against a
single simulated arena. Controllers see markers (gold and silver tokens), drive
two motor channels, grab and release tokens. The simulator advances the
arena only when every controller is waiting for a motion to complete, so a run
is reproducible whatever the thread scheduling.

Main parts:
- The [`arena`] module holds the world: tokens, robot bodies, vision.
- The [`robot`] module exposes the [`robot::RobotApi`] used by the controllers,
  and its simulated implementation [`robot::SimRobot`].
- The [`controllers`] module provides the [`controllers::Controller`] strategy and
  the [`controllers::gold_collector::GoldCollector`] which gathers six gold tokens.
- The [`simulator`] module loads the configuration and runs the arena loop.
- The [`harness`] module spawns the controller threads and drives a full run.

For example:
```no_run
use std::path::Path;
use goldrush::{
    controllers::ControllerConfig,
    harness::Harness,
    simulator::Simulator,
};

let simulator = Simulator::from_config_path(Path::new("games/two_colours_assignment.yaml")).unwrap();
let mut harness = Harness::new(simulator, None);
let summary = harness.run(&[ControllerConfig::default()]).unwrap();
println!("{} controller(s) still running", summary.stragglers.len());
```
*/

pub mod actuation;
pub mod arena;
pub mod controllers;
pub mod harness;
pub mod logger;
pub mod physics;
pub mod plugin_api;
pub mod recordable;
pub mod robot;
pub mod simulator;
pub mod utils;

pub mod constants;
pub mod errors;

#[cfg(test)]
mod integration_tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
