/*!
Module providing the [`Controller`] strategy, which decides the next action
of a robot from what it sees.

A controller is driven by its thread through [`Controller::step`]: each call
takes one decision and performs at most one motion, grab or release, until the
controller reports [`ControllerStatus::Finished`].
*/

pub mod external_controller;
pub mod gold_collector;

use std::{path::Path, sync::Arc};

use goldrush_macros::config_derives;
use serde::{Deserialize, Serialize};

use crate::{
    errors::GoldrushResult,
    plugin_api::PluginAPI,
    recordable::Recordable,
    robot::RobotApi,
    simulator::SimulatorConfig,
    utils,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStatus {
    Running,
    Finished,
}

/// Enumerates the strategies configurations.
///
/// ## Example in yaml:
/// ```ignore
/// type: GoldCollector
/// quota: 6
/// search_turn: {speed: 5., duration: 2.}
/// ```
#[config_derives]
pub enum ControllerConfig {
    GoldCollector(gold_collector::GoldCollectorConfig),
    External(external_controller::ExternalControllerConfig),
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::GoldCollector(gold_collector::GoldCollectorConfig::default())
    }
}

impl ControllerConfig {
    pub fn load_from_path(path: &Path) -> GoldrushResult<Self> {
        utils::confy::load_yaml(path, "controller")
    }

    pub fn check(&self) -> GoldrushResult<()> {
        match self {
            ControllerConfig::GoldCollector(c) => c.check(),
            ControllerConfig::External(_) => Ok(()),
        }
    }
}

/// Enumerates the strategies records.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ControllerRecord {
    GoldCollector(gold_collector::GoldCollectorRecord),
    External(external_controller::ExternalControllerRecord),
}

/// Controller strategy of one robot.
pub trait Controller: std::fmt::Debug + std::marker::Send + Recordable<ControllerRecord> {
    /// Take the next decision and act on the `robot`.
    ///
    /// ## Return
    /// [`ControllerStatus::Finished`] when the controller reached its goal. Errors
    /// from the robot (e.g. the end of the simulation) are propagated.
    fn step(&mut self, robot: &mut dyn RobotApi) -> GoldrushResult<ControllerStatus>;
}

/// Helper function to make the right [`Controller`] from the given configuration.
///
/// ## Arguments
/// * `config` - Configuration to use to make the controller.
/// * `plugin_api` - Optional PluginAPI to transmit to the controller.
/// * `global_config` - Configuration of the simulator.
pub fn make_controller_from_config(
    config: &ControllerConfig,
    plugin_api: &Option<Arc<dyn PluginAPI>>,
    global_config: &SimulatorConfig,
) -> GoldrushResult<Box<dyn Controller>> {
    config.check()?;
    Ok(match config {
        ControllerConfig::GoldCollector(c) => {
            Box::new(gold_collector::GoldCollector::from_config(c)) as Box<dyn Controller>
        }
        ControllerConfig::External(c) => {
            Box::new(external_controller::ExternalController::from_config(
                c,
                plugin_api,
                global_config,
            )?) as Box<dyn Controller>
        }
    })
}
