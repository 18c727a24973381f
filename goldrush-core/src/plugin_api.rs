/*!
Module providing the trait to link the simulator to external controllers.

Example to use an external controller:
```ignore
use goldrush::controllers::{Controller, ControllerRecord, ControllerStatus};
use goldrush::errors::GoldrushResult;
use goldrush::{plugin_api::PluginAPI, simulator::SimulatorConfig};
use serde_json::Value;

pub struct MyPlugin;

impl PluginAPI for MyPlugin {
    fn get_controller(
        &self,
        config: &Value,
        _global_config: &SimulatorConfig,
    ) -> GoldrushResult<Box<dyn Controller>> {
        Ok(Box::new(MyController::from_config(config)?))
    }
}

// You should use the simulator as a library. Your main.rs could be:
use goldrush::{harness::Harness, simulator::Simulator};
use std::{path::Path, sync::Arc};

fn main() {
    let simulator = Simulator::from_config_path(Path::new("games/two_colours_assignment.yaml")).unwrap();
    let mut harness = Harness::new(simulator, Some(Arc::new(MyPlugin)));
    harness.run(&controller_configs).unwrap();
}
```
*/

use serde_json::Value;

use crate::{
    controllers::Controller,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    simulator::SimulatorConfig,
};

/// Trait to link the simulator to the external implementation.
pub trait PluginAPI: Send + Sync {
    /// Return the [`Controller`] to be used by the
    /// [`ExternalController`](`crate::controllers::external_controller::ExternalController`).
    ///
    /// # Arguments
    /// * `config` - Config for the external controller. The configuration
    ///   is given using [`serde_json::Value`]. It should be converted by the
    ///   external plugin to the specific configuration.
    /// * `global_config` - Full configuration of the simulator.
    ///
    /// # Return
    ///
    /// Returns the [`Controller`] to use.
    fn get_controller(
        &self,
        _config: &Value,
        _global_config: &SimulatorConfig,
    ) -> GoldrushResult<Box<dyn Controller>> {
        Err(GoldrushError::new(
            GoldrushErrorTypes::ExternalAPIError,
            "The given PluginAPI does not provide a controller".to_string(),
        ))
    }
}
