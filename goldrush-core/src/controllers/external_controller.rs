/*!
Module providing the interface to use external [`Controller`].

To make your own external controller strategy, the simulator should
be used as a library (see [dedicated page](crate::plugin_api)).

Your own external controller strategy is made using the
[`PluginAPI::get_controller`] function.

For the [`Recordable`] trait, the generic type is [`ControllerRecord`],
and your implementation should return a [`ControllerRecord::External`]
type. The value inside is a [`serde_json::Value`]. Use [`serde_json::to_value`]
and [`serde_json::from_value`] to make the bridge to your own Record struct.
*/

use std::sync::Arc;

use goldrush_macros::config_derives;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::{InternalLog, is_enabled},
    plugin_api::PluginAPI,
    recordable::Recordable,
    robot::RobotApi,
    simulator::SimulatorConfig,
};

use super::{Controller, ControllerRecord, ControllerStatus};

/// Config for the external controller (generic).
///
/// The config for [`ExternalController`] uses a [`serde_json::Value`] to
/// integrate your own configuration inside the controller file.
///
/// In the yaml file, the config could be:
/// ```YAML
/// type: External
/// parameter_of_my_own_controller: true
/// ```
#[config_derives(skip_unknown_fields)]
pub struct ExternalControllerConfig {
    /// Config serialized.
    #[serde(flatten)]
    pub config: serde_json::Value,
}

impl Default for ExternalControllerConfig {
    fn default() -> Self {
        Self {
            config: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Record for the external controller (generic).
///
/// Like [`ExternalControllerConfig`], [`ExternalController`] uses a [`serde_json::Value`]
/// to take every record.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExternalControllerRecord {
    pub record: serde_json::Value,
}

/// External controller strategy, which does the bridge with your own strategy.
pub struct ExternalController {
    /// External controller.
    controller: Box<dyn Controller>,
}

impl ExternalController {
    /// Creates a new [`ExternalController`] from the given config.
    ///
    /// <div class="warning">The `plugin_api` is required here !</div>
    ///
    ///  ## Arguments
    /// * `config` -- Config of the External controller.
    /// * `plugin_api` -- Required [`PluginAPI`] implementation.
    /// * `global_config` -- Simulator config.
    pub fn from_config(
        config: &ExternalControllerConfig,
        plugin_api: &Option<Arc<dyn PluginAPI>>,
        global_config: &SimulatorConfig,
    ) -> GoldrushResult<Self> {
        if is_enabled(InternalLog::SetupSteps) {
            debug!("Config given: {:?}", config);
        }
        Ok(Self {
            controller: plugin_api
                .as_ref()
                .ok_or_else(|| {
                    GoldrushError::new(
                        GoldrushErrorTypes::ExternalAPIError,
                        "Plugin API not set!".to_string(),
                    )
                })?
                .get_controller(&config.config, global_config)?,
        })
    }
}

impl std::fmt::Debug for ExternalController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExternalController {{}}")
    }
}

impl Controller for ExternalController {
    fn step(&mut self, robot: &mut dyn RobotApi) -> GoldrushResult<ControllerStatus> {
        self.controller.step(robot)
    }
}

impl Recordable<ControllerRecord> for ExternalController {
    fn record(&self) -> ControllerRecord {
        self.controller.record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_is_required() {
        let error = ExternalController::from_config(
            &ExternalControllerConfig::default(),
            &None,
            &SimulatorConfig::default(),
        )
        .unwrap_err();
        assert_eq!(error.error_type(), GoldrushErrorTypes::ExternalAPIError);
    }

    #[test]
    fn default_plugin_provides_no_controller() {
        struct EmptyPlugin;
        impl PluginAPI for EmptyPlugin {}

        let plugin: Option<Arc<dyn PluginAPI>> = Some(Arc::new(EmptyPlugin));
        let error = ExternalController::from_config(
            &ExternalControllerConfig::default(),
            &plugin,
            &SimulatorConfig::default(),
        )
        .unwrap_err();
        assert_eq!(error.error_type(), GoldrushErrorTypes::ExternalAPIError);
    }
}
