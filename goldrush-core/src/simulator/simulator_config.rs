use std::path::Path;

use goldrush_macros::config_derives;

use crate::{
    VERSION,
    arena::ArenaConfig,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::LoggerConfig,
    simulator::ResultConfig,
    utils,
};

/// Scenario configuration for the simulator.
/// The Simulator configuration is the root of the scenario configuration.
///
/// ## Example in yaml:
/// ```ignore
/// version: 0.1.0
/// log:
///     log_level:
///         type: Info
/// max_time: 600.
/// time_step: 0.05
/// real_time_factor: null # As fast as possible
/// random_seed: 42
/// controller_timeout: 1.
/// arena:
///     ArenaConfig
/// ```
#[config_derives]
pub struct SimulatorConfig {
    pub version: String,
    pub log: LoggerConfig,
    pub results: Option<ResultConfig>,

    #[serde(skip)]
    pub base_path: Box<Path>,

    /// Simulated duration after which the run stops, in seconds.
    pub max_time: f32,
    /// Duration of one simulation tick, in seconds.
    pub time_step: f32,
    /// Ratio between the simulated time and the wall-clock time. `None` runs as fast as possible.
    pub real_time_factor: Option<f32>,
    /// Seed of the random token placement and of the vision noise. Drawn at random if `None`.
    pub random_seed: Option<u64>,
    /// Wall-clock time (seconds) the loop waits for a controller which does not
    /// sleep. Past it, the controller is left behind until its next sleep.
    pub controller_timeout: f32,
    pub arena: ArenaConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            version: VERSION.to_string(),
            log: LoggerConfig::default(),
            results: None,
            base_path: Box::from(Path::new(".")),
            max_time: 600.,
            time_step: 0.05,
            real_time_factor: Some(1.),
            random_seed: None,
            controller_timeout: 1.,
            arena: ArenaConfig::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn load_from_path(path: &Path) -> GoldrushResult<Self> {
        let mut config: SimulatorConfig = utils::confy::load_yaml(path, "config")?;
        config.base_path = Box::from(path.parent().unwrap_or(Path::new(".")));
        Ok(config)
    }

    pub fn check(&self) -> GoldrushResult<()> {
        if self.time_step <= 0. {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!("time_step should be positive, got {}", self.time_step),
            ));
        }
        if self.max_time < 0. {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!("max_time should be non negative, got {}", self.max_time),
            ));
        }
        if self.controller_timeout <= 0. {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!(
                    "controller_timeout should be positive, got {}",
                    self.controller_timeout
                ),
            ));
        }
        if let Some(factor) = self.real_time_factor {
            if factor <= 0. {
                return Err(GoldrushError::new(
                    GoldrushErrorTypes::ConfigError,
                    format!("real_time_factor should be positive, got {factor}"),
                ));
            }
        }
        self.arena
            .check()
            .map_err(|e| e.chain("in arena configuration".to_string()))
    }

    /// Major and minor numbers of the `version` field.
    pub fn version_numbers(&self) -> GoldrushResult<(usize, usize)> {
        let numbers: Vec<usize> = self
            .version
            .split('.')
            .map(|s| s.parse::<usize>())
            .collect::<Result<_, _>>()
            .map_err(|e| {
                GoldrushError::new(
                    GoldrushErrorTypes::ConfigError,
                    format!("Config version pattern not recognized ({}): {e}", self.version),
                )
            })?;
        if numbers.len() < 2 {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                "Version is expected to be XX.YY at least".to_string(),
            ));
        }
        Ok((numbers[0], numbers[1]))
    }

    /// Number of simulation ticks covered by `max_time`.
    pub fn max_ticks(&self) -> u64 {
        (self.max_time / self.time_step).round() as u64
    }
}
