use std::{fs::File, io::Write, path::Path};

use goldrush_macros::config_derives;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    arena::ArenaRecord,
    controllers::ControllerRecord,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    simulator::SimulatorConfig,
};

#[config_derives]
#[derive(Default)]
pub struct ResultConfig {
    /// Filename to save the results, in JSON format, relative to the config file.
    pub result_path: Option<String>,
}

/// Outcome of one controller thread.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ControllerReport {
    /// Name of the robot (`robot-<zone>`).
    pub name: String,
    pub zone: usize,
    /// True if the controller reached its goal.
    pub finished: bool,
    /// Detailed error which stopped the controller, if any.
    pub error: Option<String>,
    pub record: Option<ControllerRecord>,
}

/// Result of a full run.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunSummary {
    /// Simulated time at the end of the run.
    pub time: f32,
    /// Reports of the controller threads which ended.
    pub controllers: Vec<ControllerReport>,
    pub arena: ArenaRecord,
    /// Robots whose controller thread was still active at the end of the run.
    pub stragglers: Vec<String>,
}

#[derive(Serialize)]
struct ResultFile<'a> {
    config: &'a SimulatorConfig,
    summary: &'a RunSummary,
}

pub(crate) fn save_results(
    filename: &Path,
    config: &SimulatorConfig,
    summary: &RunSummary,
) -> GoldrushResult<()> {
    info!("Saving results to {}", filename.display());
    let mut recording_file = File::create(filename).map_err(|e| {
        GoldrushError::new(
            GoldrushErrorTypes::ConfigError,
            format!(
                "Impossible to create result file '{}': {e}",
                filename.display()
            ),
        )
    })?;
    serde_json::to_writer(&recording_file, &ResultFile { config, summary }).map_err(|e| {
        GoldrushError::new(
            GoldrushErrorTypes::ImplementationError,
            format!("Error during json serialization of results: {e}"),
        )
    })?;
    recording_file.write_all(b"\n").map_err(|e| {
        GoldrushError::new(
            GoldrushErrorTypes::UnknownError,
            format!("Error while writing result file: {e}"),
        )
    })
}
