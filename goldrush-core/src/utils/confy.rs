use std::path::Path;

use confy::ConfyError;
use serde::de::DeserializeOwned;

use crate::errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult};

#[allow(unreachable_patterns)]
pub fn detailed_error(error: &ConfyError) -> String {
    format!(
        "{}: {}",
        error,
        match error {
            ConfyError::BadYamlData(e) => e.to_string(),
            ConfyError::DirectoryCreationFailed(e) => e.to_string(),
            ConfyError::GeneralLoadError(e) => e.to_string(),
            ConfyError::SerializeYamlError(e) => e.to_string(),
            ConfyError::ReadConfigurationFileError(e) => e.to_string(),
            ConfyError::OpenConfigurationFileError(e) => e.to_string(),
            _ => String::new(),
        }
    )
}

/// Load a YAML file with confy, resolve the merge keys (`<<: *anchor`) and
/// deserialize it as `T`.
///
/// The file must exist: confy would otherwise create it with a default content.
pub fn load_yaml<T: DeserializeOwned>(path: &Path, what: &str) -> GoldrushResult<T> {
    if !path.is_file() {
        return Err(GoldrushError::new(
            GoldrushErrorTypes::ConfigError,
            format!("{what} file '{}' does not exist", path.display()),
        ));
    }
    let mut value: serde_yaml::Value = confy::load_path(path).map_err(|error| {
        GoldrushError::new(
            GoldrushErrorTypes::ConfigError,
            format!(
                "Error from Confy while loading the {what} file: {}",
                detailed_error(&error)
            ),
        )
    })?;
    value.apply_merge().map_err(|e| {
        GoldrushError::new(
            GoldrushErrorTypes::ConfigError,
            format!("Error from SerdeYAML while merging YAML tags: {e}"),
        )
    })?;
    serde_yaml::from_value(value).map_err(|e| {
        GoldrushError::new(
            GoldrushErrorTypes::ConfigError,
            format!("Error from SerdeYAML while loading the {what}: {e}"),
        )
    })
}
