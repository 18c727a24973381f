use std::{
    error::Error,
    fmt::{Debug, Display},
};

use goldrush_macros::EnumToString;

#[derive(Debug, Clone, PartialEq, PartialOrd, EnumToString)]
pub enum GoldrushErrorTypes {
    UnknownError,
    ImplementationError,
    ConfigError,
    InitializationError,
    ExternalAPIError,
    /// The simulation loop ended while a robot was waiting for its motion to complete.
    SimulationOver,
}

#[derive(Clone)]
pub struct GoldrushError {
    error_type: GoldrushErrorTypes,
    what: String,
}

impl GoldrushError {
    pub fn new(error_type: GoldrushErrorTypes, what: String) -> Self {
        Self { error_type, what }
    }

    pub fn detailed_error(&self) -> String {
        format!("Goldrush Error of type {}: {}", self.error_type, self.what)
    }

    pub fn error_type(&self) -> GoldrushErrorTypes {
        self.error_type.clone()
    }

    pub fn chain(self, what: String) -> Self {
        Self {
            error_type: self.error_type,
            what: format!("{}\n↪ {}", self.what, what),
        }
    }
}

impl Display for GoldrushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Goldrush Error: {}", self.error_type)
    }
}

impl Debug for GoldrushError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Goldrush Error of type {}: {}",
            self.error_type, self.what
        )
    }
}

impl Error for GoldrushError {}

pub type GoldrushResult<T> = Result<T, GoldrushError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chained_error_keeps_type_and_history() {
        let error = GoldrushError::new(
            GoldrushErrorTypes::ConfigError,
            "time_step should be positive".to_string(),
        )
        .chain("while loading games/arena.yaml".to_string());

        assert_eq!(error.error_type(), GoldrushErrorTypes::ConfigError);
        assert_eq!(
            error.detailed_error(),
            "Goldrush Error of type ConfigError: time_step should be positive\n↪ while loading games/arena.yaml"
        );
        assert_eq!(error.to_string(), "Goldrush Error: ConfigError");
    }
}
