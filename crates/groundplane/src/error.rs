use crate::config::ConfigError;
use crate::io::InputError;
use groundplane_core::CalibrationError;

/// Errors produced by the file-to-report helpers and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum GroundplaneError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}
