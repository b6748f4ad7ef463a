use crate::io::{AngleUnit, ImageFrame};
use crate::GroundplaneError;
use groundplane_core::RansacParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no image {0} provided")]
    MissingImageSize(&'static str),
}

/// Everything needed to calibrate from an autocalibration file.
///
/// Loaded from JSON; every field is optional and falls back to its default.
///
/// ```json
/// { "image_width": 1920, "image_height": 1080, "angle_unit": "degrees",
///   "ransac": { "iterations": 2000, "inlier_threshold": 2.5 } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrateConfig {
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub angle_unit: AngleUnit,
    pub ransac: RansacParams,
}

impl CalibrateConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Image size as dimensions; both must be present.
    pub fn image_size(&self) -> Result<(u32, u32), ConfigError> {
        let w = self
            .image_width
            .ok_or(ConfigError::MissingImageSize("width"))?;
        let h = self
            .image_height
            .ok_or(ConfigError::MissingImageSize("height"))?;
        Ok((w, h))
    }

    pub fn image_frame(&self) -> Result<ImageFrame, GroundplaneError> {
        let (w, h) = self.image_size()?;
        Ok(ImageFrame::new(w, h)?)
    }
}
