//! Ground-plane calibration of a fixed camera from GNSS-tagged detections.
//!
//! This crate provides:
//! - a re-export of [`groundplane_core`] (DLT homography, RANSAC, `Calibrator`)
//! - parsing of autocalibration files (bounding box + geodetic position per line)
//! - WGS84 geodetic → ECEF → local ENU conversion feeding the ground points
//! - a JSON-loadable [`CalibrateConfig`] and a printable [`CalibrationReport`]
//! - (feature `cli`) the `groundplane` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use groundplane::{calibrate_file, CalibrateConfig};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CalibrateConfig {
//!     image_width: Some(1920),
//!     image_height: Some(1080),
//!     ..CalibrateConfig::default()
//! };
//! let report = calibrate_file(Path::new("autocalibration.csv"), &config)?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Frames
//! Pixels are moved to an image-centred frame with the vertical axis pointing
//! up; ground points are the east/north components of ENU coordinates with the
//! first record as origin.

pub use groundplane_core as core;

pub use groundplane_core::{CalibrationError, Calibrator, Homography, RansacParams};

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
mod error;
pub mod geodetic;
pub mod io;
mod report;

pub use config::{CalibrateConfig, ConfigError};
pub use error::GroundplaneError;
pub use geodetic::{EnuFrame, Geodetic};
pub use io::{AngleUnit, CalibrationData, ImageFrame, InputError};
pub use report::{calibrate_data, calibrate_file, CalibrationReport};
