//! Robust estimation of the homography mapping image pixels onto a ground
//! plane, and conversion of pixel observations into ground positions.
//!
//! The crate is purely geometric: it takes two index-aligned slices of
//! pixel and ground-plane points and knows nothing about file formats or
//! geodetic frames.
//!
//! ```
//! use groundplane_core::{Calibrator, RansacParams};
//! use nalgebra::Point2;
//!
//! let pixels = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(10.0, 0.0),
//!     Point2::new(10.0, 10.0),
//!     Point2::new(0.0, 10.0),
//! ];
//! let grounds = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(1.0, 0.0),
//!     Point2::new(1.0, 1.0),
//!     Point2::new(0.0, 1.0),
//! ];
//!
//! let mut camera = Calibrator::new();
//! camera.calibrate(&pixels, &grounds, &RansacParams { iterations: 1, ..Default::default() })?;
//! let p = camera.position(10.0, 0.0)?;
//! assert!((p.x - 1.0).abs() < 1e-6 && p.y.abs() < 1e-6);
//! # Ok::<(), groundplane_core::CalibrationError>(())
//! ```

mod calibrator;
mod error;
mod homography;
mod logger;
mod ransac;

pub use calibrator::Calibrator;
pub use error::CalibrationError;
pub use homography::{
    fit_homography, fit_homography_2d, to_homogeneous, Homography, MIN_CORRESPONDENCES,
    RANK_TOLERANCE,
};
pub use ransac::{RansacEstimate, RansacEstimator, RansacParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
