use crate::config::CalibrateConfig;
use crate::geodetic::Geodetic;
use crate::io::{load_calibration_file, CalibrationData};
use crate::GroundplaneError;
use groundplane_core::{Calibrator, Homography, RansacParams};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Summary of one calibration run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalibrationReport {
    /// ENU origin (first record).
    pub origin: Geodetic,
    pub origin_ecef: [f64; 3],
    pub homography: Homography,
    pub correspondences: usize,
    pub inliers: usize,
    /// RMS transfer error over the inliers [m].
    pub inlier_rms: f64,
    /// Calibration point drawn with the RANSAC seed to spot-check the model.
    pub check_index: usize,
    /// Ground distance between the spot-check prediction and its ENU position [m].
    pub check_error: f64,
}

/// Calibrate on already loaded correspondences.
pub fn calibrate_data(
    data: &CalibrationData,
    params: &RansacParams,
) -> Result<(Calibrator, CalibrationReport), GroundplaneError> {
    let mut camera = Calibrator::new();
    let homography = camera.calibrate(&data.pixels, &data.grounds, params)?;

    let errors = camera.reprojection_errors(&data.pixels, &data.grounds)?;
    let inliers = camera.last_inliers();
    let inlier_rms = if inliers.is_empty() {
        f64::INFINITY
    } else {
        let ss: f64 = inliers.iter().map(|&i| errors[i] * errors[i]).sum();
        (ss / inliers.len() as f64).sqrt()
    };

    let mut rng = StdRng::seed_from_u64(params.seed);
    let check_index = rng.random_range(0..data.len());
    let pixel = data.pixels[check_index];
    let estimate = camera.position(pixel.x, pixel.y)?;
    let check_error = (estimate - data.grounds[check_index]).norm();

    let o = data.frame.origin_ecef;
    let report = CalibrationReport {
        origin: data.frame.origin,
        origin_ecef: [o.x, o.y, o.z],
        homography,
        correspondences: data.len(),
        inliers: inliers.len(),
        inlier_rms,
        check_index,
        check_error,
    };
    info!(
        "calibrated on {}/{} inliers, rms {:.4} m",
        report.inliers, report.correspondences, report.inlier_rms
    );
    Ok((camera, report))
}

/// Load an autocalibration file and calibrate with `config`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(config), fields(path = %path.display()))
)]
pub fn calibrate_file(
    path: &Path,
    config: &CalibrateConfig,
) -> Result<CalibrationReport, GroundplaneError> {
    let frame = config.image_frame()?;
    let data = load_calibration_file(path, frame, config.angle_unit)?;
    info!("loaded {} records from {}", data.len(), path.display());
    let (_, report) = calibrate_data(&data, &config.ransac)?;
    Ok(report)
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.origin_ecef;
        writeln!(f, "Origin set at:")?;
        writeln!(
            f,
            "- Geodetic: lat {:.9} rad, lon {:.9} rad, h {:.3} m",
            self.origin.lat, self.origin.lon, self.origin.height
        )?;
        writeln!(f, "- ECEF: [{x:.3}, {y:.3}, {z:.3}]")?;
        writeln!(f, "---")?;
        writeln!(f, "Fitted homography (image plane to ground plane):")?;
        for row in self.homography.to_array() {
            writeln!(f, "[{:>14.6e} {:>14.6e} {:>14.6e}]", row[0], row[1], row[2])?;
        }
        writeln!(f, "---")?;
        writeln!(
            f,
            "Inliers: {}/{} (rms {:.4} m)",
            self.inliers, self.correspondences, self.inlier_rms
        )?;
        write!(
            f,
            "Measurement error [m] on calibration point {}: {:.6}",
            self.check_index, self.check_error
        )
    }
}
