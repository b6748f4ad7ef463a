use crate::homography::Homography;
use crate::ransac::{RansacEstimator, RansacParams};
use crate::CalibrationError;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Holds the pixel-to-ground homography of one camera.
///
/// Starts uncalibrated. Only a successful [`Calibrator::calibrate`] replaces
/// the stored model; a failed one leaves the previous model in place.
#[derive(Clone, Debug, Default)]
pub struct Calibrator {
    homography: Option<Homography>,
    inverse: Option<Homography>,
    inliers: Vec<usize>,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate and store the homography mapping `pixels` onto `grounds`.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, pixels, grounds, params), fields(n = pixels.len()))
    )]
    pub fn calibrate(
        &mut self,
        pixels: &[Point2<f64>],
        grounds: &[Point2<f64>],
        params: &RansacParams,
    ) -> Result<Homography, CalibrationError> {
        let estimate = RansacEstimator::new(params.clone()).estimate(pixels, grounds)?;
        self.homography = Some(estimate.homography);
        self.inverse = estimate.homography.inverse();
        self.inliers = estimate.inliers;
        Ok(estimate.homography)
    }

    /// [`Calibrator::calibrate`] with 1000 iterations, a threshold of 3.0 and
    /// minimal samples of four.
    pub fn calibrate_default(
        &mut self,
        pixels: &[Point2<f64>],
        grounds: &[Point2<f64>],
    ) -> Result<Homography, CalibrationError> {
        self.calibrate(pixels, grounds, &RansacParams::default())
    }

    /// Ground-plane position of image point `(u, v)`.
    pub fn position(&self, u: f64, v: f64) -> Result<Point2<f64>, CalibrationError> {
        let h = self.homography.as_ref().ok_or(CalibrationError::NotCalibrated)?;
        Ok(h.apply(Point2::new(u, v)))
    }

    /// Image point that maps to ground position `(x, y)`.
    pub fn pixel(&self, x: f64, y: f64) -> Result<Point2<f64>, CalibrationError> {
        if self.homography.is_none() {
            return Err(CalibrationError::NotCalibrated);
        }
        let inv = self.inverse.as_ref().ok_or(CalibrationError::Singular)?;
        Ok(inv.apply(Point2::new(x, y)))
    }

    /// Transfer error of every correspondence under the stored model.
    pub fn reprojection_errors(
        &self,
        pixels: &[Point2<f64>],
        grounds: &[Point2<f64>],
    ) -> Result<Vec<f64>, CalibrationError> {
        let h = self.homography.as_ref().ok_or(CalibrationError::NotCalibrated)?;
        if pixels.len() != grounds.len() {
            return Err(CalibrationError::invalid(format!(
                "{} pixels but {} ground points",
                pixels.len(),
                grounds.len()
            )));
        }
        Ok(pixels
            .iter()
            .zip(grounds.iter())
            .map(|(p, g)| h.transfer_error(*p, *g))
            .collect())
    }

    pub fn homography(&self) -> Option<&Homography> {
        self.homography.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.homography.is_some()
    }

    /// Inlier indices of the last successful calibration.
    pub fn last_inliers(&self) -> &[usize] {
        &self.inliers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_square() -> ([Point2<f64>; 4], [Point2<f64>; 4]) {
        (
            [
                Point2::new(0.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 10.0),
                Point2::new(0.0, 10.0),
            ],
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
        )
    }

    fn one_shot() -> RansacParams {
        RansacParams {
            iterations: 1,
            inlier_threshold: 3.0,
            sample_size: 4,
            ..RansacParams::default()
        }
    }

    #[test]
    fn fresh_calibrator_refuses_queries() {
        let cal = Calibrator::new();
        assert!(!cal.is_calibrated());
        assert_eq!(cal.position(1.0, 2.0), Err(CalibrationError::NotCalibrated));
        assert_eq!(cal.pixel(1.0, 2.0), Err(CalibrationError::NotCalibrated));
        assert!(cal.reprojection_errors(&[], &[]).is_err());
    }

    #[test]
    fn unit_square_scale_is_recovered() {
        let (pixels, grounds) = unit_square();
        let mut cal = Calibrator::new();
        cal.calibrate(&pixels, &grounds, &one_shot()).expect("calibrate");

        let p = cal.position(10.0, 0.0).expect("position");
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-6);

        let q = cal.pixel(0.5, 0.5).expect("pixel");
        assert_abs_diff_eq!(q.x, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(q.y, 5.0, epsilon = 1e-6);

        assert_eq!(cal.last_inliers(), &[0, 1, 2, 3]);
        let errs = cal.reprojection_errors(&pixels, &grounds).expect("errors");
        assert!(errs.iter().all(|&e| e < 1e-9));
    }

    #[test]
    fn position_is_idempotent() {
        let (pixels, grounds) = unit_square();
        let mut cal = Calibrator::new();
        cal.calibrate_default(&pixels, &grounds).expect("calibrate");
        let a = cal.position(3.0, 7.5).expect("first");
        let b = cal.position(3.0, 7.5).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn failed_recalibration_keeps_previous_model() {
        let (pixels, grounds) = unit_square();
        let mut cal = Calibrator::new();
        let h = cal.calibrate(&pixels, &grounds, &one_shot()).expect("calibrate");

        let collinear: Vec<_> = (0..5).map(|i| Point2::new(i as f64, i as f64)).collect();
        let err = cal.calibrate(&collinear, &collinear, &one_shot()).unwrap_err();
        assert!(matches!(err, CalibrationError::NoValidModel { .. }));
        assert_eq!(cal.homography(), Some(&h));
    }

    #[test]
    fn recalibration_overwrites_model() {
        let (pixels, grounds) = unit_square();
        let mut cal = Calibrator::new();
        cal.calibrate(&pixels, &grounds, &one_shot()).expect("first");

        let doubled: Vec<_> = grounds.iter().map(|g| Point2::new(2.0 * g.x, 2.0 * g.y)).collect();
        cal.calibrate(&pixels, &doubled, &one_shot()).expect("second");
        let p = cal.position(10.0, 10.0).expect("position");
        assert_abs_diff_eq!(p.x, 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn singular_model_cannot_map_back_to_pixels() {
        let h = Homography::new(nalgebra::Matrix3::new(
            1.0, 2.0, 3.0, //
            2.0, 4.0, 6.0, //
            0.0, 0.0, 1.0,
        ));
        let cal = Calibrator {
            homography: Some(h),
            inverse: h.inverse(),
            inliers: Vec::new(),
        };
        assert!(cal.inverse.is_none());
        assert!(cal.position(1.0, 1.0).is_ok());
        assert_eq!(cal.pixel(1.0, 1.0), Err(CalibrationError::Singular));
    }
}
