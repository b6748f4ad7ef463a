/// Errors produced by homography fitting, RANSAC estimation and the calibrator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Too few correspondences, or a point configuration that does not pin
    /// down a unique homography (collinear or duplicated points).
    #[error("degenerate correspondences: {reason}")]
    DegenerateInput { reason: String },

    /// Every RANSAC iteration failed to produce a model.
    #[error("no valid homography found after {iterations} iterations")]
    NoValidModel { iterations: usize },

    /// A query was made before any calibration succeeded.
    #[error("calibration has not been performed")]
    NotCalibrated,

    /// Mismatched slice lengths or unusable RANSAC parameters.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The stored homography has no inverse, so ground points cannot be
    /// mapped back to pixels.
    #[error("homography is not invertible")]
    Singular,
}

impl CalibrationError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}
