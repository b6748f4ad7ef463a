use crate::CalibrationError;
use nalgebra::{DMatrix, Matrix3, Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Minimal number of correspondences that determine a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Relative size of the second-smallest singular value of the design matrix
/// below which the null space is treated as more than one-dimensional.
pub const RANK_TOLERANCE: f64 = 1e-12;

/// Planar projective transform mapping homogeneous pixels to the ground plane:
/// `[x'; y'; w'] = H * [u; v; 1]`.
///
/// `H` is only defined up to scale; every operation here is scale invariant.
/// Serializes as a row-major `[[f64; 3]; 3]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 3]; 3]", into = "[[f64; 3]; 3]")]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map a pixel to the ground plane (perspective divide included).
    ///
    /// Points on the horizon line (`w' == 0`) map to non-finite coordinates.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        self.apply_homogeneous(&Point3::new(p.x, p.y, 1.0))
    }

    #[inline]
    pub fn apply_homogeneous(&self, p: &Point3<f64>) -> Point2<f64> {
        let v = self.h * Vector3::new(p.x, p.y, p.z);
        let w = v[2];
        Point2::new(v[0] / w, v[1] / w)
    }

    /// Euclidean distance between `H * pixel` and the observed ground point.
    #[inline]
    pub fn transfer_error(&self, pixel: Point2<f64>, ground: Point2<f64>) -> f64 {
        (self.apply(pixel) - ground).norm()
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    pub fn scaled(&self, s: f64) -> Self {
        Self::new(self.h * s)
    }

    /// Representative of the scale class: `H[2,2] == 1` when that entry is
    /// usable, otherwise unit Frobenius norm with a positive largest entry.
    pub fn normalized(&self) -> Self {
        let s = self.h[(2, 2)];
        if s.abs() > 1e-12 {
            return Self::new(self.h / s);
        }
        let norm = self.h.norm();
        if norm <= f64::EPSILON {
            return *self;
        }
        let pivot = self
            .h
            .iter()
            .copied()
            .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
        Self::new(self.h / (norm * pivot.signum()))
    }
}

impl From<[[f64; 3]; 3]> for Homography {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        Self::from_array(rows)
    }
}

impl From<Homography> for [[f64; 3]; 3] {
    fn from(h: Homography) -> Self {
        h.to_array()
    }
}

/// Lift pixels to homogeneous coordinates by appending `1.0`.
pub fn to_homogeneous(pixels: &[Point2<f64>]) -> Vec<Point3<f64>> {
    pixels.iter().map(|p| Point3::new(p.x, p.y, 1.0)).collect()
}

/// Fit `H` such that `ground ~ H * pixel` by the unnormalized DLT.
///
/// Each correspondence contributes the rows
/// `[0 0 0  -p  y'p]` and `[p  0 0 0  -x'p]` of the `2n x 9` design matrix `A`,
/// with `p` the homogeneous pixel. The solution is the unit right singular
/// vector of `A` for the smallest singular value, reshaped row-major.
///
/// Returns [`CalibrationError::DegenerateInput`] for fewer than four
/// correspondences, non-finite coordinates, or a null space of dimension
/// larger than one (collinear or repeated points).
pub fn fit_homography(
    ground: &[Point2<f64>],
    pixels: &[Point3<f64>],
) -> Result<Homography, CalibrationError> {
    let n = pixels.len();
    if ground.len() != n {
        return Err(CalibrationError::degenerate(format!(
            "mismatched correspondence lengths ({} ground, {} pixel)",
            ground.len(),
            n
        )));
    }
    if n < MIN_CORRESPONDENCES {
        return Err(CalibrationError::degenerate(format!(
            "need at least {MIN_CORRESPONDENCES} correspondences, got {n}"
        )));
    }
    let finite = ground.iter().all(|g| g.x.is_finite() && g.y.is_finite())
        && pixels.iter().all(|p| p.coords.iter().all(|c| c.is_finite()));
    if !finite {
        return Err(CalibrationError::degenerate("non-finite coordinate"));
    }

    // Pad to at least 9 rows so the SVD exposes the full right basis.
    let rows = (2 * n).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);

    for (k, (g, p)) in ground.iter().zip(pixels.iter()).enumerate() {
        let r0 = 2 * k;
        let r1 = 2 * k + 1;
        for c in 0..3 {
            let pc = p[c];
            // [ 0 0 0  -p  y'p ]
            a[(r0, 3 + c)] = -pc;
            a[(r0, 6 + c)] = g.y * pc;
            // [ p  0 0 0  -x'p ]
            a[(r1, c)] = pc;
            a[(r1, 6 + c)] = -g.x * pc;
        }
    }

    let svd = a.svd(false, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| CalibrationError::degenerate("SVD did not converge"))?;

    let mut order: Vec<(usize, f64)> = svd.singular_values.iter().copied().enumerate().collect();
    order.sort_by(|a, b| a.1.total_cmp(&b.1));

    let (null_idx, _) = order[0];
    let second = order[1].1;
    let largest = order[order.len() - 1].1;
    if largest <= 0.0 || second <= RANK_TOLERANCE * largest {
        return Err(CalibrationError::degenerate(
            "correspondences do not determine a unique homography",
        ));
    }

    let h = v_t.row(null_idx);
    let hm = Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);
    Ok(Homography::new(hm))
}

/// Same as [`fit_homography`] but takes pixels as plain 2D points.
pub fn fit_homography_2d(
    pixels: &[Point2<f64>],
    ground: &[Point2<f64>],
) -> Result<Homography, CalibrationError> {
    fit_homography(ground, &to_homogeneous(pixels))
}
