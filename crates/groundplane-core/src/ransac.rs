//! RANSAC estimation of the pixel-to-ground homography.
//!
//! Every iteration draws a minimal sample without replacement, fits a
//! candidate with the DLT, collects the correspondences whose transfer error
//! is below the threshold and refits on that inlier set. The refit keeps the
//! inlier count of the candidate that produced it; the best model is the one
//! with the most inliers, ties going to the earliest iteration.
//!
//! Sampling is driven by a `StdRng` seeded once per [`RansacEstimator::estimate`]
//! call, so runs are reproducible and independent of any global state.

use crate::homography::{fit_homography, to_homogeneous, Homography, MIN_CORRESPONDENCES};
use crate::CalibrationError;
use log::{debug, trace};
use nalgebra::{Point2, Point3};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Configuration of the RANSAC loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Number of iterations; the loop always runs all of them.
    pub iterations: usize,
    /// A correspondence is an inlier when its ground-plane transfer error is
    /// strictly below this distance (ground units, typically metres).
    pub inlier_threshold: f64,
    /// Correspondences per minimal sample. At least 4.
    pub sample_size: usize,
    /// Seed for the sampling generator.
    pub seed: u64,
    /// Evaluate iterations on the rayon pool (requires the `rayon` feature,
    /// ignored otherwise). Produces the same result as the sequential loop.
    pub parallel: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 1000,
            inlier_threshold: 3.0,
            sample_size: MIN_CORRESPONDENCES,
            seed: 42,
            parallel: false,
        }
    }
}

impl RansacParams {
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if self.iterations == 0 {
            return Err(CalibrationError::invalid("iterations must be positive"));
        }
        if !(self.inlier_threshold.is_finite() && self.inlier_threshold > 0.0) {
            return Err(CalibrationError::invalid(format!(
                "inlier threshold must be a positive finite number, got {}",
                self.inlier_threshold
            )));
        }
        if self.sample_size < MIN_CORRESPONDENCES {
            return Err(CalibrationError::invalid(format!(
                "sample size must be at least {MIN_CORRESPONDENCES}, got {}",
                self.sample_size
            )));
        }
        Ok(())
    }
}

/// Best model found by [`RansacEstimator::estimate`].
#[derive(Clone, Debug, PartialEq)]
pub struct RansacEstimate {
    /// Homography refit on the inlier set of the winning candidate.
    pub homography: Homography,
    /// Indices of the winning candidate's inliers (ascending).
    pub inliers: Vec<usize>,
    /// Zero-based iteration that produced the winner.
    pub iteration: usize,
}

#[derive(Clone, Debug)]
pub struct RansacEstimator {
    params: RansacParams,
}

impl Default for RansacEstimator {
    fn default() -> Self {
        Self::new(RansacParams::default())
    }
}

struct Candidate {
    iteration: usize,
    homography: Homography,
    inliers: Vec<usize>,
}

/// Running best plus the number of iterations that produced no model.
#[derive(Default)]
struct Search {
    best: Option<Candidate>,
    failed: usize,
}

impl Search {
    fn offer(mut self, candidate: Option<Candidate>) -> Self {
        let Some(c) = candidate else {
            self.failed += 1;
            return self;
        };
        self.best = match self.best {
            Some(b) if !outranks(&c, &b) => Some(b),
            _ => {
                trace!(
                    "iteration {}: new best with {} inliers",
                    c.iteration,
                    c.inliers.len()
                );
                Some(c)
            }
        };
        self
    }

    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    fn merge(self, other: Search) -> Self {
        let failed = self.failed + other.failed;
        let best = match (self.best, other.best) {
            (Some(a), Some(b)) => Some(if outranks(&b, &a) { b } else { a }),
            (a, b) => a.or(b),
        };
        Search { best, failed }
    }
}

/// More inliers wins; on a tie the earlier iteration wins.
fn outranks(a: &Candidate, b: &Candidate) -> bool {
    a.inliers.len() > b.inliers.len()
        || (a.inliers.len() == b.inliers.len() && a.iteration < b.iteration)
}

impl RansacEstimator {
    pub fn new(params: RansacParams) -> Self {
        Self { params }
    }

    /// Estimate the pixel-to-ground homography from index-aligned
    /// correspondences.
    ///
    /// Degenerate samples and degenerate inlier sets are skipped. Fails with
    /// [`CalibrationError::NoValidModel`] when no iteration yields a model and
    /// with [`CalibrationError::InvalidInput`] on inconsistent input.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, pixels, grounds),
            fields(n = pixels.len(), iterations = self.params.iterations)
        )
    )]
    pub fn estimate(
        &self,
        pixels: &[Point2<f64>],
        grounds: &[Point2<f64>],
    ) -> Result<RansacEstimate, CalibrationError> {
        self.params.validate()?;
        let n = pixels.len();
        if grounds.len() != n {
            return Err(CalibrationError::invalid(format!(
                "{} pixels but {} ground points",
                n,
                grounds.len()
            )));
        }
        if n < self.params.sample_size {
            return Err(CalibrationError::invalid(format!(
                "{} correspondences, sample size is {}",
                n, self.params.sample_size
            )));
        }

        let pixels_h = to_homogeneous(pixels);
        let search = if self.params.parallel {
            self.search_parallel(&pixels_h, grounds)
        } else {
            self.search_sequential(&pixels_h, grounds)
        };

        let Some(best) = search.best else {
            return Err(CalibrationError::NoValidModel {
                iterations: self.params.iterations,
            });
        };
        debug!(
            "ransac: {}/{} inliers from iteration {} ({} of {} iterations without a model)",
            best.inliers.len(),
            n,
            best.iteration,
            search.failed,
            self.params.iterations
        );
        Ok(RansacEstimate {
            homography: best.homography,
            inliers: best.inliers,
            iteration: best.iteration,
        })
    }

    fn search_sequential(&self, pixels_h: &[Point3<f64>], grounds: &[Point2<f64>]) -> Search {
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let n = pixels_h.len();
        (0..self.params.iterations).fold(Search::default(), |search, it| {
            let sample = index::sample(&mut rng, n, self.params.sample_size).into_vec();
            search.offer(self.evaluate(it, &sample, pixels_h, grounds))
        })
    }

    #[cfg(feature = "rayon")]
    fn search_parallel(&self, pixels_h: &[Point3<f64>], grounds: &[Point2<f64>]) -> Search {
        use rayon::prelude::*;

        // Draw every sample up front so the sequence matches the sequential loop.
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let n = pixels_h.len();
        let samples: Vec<Vec<usize>> = (0..self.params.iterations)
            .map(|_| index::sample(&mut rng, n, self.params.sample_size).into_vec())
            .collect();

        samples
            .par_iter()
            .enumerate()
            .map(|(it, sample)| self.evaluate(it, sample, pixels_h, grounds))
            .fold(Search::default, Search::offer)
            .reduce(Search::default, Search::merge)
    }

    #[cfg(not(feature = "rayon"))]
    fn search_parallel(&self, pixels_h: &[Point3<f64>], grounds: &[Point2<f64>]) -> Search {
        self.search_sequential(pixels_h, grounds)
    }

    fn evaluate(
        &self,
        iteration: usize,
        sample: &[usize],
        pixels_h: &[Point3<f64>],
        grounds: &[Point2<f64>],
    ) -> Option<Candidate> {
        let sample_ground: Vec<_> = sample.iter().map(|&i| grounds[i]).collect();
        let sample_pixels: Vec<_> = sample.iter().map(|&i| pixels_h[i]).collect();
        let model = fit_homography(&sample_ground, &sample_pixels).ok()?;

        let inliers = collect_inliers(
            &model,
            pixels_h,
            grounds,
            self.params.inlier_threshold,
        );

        let inlier_ground: Vec<_> = inliers.iter().map(|&i| grounds[i]).collect();
        let inlier_pixels: Vec<_> = inliers.iter().map(|&i| pixels_h[i]).collect();
        let homography = fit_homography(&inlier_ground, &inlier_pixels).ok()?;

        Some(Candidate {
            iteration,
            homography,
            inliers,
        })
    }
}

/// Indices whose transfer error is strictly below `threshold`. Points mapped
/// to infinity are never inliers.
fn collect_inliers(
    h: &Homography,
    pixels_h: &[Point3<f64>],
    grounds: &[Point2<f64>],
    threshold: f64,
) -> Vec<usize> {
    pixels_h
        .iter()
        .zip(grounds.iter())
        .enumerate()
        .filter_map(|(i, (p, g))| {
            let err = (h.apply_homogeneous(p) - g).norm();
            (err < threshold).then_some(i)
        })
        .collect()
}
