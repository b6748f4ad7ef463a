//! Command-line front end (`groundplane` binary).

use crate::config::CalibrateConfig;
use crate::io::AngleUnit;
use crate::report::calibrate_file;
use crate::GroundplaneError;
use clap::Parser;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;

/// Fit the image-to-ground homography from GNSS-tagged detections.
#[derive(Parser, Debug, Clone)]
#[command(name = "groundplane", version, about)]
pub struct Args {
    /// Autocalibration file: x1,y1,x2,y2,timestamp,lat,lon,height per line.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,

    /// Image width in pixels.
    #[arg(long = "image-width", visible_alias = "img-w")]
    pub image_width: Option<u32>,

    /// Image height in pixels.
    #[arg(long = "image-height", visible_alias = "img-h")]
    pub image_height: Option<u32>,

    /// JSON config file; command-line flags take precedence.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// RANSAC iterations.
    #[arg(short = 'n', long = "iterations")]
    pub iterations: Option<usize>,

    /// Inlier threshold [m].
    #[arg(short = 't', long = "threshold")]
    pub threshold: Option<f64>,

    /// Correspondences per RANSAC sample.
    #[arg(short = 's', long = "sample-size")]
    pub sample_size: Option<usize>,

    /// Seed for RANSAC sampling.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Evaluate RANSAC iterations in parallel.
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Latitude and longitude columns are in degrees instead of radians.
    #[arg(long = "degrees")]
    pub degrees: bool,

    /// Print the report as JSON.
    #[arg(long = "json")]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Config file (if any) with command-line overrides applied.
    pub fn resolve_config(&self) -> Result<CalibrateConfig, GroundplaneError> {
        let mut cfg = match &self.config {
            Some(path) => CalibrateConfig::from_json_file(path)?,
            None => CalibrateConfig::default(),
        };
        if self.image_width.is_some() {
            cfg.image_width = self.image_width;
        }
        if self.image_height.is_some() {
            cfg.image_height = self.image_height;
        }
        if let Some(n) = self.iterations {
            cfg.ransac.iterations = n;
        }
        if let Some(t) = self.threshold {
            cfg.ransac.inlier_threshold = t;
        }
        if let Some(s) = self.sample_size {
            cfg.ransac.sample_size = s;
        }
        if let Some(seed) = self.seed {
            cfg.ransac.seed = seed;
        }
        if self.parallel {
            cfg.ransac.parallel = true;
        }
        if self.degrees {
            cfg.angle_unit = AngleUnit::Degrees;
        }
        Ok(cfg)
    }

    /// Log level selected by `-v`: warnings only by default.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Run a calibration and print the report to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<(), GroundplaneError> {
    let cfg = args.resolve_config()?;
    let report = calibrate_file(&args.data, &cfg)?;
    let written = if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)
    } else {
        writeln!(out, "{report}")
    };
    written?;
    Ok(())
}
