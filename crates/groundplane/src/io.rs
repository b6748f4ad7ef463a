//! Autocalibration file parsing.
//!
//! One comma-separated record per line:
//!
//! ```text
//! x1, y1, x2, y2, timestamp, latitude, longitude, ellipsoidal height
//! ```
//!
//! `(x1, y1, x2, y2)` is the detection bounding box in raw image pixels
//! (origin top-left, y down). Blank lines and `#` comments are skipped;
//! fields past the eighth are ignored.

use crate::geodetic::{EnuFrame, Geodetic};
use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FIELDS: usize = 8;

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected at least 8 comma-separated fields, got {got}")]
    FieldCount { line: usize, got: usize },

    #[error("line {line}, field {field}: cannot parse {value:?} as a number")]
    Number {
        line: usize,
        field: usize,
        value: String,
    },

    #[error("no calibration records found")]
    Empty,

    #[error("invalid image size {width}x{height}")]
    ImageSize { width: u32, height: u32 },
}

/// Unit of the latitude/longitude columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

/// One parsed line of an autocalibration file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    /// `[x1, y1, x2, y2]` in raw image pixels.
    pub bbox: [f64; 4],
    pub timestamp: f64,
    pub position: Geodetic,
}

/// Image size used to move pixels into a centred, y-up frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageFrame {
    pub width: u32,
    pub height: u32,
}

impl ImageFrame {
    pub fn new(width: u32, height: u32) -> Result<Self, InputError> {
        if width == 0 || height == 0 {
            return Err(InputError::ImageSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// Raw pixel → centred frame: `(x - w/2, h/2 - y)`.
    pub fn to_centered(&self, x: f64, y: f64) -> Point2<f64> {
        Point2::new(
            x - self.width as f64 / 2.0,
            self.height as f64 / 2.0 - y,
        )
    }

    /// Centre of a raw bounding box, in the centred frame.
    pub fn bbox_center(&self, bbox: &[f64; 4]) -> Point2<f64> {
        let a = self.to_centered(bbox[0], bbox[1]);
        let b = self.to_centered(bbox[2], bbox[3]);
        Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }
}

pub fn parse_records(text: &str, unit: AngleUnit) -> Result<Vec<Record>, InputError> {
    let mut records = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if fields.len() < FIELDS {
            return Err(InputError::FieldCount {
                line,
                got: fields.len(),
            });
        }
        let mut v = [0.0_f64; FIELDS];
        for (k, slot) in v.iter_mut().enumerate() {
            *slot = fields[k].parse().map_err(|_| InputError::Number {
                line,
                field: k + 1,
                value: fields[k].to_string(),
            })?;
        }
        let position = match unit {
            AngleUnit::Radians => Geodetic::new(v[5], v[6], v[7]),
            AngleUnit::Degrees => Geodetic::from_degrees(v[5], v[6], v[7]),
        };
        records.push(Record {
            bbox: [v[0], v[1], v[2], v[3]],
            timestamp: v[4],
            position,
        });
    }
    Ok(records)
}

pub fn read_records(path: &Path, unit: AngleUnit) -> Result<Vec<Record>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&text, unit)
}

/// Correspondences derived from an autocalibration file, plus the
/// intermediate coordinates kept for reporting.
#[derive(Clone, Debug)]
pub struct CalibrationData {
    pub records: Vec<Record>,
    /// Bounding-box centres in the centred image frame.
    pub pixels: Vec<Point2<f64>>,
    /// East/north components of `enu`.
    pub grounds: Vec<Point2<f64>>,
    pub enu: Vec<Vector3<f64>>,
    /// ENU origin: the first record's position.
    pub frame: EnuFrame,
}

impl CalibrationData {
    pub fn from_records(records: Vec<Record>, image: ImageFrame) -> Result<Self, InputError> {
        let first = records.first().ok_or(InputError::Empty)?;
        let frame = EnuFrame::new(first.position);

        let pixels = records.iter().map(|r| image.bbox_center(&r.bbox)).collect();
        let enu: Vec<_> = records.iter().map(|r| frame.to_enu(&r.position)).collect();
        let grounds = enu.iter().map(|e| Point2::new(e.x, e.y)).collect();

        Ok(Self {
            records,
            pixels,
            grounds,
            enu,
            frame,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn load_calibration_file(
    path: &Path,
    image: ImageFrame,
    unit: AngleUnit,
) -> Result<CalibrationData, InputError> {
    CalibrationData::from_records(read_records(path, unit)?, image)
}
