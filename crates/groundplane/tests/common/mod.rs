//! Synthetic autocalibration files generated from a known ground-to-pixel
//! homography.

#![allow(dead_code)]

use groundplane::{EnuFrame, Geodetic, Homography};
use nalgebra::{Matrix3, Point2};
use std::fmt::Write as _;
use std::io::Write as _;
use tempfile::NamedTempFile;

pub const WIDTH: u32 = 2000;
pub const HEIGHT: u32 = 2000;
pub const INLIERS: usize = 25;

pub fn origin() -> Geodetic {
    Geodetic::new(1.05, 0.435, 20.0)
}

/// Maps ENU east/north [m] to centred, y-up pixels.
pub fn ground_to_pixel() -> Homography {
    Homography::new(Matrix3::new(
        8.0, 1.0, 5.0, //
        0.5, -6.0, 40.0, //
        0.0005, 0.002, 1.0,
    ))
}

pub struct Scene {
    pub csv: String,
    /// Centred pixel and ENU ground point of every record, in file order.
    pub pixels: Vec<Point2<f64>>,
    pub grounds: Vec<Point2<f64>>,
}

/// A 5x5 grid of exact detections around the origin (origin first), followed
/// by `outliers` detections whose boxes are shifted 300 px to the right.
pub fn scene(outliers: usize) -> Scene {
    let origin = origin();
    let frame = EnuFrame::new(origin);
    let g2p = ground_to_pixel();

    let mut positions = vec![origin];
    for i in 0..5 {
        for j in 0..5 {
            if i == 2 && j == 2 {
                continue;
            }
            positions.push(Geodetic::new(
                origin.lat + (i as f64 - 2.0) * 4e-6,
                origin.lon + (j as f64 - 2.0) * 8e-6,
                origin.height + 0.1 * i as f64,
            ));
        }
    }
    for k in 0..outliers {
        let kf = k as f64;
        positions.push(Geodetic::new(
            origin.lat + (kf - 1.5) * 3e-6,
            origin.lon + (2.0 - kf) * 5e-6,
            origin.height,
        ));
    }

    let mut csv = String::from("# x1,y1,x2,y2,timestamp,lat,lon,height\n");
    let mut pixels = Vec::new();
    let mut grounds = Vec::new();
    for (idx, g) in positions.iter().enumerate() {
        let enu = frame.to_enu(g);
        let ground = Point2::new(enu.x, enu.y);
        let mut pixel = g2p.apply(ground);
        if idx >= INLIERS {
            pixel.x += 300.0;
        }
        let x = pixel.x + WIDTH as f64 / 2.0;
        let y = HEIGHT as f64 / 2.0 - pixel.y;
        writeln!(
            csv,
            "{},{},{},{},{},{},{},{}",
            x - 6.0,
            y - 10.0,
            x + 6.0,
            y + 10.0,
            idx as f64 * 0.2,
            g.lat,
            g.lon,
            g.height
        )
        .expect("format");
        pixels.push(pixel);
        grounds.push(ground);
    }

    Scene {
        csv,
        pixels,
        grounds,
    }
}

pub fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write");
    file.flush().expect("flush");
    file
}
