//! Reconstruction core of a turntable laser triangulation scanner.
//!
//! For every turntable step the camera takes one frame with ambient light
//! only and one frame with the line laser switched on. The laser stripe is
//! isolated by differencing and thresholding the two frames, its center is
//! located with sub-pixel precision in every image row, and each located
//! pixel is converted to a 3d point through lookup tables derived once from
//! the camera intrinsics and the laser plane pose. Points outside a
//! configurable range are dropped and the rest are appended to the session
//! cloud, rotated by the current turntable angle.
//!
//! [`Scanner`] runs the whole pipeline; the stages are also exposed on their
//! own:
//!
//! * [`GeometryMap::build`] - pixel to polar lookup tables
//! * [`preprocess`] - frame pair to stripe mask
//! * [`localize`] - stripe mask to sub-pixel line
//! * [`triangulate`] - line to points
//! * [`RangeFilter::apply`] - spatial filtering
//! * [`PointCloudAccumulator`] - session cloud and angle
//!
//! # Example
//! ```
//! use cv_laserscan::{ScanConfig, Scanner};
//! use image::RgbImage;
//!
//! let mut scanner = Scanner::new(ScanConfig::default().resolution(64, 48)).unwrap();
//! let frame = RgbImage::new(64, 48);
//! // No laser visible: nothing is added, but the turntable still moved.
//! let (points, _colors) = scanner.process(&frame, &frame).unwrap();
//! assert!(points.is_empty());
//! assert_eq!(scanner.theta(), 0.45);
//! ```

mod cloud;
mod config;
mod error;
mod filter;
mod geometry;
pub mod image;
mod line;
mod preprocess;
mod scanner;
mod triangulation;

pub use crate::cloud::{PointCloud, PointCloudAccumulator};
pub use crate::config::{ImageType, Intrinsics, LaserExtrinsics, LaserSide, ScanConfig};
pub use crate::error::{Error, Result};
pub use crate::filter::RangeFilter;
pub use crate::geometry::GeometryMap;
pub use crate::line::{localize, table_index, LaserLine, LineAlgorithm};
pub use crate::preprocess::{check_frames, preprocess, Preprocessed};
pub use crate::scanner::Scanner;
pub use crate::triangulation::{triangulate, Triangulation};
