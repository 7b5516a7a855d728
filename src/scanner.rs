use crate::image::mask_to_rgb;
use crate::{
    localize, preprocess, triangulate, GeometryMap, ImageType, Intrinsics, LaserExtrinsics,
    LaserLine, LaserSide, LineAlgorithm, PointCloudAccumulator, Preprocessed, RangeFilter, Result,
    ScanConfig,
};
use image::{Rgb, RgbImage};
use log::*;
use nalgebra::Point3;

/// Color used to draw the localized line on the [`ImageType::Line`] image.
const LINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Buffers of the most recent call, kept for display only.
#[derive(Debug, Clone)]
struct Frames {
    raw: RgbImage,
    laser: RgbImage,
    diff: RgbImage,
    binary: RgbImage,
    line: RgbImage,
}

/// A scanning session.
///
/// Owns the configuration, the geometry tables derived from it, the
/// accumulated cloud with the turntable angle, and the images of the last
/// processed frame pair. Frames must be fed in acquisition order, one call
/// per turntable step.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    geometry: GeometryMap,
    accumulator: PointCloudAccumulator,
    frames: Option<Frames>,
}

impl Scanner {
    /// Validates the configuration and builds the geometry tables.
    pub fn new(config: ScanConfig) -> Result<Self> {
        let geometry = GeometryMap::build(&config)?;
        info!(
            "Scanner ready for {}x{} frames, {} degrees per step",
            config.width, config.height, config.degrees
        );
        Ok(Self {
            config,
            geometry,
            accumulator: PointCloudAccumulator::new(),
            frames: None,
        })
    }

    /// Processes one frame pair and advances the turntable angle.
    ///
    /// The points are computed at the current angle, filtered, appended to
    /// the session cloud, and returned so callers can show them right away.
    /// A frame in which no laser is found returns empty vectors and still
    /// advances the angle.
    ///
    /// # Errors
    /// [`crate::Error::FrameSize`] if either frame does not have the
    /// configured resolution. The session is left untouched in that case.
    pub fn process(
        &mut self,
        raw: &RgbImage,
        laser: &RgbImage,
    ) -> Result<(Vec<Point3<f64>>, Vec<Rgb<u8>>)> {
        let Preprocessed { diff, mask } = preprocess(raw, laser, &self.config)?;
        let line = localize(&mask, self.config.algorithm);
        let triangulation = triangulate(
            &line,
            &self.geometry,
            raw,
            self.accumulator.theta(),
            self.config.z_offset,
        )?;
        let (points, colors) = self.config.range.apply(triangulation);
        let total = self
            .accumulator
            .accumulate(points.clone(), colors.clone(), self.config.degrees);
        info!(
            "Frame added {} points, cloud holds {}, theta now {}",
            points.len(),
            total,
            self.accumulator.theta()
        );
        self.frames = Some(Frames {
            raw: raw.clone(),
            laser: laser.clone(),
            diff,
            binary: mask_to_rgb(&mask),
            line: draw_line(raw, &line),
        });
        Ok((points, colors))
    }

    /// Replaces the whole configuration.
    ///
    /// The geometry tables are rebuilt if any parameter they depend on
    /// changed. On error nothing is modified.
    pub fn set_config(&mut self, config: ScanConfig) -> Result<()> {
        config.validate()?;
        if affects_geometry(&self.config, &config) {
            self.geometry = GeometryMap::build(&config)?;
            debug!("Geometry tables rebuilt.");
        }
        self.config = config;
        Ok(())
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<()> {
        self.set_config(self.config.resolution(width, height))
    }

    pub fn set_intrinsics(&mut self, intrinsics: Intrinsics) -> Result<()> {
        self.set_config(self.config.intrinsics(intrinsics))
    }

    pub fn set_extrinsics(&mut self, extrinsics: LaserExtrinsics) -> Result<()> {
        self.set_config(self.config.extrinsics(extrinsics))
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        self.set_config(self.config.alpha(alpha))
    }

    pub fn set_laser_side(&mut self, laser_side: LaserSide) -> Result<()> {
        self.set_config(self.config.laser_side(laser_side))
    }

    pub fn set_blur(&mut self, blur: Option<u32>) -> Result<()> {
        self.set_config(self.config.blur(blur))
    }

    pub fn set_open(&mut self, open: Option<u32>) -> Result<()> {
        self.set_config(self.config.open(open))
    }

    pub fn set_hsv_range(&mut self, min: [u8; 3], max: [u8; 3]) {
        self.config.hsv_min = min;
        self.config.hsv_max = max;
    }

    pub fn set_algorithm(&mut self, algorithm: LineAlgorithm) {
        self.config.algorithm = algorithm;
    }

    pub fn set_range_filter(&mut self, range: RangeFilter) {
        self.config.range = range;
    }

    pub fn set_z_offset(&mut self, z_offset: f64) -> Result<()> {
        self.set_config(self.config.z_offset(z_offset))
    }

    pub fn set_degrees(&mut self, degrees: f64) -> Result<()> {
        self.set_config(self.config.degrees(degrees))
    }

    pub fn set_image_type(&mut self, image_type: ImageType) {
        self.config.image_type = image_type;
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GeometryMap {
        &self.geometry
    }

    pub fn cloud(&self) -> &PointCloudAccumulator {
        &self.accumulator
    }

    /// Current turntable angle in degrees.
    pub fn theta(&self) -> f64 {
        self.accumulator.theta()
    }

    /// The image of the last call selected by the configured [`ImageType`].
    pub fn image(&self) -> Option<&RgbImage> {
        self.image_of(self.config.image_type)
    }

    /// One image of the last call, `None` before the first call.
    pub fn image_of(&self, image_type: ImageType) -> Option<&RgbImage> {
        let frames = self.frames.as_ref()?;
        Some(match image_type {
            ImageType::Raw => &frames.raw,
            ImageType::Laser => &frames.laser,
            ImageType::Diff => &frames.diff,
            ImageType::Binary => &frames.binary,
            ImageType::Line => &frames.line,
        })
    }

    /// Drops the cloud, the angle and the last images; keeps the
    /// configuration and geometry.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.frames = None;
    }
}

fn affects_geometry(old: &ScanConfig, new: &ScanConfig) -> bool {
    old.dimensions() != new.dimensions()
        || old.intrinsics != new.intrinsics
        || old.extrinsics != new.extrinsics
        || old.alpha != new.alpha
        || old.laser_side != new.laser_side
}

fn draw_line(raw: &RgbImage, line: &LaserLine) -> RgbImage {
    let mut image = raw.clone();
    for (row, column) in line.pixels() {
        image.put_pixel(column, row, LINE_COLOR);
    }
    image
}
