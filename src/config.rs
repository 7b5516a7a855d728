use crate::{Error, LineAlgorithm, RangeFilter, Result};
use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Pinhole intrinsics of the scanner camera, in pixels.
///
/// Skew is not used by the triangulation model and is therefore not carried.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    /// Extracts focals and principal point from an intrinsic matrix `K`.
    pub fn from_matrix(k: &Matrix3<f64>) -> Self {
        Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
            cx: k[(0, 2)],
            cy: k[(1, 2)],
        }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.fx, 0.0,     self.cx,
            0.0,     self.fy, self.cy,
            0.0,     0.0,     1.0,
        )
    }
}

impl Default for Intrinsics {
    fn default() -> Self {
        Self {
            fx: 1000.0,
            fy: 1000.0,
            cx: 300.0,
            cy: 400.0,
        }
    }
}

/// Position of the laser plane relative to the camera.
///
/// * `xo` - horizontal offset of the plane from the optical axis.
/// * `ho` - height of the optical center above the turntable.
/// * `zs` - depth of the rotation axis in front of the camera.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LaserExtrinsics {
    pub xo: f64,
    pub ho: f64,
    pub zs: f64,
}

impl LaserExtrinsics {
    /// Takes `(xo, ho, zs)` from the calibrated translation vector.
    pub fn from_translation(t: &Vector3<f64>) -> Self {
        Self {
            xo: t.x,
            ho: t.y,
            zs: t.z,
        }
    }
}

impl Default for LaserExtrinsics {
    fn default() -> Self {
        Self {
            xo: 5.0,
            ho: 0.0,
            zs: 200.0,
        }
    }
}

/// Which side of the camera the line laser is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum LaserSide {
    Left,
    Right,
}

/// The intermediate image returned by [`crate::Scanner::image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ImageType {
    /// Ambient light frame.
    Raw,
    /// Laser illuminated frame.
    Laser,
    /// Absolute difference of the two frames.
    Diff,
    /// Thresholded stripe mask, replicated on three channels.
    Binary,
    /// Raw frame with the localized laser line drawn on top.
    Line,
}

/// Everything needed to turn frame pairs into points.
///
/// Changing `width`, `height`, `intrinsics`, `extrinsics`, `alpha` or
/// `laser_side` invalidates the geometry tables; the [`crate::Scanner`]
/// setters rebuild them for you.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ScanConfig {
    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Side of the box blur applied to the difference image, `None` disables it
    pub blur: Option<u32>,

    /// Side of the square opening element, `None` disables it
    pub open: Option<u32>,

    /// Inclusive lower HSV bound (H in 0..180, S and V in 0..=255)
    pub hsv_min: [u8; 3],

    /// Inclusive upper HSV bound
    pub hsv_max: [u8; 3],

    /// Sub-pixel estimator for the laser line
    pub algorithm: LineAlgorithm,

    /// Bounds applied to every triangulated point
    pub range: RangeFilter,

    /// Added to every height
    pub z_offset: f64,

    /// Turntable rotation per processed frame, in degrees
    pub degrees: f64,

    /// Tilt of the laser plane relative to the optical axis, in degrees
    pub alpha: f64,

    pub intrinsics: Intrinsics,

    pub extrinsics: LaserExtrinsics,

    pub laser_side: LaserSide,

    /// Stage returned by [`crate::Scanner::image`]
    pub image_type: ImageType,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 800,
            blur: Some(4),
            open: Some(4),
            hsv_min: [0, 180, 30],
            hsv_max: [180, 250, 140],
            algorithm: LineAlgorithm::Compact,
            range: RangeFilter::default(),
            z_offset: 0.0,
            degrees: 0.45,
            alpha: 60.0,
            intrinsics: Intrinsics::default(),
            extrinsics: LaserExtrinsics::default(),
            laser_side: LaserSide::Left,
            image_type: ImageType::Raw,
        }
    }
}

impl ScanConfig {
    pub fn resolution(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    pub fn blur(self, blur: Option<u32>) -> Self {
        Self { blur, ..self }
    }

    pub fn open(self, open: Option<u32>) -> Self {
        Self { open, ..self }
    }

    pub fn hsv_range(self, hsv_min: [u8; 3], hsv_max: [u8; 3]) -> Self {
        Self {
            hsv_min,
            hsv_max,
            ..self
        }
    }

    pub fn algorithm(self, algorithm: LineAlgorithm) -> Self {
        Self { algorithm, ..self }
    }

    pub fn range(self, range: RangeFilter) -> Self {
        Self { range, ..self }
    }

    pub fn z_offset(self, z_offset: f64) -> Self {
        Self { z_offset, ..self }
    }

    pub fn degrees(self, degrees: f64) -> Self {
        Self { degrees, ..self }
    }

    pub fn alpha(self, alpha: f64) -> Self {
        Self { alpha, ..self }
    }

    pub fn intrinsics(self, intrinsics: Intrinsics) -> Self {
        Self { intrinsics, ..self }
    }

    pub fn extrinsics(self, extrinsics: LaserExtrinsics) -> Self {
        Self { extrinsics, ..self }
    }

    pub fn laser_side(self, laser_side: LaserSide) -> Self {
        Self { laser_side, ..self }
    }

    pub fn image_type(self, image_type: ImageType) -> Self {
        Self { image_type, ..self }
    }

    /// Frame dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The laser plane angle in radians.
    pub fn alpha_radians(&self) -> f64 {
        self.alpha.to_radians()
    }

    /// Rejects configurations that would make the triangulation divide by
    /// zero or take an undefined angle.
    ///
    /// This does not catch a column whose ray is parallel to the laser plane;
    /// that is only known once the tables are built.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        let zs = self.extrinsics.zs;
        if zs == 0.0 || !zs.is_finite() {
            return Err(Error::InvalidLaserDepth(zs));
        }
        let Intrinsics { fx, fy, cx, cy } = self.intrinsics;
        if fy == 0.0 || ![fx, fy, cx, cy].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidIntrinsics { fx, fy, cx, cy });
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha >= 180.0 {
            return Err(Error::DegenerateAlpha(self.alpha));
        }
        let alpha = self.alpha_radians();
        if alpha.sin() == 0.0 || alpha.tan() == 0.0 {
            return Err(Error::DegenerateAlpha(self.alpha));
        }
        for (name, kernel) in [("blur", self.blur), ("open", self.open)] {
            if let Some(0) = kernel {
                return Err(Error::InvalidKernel { name, size: 0 });
            }
        }
        for (name, value) in [("degrees", self.degrees), ("z_offset", self.z_offset)] {
            if !value.is_finite() {
                return Err(Error::NonFiniteParameter { name, value });
            }
        }
        Ok(())
    }
}
