use crate::{Error, Intrinsics, LaserExtrinsics, LaserSide, Result, ScanConfig};
use log::*;
use ndarray::{s, Array2, ArrayView2};

/// Per-pixel lookup tables from image coordinates to the polar frame of the
/// turntable.
///
/// Both tables have shape `(height, width)` and are indexed `[row, column]`
/// like the frames they are looked up with. The radial distance only depends
/// on the column, the height depends on both.
///
/// The tables are an owned value. Whenever the resolution or any calibration
/// parameter changes, a new map has to be built with [`GeometryMap::build`];
/// there is no incremental update.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryMap {
    rho: Array2<f64>,
    height: Array2<f64>,
}

impl GeometryMap {
    /// Derives the lookup tables from a tilted laser plane seen by a fixed
    /// pinhole camera.
    ///
    /// With `a` the plane angle, `xp = fx * xo / zs` (negated for a right
    /// laser), `u = column - cx - xp` and `v = cy - row`:
    ///
    /// * `rho = (zs / sin a) * u / (u + fx / tan a)`
    /// * `height = ho + (zs - rho * sin a) * v / fy`
    ///
    /// For a right laser both tables are mirrored left to right afterwards.
    ///
    /// # Errors
    /// Any error from [`ScanConfig::validate`], and [`Error::ParallelRay`] if
    /// the camera ray of some column never meets the laser plane.
    pub fn build(config: &ScanConfig) -> Result<Self> {
        config.validate()?;
        let (columns, rows) = (config.width as usize, config.height as usize);
        let Intrinsics { fx, fy, cx, cy } = config.intrinsics;
        let LaserExtrinsics { xo, ho, zs } = config.extrinsics;
        let right = config.laser_side == LaserSide::Right;

        let xp = if right { -fx * xo / zs } else { fx * xo / zs };
        let alpha = config.alpha_radians();
        let sin_alpha = alpha.sin();
        let a = zs / sin_alpha;
        let b = fx / alpha.tan();
        debug!(
            "Building {}x{} geometry: xp={}, A={}, B={}, laser side {:?}",
            columns, rows, xp, a, b, config.laser_side
        );

        let column_rho = (0..columns)
            .map(|c| {
                let u = c as f64 - cx - xp;
                let denominator = u + b;
                let rho = a * u / denominator;
                if denominator == 0.0 || !rho.is_finite() {
                    let column = if right { columns - 1 - c } else { c };
                    Err(Error::ParallelRay {
                        column: column as u32,
                    })
                } else {
                    Ok(rho)
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        let rho = Array2::from_shape_fn((rows, columns), |(_, c)| column_rho[c]);
        let height = Array2::from_shape_fn((rows, columns), |(r, c)| {
            ho + (zs - rho[[r, c]] * sin_alpha) * (cy - r as f64) / fy
        });

        let map = if right {
            Self {
                rho: rho.slice(s![.., ..;-1]).to_owned(),
                height: height.slice(s![.., ..;-1]).to_owned(),
            }
        } else {
            Self { rho, height }
        };
        trace!("Geometry tables built.");
        Ok(map)
    }

    /// Radial distance from the rotation axis, per pixel.
    pub fn rho(&self) -> ArrayView2<f64> {
        self.rho.view()
    }

    /// Height above the turntable, per pixel.
    pub fn height(&self) -> ArrayView2<f64> {
        self.height.view()
    }

    pub fn rho_at(&self, row: usize, column: usize) -> f64 {
        self.rho[[row, column]]
    }

    pub fn height_at(&self, row: usize, column: usize) -> f64 {
        self.height[[row, column]]
    }

    /// Table width in pixels (number of columns).
    pub fn width(&self) -> usize {
        self.rho.ncols()
    }

    /// Table height in pixels (number of rows).
    pub fn rows(&self) -> usize {
        self.rho.nrows()
    }
}
