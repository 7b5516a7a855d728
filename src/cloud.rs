use image::Rgb;
use log::*;
use nalgebra::Point3;

/// A colored point cloud: `points[i]` has color `colors[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point3<f64>>,
    pub colors: Vec<Rgb<u8>>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Owns the cloud of a scanning session and the turntable angle.
///
/// Starts empty with `theta = 0`. The first call to
/// [`PointCloudAccumulator::accumulate`] initializes the cloud, even with an
/// empty frame, and every later call appends. Nothing is ever reordered or
/// dropped until [`PointCloudAccumulator::reset`].
///
/// `theta` is a plain running sum of the steps. It is not wrapped at 360
/// degrees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudAccumulator {
    cloud: Option<PointCloud>,
    theta: f64,
}

impl PointCloudAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one frame worth of points and advances the angle by
    /// `step` degrees, whether or not the frame had any points.
    ///
    /// Returns the total number of points accumulated so far.
    ///
    /// # Panics
    /// If `points` and `colors` differ in length, before anything is
    /// appended.
    pub fn accumulate(
        &mut self,
        points: Vec<Point3<f64>>,
        colors: Vec<Rgb<u8>>,
        step: f64,
    ) -> usize {
        assert_eq!(
            points.len(),
            colors.len(),
            "every point needs exactly one color"
        );
        let cloud = self.cloud.get_or_insert_with(PointCloud::default);
        cloud.points.extend(points);
        cloud.colors.extend(colors);
        let total = cloud.len();
        self.theta += step;
        trace!("Cloud holds {} points, theta={}", total, self.theta);
        total
    }

    /// Current turntable angle in degrees.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Whether at least one frame has been accumulated.
    pub fn is_populated(&self) -> bool {
        self.cloud.is_some()
    }

    pub fn cloud(&self) -> Option<&PointCloud> {
        self.cloud.as_ref()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        self.cloud
            .as_ref()
            .map(|cloud| cloud.points.as_slice())
            .unwrap_or_default()
    }

    pub fn colors(&self) -> &[Rgb<u8>] {
        self.cloud
            .as_ref()
            .map(|cloud| cloud.colors.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.cloud.as_ref().map_or(0, PointCloud::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a new session: no cloud, `theta = 0`.
    pub fn reset(&mut self) {
        info!("Resetting accumulator holding {} points", self.len());
        *self = Self::default();
    }

    /// Hands out the accumulated cloud, leaving the angle untouched.
    pub fn take(&mut self) -> Option<PointCloud> {
        self.cloud.take()
    }
}
