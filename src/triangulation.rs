use crate::{Error, GeometryMap, LaserLine, Result};
use image::{Rgb, RgbImage};
use log::*;
use nalgebra::Point3;

/// Points triangulated from one laser line, before range filtering.
///
/// All four vectors are parallel and in row order. `rho` and `height` keep
/// the polar coordinates the range filter is expressed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    pub points: Vec<Point3<f64>>,
    pub colors: Vec<Rgb<u8>>,
    pub rho: Vec<f64>,
    pub height: Vec<f64>,
}

impl Triangulation {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Turns every pixel of the laser line into a colored 3d point.
///
/// The radial distance and height come from the geometry tables, `z_offset`
/// is added to the height, and `(rho, theta)` is converted to `(x, y)` with
/// `theta` in degrees. Colors are sampled from `raw` at the same pixel.
///
/// # Errors
/// [`Error::ImageSize`] if `raw` does not match the tables, and
/// [`Error::LineOutOfBounds`] if a line pixel falls outside them. Nothing is
/// triangulated in either case.
pub fn triangulate(
    line: &LaserLine,
    geometry: &GeometryMap,
    raw: &RgbImage,
    theta: f64,
    z_offset: f64,
) -> Result<Triangulation> {
    let expected = (geometry.width() as u32, geometry.rows() as u32);
    if raw.dimensions() != expected {
        return Err(Error::ImageSize {
            expected,
            actual: raw.dimensions(),
        });
    }
    if let Some((row, column)) = line
        .pixels()
        .find(|&(row, column)| column >= expected.0 || row >= expected.1)
    {
        return Err(Error::LineOutOfBounds { row, column });
    }

    let (sin_theta, cos_theta) = theta.to_radians().sin_cos();
    let mut triangulation = Triangulation {
        points: Vec::with_capacity(line.len()),
        colors: Vec::with_capacity(line.len()),
        rho: Vec::with_capacity(line.len()),
        height: Vec::with_capacity(line.len()),
    };
    for (row, column) in line.pixels() {
        let rho = geometry.rho_at(row as usize, column as usize);
        let z = geometry.height_at(row as usize, column as usize) + z_offset;
        triangulation
            .points
            .push(Point3::new(rho * cos_theta, rho * sin_theta, z));
        triangulation.colors.push(*raw.get_pixel(column, row));
        triangulation.rho.push(rho);
        triangulation.height.push(z);
    }
    trace!(
        "Triangulated {} points at theta={}",
        triangulation.len(),
        theta
    );
    Ok(triangulation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Intrinsics, ScanConfig};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn setup() -> (GeometryMap, RgbImage) {
        let config = ScanConfig::default().resolution(40, 30).intrinsics(Intrinsics {
            fx: 80.0,
            fy: 80.0,
            cx: 20.0,
            cy: 15.0,
        });
        let geometry = GeometryMap::build(&config).unwrap();
        let raw = RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 7]));
        (geometry, raw)
    }

    #[test]
    fn points_follow_tables() {
        let (geometry, raw) = setup();
        let line = LaserLine(BTreeMap::from([(3, 12.7), (20, 31.0)]));
        let result = triangulate(&line, &geometry, &raw, 90.0, 2.5).unwrap();
        assert_eq!(result.len(), 2);

        let rho = geometry.rho_at(3, 12);
        assert_eq!(result.rho[0], rho);
        assert_eq!(result.height[0], geometry.height_at(3, 12) + 2.5);
        assert_relative_eq!(result.points[0].x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(result.points[0].y, rho, epsilon = 1e-9);
        assert_eq!(result.points[0].z, result.height[0]);
        assert_eq!(result.colors[0], Rgb([12, 3, 7]));
        assert_eq!(result.colors[1], Rgb([31, 20, 7]));
    }

    #[test]
    fn radius_is_preserved_by_rotation() {
        let (geometry, raw) = setup();
        let line = LaserLine(BTreeMap::from([(10, 5.0)]));
        for theta in [0.0, 0.45, 33.0, 270.0, 725.5] {
            let result = triangulate(&line, &geometry, &raw, theta, 0.0).unwrap();
            let p = result.points[0];
            assert_relative_eq!(
                p.x.hypot(p.y),
                geometry.rho_at(10, 5).abs(),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn empty_line_gives_empty_triangulation() {
        let (geometry, raw) = setup();
        let result = triangulate(&LaserLine::default(), &geometry, &raw, 0.0, 0.0).unwrap();
        assert!(result.is_empty());
        assert_eq!(result, Triangulation::default());
    }

    #[test]
    fn rejects_inputs_outside_tables() {
        let (geometry, raw) = setup();
        let small = RgbImage::new(20, 30);
        assert_eq!(
            triangulate(&LaserLine::default(), &geometry, &small, 0.0, 0.0),
            Err(Error::ImageSize {
                expected: (40, 30),
                actual: (20, 30)
            })
        );
        let line = LaserLine(BTreeMap::from([(2, 4.0), (5, 40.2)]));
        assert_eq!(
            triangulate(&line, &geometry, &raw, 0.0, 0.0),
            Err(Error::LineOutOfBounds { row: 5, column: 40 })
        );
        let line = LaserLine(BTreeMap::from([(30, 1.0)]));
        assert_eq!(
            triangulate(&line, &geometry, &raw, 0.0, 0.0),
            Err(Error::LineOutOfBounds { row: 30, column: 1 })
        );
    }
}
