use crate::Triangulation;
use image::Rgb;
use log::*;
use nalgebra::Point3;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Inclusive bounds on the radial distance and height of accepted points.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RangeFilter {
    pub rho_min: f64,
    pub rho_max: f64,
    pub h_min: f64,
    pub h_max: f64,
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self {
            rho_min: -100.0,
            rho_max: 100.0,
            h_min: 0.0,
            h_max: 200.0,
        }
    }
}

impl RangeFilter {
    pub fn contains(&self, rho: f64, height: f64) -> bool {
        (self.h_min..=self.h_max).contains(&height) && (self.rho_min..=self.rho_max).contains(&rho)
    }

    /// Indices of the points inside the bounds, ascending.
    pub fn retained(&self, triangulation: &Triangulation) -> Vec<usize> {
        triangulation
            .rho
            .iter()
            .zip(&triangulation.height)
            .enumerate()
            .filter(|(_, (&rho, &height))| self.contains(rho, height))
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Keeps the points inside the bounds, in their original order.
    ///
    /// Filtering everything out is not an error, it just yields empty vectors.
    pub fn apply(&self, triangulation: Triangulation) -> (Vec<Point3<f64>>, Vec<Rgb<u8>>) {
        let total = triangulation.len();
        let Triangulation {
            points,
            colors,
            rho,
            height,
        } = triangulation;
        let (points, colors): (Vec<_>, Vec<_>) = points
            .into_iter()
            .zip(colors)
            .zip(rho.into_iter().zip(height))
            .filter(|(_, (rho, height))| self.contains(*rho, *height))
            .map(|(point_color, _)| point_color)
            .unzip();
        debug!("Range filter kept {} of {} points", points.len(), total);
        (points, colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangulation(samples: &[(f64, f64)]) -> Triangulation {
        Triangulation {
            points: samples
                .iter()
                .map(|&(rho, z)| Point3::new(rho, 0.0, z))
                .collect(),
            colors: (0..samples.len()).map(|i| Rgb([i as u8, 0, 0])).collect(),
            rho: samples.iter().map(|&(rho, _)| rho).collect(),
            height: samples.iter().map(|&(_, z)| z).collect(),
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let filter = RangeFilter::default();
        assert!(filter.contains(-100.0, 0.0));
        assert!(filter.contains(100.0, 200.0));
        assert!(!filter.contains(100.000_001, 10.0));
        assert!(!filter.contains(0.0, -1e-9));
        assert!(!filter.contains(f64::NAN, 10.0));
    }

    #[test]
    fn partitions_the_input() {
        let filter = RangeFilter {
            rho_min: -5.0,
            rho_max: 5.0,
            h_min: 0.0,
            h_max: 10.0,
        };
        let samples = [
            (0.0, 5.0),
            (6.0, 5.0),
            (-5.0, 10.0),
            (1.0, -1.0),
            (5.0, 0.0),
            (-7.0, 20.0),
        ];
        let input = triangulation(&samples);
        let kept = filter.retained(&input);
        assert_eq!(kept, vec![0, 2, 4]);
        for (ix, &(rho, z)) in samples.iter().enumerate() {
            let inside = (0.0..=10.0).contains(&z) && (-5.0..=5.0).contains(&rho);
            assert_eq!(kept.contains(&ix), inside);
        }

        let (points, colors) = filter.apply(input);
        assert_eq!(points.len(), 3);
        assert_eq!(colors, vec![Rgb([0, 0, 0]), Rgb([2, 0, 0]), Rgb([4, 0, 0])]);
        for point in &points {
            assert!(filter.contains(point.x, point.z));
        }
    }

    #[test]
    fn everything_filtered_is_empty_not_error() {
        let filter = RangeFilter::default();
        let (points, colors) = filter.apply(triangulation(&[(500.0, 5.0), (0.0, -3.0)]));
        assert!(points.is_empty());
        assert!(colors.is_empty());
    }
}
