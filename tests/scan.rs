use approx::assert_abs_diff_eq;
use cv_laserscan::{
    GeometryMap, LaserExtrinsics, LaserSide, LineAlgorithm, ScanConfig, Scanner,
};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::*;
use ndarray::s;

const RAW_COLOR: Rgb<u8> = Rgb([40, 60, 80]);
const LASER_COLOR: Rgb<u8> = Rgb([160, 80, 100]);

fn init_logger() {
    let _ = pretty_env_logger::try_init_timed();
}

/// Raw frame plus a laser frame in which `rect` is lit.
fn frame_pair(config: &ScanConfig, rect: Rect) -> (RgbImage, RgbImage) {
    let raw = RgbImage::from_pixel(config.width, config.height, RAW_COLOR);
    let mut laser = raw.clone();
    draw_filled_rect_mut(&mut laser, rect, LASER_COLOR);
    (raw, laser)
}

#[test]
fn single_pixel_row_end_to_end() {
    init_logger();
    for algorithm in [LineAlgorithm::Compact, LineAlgorithm::WeightedCentroid] {
        let config = ScanConfig::default()
            .blur(None)
            .open(None)
            .algorithm(algorithm);
        let mut scanner = Scanner::new(config).unwrap();
        // Three lit pixels centered on column 310 of row 400.
        let (raw, laser) = frame_pair(&config, Rect::at(309, 400).of_size(3, 1));

        let (points, colors) = scanner.process(&raw, &laser).unwrap();
        info!("{:?} produced {:?}", algorithm, points);

        assert_eq!(points.len(), 1);
        assert_eq!(colors, vec![RAW_COLOR]);
        assert_eq!(scanner.cloud().len(), 1);
        assert_eq!(scanner.theta(), 0.45);

        let point = scanner.cloud().points()[0];
        let rho = scanner.geometry().rho_at(400, 310);
        assert!(config.range.h_min <= point.z && point.z <= config.range.h_max);
        assert_abs_diff_eq!(point.x.hypot(point.y), rho.abs(), epsilon = 1e-9);
        assert_abs_diff_eq!(point.x, rho, epsilon = 1e-9);
        assert_abs_diff_eq!(point.z, 0.0, epsilon = 1e-9);
    }
}

#[test]
fn rotating_band_accumulates_in_order() {
    init_logger();
    let config = ScanConfig::default();
    let mut scanner = Scanner::new(config).unwrap();
    let (raw, laser) = frame_pair(&config, Rect::at(306, 0).of_size(9, 800));
    // The mask widens a little around the lit band once blurred and opened.
    let band_radii: Vec<f64> = (300..=320)
        .map(|column| scanner.geometry().rho_at(0, column).abs())
        .collect();

    let mut previous = Vec::new();
    let mut per_frame = None;
    for step in 0..6 {
        let theta = scanner.theta();
        assert_abs_diff_eq!(theta, step as f64 * 0.45, epsilon = 1e-12);

        let (points, colors) = scanner.process(&raw, &laser).unwrap();
        assert_eq!(points.len(), colors.len());
        assert!(!points.is_empty());
        // Same frame every step, so the same number of points survives.
        assert_eq!(*per_frame.get_or_insert(points.len()), points.len());

        let (sin, cos) = theta.to_radians().sin_cos();
        for point in &points {
            // Every point lies on the ray at the angle it was taken at.
            assert_abs_diff_eq!(point.x * sin - point.y * cos, 0.0, epsilon = 1e-9);
            let radius = point.x.hypot(point.y);
            assert!(
                band_radii.iter().any(|r| (r - radius).abs() < 1e-9),
                "radius {radius} does not belong to the band"
            );
            assert!((0.0..=200.0).contains(&point.z));
        }

        let cloud = scanner.cloud().points();
        assert_eq!(cloud.len(), previous.len() + points.len());
        assert_eq!(&cloud[..previous.len()], &previous[..]);
        assert_eq!(&cloud[previous.len()..], &points[..]);
        previous = cloud.to_vec();
    }
    assert_eq!(scanner.cloud().colors().len(), previous.len());
}

#[test]
fn angle_advances_without_detections() {
    let config = ScanConfig::default().resolution(40, 30).degrees(7.5);
    let mut scanner = Scanner::new(config).unwrap();
    let frame = RgbImage::from_pixel(40, 30, RAW_COLOR);
    for _ in 0..100 {
        let (points, colors) = scanner.process(&frame, &frame).unwrap();
        assert!(points.is_empty() && colors.is_empty());
    }
    assert_eq!(scanner.theta(), 750.0);
    assert!(scanner.cloud().is_populated());
    assert!(scanner.cloud().is_empty());
}

#[test]
fn geometry_is_deterministic() {
    let config = ScanConfig::default();
    let a = GeometryMap::build(&config).unwrap();
    let b = GeometryMap::build(&config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn right_laser_mirrors_tables() {
    let left = ScanConfig::default().extrinsics(LaserExtrinsics {
        xo: 0.0,
        ..Default::default()
    });
    let right = left.laser_side(LaserSide::Right);
    let left_map = GeometryMap::build(&left).unwrap();
    let right_map = GeometryMap::build(&right).unwrap();
    assert_eq!(right_map.rho(), left_map.rho().slice(s![.., ..;-1]));
    assert_eq!(right_map.height(), left_map.height().slice(s![.., ..;-1]));

    // With an offset, the right laser mirrors a left laser on the other side.
    let offset = ScanConfig::default();
    let right_map = GeometryMap::build(&offset.laser_side(LaserSide::Right)).unwrap();
    let flipped = offset.extrinsics(LaserExtrinsics {
        xo: -offset.extrinsics.xo,
        ..offset.extrinsics
    });
    let left_map = GeometryMap::build(&flipped).unwrap();
    assert_eq!(right_map.rho(), left_map.rho().slice(s![.., ..;-1]));
    assert_eq!(right_map.height(), left_map.height().slice(s![.., ..;-1]));
}
