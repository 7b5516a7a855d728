//! The handful of raster operations the stripe isolation needs.
//!
//! These work on `image::RgbImage` / `image::GrayImage` buffers directly. All
//! neighbourhood filters here use a square window, so they are applied as a
//! horizontal pass followed by a vertical pass over one channel plane at a
//! time, each pass running over a padded scratch line.

use crate::{Error, Result};
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use palette::{FromColor, Hsv, Srgb};

/// Value a binary mask uses for foreground pixels.
pub const MASK_ON: u8 = 255;

#[derive(Debug, Clone, Copy)]
enum Border<T> {
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
    Constant(T),
}

fn reflect_101(mut index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    while index < 0 || index > last {
        index = if index < 0 { -index } else { 2 * last - index };
    }
    index as usize
}

/// Fills `scratch` with `len` samples preceded by `anchor` and followed by
/// `size - 1 - anchor` border samples, so that `scratch.windows(size)` yields
/// exactly one window per sample.
fn fill_padded<T: Copy>(
    scratch: &mut Vec<T>,
    len: usize,
    size: usize,
    border: Border<T>,
    sample: impl Fn(usize) -> T,
) {
    let anchor = (size / 2) as isize;
    scratch.clear();
    scratch.extend((0..len + size - 1).map(|i| {
        let offset = i as isize - anchor;
        if offset >= 0 && offset < len as isize {
            sample(offset as usize)
        } else {
            match border {
                Border::Reflect101 => sample(reflect_101(offset, len)),
                Border::Constant(value) => value,
            }
        }
    }));
}

/// Applies a `size` x `size` window reduction to one channel plane.
fn filter_plane<T: Copy>(
    plane: &[T],
    width: usize,
    height: usize,
    size: usize,
    border: Border<T>,
    reduce: impl Fn(&[T]) -> T,
) -> Vec<T> {
    let mut scratch = Vec::with_capacity(width.max(height) + size);
    let mut horizontal = Vec::with_capacity(plane.len());
    for row in plane.chunks_exact(width) {
        fill_padded(&mut scratch, width, size, border, |x| row[x]);
        horizontal.extend(scratch.windows(size).map(&reduce));
    }
    let mut output = horizontal.clone();
    for x in 0..width {
        fill_padded(&mut scratch, height, size, border, |y| horizontal[y * width + x]);
        for (y, window) in scratch.windows(size).enumerate() {
            output[y * width + x] = reduce(window);
        }
    }
    output
}

fn split_planes(image: &RgbImage) -> [Vec<u8>; 3] {
    let mut planes: [Vec<u8>; 3] = Default::default();
    for plane in planes.iter_mut() {
        plane.reserve(image.len() / 3);
    }
    for pixel in image.pixels() {
        for (plane, &value) in planes.iter_mut().zip(pixel.channels()) {
            plane.push(value);
        }
    }
    planes
}

fn merge_planes(planes: &[Vec<u8>; 3], width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let i = (y * width + x) as usize;
        Rgb([planes[0][i], planes[1][i], planes[2][i]])
    })
}

fn map_planes(image: &RgbImage, f: impl Fn(&[u8]) -> Vec<u8>) -> RgbImage {
    let planes = split_planes(image).map(|plane| f(&plane));
    merge_planes(&planes, image.width(), image.height())
}

/// Per-pixel, per-channel `|a - b|`.
///
/// # Errors
/// [`Error::ImageSize`] if `b` does not have the dimensions of `a`.
pub fn absdiff(a: &RgbImage, b: &RgbImage) -> Result<RgbImage> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::ImageSize {
            expected: a.dimensions(),
            actual: b.dimensions(),
        });
    }
    Ok(ImageBuffer::from_fn(a.width(), a.height(), |x, y| {
        a.get_pixel(x, y)
            .map2(b.get_pixel(x, y), |p, q| p.abs_diff(q))
    }))
}

/// Normalized box filter with a `size` x `size` window.
///
/// The window is anchored at `size / 2`, so even sizes reach one pixel further
/// to the top-left than to the bottom-right. Borders reflect without repeating
/// the edge pixel and the mean is rounded to the nearest integer.
pub fn box_blur(image: &RgbImage, size: u32) -> RgbImage {
    let size = size as usize;
    let (width, height) = (image.width() as usize, image.height() as usize);
    if size <= 1 || width == 0 || height == 0 {
        return image.clone();
    }
    let area = (size * size) as f64;
    map_planes(image, |plane| {
        let wide: Vec<u32> = plane.iter().map(|&v| u32::from(v)).collect();
        filter_plane(&wide, width, height, size, Border::Reflect101, |w| {
            w.iter().sum()
        })
        .into_iter()
        .map(|sum| (f64::from(sum) / area).round() as u8)
        .collect()
    })
}

/// Grey-level erosion (window minimum) with a `size` x `size` rectangle.
///
/// Samples outside the image never win.
pub fn erode(image: &RgbImage, size: u32) -> RgbImage {
    rank_filter(image, size, u8::MAX, |w| w.iter().copied().min())
}

/// Grey-level dilation (window maximum) with a `size` x `size` rectangle.
///
/// Samples outside the image never win.
pub fn dilate(image: &RgbImage, size: u32) -> RgbImage {
    rank_filter(image, size, u8::MIN, |w| w.iter().copied().max())
}

fn rank_filter(
    image: &RgbImage,
    size: u32,
    neutral: u8,
    pick: impl Fn(&[u8]) -> Option<u8>,
) -> RgbImage {
    let size = size as usize;
    let (width, height) = (image.width() as usize, image.height() as usize);
    if size <= 1 || width == 0 || height == 0 {
        return image.clone();
    }
    map_planes(image, |plane| {
        filter_plane(plane, width, height, size, Border::Constant(neutral), |w| {
            pick(w).unwrap_or(neutral)
        })
    })
}

/// Morphological opening: erosion followed by dilation with the same
/// rectangle. Removes bright speckle smaller than the rectangle.
///
/// With an even `size` the anchor is off-center, so surviving structures come
/// back shifted one pixel towards the bottom-right.
pub fn opening(image: &RgbImage, size: u32) -> RgbImage {
    dilate(&erode(image, size), size)
}

/// Converts a pixel to 8-bit HSV: hue in half degrees (`0..=180`),
/// saturation and value scaled to `0..=255`.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = pixel.0;
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());
    [
        (hsv.hue.to_positive_degrees() / 2.0).round() as u8,
        (hsv.saturation * 255.0).round() as u8,
        (hsv.value * 255.0).round() as u8,
    ]
}

/// Foreground ([`MASK_ON`]) where every HSV channel of the pixel lies inside
/// the inclusive `[min, max]` bound of that channel, background (`0`)
/// elsewhere.
pub fn in_hsv_range(image: &RgbImage, min: [u8; 3], max: [u8; 3]) -> GrayImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let hsv = rgb_to_hsv(*image.get_pixel(x, y));
        let inside = (0..3).all(|c| min[c] <= hsv[c] && hsv[c] <= max[c]);
        Luma([if inside { MASK_ON } else { 0 }])
    })
}

/// Replicates a mask on three channels for display.
pub fn mask_to_rgb(mask: &GrayImage) -> RgbImage {
    ImageBuffer::from_fn(mask.width(), mask.height(), |x, y| {
        let value = mask.get_pixel(x, y)[0];
        Rgb([value; 3])
    })
}
