use crate::image::{absdiff, box_blur, in_hsv_range, opening};
use crate::{Error, Result, ScanConfig};
use image::{GrayImage, RgbImage};
use log::*;

/// Buffers produced while isolating the laser stripe of one frame pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// `|laser - raw|`, before any smoothing.
    pub diff: RgbImage,
    /// Stripe mask, `MASK_ON` where the stripe is.
    pub mask: GrayImage,
}

/// Fails unless both frames have the configured resolution.
pub fn check_frames(raw: &RgbImage, laser: &RgbImage, config: &ScanConfig) -> Result<()> {
    let expected = config.dimensions();
    if raw.dimensions() != expected || laser.dimensions() != expected {
        return Err(Error::FrameSize {
            expected,
            raw: raw.dimensions(),
            laser: laser.dimensions(),
        });
    }
    Ok(())
}

/// Isolates the laser stripe.
///
/// The frames are differenced, optionally box blurred and opened with the
/// configured kernel sides, and the result is thresholded in HSV against the
/// configured inclusive range.
///
/// # Errors
/// [`Error::FrameSize`] if the frames do not both match the configured
/// resolution.
pub fn preprocess(raw: &RgbImage, laser: &RgbImage, config: &ScanConfig) -> Result<Preprocessed> {
    check_frames(raw, laser, config)?;
    let diff = absdiff(laser, raw)?;
    trace!("Difference image computed.");

    let mut stripe = match config.blur {
        Some(size) => {
            trace!("Box blur with a {size}x{size} window.");
            box_blur(&diff, size)
        }
        None => diff.clone(),
    };
    if let Some(size) = config.open {
        trace!("Opening with a {size}x{size} rectangle.");
        stripe = opening(&stripe, size);
    }

    let mask = in_hsv_range(&stripe, config.hsv_min, config.hsv_max);
    debug!(
        "Stripe mask has {} foreground pixels",
        mask.pixels().filter(|p| p[0] != 0).count()
    );
    Ok(Preprocessed { diff, mask })
}
