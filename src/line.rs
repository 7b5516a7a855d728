use crate::image::MASK_ON;
use derive_more::{Deref, DerefMut, From, Into};
use image::GrayImage;
use log::*;
use std::collections::BTreeMap;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// How the center of the laser stripe is estimated within a mask row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum LineAlgorithm {
    /// Middle of the foreground run: `first + (run - 1) / 2`.
    ///
    /// Only looks at where the row starts and how many pixels are lit, so it
    /// assumes a single contiguous run per row. Several disjoint runs bias it.
    Compact,
    /// Centroid of the column indices weighted by mask value.
    ///
    /// Tolerates wider or softer stripes but stray foreground far from the
    /// stripe pulls it away.
    WeightedCentroid,
}

/// Sub-pixel column of the laser line for every mask row that has foreground.
///
/// Rows without any foreground are absent rather than stored with a sentinel.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut, From, Into)]
pub struct LaserLine(pub BTreeMap<u32, f64>);

impl LaserLine {
    /// The `(row, column)` pixel each estimate addresses, in row order.
    ///
    /// Columns are truncated toward zero, whichever estimator produced them.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0
            .iter()
            .map(|(&row, &column)| (row, table_index(column)))
    }
}

/// Maps a sub-pixel column onto the table column it falls in.
pub fn table_index(column: f64) -> u32 {
    column.trunc() as u32
}

/// Locates the laser line in a binary stripe mask.
///
/// Every estimate lies within `[0, width - 1]`, also for masks that are not
/// strictly `0`/[`MASK_ON`].
pub fn localize(mask: &GrayImage, algorithm: LineAlgorithm) -> LaserLine {
    let width = mask.width() as usize;
    if width == 0 {
        return LaserLine::default();
    }
    let estimate = |(row, values): (usize, &[u8])| {
        let column = match algorithm {
            LineAlgorithm::Compact => compact(values),
            LineAlgorithm::WeightedCentroid => weighted_centroid(values),
        };
        column.map(|column| (row as u32, column))
    };
    #[cfg(not(feature = "rayon"))]
    let line: BTreeMap<u32, f64> = mask
        .as_raw()
        .chunks_exact(width)
        .enumerate()
        .filter_map(estimate)
        .collect();
    #[cfg(feature = "rayon")]
    let line: BTreeMap<u32, f64> = mask
        .as_raw()
        .par_chunks_exact(width)
        .enumerate()
        .filter_map(estimate)
        .collect();
    debug!(
        "Localized the laser line on {} of {} rows with {:?}",
        line.len(),
        mask.height(),
        algorithm
    );
    LaserLine(line)
}

/// `first + (run - 1) / 2`, or `None` for an empty row.
///
/// The run length is the row sum over [`MASK_ON`], so a row that is not
/// strictly binary can overshoot; the estimate is clamped to the last column.
fn compact(row: &[u8]) -> Option<f64> {
    let sum: u64 = row.iter().map(|&v| u64::from(v)).sum();
    if sum == 0 {
        return None;
    }
    // First index holding the row maximum.
    let max = row.iter().copied().max()?;
    let first = row.iter().position(|&v| v == max)?;
    let run = sum as f64 / f64::from(MASK_ON);
    let last = (row.len() - 1) as f64;
    Some((first as f64 + (run - 1.0) / 2.0).min(last))
}

/// `sum(c * m[c]) / sum(m[c])`, or `None` for an empty row.
fn weighted_centroid(row: &[u8]) -> Option<f64> {
    let (moment, sum) = row
        .iter()
        .enumerate()
        .fold((0u64, 0u64), |(moment, sum), (column, &value)| {
            let value = u64::from(value);
            (moment + column as u64 * value, sum + value)
        });
    if sum == 0 {
        None
    } else {
        Some(moment as f64 / sum as f64)
    }
}
