use thiserror::Error;

/// Everything that can go wrong while building the geometry tables or
/// processing a frame pair.
///
/// An empty laser line is not an error: it yields an empty frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("resolution must be non-zero, got {width} x {height}")]
    InvalidResolution { width: u32, height: u32 },
    #[error("laser plane depth zs must be finite and non-zero, got {0}")]
    InvalidLaserDepth(f64),
    #[error("invalid camera intrinsics fx={fx} fy={fy} cx={cx} cy={cy}")]
    InvalidIntrinsics { fx: f64, fy: f64, cx: f64, cy: f64 },
    #[error("laser plane angle must lie strictly between 0 and 180 degrees, got {0}")]
    DegenerateAlpha(f64),
    #[error("{name} kernel side must be at least 1, got {size}")]
    InvalidKernel { name: &'static str, size: u32 },
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
    #[error("camera ray of column {column} is parallel to the laser plane")]
    ParallelRay { column: u32 },
    #[error(
        "frame size mismatch: expected {expected:?}, raw frame is {raw:?}, laser frame is {laser:?}"
    )]
    FrameSize {
        expected: (u32, u32),
        raw: (u32, u32),
        laser: (u32, u32),
    },
    #[error("image size mismatch: expected {expected:?}, got {actual:?}")]
    ImageSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("line pixel at row {row}, column {column} lies outside the geometry tables")]
    LineOutOfBounds { row: u32, column: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
