//! Error types for the raster crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading, writing or addressing raster data.
#[derive(Debug, Error)]
pub enum RasterError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF encode/decode error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - malformed georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// The file is not recognized by any registered driver.
    #[error("{} not recognized as a supported file format", .0.display())]
    NotRecognized(PathBuf),

    /// No driver is registered under this name.
    #[error("Unknown driver: {0}")]
    UnknownDriver(String),

    /// The pixel data type name is not known.
    #[error("Unknown data type: {0}")]
    UnknownDataType(String),

    /// The pixel layout stored in the file cannot be handled.
    #[error("Unsupported TIFF data type: {0}")]
    UnsupportedDataType(String),

    /// The driver cannot perform this operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A creation option has an invalid value.
    #[error("Invalid creation option: {0}")]
    InvalidCreationOption(String),

    /// Width or height is zero, or does not match the supplied data.
    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width in pixels.
        width: usize,
        /// Height in pixels.
        height: usize,
    },

    /// Band index is outside `1..=count`.
    #[error("Band {band} out of range (dataset has {count} band(s))")]
    BandOutOfRange {
        /// Requested band (1-based).
        band: usize,
        /// Number of bands in the dataset.
        count: usize,
    },

    /// Row index is outside the band.
    #[error("Row {row} out of range (band height is {height})")]
    RowOutOfRange {
        /// Requested row.
        row: usize,
        /// Band height.
        height: usize,
    },

    /// Pixel coordinates are outside the band.
    #[error("Pixel ({col}, {row}) out of range for {width}x{height} band")]
    PixelOutOfRange {
        /// Requested column.
        col: usize,
        /// Requested row.
        row: usize,
        /// Band width.
        width: usize,
        /// Band height.
        height: usize,
    },

    /// A row buffer does not have the band width.
    #[error("Row buffer holds {actual} values, band width is {expected}")]
    BufferSize {
        /// Band width.
        expected: usize,
        /// Supplied buffer length.
        actual: usize,
    },

    /// Attempt to modify a dataset opened read-only.
    #[error("Dataset {} is opened read-only", .0.display())]
    ReadOnly(PathBuf),
}
