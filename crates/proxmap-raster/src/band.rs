//! Band access traits and the in-memory band.

use crate::{DataType, GeoTransform, RasterError, Result};

/// Read access to a single 2-D band.
///
/// Rows are addressed top to bottom, values are handed out as `f64`
/// regardless of the stored [`DataType`].
pub trait RasterBand {
    /// Width in pixels.
    fn width(&self) -> usize;

    /// Height in pixels.
    fn height(&self) -> usize;

    /// Stored pixel type.
    fn data_type(&self) -> DataType;

    /// No-data sentinel, if any.
    fn nodata(&self) -> Option<f64>;

    /// Georeferencing of the dataset this band belongs to.
    fn geo_transform(&self) -> Option<GeoTransform> {
        None
    }

    /// Copy row `row` into `buf`, which must hold exactly `width()` values.
    fn read_row(&self, row: usize, buf: &mut [f64]) -> Result<()>;

    /// `(width, height)`.
    fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }
}

/// Write access to a single 2-D band.
pub trait RasterBandMut: RasterBand {
    /// Replace the no-data sentinel.
    fn set_nodata(&mut self, nodata: Option<f64>) -> Result<()>;

    /// Overwrite row `row` with `values` (exactly `width()` of them).
    ///
    /// Values are converted to the band's [`DataType`].
    fn write_row(&mut self, row: usize, values: &[f64]) -> Result<()>;
}

/// A band held entirely in memory, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MemBand {
    width: usize,
    height: usize,
    data_type: DataType,
    data: Vec<f64>,
    nodata: Option<f64>,
    geo_transform: Option<GeoTransform>,
}

impl MemBand {
    /// Band of zeros.
    pub fn new(width: usize, height: usize, data_type: DataType) -> Self {
        Self::filled(width, height, data_type, 0.0)
    }

    /// Band with every cell set to `value`.
    pub fn filled(width: usize, height: usize, data_type: DataType, value: f64) -> Self {
        Self {
            width,
            height,
            data_type,
            data: vec![data_type.convert(value); width * height],
            nodata: None,
            geo_transform: None,
        }
    }

    /// Band from row-major values.
    pub fn from_vec(width: usize, height: usize, data_type: DataType, data: Vec<f64>) -> Result<Self> {
        if data.len() != width * height {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        let data = data.into_iter().map(|v| data_type.convert(v)).collect();
        Ok(Self {
            width,
            height,
            data_type,
            data,
            nodata: None,
            geo_transform: None,
        })
    }

    /// Builder: set the no-data sentinel.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Builder: set the georeferencing.
    pub fn with_geo_transform(mut self, geo_transform: Option<GeoTransform>) -> Self {
        self.geo_transform = geo_transform;
        self
    }

    /// Replace the georeferencing.
    pub fn set_geo_transform(&mut self, geo_transform: Option<GeoTransform>) {
        self.geo_transform = geo_transform;
    }

    /// Value at `(col, row)`, `None` outside the band.
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    /// Set the value at `(col, row)`.
    pub fn set(&mut self, col: usize, row: usize, value: f64) -> Result<()> {
        if col >= self.width || row >= self.height {
            return Err(RasterError::PixelOutOfRange {
                col,
                row,
                width: self.width,
                height: self.height,
            });
        }
        self.data[row * self.width + col] = self.data_type.convert(value);
        Ok(())
    }

    /// All cells, row-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// One row as a slice.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.height {
            return None;
        }
        let start = row * self.width;
        Some(&self.data[start..start + self.width])
    }

    fn check_row(&self, row: usize, len: usize) -> Result<usize> {
        if row >= self.height {
            return Err(RasterError::RowOutOfRange {
                row,
                height: self.height,
            });
        }
        if len != self.width {
            return Err(RasterError::BufferSize {
                expected: self.width,
                actual: len,
            });
        }
        Ok(row * self.width)
    }
}

impl RasterBand for MemBand {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn read_row(&self, row: usize, buf: &mut [f64]) -> Result<()> {
        let start = self.check_row(row, buf.len())?;
        buf.copy_from_slice(&self.data[start..start + self.width]);
        Ok(())
    }
}

impl RasterBandMut for MemBand {
    fn set_nodata(&mut self, nodata: Option<f64>) -> Result<()> {
        self.nodata = nodata;
        Ok(())
    }

    fn write_row(&mut self, row: usize, values: &[f64]) -> Result<()> {
        let start = self.check_row(row, values.len())?;
        let data_type = self.data_type;
        for (dst, &v) in self.data[start..start + self.width].iter_mut().zip(values) {
            *dst = data_type.convert(v);
        }
        Ok(())
    }
}
