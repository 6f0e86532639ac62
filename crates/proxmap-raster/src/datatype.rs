//! Pixel data types.

use crate::{RasterError, Result};
use std::fmt;
use std::str::FromStr;

/// Numeric type of the cells stored in a band.
///
/// Names follow the usual GDAL spelling (`Byte`, `UInt16`, `Float32`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 32-bit integer.
    Int32,
    /// 32-bit IEEE float.
    #[default]
    Float32,
    /// 64-bit IEEE float.
    Float64,
}

impl DataType {
    /// All supported data types.
    pub const ALL: [DataType; 8] = [
        DataType::Byte,
        DataType::Int8,
        DataType::UInt16,
        DataType::Int16,
        DataType::UInt32,
        DataType::Int32,
        DataType::Float32,
        DataType::Float64,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Byte => "Byte",
            DataType::Int8 => "Int8",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
        }
    }

    /// Smallest and largest representable value.
    pub fn range(self) -> (f64, f64) {
        match self {
            DataType::Byte => (0.0, u8::MAX as f64),
            DataType::Int8 => (i8::MIN as f64, i8::MAX as f64),
            DataType::UInt16 => (0.0, u16::MAX as f64),
            DataType::Int16 => (i16::MIN as f64, i16::MAX as f64),
            DataType::UInt32 => (0.0, u32::MAX as f64),
            DataType::Int32 => (i32::MIN as f64, i32::MAX as f64),
            DataType::Float32 => (f32::MIN as f64, f32::MAX as f64),
            DataType::Float64 => (f64::MIN, f64::MAX),
        }
    }

    /// Convert a value to what a cell of this type would hold.
    ///
    /// Integers round half away from zero and saturate at the type range;
    /// NaN becomes 0. `Float32` narrows to single precision.
    pub fn convert(self, value: f64) -> f64 {
        match self {
            DataType::Float64 => value,
            DataType::Float32 => value as f32 as f64,
            _ => {
                if value.is_nan() {
                    return 0.0;
                }
                let (min, max) = self.range();
                value.round().clamp(min, max)
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RasterError::UnknownDataType(s.to_string()))
    }
}
