//! Affine georeferencing.

/// Affine transform from pixel/line space to georeferenced space.
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up images have zero rotation terms and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X of the upper-left corner of the upper-left pixel.
    pub origin_x: f64,
    /// West-east pixel size.
    pub pixel_width: f64,
    /// Row rotation term (usually 0).
    pub row_rotation: f64,
    /// Y of the upper-left corner of the upper-left pixel.
    pub origin_y: f64,
    /// Column rotation term (usually 0).
    pub col_rotation: f64,
    /// North-south pixel size (usually negative).
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform without rotation.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    /// Build from the six GDAL coefficients.
    pub fn from_gdal(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    /// The six GDAL coefficients.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Ground length of one column step and one row step.
    ///
    /// Equal to `(|pixel_width|, |pixel_height|)` for north-up images.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            self.pixel_width.hypot(self.col_rotation),
            self.row_rotation.hypot(self.pixel_height),
        )
    }

    /// Whether either rotation term is non-zero.
    pub fn has_rotation(&self) -> bool {
        self.row_rotation != 0.0 || self.col_rotation != 0.0
    }

    /// Whether a column step and a row step have the same ground length.
    pub fn is_square(&self) -> bool {
        let (sx, sy) = self.pixel_size();
        (sx - sy).abs() <= f64::EPSILON * sx.max(sy) * 4.0
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}
