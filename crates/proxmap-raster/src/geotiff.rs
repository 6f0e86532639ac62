//! Native GeoTIFF codec built on the `tiff` crate.

use crate::{DataType, GeoTransform, MemBand, RasterBand, RasterError, Result};
use std::fmt;
use std::io::{Read, Seek, Write};
use std::str::FromStr;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32, Gray32Float, Gray64Float, Gray8, GrayI16, GrayI32, GrayI8,
};
use tiff::encoder::compression::{
    Compression as TiffCompression, Deflate, Lzw, Packbits, Uncompressed,
};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, warn};

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GEO_DOUBLE_PARAMS: Tag = Tag::GeoDoubleParamsTag;
const GEO_ASCII_PARAMS: Tag = Tag::GeoAsciiParamsTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// Projection metadata carried as raw GeoTIFF keys.
///
/// The keys are not interpreted, only copied between datasets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialRef {
    /// GeoKeyDirectoryTag contents.
    pub key_directory: Vec<u16>,
    /// GeoDoubleParamsTag contents.
    pub double_params: Vec<f64>,
    /// GeoAsciiParamsTag contents.
    pub ascii_params: Option<String>,
}

impl SpatialRef {
    /// Whether no key directory is present.
    pub fn is_empty(&self) -> bool {
        self.key_directory.is_empty()
    }

    /// Minimal directory: projected model, pixel-is-area.
    fn minimal() -> Self {
        Self {
            key_directory: vec![
                1, 1, 0, 2, // version 1.1.0, 2 keys
                1024, 0, 1, 1, // GTModelTypeGeoKey = ModelTypeProjected
                1025, 0, 1, 1, // GTRasterTypeGeoKey = RasterPixelIsArea
            ],
            double_params: Vec::new(),
            ascii_params: None,
        }
    }
}

/// GeoTIFF compression scheme, selected with the `COMPRESS` creation option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// No compression.
    #[default]
    None,
    /// LZW.
    Lzw,
    /// Deflate (zlib).
    Deflate,
    /// PackBits run-length encoding.
    Packbits,
}

impl FromStr for Compression {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Compression::None),
            "LZW" => Ok(Compression::Lzw),
            "DEFLATE" | "ZIP" => Ok(Compression::Deflate),
            "PACKBITS" => Ok(Compression::Packbits),
            _ => Err(RasterError::InvalidCreationOption(format!("COMPRESS={s}"))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "NONE",
            Compression::Lzw => "LZW",
            Compression::Deflate => "DEFLATE",
            Compression::Packbits => "PACKBITS",
        })
    }
}

/// Parsed `NAME=VALUE` creation options of the GTiff driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreationOptions {
    /// Compression applied when the dataset is written.
    pub compression: Compression,
}

impl CreationOptions {
    /// Parse creation options. Unsupported names are ignored with a warning.
    pub fn parse<S: AsRef<str>>(options: &[S]) -> Result<Self> {
        let mut parsed = Self::default();
        for option in options {
            let option = option.as_ref();
            let (name, value) = option
                .split_once('=')
                .ok_or_else(|| RasterError::InvalidCreationOption(option.to_string()))?;
            if name.trim().eq_ignore_ascii_case("COMPRESS") {
                parsed.compression = value.parse()?;
            } else {
                warn!("GTiff driver does not support creation option {}", name.trim());
            }
        }
        Ok(parsed)
    }
}

/// A decoded GeoTIFF image: every sample plane as its own band.
#[derive(Debug)]
pub(crate) struct GeoTiffImage {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) bands: Vec<MemBand>,
    pub(crate) geo_transform: Option<GeoTransform>,
    pub(crate) spatial_ref: SpatialRef,
}

/// Decode a GeoTIFF from any seekable reader.
pub(crate) fn decode<R: Read + Seek>(reader: R) -> Result<GeoTiffImage> {
    let mut decoder = Decoder::new(reader)?;

    // Rasters handed to the proximity engine are often large single strips.
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.ifd_value_size = 1024 * 1024 * 1024;
    decoder = decoder.with_limits(limits);

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }

    let samples = decoder
        .get_tag_u32(Tag::SamplesPerPixel)
        .map(|n| n.max(1) as usize)
        .unwrap_or(1);

    let geo_transform = read_geotransform(&mut decoder)?;
    let spatial_ref = read_spatial_ref(&mut decoder);
    let nodata = read_nodata_value(&mut decoder);

    let (data_type, interleaved) = decode_samples(decoder.read_image()?);
    if interleaved.len() != width * height * samples {
        return Err(RasterError::InvalidGeoTiff(format!(
            "expected {} samples, decoded {}",
            width * height * samples,
            interleaved.len()
        )));
    }

    let bands = (0..samples)
        .map(|b| {
            let plane: Vec<f64> = interleaved.iter().skip(b).step_by(samples).copied().collect();
            MemBand::from_vec(width, height, data_type, plane).map(|band| {
                band.with_nodata(nodata)
                    .with_geo_transform(geo_transform)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "decoded {}x{} GeoTIFF, {} band(s) of {}",
        width, height, samples, data_type
    );

    Ok(GeoTiffImage {
        width,
        height,
        bands,
        geo_transform,
        spatial_ref,
    })
}

fn decode_samples(result: DecodingResult) -> (DataType, Vec<f64>) {
    match result {
        DecodingResult::U8(data) => (DataType::Byte, data.into_iter().map(f64::from).collect()),
        DecodingResult::I8(data) => (DataType::Int8, data.into_iter().map(f64::from).collect()),
        DecodingResult::U16(data) => (DataType::UInt16, data.into_iter().map(f64::from).collect()),
        DecodingResult::I16(data) => (DataType::Int16, data.into_iter().map(f64::from).collect()),
        DecodingResult::U32(data) => (DataType::UInt32, data.into_iter().map(f64::from).collect()),
        DecodingResult::I32(data) => (DataType::Int32, data.into_iter().map(f64::from).collect()),
        DecodingResult::F32(data) => (DataType::Float32, data.into_iter().map(f64::from).collect()),
        DecodingResult::F64(data) => (DataType::Float64, data),
        // 64-bit integers have no band type of their own.
        DecodingResult::U64(data) => (DataType::Float64, data.into_iter().map(|v| v as f64).collect()),
        DecodingResult::I64(data) => (DataType::Float64, data.into_iter().map(|v| v as f64).collect()),
    }
}

/// Read georeferencing from ModelTransformation, or ModelTiepoint + ModelPixelScale.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoTransform>> {
    if let Ok(m) = decoder.get_tag_f64_vec(MODEL_TRANSFORMATION) {
        if m.len() < 16 {
            return Err(RasterError::InvalidGeoTiff(format!(
                "ModelTransformationTag has {} values, expected 16",
                m.len()
            )));
        }
        return Ok(Some(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]])));
    }

    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT);
    let pixel_scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE);

    match (tiepoint, pixel_scale) {
        (Ok(tiepoint), Ok(scale)) => {
            if tiepoint.len() < 6 || scale.len() < 2 {
                return Err(RasterError::InvalidGeoTiff(
                    "truncated ModelTiepointTag or ModelPixelScaleTag".to_string(),
                ));
            }
            // Tiepoint format: [i, j, k, x, y, z]; raster rows go south.
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            Ok(Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1])))
        }
        _ => Ok(None),
    }
}

fn read_spatial_ref<R: Read + Seek>(decoder: &mut Decoder<R>) -> SpatialRef {
    SpatialRef {
        key_directory: decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY).unwrap_or_default(),
        double_params: decoder.get_tag_f64_vec(GEO_DOUBLE_PARAMS).unwrap_or_default(),
        ascii_params: decoder.get_tag_ascii_string(GEO_ASCII_PARAMS).ok(),
    }
}

/// No-data value from the GDAL_NODATA ASCII tag.
fn read_nodata_value<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(GDAL_NODATA).ok()?;
    let text = text.trim_end_matches('\0').trim();
    match text.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => text.parse().ok(),
    }
}

/// Encode a single band as a GeoTIFF.
pub(crate) fn encode<W: Write + Seek>(
    writer: W,
    band: &MemBand,
    geo_transform: Option<GeoTransform>,
    spatial_ref: &SpatialRef,
    options: CreationOptions,
) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let tags = GeoTags::new(band, geo_transform, spatial_ref);

    // Values already hold the band's data type, so these casts are exact.
    match band.data_type() {
        DataType::Byte => write_typed::<_, Gray8>(&mut encoder, band, &tags, options, |v| v as u8),
        DataType::Int8 => write_typed::<_, GrayI8>(&mut encoder, band, &tags, options, |v| v as i8),
        DataType::UInt16 => write_typed::<_, Gray16>(&mut encoder, band, &tags, options, |v| v as u16),
        DataType::Int16 => write_typed::<_, GrayI16>(&mut encoder, band, &tags, options, |v| v as i16),
        DataType::UInt32 => write_typed::<_, Gray32>(&mut encoder, band, &tags, options, |v| v as u32),
        DataType::Int32 => write_typed::<_, GrayI32>(&mut encoder, band, &tags, options, |v| v as i32),
        DataType::Float32 => {
            write_typed::<_, Gray32Float>(&mut encoder, band, &tags, options, |v| v as f32)
        }
        DataType::Float64 => write_typed::<_, Gray64Float>(&mut encoder, band, &tags, options, |v| v),
    }
}

/// Georeferencing tags prepared for writing.
struct GeoTags {
    transformation: Option<Vec<f64>>,
    pixel_scale: Option<Vec<f64>>,
    tiepoint: Option<Vec<f64>>,
    spatial_ref: Option<SpatialRef>,
    nodata: Option<String>,
}

impl GeoTags {
    fn new(band: &MemBand, geo_transform: Option<GeoTransform>, spatial_ref: &SpatialRef) -> Self {
        let mut tags = GeoTags {
            transformation: None,
            pixel_scale: None,
            tiepoint: None,
            spatial_ref: None,
            nodata: band.nodata().map(format_nodata),
        };

        if let Some(gt) = geo_transform {
            if gt.has_rotation() || gt.pixel_height > 0.0 {
                tags.transformation = Some(vec![
                    gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
                    gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
                    0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                ]);
            } else {
                tags.pixel_scale = Some(vec![gt.pixel_width, -gt.pixel_height, 0.0]);
                tags.tiepoint = Some(vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0]);
            }
            tags.spatial_ref = Some(if spatial_ref.is_empty() {
                SpatialRef::minimal()
            } else {
                spatial_ref.clone()
            });
        } else if !spatial_ref.is_empty() {
            tags.spatial_ref = Some(spatial_ref.clone());
        }

        tags
    }
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{value}")
    }
}

fn write_typed<W, C>(
    encoder: &mut TiffEncoder<W>,
    band: &MemBand,
    tags: &GeoTags,
    options: CreationOptions,
    cast: impl Fn(f64) -> C::Inner,
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    [C::Inner]: TiffValue,
{
    let width = band.width() as u32;
    let height = band.height() as u32;
    let data: Vec<C::Inner> = band.data().iter().map(|&v| cast(v)).collect();

    match options.compression {
        Compression::None => write_image::<W, C, _>(encoder, width, height, Uncompressed::default(), &data, tags),
        Compression::Lzw => write_image::<W, C, _>(encoder, width, height, Lzw::default(), &data, tags),
        Compression::Deflate => write_image::<W, C, _>(encoder, width, height, Deflate::default(), &data, tags),
        Compression::Packbits => write_image::<W, C, _>(encoder, width, height, Packbits::default(), &data, tags),
    }
}

fn write_image<W, C, D>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    compression: D,
    data: &[C::Inner],
    tags: &GeoTags,
) -> Result<()>
where
    W: Write + Seek,
    C: ColorType,
    D: TiffCompression,
    [C::Inner]: TiffValue,
{
    let mut image = encoder.new_image_with_compression::<C, D>(width, height, compression)?;

    if let Some(m) = &tags.transformation {
        image.encoder().write_tag(MODEL_TRANSFORMATION, m.as_slice())?;
    }
    if let Some(scale) = &tags.pixel_scale {
        image.encoder().write_tag(MODEL_PIXEL_SCALE, scale.as_slice())?;
    }
    if let Some(tiepoint) = &tags.tiepoint {
        image.encoder().write_tag(MODEL_TIEPOINT, tiepoint.as_slice())?;
    }
    if let Some(srs) = &tags.spatial_ref {
        image.encoder().write_tag(GEO_KEY_DIRECTORY, srs.key_directory.as_slice())?;
        if !srs.double_params.is_empty() {
            image.encoder().write_tag(GEO_DOUBLE_PARAMS, srs.double_params.as_slice())?;
        }
        if let Some(ascii) = &srs.ascii_params {
            image.encoder().write_tag(GEO_ASCII_PARAMS, ascii.as_str())?;
        }
    }
    if let Some(nodata) = &tags.nodata {
        image.encoder().write_tag(GDAL_NODATA, nodata.as_str())?;
    }

    image.write_data(data)?;
    Ok(())
}
