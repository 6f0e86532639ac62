//! # proxmap-raster
//!
//! Raster bands, pixel types and native GeoTIFF datasets.
//!
//! This crate provides the I/O side of proxmap:
//! - [`RasterBand`] / [`RasterBandMut`]: row-oriented band access used by the
//!   proximity engine
//! - [`MemBand`]: an in-memory band implementing both
//! - [`Dataset`] / [`Driver`]: scoped handles over GeoTIFF files, with
//!   georeferencing, projection keys and no-data carried across
//!
//! ## Example
//!
//! ```no_run
//! use proxmap_raster::{DataType, Dataset, Driver, RasterBand};
//!
//! let src = Dataset::open("landcover.tif")?;
//! let band = src.band(1)?;
//! println!("{}x{} {}", band.width(), band.height(), band.data_type());
//!
//! let mut dst = Driver::GTiff.create("proximity.tif", src.width(), src.height(), 1, DataType::Float32, &["COMPRESS=LZW"])?;
//! dst.set_geo_transform(src.geo_transform())?;
//! dst.set_spatial_ref(src.spatial_ref().clone())?;
//! dst.close()?;
//! # Ok::<(), proxmap_raster::RasterError>(())
//! ```

mod band;
mod dataset;
mod datatype;
mod error;
mod geotiff;
mod geotransform;

pub use band::{MemBand, RasterBand, RasterBandMut};
pub use dataset::{Access, Dataset, Driver};
pub use datatype::DataType;
pub use error::RasterError;
pub use geotiff::{Compression, CreationOptions, SpatialRef};
pub use geotransform::GeoTransform;

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
