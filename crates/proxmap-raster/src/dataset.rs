//! Dataset handles and the driver registry.

use crate::geotiff::{self, CreationOptions, SpatialRef};
use crate::{DataType, GeoTransform, MemBand, RasterError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Access mode a dataset was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Bands can only be read.
    ReadOnly,
    /// Bands can be modified; changes are written back on flush/close.
    Update,
}

/// A raster format driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// GeoTIFF, native reader/writer.
    GTiff,
}

impl Driver {
    /// Every registered driver.
    pub const ALL: [Driver; 1] = [Driver::GTiff];

    /// Short driver name (`GTiff`).
    pub fn short_name(self) -> &'static str {
        match self {
            Driver::GTiff => "GTiff",
        }
    }

    /// File extensions this driver writes, lowercase, without the dot.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Driver::GTiff => &["tif", "tiff"],
        }
    }

    /// Look a driver up by short name (case-insensitive).
    pub fn by_name(name: &str) -> Result<Self> {
        let wanted = if name.eq_ignore_ascii_case("GeoTIFF") { "GTiff" } else { name };
        Self::ALL
            .into_iter()
            .find(|d| d.short_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RasterError::UnknownDriver(name.to_string()))
    }

    /// Guess the output driver from a file name's extension.
    pub fn for_filename<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.extensions().contains(&ext.as_str()))
    }

    /// Find the driver that recognizes an existing file from its header.
    ///
    /// Returns `None` for missing or unreadable files.
    pub fn identify<P: AsRef<Path>>(path: P) -> Option<Self> {
        let mut header = [0u8; 4];
        File::open(path.as_ref()).ok()?.read_exact(&mut header).ok()?;
        match header {
            // Classic TIFF (42) and BigTIFF (43), both byte orders.
            [b'I', b'I', 42 | 43, 0] | [b'M', b'M', 0, 42 | 43] => Some(Driver::GTiff),
            _ => None,
        }
    }

    /// Create a new dataset of `bands` bands filled with zeros.
    ///
    /// Nothing is written to disk until the dataset is flushed or closed.
    pub fn create<P: AsRef<Path>, S: AsRef<str>>(
        self,
        path: P,
        width: usize,
        height: usize,
        bands: usize,
        data_type: DataType,
        creation_options: &[S],
    ) -> Result<Dataset> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        if bands != 1 {
            return Err(RasterError::Unsupported(format!(
                "{} driver creates single-band datasets only, {} requested",
                self.short_name(),
                bands
            )));
        }
        let options = CreationOptions::parse(creation_options)?;
        let path = path.as_ref().to_path_buf();
        info!(
            "creating {} dataset {} ({}x{}, {})",
            self.short_name(),
            path.display(),
            width,
            height,
            data_type
        );

        Ok(Dataset {
            path,
            driver: self,
            access: Access::Update,
            width,
            height,
            bands: vec![MemBand::new(width, height, data_type)],
            geo_transform: None,
            spatial_ref: SpatialRef::default(),
            options,
            dirty: true,
        })
    }

    /// Open an existing file with this driver.
    pub fn open<P: AsRef<Path>>(self, path: P, access: Access) -> Result<Dataset> {
        let path = path.as_ref().to_path_buf();
        let reader = BufReader::new(File::open(&path)?);
        let image = match self {
            Driver::GTiff => geotiff::decode(reader)?,
        };
        debug!(
            "opened {} ({} band(s), {:?})",
            path.display(),
            image.bands.len(),
            access
        );

        if access == Access::Update && image.bands.len() != 1 {
            return Err(RasterError::Unsupported(format!(
                "{} driver updates single-band datasets only, {} has {}",
                self.short_name(),
                path.display(),
                image.bands.len()
            )));
        }

        Ok(Dataset {
            path,
            driver: self,
            access,
            width: image.width,
            height: image.height,
            bands: image.bands,
            geo_transform: image.geo_transform,
            spatial_ref: image.spatial_ref,
            options: CreationOptions::default(),
            dirty: false,
        })
    }
}

/// An open raster dataset.
///
/// The handle owns its bands. Modifications are kept in memory and written
/// by [`Dataset::flush`] or [`Dataset::close`]. [`Dataset::discard`] or a
/// plain drop releases the handle without touching the file.
#[derive(Debug)]
pub struct Dataset {
    path: PathBuf,
    driver: Driver,
    access: Access,
    width: usize,
    height: usize,
    bands: Vec<MemBand>,
    geo_transform: Option<GeoTransform>,
    spatial_ref: SpatialRef,
    options: CreationOptions,
    dirty: bool,
}

impl Dataset {
    /// Open a file read-only with whichever driver recognizes it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_access(path, Access::ReadOnly)
    }

    /// Open a file for update with whichever driver recognizes it.
    pub fn open_update<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_access(path, Access::Update)
    }

    fn open_with_access<P: AsRef<Path>>(path: P, access: Access) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RasterError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: No such file or directory", path.display()),
            )));
        }
        let driver = Driver::identify(path).ok_or_else(|| RasterError::NotRecognized(path.to_path_buf()))?;
        driver.open(path, access)
    }

    /// Driver handling this dataset.
    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Band `n`, counting from 1.
    pub fn band(&self, n: usize) -> Result<&MemBand> {
        let count = self.bands.len();
        n.checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .ok_or(RasterError::BandOutOfRange { band: n, count })
    }

    /// Band `n` for writing, counting from 1. Marks the dataset modified.
    pub fn band_mut(&mut self, n: usize) -> Result<&mut MemBand> {
        self.require_update()?;
        let count = self.bands.len();
        let band = n
            .checked_sub(1)
            .and_then(|i| self.bands.get_mut(i))
            .ok_or(RasterError::BandOutOfRange { band: n, count })?;
        self.dirty = true;
        Ok(band)
    }

    /// Georeferencing, if any.
    pub fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    /// Replace the georeferencing of the dataset and all its bands.
    pub fn set_geo_transform(&mut self, geo_transform: Option<GeoTransform>) -> Result<()> {
        self.require_update()?;
        self.geo_transform = geo_transform;
        for band in &mut self.bands {
            band.set_geo_transform(geo_transform);
        }
        self.dirty = true;
        Ok(())
    }

    /// Projection keys.
    pub fn spatial_ref(&self) -> &SpatialRef {
        &self.spatial_ref
    }

    /// Replace the projection keys.
    pub fn set_spatial_ref(&mut self, spatial_ref: SpatialRef) -> Result<()> {
        self.require_update()?;
        self.spatial_ref = spatial_ref;
        self.dirty = true;
        Ok(())
    }

    /// Whether there are changes not yet written.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write pending changes to disk.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        self.require_update()?;
        let band = self.band(1)?;
        let writer = BufWriter::new(File::create(&self.path)?);
        match self.driver {
            Driver::GTiff => geotiff::encode(writer, band, self.geo_transform, &self.spatial_ref, self.options)?,
        }
        info!("wrote {}", self.path.display());
        self.dirty = false;
        Ok(())
    }

    /// Flush and release the dataset.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush();
        self.dirty = false;
        result
    }

    /// Release the dataset, dropping any pending changes.
    pub fn discard(mut self) {
        if self.is_dirty() {
            info!("discarding pending changes to {}", self.path.display());
        }
        self.dirty = false;
    }

    fn require_update(&self) -> Result<()> {
        match self.access {
            Access::Update => Ok(()),
            Access::ReadOnly => Err(RasterError::ReadOnly(self.path.clone())),
        }
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        if self.dirty {
            warn!(
                "{} dropped with unwritten changes, file left as it was",
                self.path.display()
            );
        }
    }
}
