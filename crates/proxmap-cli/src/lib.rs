//! # proxmap-cli
//!
//! Command-line front end for the proximity engine: argument parsing, YAML
//! configuration, destination dataset setup and terminal progress.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use proxmap_alg::{compute_proximity, ProgressSink, ProximityOptions};
use proxmap_raster::{Access, DataType, Dataset, Driver, RasterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Generate a raster proximity map.
#[derive(Debug, Parser)]
#[command(name = "proxmap")]
#[command(author, version, about = "Compute a raster proximity (distance-to-feature) map", long_about = None)]
pub struct Args {
    /// Source raster
    pub src: PathBuf,

    /// Destination raster, updated in place if it already exists
    pub dst: PathBuf,

    /// Source band (1-based)
    #[arg(long, default_value_t = 1)]
    pub srcband: usize,

    /// Destination band (1-based) when updating an existing file
    #[arg(long, default_value_t = 1)]
    pub dstband: usize,

    /// Output driver short name, guessed from the extension if omitted
    #[arg(short = 'f', long = "of", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Creation option for a new destination (repeatable)
    #[arg(long = "co", value_name = "NAME=VALUE")]
    pub creation_options: Vec<String>,

    /// Pixel type of a new destination [default: Float32]
    #[arg(long = "ot", value_name = "TYPE", value_parser = parse_data_type)]
    pub output_type: Option<DataType>,

    /// Comma-separated target pixel values
    #[arg(long, value_name = "N,N,...")]
    pub values: Option<String>,

    /// Distance units: PIXEL or GEO
    #[arg(long)]
    pub distunits: Option<String>,

    /// Maximum distance to search
    #[arg(long, allow_negative_numbers = true)]
    pub maxdist: Option<String>,

    /// Output no-data value
    #[arg(long, allow_negative_numbers = true)]
    pub nodata: Option<String>,

    /// Treat input no-data cells as neither sources nor measured (YES/NO)
    #[arg(long, value_name = "YES|NO")]
    pub use_input_nodata: Option<String>,

    /// Write this value instead of the distance for cells within range
    #[arg(long, allow_negative_numbers = true)]
    pub fixed_buf_val: Option<String>,

    /// YAML file with default options; flags override it
    #[arg(long, value_name = "FILE.yaml")]
    pub config: Option<PathBuf>,

    /// Suppress the progress bar and informational logging
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_data_type(name: &str) -> std::result::Result<DataType, String> {
    name.parse().map_err(|e: RasterError| e.to_string())
}

impl Args {
    /// Merge the configuration file (if any) with the algorithm flags.
    pub fn options(&self, config: &Config) -> Result<ProximityOptions> {
        let mut options = config.proximity.clone();
        let flags = [
            ("VALUES", &self.values),
            ("DISTUNITS", &self.distunits),
            ("MAXDIST", &self.maxdist),
            ("NODATA", &self.nodata),
            ("USE_INPUT_NODATA", &self.use_input_nodata),
            ("FIXED_BUF_VAL", &self.fixed_buf_val),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                options.set(key, value)?;
            }
        }
        options.validate()?;
        Ok(options)
    }
}

/// Settings loaded from `--config`.
///
/// Algorithm options sit at the top level next to the output settings:
///
/// ```yaml
/// values: [1, 2]
/// distunits: GEO
/// maxdist: 500
/// output_type: UInt16
/// creation_options: [COMPRESS=LZW]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Algorithm options.
    #[serde(flatten)]
    pub proximity: ProximityOptions,
    /// Pixel type of a new destination.
    pub output_type: Option<String>,
    /// Output driver short name.
    pub format: Option<String>,
    /// Creation options for a new destination.
    pub creation_options: Vec<String>,
}

impl Config {
    /// Load a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

/// Run one proximity computation as described by `args`.
pub fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let options = args.options(&config).context("Invalid proximity options")?;

    let src = Dataset::open(&args.src)
        .with_context(|| format!("Unable to open {}", args.src.display()))?;
    let src_band = src
        .band(args.srcband)
        .with_context(|| format!("Unable to read band {} of {}", args.srcband, args.src.display()))?;

    let (mut dst, dst_band) = open_destination(args, &config, &src)?;

    let started = Instant::now();
    let mut bar = (!args.quiet).then(BarProgress::new);
    let result = compute_proximity(
        src_band,
        dst.band_mut(dst_band)?,
        &options,
        bar.as_mut().map(|bar| bar as &mut dyn ProgressSink),
    );
    if let Some(bar) = bar {
        bar.finish();
    }
    if let Err(e) = result {
        dst.discard();
        return Err(e).context("Proximity computation failed");
    }

    dst.close()
        .with_context(|| format!("Failed to write {}", args.dst.display()))?;
    info!("wrote {} in {:.2?}", args.dst.display(), started.elapsed());
    Ok(())
}

/// Open the destination for update if a driver recognizes it, otherwise
/// create it from the source's size and georeferencing.
fn open_destination(args: &Args, config: &Config, src: &Dataset) -> Result<(Dataset, usize)> {
    if let Some(driver) = Driver::identify(&args.dst) {
        let dst = driver
            .open(&args.dst, Access::Update)
            .with_context(|| format!("Unable to open {} for update", args.dst.display()))?;
        info!("updating band {} of existing {}", args.dstband, args.dst.display());
        return Ok((dst, args.dstband));
    }

    let driver = match args.format.as_ref().or(config.format.as_ref()) {
        Some(name) => Driver::by_name(name)?,
        None => Driver::for_filename(&args.dst).unwrap_or(Driver::GTiff),
    };
    let data_type = match (args.output_type, &config.output_type) {
        (Some(data_type), _) => data_type,
        (None, Some(name)) => name.parse()?,
        (None, None) => DataType::Float32,
    };
    let creation_options: Vec<&String> = config
        .creation_options
        .iter()
        .chain(&args.creation_options)
        .collect();

    let mut dst = driver
        .create(&args.dst, src.width(), src.height(), 1, data_type, &creation_options)
        .with_context(|| format!("Unable to create {}", args.dst.display()))?;
    dst.set_geo_transform(src.geo_transform())?;
    dst.set_spatial_ref(src.spatial_ref().clone())?;
    Ok((dst, 1))
}

/// Terminal progress bar fed by the engine.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    const STEPS: u64 = 1000;

    fn new() -> Self {
        let bar = ProgressBar::new(Self::STEPS);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style.progress_chars("=> "));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarProgress {
    fn report(&mut self, fraction: f64, message: &str) -> bool {
        self.bar.set_position((fraction * Self::STEPS as f64).round() as u64);
        self.bar.set_message(message.to_string());
        true
    }
}
