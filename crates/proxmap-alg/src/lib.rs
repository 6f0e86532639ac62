//! # proxmap-alg
//!
//! Proximity (distance-to-feature) transform over raster bands.
//!
//! For every cell of an input band, the engine computes the distance to the
//! nearest "source" cell, i.e. a cell whose value is in a target set:
//! - distances in pixel steps or in georeferenced units
//! - an optional maximum distance, beyond which cells get no-data
//! - an optional fixed "buffer" value written instead of the distance
//! - input no-data cells optionally excluded from both sides
//!
//! ## Example
//!
//! ```
//! use proxmap_alg::{compute_proximity_with_options, NoProgress};
//! use proxmap_raster::{DataType, MemBand};
//!
//! let mut input = MemBand::new(4, 4, DataType::Byte);
//! input.set(0, 0, 1.0)?;
//! let mut output = MemBand::new(4, 4, DataType::Float32);
//!
//! compute_proximity_with_options(&input, &mut output, &["MAXDIST=10"], Some(&mut NoProgress))?;
//! assert_eq!(output.get(3, 0), Some(3.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod options;
mod progress;
mod proximity;

pub use error::EngineError;
pub use options::{DistUnits, ProximityOptions};
pub use progress::{NoProgress, ProgressSink};
pub use proximity::{compute_proximity, compute_proximity_with_options, DEFAULT_NODATA};

/// Result type for proximity computations.
pub type Result<T> = std::result::Result<T, EngineError>;
