//! Two-pass proximity (distance-to-feature) transform.
//!
//! Every cell carries a pointer to its tentative nearest source. Pass 1 walks
//! rows top to bottom, pass 2 bottom to top; each row is scanned left to
//! right, then right to left. A cell adopts the pointer of an already visited
//! neighbor when that source is closer, and its distance is always the exact
//! Euclidean distance to the source it points at.
//!
//! For a single source the result is exact. With many sources the pointer
//! propagation can settle on a source that is not the true nearest one in
//! degenerate layouts, so distances are an upper bound that is exact in the
//! overwhelming majority of cells.

use crate::progress::ProgressSink;
use crate::{DistUnits, EngineError, ProximityOptions, Result};
use proxmap_raster::{RasterBand, RasterBandMut};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Output no-data used when neither the options nor the output band set one.
pub const DEFAULT_NODATA: f64 = 65535.0;

/// Work buffer value of a cell no source has reached (within range) yet.
const UNSET: f64 = -1.0;

/// Stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    SweepingForward,
    SweepingBackward,
    Finalized,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::NotStarted => "starting",
            Phase::SweepingForward => "top-down sweep",
            Phase::SweepingBackward => "bottom-up sweep",
            Phase::Finalized => "done",
        })
    }
}

/// Compute a proximity map of `input` into `output`.
///
/// Cells whose value is in `options.target_values` (or any non-zero value
/// when that list is empty) are sources and receive 0. Every other cell
/// receives the distance to the nearest source, `options.fixed_buf_val` if
/// set, or the output no-data value when no source lies within
/// `options.max_dist`. With `use_input_nodata`, input no-data cells are never
/// sources and always receive no-data.
///
/// Each output row is written exactly once and the output is never read.
/// On [`EngineError::Cancelled`] the output is partially written and must be
/// discarded.
pub fn compute_proximity(
    input: &dyn RasterBand,
    output: &mut dyn RasterBandMut,
    options: &ProximityOptions,
    progress: Option<&mut dyn ProgressSink>,
) -> Result<()> {
    let (width, height) = input.size();
    if output.size() != (width, height) {
        return Err(EngineError::DimensionMismatch {
            input_width: width,
            input_height: height,
            output_width: output.width(),
            output_height: output.height(),
        });
    }
    options.validate()?;

    let mut progress = Progress::new(progress);
    let mut phase = Phase::NotStarted;
    progress.report(0.0, phase)?;

    let (scale_x, scale_y) = distance_scale(input, options.dist_units);
    let nodata = output
        .data_type()
        .convert(options.nodata.or(output.nodata()).unwrap_or(DEFAULT_NODATA));
    output.set_nodata(Some(nodata))?;

    info!(
        "computing proximity for {}x{} band ({}, maxdist {:?}, {} target value(s))",
        width,
        height,
        options.dist_units,
        options.max_dist,
        options.target_values.len()
    );

    if width == 0 || height == 0 {
        progress.report(1.0, Phase::Finalized)?;
        return Ok(());
    }

    let mut sweep = Sweep::new(width, height, scale_x, scale_y, options, input.nodata());
    let mut work = vec![UNSET; width * height];
    let mut src = vec![0.0; width];

    phase = Phase::SweepingForward;
    let started = Instant::now();
    for row in 0..height {
        input.read_row(row, &mut src)?;
        let line = &mut work[row * width..(row + 1) * width];
        sweep.process_line(&src, row, true, line);
        sweep.process_line(&src, row, false, line);
        progress.report(0.5 * (row + 1) as f64 / height as f64, phase)?;
    }
    debug!("{} finished in {:?}", phase, started.elapsed());

    phase = Phase::SweepingBackward;
    let started = Instant::now();
    sweep.reset();
    let mut out = vec![0.0; width];
    for row in (0..height).rev() {
        input.read_row(row, &mut src)?;
        let line = &mut work[row * width..(row + 1) * width];
        sweep.process_line(&src, row, true, line);
        sweep.process_line(&src, row, false, line);

        finalize_line(line, &mut out, nodata, options.fixed_buf_val);
        output.write_row(row, &out)?;
        progress.report(0.5 + 0.5 * (height - row) as f64 / height as f64, phase)?;
    }
    debug!("{} finished in {:?}", phase, started.elapsed());

    progress.report(1.0, Phase::Finalized)?;
    Ok(())
}

/// Parse `KEY=VALUE` options, then run [`compute_proximity`].
///
/// Options are validated before either band is touched.
pub fn compute_proximity_with_options<S: AsRef<str>>(
    input: &dyn RasterBand,
    output: &mut dyn RasterBandMut,
    options: &[S],
    progress: Option<&mut dyn ProgressSink>,
) -> Result<()> {
    let options = ProximityOptions::from_strings(options)?;
    compute_proximity(input, output, &options, progress)
}

/// Ground length of a column step and a row step.
fn distance_scale(input: &dyn RasterBand, units: DistUnits) -> (f64, f64) {
    if units == DistUnits::Pixel {
        return (1.0, 1.0);
    }
    let Some(gt) = input.geo_transform() else {
        warn!("input band has no geotransform, GEO distances fall back to pixel units");
        return (1.0, 1.0);
    };
    let (sx, sy) = gt.pixel_size();
    if !(sx > 0.0 && sy > 0.0 && sx.is_finite() && sy.is_finite()) {
        warn!("degenerate pixel size {}x{}, GEO distances fall back to pixel units", sx, sy);
        return (1.0, 1.0);
    }
    if !gt.is_square() {
        warn!("pixels not square ({} x {}), distances scaled per axis", sx, sy);
    }
    if gt.has_rotation() {
        warn!("rotated geotransform, distances measured along the pixel grid axes");
    }
    (sx, sy)
}

/// Map the work buffer of one row to output values.
fn finalize_line(work: &[f64], out: &mut [f64], nodata: f64, fixed_buf_val: Option<f64>) {
    for (dst, &dist) in out.iter_mut().zip(work) {
        *dst = if dist < 0.0 {
            nodata
        } else if dist > 0.0 {
            fixed_buf_val.unwrap_or(dist)
        } else {
            0.0
        };
    }
}

/// Row sweep state: nearest-source pointers for the row being processed.
struct Sweep<'a> {
    width: usize,
    scale_x: f64,
    scale_y: f64,
    max_dist_sq: f64,
    search_bound_sq: f64,
    targets: &'a [f64],
    input_nodata: Option<f64>,
    nearest: Vec<Option<(usize, usize)>>,
}

impl<'a> Sweep<'a> {
    fn new(
        width: usize,
        height: usize,
        scale_x: f64,
        scale_y: f64,
        options: &'a ProximityOptions,
        input_nodata: Option<f64>,
    ) -> Self {
        let span = width as f64 * scale_x;
        // Without MAXDIST, no in-grid distance reaches the bound.
        let reach = options.max_dist.unwrap_or(span + height as f64 * scale_y);
        let bound = reach.max(span);

        Self {
            width,
            scale_x,
            scale_y,
            max_dist_sq: options.max_dist.map_or(f64::INFINITY, |d| d * d),
            search_bound_sq: 2.0 * bound * bound,
            targets: &options.target_values,
            input_nodata: input_nodata.filter(|_| options.use_input_nodata),
            nearest: vec![None; width],
        }
    }

    fn reset(&mut self) {
        self.nearest.fill(None);
    }

    fn is_nodata(&self, value: f64) -> bool {
        match self.input_nodata {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    fn is_target(&self, value: f64) -> bool {
        if value.is_nan() || self.is_nodata(value) {
            return false;
        }
        if self.targets.is_empty() {
            value != 0.0
        } else {
            self.targets.contains(&value)
        }
    }

    fn dist_sq(&self, col: usize, row: usize, (nx, ny): (usize, usize)) -> f64 {
        let dx = (nx as f64 - col as f64) * self.scale_x;
        let dy = (ny as f64 - row as f64) * self.scale_y;
        dx * dx + dy * dy
    }

    /// Try the pointer held by neighbor `from` as a candidate for `col`.
    fn adopt(&mut self, col: usize, row: usize, from: Option<usize>, best: &mut f64) {
        let Some(candidate) = from.and_then(|i| self.nearest[i]) else {
            return;
        };
        let d = self.dist_sq(col, row, candidate);
        if d < *best {
            *best = d;
            self.nearest[col] = Some(candidate);
        }
    }

    /// One scan over a row, updating pointers and the row's work values.
    fn process_line(&mut self, src: &[f64], row: usize, forward: bool, work: &mut [f64]) {
        let width = self.width;
        for step in 0..width {
            let col = if forward { step } else { width - 1 - step };

            if self.is_target(src[col]) {
                work[col] = 0.0;
                self.nearest[col] = Some((col, row));
                continue;
            }

            let mut best = self.search_bound_sq;

            // Pointer carried in this column from the previous row or scan.
            if let Some(carried) = self.nearest[col] {
                let d = self.dist_sq(col, row, carried);
                if d < best {
                    best = d;
                } else {
                    self.nearest[col] = None;
                }
            }

            let (behind, ahead) = if forward {
                (col.checked_sub(1), (col + 1 < width).then_some(col + 1))
            } else {
                ((col + 1 < width).then_some(col + 1), col.checked_sub(1))
            };
            self.adopt(col, row, behind, &mut best);
            self.adopt(col, row, ahead, &mut best);

            if self.nearest[col].is_some()
                && !self.is_nodata(src[col])
                && best <= self.max_dist_sq
                && (work[col] < 0.0 || best < work[col] * work[col])
            {
                work[col] = best.sqrt();
            }
        }
    }
}

/// Clamped, monotonic progress forwarding with cancellation.
struct Progress<'a> {
    sink: Option<&'a mut dyn ProgressSink>,
    last: f64,
}

impl<'a> Progress<'a> {
    fn new(sink: Option<&'a mut dyn ProgressSink>) -> Self {
        Self { sink, last: 0.0 }
    }

    fn report(&mut self, fraction: f64, phase: Phase) -> Result<()> {
        let Some(sink) = self.sink.as_deref_mut() else {
            return Ok(());
        };
        let fraction = fraction.clamp(self.last, 1.0);
        self.last = fraction;
        if sink.report(fraction, &phase.to_string()) {
            Ok(())
        } else {
            debug!("cancelled during {}", phase);
            Err(EngineError::Cancelled)
        }
    }
}
