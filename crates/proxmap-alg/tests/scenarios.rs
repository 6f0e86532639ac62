//! End-to-end proximity scenarios over in-memory bands.

use approx::assert_relative_eq;
use proxmap_alg::{
    compute_proximity, compute_proximity_with_options, DistUnits, EngineError, ProgressSink,
    ProximityOptions, DEFAULT_NODATA,
};
use proxmap_raster::{DataType, GeoTransform, MemBand, RasterBand, RasterError};

fn sources(width: usize, height: usize, cells: &[(usize, usize)]) -> MemBand {
    let mut band = MemBand::new(width, height, DataType::Byte);
    for &(col, row) in cells {
        band.set(col, row, 1.0).unwrap();
    }
    band
}

fn proximity(input: &MemBand, options: &[&str]) -> MemBand {
    let mut output = MemBand::new(input.width(), input.height(), DataType::Float32);
    compute_proximity_with_options(input, &mut output, options, None).unwrap();
    output
}

/// Exact distance to the nearest of `cells`, scaled per axis.
fn nearest(col: usize, row: usize, cells: &[(usize, usize)], sx: f64, sy: f64) -> f64 {
    cells
        .iter()
        .map(|&(c, r)| ((c as f64 - col as f64) * sx).hypot((r as f64 - row as f64) * sy))
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_corner_source_reaches_far_corner() {
    let output = proximity(&sources(4, 4, &[(0, 0)]), &[]);
    assert_eq!(output.get(0, 0), Some(0.0));
    assert_relative_eq!(output.get(3, 3).unwrap(), 18f64.sqrt() as f32 as f64);
    assert_relative_eq!(output.get(3, 0).unwrap(), 3.0);
}

#[test]
fn test_max_dist_masks_far_cells() {
    let output = proximity(&sources(10, 10, &[(4, 4)]), &["MAXDIST=2"]);
    assert_eq!(output.nodata(), Some(DEFAULT_NODATA));
    for row in 0..10 {
        for col in 0..10 {
            let expected = nearest(col, row, &[(4, 4)], 1.0, 1.0);
            let value = output.get(col, row).unwrap();
            if expected > 2.0 {
                assert_eq!(value, DEFAULT_NODATA, "cell ({col}, {row})");
            } else {
                assert_relative_eq!(value, expected, max_relative = 1e-6);
            }
        }
    }
}

#[test]
fn test_fixed_buffer_value() {
    let output = proximity(&sources(10, 10, &[(4, 4)]), &["FIXED_BUF_VAL=5", "MAXDIST=3"]);
    for row in 0..10 {
        for col in 0..10 {
            let expected = match nearest(col, row, &[(4, 4)], 1.0, 1.0) {
                d if d == 0.0 => 0.0,
                d if d <= 3.0 => 5.0,
                _ => DEFAULT_NODATA,
            };
            assert_eq!(output.get(col, row), Some(expected), "cell ({col}, {row})");
        }
    }
}

#[test]
fn test_input_nodata_is_excluded() {
    let values = vec![
        0.0, 0.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 9.0, 0.0, //
        0.0, 0.0, 0.0, 0.0, 0.0,
    ];
    let input = MemBand::from_vec(5, 3, DataType::Byte, values)
        .unwrap()
        .with_nodata(Some(9.0));

    let output = proximity(&input, &["VALUES=1,9", "USE_INPUT_NODATA=YES", "NODATA=-1"]);
    assert_eq!(output.get(1, 1), Some(0.0));
    assert_eq!(output.get(3, 1), Some(-1.0));
    assert_relative_eq!(output.get(4, 1).unwrap(), 3.0);

    // Without the flag the no-data cell is an ordinary source.
    let output = proximity(&input, &["VALUES=1,9", "NODATA=-1"]);
    assert_eq!(output.get(3, 1), Some(0.0));
    assert_relative_eq!(output.get(4, 1).unwrap(), 1.0);
}

#[test]
fn test_target_values_select_sources() {
    let input = MemBand::from_vec(5, 1, DataType::Byte, vec![2.0, 0.0, 0.0, 0.0, 3.0]).unwrap();
    let output = proximity(&input, &["VALUES=3"]);
    assert_eq!(output.data(), &[4.0, 3.0, 2.0, 1.0, 0.0]);
}

#[test]
fn test_fractional_target_values() {
    let input = MemBand::from_vec(3, 1, DataType::Float32, vec![0.5, 1.0, 0.0]).unwrap();
    let output = proximity(&input, &["VALUES=0.5"]);
    assert_eq!(output.data(), &[0.0, 1.0, 2.0]);
}

#[test]
fn test_geo_units_with_square_and_rectangular_pixels() {
    let cells = [(1, 2)];
    for (pw, ph) in [(30.0, -30.0), (10.0, -20.0)] {
        let input = sources(6, 5, &cells).with_geo_transform(Some(GeoTransform::new(
            1000.0, 5000.0, pw, ph,
        )));
        let output = proximity(&input, &["DISTUNITS=GEO"]);
        for row in 0..5 {
            for col in 0..6 {
                let expected = nearest(col, row, &cells, pw, -ph);
                assert_relative_eq!(output.get(col, row).unwrap(), expected, max_relative = 1e-6);
            }
        }
    }
}

#[test]
fn test_distance_grows_along_rays() {
    let output = proximity(&sources(11, 11, &[(5, 5)]), &[]);
    let row: Vec<f64> = (5..11).map(|col| output.get(col, 5).unwrap()).collect();
    let col: Vec<f64> = (0..=5).rev().map(|row| output.get(5, row).unwrap()).collect();
    for ray in [row, col] {
        assert!(ray.windows(2).all(|w| w[0] < w[1]), "{ray:?}");
    }
}

#[test]
fn test_runs_are_idempotent() {
    let input = sources(12, 9, &[(0, 0), (7, 3), (11, 8), (2, 6)]);
    let first = proximity(&input, &["MAXDIST=6"]);
    let second = proximity(&input, &["MAXDIST=6"]);
    assert_eq!(first.data(), second.data());
}

#[test]
fn test_two_sources_pick_the_nearer() {
    let cells = [(0, 0), (8, 8)];
    let output = proximity(&sources(9, 9, &cells), &[]);
    for row in 0..9 {
        for col in 0..9 {
            let expected = nearest(col, row, &cells, 1.0, 1.0);
            assert_relative_eq!(output.get(col, row).unwrap(), expected, max_relative = 1e-6);
        }
    }
}

#[test]
fn test_many_sources_never_underestimate() {
    let cells = [(1, 1), (13, 2), (6, 7), (0, 11), (14, 10), (9, 4)];
    let output = proximity(&sources(15, 12, &cells), &[]);
    for row in 0..12 {
        for col in 0..15 {
            let exact = nearest(col, row, &cells, 1.0, 1.0);
            assert!(output.get(col, row).unwrap() >= exact - 1e-5);
        }
    }
    for &(col, row) in &cells {
        assert_eq!(output.get(col, row), Some(0.0));
    }
}

#[test]
fn test_byte_output_clamps_nodata() {
    let input = sources(300, 1, &[(0, 0)]);
    let mut output = MemBand::new(300, 1, DataType::Byte);
    compute_proximity_with_options(&input, &mut output, &["MAXDIST=280"], None).unwrap();
    assert_eq!(output.nodata(), Some(255.0));
    assert_eq!(output.get(254, 0), Some(254.0));
    assert_eq!(output.get(255, 0), Some(255.0));
    assert_eq!(output.get(299, 0), Some(255.0));
}

#[test]
fn test_cancellation() {
    let input = sources(8, 8, &[(3, 3)]);
    let mut output = MemBand::new(8, 8, DataType::Float32);
    let mut calls = 0;
    let mut sink = |fraction: f64, _message: &str| {
        calls += 1;
        fraction < 0.25
    };
    let result = compute_proximity(
        &input,
        &mut output,
        &ProximityOptions::default(),
        Some(&mut sink as &mut dyn ProgressSink),
    );
    assert!(matches!(result, Err(EngineError::Cancelled)));
    assert!(calls > 1);
}

/// A band whose reads fail from a given row on.
struct FailingBand {
    fail_from: usize,
}

impl RasterBand for FailingBand {
    fn width(&self) -> usize {
        4
    }

    fn height(&self) -> usize {
        4
    }

    fn data_type(&self) -> DataType {
        DataType::Byte
    }

    fn nodata(&self) -> Option<f64> {
        None
    }

    fn read_row(&self, row: usize, buf: &mut [f64]) -> proxmap_raster::Result<()> {
        if row >= self.fail_from {
            return Err(RasterError::Io(std::io::Error::other("disk gone")));
        }
        buf.fill(0.0);
        Ok(())
    }
}

#[test]
fn test_read_failure_is_propagated() {
    let input = FailingBand { fail_from: 2 };
    let mut output = MemBand::new(4, 4, DataType::Float32);
    let result = compute_proximity(&input, &mut output, &ProximityOptions::default(), None);
    assert!(matches!(result, Err(EngineError::Io(RasterError::Io(_)))));
}

#[test]
fn test_dimension_mismatch() {
    let input = sources(4, 4, &[(0, 0)]);
    let mut output = MemBand::new(4, 5, DataType::Float32);
    let result = compute_proximity(&input, &mut output, &ProximityOptions::default(), None);
    assert!(matches!(
        result,
        Err(EngineError::DimensionMismatch {
            input_width: 4,
            input_height: 4,
            output_width: 4,
            output_height: 5,
        })
    ));
}

#[test]
fn test_invalid_option_leaves_output_untouched() {
    let input = sources(3, 3, &[(1, 1)]);
    let mut output = MemBand::filled(3, 3, DataType::Float32, 7.0);
    let result = compute_proximity_with_options(&input, &mut output, &["MAXDIST=-4"], None);
    assert!(matches!(result, Err(EngineError::InvalidOption { .. })));
    assert!(output.data().iter().all(|&v| v == 7.0));
    assert_eq!(output.nodata(), None);

    let result = compute_proximity_with_options(&input, &mut output, &["DISTUNITS=FEET"], None);
    assert!(matches!(result, Err(EngineError::InvalidOption { .. })));
}

#[test]
fn test_options_from_yaml() {
    let yaml = "values: [1, 2.5]\ndistunits: GEO\nmaxdist: 100\nuse_input_nodata: true\n";
    let options: ProximityOptions = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(options.target_values, vec![1.0, 2.5]);
    assert_eq!(options.dist_units, DistUnits::Geo);
    assert_eq!(options.max_dist, Some(100.0));
    assert!(options.use_input_nodata);
    assert_eq!(options.nodata, None);
    assert_eq!(options.fixed_buf_val, None);
}
