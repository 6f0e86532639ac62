//! Integration tests for proxmap-raster against files on disk.

use approx::assert_relative_eq;
use proxmap_raster::{
    DataType, Dataset, Driver, GeoTransform, RasterBand, RasterBandMut, RasterError, SpatialRef,
};
use tempfile::TempDir;

fn no_options() -> &'static [&'static str] {
    &[]
}

#[test]
fn test_create_close_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("grid.tif");
    let gt = GeoTransform::new(500000.0, 4100000.0, 30.0, -30.0);

    let mut ds = Driver::GTiff
        .create(&path, 4, 3, 1, DataType::Int16, &["COMPRESS=DEFLATE"])
        .unwrap();
    ds.set_geo_transform(Some(gt)).unwrap();
    {
        let band = ds.band_mut(1).unwrap();
        band.set_nodata(Some(-32768.0)).unwrap();
        for row in 0..3 {
            let values: Vec<f64> = (0..4).map(|col| (row * 4 + col) as f64 - 5.0).collect();
            band.write_row(row, &values).unwrap();
        }
    }
    ds.close().unwrap();

    assert_eq!(Driver::identify(&path), Some(Driver::GTiff));

    let ds = Dataset::open(&path).unwrap();
    assert_eq!((ds.width(), ds.height(), ds.band_count()), (4, 3, 1));
    let band = ds.band(1).unwrap();
    assert_eq!(band.data_type(), DataType::Int16);
    assert_eq!(band.nodata(), Some(-32768.0));

    let mut row = vec![0.0; 4];
    band.read_row(2, &mut row).unwrap();
    assert_eq!(row, vec![3.0, 4.0, 5.0, 6.0]);

    let read_gt = band.geo_transform().expect("georeferencing");
    assert_relative_eq!(read_gt.origin_x, 500000.0);
    assert_relative_eq!(read_gt.origin_y, 4100000.0);
    assert_eq!(read_gt.pixel_size(), (30.0, 30.0));
}

#[test]
fn test_projection_keys_are_copied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("utm.tif");
    let srs = SpatialRef {
        // Projected model, pixel-is-area, EPSG:32611.
        key_directory: vec![1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32611],
        double_params: Vec::new(),
        ascii_params: Some("WGS 84 / UTM zone 11N|".to_string()),
    };

    let mut ds = Driver::GTiff
        .create(&path, 2, 2, 1, DataType::Byte, no_options())
        .unwrap();
    ds.set_geo_transform(Some(GeoTransform::new(0.0, 0.0, 1.0, -1.0))).unwrap();
    ds.set_spatial_ref(srs.clone()).unwrap();
    ds.close().unwrap();

    let ds = Dataset::open(&path).unwrap();
    assert_eq!(ds.spatial_ref(), &srs);
}

#[test]
fn test_update_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("update.tif");
    Driver::GTiff
        .create(&path, 3, 1, 1, DataType::Float32, no_options())
        .unwrap()
        .close()
        .unwrap();

    let mut ds = Dataset::open_update(&path).unwrap();
    ds.band_mut(1).unwrap().write_row(0, &[0.25, 0.5, 0.75]).unwrap();
    ds.close().unwrap();

    let ds = Dataset::open(&path).unwrap();
    assert_eq!(ds.band(1).unwrap().data(), &[0.25, 0.5, 0.75]);
}

#[test]
fn test_unclosed_changes_leave_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.tif");
    Driver::GTiff
        .create(&path, 3, 1, 1, DataType::Int16, &["COMPRESS=LZW"])
        .unwrap()
        .close()
        .unwrap();
    let before = std::fs::read(&path).unwrap();

    let mut ds = Dataset::open_update(&path).unwrap();
    ds.band_mut(1).unwrap().write_row(0, &[7.0, 8.0, 9.0]).unwrap();
    assert!(ds.is_dirty());
    ds.discard();

    let mut ds = Dataset::open_update(&path).unwrap();
    ds.band_mut(1).unwrap().write_row(0, &[1.0, 2.0, 3.0]).unwrap();
    drop(ds);

    assert_eq!(std::fs::read(&path).unwrap(), before);

    let never_closed = dir.path().join("never.tif");
    drop(Driver::GTiff.create(&never_closed, 2, 2, 1, DataType::Byte, no_options()).unwrap());
    assert!(!never_closed.exists());
}

#[test]
fn test_read_only_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ro.tif");
    Driver::GTiff
        .create(&path, 1, 1, 1, DataType::Byte, no_options())
        .unwrap()
        .close()
        .unwrap();

    let mut ds = Dataset::open(&path).unwrap();
    assert!(matches!(ds.band_mut(1), Err(RasterError::ReadOnly(_))));
    assert!(matches!(ds.set_geo_transform(None), Err(RasterError::ReadOnly(_))));
}

#[test]
fn test_unrecognized_and_missing_files() {
    let dir = TempDir::new().unwrap();
    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "not a raster").unwrap();

    assert_eq!(Driver::identify(&text), None);
    assert!(matches!(Dataset::open(&text), Err(RasterError::NotRecognized(_))));
    assert!(matches!(
        Dataset::open(dir.path().join("missing.tif")),
        Err(RasterError::Io(_))
    ));
}
