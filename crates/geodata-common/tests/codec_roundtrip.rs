//! Lossless transfer of every supported dtype, including edge values.

use geodata_common::codec::{decode, encode};
use geodata_common::{Dtype, RasterData, RasterGrid, RasterProfile};
use ndarray::Array2;

fn profile(dtype: Dtype, rows: usize, cols: usize) -> RasterProfile {
    RasterProfile {
        crs: "EPSG:4326".to_string(),
        transform: [-13.1, 0.004166, 0.0, 17.9, 0.0, -0.004166],
        dtype,
        nodata: None,
        driver: "GTiff".to_string(),
        count: 1,
        width: cols,
        height: rows,
    }
}

fn sample(dtype: Dtype, rows: usize, cols: usize) -> RasterData {
    let n = rows * cols;
    let idx: Vec<usize> = (0..n).collect();
    let shape = (rows, cols);
    match dtype {
        Dtype::UInt8 => RasterData::UInt8(
            Array2::from_shape_vec(shape, idx.iter().map(|i| (i * 37 % 256) as u8).collect())
                .unwrap(),
        ),
        Dtype::Int8 => RasterData::Int8(
            Array2::from_shape_vec(shape, idx.iter().map(|i| (*i as i64 * 53 % 256 - 128) as i8).collect())
                .unwrap(),
        ),
        Dtype::UInt16 => {
            let mut v: Vec<u16> = idx.iter().map(|i| (*i as u16).wrapping_mul(977)).collect();
            v[0] = u16::MAX;
            RasterData::UInt16(Array2::from_shape_vec(shape, v).unwrap())
        }
        Dtype::Int16 => {
            let mut v: Vec<i16> = idx.iter().map(|i| (*i as i16).wrapping_mul(-311)).collect();
            v[0] = i16::MIN;
            RasterData::Int16(Array2::from_shape_vec(shape, v).unwrap())
        }
        Dtype::UInt32 => {
            let mut v: Vec<u32> = idx.iter().map(|i| (*i as u32).wrapping_mul(2_654_435_761)).collect();
            v[0] = u32::MAX;
            RasterData::UInt32(Array2::from_shape_vec(shape, v).unwrap())
        }
        Dtype::Int32 => {
            let mut v: Vec<i32> = idx.iter().map(|i| (*i as i32).wrapping_mul(-40_503)).collect();
            v[0] = i32::MIN;
            RasterData::Int32(Array2::from_shape_vec(shape, v).unwrap())
        }
        Dtype::Float32 => {
            let mut v: Vec<f32> = idx.iter().map(|i| *i as f32 * 0.1 - 3.3).collect();
            v[0] = f32::MIN_POSITIVE;
            v[1] = -0.0;
            RasterData::Float32(Array2::from_shape_vec(shape, v).unwrap())
        }
        Dtype::Float64 => {
            let mut v: Vec<f64> = idx.iter().map(|i| (*i as f64).sqrt() * 1e-7).collect();
            v[0] = f64::MAX;
            RasterData::Float64(Array2::from_shape_vec(shape, v).unwrap())
        }
    }
}

#[test]
fn every_dtype_survives_transfer() {
    for dtype in Dtype::ALL {
        let (rows, cols) = (7, 5);
        let grid = RasterGrid::new(sample(dtype, rows, cols), profile(dtype, rows, cols)).unwrap();

        let payload = encode(&grid);
        let decoded = decode(&payload).unwrap();

        assert_eq!(decoded.shape(), (rows, cols), "{dtype}");
        assert_eq!(decoded.data().dtype(), dtype);
        // byte comparison also covers -0.0 and NaN patterns
        assert_eq!(decoded.data().to_le_bytes(), grid.data().to_le_bytes(), "{dtype}");
        assert_eq!(decoded.profile(), grid.profile());
    }
}

#[test]
fn decoded_byte_length_matches_shape_and_itemsize() {
    use base64::Engine;

    for dtype in Dtype::ALL {
        let grid = RasterGrid::new(sample(dtype, 3, 4), profile(dtype, 3, 4)).unwrap();
        let payload = encode(&grid);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&payload.base64_data)
            .unwrap();
        assert_eq!(bytes.len(), 3 * 4 * dtype.item_size());
    }
}

#[test]
fn empty_grid_roundtrips() {
    let grid = RasterGrid::new(
        RasterData::Float32(Array2::zeros((0, 0))),
        profile(Dtype::Float32, 0, 0),
    )
    .unwrap();
    let payload = encode(&grid);
    assert_eq!(payload.base64_data, "");
    let decoded = decode(&payload).unwrap();
    assert!(decoded.data().is_empty());
}
