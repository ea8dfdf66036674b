//! Test data generators for synthetic raster bands.
//!
//! These generators create predictable, verifiable patterns so that tests
//! can check exactly what a reader or renderer produced.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// This makes it easy to verify that data is being read/written correctly
/// by checking that grid[row][col] == col * 1000 + row.
///
/// # Returns
///
/// A `Vec<f32>` in row-major order (row 0 first, then row 1, etc.)
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// MODIS IGBP class codes that occur in the region (barren, grassland,
/// open shrubland, savanna, cropland, water).
pub const LANDCOVER_CLASSES: [u8; 6] = [16, 10, 7, 9, 12, 17];

/// Creates a land-cover style grid of class codes.
///
/// Classes cycle through [`LANDCOVER_CLASSES`] in row-major order, so
/// `grid[i] == LANDCOVER_CLASSES[i % 6]`.
pub fn create_landcover_grid(width: usize, height: usize) -> Vec<u8> {
    (0..width * height)
        .map(|i| LANDCOVER_CLASSES[i % LANDCOVER_CLASSES.len()])
        .collect()
}

/// Creates an annual precipitation grid in mm.
///
/// Values increase southwards from ~50 mm to ~450 mm, with a small
/// deterministic perturbation derived from `seed`.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let base = 50.0 + 400.0 * row as f32 / height.max(1) as f32;
        for _ in 0..width {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let jitter = ((state >> 16) % 200) as f32 / 10.0 - 10.0;
            data.push((base + jitter).max(0.0));
        }
    }
    data
}

/// Creates a population density grid (people/km²) stored as i16.
pub fn create_population_grid(width: usize, height: usize) -> Vec<i16> {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let d = ((col as f32 - cx).powi(2) + (row as f32 - cy).powi(2)).sqrt();
            data.push((500.0 / (1.0 + d)) as i16);
        }
    }
    data
}

/// Replaces every `stride`-th cell (starting at 0) with `nodata`.
pub fn with_nodata<T: Copy>(mut data: Vec<T>, stride: usize, nodata: T) -> Vec<T> {
    if stride == 0 {
        return data;
    }
    for value in data.iter_mut().step_by(stride) {
        *value = nodata;
    }
    data
}

/// Creates a constant f32 grid.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}
