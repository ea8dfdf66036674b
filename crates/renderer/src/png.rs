//! PNG encoding for RGBA image data.
//!
//! Two encodings are produced:
//! - **Indexed PNG (color type 3)** when the image has at most 256 distinct
//!   colours. Classified heatmaps (land cover) always qualify.
//! - **RGBA PNG (color type 6)** otherwise.
//!
//! Use `create_png_auto` for automatic selection, or `create_png` for explicit
//! RGBA encoding.

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

const COLOR_TYPE_INDEXED: u8 = 3;
const COLOR_TYPE_RGBA: u8 = 6;

type Rgba = (u8, u8, u8, u8);

/// Create a PNG, indexed when the colours fit a palette, RGBA otherwise.
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    check_len(pixels.len(), width, height, 4)?;
    match extract_palette(pixels) {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices),
        None => create_png(pixels, width, height),
    }
}

/// Map each pixel to a palette index; `None` when there are too many colours.
fn extract_palette(pixels: &[u8]) -> Option<(Vec<Rgba>, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let key = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
        let index = match lookup.get(&key) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push((px[0], px[1], px[2], px[3]));
                lookup.insert(key, i);
                i
            }
        };
        indices.push(index);
    }
    Some((palette, indices))
}

/// Create an indexed PNG (color type 3) from palette and indices.
///
/// Alpha goes into a tRNS chunk when any palette entry is not opaque.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[Rgba],
    indices: &[u8],
) -> Result<Vec<u8>, String> {
    check_len(indices.len(), width, height, 1)?;

    let mut png = Vec::from(SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_INDEXED));

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height, 1)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Create a PNG image from RGBA pixel data (color type 6).
pub fn create_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>, String> {
    check_len(pixels.len(), width, height, 4)?;

    let mut png = Vec::from(SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, COLOR_TYPE_RGBA));
    let idat = deflate_scanlines(pixels, width, height, 4)
        .map_err(|e| format!("IDAT compression failed: {}", e))?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_len(len: usize, width: usize, height: usize, bytes_per_pixel: usize) -> Result<(), String> {
    let expected = width * height * bytes_per_pixel;
    if len != expected {
        return Err(format!(
            "pixel buffer has {} bytes, expected {} for {}x{}",
            len, expected, width, height
        ));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.extend_from_slice(&[0, 0, 0]); // compression, filter, interlace
    data
}

/// Write a PNG chunk: length, type, data, CRC over type + data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Prefix each scanline with filter type 0 and zlib-compress.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> std::io::Result<Vec<u8>> {
    let stride = width * bytes_per_pixel;
    let mut raw = Vec::with_capacity(height * (1 + stride));
    for row in data.chunks_exact(stride.max(1)).take(height) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(&raw)?;
    encoder.finish()
}
