//! SVG to PNG rasterisation through resvg.

use crate::png::create_png;
use crate::RenderError;

/// Rasterise an SVG document at its intrinsic size and encode it as PNG.
///
/// Text is only drawn when fonts are available to usvg; shapes always are.
pub fn svg_to_png(svg: &str) -> Result<Vec<u8>, RenderError> {
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Svg(e.to_string()))?;

    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RenderError::InvalidDimensions {
        width: width as usize,
        height: height as usize,
    })?;

    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    // charts carry an opaque background, so premultiplied data equals straight RGBA
    create_png(pixmap.data(), width as usize, height as usize).map_err(RenderError::Encode)
}
