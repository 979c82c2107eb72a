//! Reads the numbered SVG files and renders them to RGBA bitmaps

use crate::error::*;
use crate::pattern::FramePattern;
use crate::progress::ProgressReporter;
use imgref::*;
use resvg::tiny_skia;
use rgb::RGBA8;
use std::io;

/// Avoids pathological allocations from huge or broken `width`/`height` attributes
pub const MAX_DIMENSION: u32 = 16_384;

/// What to load: `count` files starting at `start`, rendered at `scale`
pub struct FrameSource<'a> {
    pub pattern: &'a FramePattern,
    pub start: i64,
    pub count: usize,
    pub scale: f32,
}

/// Rasterizes every frame, in order.
///
/// The first missing file stops the whole run with `Error::NotFound`.
pub fn load_frames(src: &FrameSource<'_>, reporter: &mut dyn ProgressReporter) -> CatResult<Vec<ImgVec<RGBA8>>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let mut frames = Vec::new();
    for index in (src.start..).take(src.count) {
        let path = src.pattern.path(index);
        reporter.reading(&path);

        let data = std::fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.clone()),
            _ => Error::Io(err),
        })?;

        options.resources_dir = path.parent().map(|dir| dir.to_path_buf());
        let image = rasterize_svg(&data, src.scale, &options).map_err(|err| match err {
            RasterError::Svg(err) => Error::Svg(path.clone(), err),
            RasterError::Size(msg) => Error::InvalidArgument(format!("{}: {}", path.display(), msg)),
        })?;

        reporter.frame_loaded(index, &path, image.width(), image.height());
        frames.push(image);
        if !reporter.increase() {
            return Err(Error::Aborted);
        }
    }
    Ok(frames)
}

#[derive(Debug)]
pub enum RasterError {
    Svg(usvg::Error),
    Size(String),
}

/// Renders one SVG document to straight (not premultiplied) RGBA.
///
/// The bitmap is the SVG's own size times `scale`, rounded up.
pub fn rasterize_svg(data: &[u8], scale: f32, options: &usvg::Options<'_>) -> Result<ImgVec<RGBA8>, RasterError> {
    let tree = usvg::Tree::from_data(data, options).map_err(RasterError::Svg)?;
    let size = tree.size();
    let width = scaled_dimension(size.width(), scale)?;
    let height = scaled_dimension(size.height(), scale)?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RasterError::Size(format!("can't allocate {}x{} pixmap", width, height)))?;
    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let pixels = pixmap.pixels().iter().map(|px| {
        let c = px.demultiply();
        RGBA8::new(c.red(), c.green(), c.blue(), c.alpha())
    }).collect();
    Ok(ImgVec::new(pixels, width as usize, height as usize))
}

fn scaled_dimension(len: f32, scale: f32) -> Result<u32, RasterError> {
    let px = (len * scale).ceil();
    if !px.is_finite() || px <= 0. {
        return Err(RasterError::Size(format!("svg has invalid size {} at scale {}", len, scale)));
    }
    if px > MAX_DIMENSION as f32 {
        return Err(RasterError::Size(format!("svg raster size {} is too large (max {})", px, MAX_DIMENSION)));
    }
    Ok((px as u32).max(1))
}
