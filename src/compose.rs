//! Puts every frame on a same-sized canvas

use imgref::*;
use rgb::RGBA8;

/// Largest width and largest height among the frames.
///
/// `None` if there are no frames.
pub fn canvas_size(frames: &[ImgVec<RGBA8>]) -> Option<(usize, usize)> {
    frames.iter().map(|f| (f.width(), f.height())).reduce(|(w, h), (fw, fh)| (w.max(fw), h.max(fh)))
}

/// Where the top-left corner of a `frame`-sized image goes to be centered on `canvas`.
///
/// Odd leftovers go to the right/bottom.
pub fn paste_offset((frame_w, frame_h): (usize, usize), (canvas_w, canvas_h): (usize, usize)) -> (usize, usize) {
    (canvas_w.saturating_sub(frame_w) / 2, canvas_h.saturating_sub(frame_h) / 2)
}

/// A new `canvas`-sized image filled with `background`, with `frame` centered on it
pub fn composite(frame: ImgRef<'_, RGBA8>, canvas: (usize, usize), background: RGBA8) -> ImgVec<RGBA8> {
    let (canvas_w, canvas_h) = canvas;
    let mut out = ImgVec::new(vec![background; canvas_w * canvas_h], canvas_w, canvas_h);
    let (left, top) = paste_offset((frame.width(), frame.height()), canvas);

    let w = frame.width().min(canvas_w - left);
    let h = frame.height().min(canvas_h - top);
    let mut dst = out.sub_image_mut(left, top, w, h);
    for (dst_row, src_row) in dst.rows_mut().zip(frame.rows()) {
        for (dst, &src) in dst_row.iter_mut().zip(src_row) {
            *dst = blend(src, *dst);
        }
    }
    out
}

/// Composites each frame onto the shared canvas
pub fn composite_all(frames: Vec<ImgVec<RGBA8>>, canvas: (usize, usize), background: RGBA8) -> Vec<ImgVec<RGBA8>> {
    frames.iter().map(|f| composite(f.as_ref(), canvas, background)).collect()
}

/// `src` over `dst`, straight alpha
#[inline]
fn blend(src: RGBA8, dst: RGBA8) -> RGBA8 {
    match src.a {
        255 => src,
        0 => dst,
        a => {
            let a = u32::from(a);
            let inv = 255 - a;
            let mix = |s: u8, d: u8| ((u32::from(s) * a + u32::from(d) * inv + 127) / 255) as u8;
            RGBA8::new(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), (a + (u32::from(dst.a) * inv + 127) / 255) as u8)
        },
    }
}
