use crate::error::*;
use crate::quantize::PalettedFrame;
use crate::writer::{DisposalMethod, Encoder, WriteParams};
use imgref::*;
use rgb::RGBA8;
use std::borrow::Cow;

/// GIF encoder using the `gif` crate
#[derive(Default)]
pub struct RustEncoder {}

impl RustEncoder {
    pub fn new() -> Self {
        Self {}
    }
}

/// What a decoder would be showing so far
struct Screen {
    pixels: ImgVec<RGBA8>,
    previous_dispose: DisposalMethod,
}

impl Screen {
    fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: ImgVec::new(vec![RGBA8::new(0, 0, 0, 0); width * height], width, height),
            previous_dispose: DisposalMethod::Background,
        }
    }

    /// Draws the rows `top..top+height` of the frame, then applies `dispose`
    fn blit(&mut self, frame: &PalettedFrame, top: usize, height: usize, dispose: DisposalMethod) {
        let transparent_index = frame.transparent_index();
        let width = self.pixels.width();
        let saved = if dispose == DisposalMethod::Previous { Some(self.pixels.clone()) } else { None };

        for (y, row) in self.pixels.sub_image_mut(0, top, width, height).rows_mut().enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                let idx = frame.image[(x, top + y)];
                if Some(idx) != transparent_index {
                    *px = frame.color_at(x, top + y);
                }
            }
        }

        match dispose {
            DisposalMethod::Background => {
                for row in self.pixels.sub_image_mut(0, top, width, height).rows_mut() {
                    row.iter_mut().for_each(|px| *px = RGBA8::new(0, 0, 0, 0));
                }
            },
            DisposalMethod::Previous => {
                if let Some(saved) = saved {
                    self.pixels = saved;
                }
            },
            _ => {},
        }
        self.previous_dispose = dispose;
    }

    /// Drawing this row wouldn't change anything
    fn row_unchanged(&self, frame: &PalettedFrame, y: usize, transparent_index: Option<u8>) -> bool {
        let width = self.pixels.width();
        let row = &frame.image.buf()[y * width..(y + 1) * width];
        let screen_row = &self.pixels.buf()[y * width..(y + 1) * width];
        row.iter().zip(screen_row).all(|(&idx, &bg)| {
            Some(idx) == transparent_index || frame.palette.get(idx as usize) == Some(&bg)
        })
    }

    /// Rows to write: skips unchanged rows at the top and bottom, but always keeps at least one
    fn changed_rows(&self, frame: &PalettedFrame) -> (usize, usize) {
        let transparent_index = frame.transparent_index();
        let height = frame.image.height();

        let top = (0..height).take_while(|&y| self.row_unchanged(frame, y, transparent_index)).count();
        if top == height {
            return (0, 1);
        }
        let bottom = (top..height).rev().take_while(|&y| self.row_unchanged(frame, y, transparent_index)).count();
        (top, height - top - bottom)
    }
}

/// Clears the frame if it, or the one drawn after it, has see-through pixels.
/// Otherwise transparent areas would show what was drawn before.
fn auto_dispose(frame: &PalettedFrame, next: &PalettedFrame) -> DisposalMethod {
    if frame.transparent_index().is_some() || next.transparent_index().is_some() {
        DisposalMethod::Background
    } else {
        DisposalMethod::Keep
    }
}

fn to_u16(len: usize, what: &str) -> CatResult<u16> {
    if len == 0 || len > usize::from(u16::MAX) {
        return Err(Error::invalid(format!("GIF {} must be between 1 and {} pixels, got {}", what, u16::MAX, len)));
    }
    Ok(len as u16)
}

impl Encoder for RustEncoder {
    fn encode(&mut self, frames: &[PalettedFrame], params: &WriteParams, out: &mut Vec<u8>) -> CatResult<()> {
        let first = frames.first().ok_or_else(|| Error::invalid("there are no frames to write"))?;
        let (width, height) = (first.image.width(), first.image.height());
        let screen_width = to_u16(width, "width")?;
        let screen_height = to_u16(height, "height")?;

        let mut enc = gif::Encoder::new(&mut *out, screen_width, screen_height, &[])?;
        enc.set_repeat(params.repeat())?;

        let delay = params.delay();
        let mut screen = Screen::new(width, height);
        for (n, frame) in frames.iter().enumerate() {
            if frame.image.width() != width || frame.image.height() != height {
                return Err(Error::invalid(format!("frame {} has wrong size ({}×{}, expected {}×{})", n + 1,
                    frame.image.width(), frame.image.height(), width, height)));
            }

            // the last frame is followed by the first one when looping
            let next = frames.get(n + 1).unwrap_or(first);
            let dispose = params.disposal.unwrap_or_else(|| auto_dispose(frame, next));
            // disposal only clears the written rectangle, so anything cleared is written in full
            let can_crop = dispose == DisposalMethod::Keep && screen.previous_dispose == DisposalMethod::Keep;
            let (top, rows) = if params.optimize && n > 0 && can_crop {
                screen.changed_rows(frame)
            } else {
                (0, height)
            };

            let mut pal_rgb = Vec::with_capacity(3 * frame.palette.len());
            for p in &frame.palette {
                pal_rgb.extend_from_slice(&[p.r, p.g, p.b]);
            }

            let buf = frame.image.buf();
            enc.write_frame(&gif::Frame {
                delay,
                dispose,
                transparent: frame.transparent_index(),
                top: top as u16,
                left: 0,
                width: screen_width,
                height: rows as u16,
                palette: Some(pal_rgb),
                buffer: Cow::Borrowed(&buf[top * width..(top + rows) * width]),
                ..gif::Frame::default()
            })?;
            screen.blit(frame, top, rows, dispose);
        }
        enc.into_inner()?;
        Ok(())
    }
}
