use crate::error::*;
use imagequant::Attributes;
use imgref::*;
use rgb::RGBA8;

/// A frame reduced to its own palette of at most 256 colors
#[derive(Debug, Clone, PartialEq)]
pub struct PalettedFrame {
    pub image: ImgVec<u8>,
    pub palette: Vec<RGBA8>,
}

impl PalettedFrame {
    /// First palette entry with alpha 0
    pub fn transparent_index(&self) -> Option<u8> {
        self.palette.iter().position(|p| p.a == 0).map(|i| i as u8)
    }

    #[inline]
    pub(crate) fn color_at(&self, x: usize, y: usize) -> RGBA8 {
        let idx = self.image[(x, y)];
        self.palette.get(idx as usize).copied().unwrap_or_default()
    }
}

/// Palette reduction knobs
#[derive(Debug, Copy, Clone)]
pub struct QuantizeSettings {
    /// 1-100
    pub quality: u8,
    /// Lower quality, but faster
    pub fast: bool,
}

impl Default for QuantizeSettings {
    fn default() -> Self {
        Self { quality: 100, fast: false }
    }
}

/// Picks an adaptive palette for this one image and remaps it.
///
/// Each frame is quantized on its own, there's no palette shared between frames.
pub fn quantize(image: ImgRef<'_, RGBA8>, settings: &QuantizeSettings) -> CatResult<PalettedFrame> {
    let mut liq = Attributes::new();
    if settings.fast {
        liq.set_speed(10)?;
    }
    // minimum 0 can't fail with QualityTooLow
    liq.set_quality(0, settings.quality.clamp(1, 100))?;

    let (buf, width, height) = image.to_contiguous_buf();
    let mut img = liq.new_image_borrowed(&buf, width, height, 0.)?;
    let mut res = liq.quantize(&mut img)?;
    res.set_dithering_level(0.5)?;

    let (palette, pixels) = res.remapped(&mut img)?;
    debug_assert_eq!(width * height, pixels.len());

    Ok(PalettedFrame {
        image: Img::new(pixels, width, height),
        palette,
    })
}
