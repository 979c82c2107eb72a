/*
 svganim: numbered SVG frames to animated GIF

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as
 published by the Free Software Foundation, either version 3 of the
 License, or (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
//! Renders `0.svg`, `1.svg`, … to a looping GIF.
//!
//! ```no_run
//! let mut settings = svganim::Settings::new(10);
//! settings.pattern = "frames/frame_{i:03d}.svg".into();
//! settings.ping_pong = true;
//! svganim::svg_sequence_to_gif(&settings)?;
//! # Ok::<(), svganim::Error>(())
//! ```

#[macro_use] extern crate quick_error;

use rgb::RGBA8;

mod error;
pub use crate::error::*;
pub mod progress;
use crate::progress::*;
pub mod pattern;
use crate::pattern::FramePattern;
pub mod raster;
pub mod compose;
pub mod sequence;
pub mod quantize;
use crate::quantize::{PalettedFrame, QuantizeSettings};
pub mod writer;
pub use crate::writer::{DisposalMethod, WriteParams};
mod encoderust;
pub use crate::encoderust::RustEncoder;

use std::path::PathBuf;

/// Everything that controls a conversion. Start from `Settings::new(frame_count)`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// How many files to read. Must be > 0.
    pub frame_count: i64,
    /// Where to write the GIF. Missing directories are created.
    pub output: PathBuf,
    /// File name of each frame, with one `{i}` or `{i:03d}` field
    pub pattern: String,
    /// Index of the first file
    pub start_index: i64,
    /// How long each frame is shown
    pub duration_ms: u32,
    /// 0 loops forever
    pub loop_count: u16,
    /// Rasterization scale, 1.0 renders at the SVG's own size
    pub scale: f32,
    /// Play forward, then backward
    pub ping_pong: bool,
    /// Frames are composited onto this
    pub background: RGBA8,
    /// Print progress to stdout (only used by `svg_sequence_to_gif`)
    pub verbose: bool,
    /// 1-100
    pub quality: u8,
    /// Lower quality, but faster palette generation
    pub fast: bool,
    /// Crop rows that don't change between frames
    pub optimize: bool,
    /// `None` picks per frame
    pub disposal: Option<DisposalMethod>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_count: 0,
            output: "animation.gif".into(),
            pattern: "{i}.svg".into(),
            start_index: 0,
            duration_ms: 100,
            loop_count: 0,
            scale: 1.0,
            ping_pong: false,
            background: RGBA8::new(255, 255, 255, 255),
            verbose: true,
            quality: 100,
            fast: false,
            optimize: true,
            disposal: None,
        }
    }
}

impl Settings {
    pub fn new(frame_count: i64) -> Self {
        Self { frame_count, ..Self::default() }
    }

    /// Checks everything that can be checked without touching the disk
    pub fn validate(&self) -> CatResult<FramePattern> {
        if self.frame_count <= 0 {
            return Err(Error::invalid(format!("frame count must be > 0, got {}", self.frame_count)));
        }
        if !self.scale.is_finite() || self.scale <= 0. {
            return Err(Error::invalid(format!("scale must be a positive number, got {}", self.scale)));
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(Error::invalid(format!("quality must be 1-100, got {}", self.quality)));
        }
        if self.start_index.checked_add(self.frame_count - 1).is_none() {
            return Err(Error::invalid("frame indices overflow"));
        }
        FramePattern::parse(&self.pattern)
    }

    pub(crate) fn write_params(&self) -> WriteParams {
        WriteParams {
            duration_ms: self.duration_ms,
            loop_count: self.loop_count,
            optimize: self.optimize,
            disposal: self.disposal,
        }
    }

    pub(crate) fn quantize_settings(&self) -> QuantizeSettings {
        QuantizeSettings {
            quality: self.quality,
            fast: self.fast,
        }
    }
}

/// What has been written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of frames in the GIF, including the ping-pong ones
    pub frames: usize,
    pub width: usize,
    pub height: usize,
    /// File size
    pub bytes: usize,
    /// The encoder rejected `optimize` or `disposal`, and the file was written without them
    pub used_fallback: bool,
}

/// Converts the SVG sequence described by `settings`.
///
/// With `verbose` set, progress is printed to stdout.
pub fn svg_sequence_to_gif(settings: &Settings) -> CatResult<Summary> {
    if settings.verbose {
        animate(settings, &mut VerboseProgress::default())
    } else {
        animate(settings, &mut NoProgress {})
    }
}

/// Same as `svg_sequence_to_gif`, but progress goes to the given reporter.
///
/// Nothing is written unless every frame loads and encodes.
pub fn animate(settings: &Settings, reporter: &mut dyn ProgressReporter) -> CatResult<Summary> {
    let pattern = settings.validate()?;

    let frames = raster::load_frames(&raster::FrameSource {
        pattern: &pattern,
        start: settings.start_index,
        count: settings.frame_count as usize,
        scale: settings.scale,
    }, reporter)?;

    let canvas = compose::canvas_size(&frames).ok_or_else(|| Error::invalid("no frames"))?;
    reporter.canvas_size(canvas.0, canvas.1);
    let frames = compose::composite_all(frames, canvas, settings.background);

    let frames = sequence::ping_pong(frames, settings.ping_pong);

    let quantize_settings = settings.quantize_settings();
    let frames = frames.iter()
        .map(|f| quantize::quantize(f.as_ref(), &quantize_settings))
        .collect::<CatResult<Vec<PalettedFrame>>>()?;

    let params = settings.write_params();
    reporter.saving(frames.len(), &settings.output, params.duration_ms, params.loop_count);
    let encoded = writer::encode_with_fallback(&mut RustEncoder::new(), &frames, &params, reporter)?;
    writer::write_file(&settings.output, &encoded.bytes)?;
    reporter.done("Done.");

    Ok(Summary {
        frames: frames.len(),
        width: canvas.0,
        height: canvas.1,
        bytes: encoded.bytes.len(),
        used_fallback: encoded.used_fallback,
    })
}
