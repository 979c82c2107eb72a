//! Encoding the paletted frames and saving the file

use crate::error::*;
use crate::progress::ProgressReporter;
use crate::quantize::PalettedFrame;
pub use gif::DisposalMethod;
use std::fs;
use std::path::Path;

/// Timing, looping and the optional extras for the output file
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WriteParams {
    /// Same for every frame
    pub duration_ms: u32,
    /// 0 loops forever
    pub loop_count: u16,
    /// Crop rows that don't change what's on screen. Optional.
    pub optimize: bool,
    /// Disposal for all frames. Optional, `None` lets the encoder pick per frame.
    pub disposal: Option<DisposalMethod>,
}

impl WriteParams {
    /// Only duration, loop count and the frames themselves.
    ///
    /// This is what's used when the encoder rejects an optional parameter.
    pub fn minimal(&self) -> Self {
        Self {
            duration_ms: self.duration_ms,
            loop_count: self.loop_count,
            optimize: false,
            disposal: None,
        }
    }

    pub fn is_minimal(&self) -> bool {
        !self.optimize && self.disposal.is_none()
    }

    /// GIF delay, in 1/100ths of a second
    pub fn delay(&self) -> u16 {
        (self.duration_ms / 10).min(u32::from(u16::MAX)) as u16
    }

    pub fn repeat(&self) -> gif::Repeat {
        match self.loop_count {
            0 => gif::Repeat::Infinite,
            n => gif::Repeat::Finite(n),
        }
    }
}

/// Turns the whole frame sequence into an animation file in memory.
///
/// If an optional parameter can't be honored, return `Error::UnsupportedOption`
/// without worrying about `out`, it's cleared before the next attempt.
pub trait Encoder {
    fn encode(&mut self, frames: &[PalettedFrame], params: &WriteParams, out: &mut Vec<u8>) -> CatResult<()>;
}

/// The encoded file
#[derive(Debug)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// The optional parameters were dropped
    pub used_fallback: bool,
}

/// Encodes with all of `params`, and if the encoder rejects one of the optional ones,
/// once more with `params.minimal()`.
///
/// Any other error, or an error from the second attempt, is returned as-is.
pub fn encode_with_fallback(encoder: &mut dyn Encoder, frames: &[PalettedFrame], params: &WriteParams, reporter: &mut dyn ProgressReporter) -> CatResult<Encoded> {
    let mut bytes = Vec::new();
    match encoder.encode(frames, params, &mut bytes) {
        Ok(()) => Ok(Encoded { bytes, used_fallback: false }),
        Err(Error::UnsupportedOption(name)) if !params.is_minimal() => {
            reporter.error(format!("Encoder rejected the '{}' option, retrying with duration, loop and frames only", name));
            bytes.clear();
            encoder.encode(frames, &params.minimal(), &mut bytes)?;
            Ok(Encoded { bytes, used_fallback: true })
        },
        Err(err) => Err(err),
    }
}

/// Writes the file, creating missing parent directories first
pub fn write_file(path: &Path, bytes: &[u8]) -> CatResult<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}
