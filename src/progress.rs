//! For tracking conversion progress and aborting early

use std::io::Write;
use std::path::Path;

/// A trait that is used to report progress to some consumer.
///
/// Everything here is informational. Nothing the reporter does changes the output file,
/// except `increase()` returning `false`, which stops the run.
pub trait ProgressReporter: Send {
    /// Called after each input frame has been rasterized.
    ///
    /// This method may return `false` to abort processing.
    fn increase(&mut self) -> bool;

    /// About to read an input file
    fn reading(&mut self, _path: &Path) {}

    /// The frame has been rasterized to `width`×`height` pixels
    fn frame_loaded(&mut self, _index: i64, _path: &Path, _width: usize, _height: usize) {}

    /// All frames are going to be placed on a canvas of this size
    fn canvas_size(&mut self, _width: usize, _height: usize) {}

    /// Called once, before the GIF is written. `loop_count` 0 means forever.
    fn saving(&mut self, _frames: usize, _path: &Path, _duration_ms: u32, _loop_count: u16) {}

    /// Something went wrong, but the run recovered from it
    #[cold]
    fn error(&mut self, _message: String) {}

    /// The output file has been written
    fn done(&mut self, _msg: &str) {}
}

/// No-op progress reporter
pub struct NoProgress {}

impl ProgressReporter for NoProgress {
    fn increase(&mut self) -> bool {
        true
    }
}

/// Prints a line per step to stdout
#[derive(Default)]
pub struct VerboseProgress {}

impl ProgressReporter for VerboseProgress {
    fn increase(&mut self) -> bool {
        true
    }

    fn reading(&mut self, path: &Path) {
        print!("Reading {} ... ", path.display());
        let _ = std::io::stdout().flush();
    }

    fn frame_loaded(&mut self, _index: i64, _path: &Path, width: usize, height: usize) {
        println!("ok (size={}x{})", width, height);
    }

    fn canvas_size(&mut self, width: usize, height: usize) {
        println!("Target canvas size: {}x{}", width, height);
    }

    fn saving(&mut self, frames: usize, path: &Path, duration_ms: u32, loop_count: u16) {
        println!("Saving {} frames -> {} (duration={}ms, loop={})", frames, path.display(), duration_ms, loop_label(loop_count));
    }

    #[cold]
    fn error(&mut self, mut msg: String) {
        msg.push('\n');
        let _ = std::io::stderr().write_all(msg.as_bytes());
    }

    fn done(&mut self, msg: &str) {
        println!("{}", msg);
    }
}

/// `∞` for 0, the count otherwise
pub fn loop_label(loop_count: u16) -> String {
    if loop_count == 0 {
        "∞".into()
    } else {
        loop_count.to_string()
    }
}
