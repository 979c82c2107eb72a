use std::io;
use std::path::PathBuf;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// Bad settings, caught before any file is read where possible
        InvalidArgument(msg: String) {
            display("Invalid argument: {}", msg)
        }
        /// An input frame is missing
        NotFound(path: PathBuf) {
            display("SVG file not found: {}", path.display())
        }
        /// The encoder can't handle one of the optional write parameters
        UnsupportedOption(name: &'static str) {
            display("Encoder does not support the '{}' option", name)
        }
        Svg(path: PathBuf, err: usvg::Error) {
            display("Can't render {}: {}", path.display(), err)
            source(err)
        }
        Quant(liq: imagequant::Error) {
            from()
            display("pngquant error: {}", liq)
            source(liq)
        }
        Gif(err: gif::EncodingError) {
            from()
            display("GIF error: {}", err)
            source(err)
        }
        Io(err: io::Error) {
            from()
            display("I/O: {}", err)
            source(err)
        }
        Aborted {
            display("aborted")
        }
    }
}

pub type CatResult<T, E = Error> = Result<T, E>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
