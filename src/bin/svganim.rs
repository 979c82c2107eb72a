#[macro_use] extern crate clap;

use svganim::progress::{NoProgress, ProgressReporter, VerboseProgress};
use svganim::Settings;

use clap::{App, AppSettings, Arg, ArgMatches};
use pbr::ProgressBar;
use rgb::RGBA8;

use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::time::Duration;

type BinResult<T, E = Box<dyn std::error::Error + Send + Sync>> = Result<T, E>;

fn main() {
    if let Err(e) = bin_main() {
        eprintln!("error: {}", e);
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  caused by: {}", err);
            source = err.source();
        }
        std::process::exit(1);
    }
}

fn bin_main() -> BinResult<()> {
    let matches = App::new(crate_name!())
                        .version(crate_version!())
                        .about("Turns numbered SVG files into a looping GIF")
                        .setting(AppSettings::UnifiedHelpMessage)
                        .setting(AppSettings::DeriveDisplayOrder)
                        .setting(AppSettings::ArgRequiredElseHelp)
                        .arg(Arg::with_name("output")
                            .long("output")
                            .short("o")
                            .help("Destination file to write to")
                            .empty_values(false)
                            .takes_value(true)
                            .value_name("a.gif")
                            .default_value("animation.gif"))
                        .arg(Arg::with_name("pattern")
                            .long("pattern")
                            .short("p")
                            .help("Frame file names, with {i} or {i:03d} for the frame number")
                            .empty_values(false)
                            .takes_value(true)
                            .value_name("{i}.svg")
                            .default_value("{i}.svg"))
                        .arg(Arg::with_name("start")
                            .long("start")
                            .help("Number of the first frame")
                            .takes_value(true)
                            .allow_hyphen_values(true)
                            .value_name("num")
                            .default_value("0"))
                        .arg(Arg::with_name("duration")
                            .long("duration")
                            .short("d")
                            .help("How long each frame is shown")
                            .takes_value(true)
                            .value_name("ms")
                            .default_value("100"))
                        .arg(Arg::with_name("loop")
                            .long("loop")
                            .help("Number of loops, 0 is forever")
                            .takes_value(true)
                            .value_name("num")
                            .default_value("0"))
                        .arg(Arg::with_name("scale")
                            .long("scale")
                            .help("Rasterization scale")
                            .takes_value(true)
                            .value_name("factor")
                            .default_value("1.0"))
                        .arg(Arg::with_name("ping-pong")
                            .long("ping-pong")
                            .help("Play forward, then backward"))
                        .arg(Arg::with_name("background")
                            .long("background")
                            .short("b")
                            .help("Color behind the frames: #rrggbb, #rrggbbaa or r,g,b[,a]")
                            .takes_value(true)
                            .value_name("color")
                            .default_value("#ffffff"))
                        .arg(Arg::with_name("quality")
                            .long("quality")
                            .value_name("1-100")
                            .takes_value(true)
                            .help("Lower quality may give smaller file"))
                        .arg(Arg::with_name("fast")
                            .long("fast")
                            .help("Faster palette generation, lower quality"))
                        .arg(Arg::with_name("no-optimize")
                            .long("no-optimize")
                            .help("Write every frame in full"))
                        .arg(Arg::with_name("verbose")
                            .long("verbose")
                            .short("v")
                            .conflicts_with("quiet")
                            .help("Print each step instead of a progress bar"))
                        .arg(Arg::with_name("quiet")
                            .long("quiet")
                            .short("q")
                            .help("Do not show a progress bar"))
                        .arg(Arg::with_name("COUNT")
                            .help("Number of frames to read")
                            .allow_hyphen_values(true)
                            .empty_values(false)
                            .required(true))
                        .get_matches_from(wild::args_os());

    let output = PathBuf::from(matches.value_of_os("output").ok_or("Missing output")?);
    let settings = Settings {
        frame_count: matches.value_of("COUNT").ok_or("Missing frame count")?.parse().map_err(|_| "Frame count must be a number")?,
        output,
        pattern: matches.value_of("pattern").ok_or("Missing pattern")?.to_owned(),
        start_index: parse_arg(&matches, "start", "Start must be a number")?,
        duration_ms: parse_arg(&matches, "duration", "Duration must be a number of milliseconds")?,
        loop_count: parse_arg(&matches, "loop", "Loop count must be 0-65535")?,
        scale: parse_arg(&matches, "scale", "Scale must be a number")?,
        ping_pong: matches.is_present("ping-pong"),
        background: parse_color(matches.value_of("background").ok_or("Missing background")?)?,
        verbose: matches.is_present("verbose"),
        quality: match matches.value_of("quality") {
            Some(q) => parse_quality(q)?,
            None => 100,
        },
        fast: matches.is_present("fast"),
        optimize: !matches.is_present("no-optimize"),
        disposal: None,
    };

    let mut progress: Box<dyn ProgressReporter> = if matches.is_present("quiet") {
        Box::new(NoProgress {})
    } else if settings.verbose {
        Box::new(VerboseProgress::default())
    } else {
        Box::new(BarProgress::new(settings.frame_count.max(0) as u64))
    };

    let summary = svganim::animate(&settings, &mut *progress)?;
    if !settings.verbose && !matches.is_present("quiet") {
        println!("svganim created {} ({} frames, {}×{})", settings.output.display(), summary.frames, summary.width, summary.height);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(matches: &ArgMatches<'_>, name: &str, err: &'static str) -> BinResult<T> {
    Ok(matches.value_of(name).ok_or(err)?.parse().map_err(|_| err)?)
}

fn parse_quality(s: &str) -> BinResult<u8> {
    match s.trim().parse::<u8>() {
        Ok(q @ 1..=100) => Ok(q),
        _ => Err(format!("Quality must be 1-100, got '{}'", s).into()),
    }
}

/// `#rgb` hex with optional alpha, or comma-separated components
fn parse_color(s: &str) -> BinResult<RGBA8> {
    let bad = || format!("'{}' is not a color, use #rrggbb, #rrggbbaa or r,g,b[,a]", s);
    let components: Vec<u8> = if let Some(hex) = s.strip_prefix('#') {
        if (hex.len() != 6 && hex.len() != 8) || !hex.is_ascii() {
            return Err(bad().into());
        }
        (0..hex.len()).step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<_, _>>()
            .map_err(|_| bad())?
    } else {
        s.split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| bad())?
    };
    match *components.as_slice() {
        [r, g, b] => Ok(RGBA8::new(r, g, b, 255)),
        [r, g, b, a] => Ok(RGBA8::new(r, g, b, a)),
        _ => Err(bad().into()),
    }
}

/// Progress bar over the input frames
struct BarProgress {
    pb: ProgressBar<Stdout>,
}

impl BarProgress {
    fn new(frames: u64) -> Self {
        let mut pb = ProgressBar::new(frames);
        pb.show_speed = false;
        pb.show_percent = false;
        pb.format(" #_. ");
        pb.message("Frame ");
        pb.set_max_refresh_rate(Some(Duration::from_millis(250)));
        Self { pb }
    }
}

impl ProgressReporter for BarProgress {
    fn increase(&mut self) -> bool {
        self.pb.inc();
        true
    }

    fn saving(&mut self, frames: usize, _path: &Path, _duration_ms: u32, _loop_count: u16) {
        self.pb.message(&format!("Writing {} frames ", frames));
    }

    fn error(&mut self, msg: String) {
        eprintln!("{}", msg);
    }

    fn done(&mut self, _msg: &str) {
        self.pb.finish();
    }
}
