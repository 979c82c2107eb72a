use std::fs;
use std::path::{Path, PathBuf};

use rgb::RGBA8;
use svganim::progress::{NoProgress, ProgressReporter};
use svganim::{animate, Error, Settings};

const WHITE: RGBA8 = RGBA8 { r: 255, g: 255, b: 255, a: 255 };
const RED: RGBA8 = RGBA8 { r: 255, g: 0, b: 0, a: 255 };
const GREEN: RGBA8 = RGBA8 { r: 0, g: 255, b: 0, a: 255 };
const BLUE: RGBA8 = RGBA8 { r: 0, g: 0, b: 255, a: 255 };
const BLACK: RGBA8 = RGBA8 { r: 0, g: 0, b: 0, a: 255 };

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("svganim-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn hex(c: RGBA8) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

fn write_svg(path: &Path, width: u32, height: u32, fill: RGBA8) {
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><rect width="{w}" height="{h}" fill="{fill}"/></svg>"#,
        w = width, h = height, fill = hex(fill));
    fs::write(path, svg).unwrap();
}

fn settings(dir: &Path, count: i64) -> Settings {
    let mut s = Settings::new(count);
    s.pattern = dir.join("{i}.svg").to_str().unwrap().to_owned();
    s.output = dir.join("out.gif");
    s.verbose = false;
    s
}

struct Decoded {
    width: u16,
    height: u16,
    repeat: gif::Repeat,
    delays: Vec<u16>,
    /// Fully composited screen after each frame
    screens: Vec<imgref::ImgVec<RGBA8>>,
}

fn decode(path: &Path) -> Decoded {
    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = opts.read_info(fs::File::open(path).unwrap()).unwrap();
    let mut screen = gif_dispose::Screen::new_decoder(&decoder);
    let (width, height) = (decoder.width(), decoder.height());
    let mut delays = Vec::new();
    let mut screens = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        delays.push(frame.delay);
        screen.blit_frame(frame).unwrap();
        screens.push(screen.pixels_rgba().map_buf(|b| b.to_owned()));
    }
    Decoded { width, height, repeat: decoder.repeat(), delays, screens }
}

/// Quantization may move colors a little
fn close(a: RGBA8, b: RGBA8) -> bool {
    let d = |x: u8, y: u8| (i16::from(x) - i16::from(y)).abs() <= 4;
    d(a.r, b.r) && d(a.g, b.g) && d(a.b, b.b) && d(a.a, b.a)
}

fn assert_px(screen: &imgref::ImgVec<RGBA8>, x: usize, y: usize, expected: RGBA8) {
    let px = screen[(x, y)];
    assert!(close(px, expected), "pixel {},{} is {:?}, expected {:?}", x, y, px, expected);
}

#[test]
fn mixed_sizes_are_centered_on_the_largest_canvas() {
    let dir = scratch_dir("centered");
    write_svg(&dir.join("0.svg"), 10, 10, RED);
    write_svg(&dir.join("1.svg"), 20, 15, GREEN);
    write_svg(&dir.join("2.svg"), 15, 20, BLUE);

    let summary = animate(&settings(&dir, 3), &mut NoProgress {}).unwrap();
    assert_eq!((summary.frames, summary.width, summary.height), (3, 20, 20));
    assert!(!summary.used_fallback);

    let gif = decode(&dir.join("out.gif"));
    assert_eq!((gif.width, gif.height), (20, 20));
    assert_eq!(gif.screens.len(), 3);

    // 10x10 at (5, 5)
    let s = &gif.screens[0];
    assert_px(s, 4, 4, WHITE);
    assert_px(s, 5, 5, RED);
    assert_px(s, 14, 14, RED);
    assert_px(s, 15, 15, WHITE);

    // 20x15 at (0, 2)
    let s = &gif.screens[1];
    assert_px(s, 0, 1, WHITE);
    assert_px(s, 0, 2, GREEN);
    assert_px(s, 19, 16, GREEN);
    assert_px(s, 19, 17, WHITE);

    // 15x20 at (2, 0)
    let s = &gif.screens[2];
    assert_px(s, 1, 0, WHITE);
    assert_px(s, 2, 0, BLUE);
    assert_px(s, 16, 19, BLUE);
    assert_px(s, 17, 19, WHITE);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn ping_pong_plays_back_without_repeating_ends() {
    let dir = scratch_dir("pingpong");
    let colors = [RED, GREEN, BLUE, BLACK];
    for (i, &c) in colors.iter().enumerate() {
        write_svg(&dir.join(format!("{}.svg", i)), 8, 8, c);
    }
    let mut s = settings(&dir, 4);
    s.ping_pong = true;
    let summary = animate(&s, &mut NoProgress {}).unwrap();
    assert_eq!(summary.frames, 6);

    let gif = decode(&s.output);
    let seen: Vec<_> = gif.screens.iter().map(|s| s[(4usize, 4usize)]).collect();
    let expected = [RED, GREEN, BLUE, BLACK, BLUE, GREEN];
    assert_eq!(seen.len(), expected.len());
    for (px, &e) in seen.iter().zip(expected.iter()) {
        assert!(close(*px, e), "{:?} vs {:?}", seen, expected);
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn frame_counts() {
    let dir = scratch_dir("counts");
    for i in 0..5 {
        write_svg(&dir.join(format!("{}.svg", i)), 4, 4, if i % 2 == 0 { RED } else { BLUE });
    }
    for n in 1..=5 {
        for &pp in &[false, true] {
            let mut s = settings(&dir, n);
            s.ping_pong = pp;
            let summary = animate(&s, &mut NoProgress {}).unwrap();
            let expected = (if pp && n > 1 { 2 * n - 2 } else { n }) as usize;
            assert_eq!(summary.frames, expected, "n={} ping_pong={}", n, pp);
            assert_eq!(decode(&s.output).screens.len(), expected);
        }
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn timing_and_loop_metadata() {
    let dir = scratch_dir("timing");
    write_svg(&dir.join("0.svg"), 4, 4, RED);
    write_svg(&dir.join("1.svg"), 4, 4, GREEN);

    let mut s = settings(&dir, 2);
    s.duration_ms = 250;
    s.loop_count = 3;
    animate(&s, &mut NoProgress {}).unwrap();
    let gif = decode(&s.output);
    assert_eq!(gif.delays, [25, 25]);
    assert_eq!(gif.repeat, gif::Repeat::Finite(3));

    s.loop_count = 0;
    animate(&s, &mut NoProgress {}).unwrap();
    assert_eq!(decode(&s.output).repeat, gif::Repeat::Infinite);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn padded_pattern_start_index_and_nested_output() {
    let dir = scratch_dir("padded");
    fs::create_dir_all(dir.join("frames")).unwrap();
    for i in 7..10 {
        write_svg(&dir.join(format!("frames/frame_{:03}.svg", i)), 6, 3, GREEN);
    }
    let mut s = settings(&dir, 3);
    s.pattern = dir.join("frames/frame_{i:03d}.svg").to_str().unwrap().to_owned();
    s.start_index = 7;
    s.scale = 2.;
    s.output = dir.join("out/deeper/anim.gif");
    let summary = animate(&s, &mut NoProgress {}).unwrap();
    assert_eq!((summary.frames, summary.width, summary.height), (3, 12, 6));
    assert_eq!(fs::metadata(&s.output).unwrap().len() as usize, summary.bytes);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_frame_aborts_without_output() {
    let dir = scratch_dir("missing");
    write_svg(&dir.join("0.svg"), 4, 4, RED);
    write_svg(&dir.join("1.svg"), 4, 4, RED);
    let s = settings(&dir, 3);
    match animate(&s, &mut NoProgress {}) {
        Err(Error::NotFound(path)) => assert_eq!(path, dir.join("2.svg")),
        other => panic!("{:?}", other),
    }
    assert!(!s.output.exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_svg_is_reported_with_its_path() {
    let dir = scratch_dir("malformed");
    fs::write(dir.join("0.svg"), "definitely not svg").unwrap();
    let s = settings(&dir, 1);
    match animate(&s, &mut NoProgress {}) {
        Err(Error::Svg(path, _)) => assert_eq!(path, dir.join("0.svg")),
        other => panic!("{:?}", other),
    }
    assert!(!s.output.exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reruns_are_stable() {
    let dir = scratch_dir("stable");
    write_svg(&dir.join("0.svg"), 9, 5, RED);
    write_svg(&dir.join("1.svg"), 3, 11, BLUE);
    let mut s = settings(&dir, 2);
    s.ping_pong = true;
    let a = animate(&s, &mut NoProgress {}).unwrap();
    let b = animate(&s, &mut NoProgress {}).unwrap();
    assert_eq!((a.frames, a.width, a.height), (b.frames, b.width, b.height));
    assert_eq!((a.width, a.height), (9, 11));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn translucent_background_stays_transparent() {
    let dir = scratch_dir("translucent");
    write_svg(&dir.join("0.svg"), 4, 4, RED);
    write_svg(&dir.join("1.svg"), 2, 2, BLUE);
    let mut s = settings(&dir, 2);
    s.background = RGBA8::new(0, 0, 0, 0);
    animate(&s, &mut NoProgress {}).unwrap();
    let gif = decode(&s.output);
    // the 2x2 frame sits at (1, 1); the red of the first frame must not show around it
    let second = &gif.screens[1];
    assert_eq!(second[(0usize, 0usize)].a, 0);
    assert_px(second, 1, 1, BLUE);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn transparent_background_is_cleared_across_cropped_frames() {
    let dir = scratch_dir("cleared");
    write_svg(&dir.join("0.svg"), 4, 4, RED);
    fs::write(dir.join("1.svg"), format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="{}"/><rect y="1" width="4" height="2" fill="{}"/></svg>"#,
        hex(RED), hex(GREEN))).unwrap();
    write_svg(&dir.join("2.svg"), 2, 2, BLUE);
    write_svg(&dir.join("3.svg"), 4, 4, RED);
    let mut s = settings(&dir, 4);
    s.background = RGBA8::new(0, 0, 0, 0);
    assert!(s.optimize);
    animate(&s, &mut NoProgress {}).unwrap();

    let gif = decode(&s.output);
    assert_eq!(gif.screens.len(), 4);
    let s0 = &gif.screens[0];
    assert_px(s0, 0, 0, RED);
    assert_px(s0, 3, 3, RED);
    let s1 = &gif.screens[1];
    assert_px(s1, 0, 0, RED);
    assert_px(s1, 0, 1, GREEN);
    assert_px(s1, 3, 2, GREEN);
    assert_px(s1, 3, 3, RED);
    let s2 = &gif.screens[2];
    for &(x, y) in &[(0usize, 0usize), (3, 0), (0, 3), (3, 3), (0, 1), (3, 2)] {
        assert_eq!(s2[(x, y)].a, 0, "pixel {},{} of the third frame is {:?}", x, y, s2[(x, y)]);
    }
    assert_px(s2, 1, 1, BLUE);
    assert_px(s2, 2, 2, BLUE);
    let s3 = &gif.screens[3];
    assert_px(s3, 0, 0, RED);
    assert_px(s3, 3, 3, RED);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn huge_count_fails_on_the_first_missing_file() {
    let dir = scratch_dir("huge");
    let s = settings(&dir, 1 << 40);
    match animate(&s, &mut NoProgress {}) {
        Err(Error::NotFound(path)) => assert_eq!(path, dir.join("0.svg")),
        other => panic!("{:?}", other),
    }
    assert!(!s.output.exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn relative_png_images_are_drawn() {
    let dir = scratch_dir("image");
    let mut pixmap = resvg::tiny_skia::Pixmap::new(4, 4).unwrap();
    pixmap.fill(resvg::tiny_skia::Color::from_rgba8(0, 0, 255, 255));
    fs::write(dir.join("blue.png"), pixmap.encode_png().unwrap()).unwrap();
    fs::write(dir.join("0.svg"),
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="4" height="4"><image xlink:href="blue.png" width="4" height="4"/></svg>"#).unwrap();

    let s = settings(&dir, 1);
    animate(&s, &mut NoProgress {}).unwrap();
    let gif = decode(&s.output);
    assert_px(&gif.screens[0], 1, 1, BLUE);
    assert_px(&gif.screens[0], 2, 2, BLUE);
    fs::remove_dir_all(&dir).unwrap();
}

#[derive(Default)]
struct Recorder {
    reads: Vec<PathBuf>,
    loaded: Vec<(i64, usize, usize)>,
    canvas: Option<(usize, usize)>,
    saving: Option<(usize, u32, u16)>,
    done: bool,
    stop_after: Option<usize>,
}

impl ProgressReporter for Recorder {
    fn increase(&mut self) -> bool {
        self.stop_after.map_or(true, |n| self.loaded.len() < n)
    }
    fn reading(&mut self, path: &Path) {
        self.reads.push(path.to_owned());
    }
    fn frame_loaded(&mut self, index: i64, _path: &Path, width: usize, height: usize) {
        self.loaded.push((index, width, height));
    }
    fn canvas_size(&mut self, width: usize, height: usize) {
        self.canvas = Some((width, height));
    }
    fn saving(&mut self, frames: usize, _path: &Path, duration_ms: u32, loop_count: u16) {
        self.saving = Some((frames, duration_ms, loop_count));
    }
    fn done(&mut self, _msg: &str) {
        self.done = true;
    }
}

#[test]
fn reporter_sees_each_step() {
    let dir = scratch_dir("reporter");
    write_svg(&dir.join("0.svg"), 10, 10, RED);
    write_svg(&dir.join("1.svg"), 20, 15, GREEN);
    write_svg(&dir.join("2.svg"), 15, 20, BLUE);
    let mut s = settings(&dir, 3);
    s.ping_pong = true;
    s.duration_ms = 80;
    let mut rec = Recorder::default();
    animate(&s, &mut rec).unwrap();
    assert_eq!(rec.reads, [dir.join("0.svg"), dir.join("1.svg"), dir.join("2.svg")]);
    assert_eq!(rec.loaded, [(0, 10, 10), (1, 20, 15), (2, 15, 20)]);
    assert_eq!(rec.canvas, Some((20, 20)));
    assert_eq!(rec.saving, Some((4, 80, 0)));
    assert!(rec.done);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn reporter_can_abort() {
    let dir = scratch_dir("abort");
    for i in 0..3 {
        write_svg(&dir.join(format!("{}.svg", i)), 4, 4, RED);
    }
    let s = settings(&dir, 3);
    let mut rec = Recorder { stop_after: Some(1), ..Recorder::default() };
    match animate(&s, &mut rec) {
        Err(Error::Aborted) => {},
        other => panic!("{:?}", other),
    }
    assert_eq!(rec.loaded.len(), 1);
    assert!(!s.output.exists());
    fs::remove_dir_all(&dir).unwrap();
}
