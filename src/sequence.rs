/// Plays the frames forward, then backward without repeating either end.
///
/// `[A, B, C, D]` becomes `[A, B, C, D, C, B]`, so that looping goes `… C, B, A, B, C …`.
/// Sequences shorter than 3 frames have no interior to mirror.
pub fn ping_pong<T: Clone>(mut frames: Vec<T>, enabled: bool) -> Vec<T> {
    if !enabled || frames.len() < 2 {
        return frames;
    }
    let n = frames.len();
    frames.reserve(n - 2);
    for i in (1..n - 1).rev() {
        let copy = frames[i].clone();
        frames.push(copy);
    }
    frames
}

/// How many frames `ping_pong` will produce
pub fn ping_pong_len(n: usize, enabled: bool) -> usize {
    if enabled && n > 1 { 2 * n - 2 } else { n }
}
