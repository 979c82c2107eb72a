//! Frame file names, e.g. `frames/frame_{i:03d}.svg`

use crate::error::*;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Index { zero_pad: bool, width: usize },
}

/// A file name template with exactly one `{i}` field.
///
/// The field takes an optional `:[0][width][d]` format spec. `{{` and `}}` are literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    pieces: Vec<Piece>,
}

impl FramePattern {
    pub fn parse(pattern: &str) -> CatResult<Self> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();
        let mut placeholders = 0;

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                },
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                },
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => field.push(c),
                            None => return Err(Error::invalid(format!("unclosed '{{' in pattern '{}'", pattern))),
                        }
                    }
                    let index = parse_field(&field).ok_or_else(|| {
                        Error::invalid(format!("'{{{}}}' in pattern '{}' is not a valid frame index field, use {{i}} or {{i:03d}}", field, pattern))
                    })?;
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(index);
                    placeholders += 1;
                },
                '}' => return Err(Error::invalid(format!("unmatched '}}' in pattern '{}'", pattern))),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        if placeholders != 1 {
            return Err(Error::invalid(format!("pattern '{}' must contain exactly one {{i}} field, found {}", pattern, placeholders)));
        }
        Ok(Self { pieces })
    }

    /// File name for the frame with this index
    pub fn format(&self, index: i64) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match *piece {
                Piece::Literal(ref s) => out.push_str(s),
                Piece::Index { zero_pad: true, width } => {
                    let digits = index.unsigned_abs().to_string();
                    let sign = if index < 0 { "-" } else { "" };
                    out.push_str(sign);
                    for _ in (sign.len() + digits.len())..width {
                        out.push('0');
                    }
                    out.push_str(&digits);
                },
                Piece::Index { zero_pad: false, width } => {
                    out.push_str(&format!("{:>width$}", index, width = width));
                },
            }
        }
        out
    }

    pub fn path(&self, index: i64) -> PathBuf {
        PathBuf::from(self.format(index))
    }
}

/// `i`, `i:d`, `i:03d`, `i:5`
fn parse_field(field: &str) -> Option<Piece> {
    let spec = match field.strip_prefix('i')? {
        "" => return Some(Piece::Index { zero_pad: false, width: 0 }),
        rest => rest.strip_prefix(':')?,
    };
    let spec = spec.strip_suffix('d').unwrap_or(spec);
    let (zero_pad, digits) = match spec.strip_prefix('0') {
        Some(rest) => (true, rest),
        None => (false, spec),
    };
    let width = if digits.is_empty() {
        0
    } else if digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()?
    } else {
        return None;
    };
    Some(Piece::Index { zero_pad, width })
}
