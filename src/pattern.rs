//! Output path pattern formatter.
//!
//! Rendered paths are built from a template with `{token}` placeholders:
//!
//! | token | meaning |
//! |-------|---------|
//! | `z`, `x`, `y` | zoom / column / row as plain decimal |
//! | `ZZ..`, `XX..`, `YY..` | zero-padded to the repeat count |
//! | `t`, `n` | NW-corner latitude / longitude, 6 decimal places |
//! | `TT..`, `NN..` | leading digits of the absolute latitude / longitude, padded to the repeat count |
//! | `ext` | resolved tile extension, no leading dot |
//!
//! Tokens are classified by an ordered rule set: exact single-character
//! matches first, then uniform-repeat matches. Unknown tokens are rejected
//! at parse time, naming the bad token and the whole pattern.

use crate::coord::tile_corner_lonlat;
use crate::error::PatternError;

/// Default tile layout: `zoom/column/row.extension`.
pub const DEFAULT_PATTERN: &str = "{z}/{x}/{y}.{ext}";

// =============================================================================
// Token classification
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Zoom,
    Column,
    Row,
    Latitude,
    Longitude,
    Extension,
    PaddedZoom(usize),
    PaddedColumn(usize),
    PaddedRow(usize),
    LatitudeDigits(usize),
    LongitudeDigits(usize),
}

fn is_repeat_of(token: &str, expected: char) -> bool {
    !token.is_empty() && token.chars().all(|ch| ch == expected)
}

/// Classify a placeholder body. First match wins: exact tokens are checked
/// before the uniform-repeat family so `z` can never shadow `ZZ`.
fn classify(token: &str) -> Option<Token> {
    let exact: &[(&str, Token)] = &[
        ("z", Token::Zoom),
        ("x", Token::Column),
        ("y", Token::Row),
        ("t", Token::Latitude),
        ("n", Token::Longitude),
        ("ext", Token::Extension),
    ];
    for (literal, kind) in exact {
        if token == *literal {
            return Some(kind.clone());
        }
    }

    let repeats: &[(char, fn(usize) -> Token)] = &[
        ('Z', Token::PaddedZoom),
        ('X', Token::PaddedColumn),
        ('Y', Token::PaddedRow),
        ('T', Token::LatitudeDigits),
        ('N', Token::LongitudeDigits),
    ];
    for (ch, make) in repeats {
        if is_repeat_of(token, *ch) {
            return Some(make(token.len()));
        }
    }

    None
}

// =============================================================================
// PathPattern
// =============================================================================

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// A parsed, validated path pattern.
///
/// Parsing happens once; [`render`](PathPattern::render) is then pure string
/// assembly per tile. Malformed or unknown placeholders fail at
/// construction, so pattern defects abort an operation before any tile is
/// written.
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern string.
    ///
    /// # Errors
    ///
    /// - [`PatternError::UnclosedPlaceholder`] for a `{` with no `}`
    /// - [`PatternError::EmptyPlaceholder`] for `{}`
    /// - [`PatternError::UnknownPlaceholder`] for an unrecognized token
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after_open = &rest[open + 1..];
            let close = after_open
                .find('}')
                .ok_or_else(|| PatternError::UnclosedPlaceholder {
                    pattern: pattern.to_string(),
                })?;
            let token = &after_open[..close];
            if token.is_empty() {
                return Err(PatternError::EmptyPlaceholder {
                    pattern: pattern.to_string(),
                });
            }
            let kind = classify(token).ok_or_else(|| PatternError::UnknownPlaceholder {
                token: token.to_string(),
                pattern: pattern.to_string(),
            })?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Token(kind));
            rest = &after_open[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// The original pattern string.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Render the output path for one tile.
    ///
    /// `row` is the display (XYZ) row; corner latitude/longitude are
    /// derived from it on demand.
    pub fn render(&self, zoom: u8, column: u32, row: u32, extension: &str) -> String {
        let (lon, lat) = tile_corner_lonlat(zoom, column, row);

        let mut out = String::with_capacity(self.pattern.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) => match token {
                    Token::Zoom => out.push_str(&zoom.to_string()),
                    Token::Column => out.push_str(&column.to_string()),
                    Token::Row => out.push_str(&row.to_string()),
                    Token::Latitude => out.push_str(&format!("{lat:.6}")),
                    Token::Longitude => out.push_str(&format!("{lon:.6}")),
                    Token::Extension => out.push_str(extension),
                    Token::PaddedZoom(width) => out.push_str(&leading_digits(zoom as i64, *width)),
                    Token::PaddedColumn(width) => {
                        out.push_str(&leading_digits(column as i64, *width))
                    }
                    Token::PaddedRow(width) => out.push_str(&leading_digits(row as i64, *width)),
                    Token::LatitudeDigits(width) => {
                        out.push_str(&leading_digits(lat.abs().floor() as i64, *width))
                    }
                    Token::LongitudeDigits(width) => {
                        out.push_str(&leading_digits(lon.abs().floor() as i64, *width))
                    }
                },
            }
        }
        out
    }
}

/// Decimal digits of `value.abs()`, left-padded with zeros to `count` and
/// truncated to `count` when longer.
fn leading_digits(value: i64, count: usize) -> String {
    let mut digits = value.unsigned_abs().to_string();
    if digits.len() < count {
        digits = format!("{}{}", "0".repeat(count - digits.len()), digits);
    }
    digits.truncate(count);
    digits
}

// =============================================================================
// Tests
// =============================================================================
