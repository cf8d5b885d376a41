//! Text wrapping and line placement.
//!
//! Wrapping is driven by a character budget derived from the width of a
//! reference glyph, so lines never exceed `max_width` when measured in
//! reference-glyph units. Placement then aligns each line inside
//! `max_width` using the real measured width.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;
use crate::grid::Point;

/// Glyph used to estimate an average character width.
pub const REFERENCE_GLYPH: &str = "A";

/// Pixel measurements for a font at a fixed size.
pub trait TextMetrics {
    /// Advance width of `text` in pixels, without letter spacing.
    fn text_width(&self, text: &str) -> f32;
    /// Distance from one line's top to the next line's top, before spacing.
    fn line_height(&self) -> f32;
    /// Distance from a line's top to its baseline.
    fn ascent(&self) -> f32;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(Error::Config(format!("unknown alignment {other:?}"))),
        }
    }
}

/// Number of characters that fit on one line.
pub fn max_chars_per_line<M: TextMetrics + ?Sized>(
    max_width: f32,
    metrics: &M,
    char_spacing: f32,
) -> usize {
    let glyph = metrics.text_width(REFERENCE_GLYPH) + char_spacing;
    if glyph <= 0.0 {
        return usize::MAX;
    }
    ((max_width / glyph).floor() as usize).max(1)
}

/// Wrap `text` to fit `max_width` pixels.
///
/// The character budget gives the first cut; any line that still measures
/// wider than `max_width` is broken again by measured width. A single glyph
/// wider than `max_width` still gets a line of its own.
pub fn wrap<M: TextMetrics + ?Sized>(
    text: &str,
    max_width: f32,
    metrics: &M,
    char_spacing: f32,
) -> Vec<String> {
    wrap_chars(text, max_chars_per_line(max_width, metrics, char_spacing))
        .into_iter()
        .flat_map(|line| fit_measured(&line, max_width, metrics, char_spacing))
        .collect()
}

fn fit_measured<M: TextMetrics + ?Sized>(
    line: &str,
    max_width: f32,
    metrics: &M,
    char_spacing: f32,
) -> Vec<String> {
    let fits = |s: &str| line_width(s, metrics, char_spacing) <= max_width;
    if fits(line) {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut cur = String::new();
    for word in line.split(' ') {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if fits(&candidate) {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
        }
        let mut rest = word;
        while !fits(rest) {
            let mut end = 0;
            for (i, c) in rest.char_indices() {
                let next = i + c.len_utf8();
                if !fits(&rest[..next]) {
                    break;
                }
                end = next;
            }
            if end == 0 {
                end = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
            }
            out.push(rest[..end].to_string());
            rest = &rest[end..];
        }
        cur = rest.to_string();
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

/// Greedy word wrap by character count. Runs of whitespace collapse to a
/// single space; a word longer than `width` is split across lines.
pub fn wrap_chars(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;
    for word in text.split_whitespace() {
        let mut rest = word;
        loop {
            let n = rest.chars().count();
            let needed = if cur_len == 0 { n } else { cur_len + 1 + n };
            if needed <= width {
                if cur_len > 0 {
                    cur.push(' ');
                    cur_len += 1;
                }
                cur.push_str(rest);
                cur_len += n;
                break;
            }
            if cur_len > 0 {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
                continue;
            }
            let split = rest
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            lines.push(rest[..split].to_string());
            rest = &rest[split..];
            if rest.is_empty() {
                break;
            }
        }
    }
    if cur_len > 0 {
        lines.push(cur);
    }
    lines
}

/// Width of a line including letter spacing between characters.
pub fn line_width<M: TextMetrics + ?Sized>(line: &str, metrics: &M, char_spacing: f32) -> f32 {
    let gaps = line.chars().count().saturating_sub(1) as f32;
    metrics.text_width(line) + gaps * char_spacing
}

/// A wrapped line with its top-left draw position.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    pub max_width: f32,
    pub alignment: Alignment,
    pub line_spacing: f32,
    pub char_spacing: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_width: 100.0,
            alignment: Alignment::Left,
            line_spacing: 5.0,
            char_spacing: 0.0,
        }
    }
}

/// Assign draw coordinates to already wrapped lines.
pub fn position<M: TextMetrics + ?Sized>(
    lines: &[String],
    start: Point,
    options: &LayoutOptions,
    metrics: &M,
) -> Vec<PlacedLine> {
    let height = metrics.line_height();
    let mut y = start.y as f32;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let width = line_width(line, metrics, options.char_spacing);
        let x = match options.alignment {
            Alignment::Left => start.x as f32,
            Alignment::Center => start.x as f32 + ((options.max_width - width) / 2.0).floor(),
            Alignment::Right => start.x as f32 + options.max_width - width,
        };
        out.push(PlacedLine {
            text: line.clone(),
            x,
            y,
            width,
            height,
        });
        y += height + options.line_spacing;
    }
    out
}

/// Wrapped and positioned lines for one string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<PlacedLine>,
}

impl TextBlock {
    pub fn layout<M: TextMetrics + ?Sized>(
        text: &str,
        start: Point,
        options: &LayoutOptions,
        metrics: &M,
    ) -> Self {
        let wrapped = wrap(text, options.max_width, metrics, options.char_spacing);
        Self {
            lines: position(&wrapped, start, options, metrics),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Vertical extent from the first line's top to the last line's bottom.
    pub fn height(&self) -> f32 {
        match (self.lines.first(), self.lines.last()) {
            (Some(first), Some(last)) => last.y + last.height - first.y,
            _ => 0.0,
        }
    }

    /// Shift every line down by `dy` pixels.
    pub fn translate_y(&mut self, dy: f32) {
        for line in &mut self.lines {
            line.y += dy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character advances by the same amount.
    struct Mono {
        advance: f32,
        height: f32,
    }

    impl TextMetrics for Mono {
        fn text_width(&self, text: &str) -> f32 {
            text.chars().count() as f32 * self.advance
        }
        fn line_height(&self) -> f32 {
            self.height
        }
        fn ascent(&self) -> f32 {
            self.height * 0.8
        }
    }

    const MONO: Mono = Mono {
        advance: 10.0,
        height: 20.0,
    };

    #[test]
    fn character_budget_comes_from_reference_glyph() {
        assert_eq!(max_chars_per_line(100.0, &MONO, 0.0), 10);
        assert_eq!(max_chars_per_line(105.0, &MONO, 0.0), 10);
        assert_eq!(max_chars_per_line(100.0, &MONO, 2.5), 8);
        assert_eq!(max_chars_per_line(3.0, &MONO, 0.0), 1);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap("Christmas Gifts Every Girl will Love", 100.0, &MONO, 0.0);
        assert_eq!(lines, vec!["Christmas", "Gifts", "Every Girl", "will Love"]);
        for l in &lines {
            assert!(line_width(l, &MONO, 0.0) <= 100.0);
        }
    }

    /// `W` and `M` are twice as wide as every other glyph.
    struct Wide;

    impl TextMetrics for Wide {
        fn text_width(&self, text: &str) -> f32 {
            text.chars()
                .map(|c| if matches!(c, 'W' | 'M') { 20.0 } else { 10.0 })
                .sum()
        }
        fn line_height(&self) -> f32 {
            20.0
        }
        fn ascent(&self) -> f32 {
            16.0
        }
    }

    #[test]
    fn wide_glyphs_never_exceed_the_width() {
        let lines = wrap("WWWWW WWWW MMMMM", 100.0, &Wide, 0.0);
        assert_eq!(lines, vec!["WWWWW", "WWWW", "MMMMM"]);
        let lines = wrap("aWWWWWWWW bc", 100.0, &Wide, 0.0);
        assert_eq!(lines, vec!["aWWWW", "WWWW", "bc"]);
        for text in ["MAMA MIA WOW", "WWWWWWWWWWWWWWWWWWWW", "Wonderful Mom Gifts"] {
            for width in [25.0, 60.0, 100.0, 145.0] {
                for spacing in [0.0, 3.0] {
                    for l in wrap(text, width, &Wide, spacing) {
                        assert!(
                            line_width(&l, &Wide, spacing) <= width,
                            "{l:?} at {width}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn a_glyph_wider_than_the_line_still_gets_placed() {
        assert_eq!(wrap("WW", 15.0, &Wide, 0.0), vec!["W", "W"]);
    }

    #[test]
    fn long_words_are_split() {
        assert_eq!(wrap_chars("ab supercalifragilistic", 6), vec![
            "ab", "superc", "alifra", "gilist", "ic"
        ]);
    }

    #[test]
    fn whitespace_collapses_and_empty_text_has_no_lines() {
        assert_eq!(wrap_chars("  one\t two\n\nthree ", 20), vec!["one two three"]);
        assert!(wrap_chars("   ", 10).is_empty());
        assert!(wrap("", 100.0, &MONO, 0.0).is_empty());
    }

    #[test]
    fn wrapping_is_idempotent() {
        let samples = [
            "The Ultimate Christmas Shopping List for Girls 2023",
            "How to get the best skin of your life: Your No Bullsh*t Guide",
            "a bb ccc dddd eeeee ffffff ggggggg hhhhhhhhhhhhhhhhhhhhhhhh i",
            "Items you need to glow up before 2024",
        ];
        for width in [30.0, 75.0, 120.0, 333.0] {
            for text in samples {
                let once = wrap(text, width, &MONO, 0.0);
                let twice = wrap(&once.join(" "), width, &MONO, 0.0);
                assert_eq!(once, twice, "width {width}: {text}");
            }
        }
    }

    #[test]
    fn alignment_offsets_each_line() {
        let lines = vec!["abcd".to_string(), "ab".to_string()];
        let mut opts = LayoutOptions {
            max_width: 100.0,
            line_spacing: 5.0,
            ..Default::default()
        };
        let left = position(&lines, Point::new(10, 50), &opts, &MONO);
        assert_eq!((left[0].x, left[1].x), (10.0, 10.0));
        assert_eq!((left[0].y, left[1].y), (50.0, 75.0));

        opts.alignment = Alignment::Center;
        let center = position(&lines, Point::new(10, 50), &opts, &MONO);
        assert_eq!((center[0].x, center[1].x), (40.0, 50.0));

        opts.alignment = Alignment::Right;
        let right = position(&lines, Point::new(10, 50), &opts, &MONO);
        assert_eq!((right[0].x, right[1].x), (70.0, 90.0));
        assert_eq!(right[0].x + right[0].width, 110.0);
    }

    #[test]
    fn letter_spacing_widens_lines() {
        assert_eq!(line_width("abc", &MONO, 4.0), 38.0);
        assert_eq!(line_width("", &MONO, 4.0), 0.0);
    }

    #[test]
    fn block_height_spans_all_lines() {
        let opts = LayoutOptions {
            max_width: 50.0,
            line_spacing: 5.0,
            ..Default::default()
        };
        let block = TextBlock::layout("one two three", Point::new(0, 0), &opts, &MONO);
        assert_eq!(block.lines.len(), 3);
        assert_eq!(block.height(), 70.0);
        assert_eq!(TextBlock::default().height(), 0.0);
    }

    #[test]
    fn alignment_parses_from_strings() {
        assert_eq!("Center".parse::<Alignment>().unwrap(), Alignment::Center);
        assert_eq!("right".parse::<Alignment>().unwrap(), Alignment::Right);
        assert!("justify".parse::<Alignment>().is_err());
        let a: Alignment = serde_json::from_str("\"left\"").unwrap();
        assert_eq!(a, Alignment::Left);
    }
}
