//! Text layout: greedy word wrap against measured glyph widths.
//!
//! Layout is pure with respect to a [`TextMeasure`], so the wrapping and
//! truncation rules are tested here with a synthetic font and reused
//! unchanged by the real rusttype faces in [`fonts`](super::fonts).
//!
//! ## Rules
//!
//! - Markup tags (`<code>`, `<em>`, ...) are stripped first.
//! - Words are split on whitespace and appended to the current line while
//!   the *whole* candidate line still measures within the box width.
//! - A line always holds at least one word; a word wider than the box stands
//!   alone and is never broken.
//! - Only the first `max_lines` lines are kept. The rest is dropped silently.
//! - The top bearing of the whole first line is subtracted from the vertical
//!   placement, so the tallest glyph of that line touches the top padding and
//!   no ink is cut off above the box.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex must compile"));

/// Measured extent of a single line of text, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextExtent {
    /// Right edge of the rightmost glyph.
    pub width: f32,
    /// Distance from the top of the line box to the top of the ink.
    pub top: f32,
}

/// Glyph metrics needed by the layout engine.
pub trait TextMeasure {
    /// Measure one line of text.
    fn measure(&self, text: &str) -> TextExtent;

    /// Height of a line box (ascent to descent) without extra spacing.
    fn line_height(&self) -> f32;
}

/// Box a text block is laid out into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub width: u32,
    pub height: u32,
    pub max_lines: usize,
    /// Extra spacing between lines; half of it is added above the first line.
    pub spacing: f32,
}

/// Result of laying out a text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    /// Top bearing of the first line.
    pub bearing: f32,
    /// Y coordinate of the first line box within the text box.
    pub first_line_y: f32,
    /// Distance between consecutive line boxes.
    pub line_advance: f32,
}

impl TextLayout {
    /// Lines paired with the y coordinate each should be drawn at.
    pub fn positioned_lines(&self) -> impl Iterator<Item = (&str, f32)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (line.as_str(), self.first_line_y + i as f32 * self.line_advance))
    }
}

/// Remove markup tags left over in titles and descriptions.
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    MARKUP_TAG.replace_all(text, "")
}

/// Greedily wrap `text` into lines no wider than `max_width`.
///
/// Returns all lines (no truncation) and the top bearing of the first line
/// (0 for empty input). Empty input yields one empty line.
pub fn wrap_lines<M: TextMeasure + ?Sized>(
    measure: &M,
    max_width: f32,
    text: &str,
) -> (Vec<String>, f32) {
    let text = strip_markup(text);
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current.join(" "), word)
        };
        if current.is_empty() || measure.measure(&candidate).width <= max_width {
            current.push(word);
        } else {
            lines.push(current.join(" "));
            current = vec![word];
        }
    }
    lines.push(current.join(" "));

    let bearing = if lines[0].is_empty() {
        0.0
    } else {
        measure.measure(&lines[0]).top
    };
    (lines, bearing)
}

/// Lay out `text` into `text_box`: wrap, truncate, and compute placement.
pub fn layout_text<M: TextMeasure + ?Sized>(
    measure: &M,
    text_box: &TextBox,
    text: &str,
) -> TextLayout {
    let (mut lines, bearing) = wrap_lines(measure, text_box.width as f32, text);
    lines.truncate(text_box.max_lines);

    TextLayout {
        lines,
        bearing,
        first_line_y: text_box.spacing / 2.0 - bearing,
        line_advance: measure.line_height() + text_box.spacing - bearing,
    }
}
