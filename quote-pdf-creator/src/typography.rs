//! Line breaking for document text
//!
//! Greedy fill on Unicode word boundaries. Words wider than the column are
//! split between characters.

use crate::fonts::{FontContext, Weight};
use unicode_segmentation::UnicodeSegmentation;

/// Text style for a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: Weight,
    pub color: [u8; 3],
}

impl TextStyle {
    pub fn regular(size: f32) -> Self {
        Self { size, weight: Weight::Regular, color: [0x33, 0x33, 0x33] }
    }

    pub fn bold(size: f32) -> Self {
        Self { size, weight: Weight::Bold, color: [0x22, 0x22, 0x22] }
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }
}

/// Wraps text to a column width using font metrics
pub struct TextLayoutEngine<'a> {
    fonts: &'a FontContext,
}

impl<'a> TextLayoutEngine<'a> {
    pub fn new(fonts: &'a FontContext) -> Self {
        Self { fonts }
    }

    pub fn width(&self, text: &str, style: &TextStyle) -> f32 {
        self.fonts.text_width(text, style.size, style.weight)
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Always returns at least one line, so an empty paragraph still takes
    /// vertical space.
    pub fn wrap(&self, text: &str, style: &TextStyle, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for segment in text.split_word_bounds() {
            let candidate = format!("{}{}", current, segment);
            if self.width(candidate.trim_end(), style) <= max_width {
                current = candidate;
                continue;
            }

            if !current.trim().is_empty() {
                lines.push(current.trim_end().to_string());
                current.clear();
            }
            if segment.trim().is_empty() {
                // whitespace at a break point is dropped
                continue;
            }

            if self.width(segment, style) <= max_width {
                current.push_str(segment);
            } else {
                let mut pieces = self.break_long_word(segment, style, max_width);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        if !current.trim().is_empty() || lines.is_empty() {
            lines.push(current.trim_end().to_string());
        }
        lines
    }

    fn break_long_word(&self, word: &str, style: &TextStyle, max_width: f32) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        for grapheme in word.graphemes(true) {
            let candidate = format!("{}{}", current, grapheme);
            if !current.is_empty() && self.width(&candidate, style) > max_width {
                pieces.push(std::mem::take(&mut current));
                current.push_str(grapheme);
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}
