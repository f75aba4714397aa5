//! Quote document layout
//!
//! Turns a snapshot into positioned draw commands in bitmap pixels. The
//! rasterizer paints these commands; nothing here touches pixels.

use crate::fonts::FontContext;
use crate::options::ExportOptions;
use crate::quote::{LineItem, QuoteSnapshot};
use crate::totals::{format_currency, parse_amount, QuoteTotals};
use crate::typography::{TextLayoutEngine, TextStyle};

// Sizes below are document pixels; they are multiplied by the render scale.
const PADDING: f32 = 40.0;
const BODY_SIZE: f32 = 14.0;
const TITLE_SIZE: f32 = 26.0;
const HEADING_SIZE: f32 = 18.0;
const TABLE_SIZE: f32 = 12.0;
const LINE_SPACING: f32 = 1.25;
const CELL_PADDING: f32 = 6.0;
const SECTION_GAP: f32 = 20.0;

const ACCENT: [u8; 3] = [0x1f, 0x3a, 0x68];
const HEADER_FILL: [u8; 3] = [0xe9, 0xee, 0xf5];
const GRID: [u8; 3] = [0xcc, 0xcc, 0xcc];

/// Column titles and relative widths of the services table
const COLUMNS: [(&str, f32); 5] = [
    ("Service", 0.20),
    ("Description", 0.38),
    ("Quantity", 0.12),
    ("Unit Price", 0.15),
    ("Total", 0.15),
];

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// One line of text; `y` is the top of its line box
    Text { x: f32, y: f32, text: String, style: TextStyle },
    Fill { x: f32, y: f32, width: f32, height: f32, color: [u8; 3] },
}

/// Positioned document ready to paint
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct LayoutCursor<'a> {
    engine: TextLayoutEngine<'a>,
    fonts: &'a FontContext,
    scale: f32,
    left: f32,
    right: f32,
    y: f32,
    commands: Vec<DrawCommand>,
}

impl<'a> LayoutCursor<'a> {
    fn px(&self, document_px: f32) -> f32 {
        document_px * self.scale
    }

    fn scaled(&self, style: TextStyle) -> TextStyle {
        TextStyle { size: style.size * self.scale, ..style }
    }

    fn line_height(&self, style: &TextStyle) -> f32 {
        self.fonts.line_height(style.size, LINE_SPACING)
    }

    /// Lay out a wrapped block of text between `x` and `x + width` starting at `y`.
    /// Returns the height used.
    fn text_block(&mut self, text: &str, style: TextStyle, x: f32, y: f32, width: f32, align: Align) -> f32 {
        let lines = self.engine.wrap(text, &style, width);
        let line_height = self.line_height(&style);
        for (i, line) in lines.iter().enumerate() {
            let line_x = match align {
                Align::Left => x,
                Align::Right => x + width - self.engine.width(line, &style),
            };
            self.commands.push(DrawCommand::Text {
                x: line_x,
                y: y + i as f32 * line_height,
                text: line.clone(),
                style,
            });
        }
        lines.len() as f32 * line_height
    }

    fn paragraph(&mut self, text: &str, style: TextStyle) {
        let style = self.scaled(style);
        let (left, width, y) = (self.left, self.right - self.left, self.y);
        self.y += self.text_block(text, style, left, y, width, Align::Left);
    }

    /// Bold label followed by regular text on the same baseline
    fn labelled(&mut self, label: &str, value: &str) {
        let label_style = self.scaled(TextStyle::bold(BODY_SIZE));
        let value_style = self.scaled(TextStyle::regular(BODY_SIZE));
        let label_width = self.engine.width(label, &label_style) + self.px(8.0);
        let (left, y) = (self.left, self.y);

        self.commands.push(DrawCommand::Text { x: left, y, text: label.to_string(), style: label_style });
        let value_width = (self.right - left - label_width).max(self.px(40.0));
        let used = self.text_block(value, value_style, left + label_width, y, value_width, Align::Left);
        self.y += used.max(self.line_height(&label_style));
    }

    fn rule(&mut self, thickness: f32, color: [u8; 3]) {
        let height = self.px(thickness).max(1.0);
        self.commands.push(DrawCommand::Fill {
            x: self.left,
            y: self.y,
            width: self.right - self.left,
            height,
            color,
        });
        self.y += height;
    }

    fn gap(&mut self, document_px: f32) {
        self.y += self.px(document_px);
    }
}

/// Lay out the quote the way the preview shows it
pub fn layout_quote_document(
    snapshot: &QuoteSnapshot,
    fonts: &FontContext,
    options: &ExportOptions,
) -> DocumentLayout {
    let scale = options.render_scale;
    let width = (options.document_width * scale).round();
    let mut cursor = LayoutCursor {
        engine: TextLayoutEngine::new(fonts),
        fonts,
        scale,
        left: PADDING * scale,
        right: width - PADDING * scale,
        y: PADDING * scale,
        commands: Vec::new(),
    };

    layout_header(&mut cursor, snapshot);
    layout_client(&mut cursor, snapshot);
    for paragraph in snapshot.body_paragraphs() {
        cursor.paragraph(paragraph, TextStyle::regular(BODY_SIZE));
        cursor.gap(6.0);
    }
    cursor.gap(SECTION_GAP);
    layout_items_table(&mut cursor, &snapshot.line_items);
    layout_totals(&mut cursor, snapshot);
    cursor.gap(SECTION_GAP * 1.5);
    cursor.paragraph("Sincerely,", TextStyle::regular(BODY_SIZE));
    cursor.gap(PADDING);

    DocumentLayout {
        width: width as u32,
        height: cursor.y.ceil() as u32,
        commands: cursor.commands,
    }
}

fn layout_header(cursor: &mut LayoutCursor<'_>, snapshot: &QuoteSnapshot) {
    let title = cursor.scaled(TextStyle::bold(TITLE_SIZE).with_color(ACCENT));
    let date_style = cursor.scaled(TextStyle::regular(BODY_SIZE));
    let (left, right, y) = (cursor.left, cursor.right, cursor.y);

    cursor.commands.push(DrawCommand::Text { x: left, y, text: "QUOTE".to_string(), style: title });
    let date_line = format!("Date: {}", snapshot.formatted_date());
    let half = (right - left) / 2.0;
    cursor.text_block(&date_line, date_style, left + half, y, half, Align::Right);

    cursor.y += cursor.line_height(&title);
    cursor.gap(8.0);
    cursor.rule(3.0, ACCENT);
    cursor.gap(SECTION_GAP);
}

fn layout_client(cursor: &mut LayoutCursor<'_>, snapshot: &QuoteSnapshot) {
    cursor.labelled("To:", &snapshot.client_name);
    cursor.gap(4.0);
    cursor.labelled("Subject:", &snapshot.subject);
    cursor.gap(SECTION_GAP);
}

fn layout_items_table(cursor: &mut LayoutCursor<'_>, items: &[LineItem]) {
    cursor.paragraph("Services & Pricing", TextStyle::bold(HEADING_SIZE).with_color(ACCENT));
    cursor.gap(8.0);

    let table_width = cursor.right - cursor.left;
    let mut column_x = Vec::with_capacity(COLUMNS.len());
    let mut x = cursor.left;
    for (_, share) in COLUMNS {
        column_x.push((x, table_width * share));
        x += table_width * share;
    }

    let header: Vec<String> = COLUMNS.iter().map(|(title, _)| title.to_string()).collect();
    table_row(cursor, &column_x, &header, TextStyle::bold(TABLE_SIZE), Some(HEADER_FILL));

    for item in items {
        let cells = vec![
            item.label.clone(),
            item.description.clone(),
            item.quantity.clone(),
            format_currency(parse_amount(&item.unit_price)),
            format_currency(parse_amount(&item.total)),
        ];
        table_row(cursor, &column_x, &cells, TextStyle::regular(TABLE_SIZE), None);
    }
}

fn table_row(
    cursor: &mut LayoutCursor<'_>,
    columns: &[(f32, f32)],
    cells: &[String],
    style: TextStyle,
    fill: Option<[u8; 3]>,
) {
    let style = cursor.scaled(style);
    let pad = cursor.px(CELL_PADDING);
    let top = cursor.y;

    // Measure first so the background can be drawn beneath the text.
    let engine = TextLayoutEngine::new(cursor.fonts);
    let line_height = cursor.line_height(&style);
    let tallest = columns
        .iter()
        .zip(cells)
        .map(|((_, width), text)| engine.wrap(text, &style, width - 2.0 * pad).len())
        .max()
        .unwrap_or(1);
    let row_height = tallest as f32 * line_height + 2.0 * pad;

    if let Some(color) = fill {
        cursor.commands.push(DrawCommand::Fill {
            x: cursor.left,
            y: top,
            width: cursor.right - cursor.left,
            height: row_height,
            color,
        });
    }
    for (index, ((x, width), text)) in columns.iter().zip(cells).enumerate() {
        // numeric columns are right aligned
        let align = if index >= 3 { Align::Right } else { Align::Left };
        cursor.text_block(text, style, x + pad, top + pad, width - 2.0 * pad, align);
    }

    cursor.y = top + row_height;
    cursor.rule(1.0, GRID);
}

fn layout_totals(cursor: &mut LayoutCursor<'_>, snapshot: &QuoteSnapshot) {
    let totals = QuoteTotals::from_snapshot(snapshot);
    cursor.gap(10.0);

    let mut rows = vec![("Subtotal:".to_string(), format_currency(totals.subtotal), false)];
    if totals.has_tax() {
        let percent = snapshot.tax_percentage.as_deref().unwrap_or("").trim();
        rows.push((format!("Tax ({}%):", percent), format_currency(totals.tax_amount), false));
    }
    rows.push(("Total:".to_string(), format_currency(totals.grand_total), true));

    let value_width = cursor.px(120.0);
    let label_width = cursor.px(160.0);
    let value_x = cursor.right - value_width;
    let label_x = value_x - label_width;

    for (label, value, emphasised) in rows {
        let style = if emphasised {
            cursor.scaled(TextStyle::bold(BODY_SIZE))
        } else {
            cursor.scaled(TextStyle::regular(BODY_SIZE))
        };
        let y = cursor.y;
        cursor.text_block(&label, style, label_x, y, label_width, Align::Right);
        cursor.text_block(&value, style, value_x, y, value_width, Align::Right);
        cursor.y += cursor.line_height(&style) + cursor.px(2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FONT_ENV_VAR, REGULAR_CANDIDATES};
    use std::path::PathBuf;

    /// Regular face read from disk, or `None` on machines without a font
    fn fonts() -> Option<FontContext> {
        let path = std::env::var_os(FONT_ENV_VAR).map(PathBuf::from).or_else(|| {
            REGULAR_CANDIDATES
                .iter()
                .map(|(_, path)| PathBuf::from(path))
                .find(|path| path.exists())
        });
        let Some(path) = path else {
            eprintln!("skipping: no document font available");
            return None;
        };
        let loaded = std::fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|data| FontContext::from_bytes(data, None));
        match loaded {
            Ok(fonts) => Some(fonts),
            Err(e) => {
                eprintln!("skipping: {}: {:#}", path.display(), e);
                None
            }
        }
    }

    fn guard_quote(tax_percentage: Option<&str>) -> QuoteSnapshot {
        QuoteSnapshot {
            date: "2026-10-19".to_string(),
            client_name: "Dana Reyes".to_string(),
            subject: "Event security".to_string(),
            body: "Please find our quote below.".to_string(),
            tax_percentage: tax_percentage.map(str::to_string),
            line_items: vec![LineItem::new("Guard", "Front gate", "2", "35.00", "70.00")],
        }
    }

    fn texts(layout: &DocumentLayout) -> Vec<&str> {
        layout
            .commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                DrawCommand::Fill { .. } => None,
            })
            .collect()
    }

    fn position(texts: &[&str], wanted: &str) -> usize {
        texts
            .iter()
            .position(|text| *text == wanted)
            .unwrap_or_else(|| panic!("{:?} not drawn in {:?}", wanted, texts))
    }

    #[test]
    fn sections_are_drawn_top_to_bottom() {
        let Some(fonts) = fonts() else { return };
        let layout = layout_quote_document(&guard_quote(None), &fonts, &ExportOptions::default());
        let texts = texts(&layout);

        let order = [
            "QUOTE",
            "Date: October 19, 2026",
            "To:",
            "Dana Reyes",
            "Subject:",
            "Event security",
            "Please find our quote below.",
            "Services & Pricing",
            "Service",
            "Description",
            "Quantity",
            "Unit Price",
            "Total",
            "Guard",
            "Front gate",
            "2",
            "$35.00",
            "Subtotal:",
            "Total:",
            "Sincerely,",
        ];
        let positions: Vec<usize> = order.iter().map(|wanted| position(&texts, wanted)).collect();
        assert!(
            positions.windows(2).all(|pair| pair[0] < pair[1]),
            "out of order: {:?}",
            texts
        );
        assert_eq!(texts.last(), Some(&"Sincerely,"));

        // row total, subtotal and grand total
        assert_eq!(texts.iter().filter(|text| **text == "$70.00").count(), 3);

        // text runs are laid out downwards
        let text_tops: Vec<f32> = layout
            .commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, y, .. } if text == "QUOTE" || text == "Sincerely," => Some(*y),
                _ => None,
            })
            .collect();
        assert!(text_tops[0] < text_tops[1]);
        assert!(layout.height as f32 > text_tops[1]);
    }

    #[test]
    fn tax_row_is_omitted_without_a_numeric_percentage() {
        let Some(fonts) = fonts() else { return };
        for tax in [None, Some(""), Some("abc")] {
            let layout = layout_quote_document(&guard_quote(tax), &fonts, &ExportOptions::default());
            let texts = texts(&layout);
            assert!(
                !texts.iter().any(|text| text.starts_with("Tax (")),
                "tax {:?} drew {:?}",
                tax,
                texts
            );
            let subtotal = position(&texts, "Subtotal:");
            assert_eq!(&texts[subtotal..subtotal + 4], &["Subtotal:", "$70.00", "Total:", "$70.00"]);
        }
    }

    #[test]
    fn tax_row_shows_percentage_and_amount() {
        let Some(fonts) = fonts() else { return };
        let layout = layout_quote_document(&guard_quote(Some("10")), &fonts, &ExportOptions::default());
        let texts = texts(&layout);

        let subtotal = position(&texts, "Subtotal:");
        assert_eq!(
            &texts[subtotal..subtotal + 6],
            &["Subtotal:", "$70.00", "Tax (10%):", "$7.00", "Total:", "$77.00"]
        );
    }
}
