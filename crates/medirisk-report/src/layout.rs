//! Flowing layout on top of [`PageContent`]
//!
//! `Layout` keeps a cursor that moves down the page as blocks are added and
//! starts a new page whenever the next block does not fit above the bottom
//! margin.

use crate::font::Font;
use crate::pdf::{Color, DocumentInfo, PAGE_HEIGHT, PAGE_WIDTH, PageContent, write_document};

pub const MARGIN: f32 = 72.0;
const LEADING: f32 = 1.25;
const CELL_PADDING: f32 = 6.0;
const BULLET: &str = "•";
const BULLET_INDENT: f32 = 14.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub color: Color,
    pub align: Align,
    pub space_after: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: Font::Regular,
            size: 11.0,
            color: Color::BLACK,
            align: Align::Left,
            space_after: 6.0,
        }
    }
}

impl TextStyle {
    pub fn bold(mut self) -> Self {
        self.font = Font::Bold;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    pub fn space_after(mut self, space: f32) -> Self {
        self.space_after = space;
        self
    }

    fn line_height(&self) -> f32 {
        self.size * LEADING
    }
}

/// Grid table; every row should have one cell per column
#[derive(Clone, Debug)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    /// Relative column widths; equal widths when empty
    pub widths: Vec<f32>,
    /// Treat the first row as a header, repeated after page breaks
    pub header: bool,
    pub header_fill: Option<Color>,
    pub header_color: Color,
    /// Style the first column like the header
    pub label_column: bool,
    pub body_fill: Option<Color>,
    pub font_size: f32,
    pub align: Align,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            widths: Vec::new(),
            header: false,
            header_fill: None,
            header_color: Color::BLACK,
            label_column: false,
            body_fill: None,
            font_size: 10.0,
            align: Align::Left,
        }
    }

    pub fn with_header(mut self, fill: Option<Color>, color: Color) -> Self {
        self.header = true;
        self.header_fill = fill;
        self.header_color = color;
        self
    }

    pub fn with_label_column(mut self, fill: Option<Color>, color: Color) -> Self {
        self.label_column = true;
        self.header_fill = fill;
        self.header_color = color;
        self
    }

    pub fn with_widths(mut self, widths: Vec<f32>) -> Self {
        self.widths = widths;
        self
    }

    pub fn with_body_fill(mut self, fill: Color) -> Self {
        self.body_fill = Some(fill);
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    fn columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn column_widths(&self, total: f32) -> Vec<f32> {
        let columns = self.columns();
        if self.widths.len() == columns && self.widths.iter().all(|w| *w > 0.0) {
            let sum: f32 = self.widths.iter().sum();
            self.widths.iter().map(|w| total * w / sum).collect()
        } else {
            vec![total / columns.max(1) as f32; columns]
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: Color,
}

/// Horizontal bar chart, one labelled bar per row scaled to the largest value
#[derive(Clone, Debug, Default)]
pub struct BarChart {
    pub title: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bars: Vec::new(),
        }
    }

    pub fn bar(mut self, label: impl Into<String>, value: f64, color: Color) -> Self {
        self.bars.push(Bar {
            label: label.into(),
            value,
            color,
        });
        self
    }
}

/// Greedy word wrap; words wider than `max_width` are split by character
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if font.text_width(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if font.text_width(word, size) <= max_width {
                line = word.to_string();
                continue;
            }
            for c in word.chars() {
                line.push(c);
                if font.text_width(&line, size) > max_width && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                }
            }
        }
        lines.push(line);
    }
    lines
}

/// Page builder with a top-down cursor
pub struct Layout {
    pages: Vec<PageContent>,
    current: PageContent,
    y: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

impl Layout {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: PageContent::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn content_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    /// Remaining vertical space on the current page
    pub fn remaining(&self) -> f32 {
        self.y - MARGIN
    }

    pub fn page_count(&self) -> usize {
        self.pages.len() + 1
    }

    pub fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure(&mut self, height: f32) {
        // a block taller than a page is drawn anyway on a fresh page
        if height > self.remaining() && self.y < PAGE_HEIGHT - MARGIN {
            self.new_page();
        }
    }

    pub fn spacer(&mut self, height: f32) {
        if height >= self.remaining() {
            self.new_page();
        } else {
            self.y -= height;
        }
    }

    fn line_x(&self, text: &str, style: &TextStyle, left: f32, width: f32) -> f32 {
        match style.align {
            Align::Left => left,
            Align::Center => left + (width - style.font.text_width(text, style.size)).max(0.0) / 2.0,
        }
    }

    fn lines_at(&mut self, lines: &[String], style: &TextStyle, left: f32, width: f32) {
        for line in lines {
            self.ensure(style.line_height());
            self.y -= style.line_height();
            let x = self.line_x(line, style, left, width);
            self.current
                .text(x, self.y + style.size * 0.25, style.font, style.size, style.color, line);
        }
    }

    /// Wrapped text across the full content width
    pub fn paragraph(&mut self, text: &str, style: TextStyle) {
        let width = self.content_width();
        let lines = wrap_text(text, style.font, style.size, width);
        self.lines_at(&lines, &style, MARGIN, width);
        self.y -= style.space_after.min(self.remaining());
    }

    /// Bold section heading kept on the same page as the following line
    pub fn heading(&mut self, text: &str, style: TextStyle) {
        self.ensure(style.line_height() * 3.0);
        self.paragraph(text, style.bold());
    }

    /// A bullet with a hanging indent
    pub fn bullet(&mut self, text: &str, style: TextStyle) {
        let width = self.content_width() - BULLET_INDENT;
        let lines = wrap_text(text, style.font, style.size, width);
        self.ensure(style.line_height());
        let first_baseline = self.y - style.line_height() + style.size * 0.25;
        self.current
            .text(MARGIN, first_baseline, style.font, style.size, style.color, BULLET);
        self.lines_at(&lines, &style, MARGIN + BULLET_INDENT, width);
        self.y -= (style.space_after / 2.0).min(self.remaining());
    }

    pub fn table(&mut self, table: &Table) {
        let columns = table.columns();
        if columns == 0 {
            return;
        }
        let widths = table.column_widths(self.content_width());
        let line_height = table.font_size * LEADING;

        let layout_row = |row: &[String], bold: bool| -> (Vec<Vec<String>>, f32) {
            let font = if bold { Font::Bold } else { Font::Regular };
            let cells: Vec<Vec<String>> = (0..columns)
                .map(|i| {
                    let text = row.get(i).map(String::as_str).unwrap_or("");
                    wrap_text(text, font, table.font_size, widths[i] - 2.0 * CELL_PADDING)
                })
                .collect();
            let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            (cells, lines as f32 * line_height + 2.0 * CELL_PADDING)
        };

        let header = if table.header { table.rows.first() } else { None };
        let body_start = usize::from(header.is_some());

        if let Some(header) = header {
            let (cells, height) = layout_row(header, true);
            // keep the header with at least the first body row
            let next = table
                .rows
                .get(1)
                .map(|row| layout_row(row, false).1)
                .unwrap_or(0.0);
            self.ensure(height + next);
            self.draw_row(table, &widths, &cells, height, true);
        }

        for row in &table.rows[body_start..] {
            let (cells, height) = layout_row(row, false);
            if height > self.remaining() && self.y < PAGE_HEIGHT - MARGIN {
                self.new_page();
                if let Some(header) = header {
                    let (header_cells, header_height) = layout_row(header, true);
                    self.draw_row(table, &widths, &header_cells, header_height, true);
                }
            }
            self.draw_row(table, &widths, &cells, height, false);
        }
        self.y -= 12.0f32.min(self.remaining());
    }

    fn draw_row(
        &mut self,
        table: &Table,
        widths: &[f32],
        cells: &[Vec<String>],
        height: f32,
        is_header: bool,
    ) {
        let top = self.y;
        let bottom = top - height;
        let mut x = MARGIN;
        for (i, (lines, width)) in cells.iter().zip(widths).enumerate() {
            let styled = is_header || (table.label_column && i == 0);
            let fill = if styled { table.header_fill } else { table.body_fill };
            if let Some(fill) = fill {
                self.current.fill_rect(x, bottom, *width, height, fill);
            }
            self.current
                .stroke_rect(x, bottom, *width, height, 0.75, Color::BLACK);

            let style = TextStyle {
                font: if is_header { Font::Bold } else { Font::Regular },
                size: table.font_size,
                color: if styled { table.header_color } else { Color::BLACK },
                align: table.align,
                space_after: 0.0,
            };
            let mut baseline = top - CELL_PADDING - table.font_size;
            for line in lines {
                let line_x = self.line_x(line, &style, x + CELL_PADDING, width - 2.0 * CELL_PADDING);
                self.current
                    .text(line_x, baseline, style.font, style.size, style.color, line);
                baseline -= table.font_size * LEADING;
            }
            x += width;
        }
        self.y = bottom;
    }

    pub fn bar_chart(&mut self, chart: &BarChart) {
        const LABEL_WIDTH: f32 = 130.0;
        const VALUE_WIDTH: f32 = 50.0;
        const BAR_HEIGHT: f32 = 14.0;
        const GAP: f32 = 6.0;
        const FONT_SIZE: f32 = 10.0;

        let title = TextStyle::default().size(12.0);
        self.heading(&chart.title, title);

        let max = chart.bars.iter().map(|b| b.value).fold(0.0_f64, f64::max);
        let area = self.content_width() - LABEL_WIDTH - VALUE_WIDTH;
        let bar_x = MARGIN + LABEL_WIDTH;
        let (mut axis_page, mut axis_top) = (self.pages.len(), self.y);
        for bar in &chart.bars {
            self.ensure(BAR_HEIGHT + GAP);
            if self.pages.len() != axis_page {
                self.axis(bar_x, axis_top);
                (axis_page, axis_top) = (self.pages.len(), self.y);
            }
            self.y -= BAR_HEIGHT;
            let baseline = self.y + (BAR_HEIGHT - FONT_SIZE) / 2.0 + 1.0;
            self.current
                .text(MARGIN, baseline, Font::Regular, FONT_SIZE, Color::BLACK, &bar.label);

            let length = if max > 0.0 {
                (bar.value.max(0.0) / max) as f32 * area
            } else {
                0.0
            };
            if length > 0.0 {
                self.current.fill_rect(bar_x, self.y, length, BAR_HEIGHT, bar.color);
            }
            self.current.text(
                bar_x + length + 4.0,
                baseline,
                Font::Regular,
                FONT_SIZE,
                Color::BLACK,
                &format_value(bar.value),
            );
            self.y -= GAP.min(self.remaining());
        }
        if !chart.bars.is_empty() {
            self.axis(bar_x, axis_top);
        }
        self.y -= 12.0f32.min(self.remaining());
    }

    fn axis(&mut self, x: f32, top: f32) {
        if top > self.y {
            self.current.line((x, self.y), (x, top), 0.5, Color::GREY);
        }
    }

    /// Serialize every page into a PDF file
    pub fn finish(mut self, info: &DocumentInfo) -> Vec<u8> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        write_document(&self.pages, info)
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_wrap_text_fits_width() {
        let text = "The quick brown fox jumps over the lazy dog again and again";
        let lines = wrap_text(text, Font::Regular, 12.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Regular.text_width(line, 12.0) <= 120.0, "{}", line);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_splits_long_word() {
        let lines = wrap_text(&"W".repeat(40), Font::Bold, 12.0, 60.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "W".repeat(40));
    }

    #[test]
    fn test_wrap_text_keeps_empty_lines() {
        assert_eq!(wrap_text("", Font::Regular, 10.0, 100.0), vec![String::new()]);
        assert_eq!(wrap_text("a\n\nb", Font::Regular, 10.0, 100.0).len(), 3);
    }

    #[test]
    fn test_page_breaks() {
        let mut layout = Layout::new();
        for i in 0..120 {
            layout.paragraph(&format!("Line {}", i), TextStyle::default());
        }
        assert!(layout.page_count() >= 3);
        let pdf = layout.finish(&DocumentInfo::new("Pages", Utc::now()));
        assert!(count(&pdf, b"/Type /Page /Parent") >= 3);
    }

    #[test]
    fn test_table_repeats_header_after_break() {
        let mut rows = vec![vec!["Parameter".to_string(), "Value".to_string()]];
        for i in 0..80 {
            rows.push(vec![format!("row {}", i), i.to_string()]);
        }
        let table = Table::new(rows).with_header(Some(Color::GREY), Color::WHITE_SMOKE);
        let mut layout = Layout::new();
        layout.table(&table);
        let pages = layout.page_count();
        assert!(pages >= 2);
        let pdf = layout.finish(&DocumentInfo::new("Table", Utc::now()));
        assert_eq!(count(&pdf, b"(Parameter) Tj"), pages);
    }

    #[test]
    fn test_bar_chart_scales_to_max() {
        let chart = BarChart::new("Risk levels")
            .bar("High", 4.0, Color::RED)
            .bar("Low", 2.0, Color::GREEN)
            .bar("None", 0.0, Color::GREY);
        let mut layout = Layout::new();
        let area = layout.content_width() - 180.0;
        layout.bar_chart(&chart);
        let pdf = layout.finish(&DocumentInfo::new("Chart", Utc::now()));
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains(&format!(" {} 14 re", crate::pdf::num(area))));
        assert!(text.contains(&format!(" {} 14 re", crate::pdf::num(area / 2.0))));
        // zero values draw no bar
        assert_eq!(count(&pdf, b" 14 re\nf"), 2);
        assert!(text.contains("(0) Tj"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(33.33), "33.3");
    }

    proptest! {
        #[test]
        fn wrapped_lines_never_exceed_width(words in proptest::collection::vec("[a-zA-Z]{1,12}", 0..40), width in 40.0f32..400.0) {
            let text = words.join(" ");
            for line in wrap_text(&text, Font::Regular, 11.0, width) {
                prop_assert!(line.chars().count() == 1 || Font::Regular.text_width(&line, 11.0) <= width);
            }
        }
    }
}
