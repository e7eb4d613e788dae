//! Minimal PDF 1.4 document writer
//!
//! Produces uncompressed files with one content stream per page and the two
//! Helvetica faces from [`Font`]. Object layout:
//!
//! - 1: catalog
//! - 2: page tree
//! - 3, 4: fonts
//! - 5: document info
//! - 6.. : a page object followed by its content stream, for every page

use std::io::Write;

use chrono::{DateTime, Utc};

use crate::font::{Font, encode_literal};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const INFO_ID: usize = 5;
const FIRST_PAGE_ID: usize = 6;

/// RGB colour with components in 0..=1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

impl Color {
    pub const BLACK: Color = Color(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color(1.0, 1.0, 1.0);
    pub const WHITE_SMOKE: Color = Color(0.961, 0.961, 0.961);
    pub const GREY: Color = Color(0.502, 0.502, 0.502);
    pub const BEIGE: Color = Color(0.961, 0.961, 0.863);
    pub const RED: Color = Color(1.0, 0.0, 0.0);
    pub const ORANGE: Color = Color(1.0, 0.647, 0.0);
    pub const GREEN: Color = Color(0.0, 0.502, 0.0);

    /// Build from a `#RRGGBB` literal
    pub const fn hex(rgb: u32) -> Color {
        Color(
            ((rgb >> 16) & 0xFF) as f32 / 255.0,
            ((rgb >> 8) & 0xFF) as f32 / 255.0,
            (rgb & 0xFF) as f32 / 255.0,
        )
    }
}

/// Format a number the way content streams expect: short, no exponent
pub(crate) fn num(value: f32) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Drawing operators for a single page
#[derive(Debug, Default, Clone)]
pub struct PageContent {
    ops: Vec<u8>,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Place `text` with its baseline origin at (x, y)
    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Color, text: &str) {
        let Color(r, g, b) = color;
        let head = format!(
            "BT\n/{} {} Tf\n{} {} {} rg\n{} {} Td\n(",
            font.resource(),
            num(size),
            num(r),
            num(g),
            num(b),
            num(x),
            num(y)
        );
        self.ops.extend_from_slice(head.as_bytes());
        self.ops.extend_from_slice(&encode_literal(text));
        self.ops.extend_from_slice(b") Tj\nET\n");
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let Color(r, g, b) = color;
        let op = format!(
            "{} {} {} rg\n{} {} {} {} re\nf\n",
            num(r),
            num(g),
            num(b),
            num(x),
            num(y),
            num(width),
            num(height)
        );
        self.ops.extend_from_slice(op.as_bytes());
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line: f32, color: Color) {
        let Color(r, g, b) = color;
        let op = format!(
            "{} {} {} RG\n{} w\n{} {} {} {} re\nS\n",
            num(r),
            num(g),
            num(b),
            num(line),
            num(x),
            num(y),
            num(width),
            num(height)
        );
        self.ops.extend_from_slice(op.as_bytes());
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), line: f32, color: Color) {
        let Color(r, g, b) = color;
        let op = format!(
            "{} {} {} RG\n{} w\n{} {} m\n{} {} l\nS\n",
            num(r),
            num(g),
            num(b),
            num(line),
            num(from.0),
            num(from.1),
            num(to.0),
            num(to.1)
        );
        self.ops.extend_from_slice(op.as_bytes());
    }
}

/// Document information dictionary entries
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub producer: String,
    pub created: DateTime<Utc>,
}

impl DocumentInfo {
    pub fn new(title: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            producer: format!("{} {}", medirisk_common::SERVICE_NAME, medirisk_common::SERVICE_VERSION),
            created,
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

struct ObjectWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl ObjectWriter {
    fn new(object_count: usize) -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        // binary marker so transports treat the file as binary
        buf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: vec![0; object_count],
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets[id - 1] = self.buf.len();
        // writes into a Vec cannot fail
        let _ = writeln!(self.buf, "{} 0 obj", id);
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, data: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(id, &body);
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let size = self.offsets.len() + 1;
        let _ = write!(self.buf, "xref\n0 {}\n0000000000 65535 f \n", size);
        for offset in &self.offsets {
            let _ = writeln!(self.buf, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            self.buf,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, CATALOG_ID, INFO_ID, xref_offset
        );
        self.buf
    }
}

fn literal(text: &str) -> Vec<u8> {
    let mut out = vec![b'('];
    out.extend_from_slice(&encode_literal(text));
    out.push(b')');
    out
}

/// Serialize `pages` into a complete PDF file
///
/// An empty page list still yields one blank page so the output is always
/// a valid document.
pub fn write_document(pages: &[PageContent], info: &DocumentInfo) -> Vec<u8> {
    let blank = [PageContent::new()];
    let pages = if pages.is_empty() { &blank[..] } else { pages };

    let object_count = FIRST_PAGE_ID - 1 + pages.len() * 2;
    let mut writer = ObjectWriter::new(object_count);

    writer.object(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID).as_bytes(),
    );

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_ID + i * 2))
        .collect::<Vec<_>>()
        .join(" ");
    writer.object(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 {} {}] >>",
            kids,
            pages.len(),
            num(PAGE_WIDTH),
            num(PAGE_HEIGHT)
        )
        .as_bytes(),
    );

    for (i, font) in Font::ALL.iter().enumerate() {
        writer.object(
            3 + i,
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_font()
            )
            .as_bytes(),
        );
    }

    let mut info_body = b"<< /Title ".to_vec();
    info_body.extend_from_slice(&literal(&info.title));
    info_body.extend_from_slice(b" /Producer ");
    info_body.extend_from_slice(&literal(&info.producer));
    info_body.extend_from_slice(b" /CreationDate ");
    info_body.extend_from_slice(&literal(&info.created.format("D:%Y%m%d%H%M%SZ").to_string()));
    info_body.extend_from_slice(b" >>");
    writer.object(INFO_ID, &info_body);

    for (i, page) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_ID + i * 2;
        writer.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGES_ID,
                page_id + 1
            )
            .as_bytes(),
        );
        writer.stream(page_id + 1, page.as_bytes());
    }

    writer.finish()
}
