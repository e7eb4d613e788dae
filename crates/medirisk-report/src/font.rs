//! Base-14 Helvetica metrics and WinAnsi text encoding

/// The two faces every report uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    pub const ALL: [Font; 2] = [Font::Regular, Font::Bold];

    /// Name in the page resource dictionary
    pub fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    fn ascii_widths(&self) -> &'static [u16; 95] {
        match self {
            Font::Regular => &HELVETICA,
            Font::Bold => &HELVETICA_BOLD,
        }
    }

    /// Advance width of one encoded byte in 1/1000 em
    pub fn glyph_width(&self, byte: u8) -> u16 {
        match byte {
            32..=126 => self.ascii_widths()[(byte - 32) as usize],
            0x95 => 350,
            0x96 => 556,
            0x97 => 1000,
            0x91 | 0x92 => 222,
            0x93 | 0x94 => 333,
            0xA0 => 278,
            _ => 556,
        }
    }

    /// Width of `text` in points at `size`
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| self.glyph_width(encode_char(c)) as u32)
            .sum();
        units as f32 * size / 1000.0
    }
}

// AFM advance widths for code points 32..=126
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Map one character to its WinAnsiEncoding byte, `?` when it has none
pub fn encode_char(c: char) -> u8 {
    match c {
        '€' => 0x80,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        // C1 controls have no glyph
        '\u{80}'..='\u{9F}' => b'?',
        '\t' => b' ',
        c if (c as u32) < 0x20 => b'?',
        c if (c as u32) <= 0xFF => c as u32 as u8,
        _ => b'?',
    }
}

/// Encode `text` as the body of a PDF literal string
pub fn encode_literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 8);
    for c in text.chars() {
        let byte = encode_char(c);
        if matches!(byte, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_char() {
        assert_eq!(encode_char('A'), b'A');
        assert_eq!(encode_char('é'), 0xE9);
        assert_eq!(encode_char('²'), 0xB2);
        assert_eq!(encode_char('•'), 0x95);
        assert_eq!(encode_char('–'), 0x96);
        assert_eq!(encode_char('漢'), b'?');
        assert_eq!(encode_char('\u{85}'), b'?');
        assert_eq!(encode_char('\n'), b'?');
    }

    #[test]
    fn test_encode_literal_escapes() {
        assert_eq!(encode_literal(r"a(b)c\d"), br"a\(b\)c\\d".to_vec());
        assert_eq!(encode_literal("BMI: 31 kg/m²"), b"BMI: 31 kg/m\xB2".to_vec());
    }

    #[test]
    fn test_text_width() {
        // "Hi" = H(722) + i(222)
        assert!((Font::Regular.text_width("Hi", 10.0) - 9.44).abs() < 1e-4);
        assert!(Font::Bold.text_width("Hi", 10.0) > Font::Regular.text_width("Hi", 10.0));
        assert_eq!(Font::Regular.text_width("", 12.0), 0.0);
    }

    #[test]
    fn test_resources() {
        assert_eq!(Font::Regular.resource(), "F1");
        assert_eq!(Font::Bold.base_font(), "Helvetica-Bold");
    }
}
