//! Shared text styles

use crate::layout::TextStyle;
use crate::pdf::Color;

pub const NAVY: Color = Color::hex(0x1B4F72);
pub const BLUE: Color = Color::hex(0x2E86C1);
pub const SLATE: Color = Color::hex(0x566573);

pub fn title() -> TextStyle {
    TextStyle::default()
        .bold()
        .size(24.0)
        .color(NAVY)
        .centered()
        .space_after(18.0)
}

pub fn subtitle() -> TextStyle {
    TextStyle::default()
        .size(14.0)
        .color(BLUE)
        .centered()
        .space_after(14.0)
}

pub fn header() -> TextStyle {
    TextStyle::default().size(12.0).color(SLATE).space_after(8.0)
}

pub fn section() -> TextStyle {
    TextStyle::default().size(14.0).space_after(8.0)
}

pub fn subsection() -> TextStyle {
    TextStyle::default().size(12.0).color(SLATE).space_after(4.0)
}
