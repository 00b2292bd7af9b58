use smart_default::SmartDefault;
use super::Color;

bitflags::bitflags! {
    /// Independent character-style bits. Script position and underline are
    /// separate fields since their variants are mutually exclusive.
    pub struct FontFlags: u32 {
        const BOLD       = 0x0001;
        const ITALIC     = 0x0002;
        const OUTLINE    = 0x0004;
        const SHADOW     = 0x0008;
        const EMBOSS     = 0x0010;
        const ENGRAVE    = 0x0020;
        const ALL_CAPS   = 0x0040;
        const SMALL_CAPS = 0x0080;
        const LOWERCASE  = 0x0100;
        const STRIKEOUT  = 0x0200;
        const HIDDEN     = 0x0400;
        const BLINK      = 0x0800;
        const REVERSED   = 0x1000;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnderlineStyle {
    None,
    Single,
    Double,
    Dot,
    Dash,
}

/// Vertical script position. Superscript and subscript cannot combine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Script {
    Normal,
    Superscript,
    Subscript,
}

/// A character style.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct Font {
    /// Font face id in the source file's font table; `-1` when unset.
    #[default(-1)]
    pub id: i32,
    /// Face name, when the file carries one.
    pub name: Option<String>,
    #[default(12.0)]
    pub size: f64,
    #[default(FontFlags::empty())]
    pub flags: FontFlags,
    #[default(UnderlineStyle::None)]
    pub underline: UnderlineStyle,
    #[default(Script::Normal)]
    pub script: Script,
    /// Additional letter spacing in points; negative condenses.
    pub letter_spacing: f64,
    /// `None` inherits the surrounding colour.
    pub color: Option<Color>,
    pub language: Option<String>,
}

impl Font {
    #[must_use]
    pub fn new(id: i32, size: f64) -> Self {
        let mut font = Self::default();
        font.id = id;
        font.set_size(size);
        font
    }

    /// Point sizes are strictly positive; anything else keeps the current
    /// size.
    pub fn set_size(&mut self, size: f64) {
        if size > 0.0 {
            self.size = size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_must_stay_positive() {
        let mut font = Font::new(3, 10.0);
        font.set_size(0.0);
        assert_eq!(font.size, 10.0);
        font.set_size(-2.0);
        assert_eq!(font.size, 10.0);
        font.set_size(14.0);
        assert_eq!(font.size, 14.0);
    }

    #[test]
    fn flags_are_independent() {
        let mut font = Font::default();
        font.flags = FontFlags::BOLD | FontFlags::SHADOW;
        assert!(font.flags.contains(FontFlags::BOLD));
        assert!(!font.flags.contains(FontFlags::ITALIC));
    }
}
