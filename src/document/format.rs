use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumIter, IntoStaticStr};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextStyle: u8 {
        const BOLD = 0b0001;
        const ITALIC = 0b0010;
        const UNDERLINE = 0b0100;
        const STRIKE = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Pastel yellow used by the highlight toggle. Matching is exact.
pub const HIGHLIGHT_COLOR: Rgb = Rgb::new(0xFF, 0xFA, 0xCD);

/// Initial colour offered by the font colour prompt.
pub const DEFAULT_TEXT_COLOR: Rgb = Rgb::new(0x33, 0x33, 0x33);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `#rrggbb` and the short `#rgb` form, case-insensitive.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let expand = |idx: usize| {
                    u8::from_str_radix(&hex[idx..idx + 1], 16)
                        .ok()
                        .map(|v| v * 0x11)
                };
                Some(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Character-level attributes of a run. `None` fields mean "inherit the
/// editor default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharFormat {
    pub style: TextStyle,
    pub font_size: Option<u16>,
    pub font_family: Option<String>,
    pub foreground: Option<Rgb>,
    pub background: Option<Rgb>,
}

impl CharFormat {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    pub fn bold(&self) -> bool {
        self.style.contains(TextStyle::BOLD)
    }

    pub fn italic(&self) -> bool {
        self.style.contains(TextStyle::ITALIC)
    }

    pub fn underline(&self) -> bool {
        self.style.contains(TextStyle::UNDERLINE)
    }

    pub fn strike(&self) -> bool {
        self.style.contains(TextStyle::STRIKE)
    }
}

/// List kind; converts into its HTML element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum ListStyle {
    #[strum(serialize = "ul")]
    Bullet,
    #[strum(serialize = "ol")]
    Numbered,
}

/// Swatches offered by the colour prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum NamedColor {
    Charcoal,
    Black,
    Red,
    Orange,
    Gold,
    Green,
    Teal,
    Blue,
    Purple,
    Pink,
    Gray,
}

impl NamedColor {
    pub fn rgb(self) -> Rgb {
        match self {
            NamedColor::Charcoal => DEFAULT_TEXT_COLOR,
            NamedColor::Black => Rgb::new(0x00, 0x00, 0x00),
            NamedColor::Red => Rgb::new(0xc0, 0x39, 0x2b),
            NamedColor::Orange => Rgb::new(0xe6, 0x7e, 0x22),
            NamedColor::Gold => Rgb::new(0xb7, 0x95, 0x0b),
            NamedColor::Green => Rgb::new(0x27, 0xae, 0x60),
            NamedColor::Teal => Rgb::new(0x16, 0xa0, 0x85),
            NamedColor::Blue => Rgb::new(0x29, 0x80, 0xb9),
            NamedColor::Purple => Rgb::new(0x8e, 0x44, 0xad),
            NamedColor::Pink => Rgb::new(0xd6, 0x33, 0x84),
            NamedColor::Gray => Rgb::new(0x7f, 0x8c, 0x8d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::parse_hex("#FFFACD"), Some(HIGHLIGHT_COLOR));
        assert_eq!(Rgb::parse_hex("#333"), Some(DEFAULT_TEXT_COLOR));
        assert_eq!(Rgb::parse_hex("fffacd"), None);
        assert_eq!(Rgb::parse_hex("#12345g"), None);
    }

    #[test]
    fn list_styles_name_their_elements() {
        let tags: [&str; 2] = [ListStyle::Bullet.into(), ListStyle::Numbered.into()];
        assert_eq!(tags, ["ul", "ol"]);
    }

    #[test]
    fn hex_output_is_lowercase() {
        assert_eq!(HIGHLIGHT_COLOR.to_hex(), "#fffacd");
    }
}
