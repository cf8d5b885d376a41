use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a color string.
    ///
    /// Bare hex digits get a leading `#` (`"ffffff"` reads as `"#ffffff"`).
    /// Named colors and `rgb(...)` follow SVG syntax. Anything else is an
    /// `InvalidColor` error.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let normalized = if !s.starts_with('#')
            && matches!(s.len(), 3 | 4 | 6 | 8)
            && s.chars().all(|c| c.is_ascii_hexdigit())
        {
            format!("#{s}")
        } else {
            s.to_string()
        };
        let c = svgtypes::Color::from_str(&normalized)
            .map_err(|_| Error::InvalidColor(s.to_string()))?;
        Ok(Self {
            r: c.red,
            g: c.green,
            b: c.blue,
            a: c.alpha,
        })
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `fill`/`stroke` value for SVG attributes; opacity goes separately.
    pub(crate) fn svg_rgb(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    pub(crate) fn svg_opacity(self) -> f32 {
        self.a as f32 / 255.0
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Color::parse(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_prepended_to_bare_hex() {
        assert_eq!(Color::parse("efefef").unwrap(), Color::rgb(0xef, 0xef, 0xef));
        assert_eq!(Color::parse("#4682b4").unwrap(), Color::rgb(0x46, 0x82, 0xb4));
        assert_eq!(Color::parse("fff").unwrap(), Color::WHITE);
    }

    #[test]
    fn named_colors_are_accepted() {
        assert_eq!(Color::parse("black").unwrap(), Color::BLACK);
        assert_eq!(Color::parse("steelblue").unwrap(), Color::rgb(70, 130, 180));
    }

    #[test]
    fn malformed_color_is_an_error() {
        let err = Color::parse("#zz0000").unwrap_err();
        assert!(matches!(err, Error::InvalidColor(ref s) if s == "#zz0000"));
        assert!(Color::parse("not a color").is_err());
    }

    #[test]
    fn serde_uses_the_string_form() {
        let c: Color = serde_json::from_str("\"000000\"").unwrap();
        assert_eq!(c, Color::BLACK);
        assert_eq!(serde_json::to_string(&Color::WHITE).unwrap(), "\"#ffffff\"");
        assert!(serde_json::from_str::<Color>("\"#12\"").is_err());
    }
}
