use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// 以 RGB 表示的文字顏色。 / Text colour in RGB form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must start with '#'")]
    MissingHashPrefix,
    #[error("color must have 6 hex digits")]
    InvalidLength,
    #[error("color contains non-hex digits")]
    InvalidHex,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const LIGHT_GRAY: Color = Color::rgb(0xBF, 0xBF, 0xBF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 解析 `#RRGGBB` 格式。 / Parses `#RRGGBB` notation (case-insensitive).
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let hex = input
            .trim()
            .strip_prefix('#')
            .ok_or(ColorParseError::MissingHashPrefix)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorParseError::InvalidLength);
        }
        let channel = |start: usize| {
            hex.get(start..start + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or(ColorParseError::InvalidHex)
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// 底線樣式。 / Underline kinds understood by the document model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Underline {
    #[default]
    None,
    Single,
    Double,
    Dotted,
    Word,
}

/// 完整解析後的字元樣式。 / Fully resolved character style of a run of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_name: String,
    pub size: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub underline: Underline,
    pub strike_through: bool,
    pub superscript: bool,
    pub subscript: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_name: "Calibri".into(),
            size: 11.0,
            color: Color::BLACK,
            bold: false,
            italic: false,
            underline: Underline::None,
            strike_through: false,
            superscript: false,
            subscript: false,
        }
    }
}

impl TextStyle {
    /// 套用部分樣式；未指定的屬性保持不變。 / Applies a partial format; unset attributes are kept.
    pub fn apply(&mut self, format: &FontFormat) {
        if let Some(name) = &format.name {
            self.font_name.clone_from(name);
        }
        if let Some(size) = format.size {
            self.size = size;
        }
        if let Some(color) = format.color {
            self.color = color;
        }
        if let Some(bold) = format.bold {
            self.bold = bold;
        }
        if let Some(italic) = format.italic {
            self.italic = italic;
        }
        if let Some(underline) = format.underline {
            self.underline = underline;
        }
        if let Some(strike_through) = format.strike_through {
            self.strike_through = strike_through;
        }
        if let Some(superscript) = format.superscript {
            self.superscript = superscript;
        }
        if let Some(subscript) = format.subscript {
            self.subscript = subscript;
        }
    }

    pub fn with(mut self, format: &FontFormat) -> Self {
        self.apply(format);
        self
    }
}

/// 套用於範圍的字型屬性；`None` 代表沿用原值。 / Font properties to set on a range; `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontFormat {
    pub name: Option<String>,
    pub size: Option<f32>,
    pub color: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<Underline>,
    pub strike_through: Option<bool>,
    pub superscript: Option<bool>,
    pub subscript: Option<bool>,
}

impl FontFormat {
    /// 指定所有屬性的完整格式。 / A format that pins every attribute to the given style.
    pub fn complete(style: &TextStyle) -> Self {
        Self {
            name: Some(style.font_name.clone()),
            size: Some(style.size),
            color: Some(style.color),
            bold: Some(style.bold),
            italic: Some(style.italic),
            underline: Some(style.underline),
            strike_through: Some(style.strike_through),
            superscript: Some(style.superscript),
            subscript: Some(style.subscript),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 檢查數值是否為宿主可接受。 / Returns a description of the first invalid value, if any.
    pub fn invalid_reason(&self) -> Option<&'static str> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Some("font name cannot be empty");
        }
        if self
            .size
            .is_some_and(|size| !size.is_finite() || size <= 0.0)
        {
            return Some("font size must be a positive number");
        }
        if self.superscript == Some(true) && self.subscript == Some(true) {
            return Some("text cannot be both superscript and subscript");
        }
        None
    }
}
