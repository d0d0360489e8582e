//! Report colors and cell formats.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder};
use std::fmt;
use tracing::warn;

/// An RGB color given as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(u32);

impl HexColor {
    pub const DEFAULT_PRIMARY: HexColor = HexColor(0x0F6CBD);
    pub const DEFAULT_ACCENT: HexColor = HexColor(0x585858);
    /// Conventional series color for women.
    pub const FEMALE: HexColor = HexColor(0x9966CC);
    /// Conventional series color for men.
    pub const MALE: HexColor = HexColor(0xFFD700);
    pub const ERROR_BAR: HexColor = HexColor(0x333333);

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(HexColor)
    }

    /// Parse, falling back to `default` (with a warning) on invalid input.
    pub fn parse_or(value: &str, default: HexColor) -> Self {
        Self::parse(value).unwrap_or_else(|| {
            warn!("Invalid color {:?}, using {}", value, default);
            default
        })
    }

    pub fn rgb(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0)
    }
}

impl From<HexColor> for Color {
    fn from(color: HexColor) -> Self {
        Color::RGB(color.0)
    }
}

/// Presentation settings supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub primary: HexColor,
    pub accent: HexColor,
    /// Display name only; never used in any computation.
    pub company_name: String,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            primary: HexColor::DEFAULT_PRIMARY,
            accent: HexColor::DEFAULT_ACCENT,
            company_name: "Empresa Demo".to_string(),
        }
    }
}

impl ReportStyle {
    /// Build a style from loosely validated hex strings.
    pub fn new(primary: &str, accent: &str, company_name: &str) -> Self {
        Self {
            primary: HexColor::parse_or(primary, HexColor::DEFAULT_PRIMARY),
            accent: HexColor::parse_or(accent, HexColor::DEFAULT_ACCENT),
            company_name: company_name.to_string(),
        }
    }

    /// Series color for women: the primary color once it has been customized.
    pub fn female_color(&self) -> HexColor {
        if self.primary == HexColor::DEFAULT_PRIMARY {
            HexColor::FEMALE
        } else {
            self.primary
        }
    }

    /// Series color for men: the accent color once it has been customized.
    pub fn male_color(&self) -> HexColor {
        if self.accent == HexColor::DEFAULT_ACCENT {
            HexColor::MALE
        } else {
            self.accent
        }
    }

    /// Bold white text on the primary color.
    pub fn header_format(&self) -> Format {
        Format::new()
            .set_bold()
            .set_background_color(self.primary)
            .set_font_color(Color::White)
            .set_border(FormatBorder::Thin)
    }

    pub fn title_format(&self) -> Format {
        self.header_format().set_align(FormatAlign::Left)
    }
}

/// Number formats shared by the sheets.
#[derive(Debug, Clone)]
pub struct NumberFormats {
    pub ratio: Format,
    pub currency: Format,
    pub percent: Format,
}

impl Default for NumberFormats {
    fn default() -> Self {
        Self {
            ratio: Format::new().set_num_format("0.0000"),
            currency: Format::new().set_num_format("#,##0.00"),
            percent: Format::new().set_num_format("0.00"),
        }
    }
}

/// Fill used for a classification cell.
pub fn classification_format(classification: crate::models::Classification) -> Format {
    use crate::models::Classification;

    let fill = match classification {
        Classification::Green => 0xC6EFCE,
        Classification::Amber => 0xFFEB9C,
        Classification::Red => 0xFFC7CE,
        Classification::Insufficient => 0xD9D9D9,
    };
    Format::new().set_background_color(Color::RGB(fill))
}

/// `1234567.891` -> `1,234,567.89`.
pub fn format_currency(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, "00"));

    let mut grouped = String::new();
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
