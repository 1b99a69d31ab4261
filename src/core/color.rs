//! Colour helpers for display paths
//!
//! Parses `#RRGGBB` hex codes and derives values used when rendering
//! coloured labels: perceptual luminance, dark/light classification and CSS
//! strings.

use serde::Serialize;
use thiserror::Error;

/// Luminance below this value is considered dark (ITU-R BT.601 weighting)
pub const DARK_THRESHOLD: u32 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("Invalid color format: '{input}' (expected 6 hex digits, optional leading '#')")]
    InvalidColorFormat { input: String },
}

/// An 8-bit RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Upper-case `#RRGGBB` form
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse a 6-digit hex colour, with or without a leading `#`
pub fn rgb_of(hex_code: &str) -> Result<Rgb, ColorError> {
    let invalid = || ColorError::InvalidColorFormat {
        input: hex_code.to_string(),
    };

    let digits = hex_code.strip_prefix('#').unwrap_or(hex_code);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };

    Ok(Rgb {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

/// Perceptual luminance `(299r + 587g + 114b) / 1000`, in `0..=255`
pub fn luminance(rgb: Rgb) -> u32 {
    (299 * u32::from(rgb.r) + 587 * u32::from(rgb.g) + 114 * u32::from(rgb.b)) / 1000
}

/// Whether a colour reads as dark (luminance below 128)
pub fn is_dark(hex_code: &str) -> Result<bool, ColorError> {
    Ok(luminance(rgb_of(hex_code)?) < DARK_THRESHOLD)
}

/// `rgb(r, g, b)`
pub fn css_rgb(hex_code: &str) -> Result<String, ColorError> {
    let Rgb { r, g, b } = rgb_of(hex_code)?;
    Ok(format!("rgb({}, {}, {})", r, g, b))
}

/// `rgba(r, g, b, a)` with alpha clamped to `0.0..=1.0`
pub fn css_rgba(hex_code: &str, alpha: f64) -> Result<String, ColorError> {
    let Rgb { r, g, b } = rgb_of(hex_code)?;
    let alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
    Ok(format!("rgba({}, {}, {}, {})", r, g, b, alpha))
}

/// Text colour readable on top of the given background
pub fn contrast_text(hex_code: &str) -> Result<&'static str, ColorError> {
    if is_dark(hex_code)? {
        Ok("#FFFFFF")
    } else {
        Ok("#000000")
    }
}
