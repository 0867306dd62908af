use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 16.0;

/// The five visual CV templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateName {
    Classic,
    Modern,
    #[default]
    Minimal,
    Creative,
    Executive,
}

/// An HSL triple kept as the exact string handed to the renderer, e.g. `"174 72% 40%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HslColour(String);

impl HslColour {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the three components: hue in degrees, saturation and lightness in percent.
    pub fn components(&self) -> Option<(f32, f32, f32)> {
        let mut parts = self.0.split_whitespace();
        let hue: f32 = parts.next()?.parse().ok()?;
        let saturation: f32 = parts.next()?.strip_suffix('%')?.parse().ok()?;
        let lightness: f32 = parts.next()?.strip_suffix('%')?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let in_range = (0.0..=360.0).contains(&hue)
            && (0.0..=100.0).contains(&saturation)
            && (0.0..=100.0).contains(&lightness);
        in_range.then_some((hue, saturation, lightness))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Customisation {
    pub template: TemplateName,
    pub primary_colour: HslColour,
    pub sidebar_colour: HslColour,
    pub text_colour: HslColour,
    pub font_family: String,
    pub heading_font: String,
    /// Base font size in px.
    pub font_size: f32,
    pub heading_bold: bool,
    pub body_italic: bool,
}

impl Default for Customisation {
    fn default() -> Self {
        Self {
            template: TemplateName::Minimal,
            primary_colour: HslColour::new("0 0% 0%"),
            sidebar_colour: HslColour::new("0 0% 96%"),
            text_colour: HslColour::new("0 0% 10%"),
            font_family: "Inter".to_string(),
            heading_font: "Cormorant Garamond".to_string(),
            font_size: 11.0,
            heading_bold: true,
            body_italic: false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CustomisationError {
    #[error("{field} is not an HSL triple: '{value}'")]
    InvalidColour { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    EmptyFont(&'static str),

    #[error("font size {0} is outside 8..=16 in 0.5 steps")]
    FontSizeOutOfRange(f32),
}

impl Customisation {
    pub fn validate(&self) -> Result<(), CustomisationError> {
        for (field, colour) in [
            ("primaryColour", &self.primary_colour),
            ("sidebarColour", &self.sidebar_colour),
            ("textColour", &self.text_colour),
        ] {
            if colour.components().is_none() {
                return Err(CustomisationError::InvalidColour {
                    field,
                    value: colour.as_str().to_string(),
                });
            }
        }

        if self.font_family.trim().is_empty() {
            return Err(CustomisationError::EmptyFont("fontFamily"));
        }
        if self.heading_font.trim().is_empty() {
            return Err(CustomisationError::EmptyFont("headingFont"));
        }

        let on_step = (self.font_size * 2.0).fract() == 0.0;
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) || !on_step {
            return Err(CustomisationError::FontSizeOutOfRange(self.font_size));
        }
        Ok(())
    }
}
