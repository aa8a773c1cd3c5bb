use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    render::{TextMeasure, TextMetrics},
    Result, StagehandError,
};

/// Font descriptor in the spirit of a CSS `font` shorthand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    family: String,
    size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<String>,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Parses strings such as `"20px Arial"` or `"bold italic 12px Comic Sans"`.
    pub fn parse(value: &str) -> Result<Self> {
        let tokens: Vec<&str> = value.split_whitespace().collect();
        let size_at = tokens
            .iter()
            .position(|token| token.ends_with("px"))
            .ok_or_else(|| invalid_font(value))?;
        let size: f64 = tokens[size_at]
            .trim_end_matches("px")
            .parse()
            .map_err(|_| invalid_font(value))?;
        if !size.is_finite() || size <= 0.0 {
            return Err(invalid_font(value));
        }

        let family = tokens[size_at + 1..].join(" ");
        if family.is_empty() {
            return Err(invalid_font(value));
        }
        let style = (size_at > 0).then(|| tokens[..size_at].join(" "));
        Ok(Self {
            family,
            size,
            style,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("sans-serif", 10.0)
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(style) = &self.style {
            write!(f, "{style} ")?;
        }
        write!(f, "{}px {}", self.size, self.family)
    }
}

fn invalid_font(value: &str) -> StagehandError {
    StagehandError::InvalidInput(format!("cannot parse font `{value}`"))
}

/// Text content of a text actor together with its last measured size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextActor {
    text: String,
    font: Font,
    metrics: TextMetrics,
}

impl TextActor {
    pub fn new(text: impl Into<String>, font: Font) -> Self {
        Self {
            text: text.into(),
            font,
            metrics: TextMetrics::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub(crate) fn set_font(&mut self, font: Font) {
        self.font = font;
    }

    pub fn calc_text_size(&mut self, measure: &dyn TextMeasure) -> TextMetrics {
        self.metrics = measure.measure_text(&self.text, &self.font);
        self.metrics
    }

    pub fn text_width(&self) -> f64 {
        self.metrics.width
    }

    pub fn text_height(&self) -> f64 {
        self.metrics.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DisplayList;

    #[test]
    fn parses_css_like_fonts() {
        let font = Font::parse("bold italic 20px Comic Sans").unwrap();
        assert_eq!(font.size(), 20.0);
        assert_eq!(font.family(), "Comic Sans");
        assert_eq!(font.style(), Some("bold italic"));
        assert_eq!(font.to_string(), "bold italic 20px Comic Sans");

        let plain = Font::parse("12px Arial").unwrap();
        assert_eq!(plain.style(), None);
        assert_eq!(plain.to_string(), "12px Arial");
    }

    #[test]
    fn rejects_malformed_fonts() {
        for bad in [
            "Arial",
            "12px",
            "-3px Arial",
            "bigpx Arial",
            "NaNpx Arial",
            "infpx Arial",
        ] {
            assert!(Font::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn measures_with_context() {
        let mut text = TextActor::new("hello", Font::new("mono", 10.0));
        let metrics = text.calc_text_size(&DisplayList::new());
        assert_eq!(metrics.width, text.text_width());
        assert_eq!(text.text_height(), 10.0);
    }
}
