//! WCAG relative luminance and contrast ratio
//!
//! See <https://www.w3.org/TR/WCAG21/#dfn-contrast-ratio>.

use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Minimum ratio for AA body text
pub const AA_RATIO: f64 = 4.5;

/// Minimum ratio for AAA body text
pub const AAA_RATIO: f64 = 7.0;

/// Minimum ratio for AA large text (18pt, or 14pt bold)
pub const AA_LARGE_RATIO: f64 = 3.0;

/// WCAG conformance level reached by a contrast ratio
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WcagLevel {
    Fail,
    Aa,
    Aaa,
}

impl WcagLevel {
    pub fn classify(ratio: f64) -> Self {
        if ratio >= AAA_RATIO {
            Self::Aaa
        } else if ratio >= AA_RATIO {
            Self::Aa
        } else {
            Self::Fail
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Aa => "AA",
            Self::Aaa => "AAA",
        }
    }
}

fn linearize(channel: f32) -> f64 {
    let c = f64::from(channel.clamp(0.0, 1.0));
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance of a color, 0.0 (black) to 1.0 (white)
pub fn relative_luminance(color: Color) -> f64 {
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

/// Contrast ratio between two colors, 1.0 to 21.0, order independent
pub fn contrast_ratio(a: Color, b: Color) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// White or black, whichever reads better on `background`
pub fn readable_text_on(background: Color) -> Color {
    if contrast_ratio(Color::WHITE, background) >= contrast_ratio(Color::BLACK, background) {
        Color::WHITE
    } else {
        Color::BLACK
    }
}
