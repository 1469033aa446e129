//! Hue/saturation/lightness triples
//!
//! Style variables store colors as HSL so that derived variants (hover,
//! disabled, dark mode) are plain arithmetic on the lightness and saturation
//! channels instead of a new palette.

use crate::color::Color;
use std::fmt;

/// HSL color: hue in degrees `[0, 360)`, saturation and lightness in percent `[0, 100]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self {
            h: h.rem_euclid(360.0),
            s: s.clamp(0.0, 100.0),
            l: l.clamp(0.0, 100.0),
        }
    }

    pub fn from_color(color: Color) -> Self {
        let (r, g, b) = (color.r, color.g, color.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;

        if delta <= f32::EPSILON {
            return Self::new(0.0, 0.0, l * 100.0);
        }

        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };

        let h = if max == r {
            ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Self::new(h * 60.0, s * 100.0, l * 100.0)
    }

    pub fn to_color(&self) -> Color {
        let s = self.s / 100.0;
        let l = self.l / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = self.h / 60.0;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Color::rgb(
            (r + m).clamp(0.0, 1.0),
            (g + m).clamp(0.0, 1.0),
            (b + m).clamp(0.0, 1.0),
        )
    }

    pub fn lighten(self, amount: f32) -> Self {
        Self::new(self.h, self.s, self.l + amount)
    }

    pub fn darken(self, amount: f32) -> Self {
        Self::new(self.h, self.s, self.l - amount)
    }

    pub fn desaturate(self, amount: f32) -> Self {
        Self::new(self.h, self.s - amount, self.l)
    }

    /// Mirror lightness around 50%, keeping hue and saturation
    pub fn invert_lightness(self) -> Self {
        Self::new(self.h, self.s, 100.0 - self.l)
    }

    /// Space-separated channel form, e.g. `217 91% 60%`
    pub fn to_css(&self) -> String {
        format!("{:.0} {:.0}% {:.0}%", self.h, self.s, self.l)
    }
}

impl From<Color> for Hsl {
    fn from(color: Color) -> Self {
        Self::from_color(color)
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}
