//! Style variables derived from a theme descriptor
//!
//! Colors are emitted as space-separated HSL channels (`224 76% 48%`) so that
//! stylesheets can write `hsl(var(--color-primary) / 0.5)`. Every palette
//! color gets a base variable; primary, secondary and accent also get hover,
//! active, disabled and foreground variants, and the four dark-scheme slots
//! are always present (from the descriptor's `darkMode` block, or derived).

use crate::descriptor::{PaletteRole, ThemeDescriptor};
use indexmap::IndexMap;
use std::fmt;
use vitrine_core::{readable_text_on, Color, Hsl};

/// Lightness shift for hover states, in percent points
const HOVER_SHIFT: f32 = 8.0;
const ACTIVE_SHIFT: f32 = 14.0;
const DISABLED_DESATURATE: f32 = 40.0;
const DISABLED_LIGHTEN: f32 = 15.0;

/// Below this lightness, states lighten instead of darken
const DARK_THRESHOLD: f32 = 30.0;

/// Roles with interactive state variants
const INTERACTIVE: [PaletteRole; 3] = [
    PaletteRole::Primary,
    PaletteRole::Secondary,
    PaletteRole::Accent,
];

/// A single variable value
#[derive(Clone, Debug, PartialEq)]
pub enum StyleValue {
    Color(Hsl),
    Px(f32),
    Number(f32),
    Text(String),
}

impl StyleValue {
    pub fn to_css(&self) -> String {
        match self {
            Self::Color(hsl) => hsl.to_css(),
            Self::Px(px) => format!("{}px", trim_number(*px)),
            Self::Number(n) => trim_number(*n),
            Self::Text(text) => text.clone(),
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn trim_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Ordered set of style variables, keyed without the leading `--`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleVariableSet {
    vars: IndexMap<String, StyleValue>,
}

impl StyleVariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the full variable set for `theme`
    pub fn from_descriptor(theme: &ThemeDescriptor) -> Self {
        let mut set = Self::new();
        let palette = &theme.palette;

        for (role, color) in palette.iter() {
            set.color(format!("color-{}", role.name()), color);
        }

        for role in INTERACTIVE {
            let base = Hsl::from_color(palette.get(role));
            let name = role.name();
            let (hover, active) = if base.l < DARK_THRESHOLD {
                (base.lighten(HOVER_SHIFT), base.lighten(ACTIVE_SHIFT))
            } else {
                (base.darken(HOVER_SHIFT), base.darken(ACTIVE_SHIFT))
            };
            set.insert(format!("color-{name}-hover"), StyleValue::Color(hover));
            set.insert(format!("color-{name}-active"), StyleValue::Color(active));
            set.insert(
                format!("color-{name}-disabled"),
                StyleValue::Color(base.desaturate(DISABLED_DESATURATE).lighten(DISABLED_LIGHTEN)),
            );
            set.color(format!("color-{name}-foreground"), readable_text_on(palette.get(role)));
        }

        let dark = dark_slots(theme);
        set.insert("color-primary-dark", StyleValue::Color(dark[0]));
        set.insert("color-secondary-dark", StyleValue::Color(dark[1]));
        set.insert("color-background-dark", StyleValue::Color(dark[2]));
        set.insert("color-text-dark", StyleValue::Color(dark[3]));

        let shadow = Hsl::from_color(palette.shadow).to_css();
        set.insert(
            "shadow-sm",
            StyleValue::Text(format!("0 1px 2px 0 hsl({shadow} / 0.05)")),
        );
        set.insert(
            "shadow-md",
            StyleValue::Text(format!(
                "0 4px 6px -1px hsl({shadow} / 0.1), 0 2px 4px -2px hsl({shadow} / 0.1)"
            )),
        );

        let typography = &theme.typography;
        set.insert("font-family", StyleValue::Text(typography.font_family.clone()));
        set.insert("font-size-base", StyleValue::Px(typography.base_font_size as f32));
        set.insert("line-height", StyleValue::Number(typography.line_height));
        let radius = typography.border_radius as f32;
        set.insert("radius", StyleValue::Px(radius));
        set.insert("radius-sm", StyleValue::Px((radius * 0.5).round()));
        set.insert("radius-lg", StyleValue::Px((radius * 1.5).round()));

        let header = &theme.header;
        set.color("header-bg", theme.header_background());
        set.color("header-text", theme.header_text());
        set.insert("header-height", StyleValue::Px(header.height as f32));
        set.insert("header-position", StyleValue::Text(header.position.as_str().to_string()));
        set.insert("header-layout", StyleValue::Text(header.layout.as_str().to_string()));

        set.color("footer-bg", theme.footer_background());
        set.color("footer-text", theme.footer_text());
        set.color("footer-link", theme.footer_link());
        set.insert("footer-columns", StyleValue::Number(theme.footer.columns as f32));

        set
    }

    pub fn insert(&mut self, name: impl Into<String>, value: StyleValue) {
        self.vars.insert(name.into(), value);
    }

    fn color(&mut self, name: impl Into<String>, color: Color) {
        self.insert(name, StyleValue::Color(Hsl::from_color(color)));
    }

    pub fn get(&self, name: &str) -> Option<&StyleValue> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> + '_ {
        self.vars.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Variable name to CSS value, in emission order
    pub fn to_css_variable_map(&self) -> IndexMap<String, String> {
        self.vars
            .iter()
            .map(|(name, value)| (name.clone(), value.to_css()))
            .collect()
    }

    /// Render as a `:root { --name: value; }` block
    pub fn to_css_block(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in &self.vars {
            css.push_str(&format!("  --{}: {};\n", name, value.to_css()));
        }
        css.push('}');
        css
    }
}

/// Dark primary, secondary, background and text
fn dark_slots(theme: &ThemeDescriptor) -> [Hsl; 4] {
    if let Some(dark) = &theme.dark_mode {
        return [dark.primary, dark.secondary, dark.background, dark.text].map(Hsl::from_color);
    }

    let palette = &theme.palette;
    let lift = |color: Color| {
        let hsl = Hsl::from_color(color);
        if hsl.l < 50.0 {
            hsl.lighten(10.0)
        } else {
            hsl
        }
    };
    [
        lift(palette.primary),
        lift(palette.secondary),
        Hsl::from_color(palette.background).invert_lightness(),
        Hsl::from_color(palette.text).invert_lightness(),
    ]
}

/// CSS custom property name for a variable
pub fn css_property(name: &str) -> String {
    format!("--{name}")
}
